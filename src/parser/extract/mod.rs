pub mod certification;
pub mod education;
pub mod experience;
pub mod person;
pub mod skill;

use scraper::Html;

use crate::db::ProfileRecord;

/// Run every section extractor over one parsed page.
pub fn extract_all(doc: &Html) -> ProfileRecord {
    ProfileRecord {
        person: person::extract(doc),
        experiences: experience::extract(doc),
        educations: education::extract(doc),
        certifications: certification::extract(doc),
        skills: skill::extract(doc),
    }
}

// ── Tests ──
