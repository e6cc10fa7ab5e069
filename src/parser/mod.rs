pub mod dates;
pub mod extract;
pub mod fields;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use scraper::Html;
use tracing::{error, info};

use crate::config::Settings;
use crate::db::{self, PersonMeta, ProfileRecord};
use crate::download::make_filename;
use crate::triplets::Triplet;

/// Cleaned HTML → structured record. Pure; nothing is stored.
pub fn parse_profile(html: &str) -> ProfileRecord {
    let doc = Html::parse_document(html);
    extract::extract_all(&doc)
}

#[derive(Debug, Default)]
pub struct ParseStats {
    pub profiles: usize,
    pub missing: usize,
    pub failed: usize,
    pub experiences: usize,
    pub educations: usize,
    pub certifications: usize,
    pub skills: usize,
}

impl ParseStats {
    pub fn print(&self) {
        println!(
            "Saved {} profiles ({} missing, {} failed): {} experiences, {} educations, {} certifications, {} skills.",
            self.profiles,
            self.missing,
            self.failed,
            self.experiences,
            self.educations,
            self.certifications,
            self.skills,
        );
    }
}

/// Parse the cleaned page of every found triplet and store it, one transaction per profile.
pub fn parse_all(
    conn: &Connection,
    settings: &Settings,
    results: &[Option<Triplet>],
) -> Result<ParseStats> {
    let found: Vec<&Triplet> = results.iter().flatten().collect();

    let pb = ProgressBar::new(found.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut stats = ParseStats::default();
    for triplet in found {
        let file_name = make_filename(&triplet.title, settings.filename_max_len);
        let path = settings.clean_dir.join(&file_name);
        pb.inc(1);

        let html = match std::fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                error!("File not found: {} ({})", path.display(), e);
                stats.missing += 1;
                continue;
            }
        };

        let record = parse_profile(&html);
        let meta = PersonMeta {
            url: triplet.url.clone(),
            file_name,
        };
        match db::save_profile(conn, &record, &meta) {
            Ok(saved) => {
                info!("Parsed {} as person #{}", path.display(), saved.person_id);
                stats.profiles += 1;
                stats.experiences += saved.experiences;
                stats.educations += saved.educations;
                stats.certifications += saved.certifications;
                stats.skills += saved.skills;
            }
            Err(e) => {
                error!("Failed to store {}: {:#}", path.display(), e);
                stats.failed += 1;
            }
        }
    }

    pb.finish_and_clear();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::clean_up;

    #[test]
    fn end_to_end_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            clean_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let title = "Jane Q. Doe | LinkedIn";
        let raw = std::fs::read_to_string("tests/fixtures/profile_raw.html").unwrap();
        std::fs::write(
            dir.path().join(make_filename(title, settings.filename_max_len)),
            clean_up(&raw).unwrap(),
        )
        .unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let results = vec![
            Some(Triplet {
                confidence: 50,
                title: title.to_string(),
                url: "https://www.linkedin.com/in/janeqdoe".to_string(),
            }),
            None,
            Some(Triplet {
                confidence: 5,
                title: "Nobody Downloaded".to_string(),
                url: "https://www.linkedin.com/in/nobody".to_string(),
            }),
        ];

        let stats = parse_all(&conn, &settings, &results).unwrap();
        assert_eq!((stats.profiles, stats.missing, stats.failed), (1, 1, 0));

        let s = db::get_stats(&conn).unwrap();
        assert_eq!(s.people, 1);
        assert_eq!(s.experiences, 3);
        assert_eq!(s.titles, 3);
        // Acme twice in positions, Globex, and the certification issuer
        assert_eq!(s.companies, 3);
        assert_eq!(s.schools, 2);
        assert_eq!(s.certifications, 1);
        assert_eq!(s.skills, 3);

        let (name, locality, meta): (String, String, String) = conn
            .query_row("SELECT name, locality, meta FROM people", [], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?))
            })
            .unwrap();
        assert_eq!(name, "Jane Q. Doe");
        assert_eq!(locality, "Greater Boston Area");
        assert_eq!(
            meta,
            r#"{"url":"https://www.linkedin.com/in/janeqdoe","file_name":"Jane Q. Doe - LinkedIn.html"}"#
        );

        let acme_positions: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM person_experiences e JOIN companies c ON c.id = e.company_id
                 WHERE c.url = '/company/acme'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(acme_positions, 2);

        let (start, end): (Option<String>, Option<String>) = conn
            .query_row(
                "SELECT start_date, end_date FROM person_experiences ORDER BY id LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(start.as_deref(), Some("2016-06-01"));
        assert_eq!(end, None);

        let cert_end: Option<String> = conn
            .query_row("SELECT end_date FROM person_certifications", [], |r| r.get(0))
            .unwrap();
        assert_eq!(cert_end.as_deref(), Some("2020-03-01"));
    }
}
