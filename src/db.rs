use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let conn =
        Connection::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS people (
            id         INTEGER PRIMARY KEY,
            name       TEXT,
            headline   TEXT,
            locality   TEXT,
            meta       TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Lookup entities, deduplicated by (name, url)
        CREATE TABLE IF NOT EXISTS titles (
            id   INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            url  TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_titles_url ON titles(url);

        CREATE TABLE IF NOT EXISTS companies (
            id   INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            url  TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_companies_url ON companies(url);

        CREATE TABLE IF NOT EXISTS schools (
            id   INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            url  TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_schools_url ON schools(url);

        CREATE TABLE IF NOT EXISTS certifications (
            id   INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            url  TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_certifications_url ON certifications(url);

        CREATE TABLE IF NOT EXISTS skills (
            id   INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            url  TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_skills_url ON skills(url);

        -- Per-person entries
        CREATE TABLE IF NOT EXISTS person_experiences (
            id          INTEGER PRIMARY KEY,
            person_id   INTEGER NOT NULL REFERENCES people(id),
            title_id    INTEGER REFERENCES titles(id),
            company_id  INTEGER REFERENCES companies(id),
            start_date  TEXT,
            end_date    TEXT,
            description TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_experiences_person ON person_experiences(person_id);

        CREATE TABLE IF NOT EXISTS person_educations (
            id          INTEGER PRIMARY KEY,
            person_id   INTEGER NOT NULL REFERENCES people(id),
            school_id   INTEGER REFERENCES schools(id),
            degree      TEXT,
            start_date  TEXT,
            end_date    TEXT,
            description TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_educations_person ON person_educations(person_id);

        CREATE TABLE IF NOT EXISTS person_certifications (
            id               INTEGER PRIMARY KEY,
            person_id        INTEGER NOT NULL REFERENCES people(id),
            certification_id INTEGER REFERENCES certifications(id),
            company_id       INTEGER REFERENCES companies(id),
            start_date       TEXT,
            end_date         TEXT,
            description      TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_certifications_person ON person_certifications(person_id);

        CREATE TABLE IF NOT EXISTS person_skills (
            id        INTEGER PRIMARY KEY,
            person_id INTEGER NOT NULL REFERENCES people(id),
            skill_id  INTEGER NOT NULL REFERENCES skills(id)
        );
        CREATE INDEX IF NOT EXISTS idx_skills_person ON person_skills(person_id);
        ",
    )?;
    Ok(())
}

// ── Rows ──

/// Identity of a lookup entity: its display name plus the site path it links to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Title,
    Company,
    School,
    Certification,
    Skill,
}

impl Lookup {
    fn table(self) -> &'static str {
        match self {
            Lookup::Title => "titles",
            Lookup::Company => "companies",
            Lookup::School => "schools",
            Lookup::Certification => "certifications",
            Lookup::Skill => "skills",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonRow {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub locality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceRow {
    pub title: Option<LookupKey>,
    pub company: Option<LookupKey>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EducationRow {
    pub school: Option<LookupKey>,
    pub degree: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificationRow {
    pub certification: Option<LookupKey>,
    pub company: Option<LookupKey>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Where a person row came from; stored as compact JSON in `people.meta`.
#[derive(Debug, Clone, Serialize)]
pub struct PersonMeta {
    pub url: String,
    pub file_name: String,
}

/// Everything extracted from one profile page.
#[derive(Debug, Clone, Default)]
pub struct ProfileRecord {
    pub person: PersonRow,
    pub experiences: Vec<ExperienceRow>,
    pub educations: Vec<EducationRow>,
    pub certifications: Vec<CertificationRow>,
    pub skills: Vec<LookupKey>,
}

// ── Find-or-create ──

/// Id of the row matching `key`, inserting it first if there is none.
/// Read-then-write: correct for a single writer only.
pub fn find_or_create(conn: &Connection, lookup: Lookup, key: &LookupKey) -> Result<i64> {
    let table = lookup.table();
    let existing: Option<i64> = conn
        .query_row(
            &format!("SELECT id FROM {} WHERE name = ?1 AND url IS ?2 ORDER BY id LIMIT 1", table),
            params![key.name, key.url],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(
        &format!("INSERT INTO {} (name, url) VALUES (?1, ?2)", table),
        params![key.name, key.url],
    )?;
    Ok(conn.last_insert_rowid())
}

fn find_or_create_opt(
    conn: &Connection,
    lookup: Lookup,
    key: Option<&LookupKey>,
) -> Result<Option<i64>> {
    key.map(|k| find_or_create(conn, lookup, k)).transpose()
}

fn date_text(d: Option<NaiveDate>) -> Option<String> {
    d.map(|d| d.format("%Y-%m-%d").to_string())
}

// ── Profiles ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedProfile {
    pub person_id: i64,
    pub experiences: usize,
    pub educations: usize,
    pub certifications: usize,
    pub skills: usize,
}

/// Store one profile in a single transaction: person first, then its entries.
pub fn save_profile(
    conn: &Connection,
    record: &ProfileRecord,
    meta: &PersonMeta,
) -> Result<SavedProfile> {
    let tx = conn.unchecked_transaction()?;

    let meta_json = serde_json::to_string(meta)?;
    tx.execute(
        "INSERT INTO people (name, headline, locality, meta) VALUES (?1, ?2, ?3, ?4)",
        params![
            record.person.name,
            record.person.headline,
            record.person.locality,
            meta_json
        ],
    )?;
    let person_id = tx.last_insert_rowid();

    for e in &record.experiences {
        let title_id = find_or_create_opt(&tx, Lookup::Title, e.title.as_ref())?;
        let company_id = find_or_create_opt(&tx, Lookup::Company, e.company.as_ref())?;
        tx.execute(
            "INSERT INTO person_experiences
             (person_id, title_id, company_id, start_date, end_date, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                person_id,
                title_id,
                company_id,
                date_text(e.start_date),
                date_text(e.end_date),
                e.description
            ],
        )?;
    }

    for e in &record.educations {
        let school_id = find_or_create_opt(&tx, Lookup::School, e.school.as_ref())?;
        tx.execute(
            "INSERT INTO person_educations
             (person_id, school_id, degree, start_date, end_date, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                person_id,
                school_id,
                e.degree,
                date_text(e.start_date),
                date_text(e.end_date),
                e.description
            ],
        )?;
    }

    for c in &record.certifications {
        let cert_id = find_or_create_opt(&tx, Lookup::Certification, c.certification.as_ref())?;
        let company_id = find_or_create_opt(&tx, Lookup::Company, c.company.as_ref())?;
        tx.execute(
            "INSERT INTO person_certifications
             (person_id, certification_id, company_id, start_date, end_date, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                person_id,
                cert_id,
                company_id,
                date_text(c.start_date),
                date_text(c.end_date),
                c.description
            ],
        )?;
    }

    for s in &record.skills {
        let skill_id = find_or_create(&tx, Lookup::Skill, s)?;
        tx.execute(
            "INSERT INTO person_skills (person_id, skill_id) VALUES (?1, ?2)",
            params![person_id, skill_id],
        )?;
    }

    tx.commit()?;
    Ok(SavedProfile {
        person_id,
        experiences: record.experiences.len(),
        educations: record.educations.len(),
        certifications: record.certifications.len(),
        skills: record.skills.len(),
    })
}

// ── Overview ──

pub struct OverviewRow {
    pub id: i64,
    pub name: String,
    pub headline: String,
    pub locality: String,
    pub experiences: usize,
    pub educations: usize,
    pub skills: usize,
}

pub fn fetch_overview(conn: &Connection, limit: usize) -> Result<Vec<OverviewRow>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, COALESCE(p.name,''), COALESCE(p.headline,''), COALESCE(p.locality,''),
                (SELECT COUNT(*) FROM person_experiences e WHERE e.person_id = p.id),
                (SELECT COUNT(*) FROM person_educations d WHERE d.person_id = p.id),
                (SELECT COUNT(*) FROM person_skills s WHERE s.person_id = p.id)
         FROM people p
         ORDER BY p.id
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(OverviewRow {
                id: row.get(0)?,
                name: row.get(1)?,
                headline: row.get(2)?,
                locality: row.get(3)?,
                experiences: row.get(4)?,
                educations: row.get(5)?,
                skills: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub people: usize,
    pub experiences: usize,
    pub educations: usize,
    pub certifications: usize,
    pub skills: usize,
    pub titles: usize,
    pub companies: usize,
    pub schools: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |table: &str| -> Result<usize> {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?)
    };
    Ok(Stats {
        people: count("people")?,
        experiences: count("person_experiences")?,
        educations: count("person_educations")?,
        certifications: count("person_certifications")?,
        skills: count("person_skills")?,
        titles: count("titles")?,
        companies: count("companies")?,
        schools: count("schools")?,
    })
}
