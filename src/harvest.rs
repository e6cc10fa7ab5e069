use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::{error, warn};

use crate::config::Settings;
use crate::download::make_filename;
use crate::triplets::Triplet;

static COMPANY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?companyId=(\d*)&amp;").unwrap());
static PUBLIC_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<a class="view-public-profile" href="(.*?)">"#).unwrap());

const COMPANY_TITLE_SUFFIX: &str = " | LinkedIn";
const SAVED_PAGE_SUFFIX: &str = "  LinkedIn";

pub fn find_company_id(html: &str) -> Option<String> {
    COMPANY_ID_RE.captures(html).map(|c| c[1].to_string())
}

pub fn find_public_url(html: &str) -> Option<String> {
    PUBLIC_URL_RE.captures(html).map(|c| c[1].to_string())
}

/// One output line: 1-based position in the results file, company name, numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyIdRow {
    pub seq: usize,
    pub name: Option<String>,
    pub id: Option<String>,
}

/// Pull the numeric company id out of every confidently matched company page.
pub fn company_ids(settings: &Settings, results: &[Option<Triplet>]) -> Vec<CompanyIdRow> {
    results
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let seq = i + 1;
            let empty = CompanyIdRow { seq, name: None, id: None };
            let Some(t) = t else { return empty };
            if t.confidence < settings.min_company_confidence {
                warn!("Skipping {}", t.url);
                return empty;
            }

            let path = settings
                .profiles_dir
                .join(make_filename(&t.title, settings.filename_max_len));
            let id = match std::fs::read(&path) {
                Ok(bytes) => find_company_id(&String::from_utf8_lossy(&bytes)),
                Err(_) => {
                    error!("File not found: {}", path.display());
                    None
                }
            };
            let name = t.title.split(COMPANY_TITLE_SUFFIX).next().unwrap_or(&t.title);
            CompanyIdRow {
                seq,
                name: Some(name.to_string()),
                id,
            }
        })
        .collect()
}

pub fn write_company_ids(path: &Path, rows: &[CompanyIdRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Recover canonical profile URLs from pages saved by hand.
/// `list` names one file per line, relative to `dir`.
pub fn public_urls(dir: &Path, list: &Path) -> Result<Vec<Triplet>> {
    let names = std::fs::read_to_string(list)
        .with_context(|| format!("Failed to read {}", list.display()))?;

    let mut found = Vec::new();
    for file_name in names.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let path = dir.join(file_name);
        let html = match std::fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                error!("{}: {}", path.display(), e);
                continue;
            }
        };
        if let Some(url) = find_public_url(&html) {
            let name = file_name.split(SAVED_PAGE_SUFFIX).next().unwrap_or(file_name);
            found.push(Triplet {
                confidence: 0,
                title: name.to_string(),
                url,
            });
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_id_from_link() {
        let html = r#"<a href="/company-beta/?companyId=162479&amp;trk=x">Apple</a>"#;
        assert_eq!(find_company_id(html).as_deref(), Some("162479"));
        assert_eq!(find_company_id("<a href=\"/company/apple\">"), None);
    }

    #[test]
    fn public_url_any_case() {
        let html = r#"<A class="view-public-profile" href="https://www.linkedin.com/in/jdoe">x</A>"#;
        assert_eq!(
            find_public_url(html).as_deref(),
            Some("https://www.linkedin.com/in/jdoe")
        );
    }

    #[test]
    fn company_ids_respect_confidence_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            profiles_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let title = "Acme Corp | LinkedIn";
        std::fs::write(
            dir.path().join(make_filename(title, 60)),
            r#"<a href="?companyId=42&amp;trk=a">"#,
        )
        .unwrap();

        let results = vec![
            Some(Triplet { confidence: 50, title: title.into(), url: "u1".into() }),
            None,
            Some(Triplet { confidence: 15, title: "Weak | LinkedIn".into(), url: "u2".into() }),
            Some(Triplet { confidence: 40, title: "Gone | LinkedIn".into(), url: "u3".into() }),
        ];
        let rows = company_ids(&settings, &results);
        assert_eq!(
            rows,
            vec![
                CompanyIdRow { seq: 1, name: Some("Acme Corp".into()), id: Some("42".into()) },
                CompanyIdRow { seq: 2, name: None, id: None },
                CompanyIdRow { seq: 3, name: None, id: None },
                CompanyIdRow { seq: 4, name: Some("Gone".into()), id: None },
            ]
        );

        let out = dir.path().join("ids.csv");
        write_company_ids(&out, &rows).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "1,Acme Corp,42\n2,,\n3,,\n4,Gone,\n"
        );
    }

    #[test]
    fn public_urls_from_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Jane Doe  LinkedIn.html"),
            r#"<A class="view-public-profile" href="https://www.linkedin.com/in/jane">"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("Empty  LinkedIn.html"), "<p></p>").unwrap();
        let list = dir.path().join("_html_list.txt");
        std::fs::write(&list, "Jane Doe  LinkedIn.html\nEmpty  LinkedIn.html\nMissing.html\n").unwrap();

        let found = public_urls(dir.path(), &list).unwrap();
        assert_eq!(
            found,
            vec![Triplet {
                confidence: 0,
                title: "Jane Doe".into(),
                url: "https://www.linkedin.com/in/jane".into(),
            }]
        );
    }
}
