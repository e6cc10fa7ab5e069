use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One search result: `[confidence, title, url]` on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i32, String, String)", into = "(i32, String, String)")]
pub struct Triplet {
    pub confidence: i32,
    pub title: String,
    pub url: String,
}

impl From<(i32, String, String)> for Triplet {
    fn from((confidence, title, url): (i32, String, String)) -> Self {
        Triplet { confidence, title, url }
    }
}

impl From<Triplet> for (i32, String, String) {
    fn from(t: Triplet) -> Self {
        (t.confidence, t.title, t.url)
    }
}

/// Read a results file. `null` entries are queries that found nothing.
pub fn read_results(path: &Path) -> Result<Vec<Option<Triplet>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file {}", path.display()))?;
    let results = serde_json::from_str(&content)
        .with_context(|| format!("Malformed results file {}", path.display()))?;
    Ok(results)
}

pub fn write_results(path: &Path, results: &[Option<Triplet>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write results file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_as_array() {
        let t = Triplet {
            confidence: 50,
            title: "Jane Doe | LinkedIn".into(),
            url: "https://www.linkedin.com/in/janedoe".into(),
        };
        let json = serde_json::to_string(&vec![Some(t), None]).unwrap();
        assert_eq!(
            json,
            r#"[[50,"Jane Doe | LinkedIn","https://www.linkedin.com/in/janedoe"],null]"#
        );
    }

    #[test]
    fn results_file_keeps_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/results.json");
        let results = vec![
            None,
            Some(Triplet {
                confidence: 10,
                title: "John Smith".into(),
                url: "https://www.linkedin.com/pub/john-smith/1/2/3".into(),
            }),
        ];
        write_results(&path, &results).unwrap();
        assert_eq!(read_results(&path).unwrap(), results);
    }
}
