use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::SearchError;

const CONFIG_FILE: &str = "profile_scraper";
const ENV_PREFIX: &str = "PROFILES";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_2) AppleWebKit/\
537.36 (KHTML, like Gecko) Chrome/49.0.2593.0 Safari/537.36";

/// Run-wide settings handed to every stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub cse_id: Option<String>,
    pub search_endpoint: String,
    pub site: String,
    pub search_limit: usize,
    pub company_search_limit: usize,
    pub people_csv: PathBuf,
    pub companies_txt: PathBuf,
    pub results_file: PathBuf,
    pub profiles_dir: PathBuf,
    pub clean_dir: PathBuf,
    pub db_path: PathBuf,
    pub workers: usize,
    pub user_agent: String,
    pub filename_max_len: usize,
    pub min_company_confidence: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_key: None,
            cse_id: None,
            search_endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
            site: "linkedin.com".to_string(),
            search_limit: 30,
            company_search_limit: 10,
            people_csv: PathBuf::from("input/people.csv"),
            companies_txt: PathBuf::from("input/companies.txt"),
            results_file: PathBuf::from("data/results.json"),
            profiles_dir: PathBuf::from("data/profiles"),
            clean_dir: PathBuf::from("data/clean_profiles"),
            db_path: PathBuf::from("data/profiles.sqlite"),
            workers: 4,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            filename_max_len: 60,
            min_company_confidence: 40,
        }
    }
}

impl Settings {
    /// Defaults, then `profile_scraper.{toml,yaml,json}` if present, then `PROFILES_*` env vars.
    pub fn load() -> Result<Self> {
        let mut settings: Settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        if settings.api_key.is_none() {
            settings.api_key = std::env::var("GOOGLE_API_KEY").ok();
        }
        if settings.cse_id.is_none() {
            settings.cse_id = std::env::var("GOOGLE_CSE_ID").ok();
        }
        if settings.workers == 0 {
            settings.workers = 1;
        }
        Ok(settings)
    }

    pub fn credentials(&self) -> Result<(&str, &str), SearchError> {
        match (self.api_key.as_deref(), self.cse_id.as_deref()) {
            (Some(key), Some(cx)) if !key.is_empty() && !cx.is_empty() => Ok((key, cx)),
            _ => Err(SearchError::MissingCredentials),
        }
    }
}
