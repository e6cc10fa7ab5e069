use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::error::SearchError;
use crate::triplets::Triplet;

const RESULT_KIND: &str = "customsearch#result";

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub kind: String,
    pub title: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchPage {
    pub items: Option<Vec<SearchItem>>,
}

/// What the search is looking for. Decides filters and scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Person,
    Company,
}

/// One row of search input: the full keyword string plus the name used for scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub name: String,
}

pub struct SearchClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    cse_id: String,
    site: String,
    person_limit: usize,
    company_limit: usize,
}

impl SearchClient {
    pub fn new(settings: &Settings) -> Result<Self, SearchError> {
        let (api_key, cse_id) = settings.credentials()?;
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(SearchClient {
            http,
            endpoint: settings.search_endpoint.clone(),
            api_key: api_key.to_string(),
            cse_id: cse_id.to_string(),
            site: settings.site.clone(),
            person_limit: settings.search_limit,
            company_limit: settings.company_search_limit,
        })
    }

    /// One page of results for `keyword`, restricted to the configured site.
    pub async fn search(&self, keyword: &str, start: usize) -> Result<SearchPage, SearchError> {
        info!("Searching with keyword={}, site={}, start={}", keyword, self.site, start);
        let q = format!("{} site:{}", keyword, self.site);
        let mut params = vec![
            ("key", self.api_key.clone()),
            ("cx", self.cse_id.clone()),
            ("q", q),
        ];
        if start > 0 {
            params.push(("start", start.to_string()));
        }

        let body = self
            .http
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await?
            .text()
            .await?;
        let page: SearchPage = serde_json::from_str(&body)?;
        if page.items.is_none() {
            return Err(SearchError::BadResponse(body));
        }
        Ok(page)
    }

    /// Page through results until a candidate is found or the limit is reached.
    pub async fn find_profile(&self, kind: ProfileKind, query: &SearchQuery) -> Option<Triplet> {
        let limit = match kind {
            ProfileKind::Person => self.person_limit,
            ProfileKind::Company => self.company_limit,
        };
        let mut offset = 0;

        while offset < limit {
            let items = match self.search(&query.keyword, offset).await {
                Ok(page) => page.items.unwrap_or_default(),
                Err(e) => {
                    error!("Search for {:?} aborted: {}", query.keyword, e);
                    return None;
                }
            };
            if items.is_empty() {
                break;
            }
            offset += items.len();
            if let Some(best) = rank_candidate(kind, &query.name, &self.site, &items) {
                return Some(best);
            }
        }
        None
    }
}

/// Score every item that passes the filters and keep the best one.
/// Equal scores keep whichever candidate was seen first.
pub fn rank_candidate(
    kind: ProfileKind,
    name: &str,
    site: &str,
    items: &[SearchItem],
) -> Option<Triplet> {
    items
        .iter()
        .filter(|item| {
            if item.kind != RESULT_KIND {
                warn!("Search returned result of different kind: {}", item.kind);
                return false;
            }
            if !item.link.contains(site) {
                debug!("Not from {}: {}", site, item.link);
                return false;
            }
            true
        })
        .filter_map(|item| {
            let base = base_confidence(kind, item)?;
            Some((base + name_bonus(kind, name, &item.title), item))
        })
        .fold(None, |best: Option<(i32, &SearchItem)>, (score, item)| match best {
            Some((top, _)) if top >= score => best,
            _ => Some((score, item)),
        })
        .map(|(confidence, item)| Triplet {
            confidence,
            title: item.title.clone(),
            url: item.link.clone(),
        })
}

fn base_confidence(kind: ProfileKind, item: &SearchItem) -> Option<i32> {
    let url = item.link.as_str();
    match kind {
        ProfileKind::Person => {
            if url.contains("/in/") || (url.contains("/pub/") && !url.contains("/pub/dir/")) {
                debug!("Profile detected - confidence 10");
                return Some(10);
            }
            if url.contains("/pub/dir/") || url.contains("/title/") {
                debug!("Not personal profile: {}", url);
                return None;
            }
            let title = item.title.to_lowercase();
            if title.contains("top") || title.contains("profiles") {
                debug!("Not personal profile: {}", title);
                return None;
            }
            debug!("Profile detected - confidence 5");
            Some(5)
        }
        ProfileKind::Company => {
            if url.contains("/company/") {
                debug!("Company detected - confidence 40");
                return Some(40);
            }
            if url.contains("/jobs/") || url.contains("/title/") {
                debug!("Not company profile: {}", url);
                return None;
            }
            debug!("Potential company detected - confidence 5");
            Some(5)
        }
    }
}

fn name_bonus(kind: ProfileKind, name: &str, title: &str) -> i32 {
    match kind {
        ProfileKind::Person => name
            .split_whitespace()
            .filter(|part| title.contains(part))
            .map(|_| 20)
            .sum(),
        ProfileKind::Company => {
            let name = name.trim().to_lowercase();
            if !name.is_empty() && title.to_lowercase().contains(&name) {
                10
            } else {
                0
            }
        }
    }
}

/// People CSV: header row, then `_, name, location, title, ...`.
pub fn read_people(path: &Path, limit: Option<usize>) -> Result<Vec<SearchQuery>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut queries = Vec::new();
    for record in reader.records() {
        if limit.is_some_and(|n| queries.len() >= n) {
            break;
        }
        let record = record.with_context(|| format!("Malformed row in {}", path.display()))?;
        let parts: Vec<&str> = (1..4).filter_map(|i| record.get(i)).map(str::trim).collect();
        let Some(name) = parts.first() else {
            warn!("Skipping row without a name: {:?}", record);
            continue;
        };
        queries.push(SearchQuery {
            name: name.to_string(),
            keyword: parts.join(" "),
        });
    }
    Ok(queries)
}

/// Company list: one name per line; `[start, end)` selects a slice of lines.
pub fn read_companies(path: &Path, start: usize, end: Option<usize>) -> Result<Vec<SearchQuery>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let lines: Vec<&str> = content.lines().collect();
    let end = end.unwrap_or(lines.len()).min(lines.len());
    let start = start.min(end);
    Ok(lines[start..end]
        .iter()
        .map(|line| SearchQuery {
            keyword: line.trim().to_string(),
            name: line.trim().to_string(),
        })
        .collect())
}

/// Look up every query in order. Positions in the output match the input.
pub async fn search_all(
    client: &SearchClient,
    kind: ProfileKind,
    queries: &[SearchQuery],
) -> Vec<Option<Triplet>> {
    let mut results = Vec::with_capacity(queries.len());
    for query in queries {
        let found = client.find_profile(kind, query).await;
        match &found {
            Some(t) => info!("{} -> {} (confidence {})", query.name, t.url, t.confidence),
            None => warn!("No profile found for {}", query.name),
        }
        results.push(found);
    }
    results
}
