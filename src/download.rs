use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::error::FetchError;
use crate::triplets::Triplet;

const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Turn a page title into a file name: unsafe characters become `-`,
/// the stem is cut to `max_len` chars, `.html` is appended.
pub fn make_filename(title: &str, max_len: usize) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if UNSAFE_CHARS.contains(&c) || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .take(max_len)
        .collect();
    format!("{}.html", stem)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Saved { bytes: usize },
    Skipped,
}

/// Save the body of `url` to `dest`. An existing `dest` is left alone unless `overwrite`.
pub async fn fetch_one(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    overwrite: bool,
) -> Result<FetchOutcome, FetchError> {
    if !overwrite && dest.is_file() {
        error!("File exists: {}. Abort.", dest.display());
        return Ok(FetchOutcome::Skipped);
    }

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        warn!("{} answered {}", url, status);
    }
    let body = response.bytes().await?;
    tokio::fs::write(dest, &body)
        .await
        .map_err(|source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
    info!("Successfully saved {}.", url);
    Ok(FetchOutcome::Saved { bytes: body.len() })
}

/// One unit of download work: position in the results file, page title, URL.
#[derive(Debug, Clone)]
pub struct FetchItem {
    pub rank: usize,
    pub label: String,
    pub url: String,
}

enum Task {
    Fetch(FetchItem),
    Stop,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkStats {
    pub total: usize,
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Save every item into `dir` under its `make_filename` name.
pub async fn bulk_fetch(
    client: reqwest::Client,
    items: Vec<FetchItem>,
    dir: &Path,
    max_len: usize,
    workers: usize,
    overwrite: bool,
) -> BulkStats {
    let dir: PathBuf = dir.to_path_buf();
    let job = move |item: FetchItem| {
        let client = client.clone();
        let dest = dir.join(make_filename(&item.label, max_len));
        async move { fetch_one(&client, &item.url, &dest, overwrite).await }
    };

    let stats = run_pool(items, workers, job).await;
    info!(
        "Downloaded {} pages ({} saved, {} skipped, {} failed)",
        stats.total, stats.saved, stats.skipped, stats.failed
    );
    stats
}

/// Drain `items` with a fixed pool of `workers` tasks sharing one FIFO queue.
/// Each job runs in its own task, so a panicking job is reported as a failure.
/// Once every item has reported back, each worker gets a `Stop` sentinel.
async fn run_pool<F, Fut>(items: Vec<FetchItem>, workers: usize, job: F) -> BulkStats
where
    F: Fn(FetchItem) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<FetchOutcome, FetchError>> + Send + 'static,
{
    let total = items.len();
    let workers = workers.max(1);

    let pb = ProgressBar::new(total as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    let (task_tx, task_rx) = mpsc::unbounded_channel::<Task>();
    let task_rx = Arc::new(Mutex::new(task_rx));
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Result<FetchOutcome, FetchError>>();

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let job = job.clone();
        let task_rx = Arc::clone(&task_rx);
        let done_tx = done_tx.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let task = task_rx.lock().await.recv().await;
                let item = match task {
                    Some(Task::Fetch(item)) => item,
                    Some(Task::Stop) | None => break,
                };
                let (rank, label, url) = (item.rank, item.label.clone(), item.url.clone());
                let outcome = match tokio::spawn(job(item)).await {
                    Ok(outcome) => outcome,
                    Err(e) => Err(FetchError::Aborted(e.to_string())),
                };
                match &outcome {
                    Ok(FetchOutcome::Saved { bytes }) => {
                        debug!("[worker {}] #{} {} ({} bytes)", worker, rank, label, bytes)
                    }
                    Ok(FetchOutcome::Skipped) => {}
                    Err(e) => error!("[worker {}] #{} {} failed: {}", worker, rank, url, e),
                }
                if done_tx.send(outcome).is_err() {
                    break;
                }
            }
        }));
    }
    drop(done_tx);

    for item in items {
        // Receiver lives in the shared Arc; send cannot fail while workers hold it.
        let _ = task_tx.send(Task::Fetch(item));
    }

    let mut stats = BulkStats {
        total,
        ..Default::default()
    };
    for _ in 0..total {
        match done_rx.recv().await {
            Some(Ok(FetchOutcome::Saved { .. })) => stats.saved += 1,
            Some(Ok(FetchOutcome::Skipped)) => stats.skipped += 1,
            Some(Err(_)) => stats.failed += 1,
            None => break,
        }
        pb.inc(1);
    }

    for _ in 0..workers {
        let _ = task_tx.send(Task::Stop);
    }
    for handle in handles {
        if let Err(e) = handle.await {
            error!("Download worker panicked: {}", e);
        }
    }

    pb.finish_and_clear();
    stats
}

/// Download every found profile in `results` into `profiles_dir`.
pub async fn download_all(
    settings: &Settings,
    results: &[Option<Triplet>],
    overwrite: bool,
    workers: usize,
) -> Result<BulkStats> {
    std::fs::create_dir_all(&settings.profiles_dir)
        .with_context(|| format!("Failed to create {}", settings.profiles_dir.display()))?;

    let client = reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .build()
        .context("Failed to build HTTP client")?;

    let items: Vec<FetchItem> = results
        .iter()
        .enumerate()
        .filter_map(|(i, t)| {
            let t = t.as_ref()?;
            Some(FetchItem {
                rank: i + 1,
                label: t.title.clone(),
                url: t.url.clone(),
            })
        })
        .collect();

    Ok(bulk_fetch(
        client,
        items,
        &settings.profiles_dir,
        settings.filename_max_len,
        workers,
        overwrite,
    )
    .await)
}
