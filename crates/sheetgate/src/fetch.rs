// Spreadsheet fetching — source selection, HTTP retrieval into
// normalized records, last-wins cancellation, and auto-refresh.
//
// A new fetch supersedes any in-flight fetch for the same coordinator;
// superseded results are discarded silently. There is no
// retry-with-backoff: a failed fetch surfaces its error and waits for
// the caller or the next refresh tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Deserialize;

use sheetgate_core::error::GateError;
use sheetgate_core::logger::GateLogger;
use sheetgate_core::options::{FetchOptions, PipelineOptions};
use sheetgate_core::utils::url as urlutil;

use crate::ingest::csv;
use crate::ingest::records::{normalize_rows, Record};

/// Where a dataset comes from: the public CSV export endpoint, or the
/// authenticated values API when an API key is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSource {
    CsvExport {
        spreadsheet_id: String,
        gid: Option<u64>,
    },
    ValuesApi {
        spreadsheet_id: String,
        api_key: String,
        range: Option<String>,
    },
}

impl SheetSource {
    /// Derive a source from a share URL and the fetch configuration.
    pub fn from_url(share_url: &str, options: &FetchOptions) -> Result<Self, GateError> {
        let spreadsheet_id = urlutil::extract_spreadsheet_id(share_url)
            .ok_or_else(|| GateError::malformed_input("no spreadsheet id in URL"))?;

        Ok(match &options.api_key {
            Some(api_key) => Self::ValuesApi {
                spreadsheet_id,
                api_key: api_key.clone(),
                range: None,
            },
            None => Self::CsvExport {
                spreadsheet_id,
                gid: urlutil::extract_gid(share_url),
            },
        })
    }

    /// The concrete URL to fetch.
    pub fn request_url(&self) -> String {
        match self {
            Self::CsvExport {
                spreadsheet_id,
                gid,
            } => {
                let mut url = format!(
                    "https://docs.google.com/spreadsheets/d/{spreadsheet_id}/export?format=csv"
                );
                if let Some(gid) = gid {
                    url.push_str(&format!("&gid={gid}"));
                }
                url
            }
            Self::ValuesApi {
                spreadsheet_id,
                api_key,
                range,
            } => {
                let range = range.as_deref().unwrap_or("A:ZZ");
                format!(
                    "https://sheets.googleapis.com/v4/spreadsheets/{spreadsheet_id}/values/{range}?key={api_key}"
                )
            }
        }
    }
}

/// Values API response: an array of string rows.
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Fetches a source and runs the rows through the normalizer.
pub struct SheetFetcher {
    http: reqwest::Client,
    pipeline: PipelineOptions,
    logger: GateLogger,
}

impl std::fmt::Debug for SheetFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetFetcher")
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl SheetFetcher {
    pub fn new(pipeline: PipelineOptions) -> Self {
        Self {
            http: reqwest::Client::new(),
            pipeline,
            logger: GateLogger::default(),
        }
    }

    pub fn with_logger(mut self, logger: GateLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Fetch and normalize one dataset.
    pub async fn fetch(&self, source: &SheetSource) -> Result<Vec<Record>, GateError> {
        let response = self
            .http
            .get(source.request_url())
            .send()
            .await
            .map_err(|e| GateError::network(format!("spreadsheet fetch failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GateError::network(format!(
                "spreadsheet endpoint returned {status}"
            )));
        }

        match source {
            SheetSource::CsvExport { .. } => {
                let text = response
                    .text()
                    .await
                    .map_err(|e| GateError::network(format!("reading export body: {e}")))?;
                let rows = if self.pipeline.strict_quotes {
                    csv::tokenize_strict(&text)?
                } else {
                    csv::tokenize(&text)
                };
                normalize_rows(&rows)
            }
            SheetSource::ValuesApi { .. } => {
                let body: ValuesResponse = response
                    .json()
                    .await
                    .map_err(|e| GateError::network(format!("reading values body: {e}")))?;
                normalize_rows(&body.values)
            }
        }
    }
}

/// Last-wins coordination: each `start()` supersedes every fetch begun
/// before it.
#[derive(Debug, Default)]
pub struct FetchCoordinator {
    current: Arc<AtomicU64>,
}

/// Marks one in-flight fetch; stale guards must not apply their result.
#[derive(Debug)]
pub struct FetchGuard {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl FetchGuard {
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fetch generation, superseding all earlier ones.
    pub fn start(&self) -> FetchGuard {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        FetchGuard {
            generation,
            current: self.current.clone(),
        }
    }

    /// Fetch through the coordinator. Returns `Ok(None)` when the fetch
    /// was superseded mid-flight — a silent no-op, never an error.
    pub async fn fetch_latest(
        &self,
        fetcher: &SheetFetcher,
        source: &SheetSource,
    ) -> Result<Option<Vec<Record>>, GateError> {
        let guard = self.start();
        let result = fetcher.fetch(source).await;
        if !guard.is_current() {
            fetcher.logger.debug("fetch superseded, result discarded");
            return Ok(None);
        }
        result.map(Some)
    }
}

/// Handle for a running auto-refresh loop. Dropping it aborts the
/// timer task, so no callback outlives the consumer.
#[derive(Debug)]
pub struct RefreshHandle {
    task: tokio::task::JoinHandle<()>,
}

impl RefreshHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Periodically re-fetch a source, publishing each successful dataset
/// to the returned watch channel. Failed ticks log and wait for the
/// next one.
pub fn auto_refresh(
    fetcher: Arc<SheetFetcher>,
    source: SheetSource,
    every: std::time::Duration,
) -> (
    RefreshHandle,
    tokio::sync::watch::Receiver<Option<Vec<Record>>>,
) {
    let (tx, rx) = tokio::sync::watch::channel(None);
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match fetcher.fetch(&source).await {
                Ok(records) => {
                    if tx.send(Some(records)).is_err() {
                        // Receiver gone: the consumer was torn down.
                        break;
                    }
                }
                Err(e) => {
                    fetcher
                        .logger
                        .error(&format!("auto-refresh fetch failed: {e}"));
                }
            }
        }
    });
    (RefreshHandle { task }, rx)
}
