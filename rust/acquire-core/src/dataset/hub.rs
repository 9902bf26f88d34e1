// rust/acquire-core/src/dataset/hub.rs

//! Streaming source over the dataset hub rows API.
//!
//! Rows are pulled page by page with a blocking HTTP client, so nothing is
//! downloaded ahead of what the consumer asks for. The first page is fetched
//! while opening the stream; a bad dataset id, split or token therefore fails
//! at `open` instead of mid-stream.

use std::collections::VecDeque;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::HubConfig;
use crate::error::{AcquireError, Result};

use super::traits::{Record, RecordSource, RecordStream, StreamRequest};

const USER_AGENT: &str = concat!("acquire-core/", env!("CARGO_PKG_VERSION"));

/// Config name the rows API uses for datasets without subsets.
const DEFAULT_CONFIG: &str = "default";

/// Record source backed by the hub rows endpoint.
pub struct HubSource {
    client: Client,
    endpoint: String,
    page_size: usize,
    token: Option<String>,
}

impl HubSource {
    /// Creates a source with the token resolved from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &HubConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AcquireError::config_with_source("failed to create HTTP client", e))?;

        Ok(Self::with_client(client, config))
    }

    pub(crate) fn with_client(client: Client, config: &HubConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            token: Self::resolve_token(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Token from `HF_TOKEN`, falling back to `HUGGING_FACE_HUB_TOKEN`.
    pub fn resolve_token() -> Option<String> {
        ["HF_TOKEN", "HUGGING_FACE_HUB_TOKEN"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|token| token.trim().to_string())
            .find(|token| !token.is_empty())
    }

    fn fetcher(&self, request: &StreamRequest) -> PageFetcher {
        PageFetcher {
            client: self.client.clone(),
            url: format!("{}/rows", self.endpoint),
            token: self.token.clone(),
            request: request.clone(),
            page_size: self.page_size,
        }
    }
}

impl RecordSource for HubSource {
    fn open(&self, request: &StreamRequest) -> Result<RecordStream> {
        tracing::info!(stream = %request, "opening stream");
        let mut stream = RowStream::new(self.fetcher(request));
        stream.prime().map_err(|message| {
            AcquireError::source_open(&request.repo, &request.split, message)
        })?;
        Ok(Box::new(stream))
    }
}

/// One page of the rows API response.
#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
    #[serde(default)]
    num_rows_total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: Record,
    #[serde(default)]
    truncated_cells: Vec<String>,
}

/// Issues rows requests for one stream.
struct PageFetcher {
    client: Client,
    url: String,
    token: Option<String>,
    request: StreamRequest,
    page_size: usize,
}

impl PageFetcher {
    fn query(&self, offset: u64) -> Vec<(&'static str, String)> {
        vec![
            ("dataset", self.request.repo.clone()),
            (
                "config",
                self.request
                    .config
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CONFIG.to_string()),
            ),
            ("split", self.request.split.clone()),
            ("offset", offset.to_string()),
            ("length", self.page_size.to_string()),
        ]
    }

    fn fetch(&self, offset: u64) -> std::result::Result<RowsPage, String> {
        let mut request = self.client.get(&self.url).query(&self.query(offset));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(describe_status(status, detail.trim()));
        }

        response
            .json::<RowsPage>()
            .map_err(|e| format!("failed to parse rows response: {e}"))
    }
}

fn describe_status(status: StatusCode, detail: &str) -> String {
    let reason = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "authentication failed",
        StatusCode::NOT_FOUND => "dataset, config or split not found",
        StatusCode::TOO_MANY_REQUESTS => "rate limited",
        _ => "unexpected response",
    };
    if detail.is_empty() {
        format!("{reason} (HTTP {status})")
    } else {
        format!("{reason} (HTTP {status}): {detail}")
    }
}

/// Lazy iterator over every row of one split.
struct RowStream {
    fetcher: PageFetcher,
    buffer: VecDeque<Record>,
    offset: u64,
    total: Option<u64>,
    finished: bool,
}

impl RowStream {
    fn new(fetcher: PageFetcher) -> Self {
        Self {
            fetcher,
            buffer: VecDeque::new(),
            offset: 0,
            total: None,
            finished: false,
        }
    }

    /// Fetch the first page so open-time failures surface immediately.
    fn prime(&mut self) -> std::result::Result<(), String> {
        self.fetch_next_page()
    }

    fn fetch_next_page(&mut self) -> std::result::Result<(), String> {
        let page = self.fetcher.fetch(self.offset)?;
        self.absorb(page);
        Ok(())
    }

    fn absorb(&mut self, page: RowsPage) {
        if page.num_rows_total.is_some() {
            self.total = page.num_rows_total;
        }

        if page.rows.is_empty() {
            self.finished = true;
            return;
        }

        for entry in page.rows {
            if !entry.truncated_cells.is_empty() {
                tracing::warn!(
                    stream = %self.fetcher.request,
                    offset = self.offset,
                    cells = ?entry.truncated_cells,
                    "hub truncated cells in row"
                );
            }
            self.buffer.push_back(entry.row);
            self.offset += 1;
        }

        if self.total.is_some_and(|total| self.offset >= total) {
            self.finished = true;
        }
    }
}

impl Iterator for RowStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }

            if self.finished {
                return None;
            }

            if let Err(message) = self.fetch_next_page() {
                self.finished = true;
                let request = &self.fetcher.request;
                return Some(Err(AcquireError::stream(
                    &request.repo,
                    &request.split,
                    message,
                )));
            }
        }
    }
}
