//! Where raw daily records come from.
//!
//! Each dataset is delivered as one bulk JSON document; there is no way to ask
//! a source for a single month. The store is populated from that document.

use crate::series_data::error::FetchError;
use crate::types::dataset::Dataset;
use crate::types::record::RawRecord;
use async_compression::tokio::bufread::GzipDecoder;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::Client;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

/// Delivers the complete, unordered record set of a dataset.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch(&self, dataset: Dataset) -> Result<Vec<RawRecord>, FetchError>;
}

async fn parse_records(bytes: Vec<u8>, origin: String) -> Result<Vec<RawRecord>, FetchError> {
    tokio::task::spawn_blocking(move || {
        serde_json::from_slice::<Vec<RawRecord>>(&bytes)
            .map_err(|e| FetchError::JsonParse(origin, e))
    })
    .await?
}

/// Fetches `{base_url}/{dataset}.json` over HTTP.
///
/// Compressed transfer is negotiated by the client.
#[derive(Debug, Clone)]
pub struct HttpSeriesSource {
    base_url: String,
    client: Client,
}

impl HttpSeriesSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    pub fn url_for(&self, dataset: Dataset) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            dataset.source_file_name()
        )
    }
}

#[async_trait]
impl SeriesSource for HttpSeriesSource {
    async fn fetch(&self, dataset: Dataset) -> Result<Vec<RawRecord>, FetchError> {
        let url = self.url_for(dataset);
        log::info!("Downloading {} series from {}", dataset, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url, e)
                });
            }
        };

        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await?;
        log::debug!("Downloaded {} bytes from {}", body.len(), url);

        parse_records(body, url).await
    }
}

/// Reads `{dir}/{dataset}.json`, or its gzip-compressed `{dataset}.json.gz`
/// sibling when the plain file is absent.
#[derive(Debug, Clone)]
pub struct FileSeriesSource {
    dir: PathBuf,
}

impl FileSeriesSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_gzip(path: &Path) -> Result<Vec<u8>, FetchError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| FetchError::SourceFileRead(path.to_path_buf(), e))?;
        let mut decoder = GzipDecoder::new(BufReader::new(file));
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).await?;
        Ok(decompressed)
    }
}

#[async_trait]
impl SeriesSource for FileSeriesSource {
    async fn fetch(&self, dataset: Dataset) -> Result<Vec<RawRecord>, FetchError> {
        let plain = self.dir.join(dataset.source_file_name());
        let bytes = match tokio::fs::read(&plain).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let compressed = self
                    .dir
                    .join(format!("{}.gz", dataset.source_file_name()));
                log::debug!("{:?} not found, trying {:?}", plain, compressed);
                match Self::read_gzip(&compressed).await {
                    Ok(bytes) => bytes,
                    Err(FetchError::SourceFileRead(_, e))
                        if e.kind() == io::ErrorKind::NotFound =>
                    {
                        return Err(FetchError::SourceFileMissing { plain, compressed });
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(FetchError::SourceFileRead(plain, e)),
        };
        parse_records(bytes, plain.display().to_string()).await
    }
}
