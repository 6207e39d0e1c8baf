use crate::config::SourceConfig;
use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// One page of a volume search, decoded once at the boundary. Every field the
/// source may omit is optional here; downstream code never re-checks raw JSON.
#[derive(Debug, Deserialize)]
pub struct VolumesResponse {
    #[serde(default)]
    pub items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
pub struct Volume {
    pub id: Option<String>,
    #[serde(rename = "volumeInfo", default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeInfo {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub published_date: Option<String>,
    pub average_rating: Option<f64>,
    pub ratings_count: Option<u32>,
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
    pub small_thumbnail: Option<String>,
}

/// Decodes a raw response body. Fails on malformed JSON, an empty body, or a
/// `null` document.
pub fn decode(raw: &str) -> Result<VolumesResponse, serde_json::Error> {
    serde_json::from_str(raw)
}

#[derive(Clone)]
pub struct GoogleBooksClient {
    client: Client,
    base_url: String,
}

impl GoogleBooksClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("Bookject/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// One outbound GET per invocation, no retries. The query string (empty
    /// allowed) is appended to the configured base endpoint.
    pub async fn fetch(&self, query: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, urlencoding::encode(query));
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("volume search returned {} - {}", status, body);
        }

        Ok(response.text().await?)
    }
}
