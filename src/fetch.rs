use std::time::Duration;

use crate::error::ScrapeError;

const USER_AGENT: &str = "handa-archiver/0.1";

/// Status code and body of a fetched page.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Raw page fetch. The scraper only ever awaits one call at a time.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn get(&self, url: &str) -> Result<FetchResponse, ScrapeError>;
}

/// Fetches pages over HTTP with a shared cookie-aware client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ScrapeError> {
        let insecure = std::env::var("HANDA_INSECURE_SSL").as_deref() == Ok("1");

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let mut builder = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .default_headers(headers);

        if insecure {
            tracing::warn!("TLS certificate validation disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;
        Ok(Self { client })
    }

    /// The underlying client, shared with the login and download stage so
    /// session cookies carry over.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Fetch for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, ScrapeError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchResponse { status, body })
    }
}
