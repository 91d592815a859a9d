use thiserror::Error;

/// Failures while scraping the archive. All of them abort the run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{url} returned {status}")]
    Transport { url: String, status: u16 },

    #[error("{0}")]
    Request(String),

    #[error("{0}")]
    Structure(String),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{0} returned 404")]
    NotFound(String),

    #[error("Login failed: {0}")]
    Login(String),

    #[error("{url} returned {status}")]
    Status { url: String, status: u16 },

    #[error("{0}")]
    Request(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Two episodes exist with filename: {0}")]
    DuplicateFilename(String),

    #[error("Tagging failed: {0}")]
    Tag(#[from] lofty::error::LoftyError),

    #[error("Override file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Config(String),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScrapeError::Request(format!("TimeoutError: {}", e))
        } else if e.is_connect() {
            ScrapeError::Request(format!("ConnectError: {}", e))
        } else {
            ScrapeError::Request(format!("RequestError: {}", e))
        }
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        DownloadError::Request(e.to_string())
    }
}
