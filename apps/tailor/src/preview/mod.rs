//! Document Preview Renderer — fetches the generated document and converts
//! it to displayable HTML.
//!
//! Failures degrade to a typed error the caller shows as an inline "failed
//! to load preview" message; they never take down the rest of the run. The
//! renderer caches by URL: rendering the same URL twice does not re-fetch,
//! a changed URL always does.

pub mod docx;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to convert document: {0}")]
    Convert(String),
}

pub struct PreviewRenderer {
    http: Client,
    cached: Option<(String, String)>,
}

impl PreviewRenderer {
    pub fn new() -> Self {
        PreviewRenderer {
            http: Client::new(),
            cached: None,
        }
    }

    /// Fetches the document at `url` and returns its HTML preview.
    pub async fn render(&mut self, url: &str) -> Result<String, PreviewError> {
        if let Some((cached_url, html)) = &self.cached {
            if cached_url == url {
                debug!("preview cache hit for {url}");
                return Ok(html.clone());
            }
        }

        let response = self.http.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        let html = docx::convert_to_html(&bytes)?;

        self.cached = Some((url.to_string(), html.clone()));
        Ok(html)
    }
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self::new()
    }
}
