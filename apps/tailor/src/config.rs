use anyhow::{Context, Result};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Client configuration loaded from environment variables.
/// Everything is optional; the backend base URL falls back to the local
/// development server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the resume backend, without a trailing slash.
    pub api_base: String,
    /// Optional Gemini/OpenAI API key forwarded on preview/generate calls.
    pub api_key: Option<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_base = std::env::var("TAILOR_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        if api_base.is_empty() {
            return Err(anyhow::anyhow!("TAILOR_API_BASE must not be empty"))
                .context("invalid configuration");
        }

        Ok(Config {
            api_base,
            api_key: std::env::var("TAILOR_API_KEY").ok().filter(|k| !k.is_empty()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_has_no_trailing_slash() {
        assert!(!DEFAULT_API_BASE.ends_with('/'));
    }
}
