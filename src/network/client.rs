//! HTTP client for talking to the search provider

use super::user_agent::{accept_html, accept_language, generate_user_agent};
use crate::config::SearchSettings;
use anyhow::Result;
use reqwest::{Client, Response};
use std::time::Duration;

/// HTTP client wrapper with browser-like request defaults
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    /// Fixed identity; `None` means a fresh one per request
    user_agent: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&SearchSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &SearchSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .gzip(true)
            .brotli(true)
            .build()?;

        let user_agent = if settings.rotate_user_agent {
            None
        } else {
            Some(
                settings
                    .user_agent
                    .clone()
                    .unwrap_or_else(generate_user_agent),
            )
        };

        Ok(Self {
            client,
            default_timeout: settings.request_timeout(),
            user_agent,
        })
    }

    /// GET an HTML page, bounded by the client's own timeout
    pub async fn get_html(&self, url: &str) -> reqwest::Result<Response> {
        self.client
            .get(url)
            .timeout(self.default_timeout)
            .header("User-Agent", self.user_agent())
            .header("Accept", accept_html())
            .header("Accept-Language", accept_language())
            .header("DNT", "1")
            .send()
            .await
    }

    /// The user agent for the next request
    pub fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(generate_user_agent)
    }
}
