//! Search hit and error types

use std::fmt;
use thiserror::Error;

/// A single structured search result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHit {
    /// Result title text
    pub title: String,
    /// Target of the title anchor
    pub link: String,
    /// Snippet text
    pub snippet: String,
}

impl SearchHit {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}

impl fmt::Display for SearchHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "Link: {}", self.link)?;
        writeln!(f, "Snippet: {}", self.snippet)
    }
}

/// What a successful search produced
///
/// `NoResults` means the provider answered but no result containers were
/// found, which is distinct from a failed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Hits(Vec<SearchHit>),
    NoResults,
}

impl SearchOutcome {
    /// Wrap extracted hits, mapping an empty list to `NoResults`
    pub fn from_hits(hits: Vec<SearchHit>) -> Self {
        if hits.is_empty() {
            Self::NoResults
        } else {
            Self::Hits(hits)
        }
    }

    pub fn hits(&self) -> &[SearchHit] {
        match self {
            Self::Hits(hits) => hits,
            Self::NoResults => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.hits().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoResults)
    }

    /// Text block inserted into the prompt
    pub fn render(&self) -> String {
        match self {
            Self::Hits(hits) => hits
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
            Self::NoResults => "No results found.".to_string(),
        }
    }
}

/// Errors from the search retriever
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("failed to perform search: {0}")]
    Network(String),

    #[error("search request failed with status code: {0}")]
    BadStatus(u16),

    #[error("failed to read response body: {0}")]
    ReadFailure(String),

    #[error("CAPTCHA detected, unable to proceed")]
    CaptchaDetected,

    #[error("failed to parse search results: {0}")]
    ParseFailure(String),
}
