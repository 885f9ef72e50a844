//! Transient-vs-fatal classification of provider errors.
//!
//! The heuristic lives here and nowhere else: call sites ask the classifier
//! instead of matching on error text themselves.

use crate::error::ProviderError;
use regex::{Regex, RegexSet};
use std::sync::LazyLock;

/// Error text that signals a retryable condition.
pub const DEFAULT_TRANSIENT_PATTERNS: &[&str] = &[
    // status numbers only count next to HTTP wording, never bare
    r"(?i)\b(http|status)[a-z ]*[: ]+(50[234]|429)\b",
    r"(?i)bad gateway",
    r"(?i)service unavailable",
    r"(?i)gateway time-?out",
    r"(?i)too many requests",
    r"(?i)rate[ -]?limit",
    r"(?i)timed? ?out",
    r"(?i)temporar(il)?y unavailable",
    r"(?i)try again later",
];

const TRANSIENT_HTTP_STATUSES: &[u16] = &[429, 502, 503, 504];

/// JSON-RPC codes providers use for throttling.
const TRANSIENT_RPC_CODES: &[i64] = &[429, -32005];

const RANGE_TOO_LARGE_PATTERNS: &[&str] = &[
    r"(?i)exceeds? max results",
    r"(?i)query returned more than \d+ results",
    r"(?i)block range (is )?too (large|wide)",
    r"(?i)log response size exceeded",
    r"(?i)response size (should not|exceeds?)",
];

static RANGE_TOO_LARGE: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(RANGE_TOO_LARGE_PATTERNS).expect("range limit patterns are valid")
});

static SUGGESTED_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"retry with the range (\d+)-(\d+)").expect("suggested range pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retry the same endpoint after a backoff, then fail over.
    Transient,
    /// Abort immediately and propagate.
    Fatal,
}

impl ErrorClass {
    pub fn is_transient(self) -> bool {
        self == ErrorClass::Transient
    }
}

/// Extensible transient-error predicate.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    patterns: Vec<String>,
    matcher: RegexSet,
    http_statuses: Vec<u16>,
    rpc_codes: Vec<i64>,
}

impl ErrorClassifier {
    /// Classifier with the default transient signals.
    pub fn new() -> Self {
        let patterns: Vec<String> = DEFAULT_TRANSIENT_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .collect();
        let matcher = RegexSet::new(&patterns).expect("default transient patterns are valid");
        ErrorClassifier {
            patterns,
            matcher,
            http_statuses: TRANSIENT_HTTP_STATUSES.to_vec(),
            rpc_codes: TRANSIENT_RPC_CODES.to_vec(),
        }
    }

    /// Adds a regex whose match in the error text marks it transient.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.patterns.push(pattern.to_string());
        self.matcher = RegexSet::new(&self.patterns)?;
        Ok(self)
    }

    pub fn with_patterns<I, S>(self, patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        patterns
            .into_iter()
            .try_fold(self, |classifier, p| classifier.with_pattern(p.as_ref()))
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_statuses.push(status);
        self
    }

    pub fn with_rpc_code(mut self, code: i64) -> Self {
        self.rpc_codes.push(code);
        self
    }

    pub fn classify(&self, err: &ProviderError) -> ErrorClass {
        // Retrying an oversized range fails the same way on every endpoint.
        if range_limit(err).is_some() {
            return ErrorClass::Fatal;
        }

        let transient = match err {
            ProviderError::Timeout(_) => true,
            ProviderError::Http { status, body } => {
                self.http_statuses.contains(status) || self.matcher.is_match(body)
            }
            ProviderError::Rpc { code, message } => {
                self.rpc_codes.contains(code) || self.matcher.is_match(message)
            }
            ProviderError::Transport(message) => self.matcher.is_match(message),
            ProviderError::Decode(_) => false,
        };

        if transient {
            ErrorClass::Transient
        } else {
            ErrorClass::Fatal
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// A provider refused a log query because the range yields too many results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeLimit {
    /// Last block of the range the provider suggested instead, if any.
    pub suggested_to: Option<u64>,
}

/// Recognises "range too large" rejections and extracts the provider's hint.
pub fn range_limit(err: &ProviderError) -> Option<RangeLimit> {
    let text = match err {
        ProviderError::Rpc { message, .. } => message.as_str(),
        ProviderError::Http { body, .. } => body.as_str(),
        ProviderError::Transport(message) => message.as_str(),
        ProviderError::Timeout(_) | ProviderError::Decode(_) => return None,
    };

    if !RANGE_TOO_LARGE.is_match(text) {
        return None;
    }

    let suggested_to = SUGGESTED_RANGE
        .captures(text)
        .and_then(|c| c.get(2))
        .and_then(|m| m.as_str().parse().ok());

    Some(RangeLimit { suggested_to })
}
