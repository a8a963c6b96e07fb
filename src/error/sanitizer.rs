//! Sanitization of diagnostic messages.
//!
//! Backend failures are reported to the diagnostic log, which in a host
//! application often ends up in crash reporters or shared device logs.
//! Messages are scrubbed of:
//!
//! - SDK keys (32 or more hex characters)
//! - Email addresses
//! - IPv4 addresses
//! - File paths (Unix and Windows)

use lazy_static::lazy_static;
use regex::Regex;

/// Configuration for diagnostic message sanitization.
#[derive(Debug, Clone)]
pub struct ErrorSanitizationConfig {
    /// Whether sanitization is enabled. Defaults to true.
    pub enabled: bool,
}

impl Default for ErrorSanitizationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ErrorSanitizationConfig {
    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}

lazy_static! {
    static ref PATTERNS: Vec<(Regex, &'static str)> = vec![
        // SDK keys are hex digests
        (Regex::new(r"\b[a-fA-F0-9]{32,}\b").unwrap(), "[SDK_KEY]"),
        // Email addresses (including + for plus addressing)
        (Regex::new(r"[\w.+-]+@[\w.-]+\.\w+").unwrap(), "[EMAIL]"),
        (Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").unwrap(), "[IP]"),
        (Regex::new(r"/(?:[\w.-]+/)+[\w.-]+").unwrap(), "[PATH]"),
        (Regex::new(r"[A-Za-z]:\\(?:[\w.-]+\\)+[\w.-]*").unwrap(), "[PATH]"),
    ];
}

/// Replace sensitive fragments of `message` with placeholders.
///
/// Returns the message unchanged when sanitization is disabled.
///
/// ```
/// use fme_bridge::error::{sanitize_message, ErrorSanitizationConfig};
///
/// let config = ErrorSanitizationConfig::default();
/// let sanitized = sanitize_message("Rejected key for ops@example.com", &config);
/// assert_eq!(sanitized, "Rejected key for [EMAIL]");
/// ```
pub fn sanitize_message(message: &str, config: &ErrorSanitizationConfig) -> String {
    if !config.enabled {
        return message.to_string();
    }

    let mut result = message.to_string();
    for (pattern, replacement) in PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }
    result
}
