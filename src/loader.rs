//! Input loading from various sources.
//!
//! Handles loading stored records and resource payloads from files,
//! strings, and HTTP URLs. Mapping itself never performs I/O; this module
//! exists for the CLI and for callers that keep fixtures on disk.

use std::path::Path;

use serde_json::Value;

use crate::error::InputError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a JSON input from a file path.
///
/// # Errors
///
/// Returns `InputError::FileNotFound` if the file doesn't exist,
/// or `InputError::InvalidJson` if the file isn't valid JSON.
pub fn load_input(path: &Path) -> Result<Value, InputError> {
    if !path.exists() {
        return Err(InputError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| InputError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| InputError::InvalidJson { source })
}

/// Load a JSON input from a string.
///
/// # Errors
///
/// Returns `InputError::InvalidJson` if the string isn't valid JSON.
pub fn load_input_str(content: &str) -> Result<Value, InputError> {
    serde_json::from_str(content).map_err(|source| InputError::InvalidJson { source })
}

/// Load a JSON input from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `InputError::NetworkError` if the request fails,
/// or `InputError::InvalidJson` if the response isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_input_url(url: &str) -> Result<Value, InputError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| InputError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .send()
        .map_err(|source| InputError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    // Check for HTTP errors before parsing
    let response = response
        .error_for_status()
        .map_err(|source| InputError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    response.json().map_err(|source| InputError::NetworkError {
        url: url.to_string(),
        source,
    })
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a JSON input from a file path or URL, dispatching on the source
/// string. Without the `remote` feature, URL sources fail as missing
/// files rather than silently fetching.
pub fn load_input_auto(source: &str) -> Result<Value, InputError> {
    #[cfg(feature = "remote")]
    if is_url(source) {
        return load_input_url(source);
    }
    load_input(Path::new(source))
}
