//! Clients for the external collaborators: text analysis and billing.
//!
//! Both talk to the same prepaid API and share the credential lookup below.

pub mod billing;
pub mod summary;

pub use billing::{BillingClient, Invoice, InvoiceState, InvoiceStatus};
pub use summary::{SummaryClient, SummaryRequest, SummaryResult, MAX_SUMMARY_CHARS};

use std::time::Duration;

use crate::error::{CollaboratorError, Result, ValidationError};

/// Environment variable checked before the keyring.
pub const API_KEY_ENV: &str = "FLOWJOURNAL_API_KEY";

const API_KEY_ENTRY: &str = "api_key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "flowjournal";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// API key from `FLOWJOURNAL_API_KEY`, falling back to the OS keyring.
pub fn resolve_api_key(service: &'static str) -> Result<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }
    match keyring_store::get(API_KEY_ENTRY) {
        Ok(Some(key)) if !key.trim().is_empty() => Ok(key),
        _ => Err(CollaboratorError::NotConfigured { service }.into()),
    }
}

pub fn store_api_key(key: &str) -> std::result::Result<(), keyring::Error> {
    keyring_store::set(API_KEY_ENTRY, key)
}

pub fn clear_api_key() -> std::result::Result<(), keyring::Error> {
    keyring_store::delete(API_KEY_ENTRY)
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Validate a base URL and strip any trailing slash.
fn normalize_base_url(base_url: &str) -> std::result::Result<String, ValidationError> {
    let parsed = url::Url::parse(base_url).map_err(|e| ValidationError::InvalidValue {
        field: "base_url".into(),
        message: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidValue {
            field: "base_url".into(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(base_url.trim_end_matches('/').to_string())
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url, path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(
            normalize_base_url("https://api.example.com/").unwrap(),
            "https://api.example.com"
        );
        assert_eq!(
            endpoint("https://api.example.com/v1", "/chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn base_url_must_be_http() {
        assert!(normalize_base_url("ftp://example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }
}
