use clap::Subcommand;
use flowjournal_core::integrations::{self, API_KEY_ENV};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the API key in the OS keyring
    SetKey {
        /// API key for the text-analysis and billing service
        key: String,
    },
    /// Remove the stored API key
    Clear,
    /// Check whether an API key is available
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::SetKey { key } => {
            if key.trim().is_empty() {
                return Err("API key must not be empty".into());
            }
            integrations::store_api_key(key.trim())?;
            println!("API key stored");
        }
        AuthAction::Clear => {
            integrations::clear_api_key()?;
            println!("API key removed");
        }
        AuthAction::Status => {
            let source = if std::env::var(API_KEY_ENV).is_ok_and(|k| !k.trim().is_empty()) {
                "environment"
            } else if integrations::resolve_api_key("auth").is_ok() {
                "keyring"
            } else {
                "not configured"
            };
            println!("{source}");
        }
    }
    Ok(())
}
