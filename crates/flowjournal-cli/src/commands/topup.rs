use std::time::Duration;

use clap::Subcommand;
use flowjournal_core::integrations::resolve_api_key;
use flowjournal_core::{BillingClient, Config};

#[derive(Subcommand)]
pub enum TopupAction {
    /// Create a Lightning invoice (100-1000 sats, default 1000)
    Create {
        /// Amount in sats
        #[arg(long)]
        amount: Option<u32>,
    },
    /// Show the status of an invoice
    Status {
        /// Invoice ID
        id: String,
    },
    /// Show the remaining credit balance
    Balance,
    /// Poll an invoice until it settles or expires
    Wait {
        /// Invoice ID
        id: String,
        #[arg(long, default_value = "3")]
        interval_secs: u64,
        #[arg(long, default_value = "100")]
        max_polls: u32,
    },
}

pub fn run(action: TopupAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let client = BillingClient::from_config(&config.billing, resolve_api_key("billing")?)?;
    let rt = super::runtime()?;

    match action {
        TopupAction::Create { amount } => {
            let invoice = rt.block_on(client.create_invoice(amount))?;
            println!("{}", serde_json::to_string_pretty(&invoice)?);
        }
        TopupAction::Status { id } => {
            let status = rt.block_on(client.invoice_status(&id))?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        TopupAction::Balance => {
            let balance = rt.block_on(client.balance())?;
            println!("{}", serde_json::json!({ "balance": balance }));
        }
        TopupAction::Wait {
            id,
            interval_secs,
            max_polls,
        } => {
            let status = rt.block_on(client.wait_for_settlement(
                &id,
                Duration::from_secs(interval_secs),
                max_polls,
            ))?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            if !status.status.is_final() {
                return Err(format!("invoice {id} still {:?}", status.status).into());
            }
        }
    }
    Ok(())
}
