use std::path::PathBuf;

use clap::Args;
use flowjournal_core::integrations::resolve_api_key;
use flowjournal_core::{Config, SessionStats, SummaryClient, SummaryRequest};

#[derive(Args)]
pub struct SummaryArgs {
    /// File containing the session text
    file: PathBuf,
    /// Final statistics JSON from `session replay` or `session run`
    #[arg(long)]
    with_stats: Option<PathBuf>,
}

pub fn run(args: SummaryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    if !config.summary.enabled {
        return Err("summaries are disabled (summary.enabled = false)".into());
    }

    let text = std::fs::read_to_string(&args.file)?;
    let mut request = SummaryRequest::new(text);
    if let Some(path) = args.with_stats {
        let stats: SessionStats = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        request = request.with_stats(stats);
    }
    request.validate()?;

    let api_key = resolve_api_key("summary")?;
    let client = SummaryClient::from_config(&config.summary, api_key)?;
    let result = super::runtime()?.block_on(client.summarize(&request))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
