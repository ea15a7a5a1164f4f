use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;
use flowjournal_core::flow::SessionPhase;
use flowjournal_core::{Config, FlowSession};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Typing this line on its own ends a live session.
const END_COMMAND: &str = ":end";

#[derive(Subcommand)]
pub enum SessionAction {
    /// Live session: each stdin line is appended to the text, one tick per second
    Run,
    /// Replay a file where each line is what was typed during one second
    Replay {
        /// Input file (an empty line is an idle second)
        file: PathBuf,
        /// Print every engine event as a JSON line
        #[arg(long)]
        events: bool,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let session = FlowSession::new(config.flow_config())?;

    match action {
        SessionAction::Run => {
            let rt = super::runtime()?;
            let result = rt.block_on(run_live(session));
            // the stdin reader may still be parked in a blocking read
            rt.shutdown_background();
            result
        }
        SessionAction::Replay { file, events } => {
            let content = std::fs::read_to_string(&file)?;
            replay(session, &content, events)
        }
    }
}

async fn run_live(mut session: FlowSession) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    // the first interval tick completes immediately
    ticker.tick().await;

    session.start_session();
    print_events(&mut session)?;

    let mut text = String::new();
    while session.phase() != SessionPhase::Ended {
        tokio::select! {
            _ = ticker.tick() => session.tick(),
            line = lines.next_line() => match line? {
                Some(line) if line.trim() == END_COMMAND => {
                    session.end_session();
                }
                Some(line) => {
                    append_line(&mut text, &line);
                    session.handle_text_change(text.as_str());
                }
                None => {
                    debug!("stdin closed, ending session");
                    session.end_session();
                }
            },
        }
        print_events(&mut session)?;
    }

    print_final_stats(&session)
}

/// Drive a session from prerecorded input, one line per second.
fn replay(
    mut session: FlowSession,
    content: &str,
    events: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    session.start_session();

    let mut text = String::new();
    for line in content.lines() {
        if session.phase() == SessionPhase::Ended {
            break;
        }
        if !line.is_empty() {
            append_line(&mut text, line);
            session.handle_text_change(text.as_str());
        }
        session.tick();
        flush_events(&mut session, events)?;
    }

    if session.phase() != SessionPhase::Ended {
        session.end_session();
    }
    flush_events(&mut session, events)?;

    print_final_stats(&session)
}

fn append_line(text: &mut String, line: &str) {
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(line);
}

fn flush_events(session: &mut FlowSession, print: bool) -> Result<(), serde_json::Error> {
    if print {
        print_events(session)
    } else {
        session.drain_events();
        Ok(())
    }
}

fn print_events(session: &mut FlowSession) -> Result<(), serde_json::Error> {
    for event in session.drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

fn print_final_stats(session: &FlowSession) -> Result<(), Box<dyn std::error::Error>> {
    let stats = session
        .final_stats()
        .ok_or("session ended without statistics")?;
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}
