//! Replay a recorded chunk transcript through the normalizer

use crate::config::CliConfigLoader;
use crate::output::EventFormatter;
use anyhow::{Context, Result};
use concierge_core::error::StreamError;
use concierge_core::{ConciergeSession, EventEnvelope, EventKind, RawChunk};
use futures::{stream, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Print the events of one turn recorded as JSON lines of raw chunks
pub async fn replay_command(
    config_loader: CliConfigLoader,
    transcript: PathBuf,
    json_output: bool,
) -> Result<()> {
    let config = config_loader.load().await?;
    let session = ConciergeSession::new(config).context("Failed to build tool registry")?;

    let chunks = read_transcript(&transcript).await?;
    info!("Replaying {} chunks from {}", chunks.len(), transcript.display());

    let envelopes: Vec<EventEnvelope> = session.stream_turn(stream::iter(chunks)).collect().await;

    let failed = if json_output {
        print_json(&envelopes)?
    } else {
        print_pretty(&envelopes)?
    };

    if failed {
        std::process::exit(1);
    }

    Ok(())
}

/// Parse each non-blank line as a chunk. A malformed line becomes a stream
/// error at its position so the turn fails there.
async fn read_transcript(path: &Path) -> Result<Vec<Result<RawChunk, StreamError>>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read transcript: {}", path.display()))?;

    Ok(parse_transcript(&content))
}

fn parse_transcript(content: &str) -> Vec<Result<RawChunk, StreamError>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<RawChunk>(line).map_err(|e| {
                debug!("Malformed chunk on line {}: {}", index + 1, e);
                StreamError::MalformedChunk {
                    line: index + 1,
                    message: e.to_string(),
                }
            })
        })
        .collect()
}

fn print_json(envelopes: &[EventEnvelope]) -> Result<bool> {
    let mut failed = false;
    for envelope in envelopes {
        println!("{}", serde_json::to_string(envelope)?);
        failed |= envelope.kind == EventKind::Error;
    }
    Ok(failed)
}

fn print_pretty(envelopes: &[EventEnvelope]) -> Result<bool> {
    let formatter = EventFormatter::new();
    let mut stdout = std::io::stdout();
    let mut mid_line = false;
    let mut failed = false;

    for envelope in envelopes {
        match envelope.kind {
            EventKind::Ai => {
                print!("{}", envelope.text);
                stdout.flush()?;
                mid_line = !envelope.text.ends_with('\n');
            }
            EventKind::Tool => {
                if mid_line {
                    println!();
                    mid_line = false;
                }
                if let Some(info) = &envelope.tool_info {
                    println!("{}", formatter.format_tool_event(info));
                }
            }
            EventKind::Error => {
                if mid_line {
                    println!();
                    mid_line = false;
                }
                eprintln!("❌ Error: {}", envelope.text);
                failed = true;
            }
        }
    }

    if mid_line {
        println!();
    }

    Ok(failed)
}
