//! Uniform events exposed to the chat layer

use crate::error::StreamError;
use futures::{pin_mut, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::error;

/// A completed tool call paired with its output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEvent {
    pub call_id: String,
    pub tool_name: String,
    pub input_data: String,
    pub output_data: String,
}

/// Normalized event produced for one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Text(String),
    ToolResult(ToolEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Ai,
    Tool,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub tool_name: String,
    pub input_data: String,
    pub output_data: String,
}

/// `(kind, text, tool_info)` triple handed to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub kind: EventKind,
    pub text: String,
    pub tool_info: Option<ToolInfo>,
}

impl EventEnvelope {
    /// Terminal envelope for a failed turn
    pub fn error(err: &StreamError) -> Self {
        Self {
            kind: EventKind::Error,
            text: err.to_string(),
            tool_info: None,
        }
    }
}

impl From<StreamEvent> for EventEnvelope {
    fn from(event: StreamEvent) -> Self {
        match event {
            StreamEvent::Text(text) => Self {
                kind: EventKind::Ai,
                text,
                tool_info: None,
            },
            StreamEvent::ToolResult(tool) => Self {
                kind: EventKind::Tool,
                text: tool.output_data.clone(),
                tool_info: Some(ToolInfo {
                    tool_name: tool.tool_name,
                    input_data: tool.input_data,
                    output_data: tool.output_data,
                }),
            },
        }
    }
}

/// Convert normalized events to envelopes. A failure becomes exactly one
/// `error` envelope and ends the stream.
pub fn into_envelopes<S>(events: S) -> impl Stream<Item = EventEnvelope>
where
    S: Stream<Item = Result<StreamEvent, StreamError>>,
{
    async_stream::stream! {
        pin_mut!(events);
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => yield EventEnvelope::from(event),
                Err(err) => {
                    error!("Turn failed: {}", err);
                    yield EventEnvelope::error(&err);
                    break;
                }
            }
        }
    }
}
