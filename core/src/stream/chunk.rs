//! Vendor-shaped chunks delivered by the upstream agent loop

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One chunk of the upstream message stream, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RawChunk {
    #[serde(rename = "ai", alias = "AIMessageChunk")]
    Assistant(AssistantChunk),

    #[serde(rename = "tool")]
    Tool(ToolChunk),

    /// Any other kind (system, human, ...) is ignored
    #[serde(other)]
    Other,
}

/// Assistant output: text and/or tool-call argument fragments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantChunk {
    #[serde(default)]
    pub content: ChunkContent,

    /// Call headers with already parsed arguments
    #[serde(default)]
    pub tool_calls: Vec<ToolCallHeader>,

    /// Indexed argument fragments (OpenAI-style)
    #[serde(default)]
    pub tool_call_chunks: Vec<ToolCallFragment>,
}

/// Result of a tool execution relayed by the agent loop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolChunk {
    #[serde(default)]
    pub tool_call_id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub content: ChunkContent,

    #[serde(default)]
    pub artifact: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallHeader {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFragment {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub args: Option<String>,

    /// Zero-based position of the call; absent means 0
    #[serde(default)]
    pub index: Option<u32>,
}

/// Message content as plain text, typed parts, or anything else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Structured(Value),
}

impl Default for ChunkContent {
    fn default() -> Self {
        ChunkContent::Text(String::new())
    }
}

/// Typed content part (Anthropic-style)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
    /// Identity-less argument fragment for the most recent tool_use
    InputJsonDelta {
        #[serde(default)]
        partial_json: String,
    },
    #[serde(other)]
    Unknown,
}

impl ChunkContent {
    /// Text carried by the content; non-text parts contribute nothing
    pub fn text(&self) -> String {
        match self {
            ChunkContent::Text(text) => text.clone(),
            ChunkContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            ChunkContent::Structured(value) => normalize_output(value),
        }
    }

    pub fn parts(&self) -> &[ContentPart] {
        match self {
            ChunkContent::Parts(parts) => parts,
            _ => &[],
        }
    }
}

/// Flatten arbitrary agent output into a string.
///
/// Strings pass through, lists concatenate their strings and the `text`
/// or `content` of their objects, objects yield `text` or `content`.
pub fn normalize_output(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                Value::Object(object) => object
                    .get("text")
                    .or_else(|| object.get("content"))
                    .map(normalize_output)
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .collect(),
        Value::Object(object) => match object.get("text").or_else(|| object.get("content")) {
            Some(inner) => normalize_output(inner),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

impl RawChunk {
    /// Plain assistant text
    pub fn text<S: Into<String>>(text: S) -> Self {
        RawChunk::Assistant(AssistantChunk {
            content: ChunkContent::Text(text.into()),
            ..AssistantChunk::default()
        })
    }

    /// Indexed argument fragment; `id` is only present on the first one
    pub fn indexed_fragment(id: Option<&str>, name: Option<&str>, index: u32, args: &str) -> Self {
        RawChunk::Assistant(AssistantChunk {
            tool_call_chunks: vec![ToolCallFragment {
                id: id.map(str::to_string),
                name: name.map(str::to_string),
                args: Some(args.to_string()),
                index: Some(index),
            }],
            ..AssistantChunk::default()
        })
    }

    /// Start of a tool_use content block
    pub fn tool_use<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        RawChunk::Assistant(AssistantChunk {
            content: ChunkContent::Parts(vec![ContentPart::ToolUse {
                id: id.into(),
                name: name.into(),
                input: Value::Object(Map::new()),
            }]),
            ..AssistantChunk::default()
        })
    }

    /// Identity-less argument fragment
    pub fn json_delta<S: Into<String>>(partial_json: S) -> Self {
        RawChunk::Assistant(AssistantChunk {
            content: ChunkContent::Parts(vec![ContentPart::InputJsonDelta {
                partial_json: partial_json.into(),
            }]),
            ..AssistantChunk::default()
        })
    }

    pub fn tool_result<I: Into<String>, N: Into<String>, C: Into<String>>(
        call_id: I,
        name: N,
        content: C,
    ) -> Self {
        RawChunk::Tool(ToolChunk {
            tool_call_id: call_id.into(),
            name: Some(name.into()),
            content: ChunkContent::Text(content.into()),
            artifact: None,
        })
    }
}
