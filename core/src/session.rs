//! Per-deployment facade tying the registry, dispatcher and normalizer together

use crate::config::ConciergeConfig;
use crate::error::{Result, StreamError};
use crate::stream::{into_envelopes, EventEnvelope, RawChunk, StreamEventNormalizer};
use crate::tools::builtin::builtin_registry;
use crate::tools::{CallDispatcher, ToolCall, ToolRegistry, ToolResult};
use futures::Stream;
use std::sync::Arc;
use tracing::info;

/// Owns the tool registry built from a validated configuration.
///
/// Each session constructs its own registry; nothing is shared through
/// process-wide state.
pub struct ConciergeSession {
    config: ConciergeConfig,
    registry: Arc<ToolRegistry>,
    dispatcher: CallDispatcher,
}

impl ConciergeSession {
    /// Validate `config` and register the built-in tools
    pub fn new(config: ConciergeConfig) -> Result<Self> {
        config.validate()?;
        let registry = builtin_registry(&config)?;
        info!("Session ready with {} tools", registry.len());
        Ok(Self::with_registry(config, registry))
    }

    /// Use a caller-built registry instead of the built-in tools
    pub fn with_registry(config: ConciergeConfig, registry: ToolRegistry) -> Self {
        let registry = Arc::new(registry);
        Self {
            dispatcher: CallDispatcher::new(Arc::clone(&registry)),
            config,
            registry,
        }
    }

    pub fn config(&self) -> &ConciergeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &CallDispatcher {
        &self.dispatcher
    }

    /// Tool list for the system prompt, one `- name: description` per line
    pub fn tool_catalogue(&self) -> String {
        self.registry
            .describe_all()
            .iter()
            .map(|tool| format!("- {}: {}", tool.name, tool.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Execute a call at most once per call id
    pub async fn call_tool(&self, call: &ToolCall) -> ToolResult {
        self.dispatcher.dispatch(call).await
    }

    /// Forget recorded calls before starting a new turn
    pub fn start_turn(&mut self) {
        self.dispatcher = CallDispatcher::new(Arc::clone(&self.registry));
    }

    /// A fresh normalizer whose tool events use the registry's formatters
    pub fn normalizer(&self) -> StreamEventNormalizer {
        StreamEventNormalizer::with_registry(Arc::clone(&self.registry))
    }

    /// Normalize one turn's chunk stream into client envelopes
    pub fn stream_turn<S>(&self, chunks: S) -> impl Stream<Item = EventEnvelope>
    where
        S: Stream<Item = std::result::Result<RawChunk, StreamError>>,
    {
        into_envelopes(self.normalizer().process(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::stream::EventKind;
    use futures::{stream, StreamExt};
    use serde_json::json;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = ConciergeConfig::default();
        config.sandbox.max_rows = 50;

        assert!(matches!(ConciergeSession::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_tool_catalogue_lists_every_tool() {
        let session = ConciergeSession::new(ConciergeConfig::default()).unwrap();
        let catalogue = session.tool_catalogue();

        for tool in session.registry().describe_all() {
            let prefix = format!("- {}: ", tool.name);
            let entries = catalogue
                .lines()
                .filter(|line| line.starts_with(&prefix))
                .count();
            assert_eq!(entries, 1, "{} should appear once", tool.name);
        }
        assert!(catalogue.starts_with("- "));
        assert!(catalogue.contains("\n- multiply: "));
    }

    #[tokio::test]
    async fn test_call_tool_is_exactly_once() {
        let mut session = ConciergeSession::new(ConciergeConfig::default()).unwrap();
        let mut params = serde_json::Map::new();
        params.insert("a".to_string(), json!(6));
        params.insert("b".to_string(), json!(7));
        let call = ToolCall::with_id("call_1", "multiply", params);

        let first = session.call_tool(&call).await;
        let second = session.call_tool(&call).await;
        assert!(first.success);
        assert_eq!(first.data, json!(42));
        assert_eq!(first, second);
        assert!(session.dispatcher().contains("call_1"));

        session.start_turn();
        assert!(!session.dispatcher().contains("call_1"));
    }

    #[tokio::test]
    async fn test_stream_turn_formats_tool_events() {
        let session = ConciergeSession::new(ConciergeConfig::default()).unwrap();
        let chunks = stream::iter(vec![
            Ok(RawChunk::indexed_fragment(Some("call_1"), Some("multiply"), 0, "{\"a\": 3,")),
            Ok(RawChunk::indexed_fragment(None, None, 0, " \"b\": 4}")),
            Ok(RawChunk::tool_result("call_1", "multiply", "12")),
            Ok(RawChunk::text("3 × 4 is 12")),
        ]);

        let envelopes: Vec<EventEnvelope> = session.stream_turn(chunks).collect().await;

        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[0].kind, EventKind::Tool);
        let info = envelopes[0].tool_info.as_ref().unwrap();
        assert_eq!(info.tool_name, "multiply");
        assert_eq!(info.input_data, "3 × 4");
        assert_eq!(info.output_data, "Result: 12");
        assert_eq!(envelopes[1].kind, EventKind::Ai);
    }

    #[tokio::test]
    async fn test_stream_turn_ends_with_error_envelope() {
        let session = ConciergeSession::new(ConciergeConfig::default()).unwrap();
        let chunks = stream::iter(vec![
            Ok(RawChunk::text("Checking")),
            Err(StreamError::upstream("model overloaded")),
        ]);

        let envelopes: Vec<EventEnvelope> = session.stream_turn(chunks).collect().await;

        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[1].kind, EventKind::Error);
        assert!(envelopes[1].text.contains("model overloaded"));
    }
}
