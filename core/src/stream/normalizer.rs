//! Reconciles vendor chunk shapes into one ordered event stream

use super::accumulator::{Attribution, ToolCallAccumulator};
use super::chunk::{AssistantChunk, ContentPart, RawChunk, ToolCallFragment, ToolChunk};
use super::event::{StreamEvent, ToolEvent};
use crate::error::StreamError;
use crate::tools::ToolRegistry;
use futures::{pin_mut, Stream, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-turn normalizer. Holds the live tool calls of one turn, so a new
/// instance is needed for every turn.
#[derive(Default)]
pub struct StreamEventNormalizer {
    calls: ToolCallAccumulator,
    registry: Option<Arc<ToolRegistry>>,
    ambiguous_fragments: usize,
}

impl StreamEventNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format tool input and output with the registered tools' formatters
    pub fn with_registry(registry: Arc<ToolRegistry>) -> Self {
        Self {
            calls: ToolCallAccumulator::new(),
            registry: Some(registry),
            ambiguous_fragments: 0,
        }
    }

    pub fn accumulator(&self) -> &ToolCallAccumulator {
        &self.calls
    }

    /// Identity-less fragments attributed while several calls were open
    pub fn ambiguous_fragments(&self) -> usize {
        self.ambiguous_fragments
    }

    /// Consume the chunk stream of one turn and yield normalized events in
    /// chunk order. An upstream error ends the stream after being yielded.
    pub fn process<S>(mut self, chunks: S) -> impl Stream<Item = Result<StreamEvent, StreamError>>
    where
        S: Stream<Item = Result<RawChunk, StreamError>>,
    {
        async_stream::try_stream! {
            pin_mut!(chunks);
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                for event in self.handle_chunk(chunk) {
                    yield event;
                }
            }

            if self.calls.live_count() > 0 {
                debug!("Turn ended with {} unresolved tool calls", self.calls.live_count());
            }
        }
    }

    /// Events triggered by a single chunk
    pub fn handle_chunk(&mut self, chunk: RawChunk) -> Vec<StreamEvent> {
        match chunk {
            RawChunk::Assistant(assistant) => self.handle_assistant(assistant).into_iter().collect(),
            RawChunk::Tool(tool) => self.handle_tool(tool).into_iter().collect(),
            RawChunk::Other => Vec::new(),
        }
    }

    fn handle_assistant(&mut self, chunk: AssistantChunk) -> Option<StreamEvent> {
        for header in &chunk.tool_calls {
            self.calls.apply_header(header);
        }

        let mut deltas = Vec::new();
        for part in chunk.content.parts() {
            match part {
                ContentPart::ToolUse { id, name, input } if !id.is_empty() => {
                    let state = self.calls.open(id, Some(name.as_str()));
                    if let Value::Object(input) = input {
                        state.seed_input(input.clone());
                    }
                }
                ContentPart::InputJsonDelta { partial_json } => deltas.push(partial_json.as_str()),
                _ => {}
            }
        }

        if deltas.is_empty() {
            for fragment in &chunk.tool_call_chunks {
                self.calls.route_indexed(fragment);
            }
        } else {
            // The same arguments are mirrored in tool_call_chunks; only keep
            // their identity so nothing is appended twice
            for fragment in &chunk.tool_call_chunks {
                self.calls.route_indexed(&ToolCallFragment {
                    args: None,
                    ..fragment.clone()
                });
            }
            for delta in deltas {
                if let Attribution::Ambiguous { .. } = self.calls.route_anonymous(delta) {
                    self.ambiguous_fragments += 1;
                }
            }
        }

        let text = chunk.content.text();
        (!text.is_empty()).then_some(StreamEvent::Text(text))
    }

    fn handle_tool(&mut self, chunk: ToolChunk) -> Option<StreamEvent> {
        let Some(state) = self.calls.close(&chunk.tool_call_id) else {
            warn!(
                "Dropping result for unknown tool call '{}'",
                chunk.tool_call_id
            );
            return None;
        };

        let tool_name = chunk
            .name
            .filter(|name| !name.is_empty())
            .or_else(|| Some(state.name().to_string()).filter(|name| !name.is_empty()))
            .unwrap_or_else(|| "unknown".to_string());

        let input = match state.parsed_input() {
            Some(input) => input.clone(),
            None => {
                warn!(
                    "Tool input not found for {} (ID: {})",
                    tool_name, chunk.tool_call_id
                );
                match chunk.artifact {
                    Some(Value::Object(artifact)) => artifact,
                    _ => Map::new(),
                }
            }
        };

        let output = chunk.content.text();
        let (input_data, output_data) = match &self.registry {
            Some(registry) => (
                registry.format_input(&tool_name, &input),
                registry.format_output(&tool_name, &output),
            ),
            None => (Value::Object(input).to_string(), output),
        };

        Some(StreamEvent::ToolResult(ToolEvent {
            call_id: chunk.tool_call_id,
            tool_name,
            input_data,
            output_data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::accumulator::CallPhase;
    use crate::stream::chunk::ChunkContent;
    use crate::tools::builtin::MultiplyTool;
    use futures::stream;

    fn run(chunks: Vec<RawChunk>) -> Vec<StreamEvent> {
        let mut normalizer = StreamEventNormalizer::new();
        chunks
            .into_iter()
            .flat_map(|chunk| normalizer.handle_chunk(chunk))
            .collect()
    }

    fn tool_event(event: &StreamEvent) -> &ToolEvent {
        match event {
            StreamEvent::ToolResult(tool) => tool,
            other => panic!("expected tool result, got {:?}", other),
        }
    }

    #[test]
    fn test_tokyo_indexed_fragments() {
        let events = run(vec![
            RawChunk::indexed_fragment(Some("call_1"), Some("get_weather"), 0, "{\"location\""),
            RawChunk::indexed_fragment(None, None, 0, ": \"Tokyo\""),
            RawChunk::indexed_fragment(None, None, 0, "}"),
            RawChunk::tool_result("call_1", "get_weather", "sunny"),
        ]);

        assert_eq!(events.len(), 1);
        let tool = tool_event(&events[0]);
        assert_eq!(tool.call_id, "call_1");
        assert_eq!(tool.tool_name, "get_weather");
        assert_eq!(tool.input_data, r#"{"location":"Tokyo"}"#);
        assert_eq!(tool.output_data, "sunny");
    }

    #[test]
    fn test_tokyo_fragments_each_carrying_the_id() {
        let events = run(vec![
            RawChunk::indexed_fragment(Some("call_1"), Some("get_weather"), 0, "{\"location\""),
            RawChunk::indexed_fragment(Some("call_1"), None, 0, ": \"Tokyo\""),
            RawChunk::indexed_fragment(Some("call_1"), None, 0, "}"),
            RawChunk::tool_result("call_1", "get_weather", "sunny"),
        ]);

        assert_eq!(tool_event(&events[0]).input_data, r#"{"location":"Tokyo"}"#);
    }

    #[test]
    fn test_tokyo_identity_less_fragments() {
        let events = run(vec![
            RawChunk::tool_use("toolu_1", "get_weather"),
            RawChunk::json_delta("{\"location\""),
            RawChunk::json_delta(": \"Tokyo\""),
            RawChunk::json_delta("}"),
            RawChunk::tool_result("toolu_1", "get_weather", "sunny"),
        ]);

        assert_eq!(events.len(), 1);
        assert_eq!(tool_event(&events[0]).input_data, r#"{"location":"Tokyo"}"#);
    }

    #[test]
    fn test_interleaved_identity_less_fragments_are_counted() {
        let mut normalizer = StreamEventNormalizer::new();
        for chunk in [
            RawChunk::tool_use("toolu_1", "get_weather"),
            RawChunk::json_delta("{\"location\": "),
            RawChunk::tool_use("toolu_2", "multiply"),
            RawChunk::json_delta("{\"a\": 2, \"b\": 3}"),
        ] {
            assert!(normalizer.handle_chunk(chunk).is_empty());
        }

        assert_eq!(normalizer.ambiguous_fragments(), 1);
        let calls = normalizer.accumulator();
        assert_eq!(calls.get("toolu_2").unwrap().phase(), CallPhase::Parsed);
        assert_eq!(calls.get("toolu_1").unwrap().phase(), CallPhase::Open);
    }

    #[test]
    fn test_mirrored_tool_call_chunks_are_not_appended_twice() {
        let delta: RawChunk = serde_json::from_value(serde_json::json!({
            "type": "AIMessageChunk",
            "content": [{"type": "input_json_delta", "partial_json": "{\"a\": 1}", "index": 1}],
            "tool_call_chunks": [{"id": null, "name": null, "args": "{\"a\": 1}", "index": 1}]
        }))
        .unwrap();
        let start: RawChunk = serde_json::from_value(serde_json::json!({
            "type": "AIMessageChunk",
            "content": [{"type": "tool_use", "id": "toolu_1", "name": "t", "input": {}, "index": 1}],
            "tool_call_chunks": [{"id": "toolu_1", "name": "t", "args": "", "index": 1}]
        }))
        .unwrap();

        let events = run(vec![start, delta, RawChunk::tool_result("toolu_1", "t", "ok")]);
        assert_eq!(tool_event(&events[0]).input_data, r#"{"a":1}"#);
    }

    #[test]
    fn test_every_split_yields_same_input() {
        let payload = r#"{"location": "東京", "n": [1, {"k": "v"}]}"#;
        let expected = r#"{"location":"東京","n":[1,{"k":"v"}]}"#;
        let chars: Vec<char> = payload.chars().collect();

        for cut in 1..chars.len() {
            let head: String = chars[..cut].iter().collect();
            let tail: String = chars[cut..].iter().collect();

            let indexed = run(vec![
                RawChunk::indexed_fragment(Some("c"), Some("t"), 0, &head),
                RawChunk::indexed_fragment(None, None, 0, &tail),
                RawChunk::tool_result("c", "t", ""),
            ]);
            let anonymous = run(vec![
                RawChunk::tool_use("c", "t"),
                RawChunk::json_delta(head.clone()),
                RawChunk::json_delta(tail.clone()),
                RawChunk::tool_result("c", "t", ""),
            ]);

            assert_eq!(tool_event(&indexed[0]).input_data, expected, "cut {}", cut);
            assert_eq!(tool_event(&anonymous[0]).input_data, expected, "cut {}", cut);
        }
    }

    #[test]
    fn test_events_follow_chunk_order() {
        let events = run(vec![
            RawChunk::text("Checking "),
            RawChunk::text("the weather."),
            RawChunk::tool_use("toolu_1", "get_weather"),
            RawChunk::json_delta("{\"location\": \"Tokyo\"}"),
            RawChunk::tool_result("toolu_1", "get_weather", "sunny"),
            RawChunk::text("It is sunny."),
        ]);

        assert_eq!(
            events,
            vec![
                StreamEvent::Text("Checking ".to_string()),
                StreamEvent::Text("the weather.".to_string()),
                StreamEvent::ToolResult(ToolEvent {
                    call_id: "toolu_1".to_string(),
                    tool_name: "get_weather".to_string(),
                    input_data: r#"{"location":"Tokyo"}"#.to_string(),
                    output_data: "sunny".to_string(),
                }),
                StreamEvent::Text("It is sunny.".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_result_id_is_dropped() {
        let events = run(vec![
            RawChunk::tool_use("toolu_1", "t"),
            RawChunk::tool_result("toolu_2", "t", "orphan"),
            RawChunk::tool_result("toolu_1", "t", "ok"),
            RawChunk::tool_result("toolu_1", "t", "duplicate"),
        ]);

        assert_eq!(events.len(), 1);
        assert_eq!(tool_event(&events[0]).output_data, "ok");
    }

    #[test]
    fn test_unparsed_input_becomes_empty_object() {
        let events = run(vec![
            RawChunk::tool_use("toolu_1", "t"),
            RawChunk::json_delta("{\"trunc"),
            RawChunk::tool_result("toolu_1", "t", "ok"),
        ]);

        assert_eq!(tool_event(&events[0]).input_data, "{}");
    }

    #[test]
    fn test_artifact_used_when_nothing_parsed() {
        let events = run(vec![
            RawChunk::tool_use("toolu_1", "t"),
            RawChunk::Tool(ToolChunk {
                tool_call_id: "toolu_1".to_string(),
                name: None,
                content: ChunkContent::Text("ok".to_string()),
                artifact: Some(serde_json::json!({"q": 1})),
            }),
        ]);

        let tool = tool_event(&events[0]);
        assert_eq!(tool.input_data, r#"{"q":1}"#);
        assert_eq!(tool.tool_name, "t");
    }

    #[test]
    fn test_header_args_seed_input() {
        let header: RawChunk = serde_json::from_value(serde_json::json!({
            "type": "ai",
            "content": "",
            "tool_calls": [{"id": "call_9", "name": "multiply", "args": {"a": 2, "b": 3}}]
        }))
        .unwrap();

        let events = run(vec![header, RawChunk::tool_result("call_9", "multiply", "6")]);
        assert_eq!(tool_event(&events[0]).input_data, r#"{"a":2,"b":3}"#);
    }

    #[test]
    fn test_registry_formatters_applied() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MultiplyTool::new())).unwrap();

        let mut normalizer = StreamEventNormalizer::with_registry(Arc::new(registry));
        normalizer.handle_chunk(RawChunk::tool_use("toolu_1", "multiply"));
        normalizer.handle_chunk(RawChunk::json_delta("{\"a\": 2, \"b\": 3}"));
        let events = normalizer.handle_chunk(RawChunk::tool_result("toolu_1", "multiply", "6"));

        let tool = tool_event(&events[0]);
        assert_eq!(tool.input_data, "2 × 3");
        assert_eq!(tool.output_data, "Result: 6");
    }

    #[tokio::test]
    async fn test_process_stream() {
        let chunks = stream::iter(vec![
            Ok(RawChunk::text("Hi")),
            Ok(RawChunk::Other),
            Ok(RawChunk::tool_use("toolu_1", "t")),
            Ok(RawChunk::json_delta("{}")),
            Ok(RawChunk::tool_result("toolu_1", "t", "done")),
        ]);

        let events: Vec<_> = StreamEventNormalizer::new()
            .process(chunks)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::Text("Hi".to_string()));
    }

    #[tokio::test]
    async fn test_upstream_failure_stops_without_flushing() {
        let chunks = stream::iter(vec![
            Ok(RawChunk::text("partial")),
            Ok(RawChunk::tool_use("toolu_1", "t")),
            Err(StreamError::upstream("socket closed")),
            Ok(RawChunk::tool_result("toolu_1", "t", "late")),
        ]);

        let items: Vec<_> = StreamEventNormalizer::new().process(chunks).collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok(StreamEvent::Text("partial".to_string())));
        assert_eq!(items[1], Err(StreamError::upstream("socket closed")));
    }
}
