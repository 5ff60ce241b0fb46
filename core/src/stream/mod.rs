//! Tool-calling event pipeline: chunk shapes, argument accumulation and
//! normalized events

pub mod accumulator;
pub mod chunk;
pub mod event;
pub mod normalizer;

pub use accumulator::{Attribution, CallPhase, ToolCallAccumulator, ToolCallState};
pub use chunk::{
    normalize_output, AssistantChunk, ChunkContent, ContentPart, RawChunk, ToolCallFragment,
    ToolCallHeader, ToolChunk,
};
pub use event::{into_envelopes, EventEnvelope, EventKind, StreamEvent, ToolEvent, ToolInfo};
pub use normalizer::StreamEventNormalizer;
