//! Per-turn reconstruction of tool-call arguments from streamed fragments

use super::chunk::{ToolCallFragment, ToolCallHeader};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Lifecycle of a tool call within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// The accumulated fragments do not currently parse
    Open,
    /// The accumulated fragments parse as a JSON object
    Parsed,
    /// The matching tool result was observed
    Closed,
}

/// Where an identity-less fragment ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    /// Appended to the latest call, which was the only open one
    Unique { call_id: String },
    /// Appended to the latest call while `open` calls were awaiting arguments
    Ambiguous { call_id: String, open: usize },
    /// No live call to receive it
    Dropped,
    /// Nothing to route
    Empty,
}

/// Fragments and parse state of one tool call
#[derive(Debug, Clone)]
pub struct ToolCallState {
    call_id: String,
    name: String,
    ordinal: u64,
    fragments: String,
    parsed_input: Option<Map<String, Value>>,
    phase: CallPhase,
}

impl ToolCallState {
    pub fn new<I: Into<String>, N: Into<String>>(call_id: I, name: N, ordinal: u64) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            ordinal,
            fragments: String::new(),
            parsed_input: None,
            phase: CallPhase::Open,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub fn fragments(&self) -> &str {
        &self.fragments
    }

    pub fn parsed_input(&self) -> Option<&Map<String, Value>> {
        self.parsed_input.as_ref()
    }

    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    /// Append a fragment and re-attempt the parse. Returns whether the
    /// accumulated text now parses.
    pub fn push_fragment(&mut self, fragment: &str) -> bool {
        if fragment.is_empty() {
            return self.phase == CallPhase::Parsed;
        }
        self.fragments.push_str(fragment);
        self.reparse()
    }

    /// Parse the whole accumulated text; a failure keeps the previous input
    pub fn reparse(&mut self) -> bool {
        match serde_json::from_str::<Value>(&self.fragments) {
            Ok(Value::Object(input)) => {
                self.parsed_input = Some(input);
                self.phase = CallPhase::Parsed;
                true
            }
            _ => {
                self.phase = CallPhase::Open;
                false
            }
        }
    }

    /// Use arguments delivered already parsed by a call header
    pub fn seed_input(&mut self, input: Map<String, Value>) {
        if input.is_empty() {
            return;
        }
        self.parsed_input = Some(input);
        self.phase = CallPhase::Parsed;
    }

    fn rename(&mut self, name: Option<&str>) {
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            self.name = name.to_string();
        }
    }

    fn close(mut self) -> Self {
        self.phase = CallPhase::Closed;
        self
    }
}

/// The live tool calls of one turn and the identity maps used to route
/// fragments to them.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    live: HashMap<String, ToolCallState>,
    index_to_id: HashMap<u32, String>,
    next_ordinal: u64,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a call, or update the name of an already live one
    pub fn open(&mut self, call_id: &str, name: Option<&str>) -> &mut ToolCallState {
        let next_ordinal = &mut self.next_ordinal;
        let state = self.live.entry(call_id.to_string()).or_insert_with(|| {
            let ordinal = *next_ordinal;
            *next_ordinal += 1;
            debug!("Opened tool call '{}' (ordinal {})", call_id, ordinal);
            ToolCallState::new(call_id, "", ordinal)
        });
        state.rename(name);
        state
    }

    /// Register a call header; non-empty object arguments seed its input
    pub fn apply_header(&mut self, header: &ToolCallHeader) {
        let Some(call_id) = header.id.as_deref().filter(|id| !id.is_empty()) else {
            return;
        };

        let state = self.open(call_id, header.name.as_deref());
        if let Value::Object(args) = &header.args {
            state.seed_input(args.clone());
        }
    }

    /// Route an indexed fragment. The first fragment carrying an id binds
    /// its index to that id; later fragments resolve through the index.
    pub fn route_indexed(&mut self, fragment: &ToolCallFragment) {
        let index = fragment.index.unwrap_or(0);

        if let Some(call_id) = fragment.id.as_deref().filter(|id| !id.is_empty()) {
            self.index_to_id.insert(index, call_id.to_string());
            self.open(call_id, fragment.name.as_deref());
        }

        let Some(args) = fragment.args.as_deref().filter(|a| !a.is_empty()) else {
            return;
        };

        let state = self
            .index_to_id
            .get(&index)
            .and_then(|call_id| self.live.get_mut(call_id));

        match state {
            Some(state) => {
                state.push_fragment(args);
            }
            None => debug!("Dropping fragment for unbound index {}", index),
        }
    }

    /// Route a fragment with no identity to the most recently opened call.
    ///
    /// More than one call in the `Open` phase means the target is a guess;
    /// that case is reported as [`Attribution::Ambiguous`] and logged.
    pub fn route_anonymous(&mut self, fragment: &str) -> Attribution {
        if fragment.is_empty() {
            return Attribution::Empty;
        }

        let open_calls = self
            .live
            .values()
            .filter(|state| state.phase == CallPhase::Open)
            .count();

        let Some(state) = self.live.values_mut().max_by_key(|state| state.ordinal) else {
            warn!("Dropping identity-less fragment with no live tool call");
            return Attribution::Dropped;
        };
        state.push_fragment(fragment);
        let call_id = state.call_id.clone();

        if open_calls > 1 {
            warn!(
                "{} tool calls are open while an identity-less fragment arrived; \
                 attributed it to the most recent call '{}'",
                open_calls, call_id
            );
            Attribution::Ambiguous {
                call_id,
                open: open_calls,
            }
        } else {
            Attribution::Unique { call_id }
        }
    }

    /// Remove a call from the live set
    pub fn close(&mut self, call_id: &str) -> Option<ToolCallState> {
        self.live.remove(call_id).map(ToolCallState::close)
    }

    pub fn get(&self, call_id: &str) -> Option<&ToolCallState> {
        self.live.get(call_id)
    }

    pub fn is_live(&self, call_id: &str) -> bool {
        self.live.contains_key(call_id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Id of the most recently opened live call
    pub fn latest(&self) -> Option<&str> {
        self.live
            .values()
            .max_by_key(|state| state.ordinal)
            .map(ToolCallState::call_id)
    }
}
