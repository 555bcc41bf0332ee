//! Renderings and the sequenced result store
//!
//! Every interaction produces one [`Rendering`]: a structured (JSON) view and a
//! human-readable text view. Both are written to a [`RenderTarget`] through a
//! [`ResultStore`], which only lets the most recent interaction update the
//! visible output.

use crate::error::{Result, ShellError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Placeholder shown while an interaction is in flight
pub const LOADING: &str = "Loading...";

pub const MSG_UNKNOWN_COMMAND: &str = "Unknown command";
pub const MSG_TASK_DELETED: &str = "Task deleted successfully";

/// One of the two output regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Structured,
    Text,
}

impl Slot {
    pub fn name(self) -> &'static str {
        match self {
            Slot::Structured => "jsonResult",
            Slot::Text => "textResult",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Loading,
    Success,
    Error,
}

/// The pair of outputs produced by one interaction
#[derive(Debug, Clone, PartialEq)]
pub struct Rendering {
    pub kind: RenderKind,
    pub structured: Value,
    pub text: String,
}

impl Rendering {
    pub fn loading() -> Self {
        Self {
            kind: RenderKind::Loading,
            structured: Value::String(LOADING.to_string()),
            text: LOADING.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: RenderKind::Error,
            structured: json!({ "error": message }),
            text: format!("Error: {}", message),
        }
    }

    /// Unknown verbs are reported without the `Error:` prefix
    pub fn unknown_command() -> Self {
        Self {
            kind: RenderKind::Error,
            structured: json!({ "error": MSG_UNKNOWN_COMMAND }),
            text: MSG_UNKNOWN_COMMAND.to_string(),
        }
    }

    pub fn deleted() -> Self {
        Self {
            kind: RenderKind::Success,
            structured: json!({ "message": MSG_TASK_DELETED }),
            text: MSG_TASK_DELETED.to_string(),
        }
    }

    /// One `ID, Name, Status` line per task, in the order the API returned them
    pub fn task_list(payload: Value) -> Result<Self> {
        let tasks = payload
            .as_array()
            .ok_or_else(|| ShellError::Remote("Expected a list of tasks".to_string()))?;

        let text = tasks
            .iter()
            .map(|task| {
                format!(
                    "ID: {}, Name: {}, Status: {}",
                    field(task, "id"),
                    field(task, "name"),
                    field(task, "status")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Self {
            kind: RenderKind::Success,
            structured: payload,
            text,
        })
    }

    pub fn task_detail(payload: Value) -> Self {
        let text = format!(
            "Task ID: {}\n{}",
            field(&payload, "id"),
            detail_tail(&payload)
        );
        Self {
            kind: RenderKind::Success,
            structured: payload,
            text,
        }
    }

    pub fn task_created(payload: Value) -> Self {
        let text = format!(
            "Task Created:\nID: {}\n{}",
            field(&payload, "id"),
            detail_tail(&payload)
        );
        Self {
            kind: RenderKind::Success,
            structured: payload,
            text,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == RenderKind::Error
    }

    /// Content written to the structured slot
    pub fn structured_text(&self) -> String {
        match self.kind {
            RenderKind::Loading => LOADING.to_string(),
            _ => serde_json::to_string_pretty(&self.structured)
                .unwrap_or_else(|_| self.structured.to_string()),
        }
    }

    pub fn slot_content(&self, slot: Slot) -> String {
        match slot {
            Slot::Structured => self.structured_text(),
            Slot::Text => self.text.clone(),
        }
    }
}

fn detail_tail(task: &Value) -> String {
    format!(
        "Name: {}\nDescription: {}\nStatus: {}\nCreated At: {}",
        field(task, "name"),
        field(task, "description"),
        field(task, "status"),
        field(task, "created_at")
    )
}

/// Display a single task field: strings unquoted, `null` as-is, missing as `undefined`
pub fn field(task: &Value, key: &str) -> String {
    match task.get(key) {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Output surface the shell writes into
pub trait RenderTarget {
    fn show(&self, slot: Slot, content: &str);
}

impl<T: RenderTarget + ?Sized> RenderTarget for &T {
    fn show(&self, slot: Slot, content: &str) {
        (**self).show(slot, content)
    }
}

/// Render target that keeps the latest content of each slot in memory
#[derive(Debug, Default)]
pub struct MemoryTarget {
    slots: Mutex<HashMap<Slot, String>>,
    writes: Mutex<usize>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self, slot: Slot) -> Option<String> {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&slot)
            .cloned()
    }

    /// Total number of slot writes so far
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RenderTarget for MemoryTarget {
    fn show(&self, slot: Slot, content: &str) {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(slot, content.to_string());
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }
}

/// Sequence number of one interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn number(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct StoreState {
    issued: u64,
    shown: Option<Rendering>,
}

/// Serializes writes to a render target and drops stale results.
///
/// Only the rendering of the highest ticket issued so far may reach the target.
pub struct ResultStore<R> {
    target: R,
    state: Mutex<StoreState>,
}

impl<R: RenderTarget> ResultStore<R> {
    pub fn new(target: R) -> Self {
        Self {
            target,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    /// Issue a ticket without touching the slots
    pub fn ticket(&self) -> Ticket {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.issued += 1;
        Ticket(state.issued)
    }

    /// Issue a ticket and show the loading placeholder in both slots
    pub fn begin(&self) -> Ticket {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.issued += 1;
        let ticket = Ticket(state.issued);
        let loading = Rendering::loading();
        self.write(&loading);
        state.shown = Some(loading);
        ticket
    }

    /// Show `rendering` if `ticket` is still the latest interaction.
    ///
    /// Returns `false` when a newer interaction has started since.
    pub fn publish(&self, ticket: Ticket, rendering: Rendering) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if ticket.0 != state.issued {
            tracing::debug!(
                ticket = ticket.0,
                latest = state.issued,
                "Dropping stale rendering"
            );
            return false;
        }
        self.write(&rendering);
        state.shown = Some(rendering);
        true
    }

    /// The rendering currently on display
    pub fn latest(&self) -> Option<Rendering> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .shown
            .clone()
    }

    fn write(&self, rendering: &Rendering) {
        self.target
            .show(Slot::Structured, &rendering.structured_text());
        self.target.show(Slot::Text, &rendering.text);
    }
}
