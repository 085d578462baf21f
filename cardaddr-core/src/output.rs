//! Output helpers for human and agent modes.

use serde::Serialize;

/// Human (TTY) vs Agent (non-interactive) output selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Agent,
}

/// Agent-mode error payload.
#[derive(Debug, Clone, Serialize)]
pub struct AgentError<D: Serialize> {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<D>,
}

/// Truncate long addresses for human-readable tables.
pub fn truncate_address(addr: &str) -> String {
    let s = addr.trim();
    if s.chars().count() <= 16 {
        return s.to_string();
    }

    let start: String = s.chars().take(8).collect();
    let end: String = s
        .chars()
        .rev()
        .take(6)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    format!("{start}...{end}")
}
