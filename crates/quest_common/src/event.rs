//! Normalized companion events.
//!
//! One transcript line becomes zero or more `Event`s. Events are immutable
//! once built and flow one way: watcher -> queue -> frame loop.

use serde::{Deserialize, Serialize};

/// Closed set of event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Session began, a watch started, or the tail switched transcripts
    SessionStart,
    Thinking,
    /// Read-family tools (read, glob, grep, web search/fetch)
    Reading,
    /// Shell execution
    Bash,
    /// File mutation tools
    Writing,
    Success,
    Error,
    Idle,
    /// User prompt text, informational only
    Quest,
    /// Conversation compacted
    Compact,
    /// User asked for deeper thinking
    ThinkHard,
    /// Sub-task spawned
    SpawnAgent,
    TodoUpdate,
    AskUser,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::SessionStart => "session_start",
            EventKind::Thinking => "thinking",
            EventKind::Reading => "reading",
            EventKind::Bash => "bash",
            EventKind::Writing => "writing",
            EventKind::Success => "success",
            EventKind::Error => "error",
            EventKind::Idle => "idle",
            EventKind::Quest => "quest",
            EventKind::Compact => "compact",
            EventKind::ThinkHard => "think_hard",
            EventKind::SpawnAgent => "spawn_agent",
            EventKind::TodoUpdate => "todo_update",
            EventKind::AskUser => "ask_user",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Intensity tier requested for thinking
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThinkLevel {
    #[default]
    None,
    Normal,
    Hard,
    Harder,
    Ultra,
}

impl ThinkLevel {
    /// Detect the requested tier in a user prompt, most specific phrase first
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();

        if lower.contains("ultrathink") {
            return ThinkLevel::Ultra;
        }
        if lower.contains("think harder") {
            return ThinkLevel::Harder;
        }
        if ["think hard", "think deeply", "think carefully", "deep think"]
            .iter()
            .any(|p| lower.contains(p))
        {
            return ThinkLevel::Hard;
        }
        if lower.contains("really think") {
            return ThinkLevel::Normal;
        }
        ThinkLevel::None
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThinkLevel::None => "none",
            ThinkLevel::Normal => "normal",
            ThinkLevel::Hard => "hard",
            ThinkLevel::Harder => "harder",
            ThinkLevel::Ultra => "ultra",
        }
    }
}

/// Context window usage reported on assistant records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default, rename = "cache_read_input_tokens")]
    pub cache_read_tokens: u64,
    #[serde(default, rename = "cache_creation_input_tokens")]
    pub cache_creation_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Tokens occupying the context window (output excluded)
    pub fn total(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.cache_read_tokens)
            .saturating_add(self.cache_creation_tokens)
    }
}

/// One entry of a todo list snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "activeForm")]
    pub active_form: String,
}

impl TodoItem {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

/// A normalized event derived from one transcript line
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub details: String,
    /// Original tool name, when the event came from a tool invocation
    pub tool_name: Option<String>,
    pub tool_use_id: Option<String>,
    pub is_error: bool,
    pub think_level: ThinkLevel,
    pub todos: Option<Vec<TodoItem>>,
    pub token_usage: Option<TokenUsage>,
}

impl Event {
    pub fn new(kind: EventKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            details: details.into(),
            tool_name: None,
            tool_use_id: None,
            is_error: false,
            think_level: ThinkLevel::None,
            todos: None,
            token_usage: None,
        }
    }

    /// Error event with the error flag set
    pub fn error(details: impl Into<String>) -> Self {
        let mut event = Self::new(EventKind::Error, details);
        event.is_error = true;
        event
    }

    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        self.tool_name = Some(name.into());
        self
    }

    pub fn with_tool_use_id(mut self, id: impl Into<String>) -> Self {
        self.tool_use_id = Some(id.into());
        self
    }

    pub fn with_think_level(mut self, level: ThinkLevel) -> Self {
        self.think_level = level;
        self
    }

    pub fn with_todos(mut self, todos: Vec<TodoItem>) -> Self {
        self.todos = Some(todos);
        self
    }

    pub fn with_token_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.token_usage = usage;
        self
    }

    /// Anything but Idle counts as activity
    pub fn is_activity(&self) -> bool {
        self.kind != EventKind::Idle
    }
}

/// Flatten newlines, trim and cap to `max_chars` characters with a "..." suffix
pub fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let trimmed = flat.trim();

    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_think_level_detection_order() {
        assert_eq!(ThinkLevel::detect("please ULTRATHINK this"), ThinkLevel::Ultra);
        assert_eq!(ThinkLevel::detect("think harder about it"), ThinkLevel::Harder);
        assert_eq!(ThinkLevel::detect("think hard"), ThinkLevel::Hard);
        assert_eq!(ThinkLevel::detect("Think carefully"), ThinkLevel::Hard);
        assert_eq!(ThinkLevel::detect("do a deep think"), ThinkLevel::Hard);
        assert_eq!(ThinkLevel::detect("really think"), ThinkLevel::Normal);
        assert_eq!(ThinkLevel::detect("fix the bug"), ThinkLevel::None);
    }

    #[test]
    fn test_token_usage_total_excludes_output() {
        let usage = TokenUsage {
            input_tokens: 10,
            cache_read_tokens: 200,
            cache_creation_tokens: 30,
            output_tokens: 999,
        };
        assert_eq!(usage.total(), 240);
    }

    #[test]
    fn test_token_usage_total_saturates() {
        let usage = TokenUsage {
            input_tokens: u64::MAX,
            cache_read_tokens: 1,
            cache_creation_tokens: u64::MAX,
            output_tokens: u64::MAX,
        };
        assert_eq!(usage.total(), u64::MAX);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("  short\n", 10), "short");
        assert_eq!(truncate("line one\nline two", 8), "line one...");
        // multibyte stays on char boundaries
        assert_eq!(truncate("héllo wörld", 4), "héll...");
    }

    #[test]
    fn test_event_builders() {
        let e = Event::new(EventKind::Bash, "Running command").with_tool("Bash");
        assert_eq!(e.tool_name.as_deref(), Some("Bash"));
        assert!(!e.is_error);
        assert!(e.is_activity());

        let err = Event::error("boom");
        assert!(err.is_error);
        assert_eq!(err.kind, EventKind::Error);

        assert!(!Event::new(EventKind::Idle, "").is_activity());
    }
}
