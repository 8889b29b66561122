//! Transcript line parser.
//!
//! Each transcript line is a loosely-structured JSON envelope with a `type`
//! discriminator. Unknown or malformed lines are skipped, never fatal:
//! the format grows over time and we only pick out what we understand.
//!
//! Mapping:
//! - `system`    -> SessionStart (Compact for `compact_boundary`, nothing for `local_command`)
//! - `assistant` -> one event per tool_use / thinking / text item
//! - `user`      -> Quest or ThinkHard for prompts; tool results produce nothing
//! - `result`    -> Success / Error by subtype
//! - `summary`   -> Idle

use crate::event::{truncate, Event, EventKind, ThinkLevel, TodoItem, TokenUsage};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Thinking blocks longer than this are reported as deep thinking
const DEEP_THINKING_CHARS: usize = 500;

#[derive(Debug, Default, Deserialize)]
struct Record {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    subtype: String,
    #[serde(default, rename = "compactMetadata")]
    compact_metadata: Option<CompactInfo>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Default, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CompactInfo {
    #[serde(default, rename = "preTokens")]
    pre_tokens: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ContentItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    thinking: String,
    #[serde(default)]
    input: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TodoWriteInput {
    #[serde(default)]
    todos: Vec<TodoItem>,
}

#[derive(Debug, Default, Deserialize)]
struct TaskInput {
    #[serde(default)]
    description: String,
    #[serde(default)]
    subagent_type: String,
}

#[derive(Debug, Default, Deserialize)]
struct BashInput {
    #[serde(default)]
    command: String,
}

/// Stateful line parser. Remembers the latest token usage so every event
/// emitted after an assistant record carries it.
#[derive(Debug, Default)]
pub struct TranscriptParser {
    last_token_usage: Option<TokenUsage>,
}

impl TranscriptParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_token_usage(&self) -> Option<TokenUsage> {
        self.last_token_usage
    }

    /// Parse one line. Returns an empty vec for blank, malformed or
    /// uninteresting lines.
    pub fn parse_line(&mut self, line: &str) -> Vec<Event> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }

        let record: Record = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping malformed transcript line: {}", e);
                return Vec::new();
            }
        };

        match record.kind.as_str() {
            "system" => parse_system(&record),
            "assistant" => self.parse_assistant(&record),
            "user" => parse_user(&record),
            "result" => parse_result(&record),
            "summary" if !record.summary.is_empty() => {
                vec![Event::new(EventKind::Idle, truncate(&record.summary, 50))]
            }
            _ => Vec::new(),
        }
    }

    fn parse_assistant(&mut self, record: &Record) -> Vec<Event> {
        let Some(message) = &record.message else {
            return Vec::new();
        };
        if message.usage.is_some() {
            self.last_token_usage = message.usage;
        }
        let usage = self.last_token_usage;

        content_items(message.content.as_ref())
            .into_iter()
            .filter_map(|item| match item.kind.as_str() {
                "tool_use" => Some(parse_tool_use(&item)),
                "thinking" => {
                    let details = if item.thinking.chars().count() > DEEP_THINKING_CHARS {
                        "Deep thinking..."
                    } else {
                        "Thinking..."
                    };
                    Some(Event::new(EventKind::Thinking, details))
                }
                "text" if !item.text.is_empty() => {
                    Some(Event::new(EventKind::Thinking, truncate(&item.text, 40)))
                }
                _ => None,
            })
            .map(|event| event.with_token_usage(usage))
            .collect()
    }
}

fn parse_system(record: &Record) -> Vec<Event> {
    match record.subtype.as_str() {
        "compact_boundary" => {
            let details = match &record.compact_metadata {
                Some(meta) => format!("Compacted from {}k tokens", meta.pre_tokens / 1000),
                None => "Conversation compacted".to_string(),
            };
            vec![Event::new(EventKind::Compact, details)]
        }
        "local_command" => Vec::new(),
        _ => vec![Event::new(EventKind::SessionStart, "Session started")],
    }
}

/// User records are either prompts or tool-result acknowledgements.
/// Acknowledgements never produce events: the tool_use that preceded them
/// was already counted.
fn parse_user(record: &Record) -> Vec<Event> {
    let Some(message) = &record.message else {
        return Vec::new();
    };
    let items = content_items(message.content.as_ref());
    if items.iter().any(|i| i.kind == "tool_result") {
        return Vec::new();
    }

    let Some(text) = items
        .iter()
        .find(|i| i.kind == "text" && !i.text.is_empty())
        .map(|i| i.text.as_str())
    else {
        return Vec::new();
    };

    let level = ThinkLevel::detect(text);
    if level != ThinkLevel::None {
        vec![Event::new(EventKind::ThinkHard, truncate(text, 50)).with_think_level(level)]
    } else {
        vec![Event::new(EventKind::Quest, truncate(text, 100))]
    }
}

fn parse_result(record: &Record) -> Vec<Event> {
    match record.subtype.as_str() {
        "success" => vec![Event::new(EventKind::Success, "Task completed!")],
        "error_max_turns" | "error_during_execution" => {
            vec![Event::error("Something went wrong")]
        }
        _ => Vec::new(),
    }
}

/// Message content is either a plain string or an array of typed items
fn content_items(content: Option<&Value>) -> Vec<ContentItem> {
    match content {
        Some(Value::String(text)) => vec![ContentItem {
            kind: "text".to_string(),
            text: text.clone(),
            ..Default::default()
        }],
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| serde_json::from_value::<ContentItem>(v.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_input<T: DeserializeOwned>(input: Option<&Value>) -> Option<T> {
    input.and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn parse_tool_use(item: &ContentItem) -> Event {
    let name = item.name.as_str();
    let event = match name.to_lowercase().as_str() {
        "glob" | "read" | "grep" => Event::new(EventKind::Reading, "Reading files"),
        "websearch" | "webfetch" => Event::new(EventKind::Reading, "Searching web"),
        "bash" => {
            let input: BashInput = decode_input(item.input.as_ref()).unwrap_or_default();
            if input.command.to_lowercase().contains("git push") {
                Event::new(EventKind::Bash, "Shipped!")
            } else {
                Event::new(EventKind::Bash, "Running command")
            }
        }
        "killshell" => Event::new(EventKind::Bash, "Stopping process"),
        "edit" | "write" | "notebookedit" => Event::new(EventKind::Writing, "Writing code"),
        "task" => {
            let input: TaskInput = decode_input(item.input.as_ref()).unwrap_or_default();
            let details = if !input.subagent_type.is_empty() {
                format!("Agent: {}", input.subagent_type)
            } else if !input.description.is_empty() {
                truncate(&input.description, 30)
            } else {
                "Spawning agent".to_string()
            };
            let event = Event::new(EventKind::SpawnAgent, details);
            if item.id.is_empty() {
                event
            } else {
                event.with_tool_use_id(item.id.clone())
            }
        }
        "taskoutput" => Event::new(EventKind::Thinking, "Waiting for agent"),
        "todowrite" => match decode_input::<TodoWriteInput>(item.input.as_ref()) {
            Some(input) => {
                let done = input.todos.iter().filter(|t| t.is_completed()).count();
                let details = format!("Tasks: {}/{} done", done, input.todos.len());
                Event::new(EventKind::TodoUpdate, details).with_todos(input.todos)
            }
            None => Event::new(EventKind::TodoUpdate, "Updating tasks"),
        },
        "askuserquestion" => Event::new(EventKind::AskUser, "Asking question"),
        "exitplanmode" => Event::new(EventKind::Thinking, "Plan ready"),
        "skill" => Event::new(EventKind::Thinking, "Running skill"),
        _ => Event::new(EventKind::Thinking, format!("Using {}", name)),
    };
    event.with_tool(name)
}
