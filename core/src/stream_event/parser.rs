use serde_json::Value;

use super::model::{SequencedEvent, StreamEvent, TerminalEvent};

/// Parses the claude "stream-json" (and single-document "json") output.
///
/// Best-effort:
/// - blank and non-JSON lines yield nothing (noise, still logged raw by the tee)
/// - JSON lines of an unrecognised shape yield `StreamEvent::Unknown`
/// - one `assistant` line can carry several `tool_use` blocks
#[derive(Debug, Default)]
pub struct StreamJsonEventParser {
    json_lines: u64,
}

impl StreamJsonEventParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines that parsed as JSON so far.
    pub fn json_lines(&self) -> u64 {
        self.json_lines
    }

    /// Like `parse_line`, with each event tagged by its JSON line number (1-based).
    pub fn parse_sequenced(&mut self, line: &str) -> Vec<SequencedEvent> {
        let events = self.parse_line(line);
        let seq = self.json_lines;
        events
            .into_iter()
            .map(|event| SequencedEvent { seq, event })
            .collect()
    }

    pub fn parse_line(&mut self, line: &str) -> Vec<StreamEvent> {
        let s = line.trim();
        if !(s.starts_with('{') && s.ends_with('}')) {
            return Vec::new();
        }
        let v: Value = match serde_json::from_str(s) {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        };
        self.json_lines += 1;

        match v.get("type").and_then(|x| x.as_str()) {
            Some("assistant") => tool_uses(&v),
            Some("user") => tool_results(&v),
            Some("result") => vec![StreamEvent::Terminal(terminal(&v))],
            Some("error") => vec![StreamEvent::Error {
                message: error_message(&v),
            }],
            _ => vec![StreamEvent::Unknown],
        }
    }
}

fn content_blocks(v: &Value) -> &[Value] {
    v.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_array())
        .map(|a| a.as_slice())
        .unwrap_or(&[])
}

// {"type":"assistant","message":{"content":[{"type":"tool_use","id":"...","name":"Read","input":{...}}]}}
fn tool_uses(v: &Value) -> Vec<StreamEvent> {
    let events: Vec<StreamEvent> = content_blocks(v)
        .iter()
        .filter(|item| item.get("type").and_then(|x| x.as_str()) == Some("tool_use"))
        .map(|item| StreamEvent::ToolUse {
            id: str_field(item, "id"),
            name: str_field(item, "name")
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "tool".to_string()),
        })
        .collect();

    if events.is_empty() {
        vec![StreamEvent::Unknown]
    } else {
        events
    }
}

// {"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"...","is_error":false}]}}
fn tool_results(v: &Value) -> Vec<StreamEvent> {
    let events: Vec<StreamEvent> = content_blocks(v)
        .iter()
        .filter(|item| item.get("type").and_then(|x| x.as_str()) == Some("tool_result"))
        .map(|item| StreamEvent::ToolResult {
            tool_use_id: str_field(item, "tool_use_id"),
            is_error: item
                .get("is_error")
                .and_then(|x| x.as_bool())
                .or_else(|| {
                    v.get("tool_use_result")
                        .and_then(|r| r.get("isError").or_else(|| r.get("is_error")))
                        .and_then(|x| x.as_bool())
                }),
        })
        .collect();

    if events.is_empty() {
        vec![StreamEvent::Unknown]
    } else {
        events
    }
}

// {"type":"result","subtype":"success","is_error":false,"result":"...","session_id":"..."}
fn terminal(v: &Value) -> TerminalEvent {
    let success = v
        .get("success")
        .and_then(|x| x.as_bool())
        .or_else(|| v.get("is_error").and_then(|x| x.as_bool()).map(|e| !e))
        .or_else(|| {
            v.get("subtype")
                .and_then(|x| x.as_str())
                .map(|s| s == "success")
        })
        .unwrap_or(true);

    let result = match v.get("result") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    };

    let error = if success {
        None
    } else {
        v.get("error")
            .map(value_text)
            .or_else(|| {
                v.get("errors")
                    .and_then(|e| e.as_array())
                    .filter(|e| !e.is_empty())
                    .map(|e| e.iter().map(value_text).collect::<Vec<_>>().join("; "))
            })
            .or_else(|| str_field(v, "subtype"))
    };

    TerminalEvent {
        success,
        result,
        error,
        session_id: str_field(v, "session_id"),
    }
}

// {"type":"error","error":{"message":"..."}} or {"type":"error","message":"..."}
fn error_message(v: &Value) -> String {
    v.get("error")
        .map(value_text)
        .or_else(|| str_field(v, "message"))
        .unwrap_or_else(|| "unknown error event".to_string())
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Object(o) => o
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .unwrap_or_else(|| v.to_string()),
        other => other.to_string(),
    }
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|x| x.as_str()).map(|x| x.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_garbage_lines_are_noise() {
        let mut p = StreamJsonEventParser::new();
        assert!(p.parse_line("").is_empty());
        assert!(p.parse_line("   ").is_empty());
        assert!(p.parse_line("Loading model...").is_empty());
        assert!(p.parse_line("{not json}").is_empty());
        assert_eq!(p.json_lines(), 0);
    }

    #[test]
    fn assistant_tool_use_blocks_become_tool_events() {
        let mut p = StreamJsonEventParser::new();
        let line = r#"{"type":"assistant","message":{"content":[
            {"type":"text","text":"let me look"},
            {"type":"tool_use","id":"t1","name":"Read","input":{"path":"a.rs"}},
            {"type":"tool_use","id":"t2","input":{}}
        ]}}"#
            .replace('\n', "");
        let events = p.parse_line(&line);
        assert_eq!(
            events,
            vec![
                StreamEvent::ToolUse {
                    id: Some("t1".into()),
                    name: "Read".into()
                },
                StreamEvent::ToolUse {
                    id: Some("t2".into()),
                    name: "tool".into()
                },
            ]
        );
    }

    #[test]
    fn assistant_text_only_is_unknown() {
        let mut p = StreamJsonEventParser::new();
        let events = p.parse_line(
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"hi"}]}}"#,
        );
        assert_eq!(events, vec![StreamEvent::Unknown]);
        assert_eq!(p.json_lines(), 1);
    }

    #[test]
    fn user_tool_result_is_classified() {
        let mut p = StreamJsonEventParser::new();
        let events = p.parse_line(
            r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t1","is_error":true}]}}"#,
        );
        assert_eq!(
            events,
            vec![StreamEvent::ToolResult {
                tool_use_id: Some("t1".into()),
                is_error: Some(true)
            }]
        );
    }

    #[test]
    fn explicit_success_result_event() {
        let mut p = StreamJsonEventParser::new();
        let events = p.parse_line(r#"{"type":"result","success":true,"result":"done"}"#);
        assert_eq!(
            events,
            vec![StreamEvent::Terminal(TerminalEvent {
                success: true,
                result: Some("done".into()),
                error: None,
                session_id: None,
            })]
        );
    }

    #[test]
    fn claude_style_error_result_uses_is_error_and_subtype() {
        let mut p = StreamJsonEventParser::new();
        let events = p.parse_line(
            r#"{"type":"result","subtype":"error_max_turns","is_error":true,"session_id":"s1"}"#,
        );
        match &events[0] {
            StreamEvent::Terminal(t) => {
                assert!(!t.success);
                assert_eq!(t.error.as_deref(), Some("error_max_turns"));
                assert_eq!(t.session_id.as_deref(), Some("s1"));
            }
            other => panic!("expected terminal event, got {other:?}"),
        }
    }

    #[test]
    fn error_event_message_shapes() {
        let mut p = StreamJsonEventParser::new();
        assert_eq!(
            p.parse_line(r#"{"type":"error","error":{"message":"rate limited"}}"#),
            vec![StreamEvent::Error {
                message: "rate limited".into()
            }]
        );
        assert_eq!(
            p.parse_line(r#"{"type":"error","message":"overloaded"}"#),
            vec![StreamEvent::Error {
                message: "overloaded".into()
            }]
        );
    }

    #[test]
    fn sequence_numbers_count_json_lines_only() {
        let mut p = StreamJsonEventParser::new();
        assert!(p.parse_sequenced("booting").is_empty());
        let first = p.parse_sequenced(r#"{"type":"system"}"#);
        assert_eq!(first[0].seq, 1);
        let both = p.parse_sequenced(
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Read"},{"type":"tool_use","name":"Bash"}]}}"#,
        );
        assert_eq!(both.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![2, 2]);
        assert!(p.parse_sequenced("").is_empty());
        let last = p.parse_sequenced(r#"{"type":"result","result":"ok"}"#);
        assert_eq!(last[0].seq, 3);
        assert!(matches!(last[0].event, StreamEvent::Terminal(_)));
    }

    #[test]
    fn unrecognised_json_is_unknown() {
        let mut p = StreamJsonEventParser::new();
        assert_eq!(
            p.parse_line(r#"{"type":"system","subtype":"init"}"#),
            vec![StreamEvent::Unknown]
        );
        assert_eq!(p.parse_line(r#"{"no_type":1}"#), vec![StreamEvent::Unknown]);
    }
}
