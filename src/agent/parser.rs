//! Extraction of tool calls from model replies.
//!
//! Endpoints with native tool calling hand back structured calls, which
//! only need light filtering. Models prompted to write directives instead
//! produce text like:
//!
//! ```text
//! TOOL: calculator
//! INPUT: 25 * 5
//! ```
//!
//! Free-text parsing is lenient about casing, whitespace and markdown
//! decoration. Text without a complete directive is a final answer.

use crate::config::ToolCallMode;
use crate::conversation::ToolCall;
use crate::inference::ModelReply;
use crate::tools::ToolDescriptor;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Argument key used for free-text calls to tools that are not registered.
const FALLBACK_PARAM: &str = "input";

/// A `TOOL:` / `INPUT:` directive found in free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInvocation {
    /// Lower-cased, trimmed tool name.
    pub name: String,
    /// Trimmed input value.
    pub input: String,
}

/// Parser for both structured and free-text tool invocations.
pub struct ToolInvocationParser {
    tool_line: Regex,
    input_line: Regex,
    inline_input: Regex,
    /// Lower-cased tool name to the parameter a free-text input binds to.
    primary_params: HashMap<String, String>,
}

impl ToolInvocationParser {
    /// Create a parser that knows the tools in `catalog`.
    pub fn new(catalog: &[ToolDescriptor]) -> Self {
        let primary_params = catalog
            .iter()
            .map(|tool| {
                (
                    tool.name.to_lowercase(),
                    tool.primary_param().unwrap_or(FALLBACK_PARAM).to_string(),
                )
            })
            .collect();

        Self {
            // Markers may be wrapped in bold, bullets or code spans.
            tool_line: Regex::new(r"(?i)^[\s*_>#`-]*TOOL[\s*_`]*:[\s*_`]*(.*)$")
                .expect("Invalid regex"),
            input_line: Regex::new(r"(?i)^[\s*_>#`-]*INPUT[\s*_`]*:[\s*_`]*(.*)$")
                .expect("Invalid regex"),
            inline_input: Regex::new(r"(?i)[\s*_`]*\bINPUT[\s*_`]*:[\s*_`]*")
                .expect("Invalid regex"),
            primary_params,
        }
    }

    /// Tool calls in `reply`, according to `mode`.
    pub fn extract(&self, reply: &ModelReply, mode: ToolCallMode) -> Vec<ToolCall> {
        match mode {
            ToolCallMode::Structured => self.parse_structured(&reply.tool_calls),
            ToolCallMode::Text => self.parse_text_call(&reply.text).into_iter().collect(),
            ToolCallMode::Auto => {
                let structured = self.parse_structured(&reply.tool_calls);
                if structured.is_empty() {
                    self.parse_text_call(&reply.text).into_iter().collect()
                } else {
                    structured
                }
            }
        }
    }

    /// Accept native calls with a non-empty name. Arguments are not checked
    /// here; the executor validates them against the tool schema.
    pub fn parse_structured(&self, calls: &[ToolCall]) -> Vec<ToolCall> {
        calls
            .iter()
            .filter(|call| {
                let keep = !call.name.trim().is_empty();
                if !keep {
                    warn!("Dropping tool call with an empty name: {}", call);
                }
                keep
            })
            .cloned()
            .collect()
    }

    /// Find the first complete `TOOL:` / `INPUT:` directive in `text`.
    ///
    /// A `TOOL:` line, or a line holding nothing but a known tool name,
    /// starts a directive. The input must be on the same line after an
    /// `INPUT:` marker or on the very next line; anything else, a blank
    /// line included, abandons the directive and scanning goes on.
    pub fn parse_text(&self, text: &str) -> Option<TextInvocation> {
        let mut pending: Option<String> = None;

        for line in text.lines() {
            if let Some(name) = pending.take() {
                if let Some(input) = self.match_input(line) {
                    if input.is_empty() {
                        debug!("Directive for {} has an empty input", name);
                        continue;
                    }
                    return Some(TextInvocation { name, input });
                }
                debug!("Directive for {} has no INPUT line", name);
            }

            if let Some(rest) = self.match_tool(line) {
                if let Some(found) = self.inline_input.find(rest) {
                    let name = normalize_name(&rest[..found.start()]);
                    let input = rest[found.end()..].trim().to_string();
                    if !name.is_empty() && !input.is_empty() {
                        return Some(TextInvocation { name, input });
                    }
                    continue;
                }

                let name = normalize_name(rest);
                if !name.is_empty() {
                    pending = Some(name);
                }
                continue;
            }

            if let Some(name) = self.match_bare_name(line) {
                pending = Some(name);
            }
        }

        None
    }

    /// Parse free text and bind the input to the tool's primary parameter.
    pub fn parse_text_call(&self, text: &str) -> Option<ToolCall> {
        self.parse_text(text).map(|invocation| self.to_tool_call(invocation))
    }

    /// Turn a directive into a call with a single string argument.
    pub fn to_tool_call(&self, invocation: TextInvocation) -> ToolCall {
        let param = self
            .primary_params
            .get(&invocation.name)
            .map(String::as_str)
            .unwrap_or(FALLBACK_PARAM);
        ToolCall::with_arg(invocation.name, param, invocation.input)
    }

    fn match_tool<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.tool_line
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    fn match_input(&self, line: &str) -> Option<String> {
        self.input_line
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    }

    fn match_bare_name(&self, line: &str) -> Option<String> {
        let name = normalize_name(line);
        self.primary_params.contains_key(&name).then_some(name)
    }
}

fn normalize_name(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '`')
        .to_lowercase()
}
