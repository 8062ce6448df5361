//! Free text to tool call.
//!
//! Routing is pure and rule-based. Alert requests are recognized by keyword
//! and need a two-letter state code; everything else is matched against the
//! city table.

use std::fmt;

use serde_json::{Value, json};

use crate::cities::{self, City};
use crate::reply;

/// Words that mark an alerts request.
pub const ALERT_KEYWORDS: [&str; 3] = ["alert", "uyarı", "warning"];

/// Tool used for city forecasts.
pub const FORECAST_TOOL: &str = "get_forecast";

/// Tool used for state alerts.
pub const ALERTS_TOOL: &str = "get_alerts";

/// A two-letter US state code, upper-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCode(String);

impl StateCode {
    /// Accept a token of exactly two alphabetic characters.
    pub fn parse(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(a), Some(b), None) if a.is_alphabetic() && b.is_alphabetic() => {
                Some(Self(token.to_uppercase()))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a tool call is about, kept for phrasing the reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    City(&'static City),
    State(StateCode),
}

/// A routed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub tool: &'static str,
    pub arguments: Value,
    pub subject: Subject,
}

impl ToolCall {
    fn forecast(city: &'static City) -> Self {
        Self {
            tool: FORECAST_TOOL,
            arguments: json!(city.coordinate),
            subject: Subject::City(city),
        }
    }

    fn alerts(state: StateCode) -> Self {
        Self {
            tool: ALERTS_TOOL,
            arguments: json!({ "state": state.as_str() }),
            subject: Subject::State(state),
        }
    }
}

/// Why the input could not be routed to a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guidance {
    /// An alerts request without a state code.
    MissingStateCode,
    /// No supported city in the input.
    UnknownCity,
}

impl Guidance {
    /// The message shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            Guidance::MissingStateCode => reply::MISSING_STATE_CODE,
            Guidance::UnknownCity => reply::CITY_NOT_FOUND,
        }
    }
}

/// The routing decision for one input.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    ToolCall(ToolCall),
    Guidance(Guidance),
}

impl Intent {
    pub fn is_tool_call(&self) -> bool {
        matches!(self, Intent::ToolCall(_))
    }

    /// The tool call, if routing produced one.
    pub fn tool_call(&self) -> Option<&ToolCall> {
        match self {
            Intent::ToolCall(call) => Some(call),
            Intent::Guidance(_) => None,
        }
    }
}

/// Route free text to a tool call or a guidance message.
pub fn route(input: &str) -> Intent {
    let text = input.trim().to_lowercase();

    if ALERT_KEYWORDS.iter().any(|k| text.contains(k)) {
        return match text.split_whitespace().find_map(StateCode::parse) {
            Some(state) => Intent::ToolCall(ToolCall::alerts(state)),
            None => Intent::Guidance(Guidance::MissingStateCode),
        };
    }

    match cities::find_in(&text) {
        Some(city) => Intent::ToolCall(ToolCall::forecast(city)),
        None => Intent::Guidance(Guidance::UnknownCity),
    }
}
