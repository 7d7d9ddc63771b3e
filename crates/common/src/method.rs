//! The closed set of console methods recognized by the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity class of a method, used when routing entries to a plain log sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A console method.
///
/// `Result` and `Command` are feed-side classes produced by evaluation
/// surfaces; they are valid entry methods but are never installed as slots
/// on a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    Log,
    Debug,
    Info,
    Warn,
    Error,
    Table,
    Clear,
    Time,
    TimeEnd,
    Count,
    Assert,
    Result,
    Command,
    Dir,
    Trace,
    Group,
    GroupEnd,
    GroupCollapsed,
}

impl Method {
    /// Every recognized method.
    pub const ALL: [Method; 18] = [
        Method::Log,
        Method::Debug,
        Method::Info,
        Method::Warn,
        Method::Error,
        Method::Table,
        Method::Clear,
        Method::Time,
        Method::TimeEnd,
        Method::Count,
        Method::Assert,
        Method::Result,
        Method::Command,
        Method::Dir,
        Method::Trace,
        Method::Group,
        Method::GroupEnd,
        Method::GroupCollapsed,
    ];

    /// Wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Log => "log",
            Method::Debug => "debug",
            Method::Info => "info",
            Method::Warn => "warn",
            Method::Error => "error",
            Method::Table => "table",
            Method::Clear => "clear",
            Method::Time => "time",
            Method::TimeEnd => "timeEnd",
            Method::Count => "count",
            Method::Assert => "assert",
            Method::Result => "result",
            Method::Command => "command",
            Method::Dir => "dir",
            Method::Trace => "trace",
            Method::Group => "group",
            Method::GroupEnd => "groupEnd",
            Method::GroupCollapsed => "groupCollapsed",
        }
    }

    /// Parse a wire name back into a method.
    pub fn parse(s: &str) -> Option<Method> {
        Method::ALL.iter().copied().find(|m| m.as_str() == s)
    }

    /// Severity class for display routing.
    pub fn severity(&self) -> Severity {
        match self {
            Method::Error | Method::Assert => Severity::Error,
            Method::Warn => Severity::Warning,
            _ => Severity::Info,
        }
    }

    /// Whether this method is installed as a slot on a hooked target.
    pub fn hookable(&self) -> bool {
        !matches!(self, Method::Result | Method::Command)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
