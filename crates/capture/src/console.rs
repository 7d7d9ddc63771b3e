//! Process-log backed console target.

use parking_lot::RwLock;
use std::fmt::Write;
use std::sync::Arc;

use codec::Value;
use common::{Method, Severity};
use tracing::{error, info, warn};

use crate::target::{MethodTable, Target};

/// A real console-like object whose native slots render their arguments to
/// the process log. Useful as the default hook target and as the
/// pass-through sink behind a capture pipeline.
pub struct SystemConsole {
    table: RwLock<MethodTable>,
}

impl SystemConsole {
    pub fn new() -> Self {
        let mut table = MethodTable::new();
        for method in Method::ALL {
            if !method.hookable() {
                continue;
            }
            table.set(method, Arc::new(move |args: &[Value]| emit(method, args)));
        }
        Self {
            table: RwLock::new(table),
        }
    }
}

impl Default for SystemConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for SystemConsole {
    fn table(&self) -> MethodTable {
        self.table.read().clone()
    }

    fn swap(&self, table: MethodTable) -> MethodTable {
        std::mem::replace(&mut *self.table.write(), table)
    }
}

fn emit(method: Method, args: &[Value]) {
    let line = render_args(args);
    match method.severity() {
        Severity::Error => error!(target: "console", "{method}: {line}"),
        Severity::Warning => warn!(target: "console", "{line}"),
        Severity::Info => info!(target: "console", "{line}"),
    }
}

/// Render arguments the way a native console prints them: space-joined.
pub fn render_args(args: &[Value]) -> String {
    let mut output = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            output.push(' ');
        }
        let _ = write!(output, "{}", render_value(arg, 0));
    }
    output
}

/// Render a single value as plain text, depth-capped.
pub fn render_value(value: &Value, depth: usize) -> String {
    if depth > 3 {
        return "[...]".to_string();
    }

    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Num(n) => {
            if n.is_nan() {
                "NaN".to_string()
            } else if n.is_infinite() {
                if *n > 0.0 {
                    "Infinity".to_string()
                } else {
                    "-Infinity".to_string()
                }
            } else {
                n.to_string()
            }
        }
        Value::Str(s) => s.clone(),
        Value::Symbol(description) => format!("Symbol({description})"),
        Value::BigInt(digits) => format!("{digits}n"),
        Value::Array(handle) => {
            let items = handle.read();
            let mut parts = Vec::new();
            for item in items.iter().take(10) {
                parts.push(render_value(item, depth + 1));
            }
            if items.len() > 10 {
                parts.push(format!("... {} more items", items.len() - 10));
            }
            format!("[{}]", parts.join(", "))
        }
        Value::Object(handle) => {
            let data = handle.read();
            let mut parts = Vec::new();
            for (i, (key, field)) in data.fields.iter().enumerate() {
                if i >= 5 {
                    parts.push(format!("... {} more", data.fields.len() - 5));
                    break;
                }
                parts.push(format!("{}: {}", key, render_value(field, depth + 1)));
            }
            let body = format!("{{ {} }}", parts.join(", "));
            match &data.class_name {
                Some(class) if !class.is_empty() => format!("{class} {body}"),
                _ => body,
            }
        }
        Value::Map(handle) => {
            let pairs = handle.read();
            let mut parts = Vec::new();
            for (key, val) in pairs.iter().take(5) {
                parts.push(format!(
                    "{} => {}",
                    render_value(key, depth + 1),
                    render_value(val, depth + 1)
                ));
            }
            if pairs.len() > 5 {
                parts.push(format!("... {} more", pairs.len() - 5));
            }
            format!("Map({}) {{ {} }}", pairs.len(), parts.join(", "))
        }
        Value::Set(handle) => {
            let members = handle.read();
            let mut parts = Vec::new();
            for member in members.iter().take(10) {
                parts.push(render_value(member, depth + 1));
            }
            if members.len() > 10 {
                parts.push(format!("... {} more items", members.len() - 10));
            }
            format!("Set({}) {{ {} }}", members.len(), parts.join(", "))
        }
        Value::Function { name } => {
            if name.is_empty() {
                "[Function (anonymous)]".to_string()
            } else {
                format!("[Function: {name}]")
            }
        }
        Value::Error { name, message, .. } => format!("{name}: {message}"),
        Value::Date(dt) => dt.to_rfc3339(),
        Value::Regexp { source, flags } => format!("/{source}/{flags}"),
        Value::Getter(get) => match get() {
            Ok(resolved) => render_value(&resolved, depth + 1),
            Err(_) => "(inaccessible)".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_primitive() {
        assert_eq!(render_value(&Value::Undefined, 0), "undefined");
        assert_eq!(render_value(&Value::Null, 0), "null");
        assert_eq!(render_value(&Value::from(true), 0), "true");
        assert_eq!(render_value(&Value::from(42), 0), "42");
        assert_eq!(render_value(&Value::Num(f64::NAN), 0), "NaN");
    }

    #[test]
    fn test_render_array_overflow() {
        let value = Value::array((0..12).map(Value::from));
        let rendered = render_value(&value, 0);
        assert!(rendered.starts_with("[0, 1,"));
        assert!(rendered.contains("... 2 more items"));
    }

    #[test]
    fn test_render_object_and_function() {
        let value = Value::object([("f", Value::function("handler"))]);
        assert_eq!(render_value(&value, 0), "{ f: [Function: handler] }");
        assert_eq!(
            render_value(&Value::function(""), 0),
            "[Function (anonymous)]"
        );
        let named = Value::instance("MyObject", [("x", Value::from(1))]);
        assert_eq!(render_value(&named, 0), "MyObject { x: 1 }");
    }

    #[test]
    fn test_render_depth_cap_terminates_cycles() {
        let value = Value::object([("name", Value::from("loop"))]);
        if let Value::Object(handle) = &value {
            handle.write().fields.insert("own".to_string(), value.clone());
        }
        let rendered = render_value(&value, 0);
        assert!(rendered.contains("[...]"));
    }

    #[test]
    fn test_system_console_exposes_hookable_methods() {
        let console = SystemConsole::new();
        let table = console.table();
        assert_eq!(table.len(), 16);
        assert!(table.get(Method::Log).is_some());
        assert!(table.get(Method::Result).is_none());
    }

    #[test]
    fn test_swap_replaces_whole_table() {
        let console = SystemConsole::new();
        let original = console.swap(MethodTable::new());
        assert_eq!(original.len(), 16);
        assert!(console.table().is_empty());
    }
}
