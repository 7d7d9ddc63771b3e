//! Captured log entries.

use crate::method::Method;
use serde::Serialize;

/// One captured console invocation.
///
/// `T` is the argument representation: a raw runtime value for in-process
/// delivery, an encoded wire value for transport, or a decoded value on the
/// receiving side. Entries are immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogEntry<T> {
    /// The intercepted method.
    pub method: Method,
    /// Unique id for rendering-list stability; unrelated to content.
    pub id: String,
    /// Ordered argument list.
    pub data: Vec<T>,
}

impl<T> LogEntry<T> {
    pub fn new(method: Method, id: impl Into<String>, data: Vec<T>) -> Self {
        Self {
            method,
            id: id.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_wire_shape() {
        let entry = LogEntry::new(Method::TimeEnd, "entry-7", vec![1u32, 2]);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["method"], "timeEnd");
        assert_eq!(json["id"], "entry-7");
        assert_eq!(json["data"][1], 2);
    }
}
