//! Canonical entry construction.

use std::sync::atomic::{AtomicU64, Ordering};

use codec::{encode_entry, Encoded, Limits, Value};
use common::{LogEntry, Method};

/// Builds immutable log entries from intercepted calls, assigning each a
/// unique id. Ids order entries for rendering; they carry no content.
pub struct Normalizer {
    next: AtomicU64,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> String {
        format!("entry-{}", self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Build an in-process entry carrying the raw arguments.
    pub fn raw(&self, method: Method, args: &[Value]) -> LogEntry<Value> {
        LogEntry::new(method, self.next_id(), args.to_vec())
    }

    /// Build a transport entry, encoding every argument under `limits`.
    pub fn transport(&self, method: Method, args: &[Value], limits: Limits) -> LogEntry<Encoded> {
        let entry = LogEntry::new(method, self.next_id(), args.to_vec());
        encode_entry(&entry, limits)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let normalizer = Normalizer::new();
        let a = normalizer.raw(Method::Log, &[]);
        let b = normalizer.raw(Method::Log, &[]);
        assert_eq!(a.id, "entry-0");
        assert_eq!(b.id, "entry-1");
    }

    #[test]
    fn test_raw_preserves_method_and_data() {
        let normalizer = Normalizer::new();
        let entry = normalizer.raw(Method::Warn, &[Value::from("careful")]);
        assert_eq!(entry.method, Method::Warn);
        assert_eq!(entry.data.len(), 1);
    }

    #[test]
    fn test_transport_encodes_arguments() {
        let normalizer = Normalizer::new();
        let entry = normalizer.transport(
            Method::Log,
            &[Value::Num(f64::NAN)],
            Limits::default(),
        );
        assert_eq!(entry.data[0], Encoded::Nan);
    }
}
