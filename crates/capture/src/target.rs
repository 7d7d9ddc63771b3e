//! The console-like target contract.

use std::collections::HashMap;
use std::sync::Arc;

use codec::Value;
use common::Method;

/// A callable slot installed on a target for one method.
pub type Slot = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// The set of slots installed on a target at one moment.
///
/// Tables are snapshots: cloning one shares the slots but not future edits.
#[derive(Clone, Default)]
pub struct MethodTable {
    slots: HashMap<Method, Slot>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the slot for a method.
    pub fn set(&mut self, method: Method, slot: Slot) {
        self.slots.insert(method, slot);
    }

    /// Builder form of [`MethodTable::set`].
    pub fn with(mut self, method: Method, f: impl Fn(&[Value]) + Send + Sync + 'static) -> Self {
        self.set(method, Arc::new(f));
        self
    }

    pub fn get(&self, method: Method) -> Option<&Slot> {
        self.slots.get(&method)
    }

    /// Methods with an installed slot.
    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.slots.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A console-like object: a subset of the known methods exposed as callable
/// slots, with an escape hatch letting a controller read and atomically
/// replace the whole table.
pub trait Target: Send + Sync {
    /// Snapshot the currently installed method table.
    fn table(&self) -> MethodTable;

    /// Install a new method table in one step, returning the previous one.
    fn swap(&self, table: MethodTable) -> MethodTable;

    /// Invoke a method through the currently installed slot, if any.
    fn call(&self, method: Method, args: &[Value]) {
        if let Some(slot) = self.table().get(method) {
            slot(args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_table_snapshot_shares_slots() {
        let hits = Arc::new(Mutex::new(0u32));
        let hits2 = hits.clone();
        let table = MethodTable::new().with(Method::Log, move |_| *hits2.lock() += 1);

        let snapshot = table.clone();
        snapshot.get(Method::Log).unwrap()(&[]);
        table.get(Method::Log).unwrap()(&[]);
        assert_eq!(*hits.lock(), 2);
        assert!(Arc::ptr_eq(
            table.get(Method::Log).unwrap(),
            snapshot.get(Method::Log).unwrap()
        ));
    }

    #[test]
    fn test_missing_methods_are_tolerated() {
        let table = MethodTable::new().with(Method::Log, |_| {});
        assert_eq!(table.len(), 1);
        assert!(table.get(Method::Warn).is_none());
    }
}
