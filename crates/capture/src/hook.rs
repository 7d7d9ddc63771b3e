//! Hook/unhook lifecycle for console-like targets.
//!
//! Installing a hook swaps the target's whole method table for a wrapped one
//! in a single step; removing it restores the exact table captured at
//! install time. One hook per target at a time: a second install is an
//! error, because silently accepting it would discard the only path back to
//! the true original.

use std::cell::Cell;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, warn};

use codec::{Encoded, Limits, Value};
use common::{CaptureError, CaptureResult, LogEntry, Method};

use crate::console::render_value;
use crate::normalize::Normalizer;
use crate::state::{HookState, DEFAULT_LABEL};
use crate::target::{MethodTable, Slot, Target};

/// An entry delivered to the capture callback: raw for in-process use,
/// encoded when the hook was installed for transport.
#[derive(Clone, Debug)]
pub enum CapturedEntry {
    Raw(LogEntry<Value>),
    Encoded(LogEntry<Encoded>),
}

impl CapturedEntry {
    pub fn method(&self) -> Method {
        match self {
            CapturedEntry::Raw(entry) => entry.method,
            CapturedEntry::Encoded(entry) => entry.method,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CapturedEntry::Raw(entry) => &entry.id,
            CapturedEntry::Encoded(entry) => &entry.id,
        }
    }
}

/// Callback invoked once per intercepted call, synchronously, in call order.
pub type EntryCallback = Arc<dyn Fn(&CapturedEntry) + Send + Sync>;

// Targets with an active hook, keyed by allocation address.
static HOOKED_TARGETS: Lazy<Mutex<HashSet<usize>>> = Lazy::new(|| Mutex::new(HashSet::new()));

thread_local! {
    // Set while the capture callback runs on this thread; logging from
    // inside the callback is passed through but not re-captured.
    static IN_CAPTURE: Cell<bool> = const { Cell::new(false) };
}

/// Capability token for an installed hook; required to remove it.
pub struct HookHandle {
    target: Arc<dyn Target>,
    target_key: usize,
    original: MethodTable,
    installed: AtomicBool,
}

impl HookHandle {
    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }
}

impl Drop for HookHandle {
    fn drop(&mut self) {
        unhook(self);
    }
}

struct HookShared {
    normalizer: Normalizer,
    state: HookState,
    on_entry: EntryCallback,
    encode_for_transport: bool,
    limits: Limits,
}

/// Install a capture hook on `target`.
///
/// Every method the target exposes is wrapped; absent methods are left
/// alone. Each wrapped call builds an entry (encoded under `limit` as both
/// depth and breadth bound when `encode_for_transport` is set), delivers it
/// to `on_entry`, then invokes the original slot with the original,
/// un-encoded arguments.
pub fn hook(
    target: Arc<dyn Target>,
    on_entry: EntryCallback,
    encode_for_transport: bool,
    limit: usize,
) -> CaptureResult<HookHandle> {
    let target_key = Arc::as_ptr(&target) as *const () as usize;
    if !HOOKED_TARGETS.lock().insert(target_key) {
        return Err(CaptureError::already_hooked(format!(
            "target@{target_key:#x}"
        )));
    }

    let shared = Arc::new(HookShared {
        normalizer: Normalizer::new(),
        state: HookState::new(),
        on_entry,
        encode_for_transport,
        limits: Limits::uniform(limit),
    });

    let snapshot = target.table();
    let mut installed = MethodTable::new();
    for method in snapshot.methods() {
        let Some(original_slot) = snapshot.get(method).cloned() else {
            continue;
        };
        let shared = shared.clone();
        let wrapper: Slot = Arc::new(move |args: &[Value]| {
            capture_call(&shared, method, args);
            original_slot(args);
        });
        installed.set(method, wrapper);
    }

    let original = target.swap(installed);
    debug!(methods = original.len(), "console hook installed");
    Ok(HookHandle {
        target,
        target_key,
        original,
        installed: AtomicBool::new(true),
    })
}

/// Remove a hook, restoring the method table captured at install time.
///
/// Returns `false` if the handle was already removed; a second call never
/// writes a stale table.
pub fn unhook(handle: &HookHandle) -> bool {
    if !handle.installed.swap(false, Ordering::SeqCst) {
        return false;
    }
    handle.target.swap(handle.original.clone());
    HOOKED_TARGETS.lock().remove(&handle.target_key);
    debug!("console hook removed");
    true
}

fn capture_call(shared: &HookShared, method: Method, args: &[Value]) {
    match method {
        Method::Time => {
            shared.state.start_timer(&label_of(args));
        }
        Method::TimeEnd => {
            let label = label_of(args);
            match shared.state.end_timer(&label) {
                Some(elapsed) => deliver(
                    shared,
                    Method::Log,
                    &[Value::from(format!("{label}: {elapsed:.3}ms"))],
                ),
                None => deliver(
                    shared,
                    Method::Warn,
                    &[Value::from(format!("Timer '{label}' does not exist"))],
                ),
            }
        }
        Method::Count => {
            let label = label_of(args);
            let count = shared.state.bump_counter(&label);
            deliver(shared, Method::Count, &[Value::from(format!("{label}: {count}"))]);
        }
        Method::Assert => {
            let condition = args.first().map(Value::is_truthy).unwrap_or(false);
            if condition {
                return;
            }
            let mut data = vec![Value::from("Assertion failed:")];
            data.extend(args.iter().skip(1).cloned());
            deliver(shared, Method::Assert, &data);
        }
        _ => deliver(shared, method, args),
    }
}

fn deliver(shared: &HookShared, method: Method, args: &[Value]) {
    if IN_CAPTURE.with(|flag| flag.get()) {
        return;
    }
    let entry = if shared.encode_for_transport {
        CapturedEntry::Encoded(shared.normalizer.transport(method, args, shared.limits))
    } else {
        CapturedEntry::Raw(shared.normalizer.raw(method, args))
    };
    IN_CAPTURE.with(|flag| flag.set(true));
    let outcome = catch_unwind(AssertUnwindSafe(|| (shared.on_entry)(&entry)));
    IN_CAPTURE.with(|flag| flag.set(false));
    if outcome.is_err() {
        warn!("capture callback panicked; entry dropped");
    }
}

fn label_of(args: &[Value]) -> String {
    match args.first() {
        None | Some(Value::Undefined) => DEFAULT_LABEL.to_string(),
        Some(Value::Str(s)) => s.clone(),
        Some(other) => render_value(other, 0),
    }
}
