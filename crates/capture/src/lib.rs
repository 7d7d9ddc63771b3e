//! Console interception: hookable targets, the hook/unhook lifecycle, entry
//! normalization, and the formatter contract.
//!
//! A hook swaps a target's method table for wrapping slots that capture each
//! call as an immutable entry, deliver it to a callback, then pass the call
//! through to the original slot unchanged.

pub mod console;
pub mod format;
pub mod hook;
pub mod normalize;
pub mod state;
pub mod target;

pub use console::{render_args, render_value, SystemConsole};
pub use format::{has_directives, EntryFormatter, Span, Spans};
pub use hook::{hook, unhook, CapturedEntry, EntryCallback, HookHandle};
pub use normalize::Normalizer;
pub use state::{HookState, DEFAULT_LABEL};
pub use target::{MethodTable, Slot, Target};
