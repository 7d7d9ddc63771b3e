//! The transport-safe wire tree.
//!
//! Every variant serializes to strictly JSON-compatible data under an
//! internal `"kind"` tag. Non-finite numbers never appear as raw JSON
//! numbers; they are carried by the tagged scalar variants.

use serde::Serialize;

/// One encoded value in the wire tree.
///
/// The tree is finite and acyclic by construction: traversal budgets emit
/// [`Encoded::Truncated`] and revisited containers emit [`Encoded::Cycle`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Encoded {
    Undefined,
    Null,
    Bool { value: bool },
    /// A finite number.
    Num { value: f64 },
    Str { value: String },
    Nan,
    Infinity { negative: bool },
    Symbol { description: String },
    Bigint { digits: String },
    /// A complete sequence.
    Seq { items: Vec<Encoded> },
    /// A bounded branch: `total` is the true declared length. Breadth
    /// truncation keeps the encoded prefix in `items`; an exhausted depth
    /// budget leaves `items` empty.
    Truncated { total: u64, items: Vec<Encoded> },
    /// A keyed object. `class` is the constructor name recovered for
    /// display; `dropped` counts entries beyond the breadth budget.
    Obj {
        class: Option<String>,
        entries: Vec<(String, Encoded)>,
        dropped: u64,
    },
    Map {
        entries: Vec<(Encoded, Encoded)>,
        dropped: u64,
    },
    Set { items: Vec<Encoded>, dropped: u64 },
    /// A non-callable function stub carrying the display name only.
    Func { name: String },
    Err {
        name: String,
        message: String,
        stack: Option<String>,
    },
    /// ISO-8601 timestamp.
    Date { iso: String },
    Regexp { source: String, flags: String },
    /// Back-reference to the container assigned `index` earlier in the same
    /// encode pass.
    Cycle { index: u32 },
}
