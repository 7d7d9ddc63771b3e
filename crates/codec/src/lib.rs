//! Value codec: bounded encode/decode between runtime value graphs and a
//! transport-safe wire tree.
//!
//! Encode walks an arbitrary (possibly cyclic, possibly hostile) value graph
//! under depth and breadth budgets and emits a finite, JSON-safe tagged
//! tree. Decode reverses it from untrusted wire JSON without ever trusting
//! the payload. Both directions are total.

pub mod decode;
pub mod encode;
pub mod entry;
pub mod value;
pub mod wire;

pub use decode::{decode, Decoded};
pub use encode::{encode, is_forbidden_key, Limits, FORBIDDEN_KEYS};
pub use entry::{decode_entry, encode_entry, entry_json};
pub use value::{ObjectData, Value};
pub use wire::Encoded;
