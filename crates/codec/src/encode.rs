//! Bounded traversal from runtime values to the wire tree.

use std::collections::HashMap;

use chrono::SecondsFormat;
use tracing::warn;

use crate::value::{GetterFn, Value};
use crate::wire::Encoded;

/// Property names that are never encoded, as own keys or otherwise.
pub const FORBIDDEN_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Whether a key must be excluded from any keyed container.
pub fn is_forbidden_key(key: &str) -> bool {
    FORBIDDEN_KEYS.contains(&key)
}

/// Traversal budgets applied per encode pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum container nesting levels traversed.
    pub depth: usize,
    /// Maximum entries encoded per container.
    pub breadth: usize,
}

impl Limits {
    pub fn new(depth: usize, breadth: usize) -> Self {
        Self { depth, breadth }
    }

    /// A single bound applied to both depth and breadth.
    pub fn uniform(limit: usize) -> Self {
        Self {
            depth: limit,
            breadth: limit,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            depth: 10,
            breadth: 100,
        }
    }
}

/// Containers visited in the current pass, keyed by handle address and
/// mapped to the preorder index assigned when traversal entered them.
#[derive(Default)]
struct Visited {
    indices: HashMap<usize, u32>,
    next: u32,
}

impl Visited {
    fn lookup(&self, addr: usize) -> Option<u32> {
        self.indices.get(&addr).copied()
    }

    fn assign(&mut self, addr: usize) -> u32 {
        let index = self.next;
        self.next = self.next.wrapping_add(1);
        self.indices.insert(addr, index);
        index
    }
}

/// Encode a runtime value into a finite, transport-safe tree.
///
/// Total for any input: cyclic graphs terminate through the visited set,
/// oversized containers are truncated, and failing getters are replaced by
/// error placeholders.
pub fn encode(value: &Value, limits: Limits) -> Encoded {
    let mut visited = Visited::default();
    encode_value(value, limits.depth, limits, &mut visited)
}

fn encode_value(value: &Value, depth_left: usize, limits: Limits, visited: &mut Visited) -> Encoded {
    match value {
        Value::Undefined => Encoded::Undefined,
        Value::Null => Encoded::Null,
        Value::Bool(b) => Encoded::Bool { value: *b },
        Value::Num(n) if n.is_nan() => Encoded::Nan,
        Value::Num(n) if n.is_infinite() => Encoded::Infinity {
            negative: *n < 0.0,
        },
        Value::Num(n) => Encoded::Num { value: *n },
        Value::Str(s) => Encoded::Str { value: s.clone() },
        Value::Symbol(description) => Encoded::Symbol {
            description: description.clone(),
        },
        Value::BigInt(digits) => Encoded::Bigint {
            digits: digits.clone(),
        },
        Value::Function { name } => Encoded::Func { name: name.clone() },
        Value::Error {
            name,
            message,
            stack,
        } => Encoded::Err {
            name: name.clone(),
            message: message.clone(),
            stack: stack.clone(),
        },
        Value::Date(dt) => Encoded::Date {
            iso: dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        },
        Value::Regexp { source, flags } => Encoded::Regexp {
            source: source.clone(),
            flags: flags.clone(),
        },
        Value::Getter(get) => match resolve_getter(get, limits.depth.max(1)) {
            Ok(resolved) => encode_value(&resolved, depth_left, limits, visited),
            Err(message) => {
                warn!("property getter failed during encode: {message}");
                Encoded::Err {
                    name: "EncodeError".to_string(),
                    message,
                    stack: None,
                }
            }
        },
        Value::Array(handle) => {
            let addr = value.address().unwrap_or_default();
            if let Some(index) = visited.lookup(addr) {
                return Encoded::Cycle { index };
            }
            let items = handle.read().clone();
            if depth_left == 0 {
                return Encoded::Truncated {
                    total: items.len() as u64,
                    items: Vec::new(),
                };
            }
            visited.assign(addr);
            let total = items.len();
            let encoded: Vec<Encoded> = items
                .iter()
                .take(limits.breadth)
                .map(|item| encode_value(item, depth_left - 1, limits, visited))
                .collect();
            if total > limits.breadth {
                Encoded::Truncated {
                    total: total as u64,
                    items: encoded,
                }
            } else {
                Encoded::Seq { items: encoded }
            }
        }
        Value::Object(handle) => {
            let addr = value.address().unwrap_or_default();
            if let Some(index) = visited.lookup(addr) {
                return Encoded::Cycle { index };
            }
            let data = handle.read().clone();
            if depth_left == 0 {
                return Encoded::Truncated {
                    total: data.fields.len() as u64,
                    items: Vec::new(),
                };
            }
            visited.assign(addr);
            let class = match &data.class_name {
                Some(name) if !name.is_empty() => Some(name.clone()),
                Some(_) => Some("Object".to_string()),
                None => None,
            };
            let safe: Vec<(&String, &Value)> = data
                .fields
                .iter()
                .filter(|(key, _)| !is_forbidden_key(key))
                .collect();
            let total = safe.len();
            let entries: Vec<(String, Encoded)> = safe
                .into_iter()
                .take(limits.breadth)
                .map(|(key, field)| {
                    (
                        key.clone(),
                        encode_value(field, depth_left - 1, limits, visited),
                    )
                })
                .collect();
            Encoded::Obj {
                class,
                dropped: (total - entries.len()) as u64,
                entries,
            }
        }
        Value::Map(handle) => {
            let addr = value.address().unwrap_or_default();
            if let Some(index) = visited.lookup(addr) {
                return Encoded::Cycle { index };
            }
            let pairs = handle.read().clone();
            if depth_left == 0 {
                return Encoded::Truncated {
                    total: pairs.len() as u64,
                    items: Vec::new(),
                };
            }
            visited.assign(addr);
            let total = pairs.len();
            let entries: Vec<(Encoded, Encoded)> = pairs
                .iter()
                .take(limits.breadth)
                .map(|(key, val)| {
                    (
                        encode_value(key, depth_left - 1, limits, visited),
                        encode_value(val, depth_left - 1, limits, visited),
                    )
                })
                .collect();
            Encoded::Map {
                dropped: (total - entries.len()) as u64,
                entries,
            }
        }
        Value::Set(handle) => {
            let addr = value.address().unwrap_or_default();
            if let Some(index) = visited.lookup(addr) {
                return Encoded::Cycle { index };
            }
            let members = handle.read().clone();
            if depth_left == 0 {
                return Encoded::Truncated {
                    total: members.len() as u64,
                    items: Vec::new(),
                };
            }
            visited.assign(addr);
            let total = members.len();
            let items: Vec<Encoded> = members
                .iter()
                .take(limits.breadth)
                .map(|member| encode_value(member, depth_left - 1, limits, visited))
                .collect();
            Encoded::Set {
                dropped: (total - items.len()) as u64,
                items,
            }
        }
    }
}

// Getter chains resolve iteratively so a getter returning a getter cannot
// recurse past the depth budget.
fn resolve_getter(get: &GetterFn, max_hops: usize) -> Result<Value, String> {
    let mut resolved = get()?;
    let mut hops = 0;
    while let Value::Getter(next) = resolved {
        hops += 1;
        if hops > max_hops {
            return Err("getter chain too deep".to_string());
        }
        resolved = next()?;
    }
    Ok(resolved)
}
