//! Path accessor: read, write and clear a dotted path inside a host value.
//!
//! Segments match record fields and map keys case-insensitively, parse as
//! indices inside sequences, and pass straight through optionals. When a path
//! ends on a sequence, index 0 is implied.

use tracing::trace;

use crate::error::AccessError;
use crate::value::{parse_bool, parse_int, Keyed, Record, Slot, Value};

/// Read the value at `path`.
pub fn read(slot: Slot<'_>, path: &[&str]) -> Result<Value, AccessError> {
    trace!(kind = slot.kind(), ?path, "read");
    match slot {
        Slot::Str(s) => scalar_end(path, "string").map(|()| Value::Str(s.clone())),
        Slot::Int(n) => scalar_end(path, "integer").map(|()| Value::Int(*n)),
        Slot::Bool(b) => scalar_end(path, "boolean").map(|()| Value::Bool(*b)),
        Slot::Bytes(b) => scalar_end(path, "bytes").map(|()| Value::Bytes(b.clone())),
        Slot::Record(record) => {
            let Some((segment, rest)) = path.split_first() else {
                return Ok(Value::Composite {
                    kind: "record",
                    type_name: record.type_name(),
                });
            };
            let name = find_field(&*record, segment)?;
            match record.field(name) {
                Some(child) => read(child, rest),
                None => Err(not_found(segment, "record", record.type_name())),
            }
        }
        Slot::Keyed(map) => {
            let Some((segment, rest)) = path.split_first() else {
                return Ok(Value::Composite {
                    kind: "keyed container",
                    type_name: map.type_name(),
                });
            };
            let key = find_key(&*map, segment)
                .ok_or_else(|| not_found(segment, "keyed container", map.type_name()))?;
            match map.entry(&key) {
                Some(child) => read(child, rest),
                None => Err(not_found(segment, "keyed container", map.type_name())),
            }
        }
        Slot::Indexed(seq) => {
            let (index, rest) = split_index(path, &seq.type_name())?;
            let len = seq.len();
            match seq.element(index) {
                Some(child) => read(child, rest),
                None => Err(AccessError::IndexOutOfRange {
                    index,
                    len,
                    type_name: seq.type_name(),
                }),
            }
        }
        Slot::Optional(opt) => {
            let type_name = opt.type_name();
            match opt.get() {
                Some(inner) => read(inner, path),
                None => Err(AccessError::Absent { type_name }),
            }
        }
    }
}

/// Assign `value` at `path`, coercing it to the scalar type found there.
///
/// Absent optionals on the way are materialized. A missing key in a keyed
/// container is created when it is the last segment.
pub fn write(slot: Slot<'_>, path: &[&str], value: &str) -> Result<(), AccessError> {
    trace!(kind = slot.kind(), ?path, value, "write");
    match slot {
        Slot::Str(s) => {
            scalar_end(path, "string")?;
            *s = value.to_string();
            Ok(())
        }
        Slot::Int(n) => {
            scalar_end(path, "integer")?;
            *n = parse_int(value)?;
            Ok(())
        }
        Slot::Bool(b) => {
            scalar_end(path, "boolean")?;
            *b = parse_bool(value);
            Ok(())
        }
        Slot::Bytes(b) => {
            scalar_end(path, "bytes")?;
            *b = value.as_bytes().to_vec();
            Ok(())
        }
        Slot::Record(record) => {
            let Some((segment, rest)) = path.split_first() else {
                return Err(AccessError::NotAssignable {
                    kind: "record",
                    type_name: record.type_name(),
                });
            };
            let name = find_field(&*record, segment)?;
            match record.field(name) {
                Some(child) => write(child, rest, value),
                None => Err(not_found(segment, "record", record.type_name())),
            }
        }
        Slot::Keyed(map) => {
            let Some((segment, rest)) = path.split_first() else {
                return Err(AccessError::NotAssignable {
                    kind: "keyed container",
                    type_name: map.type_name(),
                });
            };
            match find_key(&*map, segment) {
                Some(key) => match map.entry(&key) {
                    Some(child) => write(child, rest, value),
                    None => Err(not_found(segment, "keyed container", map.type_name())),
                },
                None if rest.is_empty() => {
                    trace!(key = segment, "creating entry");
                    map.insert(segment, value)
                }
                None => Err(not_found(segment, "keyed container", map.type_name())),
            }
        }
        Slot::Indexed(seq) => {
            let (index, rest) = split_index(path, &seq.type_name())?;
            let len = seq.len();
            match seq.element(index) {
                Some(child) => write(child, rest, value),
                None => Err(AccessError::IndexOutOfRange {
                    index,
                    len,
                    type_name: seq.type_name(),
                }),
            }
        }
        Slot::Optional(opt) => {
            let inner = opt.materialize()?;
            write(inner, path, value)
        }
    }
}

/// Reset the value at `path` to its zero value.
///
/// Keyed entries are removed, sequence elements are cleared in place and
/// optionals are emptied. Anything already missing counts as cleared.
pub fn clear(slot: Slot<'_>, path: &[&str]) -> Result<(), AccessError> {
    trace!(kind = slot.kind(), ?path, "clear");
    match slot {
        Slot::Str(s) if path.is_empty() => {
            s.clear();
            Ok(())
        }
        Slot::Int(n) if path.is_empty() => {
            *n = 0;
            Ok(())
        }
        Slot::Bool(b) if path.is_empty() => {
            *b = false;
            Ok(())
        }
        Slot::Bytes(b) if path.is_empty() => {
            b.clear();
            Ok(())
        }
        // Nothing lives below a scalar.
        Slot::Str(_) | Slot::Int(_) | Slot::Bool(_) | Slot::Bytes(_) => Ok(()),
        Slot::Record(record) => match path.split_first() {
            None => {
                for name in record.field_names() {
                    if let Some(child) = record.field(name) {
                        clear(child, &[])?;
                    }
                }
                Ok(())
            }
            Some((segment, rest)) => {
                let Some(name) = find_field(&*record, segment).ok() else {
                    return Ok(());
                };
                match record.field(name) {
                    Some(child) => clear(child, rest),
                    None => Ok(()),
                }
            }
        },
        Slot::Keyed(map) => match path.split_first() {
            None => {
                map.clear();
                Ok(())
            }
            Some((segment, rest)) => {
                let Some(key) = find_key(&*map, segment) else {
                    return Ok(());
                };
                if rest.is_empty() {
                    map.remove(&key);
                    return Ok(());
                }
                match map.entry(&key) {
                    Some(child) => clear(child, rest),
                    None => Ok(()),
                }
            }
        },
        Slot::Indexed(seq) => {
            let (index, rest) = split_index(path, &seq.type_name())?;
            match seq.element(index) {
                Some(child) => clear(child, rest),
                None => Ok(()),
            }
        }
        Slot::Optional(opt) => {
            if path.is_empty() {
                opt.reset();
                return Ok(());
            }
            match opt.get() {
                Some(inner) => clear(inner, path),
                None => Ok(()),
            }
        }
    }
}

/// Split a dotted path into its segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

fn scalar_end(path: &[&str], kind: &'static str) -> Result<(), AccessError> {
    match path.first() {
        None => Ok(()),
        Some(segment) => Err(AccessError::PathPastScalar {
            segment: segment.to_string(),
            kind,
        }),
    }
}

fn find_field(record: &dyn Record, segment: &str) -> Result<&'static str, AccessError> {
    record
        .field_names()
        .iter()
        .copied()
        .find(|name| name.eq_ignore_ascii_case(segment))
        .ok_or_else(|| not_found(segment, "record", record.type_name()))
}

fn find_key(map: &dyn Keyed, segment: &str) -> Option<String> {
    map.keys()
        .into_iter()
        .find(|key| key.eq_ignore_ascii_case(segment))
}

/// Leading index segment and the remainder. An exhausted path means index 0.
fn split_index<'p, 's>(
    path: &'p [&'s str],
    type_name: &str,
) -> Result<(usize, &'p [&'s str]), AccessError> {
    let Some((segment, rest)) = path.split_first() else {
        return Ok((0, path));
    };
    segment
        .parse::<usize>()
        .map(|index| (index, rest))
        .map_err(|_| AccessError::InvalidIndex {
            segment: segment.to_string(),
            type_name: type_name.to_string(),
        })
}

fn not_found(segment: &str, kind: &'static str, type_name: String) -> AccessError {
    AccessError::SegmentNotFound {
        segment: segment.to_string(),
        kind,
        type_name,
    }
}
