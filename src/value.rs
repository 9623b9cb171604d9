//! Host value model.
//!
//! Host objects are exposed to scripts through [`Slot`], a closed set of
//! kinds the accessor knows how to walk. Hosts map their own types onto it by
//! implementing [`Access`] (and [`Record`] for struct-like types); the
//! standard containers below are mapped here once.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::AccessError;

/// A mutable view of one host value, tagged by kind.
pub enum Slot<'a> {
    Str(&'a mut String),
    Int(&'a mut i64),
    Bool(&'a mut bool),
    Bytes(&'a mut Vec<u8>),
    Record(&'a mut dyn Record),
    Keyed(&'a mut dyn Keyed),
    Indexed(&'a mut dyn Indexed),
    Optional(&'a mut dyn Optional),
}

impl Slot<'_> {
    /// Human-readable kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Slot::Str(_) => "string",
            Slot::Int(_) => "integer",
            Slot::Bool(_) => "boolean",
            Slot::Bytes(_) => "bytes",
            Slot::Record(_) => "record",
            Slot::Keyed(_) => "keyed container",
            Slot::Indexed(_) => "indexed container",
            Slot::Optional(_) => "optional",
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Slot::Record(r) => r.type_name(),
            Slot::Keyed(k) => k.type_name(),
            Slot::Indexed(i) => i.type_name(),
            Slot::Optional(o) => o.type_name(),
            scalar => scalar.kind().to_string(),
        }
    }
}

/// A host value that can be addressed from a script.
pub trait Access {
    fn slot(&mut self) -> Slot<'_>;

    /// The empty instance used when an absent optional is written through.
    /// Types that return `None` cannot be materialized.
    fn empty() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

/// A struct-like value with named fields.
pub trait Record {
    fn type_name(&self) -> String {
        short_type_name::<Self>()
    }

    /// Declared field names; matched case-insensitively by the accessor.
    fn field_names(&self) -> &'static [&'static str];

    /// The field with exactly this declared name.
    fn field(&mut self, name: &str) -> Option<Slot<'_>>;
}

/// A map-like value with string keys.
pub trait Keyed {
    fn type_name(&self) -> String {
        short_type_name::<Self>()
    }

    fn keys(&self) -> Vec<String>;

    /// The entry stored under exactly this key.
    fn entry(&mut self, key: &str) -> Option<Slot<'_>>;

    /// Create a new entry from a script string.
    fn insert(&mut self, key: &str, value: &str) -> Result<(), AccessError>;

    fn remove(&mut self, key: &str) -> bool;

    fn clear(&mut self);
}

/// A slice-like value addressed by position.
pub trait Indexed {
    fn type_name(&self) -> String {
        short_type_name::<Self>()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element(&mut self, index: usize) -> Option<Slot<'_>>;
}

/// A nullable reference to another value.
pub trait Optional {
    fn type_name(&self) -> String {
        short_type_name::<Self>()
    }

    fn get(&mut self) -> Option<Slot<'_>>;

    /// The inner value, creating an empty one first if absent.
    fn materialize(&mut self) -> Result<Slot<'_>, AccessError>;

    /// Drop the inner value.
    fn reset(&mut self);
}

/// Builds a new keyed-container entry from the string a script assigns.
pub trait FromScript: Sized {
    fn from_script(value: &str) -> Result<Self, AccessError>;
}

/// The result of reading a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Bytes(Vec<u8>),
    /// A path that stopped at a record or keyed container.
    Composite {
        kind: &'static str,
        type_name: String,
    },
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Value::Composite { kind, type_name } => write!(f, "[{kind} {type_name}]"),
        }
    }
}

// ── Scalars ─────────────────────────────────────────────────────────

impl Access for String {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Str(self)
    }
}

impl Access for i64 {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Int(self)
    }
}

impl Access for bool {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Bool(self)
    }
}

impl FromScript for String {
    fn from_script(value: &str) -> Result<Self, AccessError> {
        Ok(value.to_string())
    }
}

impl FromScript for i64 {
    fn from_script(value: &str) -> Result<Self, AccessError> {
        parse_int(value)
    }
}

impl FromScript for bool {
    fn from_script(value: &str) -> Result<Self, AccessError> {
        Ok(parse_bool(value))
    }
}

/// Multi-valued attributes (headers) start as a one-element sequence.
impl FromScript for Vec<String> {
    fn from_script(value: &str) -> Result<Self, AccessError> {
        Ok(vec![value.to_string()])
    }
}

pub(crate) fn parse_int(value: &str) -> Result<i64, AccessError> {
    value.parse::<i64>().map_err(|e| AccessError::Coercion {
        value: value.to_string(),
        target: "integer",
        reason: e.to_string(),
    })
}

pub(crate) fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

// ── Sequences ───────────────────────────────────────────────────────

impl<T: Access> Access for Vec<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Indexed(self)
    }

    /// An absent sequence materializes with one empty element so index 0 is
    /// addressable.
    fn empty() -> Option<Self> {
        T::empty().map(|element| vec![element])
    }
}

impl<T: Access> Indexed for Vec<T> {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn element(&mut self, index: usize) -> Option<Slot<'_>> {
        self.get_mut(index).map(Access::slot)
    }
}

// ── Optionals ───────────────────────────────────────────────────────

impl<T: Access> Access for Option<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Optional(self)
    }
}

impl<T: Access> Optional for Option<T> {
    fn get(&mut self) -> Option<Slot<'_>> {
        self.as_mut().map(Access::slot)
    }

    fn materialize(&mut self) -> Result<Slot<'_>, AccessError> {
        if self.is_none() {
            let fresh = T::empty().ok_or_else(|| AccessError::Construct(short_type_name::<T>()))?;
            *self = Some(fresh);
        }
        self.as_mut()
            .map(Access::slot)
            .ok_or_else(|| AccessError::Construct(short_type_name::<T>()))
    }

    fn reset(&mut self) {
        *self = None;
    }
}

// ── Keyed containers ────────────────────────────────────────────────

macro_rules! keyed_container {
    ($map:ident) => {
        impl<V: Access + FromScript> Access for $map<String, V> {
            fn slot(&mut self) -> Slot<'_> {
                Slot::Keyed(self)
            }

            fn empty() -> Option<Self> {
                Some($map::new())
            }
        }

        impl<V: Access + FromScript> Keyed for $map<String, V> {
            fn keys(&self) -> Vec<String> {
                $map::keys(self).cloned().collect()
            }

            fn entry(&mut self, key: &str) -> Option<Slot<'_>> {
                self.get_mut(key).map(Access::slot)
            }

            fn insert(&mut self, key: &str, value: &str) -> Result<(), AccessError> {
                $map::insert(self, key.to_string(), V::from_script(value)?);
                Ok(())
            }

            fn remove(&mut self, key: &str) -> bool {
                $map::remove(self, key).is_some()
            }

            fn clear(&mut self) {
                $map::clear(self);
            }
        }
    };
}

keyed_container!(BTreeMap);
keyed_container!(HashMap);

/// `std::any::type_name` without module paths:
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        match ch {
            ':' => segment.clear(),
            '<' | '>' | ',' | ' ' | '&' | '[' | ']' | ';' | '(' | ')' => {
                out.push_str(&segment);
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(&segment);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_names_drop_module_paths() {
        assert_eq!(
            short_type_name::<BTreeMap<String, Vec<String>>>(),
            "BTreeMap<String, Vec<String>>"
        );
        assert_eq!(short_type_name::<Option<i64>>(), "Option<i64>");
    }

    #[test]
    fn header_entries_start_with_one_value() {
        let mut header: BTreeMap<String, Vec<String>> = BTreeMap::new();
        Keyed::insert(&mut header, "Server", "nginx").unwrap();
        assert_eq!(header["Server"], vec!["nginx".to_string()]);
    }

    #[test]
    fn scalar_option_cannot_materialize() {
        let mut absent: Option<String> = None;
        let err = absent.materialize().err().unwrap();
        assert_eq!(err, AccessError::Construct("String".to_string()));
        assert!(absent.is_none());
    }

    #[test]
    fn map_option_materializes_empty() {
        let mut absent: Option<BTreeMap<String, String>> = None;
        assert!(matches!(absent.materialize(), Ok(Slot::Keyed(_))));
        assert_eq!(absent, Some(BTreeMap::new()));
    }

    #[test]
    fn bytes_display_lossily() {
        assert_eq!(Value::Bytes(b"aa:bb".to_vec()).to_string(), "aa:bb");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
