//! Identifier management using string interning for efficient storage and comparison
//!
//! This module provides the [`Id`] type used for part nodes, edges and connectors.
//! Identifiers compare by symbol for equality and by their textual value for
//! ordering, so sorting a set of ids is deterministic across runs.

use std::{
    cmp::Ordering,
    fmt,
    sync::{Mutex, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

/// Prefix of every synthetic connector identifier.
pub const CONNECTOR_PREFIX: &str = "connector::";

/// Separator used when joining member ids into a group id.
pub const GROUP_SEPARATOR: &str = "+";

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock");
    f(&mut interner)
}

/// Interned identifier
///
/// # Examples
///
/// ```
/// use stitchflow_core::identifier::Id;
///
/// let a = Id::new("part-1");
/// let b = Id::new("part-2");
///
/// let group = Id::join([b, a], "+");
/// assert_eq!(group, "part-1+part-2");
///
/// let connector = Id::connector_for(group);
/// assert_eq!(connector, "connector::part-1+part-2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    ///
    /// # Arguments
    ///
    /// * `name` - The string representation of the identifier
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Creates an identifier of the form `{prefix}-{idx}`.
    ///
    /// Used for ids generated by the engine when the caller does not supply one.
    pub fn from_sequence(prefix: &str, idx: usize) -> Self {
        Self::new(&format!("{prefix}-{idx}"))
    }

    /// Joins identifiers sorted by their textual value with `separator`.
    ///
    /// The result only depends on the set of ids, never on the order they
    /// were supplied in.
    pub fn join(ids: impl IntoIterator<Item = Id>, separator: &str) -> Self {
        let mut names: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
        names.sort();
        names.dedup();
        Self::new(&names.join(separator))
    }

    /// Returns the connector identifier representing `group_id`.
    pub fn connector_for(group_id: Id) -> Self {
        Self::new(&format!("{CONNECTOR_PREFIX}{group_id}"))
    }

    /// Returns a variant of this identifier with a numeric `~n` suffix.
    pub fn with_suffix(&self, n: usize) -> Self {
        Self::new(&format!("{self}~{n}"))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str_value = with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("Symbol should exist in interner")
                .to_owned()
        });
        f.write_str(&str_value)
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        with_interner(|interner| {
            let lhs = interner.resolve(self.0).expect("Symbol should exist in interner");
            let rhs = interner.resolve(other.0).expect("Symbol should exist in interner");
            lhs.cmp(rhs)
        })
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| interner.resolve(self.0) == Some(other))
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_new() {
        let id1 = Id::new("sleeve");
        let id2 = Id::new("sleeve");
        let id3 = Id::new("collar");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "sleeve");
    }

    #[test]
    fn test_from_sequence() {
        assert_eq!(Id::from_sequence("part", 3), "part-3");
        assert_eq!(Id::from_sequence("edge", 0), Id::new("edge-0"));
    }

    #[test]
    fn test_join_is_order_independent() {
        let a = Id::new("a");
        let b = Id::new("b");
        let c = Id::new("c");

        let first = Id::join([c, a, b], GROUP_SEPARATOR);
        let second = Id::join([b, c, a], GROUP_SEPARATOR);

        assert_eq!(first, second);
        assert_eq!(first, "a+b+c");
    }

    #[test]
    fn test_join_deduplicates() {
        let a = Id::new("a");
        assert_eq!(Id::join([a, a], GROUP_SEPARATOR), "a");
    }

    #[test]
    fn test_connector_for() {
        let group = Id::new("x+y");
        assert_eq!(Id::connector_for(group), "connector::x+y");
    }

    #[test]
    fn test_with_suffix() {
        let id = Id::new("connector::x+y");
        assert_eq!(id.with_suffix(2), "connector::x+y~2");
    }

    #[test]
    fn test_ordering_uses_text() {
        // Interned in reverse alphabetical order on purpose
        let z = Id::new("zz-order");
        let a = Id::new("aa-order");

        let mut ids = vec![z, a];
        ids.sort();
        assert_eq!(ids, vec![a, z]);
        assert_eq!(a.cmp(&a), Ordering::Equal);
    }

    #[test]
    fn test_display_trait() {
        let id = Id::new("front_panel");
        assert_eq!(format!("{id}"), "front_panel");
    }

    #[test]
    fn test_hash_and_eq() {
        let mut set = HashSet::new();
        set.insert(Id::new("hem"));
        set.insert(Id::new("hem"));
        set.insert(Id::new("cuff"));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_serde_round_trip() {
        let id = Id::new("pocket");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"pocket\"");

        let back: Id = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
