use crate::instructions::Literal;
use serde::ser::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What constant propagation knows about one variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Known(Literal),
    Unknown,
}

impl ConstValue {
    pub fn is_unknown(&self) -> bool {
        matches!(self, ConstValue::Unknown)
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Known(lit) => write!(f, "{}", lit),
            ConstValue::Unknown => write!(f, "?"),
        }
    }
}

impl Serialize for ConstValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConstValue::Known(lit) => lit.serialize(serializer),
            ConstValue::Unknown => serializer.serialize_str("?"),
        }
    }
}

impl From<Literal> for ConstValue {
    fn from(lit: Literal) -> Self {
        ConstValue::Known(lit)
    }
}

/// Variable name to constant knowledge. Absent keys are "no information yet".
pub type ConstEnv = BTreeMap<String, ConstValue>;

/// A dataflow fact as handed to formatters: either a set of printable items or a constant map.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum LatticeValue {
    Set(BTreeSet<String>),
    Map(ConstEnv),
}

impl LatticeValue {
    pub fn is_empty(&self) -> bool {
        match self {
            LatticeValue::Set(set) => set.is_empty(),
            LatticeValue::Map(map) => map.is_empty(),
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            LatticeValue::Set(set) => Some(set),
            LatticeValue::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&ConstEnv> {
        match self {
            LatticeValue::Map(map) => Some(map),
            LatticeValue::Set(_) => None,
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        match self {
            LatticeValue::Set(set) => set.contains(item),
            LatticeValue::Map(map) => map.contains_key(item),
        }
    }
}

impl fmt::Display for LatticeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "∅");
        }
        match self {
            LatticeValue::Set(set) => {
                let items: Vec<&str> = set.iter().map(String::as_str).collect();
                write!(f, "{}", items.join(", "))
            }
            LatticeValue::Map(map) => {
                let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{}", pairs.join(", "))
            }
        }
    }
}

impl<T: fmt::Display> From<BTreeSet<T>> for LatticeValue {
    fn from(set: BTreeSet<T>) -> Self {
        LatticeValue::Set(set.iter().map(ToString::to_string).collect())
    }
}

impl From<ConstEnv> for LatticeValue {
    fn from(map: ConstEnv) -> Self {
        LatticeValue::Map(map)
    }
}

pub fn union<T: Ord + Clone>(values: &[&BTreeSet<T>]) -> BTreeSet<T> {
    let mut out = BTreeSet::new();
    for set in values {
        out.extend(set.iter().cloned());
    }
    out
}

/// Meet by intersection. With no inputs the result is the whole `universe`.
pub fn intersection<T: Ord + Clone>(
    universe: &BTreeSet<T>,
    values: &[&BTreeSet<T>],
) -> BTreeSet<T> {
    let mut out = universe.clone();
    for set in values {
        out.retain(|item| set.contains(item));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_union_and_intersection() {
        let a = set(&["x", "y"]);
        let b = set(&["y", "z"]);
        let universe = set(&["x", "y", "z", "w"]);

        assert_eq!(union(&[&a, &b]), set(&["x", "y", "z"]));
        assert_eq!(intersection(&universe, &[&a, &b]), set(&["y"]));
        assert_eq!(intersection(&universe, &[]), universe);
        assert!(union::<String>(&[]).is_empty());
    }

    #[test]
    fn test_display_matches_listing_format() {
        assert_eq!(LatticeValue::Set(BTreeSet::new()).to_string(), "∅");
        assert_eq!(LatticeValue::from(set(&["b", "a"])).to_string(), "a, b");

        let mut env = ConstEnv::new();
        env.insert("y".into(), ConstValue::Unknown);
        env.insert("x".into(), ConstValue::Known(Literal::Int(4)));
        assert_eq!(LatticeValue::from(env).to_string(), "x: 4, y: ?");
    }

    #[test]
    fn test_const_env_serializes_unknown_marker() {
        let mut env = ConstEnv::new();
        env.insert("a".into(), ConstValue::Known(Literal::Bool(true)));
        env.insert("b".into(), ConstValue::Unknown);

        let json = serde_json::to_string(&LatticeValue::Map(env)).unwrap();
        assert_eq!(json, r#"{"a":true,"b":"?"}"#);
    }
}
