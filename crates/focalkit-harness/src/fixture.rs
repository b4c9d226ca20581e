//! Fixture construction and literal case tables.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// All-default value: null pointers, zero integers, empty collections.
#[must_use]
pub fn zeroed<T: Default>() -> T {
    T::default()
}

/// Builds a fixture by applying field setters to a zeroed value, in order.
#[derive(Debug, Clone)]
pub struct FixtureBuilder<T> {
    value: T,
    applied: usize,
}

impl<T: Default> FixtureBuilder<T> {
    #[must_use]
    pub fn zeroed() -> Self {
        Self::from_value(T::default())
    }
}

impl<T> FixtureBuilder<T> {
    #[must_use]
    pub fn from_value(value: T) -> Self {
        Self { value, applied: 0 }
    }

    /// Set the fields the focal path reads.
    #[must_use]
    pub fn set(mut self, setter: impl FnOnce(&mut T)) -> Self {
        setter(&mut self.value);
        self.applied += 1;
        self
    }

    /// Number of setters applied so far.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.applied
    }

    #[must_use]
    pub fn build(self) -> T {
        self.value
    }
}

/// One literal input/expected pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralCase<I, E> {
    pub name: String,
    pub input: I,
    pub expected: E,
}

/// Literal cases for one focal function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralSet<I, E> {
    /// Focal function name.
    pub focal: String,
    pub cases: Vec<LiteralCase<I, E>>,
}

impl<I: DeserializeOwned, E: DeserializeOwned> LiteralSet<I, E> {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a table from a JSON file on disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Pager {
        cache_size: i32,
        page_size: u32,
        name: Option<String>,
    }

    #[test]
    fn zeroed_is_default() {
        assert_eq!(zeroed::<Pager>(), Pager::default());
    }

    #[test]
    fn builder_applies_setters_in_order() {
        let builder = FixtureBuilder::<Pager>::zeroed()
            .set(|p| p.cache_size = 10)
            .set(|p| p.cache_size *= 2)
            .set(|p| p.page_size = 4096);
        assert_eq!(builder.applied(), 3);
        let pager = builder.build();
        assert_eq!(pager.cache_size, 20);
        assert_eq!(pager.page_size, 4096);
        assert!(pager.name.is_none());
    }

    #[test]
    fn literal_sets_load_from_json() {
        let json = r#"{
            "focal": "abs",
            "cases": [
                {"name": "neg", "input": -3, "expected": 3},
                {"name": "zero", "input": 0, "expected": 0}
            ]
        }"#;
        let set: LiteralSet<i32, i32> = LiteralSet::from_json(json).unwrap();
        assert_eq!(set.focal, "abs");
        assert_eq!(set.cases.len(), 2);
        assert_eq!(set.cases[0].input, -3);
        assert!(LiteralSet::<i32, i32>::from_json("{").is_err());
    }

    #[test]
    fn literal_sets_load_from_a_file() {
        let json = br#"{"focal": "strlen", "cases": [{"name": "empty", "input": "", "expected": 0}]}"#;
        let file = crate::ScratchFile::with_contents("literals-", json).unwrap();
        let set: LiteralSet<String, usize> = LiteralSet::from_file(file.path()).unwrap();
        assert_eq!(set.focal, "strlen");
        assert_eq!(set.cases[0].name, "empty");
        assert_eq!(set.cases[0].expected, 0);

        let missing = file.path().with_extension("absent");
        assert!(matches!(
            LiteralSet::<String, usize>::from_file(&missing),
            Err(crate::HarnessError::Io(_))
        ));
    }
}
