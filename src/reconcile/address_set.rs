//! Deduplicated set of IP address strings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A set of IP addresses, compared by their textual form.
///
/// Iteration order is lexicographic, which keeps target lists and logs
/// stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressSet(BTreeSet<String>);

impl AddressSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: impl Into<String>) -> bool {
        self.0.insert(address.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Addresses in `self` but not in `other`.
    pub fn difference(&self, other: &AddressSet) -> AddressSet {
        AddressSet(self.0.difference(&other.0).cloned().collect())
    }

    /// Addresses in either set.
    pub fn union(&self, other: &AddressSet) -> AddressSet {
        AddressSet(self.0.union(&other.0).cloned().collect())
    }

    /// Addresses in both sets.
    pub fn intersection(&self, other: &AddressSet) -> AddressSet {
        AddressSet(self.0.intersection(&other.0).cloned().collect())
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for AddressSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        AddressSet(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for AddressSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for AddressSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AddressSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, address) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", address)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_algebra() {
        let a: AddressSet = ["1.1.1.1", "2.2.2.2", "3.3.3.3"].into_iter().collect();
        let b: AddressSet = ["1.1.1.1", "5.5.5.5"].into_iter().collect();

        assert_eq!(
            a.difference(&b),
            ["2.2.2.2", "3.3.3.3"].into_iter().collect::<AddressSet>()
        );
        assert_eq!(a.intersection(&b).into_vec(), vec!["1.1.1.1"]);
        assert_eq!(a.union(&b).len(), 4);
    }

    #[test]
    fn test_deduplicates() {
        let set: AddressSet = ["10.0.0.2", "10.0.0.1", "10.0.0.2"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "{10.0.0.1, 10.0.0.2}");
    }

    #[test]
    fn test_serializes_as_list() {
        let set: AddressSet = ["10.0.0.2", "10.0.0.1"].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"["10.0.0.1","10.0.0.2"]"#
        );
    }
}
