//! Key groups.

use std::borrow::Cow;
use std::fmt;

/// A named partition of an entity type's fields, projected together by keyify.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Group(Cow<'static, str>);

impl Group {
    /// The primary-key group.
    pub const PRIMARY: Group = Group(Cow::Borrowed("primary"));

    /// The secondary (natural) key group.
    pub const SECONDARY: Group = Group(Cow::Borrowed("secondary"));

    /// Create a group with an arbitrary name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Group(name.into())
    }

    /// Group name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Group {
    fn default() -> Self {
        Group::PRIMARY
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Group {
    fn from(name: &'static str) -> Self {
        Group(Cow::Borrowed(name))
    }
}

impl From<String> for Group {
    fn from(name: String) -> Self {
        Group(Cow::Owned(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_named_groups_match_constants() {
        assert_eq!(Group::from("primary"), Group::PRIMARY);
        assert_eq!(Group::new(String::from("secondary")), Group::SECONDARY);
        assert_ne!(Group::PRIMARY, Group::SECONDARY);
    }

    #[test]
    fn test_group_as_map_key() {
        let mut groups = HashMap::new();
        groups.insert(Group::PRIMARY, 1);
        groups.insert(Group::new("audit"), 2);

        assert_eq!(groups.get(&Group::from(String::from("primary"))), Some(&1));
        assert_eq!(groups.get(&Group::from("audit")), Some(&2));
        assert_eq!(Group::default().to_string(), "primary");
    }
}
