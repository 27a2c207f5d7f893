//! Tag maps for nodes and edges
//!
//! A tag is a key with an optional string value. Keys compare
//! case-insensitively and a map always iterates (and serializes) in key order,
//! so `t2=v2,t1` and `t1,t2=v2` describe the same map and both render as
//! `t1,t2=v2`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Case-insensitive tag key that remembers its original spelling
#[derive(Debug, Clone)]
pub struct TagKey(String);

impl TagKey {
    pub fn new(key: impl Into<String>) -> Self {
        TagKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn folded(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars().flat_map(char::to_lowercase)
    }
}

impl PartialEq for TagKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TagKey {}

impl PartialOrd for TagKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TagKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(other.folded())
    }
}

impl Hash for TagKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.folded() {
            c.hash(state);
        }
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TagKey {
    fn from(s: &str) -> Self {
        TagKey(s.to_string())
    }
}

impl From<String> for TagKey {
    fn from(s: String) -> Self {
        TagKey(s)
    }
}

impl Serialize for TagKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TagKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(TagKey)
    }
}

/// One entry of a `set` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagCommand {
    /// `key=value` or bare `key` (null value)
    Set { key: TagKey, value: Option<String> },
    /// `-key`
    Remove { key: TagKey },
}

impl TagCommand {
    pub fn set(key: impl Into<TagKey>, value: Option<&str>) -> Self {
        TagCommand::Set {
            key: key.into(),
            value: value.map(str::to_string),
        }
    }

    pub fn remove(key: impl Into<TagKey>) -> Self {
        TagCommand::Remove { key: key.into() }
    }

    pub fn key(&self) -> &TagKey {
        match self {
            TagCommand::Set { key, .. } | TagCommand::Remove { key } => key,
        }
    }

    /// Parse a comma separated command list such as `t1,t2=v2,-t3`
    pub fn parse_list(input: &str) -> Vec<TagCommand> {
        input
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .filter_map(|token| token.parse().ok())
            .collect()
    }
}

impl FromStr for TagCommand {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        if let Some(key) = token.strip_prefix('-') {
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("empty tag key in '{}'", token));
            }
            return Ok(TagCommand::remove(key));
        }

        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key.trim(), Some(value.trim())),
            None => (token, None),
        };
        if key.is_empty() {
            return Err(format!("empty tag key in '{}'", token));
        }
        Ok(TagCommand::set(key, value))
    }
}

impl fmt::Display for TagCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagCommand::Set { key, value: Some(v) } => write!(f, "{}={}", key, v),
            TagCommand::Set { key, value: None } => write!(f, "{}", key),
            TagCommand::Remove { key } => write!(f, "-{}", key),
        }
    }
}

/// Ordered, case-insensitive tag map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    entries: BTreeMap<TagKey, Option<String>>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tag map from a canonical string such as `t1,t2=v2`
    pub fn parse(input: &str) -> Self {
        Tags::new().apply(&TagCommand::parse_list(input))
    }

    /// Insert or overwrite a tag. An existing key keeps its original casing.
    pub fn set(&mut self, key: impl Into<TagKey>, value: Option<String>) -> Option<Option<String>> {
        self.entries.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Option<String>> {
        self.entries.remove(&TagKey::from(key))
    }

    /// `None` when absent, `Some(None)` when present without a value
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries.get(&TagKey::from(key)).map(|v| v.as_deref())
    }

    pub fn get_by_key(&self, key: &TagKey) -> Option<Option<&str>> {
        self.entries.get(key).map(|v| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&TagKey::from(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TagKey, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k, v.as_deref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &TagKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a `set` clause and return the resulting map.
    ///
    /// Sets are applied first and removals last, so `-k` wins over `k=v`
    /// inside the same clause.
    pub fn apply(&self, commands: &[TagCommand]) -> Tags {
        let mut result = self.clone();
        for command in commands {
            if let TagCommand::Set { key, value } = command {
                result.entries.insert(key.clone(), value.clone());
            }
        }
        for command in commands {
            if let TagCommand::Remove { key } = command {
                result.entries.remove(key);
            }
        }
        result
    }

    /// Keys whose presence or value differs between `self` (old) and `new`.
    /// Returns `(removed, added)`: a changed value appears in both lists.
    pub fn diff<'a>(&'a self, new: &'a Tags) -> (Vec<&'a TagKey>, Vec<&'a TagKey>) {
        let removed = self
            .entries
            .iter()
            .filter(|(k, v)| new.entries.get(*k) != Some(*v))
            .map(|(k, _)| k)
            .collect();
        let added = new
            .entries
            .iter()
            .filter(|(k, v)| self.entries.get(*k) != Some(*v))
            .map(|(k, _)| k)
            .collect();
        (removed, added)
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match value {
                Some(v) => write!(f, "{}={}", key, v)?,
                None => write!(f, "{}", key)?,
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, Option<String>)> for Tags {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for (key, value) in iter {
            tags.set(key, value);
        }
        tags
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| Tags::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_key_case_insensitive() {
        assert_eq!(TagKey::from("Email"), TagKey::from("email"));
        assert!(TagKey::from("a") < TagKey::from("B"));

        let mut tags = Tags::new();
        tags.set("Email", Some("x".to_string()));
        tags.set("EMAIL", Some("y".to_string()));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("email"), Some(Some("y")));
        assert_eq!(tags.to_string(), "Email=y");
    }

    #[test]
    fn test_stringify_is_sorted() {
        let tags = Tags::parse("t2=v2,t1");
        assert_eq!(tags.to_string(), "t1,t2=v2");

        let again = Tags::parse(&tags.to_string());
        assert_eq!(again, tags);
        assert_eq!(again.to_string(), "t1,t2=v2");
    }

    #[test]
    fn test_parse_commands() {
        let commands = TagCommand::parse_list("a=1, b ,-c");
        assert_eq!(
            commands,
            vec![
                TagCommand::set("a", Some("1")),
                TagCommand::set("b", None),
                TagCommand::remove("c"),
            ]
        );
        assert!("-".parse::<TagCommand>().is_err());
        assert!("=v".parse::<TagCommand>().is_err());
    }

    #[test]
    fn test_value_may_contain_equals() {
        let command: TagCommand = "q=a=b".parse().unwrap();
        assert_eq!(command, TagCommand::set("q", Some("a=b")));
    }

    #[test]
    fn test_removal_wins_within_one_clause() {
        let tags = Tags::parse("keep=1");
        let result = tags.apply(&[
            TagCommand::remove("x"),
            TagCommand::set("x", Some("2")),
            TagCommand::remove("missing"),
        ]);
        assert_eq!(result.to_string(), "keep=1");
    }

    #[test]
    fn test_diff() {
        let old = Tags::parse("a=1,b=2,c");
        let new = Tags::parse("a=1,b=3,d");
        let (removed, added) = old.diff(&new);
        let removed: Vec<&str> = removed.iter().map(|k| k.as_str()).collect();
        let added: Vec<&str> = added.iter().map(|k| k.as_str()).collect();
        assert_eq!(removed, vec!["b", "c"]);
        assert_eq!(added, vec!["b", "d"]);
    }

    #[test]
    fn test_serde_as_string() {
        let tags = Tags::parse("t1,t2=v2");
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, "\"t1,t2=v2\"");
        let back: Tags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tags);
    }
}
