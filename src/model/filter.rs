use crate::model::spell::normalize_name;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub const NAME_FIELD: &str = "name";
pub const SYSTEM_FIELD: &str = "metadata.system";
pub const SYSTEM_PARAM: &str = "system";

pub fn attribute_field(key: &str) -> String {
    format!("attributes.{}", key)
}

/// A single constraint on one field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// Stored value must equal this value.
    Equals(Value),
    /// Stored value must be a member of this set; stored lists match when
    /// they intersect it.
    MemberOf(Vec<Value>),
}

/// A store-agnostic conjunction of constraints keyed by field path
/// (`name`, `metadata.system`, `attributes.<key>`). Built fresh per request
/// from untyped query parameters, never persisted. An empty filter matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpellFilter {
    constraints: BTreeMap<String, Constraint>,
}

impl SpellFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile an optional identity name plus raw query parameter pairs into
    /// a filter. Multi-valued parameters are legal: `system` is single-valued
    /// by contract (first value wins), every other key becomes a
    /// set-membership constraint on the corresponding attribute against all
    /// of its values.
    pub fn compile(name: Option<&str>, params: &[(String, String)]) -> Self {
        let mut filter = Self::new();

        if let Some(name) = name {
            filter = filter.equals(NAME_FIELD, Value::String(normalize_name(name)));
        }

        for (key, value) in params {
            if key == SYSTEM_PARAM {
                // Single-valued by contract: the first supplied value wins.
                filter
                    .constraints
                    .entry(SYSTEM_FIELD.to_string())
                    .or_insert_with(|| Constraint::Equals(Value::String(value.clone())));
                continue;
            }

            match filter.constraints.entry(attribute_field(key)) {
                Entry::Occupied(mut entry) => {
                    if let Constraint::MemberOf(values) = entry.get_mut() {
                        values.push(Value::String(value.clone()));
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(Constraint::MemberOf(vec![Value::String(value.clone())]));
                }
            }
        }

        filter
    }

    pub fn equals(mut self, path: &str, value: Value) -> Self {
        self.constraints
            .insert(path.to_string(), Constraint::Equals(value));
        self
    }

    pub fn member_of(mut self, path: &str, values: Vec<Value>) -> Self {
        self.constraints
            .insert(path.to_string(), Constraint::MemberOf(values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn constraints(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.constraints.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Evaluate this filter against a raw stored document. This is the
    /// reference semantics for every store backend; MemoryStore uses it
    /// directly.
    pub fn matches(&self, doc: &Value) -> bool {
        self.constraints.iter().all(|(path, constraint)| {
            let stored = match lookup_path(doc, path) {
                Some(v) => v,
                None => return false,
            };
            match constraint {
                Constraint::Equals(value) => value_text(stored) == value_text(value),
                Constraint::MemberOf(values) => member_match(stored, values),
            }
        })
    }
}

/// Walk a dotted field path through nested JSON objects.
pub fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Canonical string form of a stored value: strings unquoted, everything
/// else rendered as JSON. Query parameter values arrive as strings, so
/// matching and distinct-value reporting both compare in this form.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn member_match(stored: &Value, supplied: &[Value]) -> bool {
    let supplied: Vec<String> = supplied.iter().map(value_text).collect();
    match stored {
        Value::Array(items) => items.iter().any(|v| supplied.contains(&value_text(v))),
        scalar => supplied.contains(&value_text(scalar)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_input_compiles_to_match_everything() {
        let filter = SpellFilter::compile(None, &[]);
        assert!(filter.is_empty());
        assert!(filter.matches(&json!({"name": "anything"})));
    }

    #[test]
    fn name_is_normalized_into_an_equality_constraint() {
        let filter = SpellFilter::compile(Some("FireBall"), &[]);
        assert!(filter.matches(&json!({"name": "fireball"})));
        assert!(!filter.matches(&json!({"name": "frostbolt"})));
    }

    #[test]
    fn system_takes_only_the_first_value() {
        let filter =
            SpellFilter::compile(None, &params(&[("system", "D&D"), ("system", "Pathfinder")]));
        assert!(filter.matches(&json!({"metadata": {"system": "D&D"}})));
        assert!(!filter.matches(&json!({"metadata": {"system": "Pathfinder"}})));
    }

    #[test]
    fn other_keys_collect_all_values_into_membership() {
        let filter =
            SpellFilter::compile(None, &params(&[("school", "evocation"), ("school", "fire")]));
        assert!(filter.matches(&json!({"attributes": {"school": "fire"}})));
        assert!(filter.matches(&json!({"attributes": {"school": "evocation"}})));
        assert!(!filter.matches(&json!({"attributes": {"school": "abjuration"}})));
    }

    #[test]
    fn stored_lists_match_on_intersection() {
        let filter = SpellFilter::compile(None, &params(&[("class", "wizard")]));
        assert!(filter.matches(&json!({"attributes": {"class": ["sorcerer", "wizard"]}})));
        assert!(!filter.matches(&json!({"attributes": {"class": ["cleric"]}})));
    }

    #[test]
    fn numeric_attributes_match_their_text_form() {
        let filter = SpellFilter::compile(None, &params(&[("level", "3")]));
        assert!(filter.matches(&json!({"attributes": {"level": 3}})));
        assert!(!filter.matches(&json!({"attributes": {"level": 4}})));
    }

    #[test]
    fn constraints_are_a_conjunction() {
        let filter = SpellFilter::compile(Some("fireball"), &params(&[("system", "D&D")]));
        assert!(filter.matches(&json!({"name": "fireball", "metadata": {"system": "D&D"}})));
        assert!(!filter.matches(&json!({"name": "fireball", "metadata": {"system": "Pathfinder"}})));
    }

    #[test]
    fn key_order_does_not_change_semantics() {
        let a = SpellFilter::compile(None, &params(&[("system", "D&D"), ("level", "3")]));
        let b = SpellFilter::compile(None, &params(&[("level", "3"), ("system", "D&D")]));
        assert_eq!(a, b);
    }

    #[test]
    fn missing_field_never_matches_a_constraint() {
        let filter = SpellFilter::compile(None, &params(&[("school", "fire")]));
        assert!(!filter.matches(&json!({"name": "fireball"})));
    }
}
