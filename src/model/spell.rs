use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// A catalog entry. Identity is the (normalized name, system) pair; the name
/// is held in normalized (lowercase) form for the whole of the spell's
/// lifetime inside the service and only title-cased at the wire boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Spell {
    pub name: String,
    pub description: String,
    pub attributes: HashMap<String, Value>,
    pub metadata: SpellMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpellMetadata {
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub creator: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("missing required field: {0}")]
pub struct MissingField(pub &'static str);

/// Lowercase a spell name for identity comparison and storage.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// Title-case a spell name for client-facing rendering. Any non-letter,
/// apostrophes included, starts a new word. Presentation only; never feed
/// the result into an identity comparison or a store write.
pub fn display_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_is_letter = false;
    for c in name.chars() {
        if c.is_alphabetic() && !prev_is_letter {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev_is_letter = c.is_alphabetic();
    }
    out
}

impl Spell {
    /// Check required fields in order name -> description -> system. The
    /// first violation wins; aggregating across inputs is the batch
    /// coordinator's job, per item.
    pub fn validate(&self) -> Result<(), MissingField> {
        if self.name.is_empty() {
            Err(MissingField("name"))
        } else if self.description.is_empty() {
            Err(MissingField("description"))
        } else if self.metadata.system.is_empty() {
            Err(MissingField("system"))
        } else {
            Ok(())
        }
    }

    /// Storage representation: normalized name, creator preserved.
    pub fn to_document(&self) -> Value {
        let mut metadata = serde_json::Map::new();
        metadata.insert(
            "system".to_string(),
            Value::String(self.metadata.system.clone()),
        );
        if let Some(creator) = &self.metadata.creator {
            metadata.insert("creator".to_string(), Value::String(creator.clone()));
        }
        serde_json::json!({
            "name": normalize_name(&self.name),
            "description": self.description,
            "attributes": self.attributes,
            "metadata": metadata,
        })
    }

    pub fn from_document(doc: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc)
    }
}

// Missing fields decode to their empty values so that validation (not the
// JSON layer) reports them, and in its fixed order.
impl<'de> Deserialize<'de> for Spell {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            name: String,
            #[serde(default)]
            description: String,
            #[serde(default)]
            attributes: HashMap<String, Value>,
            #[serde(default)]
            metadata: SpellMetadata,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(Spell {
            name: normalize_name(&raw.name),
            description: raw.description,
            attributes: raw.attributes,
            metadata: raw.metadata,
        })
    }
}

// Wire representation: title-cased name, creator omitted even when present.
impl Serialize for Spell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct WireMetadata<'a> {
            system: &'a str,
        }

        let mut state = serializer.serialize_struct("Spell", 4)?;
        state.serialize_field("name", &display_name(&self.name))?;
        state.serialize_field("description", &self.description)?;
        if self.attributes.is_empty() {
            state.skip_field("attributes")?;
        } else {
            state.serialize_field("attributes", &self.attributes)?;
        }
        state.serialize_field(
            "metadata",
            &WireMetadata {
                system: &self.metadata.system,
            },
        )?;
        state.end()
    }
}
