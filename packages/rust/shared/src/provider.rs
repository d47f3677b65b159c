//! Typed views over provider configuration documents.
//!
//! Documents are owned by the document store. They are validated once, in
//! [`ProviderDefinition::from_document`], so that accessors never have to
//! re-check the shape of the stored JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{DcpError, Result};
use crate::util::is_blank;

/// Stored field holding the provider's unique name.
pub const FIELD_NAME: &str = "name";
/// Stored field holding the content type mapping.
pub const FIELD_TYPE: &str = "type";
/// Stored field (inside a type) holding the canonical type tag.
pub const FIELD_DCP_TYPE: &str = "dcp_type";

/// A JSON object flowing through the preprocessor pipeline.
pub type Content = Map<String, Value>;

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ---------------------------------------------------------------------------
// ProviderDefinition
// ---------------------------------------------------------------------------

/// Configuration of one content provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDefinition {
    /// Globally unique provider name.
    pub name: String,
    #[serde(rename = "pwd_hash", default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_provider: Option<bool>,
    /// Content types keyed by their system-wide unique id.
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub types: BTreeMap<String, TypeDefinition>,
}

impl ProviderDefinition {
    /// Validate a raw stored document and convert it to a typed definition.
    ///
    /// Any structural problem is a configuration-integrity error naming the provider.
    pub fn from_document(doc: &Value) -> Result<Self> {
        let Some(object) = doc.as_object() else {
            return Err(DcpError::integrity(
                "Provider configuration document is not a JSON object.",
            ));
        };

        let name = match object.get(FIELD_NAME) {
            Some(Value::String(name)) => name.clone(),
            _ => {
                return Err(DcpError::integrity(
                    "Provider configuration document has no valid 'name' field.",
                ));
            }
        };

        if let Some(types) = object.get(FIELD_TYPE) {
            if !types.is_null() && !types.is_object() {
                return Err(DcpError::integrity(format!(
                    "Incorrect configuration for provider '{name}': 'type' is not a mapping."
                )));
            }
        }

        let mut def: ProviderDefinition = serde_json::from_value(doc.clone()).map_err(|e| {
            DcpError::integrity(format!(
                "Incorrect configuration for provider '{name}': {e}."
            ))
        })?;

        for (id, type_def) in def.types.iter_mut() {
            type_def.id = id.clone();
        }

        Ok(def)
    }

    /// Whether this provider may act on behalf of others. Absent flag means `false`.
    pub fn is_super_provider(&self) -> bool {
        self.super_provider.unwrap_or(false)
    }

    /// Look up one of this provider's content types.
    pub fn content_type(&self, type_id: &str) -> Option<&TypeDefinition> {
        self.types.get(type_id)
    }
}

// ---------------------------------------------------------------------------
// TypeDefinition
// ---------------------------------------------------------------------------

/// Search index coordinates for one content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub index_type: String,
}

/// Configuration of one content type, nested inside its provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Content type id; filled from the key this definition is stored under.
    #[serde(skip)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcp_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexDefinition>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_preprocessors: Vec<PreprocessorSpec>,
}

impl TypeDefinition {
    /// Ordered preprocessor configurations.
    pub fn preprocessors(&self) -> &[PreprocessorSpec] {
        &self.input_preprocessors
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index.as_ref().map(|i| i.name.as_str())
    }

    pub fn index_type(&self) -> Option<&str> {
        self.index.as_ref().map(|i| i.index_type.as_str())
    }

    /// Canonical type tag. Must be present and non-blank.
    pub fn dcp_type(&self) -> Result<&str> {
        match self.dcp_type.as_deref() {
            Some(value) if !is_blank(Some(value)) => Ok(value),
            _ => {
                tracing::error!(type_id = %self.id, "dcp_type missing or blank");
                Err(DcpError::integrity(format!(
                    "dcp_type is not defined correctly for dcp_provider_type={}.",
                    self.id
                )))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PreprocessorSpec
// ---------------------------------------------------------------------------

/// Opaque configuration of one preprocessor, interpreted by a preprocessor factory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreprocessorSpec(pub Map<String, Value>);

impl PreprocessorSpec {
    /// Human-readable preprocessor name, if configured.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Implementation selector used by the factory.
    pub fn class(&self) -> Option<&str> {
        self.0.get("class").and_then(Value::as_str)
    }

    /// Implementation-specific settings block.
    pub fn settings(&self) -> Option<&Value> {
        self.0.get("settings")
    }
}
