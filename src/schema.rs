//! Attestation schema parsing and data encoding
//!
//! A schema is declared with a human-readable signature such as
//! `"bool isHuman"` or `"uint256 score, address verifier, bool passed"`.
//! Attestation data is the ABI encoding of the field values as a parameter
//! list, which is the layout the registry and its indexers decode.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Bytes;

use crate::error::{AttestError, Result};

/// One named, typed entry of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    /// Type as written in the signature (after alias resolution)
    pub type_name: String,
    pub sol_type: DynSolType,
}

/// A value to encode, addressed by schema name and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaItem {
    pub name: String,
    pub type_name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct SchemaEncoder {
    signature: String,
    fields: Vec<SchemaField>,
}

impl SchemaEncoder {
    pub fn new(signature: &str) -> Result<Self> {
        let entries = split_top_level(signature);
        if entries.iter().all(|entry| entry.is_empty()) {
            return Err(AttestError::Encoding("Schema signature is empty".to_string()));
        }

        let fields = entries
            .into_iter()
            .map(parse_field)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            signature: signature.trim().to_string(),
            fields,
        })
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Pair raw string values positionally with the schema fields.
    pub fn items<S: AsRef<str>>(&self, values: &[S]) -> Vec<SchemaItem> {
        self.fields
            .iter()
            .zip(values)
            .map(|(field, value)| SchemaItem {
                name: field.name.clone(),
                type_name: field.type_name.clone(),
                value: value.as_ref().to_string(),
            })
            .collect()
    }

    /// ABI-encode `items`, which must follow the schema order.
    pub fn encode(&self, items: &[SchemaItem]) -> Result<Bytes> {
        if items.len() != self.fields.len() {
            return Err(AttestError::Encoding(format!(
                "Expected {} values for schema \"{}\", got {}",
                self.fields.len(),
                self.signature,
                items.len()
            )));
        }

        let mut values = Vec::with_capacity(items.len());
        for (field, item) in self.fields.iter().zip(items) {
            if item.name != field.name {
                return Err(AttestError::Encoding(format!(
                    "Field name mismatch: expected \"{}\", got \"{}\"",
                    field.name, item.name
                )));
            }

            let item_type = resolve_type(&item.type_name)?;
            if item_type != field.sol_type {
                return Err(AttestError::Encoding(format!(
                    "Type mismatch for \"{}\": expected {}, got {}",
                    field.name, field.type_name, item.type_name
                )));
            }

            values.push(coerce(field, &item.value)?);
        }

        Ok(Bytes::from(DynSolValue::Tuple(values).abi_encode_params()))
    }
}

/// Strings are taken verbatim; everything else goes through the dyn-abi parser.
fn coerce(field: &SchemaField, value: &str) -> Result<DynSolValue> {
    if field.sol_type == DynSolType::String {
        return Ok(DynSolValue::String(value.to_string()));
    }

    field.sol_type.coerce_str(value).map_err(|e| {
        AttestError::Encoding(format!(
            "Invalid {} value {:?} for \"{}\": {}",
            field.type_name, value, field.name, e
        ))
    })
}

fn parse_field(entry: &str) -> Result<SchemaField> {
    let (type_name, name) = entry
        .rsplit_once(char::is_whitespace)
        .map(|(ty, name)| (ty.trim(), name.trim()))
        .filter(|(ty, name)| !ty.is_empty() && !name.is_empty())
        .ok_or_else(|| {
            AttestError::Encoding(format!("Schema entry \"{}\" must be \"<type> <name>\"", entry))
        })?;

    let sol_type = resolve_type(type_name)?;
    Ok(SchemaField {
        name: name.to_string(),
        type_name: alias(type_name).to_string(),
        sol_type,
    })
}

fn resolve_type(type_name: &str) -> Result<DynSolType> {
    DynSolType::parse(alias(type_name.trim()))
        .map_err(|e| AttestError::Encoding(format!("Unknown schema type \"{}\": {}", type_name, e)))
}

fn alias(type_name: &str) -> &str {
    match type_name {
        "ipfsHash" => "bytes32",
        other => other,
    }
}

/// Split on commas that are not nested inside a tuple or array.
fn split_top_level(signature: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in signature.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                entries.push(signature[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(signature[start..].trim());

    entries
}
