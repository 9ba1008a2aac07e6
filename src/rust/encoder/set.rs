use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::category::CategoryEncoder;
use crate::error::{RecommenderError, Result};
use crate::schema::FeatureSchema;

/// All fitted encoders of one training run: one per feature slot plus the
/// target encoder. Always persisted and loaded as a single unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSet {
    schema: FeatureSchema,
    features: BTreeMap<String, CategoryEncoder>,
    target: CategoryEncoder,
}

impl EncoderSet {
    /// Assembles a set, checking that every schema slot has exactly one encoder.
    ///
    /// # Errors
    /// - `SchemaMismatch` if an encoder is missing or an extra one is supplied
    pub fn new(
        schema: FeatureSchema,
        features: impl IntoIterator<Item = CategoryEncoder>,
        target: CategoryEncoder,
    ) -> Result<Self> {
        if target.name() != schema.target() {
            return Err(RecommenderError::SchemaMismatch(format!(
                "Target encoder '{}' does not match schema target '{}'",
                target.name(),
                schema.target()
            )));
        }
        let mut by_name = BTreeMap::new();
        for encoder in features {
            if !schema.contains(encoder.name()) {
                return Err(RecommenderError::SchemaMismatch(format!(
                    "Encoder '{}' does not correspond to any schema feature",
                    encoder.name()
                )));
            }
            by_name.insert(encoder.name().to_string(), encoder);
        }
        if let Some(missing) = schema.features().iter().find(|f| !by_name.contains_key(*f)) {
            return Err(RecommenderError::SchemaMismatch(format!(
                "No encoder fitted for feature '{}'",
                missing
            )));
        }
        Ok(Self {
            schema,
            features: by_name,
            target,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Looks up the encoder for one feature slot.
    pub fn feature(&self, slot: &str) -> Result<&CategoryEncoder> {
        self.features.get(slot).ok_or_else(|| {
            RecommenderError::SchemaMismatch(format!("Feature '{}' is not part of the trained schema", slot))
        })
    }

    /// Feature encoders in schema column order.
    pub fn feature_encoders(&self) -> impl Iterator<Item = &CategoryEncoder> {
        self.schema
            .features()
            .iter()
            .filter_map(move |slot| self.features.get(slot))
    }

    pub fn target(&self) -> &CategoryEncoder {
        &self.target
    }

    pub fn num_classes(&self) -> usize {
        self.target.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parses a set, re-validating that it covers its own schema.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let set: EncoderSet = serde_json::from_slice(bytes)?;
        Self::new(set.schema, set.features.into_values(), set.target)
    }

    /// Hex SHA-256 of the serialized set; the classifier artifact records it
    /// to pin the pair together.
    pub fn fingerprint(&self) -> Result<String> {
        Ok(fingerprint_bytes(&self.to_bytes()?))
    }
}

pub(crate) fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
