use std::collections::BTreeMap;

use ndarray::{Array1, ArrayView1};

use crate::encoder::EncoderSet;
use crate::error::{RecommenderError, Result};
use crate::schema::FeatureSchema;

/// Substituted for an unanswered slot, both when cleaning training data and
/// when building a vector for prediction.
pub const DEFAULT_PLACEHOLDER: &str = "Unknown";

/// The answers collected for one subject, checked against a schema as they
/// arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRecord {
    schema: FeatureSchema,
    answers: BTreeMap<String, String>,
}

impl SubjectRecord {
    /// Starts an empty record for a new session.
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            schema,
            answers: BTreeMap::new(),
        }
    }

    /// Builds a record from already collected answers.
    ///
    /// # Errors
    /// - `SchemaMismatch` if any slot is not part of `schema`
    pub fn from_answers<I, K, V>(schema: FeatureSchema, answers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new(schema);
        for (slot, value) in answers {
            record.set_answer(slot, value)?;
        }
        Ok(record)
    }

    /// Records (or replaces) the answer for one slot.
    pub fn set_answer(&mut self, slot: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let slot = slot.into();
        if !self.schema.contains(&slot) {
            return Err(RecommenderError::SchemaMismatch(format!(
                "Answer for unknown feature slot '{}'",
                slot
            )));
        }
        self.answers.insert(slot, value.into());
        Ok(())
    }

    pub fn answer(&self, slot: &str) -> Option<&str> {
        self.answers.get(slot).map(String::as_str)
    }

    /// Slots that still have no answer, in schema order.
    pub fn missing_slots(&self) -> Vec<&str> {
        self.schema
            .features()
            .iter()
            .filter(|slot| !self.answers.contains_key(*slot))
            .map(String::as_str)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.schema.features().iter().all(|slot| self.answers.contains_key(slot))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn answers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One encoded subject: a code per schema slot, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector(Array1<usize>);

impl FeatureVector {
    pub fn new(codes: Vec<usize>) -> Self {
        Self(Array1::from_vec(codes))
    }

    pub fn view(&self) -> ArrayView1<'_, usize> {
        self.0.view()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.0.to_vec()
    }
}

/// Turns subject answers into model-ready vectors using a fitted encoder set.
#[derive(Debug, Clone)]
pub struct FeatureVectorBuilder<'a> {
    encoders: &'a EncoderSet,
    placeholder: String,
}

impl<'a> FeatureVectorBuilder<'a> {
    pub fn new(encoders: &'a EncoderSet) -> Self {
        Self {
            encoders,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Encodes a record slot by slot, substituting the placeholder for
    /// unanswered slots.
    ///
    /// # Errors
    /// - `SchemaMismatch` if the record holds a slot the encoders were not fit for
    /// - `UnknownCategory` if an answer (or the placeholder) is outside the
    ///   training vocabulary
    pub fn build(&self, record: &SubjectRecord) -> Result<FeatureVector> {
        self.encode(record.answers())
    }

    /// Encodes a loose answer mapping (e.g. `&HashMap<String, String>`),
    /// validating its slots first.
    pub fn build_from_answers<I, K, V>(&self, answers: I) -> Result<FeatureVector>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs: Vec<(K, V)> = answers.into_iter().collect();
        self.encode(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
    }

    fn encode<'b, I>(&self, answers: I) -> Result<FeatureVector>
    where
        I: IntoIterator<Item = (&'b str, &'b str)>,
    {
        let schema = self.encoders.schema();
        let mut slots: Vec<Option<&str>> = vec![None; schema.len()];
        for (slot, value) in answers {
            let position = schema.position(slot).ok_or_else(|| {
                RecommenderError::SchemaMismatch(format!(
                    "Answer for feature slot '{}' which the model was not trained on",
                    slot
                ))
            })?;
            slots[position] = Some(value);
        }

        let mut codes = Vec::with_capacity(schema.len());
        for (encoder, value) in self.encoders.feature_encoders().zip(slots) {
            let value = value.unwrap_or(&self.placeholder);
            codes.push(encoder.transform(value)?);
        }
        Ok(FeatureVector::new(codes))
    }
}
