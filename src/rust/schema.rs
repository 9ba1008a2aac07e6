use serde::{Deserialize, Serialize};

use crate::error::{RecommenderError, Result};

/// Answer slots collected by the conversation, in model column order.
pub const DEFAULT_FEATURES: [&str; 9] = [
    "favorite_subject",
    "location",
    "study_approach",
    "learning_env",
    "future_goals",
    "budget",
    "learn_style",
    "extra_activity",
    "scholarship",
];

/// The six slots every conversation is guaranteed to ask about.
pub const CORE_FEATURES: [&str; 6] = [
    "favorite_subject",
    "location",
    "study_approach",
    "learning_env",
    "future_goals",
    "budget",
];

pub const DEFAULT_TARGET: &str = "target";

/// The fixed, ordered list of categorical slots a trained model expects,
/// plus the name of the label column.
///
/// The same schema must be used to fit the encoders and to build feature
/// vectors at prediction time; it is persisted inside the encoder artifact
/// so the two cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    features: Vec<String>,
    target: String,
}

impl FeatureSchema {
    /// Creates a schema from ordered slot names and a target column.
    ///
    /// # Errors
    /// - `SchemaMismatch` if there are no features, a name is empty, a name is
    ///   repeated, or the target collides with a feature name
    pub fn new(
        features: impl IntoIterator<Item = impl Into<String>>,
        target: impl Into<String>,
    ) -> Result<Self> {
        let features: Vec<String> = features.into_iter().map(Into::into).collect();
        let target = target.into();

        if features.is_empty() {
            return Err(RecommenderError::SchemaMismatch(
                "Schema must contain at least one feature".into(),
            ));
        }
        if target.is_empty() {
            return Err(RecommenderError::SchemaMismatch("Target column name cannot be empty".into()));
        }
        for (i, name) in features.iter().enumerate() {
            if name.is_empty() {
                return Err(RecommenderError::SchemaMismatch(format!(
                    "Feature {} has an empty name",
                    i + 1
                )));
            }
            if features[..i].contains(name) {
                return Err(RecommenderError::SchemaMismatch(format!(
                    "Feature '{}' is listed more than once",
                    name
                )));
            }
            if *name == target {
                return Err(RecommenderError::SchemaMismatch(format!(
                    "Feature '{}' collides with the target column",
                    name
                )));
            }
        }

        Ok(Self { features, target })
    }

    /// The six-question schema used by the chat flow.
    pub fn core() -> Self {
        Self {
            features: CORE_FEATURES.iter().map(|s| s.to_string()).collect(),
            target: DEFAULT_TARGET.to_string(),
        }
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.features.iter().any(|f| f == slot)
    }

    /// Position of `slot` in column order.
    pub fn position(&self, slot: &str) -> Option<usize> {
        self.features.iter().position(|f| f == slot)
    }

    /// Every column a training dataset must provide, features first.
    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.features
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.target.as_str()))
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self {
            features: DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect(),
            target: DEFAULT_TARGET.to_string(),
        }
    }
}
