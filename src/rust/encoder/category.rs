use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{RecommenderError, Result};

/// Bidirectional mapping between the distinct string values of one
/// categorical column and contiguous codes `0..len`.
///
/// Codes follow the lexicographic order of the values (byte-wise `Ord` on
/// `String`), so fitting the same column twice always yields the same codes
/// regardless of row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncoderRepr", into = "EncoderRepr")]
pub struct CategoryEncoder {
    name: String,
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct EncoderRepr {
    name: String,
    classes: Vec<String>,
}

impl From<CategoryEncoder> for EncoderRepr {
    fn from(encoder: CategoryEncoder) -> Self {
        Self {
            name: encoder.name,
            classes: encoder.classes,
        }
    }
}

impl TryFrom<EncoderRepr> for CategoryEncoder {
    type Error = String;

    fn try_from(repr: EncoderRepr) -> std::result::Result<Self, Self::Error> {
        if repr.classes.is_empty() {
            return Err(format!("encoder '{}' has no classes", repr.name));
        }
        if repr.classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!("encoder '{}' classes are not strictly sorted", repr.name));
        }
        Ok(Self::from_sorted(repr.name, repr.classes))
    }
}

impl CategoryEncoder {
    /// Fits an encoder over every value of one column.
    ///
    /// # Errors
    /// - `DatasetValidation` if `values` is empty
    pub fn fit<I, S>(name: impl Into<String>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        let distinct: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();

        if distinct.is_empty() {
            return Err(RecommenderError::DatasetValidation(format!(
                "Cannot fit encoder '{}' on an empty column",
                name
            )));
        }

        Ok(Self::from_sorted(name, distinct.into_iter().collect()))
    }

    /// Fits on `values` and returns their codes in input order.
    pub fn fit_transform<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Result<(Self, Vec<usize>)> {
        let encoder = Self::fit(name, values)?;
        let codes = values
            .iter()
            .map(|v| encoder.transform(v.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok((encoder, codes))
    }

    fn from_sorted(name: String, classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(code, value)| (value.clone(), code))
            .collect();
        Self { name, classes, index }
    }

    /// Returns the code for `value`.
    ///
    /// # Errors
    /// - `UnknownCategory` if `value` was not part of the fit set
    pub fn transform(&self, value: &str) -> Result<usize> {
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| RecommenderError::UnknownCategory {
                feature: self.name.clone(),
                value: value.to_string(),
            })
    }

    /// Returns the original value for `code`.
    ///
    /// # Errors
    /// - `InvalidCode` if `code >= len()`
    pub fn inverse_transform(&self, code: usize) -> Result<&str> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| RecommenderError::InvalidCode {
                feature: self.name.clone(),
                code,
                len: self.classes.len(),
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fitted vocabulary in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, value: &str) -> bool {
        self.index.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_lexicographic() {
        let encoder = CategoryEncoder::fit("budget", ["Medium", "High", "Low", "High"]).unwrap();
        assert_eq!(encoder.classes(), ["High", "Low", "Medium"]);
        assert_eq!(encoder.transform("High").unwrap(), 0);
        assert_eq!(encoder.transform("Medium").unwrap(), 2);
    }

    #[test]
    fn test_fit_is_order_independent() {
        let a = CategoryEncoder::fit("x", ["b", "a", "c"]).unwrap();
        let b = CategoryEncoder::fit("x", ["c", "c", "a", "b"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_value() {
        let encoder = CategoryEncoder::fit("location", ["City", "Province"]).unwrap();
        match encoder.transform("Mars") {
            Err(RecommenderError::UnknownCategory { feature, value }) => {
                assert_eq!(feature, "location");
                assert_eq!(value, "Mars");
            }
            other => panic!("expected UnknownCategory, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_code() {
        let encoder = CategoryEncoder::fit("location", ["City"]).unwrap();
        assert!(matches!(
            encoder.inverse_transform(1),
            Err(RecommenderError::InvalidCode { code: 1, len: 1, .. })
        ));
    }

    #[test]
    fn test_empty_fit() {
        let result = CategoryEncoder::fit("x", Vec::<String>::new());
        assert!(matches!(result, Err(RecommenderError::DatasetValidation(_))));
    }

    #[test]
    fn test_fit_transform() {
        let (encoder, codes) = CategoryEncoder::fit_transform("s", &["Math", "Art", "Math"]).unwrap();
        assert_eq!(encoder.len(), 2);
        assert_eq!(codes, vec![1, 0, 1]);
    }

    #[test]
    fn test_deserialize_rejects_unsorted() {
        let json = r#"{"name":"x","classes":["b","a"]}"#;
        assert!(serde_json::from_str::<CategoryEncoder>(json).is_err());
    }
}
