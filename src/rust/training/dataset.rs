use std::fs::File;
use std::io;
use std::path::Path;

use log::{debug, error, info};
use ndarray::Array2;

use crate::encoder::{CategoryEncoder, EncoderSet};
use crate::error::{RecommenderError, Result};
use crate::schema::FeatureSchema;

/// Historical labelled answers, one column per schema feature plus the
/// label column, with gaps already filled by the placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    schema: FeatureSchema,
    columns: Vec<Vec<String>>,
    labels: Vec<String>,
}

/// A dataset after encoder fitting: codes in place of strings.
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    pub encoders: EncoderSet,
    /// `n_rows x n_features`, columns in schema order
    pub x: Array2<usize>,
    pub y: Vec<usize>,
}

impl Dataset {
    /// Reads a CSV file with a header row.
    ///
    /// # Errors
    /// - `Io` if the file cannot be opened
    /// - `DatasetValidation` if a required column is absent
    /// - `Csv` if the file is malformed
    pub fn from_csv_path<P: AsRef<Path>>(path: P, schema: &FeatureSchema, placeholder: &str) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading data from: {:?}", path);
        let file = File::open(path).map_err(|e| {
            error!("Error: the data file {:?} could not be opened: {}", path, e);
            e
        })?;
        Self::from_reader(file, schema, placeholder)
    }

    /// Reads CSV from any reader. Empty cells and the usual NA markers
    /// (`NA`, `NaN`, `null`, ...) become `placeholder`; every other value is
    /// kept verbatim, surrounding whitespace included, so training codes match
    /// the raw answers seen at prediction time.
    pub fn from_reader<R: io::Read>(reader: R, schema: &FeatureSchema, placeholder: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        info!("Dataset columns: {:?}", headers);

        let missing: Vec<&str> = schema
            .required_columns()
            .filter(|col| !headers.iter().any(|h| h == col))
            .collect();
        if !missing.is_empty() {
            error!("Missing required columns in CSV: {:?}", missing);
            return Err(RecommenderError::DatasetValidation(format!(
                "Missing required columns: {}",
                missing.join(", ")
            )));
        }

        // Present by the check above.
        let positions: Vec<usize> = schema
            .required_columns()
            .filter_map(|col| headers.iter().position(|h| h == col))
            .collect();
        let n_features = schema.len();

        let mut columns = vec![Vec::new(); n_features];
        let mut labels = Vec::new();
        let mut filled = 0usize;
        for record in csv_reader.records() {
            let record = record?;
            for (slot, &pos) in positions.iter().enumerate() {
                let value = match record.get(pos) {
                    Some(v) if !is_missing(v) => v.to_string(),
                    _ => {
                        filled += 1;
                        placeholder.to_string()
                    }
                };
                if slot < n_features {
                    columns[slot].push(value);
                } else {
                    labels.push(value);
                }
            }
        }

        info!("Dataset shape: ({}, {})", labels.len(), headers.len());
        if filled > 0 {
            info!("Filled {} missing values with '{}'", filled, placeholder);
        }

        Ok(Self {
            schema: schema.clone(),
            columns,
            labels,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Values of one feature column, in row order.
    pub fn column(&self, slot: &str) -> Option<&[String]> {
        self.schema.position(slot).map(|i| self.columns[i].as_slice())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Fits one encoder per feature column plus the target encoder and
    /// encodes every row.
    ///
    /// # Errors
    /// - `DatasetValidation` if the dataset has no rows
    pub fn fit_encoders(&self) -> Result<EncodedDataset> {
        if self.n_rows() == 0 {
            return Err(RecommenderError::DatasetValidation("Dataset contains no rows".into()));
        }

        info!("Encoding feature columns...");
        let n_rows = self.n_rows();
        let mut x = Array2::<usize>::zeros((n_rows, self.schema.len()));
        let mut encoders = Vec::with_capacity(self.schema.len());
        for (i, (name, values)) in self.schema.features().iter().zip(&self.columns).enumerate() {
            let (encoder, codes) = CategoryEncoder::fit_transform(name.as_str(), values.as_slice())?;
            debug!("Encoded column: {} ({} categories)", name, encoder.len());
            for (row, code) in codes.into_iter().enumerate() {
                x[[row, i]] = code;
            }
            encoders.push(encoder);
        }

        info!("Encoding target column...");
        let (target, y) = CategoryEncoder::fit_transform(self.schema.target(), self.labels.as_slice())?;
        debug!("Encoded target column: {} ({} classes)", self.schema.target(), target.len());

        let encoders = EncoderSet::new(self.schema.clone(), encoders, target)?;
        Ok(EncodedDataset { encoders, x, y })
    }
}

/// Cell values read as missing, as pandas does by default.
const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA",
    "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value)
}
