use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classifier::RandomForest;
use crate::config::{ARTIFACTS_DIR_ENV, DEFAULT_CLASSIFIER_FILE, DEFAULT_ENCODERS_FILE};
use crate::encoder::{fingerprint_bytes, EncoderSet};
use crate::error::{RecommenderError, Result};

const FORMAT_VERSION: u32 = 1;

/// On-disk form of the classifier blob. It records the fingerprint of the
/// encoder blob written alongside it so a mismatched pair is refused.
#[derive(Debug, Serialize, Deserialize)]
struct ClassifierArtifact {
    format_version: u32,
    encoders_sha256: String,
    forest: RandomForest,
}

/// Reads and writes the matched (classifier, encoders) pair under one
/// directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    classifier_path: PathBuf,
    encoders_path: PathBuf,
}

impl ArtifactStore {
    /// Store rooted at `$MAJOR_RECOMMENDER_ARTIFACTS`, or the working
    /// directory when unset, using the default file names
    pub fn new_default() -> Self {
        Self::in_dir(Self::get_default_artifacts_dir())
    }

    pub fn get_default_artifacts_dir() -> PathBuf {
        match env::var(ARTIFACTS_DIR_ENV) {
            Ok(path) => PathBuf::from(path),
            Err(_) => PathBuf::from("."),
        }
    }

    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(DEFAULT_CLASSIFIER_FILE), dir.join(DEFAULT_ENCODERS_FILE))
    }

    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(classifier_path: P, encoders_path: Q) -> Self {
        Self {
            classifier_path: classifier_path.as_ref().to_path_buf(),
            encoders_path: encoders_path.as_ref().to_path_buf(),
        }
    }

    pub fn classifier_path(&self) -> &Path {
        &self.classifier_path
    }

    pub fn encoders_path(&self) -> &Path {
        &self.encoders_path
    }

    pub fn artifacts_exist(&self) -> bool {
        log::info!("Checking for trained artifacts:");
        log::info!("  Classifier path: {:?} (exists: {})", self.classifier_path, self.classifier_path.exists());
        log::info!("  Encoders path: {:?} (exists: {})", self.encoders_path, self.encoders_path.exists());
        self.classifier_path.exists() && self.encoders_path.exists()
    }

    /// Writes the pair: encoders first, then the classifier that pins them.
    /// Each file is written to a temporary sibling and renamed into place.
    pub fn save(&self, forest: &RandomForest, encoders: &EncoderSet) -> Result<()> {
        let encoder_bytes = encoders.to_bytes()?;
        let artifact = ClassifierArtifact {
            format_version: FORMAT_VERSION,
            encoders_sha256: fingerprint_bytes(&encoder_bytes),
            forest: forest.clone(),
        };
        let classifier_bytes = serde_json::to_vec(&artifact)?;

        log::info!("Writing {} bytes to {:?}", encoder_bytes.len(), self.encoders_path);
        write_atomic(&self.encoders_path, &encoder_bytes)?;
        log::info!("Writing {} bytes to {:?}", classifier_bytes.len(), self.classifier_path);
        write_atomic(&self.classifier_path, &classifier_bytes)?;
        Ok(())
    }

    /// Loads and cross-checks both artifacts.
    ///
    /// # Errors
    /// - `ArtifactLoad` if either file is missing or unreadable, fails to
    ///   parse, is structurally invalid, or the classifier was trained with a
    ///   different encoder set
    pub fn load(&self) -> Result<(RandomForest, EncoderSet)> {
        let encoder_bytes = read_artifact(&self.encoders_path, "encoders")?;
        let classifier_bytes = read_artifact(&self.classifier_path, "classifier")?;

        let encoders = EncoderSet::from_bytes(&encoder_bytes).map_err(|e| {
            RecommenderError::ArtifactLoad(format!("Corrupt encoders file {:?}: {}", self.encoders_path, e))
        })?;
        let artifact: ClassifierArtifact = serde_json::from_slice(&classifier_bytes).map_err(|e| {
            RecommenderError::ArtifactLoad(format!("Corrupt classifier file {:?}: {}", self.classifier_path, e))
        })?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(RecommenderError::ArtifactLoad(format!(
                "Unsupported classifier format version {} (expected {})",
                artifact.format_version, FORMAT_VERSION
            )));
        }

        let actual = fingerprint_bytes(&encoder_bytes);
        if actual != artifact.encoders_sha256 {
            log::error!(
                "Encoder fingerprint mismatch: classifier expects {}, file has {}",
                artifact.encoders_sha256,
                actual
            );
            return Err(RecommenderError::ArtifactLoad(
                "Classifier and encoders come from different training runs".into(),
            ));
        }

        let forest = artifact.forest;
        forest
            .validate()
            .map_err(|e| RecommenderError::ArtifactLoad(format!("Invalid classifier: {}", e)))?;
        check_compatible(&forest, &encoders)?;

        log::info!(
            "Loaded classifier ({} trees, {} classes) and encoders for {} features",
            forest.n_trees(),
            encoders.num_classes(),
            encoders.schema().len()
        );
        Ok((forest, encoders))
    }

    pub fn remove(&self) -> Result<()> {
        for path in [&self.classifier_path, &self.encoders_path] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

/// Forest and encoders must agree on feature count and class count.
pub(crate) fn check_compatible(forest: &RandomForest, encoders: &EncoderSet) -> Result<()> {
    use crate::classifier::ProbabilisticClassifier;

    if forest.n_features() != encoders.schema().len() {
        return Err(RecommenderError::ArtifactLoad(format!(
            "Classifier expects {} features but encoders cover {}",
            forest.n_features(),
            encoders.schema().len()
        )));
    }
    if forest.n_classes() != encoders.num_classes() {
        return Err(RecommenderError::ArtifactLoad(format!(
            "Classifier predicts {} classes but the target encoder has {}",
            forest.n_classes(),
            encoders.num_classes()
        )));
    }
    Ok(())
}

fn read_artifact(path: &Path, kind: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        log::error!("Failed to read {} file {:?}: {}", kind, path, e);
        RecommenderError::ArtifactLoad(format!("Cannot read {} file {:?}: {}", kind, path, e))
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
