use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use ndarray::Array1;

use crate::artifacts::{check_compatible, ArtifactStore};
use crate::classifier::{argmax, ClassifierInfo, ProbabilisticClassifier, RandomForest};
use crate::encoder::EncoderSet;
use crate::error::{RecommenderError, Result};
use crate::features::{FeatureVector, FeatureVectorBuilder, SubjectRecord, DEFAULT_PLACEHOLDER};
use crate::ranker::{rank, Recommendation};
use crate::schema::FeatureSchema;

/// The loaded (classifier, encoders) pair behind every prediction.
///
/// Built once at startup and passed by reference (or cloned, which only
/// bumps reference counts) into each request. Nothing inside is mutated after
/// construction, so concurrent predictions need no locking.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use major_recommender::Recommender;
/// use std::collections::HashMap;
///
/// let recommender = Recommender::load_artifacts(
///     "major_recommender_model.json",
///     "label_encoders.json",
/// )?;
///
/// let answers = HashMap::from([
///     ("favorite_subject", "Math"),
///     ("location", "Phnom Penh"),
///     ("budget", "Medium"),
/// ]);
/// for rec in recommender.predict_top_n(&answers, 3)? {
///     println!("{}", rec);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Recommender {
    forest: Arc<RandomForest>,
    encoders: Arc<EncoderSet>,
    placeholder: String,
    classifier_path: Option<String>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Recommender>();
    }
};

impl Recommender {
    /// Wraps an in-memory pair, e.g. straight out of the training pipeline.
    ///
    /// # Errors
    /// - `ArtifactLoad` if the forest and encoders disagree on feature or class count
    pub fn new(forest: RandomForest, encoders: EncoderSet) -> Result<Self> {
        check_compatible(&forest, &encoders)?;
        Ok(Self {
            forest: Arc::new(forest),
            encoders: Arc::new(encoders),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            classifier_path: None,
        })
    }

    /// Loads the matched artifact pair written by the training pipeline.
    ///
    /// # Errors
    /// - `ArtifactLoad` if either path is missing or corrupt, or the files do
    ///   not belong together
    pub fn load_artifacts<P: AsRef<Path>, Q: AsRef<Path>>(classifier_path: P, encoders_path: Q) -> Result<Self> {
        let store = ArtifactStore::new(classifier_path, encoders_path);
        Self::from_store(&store)
    }

    pub fn from_store(store: &ArtifactStore) -> Result<Self> {
        info!("Loading recommender artifacts");
        let (forest, encoders) = store.load()?;
        let mut recommender = Self::new(forest, encoders)?;
        recommender.classifier_path = Some(store.classifier_path().to_string_lossy().to_string());
        Ok(recommender)
    }

    /// Sets the value substituted for unanswered slots
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.encoders.schema()
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    pub fn classifier(&self) -> &RandomForest {
        &self.forest
    }

    /// An empty answer record for a new conversation.
    pub fn new_record(&self) -> SubjectRecord {
        SubjectRecord::new(self.schema().clone())
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            classifier_path: self.classifier_path.clone(),
            num_classes: self.forest.n_classes(),
            class_labels: self.encoders.target().classes().to_vec(),
            feature_names: self.schema().features().to_vec(),
            num_trees: self.forest.n_trees(),
            avg_depth: self.forest.avg_depth(),
        }
    }

    fn vector_builder(&self) -> FeatureVectorBuilder<'_> {
        FeatureVectorBuilder::new(&self.encoders).with_placeholder(self.placeholder.as_str())
    }

    /// Encodes an answer mapping into a feature vector.
    pub fn encode<I, K, V>(&self, answers: I) -> Result<FeatureVector>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.vector_builder().build_from_answers(answers)
    }

    /// Class probabilities for an answer mapping, indexed by target code.
    pub fn predict_proba<I, K, V>(&self, answers: I) -> Result<Array1<f64>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let vector = self.encode(answers)?;
        self.forest.predict_proba(vector.view())
    }

    /// The `n` most probable majors for an answer mapping, best first.
    ///
    /// # Errors
    /// - `SchemaMismatch` if an answer names a slot the model was not trained on
    /// - `UnknownCategory` if an answer value (or the placeholder filling a
    ///   gap) was never seen during training
    pub fn predict_top_n<I, K, V>(&self, answers: I, n: usize) -> Result<Vec<Recommendation>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let proba = self.predict_proba(answers)?;
        let ranked = rank(proba.view(), n, self.encoders.target())?;
        debug!("Top {} recommendations: {:?}", n, ranked);
        Ok(ranked)
    }

    /// Same as [`predict_top_n`](Self::predict_top_n) for a collected record.
    pub fn predict_top_n_for(&self, record: &SubjectRecord, n: usize) -> Result<Vec<Recommendation>> {
        let vector = self.vector_builder().build(record)?;
        let proba = self.forest.predict_proba(vector.view())?;
        rank(proba.view(), n, self.encoders.target())
    }

    /// The single most probable major.
    pub fn predict_label<I, K, V>(&self, answers: I) -> Result<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let proba = self.predict_proba(answers)?;
        let class = argmax(proba.view())
            .ok_or_else(|| RecommenderError::ArtifactLoad("Classifier has no classes".into()))?;
        Ok(self.encoders.target().inverse_transform(class)?.to_string())
    }
}
