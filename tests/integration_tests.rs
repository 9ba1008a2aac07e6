mod common;

use std::collections::HashMap;
use std::sync::Arc;

use major_recommender::{
    ArtifactStore, Dataset, FeatureSchema, ForestConfig, Recommender, RecommenderError, TrainingConfig,
    TrainingPipeline, DEFAULT_PLACEHOLDER,
};

use common::{fitted_recommender, init, training_csv, MAJORS, PROFILE};

fn pipeline_config(dir: &std::path::Path) -> TrainingConfig {
    TrainingConfig {
        data_path: dir.join("student_answers.csv"),
        artifacts_dir: dir.join("artifacts"),
        schema: FeatureSchema::core(),
        forest: ForestConfig {
            n_estimators: 25,
            ..ForestConfig::default()
        },
        ..TrainingConfig::default()
    }
}

#[test]
fn test_top_three_for_full_profile() -> Result<(), RecommenderError> {
    init();
    let recommender = fitted_recommender();
    let answers: HashMap<&str, &str> = PROFILE.into_iter().collect();

    let recommendations = recommender.predict_top_n(&answers, 3)?;
    assert_eq!(recommendations.len(), 3);
    for rec in &recommendations {
        assert!((0.0..=1.0).contains(&rec.score));
        assert!(MAJORS.contains(&rec.label.as_str()));
    }
    assert!(recommendations.windows(2).all(|w| w[0].score >= w[1].score));
    Ok(())
}

#[test]
fn test_missing_slot_uses_placeholder() -> Result<(), RecommenderError> {
    init();
    let recommender = fitted_recommender();
    // "Unknown" is a budget value in the training data
    let answers: Vec<(&str, &str)> = PROFILE.into_iter().filter(|(slot, _)| *slot != "budget").collect();

    let recommendations = recommender.predict_top_n(answers, 2)?;
    assert!(!recommendations.is_empty());
    assert!(recommendations.len() <= 2);
    Ok(())
}

#[test]
fn test_missing_slot_outside_vocabulary() {
    init();
    let recommender = fitted_recommender();
    // Every training row has a location, so the placeholder is unseen there
    let answers: Vec<(&str, &str)> = PROFILE.into_iter().filter(|(slot, _)| *slot != "location").collect();

    match recommender.predict_top_n(answers, 3) {
        Err(RecommenderError::UnknownCategory { feature, value }) => {
            assert_eq!(feature, "location");
            assert_eq!(value, DEFAULT_PLACEHOLDER);
        }
        other => panic!("expected UnknownCategory, got {:?}", other),
    }
}

#[test]
fn test_two_classes_ten_rows_trains() -> Result<(), RecommenderError> {
    init();
    let mut csv = String::from("favorite_subject,location,study_approach,learning_env,future_goals,budget,target\n");
    for i in 0..10 {
        let (subject, major) = if i % 2 == 0 { ("Math", "Engineering") } else { ("Biology", "Medicine") };
        csv.push_str(&format!("{},Phnom Penh,Analytical,Group,Expert,Medium,{}\n", subject, major));
    }
    let dataset = Dataset::from_reader(csv.as_bytes(), &FeatureSchema::core(), DEFAULT_PLACEHOLDER)?;

    let model = TrainingPipeline::default().fit(&dataset)?;
    assert_eq!(model.encoders.target().len(), 2);
    assert_eq!(model.n_test, 2);
    assert_eq!(model.n_train, 8);
    Ok(())
}

#[test]
fn test_single_row_fails_validation() {
    init();
    let csv = "favorite_subject,location,study_approach,learning_env,future_goals,budget,target\n\
               Math,Phnom Penh,Analytical,Group,Expert,Medium,Engineering\n";
    let dataset = Dataset::from_reader(csv.as_bytes(), &FeatureSchema::core(), DEFAULT_PLACEHOLDER).unwrap();
    assert!(matches!(
        TrainingPipeline::default().fit(&dataset),
        Err(RecommenderError::DatasetValidation(_))
    ));
}

#[test]
fn test_one_row_per_class_fails_validation() {
    init();
    let mut csv = String::from("favorite_subject,location,study_approach,learning_env,future_goals,budget,target\n");
    for major in ["A", "B", "C", "D", "E"] {
        csv.push_str(&format!("Math,Phnom Penh,Analytical,Group,Expert,Medium,{}\n", major));
    }
    let dataset = Dataset::from_reader(csv.as_bytes(), &FeatureSchema::core(), DEFAULT_PLACEHOLDER).unwrap();
    assert!(matches!(
        TrainingPipeline::default().fit(&dataset),
        Err(RecommenderError::DatasetValidation(_))
    ));
}

#[test]
fn test_train_then_load_and_predict() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("student_answers.csv"), training_csv())?;
    let config = pipeline_config(dir.path());

    let report = TrainingPipeline::new(config.clone()).run()?;
    assert_eq!(report.n_rows, 64);
    assert_eq!(report.n_classes, 4);
    assert_eq!(report.n_train + report.n_test, 64);
    assert!(report.n_test >= 12);
    assert_eq!(report.classifier_path, config.classifier_path());

    let recommender = Recommender::load_artifacts(config.classifier_path(), config.encoders_path())?;
    let top = recommender.predict_top_n(PROFILE, 3)?;
    assert!(!top.is_empty() && top.len() <= 3);

    let info = recommender.info();
    assert_eq!(info.num_trees, 25);
    assert_eq!(info.feature_names, FeatureSchema::core().features());
    Ok(())
}

#[test]
fn test_training_is_reproducible() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dataset = common::training_dataset();
    let pipeline = TrainingPipeline::new(TrainingConfig {
        schema: FeatureSchema::core(),
        forest: ForestConfig {
            n_estimators: 10,
            ..ForestConfig::default()
        },
        ..TrainingConfig::default()
    });

    let first = pipeline.fit(&dataset)?;
    let second = pipeline.fit(&dataset)?;
    assert_eq!(first.forest, second.forest);
    assert_eq!(first.encoders, second.encoders);
    assert_eq!(first.report, second.report);
    Ok(())
}

#[test]
fn test_artifact_store_round_trip_preserves_predictions() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let recommender = fitted_recommender();
    let store = ArtifactStore::in_dir(dir.path());
    store.save(recommender.classifier(), recommender.encoders())?;

    let reloaded = Recommender::from_store(&store)?;
    assert_eq!(
        recommender.predict_proba(PROFILE)?,
        reloaded.predict_proba(PROFILE)?
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_predictions_share_one_handle() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let recommender = Arc::new(fitted_recommender());
    let expected = recommender.predict_top_n(PROFILE, 3)?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let recommender = Arc::clone(&recommender);
        handles.push(tokio::task::spawn_blocking(move || recommender.predict_top_n(PROFILE, 3)));
    }

    for handle in handles {
        let result = handle.await??;
        assert_eq!(result, expected);
    }
    Ok(())
}
