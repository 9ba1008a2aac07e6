mod common;

use std::fs;

use major_recommender::{
    ArtifactStore, Dataset, FeatureSchema, ForestBuilder, Recommender, RecommenderError, SubjectRecord,
    TrainingConfig, TrainingPipeline, DEFAULT_PLACEHOLDER,
};

#[test]
fn test_answer_for_unknown_slot() {
    let recommender = common::fitted_recommender();
    let result = recommender.predict_top_n([("favorite_subject", "Math"), ("shoe_size", "42")], 3);
    assert!(matches!(result, Err(RecommenderError::SchemaMismatch(_))));
}

#[test]
fn test_subject_record_rejects_unknown_slot() {
    let mut record = SubjectRecord::new(FeatureSchema::core());
    assert!(record.set_answer("budget", "Low").is_ok());
    assert!(matches!(
        record.set_answer("shoe_size", "42"),
        Err(RecommenderError::SchemaMismatch(_))
    ));
    assert_eq!(record.missing_slots().len(), 5);
}

#[test]
fn test_unseen_answer_propagates() {
    let recommender = common::fitted_recommender();
    let mut answers = common::PROFILE.to_vec();
    answers[0] = ("favorite_subject", "Astrology");
    assert!(matches!(
        recommender.predict_top_n(answers, 3),
        Err(RecommenderError::UnknownCategory { .. })
    ));
}

#[test]
fn test_schema_definition_errors() {
    assert!(FeatureSchema::new(Vec::<String>::new(), "target").is_err());
    assert!(FeatureSchema::new(vec!["budget", "budget"], "target").is_err());
    assert!(FeatureSchema::new(vec!["budget", "target"], "target").is_err());
    assert!(FeatureSchema::new(vec!["budget", ""], "target").is_err());
}

#[test]
fn test_missing_columns_are_named() {
    let csv = "favorite_subject,location,target\nMath,Phnom Penh,Engineering\n";
    match Dataset::from_reader(csv.as_bytes(), &FeatureSchema::core(), DEFAULT_PLACEHOLDER) {
        Err(RecommenderError::DatasetValidation(msg)) => {
            assert!(msg.contains("study_approach"));
            assert!(msg.contains("budget"));
            assert!(!msg.contains("location"));
        }
        other => panic!("expected DatasetValidation, got {:?}", other),
    }
}

#[test]
fn test_missing_target_column() {
    let csv = "favorite_subject,location,study_approach,learning_env,future_goals,budget\n\
               Math,Phnom Penh,Analytical,Group,Expert,Medium\n";
    assert!(matches!(
        Dataset::from_reader(csv.as_bytes(), &FeatureSchema::core(), DEFAULT_PLACEHOLDER),
        Err(RecommenderError::DatasetValidation(_))
    ));
}

#[test]
fn test_missing_input_file_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainingConfig {
        data_path: dir.path().join("absent.csv"),
        artifacts_dir: dir.path().to_path_buf(),
        ..TrainingConfig::default()
    };
    assert!(matches!(
        TrainingPipeline::new(config.clone()).run(),
        Err(RecommenderError::Io(_))
    ));
    assert!(!config.classifier_path().exists());
}

#[test]
fn test_zero_trees_rejected() {
    assert!(matches!(
        ForestBuilder::new().with_n_estimators(0),
        Err(RecommenderError::Training(_))
    ));
}

#[test]
fn test_load_missing_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let result = Recommender::load_artifacts(dir.path().join("model.json"), dir.path().join("encoders.json"));
    assert!(matches!(result, Err(RecommenderError::ArtifactLoad(_))));
}

#[test]
fn test_load_corrupt_encoders() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::in_dir(dir.path());
    let recommender = common::fitted_recommender();
    store.save(recommender.classifier(), recommender.encoders()).unwrap();

    fs::write(store.encoders_path(), b"not json at all").unwrap();
    assert!(matches!(
        Recommender::from_store(&store),
        Err(RecommenderError::ArtifactLoad(_))
    ));
}

#[test]
fn test_load_pair_from_different_runs() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let recommender = common::fitted_recommender();

    let store_a = ArtifactStore::in_dir(first.path());
    store_a.save(recommender.classifier(), recommender.encoders()).unwrap();

    // Same forest shape, encoders fit on a dataset with one extra subject
    let mut csv = common::training_csv();
    csv.push_str("Chemistry,Phnom Penh,Analytical,Group,Expert,Medium,Medicine\n");
    let other = Dataset::from_reader(csv.as_bytes(), &FeatureSchema::core(), DEFAULT_PLACEHOLDER)
        .unwrap()
        .fit_encoders()
        .unwrap();
    let store_b = ArtifactStore::in_dir(second.path());
    store_b.save(recommender.classifier(), &other.encoders).unwrap();

    let mixed = ArtifactStore::new(store_a.classifier_path(), store_b.encoders_path());
    assert!(matches!(
        Recommender::from_store(&mixed),
        Err(RecommenderError::ArtifactLoad(_))
    ));
}

/// Saves a fitted pair, rewrites the classifier's forest with `edit`, and
/// returns the result of loading it back.
fn load_with_edited_forest(edit: impl FnOnce(&mut serde_json::Value)) -> major_recommender::Result<Recommender> {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::in_dir(dir.path());
    let recommender = common::fitted_recommender();
    store.save(recommender.classifier(), recommender.encoders()).unwrap();

    let mut artifact: serde_json::Value = serde_json::from_slice(&fs::read(store.classifier_path()).unwrap()).unwrap();
    edit(&mut artifact["forest"]);
    fs::write(store.classifier_path(), serde_json::to_vec(&artifact).unwrap()).unwrap();
    Recommender::from_store(&store)
}

fn for_each_node(forest: &mut serde_json::Value, mut edit: impl FnMut(&mut serde_json::Value)) {
    for tree in forest["trees"].as_array_mut().unwrap() {
        for node in tree["nodes"].as_array_mut().unwrap() {
            edit(node);
        }
    }
}

#[test]
fn test_untouched_forest_loads() {
    assert!(load_with_edited_forest(|_| {}).is_ok());
}

#[test]
fn test_load_rejects_leaves_outside_unit_range() {
    let result = load_with_edited_forest(|forest| {
        for_each_node(forest, |node| {
            if let Some(leaf) = node.get_mut("Leaf") {
                let n = leaf["distribution"].as_array().unwrap().len();
                let mut bad = vec![0.0; n];
                bad[0] = -1.0;
                bad[1] = 2.0;
                leaf["distribution"] = serde_json::json!(bad);
            }
        })
    });
    assert!(matches!(result, Err(RecommenderError::ArtifactLoad(_))));
}

#[test]
fn test_load_rejects_unnormalised_leaves() {
    let result = load_with_edited_forest(|forest| {
        for_each_node(forest, |node| {
            if let Some(leaf) = node.get_mut("Leaf") {
                let n = leaf["distribution"].as_array().unwrap().len();
                leaf["distribution"] = serde_json::json!(vec![0.1; n]);
            }
        })
    });
    assert!(matches!(result, Err(RecommenderError::ArtifactLoad(_))));
}

#[test]
fn test_load_rejects_child_out_of_range() {
    let result = load_with_edited_forest(|forest| {
        for_each_node(forest, |node| {
            if let Some(split) = node.get_mut("Split") {
                split["right"] = serde_json::json!(1_000_000);
            }
        })
    });
    assert!(matches!(result, Err(RecommenderError::ArtifactLoad(_))));
}

#[test]
fn test_load_rejects_split_on_missing_feature() {
    let result = load_with_edited_forest(|forest| {
        for_each_node(forest, |node| {
            if let Some(split) = node.get_mut("Split") {
                split["feature"] = serde_json::json!(99);
            }
        })
    });
    assert!(matches!(result, Err(RecommenderError::ArtifactLoad(_))));
}

#[test]
fn test_load_rejects_trees_with_different_class_counts() {
    let result = load_with_edited_forest(|forest| {
        let trees = forest["trees"].as_array_mut().unwrap();
        let last = trees.len() - 1;
        trees[last] = serde_json::json!({
            "nodes": [{ "Leaf": { "distribution": [0.5, 0.5] } }],
            "n_features": 6,
            "n_classes": 2
        });
    });
    assert!(matches!(result, Err(RecommenderError::ArtifactLoad(_))));
}

#[test]
fn test_errors_are_displayable() {
    let err = RecommenderError::UnknownCategory {
        feature: "budget".into(),
        value: "Free".into(),
    };
    assert_eq!(err.to_string(), "Unknown category 'Free' for feature 'budget'");
}
