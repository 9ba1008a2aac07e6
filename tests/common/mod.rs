#![allow(dead_code)]

use major_recommender::{
    Dataset, FeatureSchema, ForestBuilder, MaxFeatures, Recommender, DEFAULT_PLACEHOLDER,
};

pub const MAJORS: [&str; 4] = ["Business", "Computer Science", "Fine Arts", "Medicine"];

/// The answers used by the "Math student from Phnom Penh" scenario.
pub const PROFILE: [(&str, &str); 6] = [
    ("favorite_subject", "Math"),
    ("location", "Phnom Penh"),
    ("study_approach", "Analytical"),
    ("learning_env", "Group"),
    ("future_goals", "Expert"),
    ("budget", "Medium"),
];

pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Historical answers over the six core slots with four majors.
///
/// Subject mostly follows the major. The exact `PROFILE` answers appear
/// under every major, and a few rows leave `budget` blank.
pub fn training_csv() -> String {
    let subjects = ["Economics", "Math", "Art", "Biology", "Physics"];
    let locations = ["Phnom Penh", "Siem Reap", "Battambang"];
    let approaches = ["Analytical", "Creative", "Practical"];
    let envs = ["Group", "Solo"];
    let goals = ["Expert", "Leader", "Entrepreneur"];
    let budgets = ["Low", "Medium", "High"];

    let mut csv = String::from("favorite_subject,location,study_approach,learning_env,future_goals,budget,target\n");
    for i in 0..48usize {
        let major = i % 4;
        let subject = if i % 5 == 0 { subjects[4] } else { subjects[major] };
        let budget = if i % 11 == 3 { "" } else { budgets[(i / 5) % 3] };
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            subject,
            locations[i % 3],
            approaches[(i / 4 + major) % 3],
            envs[(i / 3) % 2],
            goals[(i / 2) % 3],
            budget,
            MAJORS[major]
        ));
    }
    for major in MAJORS {
        for _ in 0..4 {
            let values: Vec<&str> = PROFILE.iter().map(|(_, v)| *v).collect();
            csv.push_str(&format!("{},{}\n", values.join(","), major));
        }
    }
    csv
}

pub fn training_dataset() -> Dataset {
    Dataset::from_reader(training_csv().as_bytes(), &FeatureSchema::core(), DEFAULT_PLACEHOLDER)
        .expect("fixture dataset loads")
}

/// A recommender fit on every fixture row, without a held-out split.
pub fn fitted_recommender() -> Recommender {
    let encoded = training_dataset().fit_encoders().expect("fixture encodes");
    let forest = ForestBuilder::new()
        .with_n_estimators(30)
        .expect("non-zero trees")
        .with_max_features(MaxFeatures::Sqrt)
        .with_seed(7)
        .fit(encoded.x.view(), &encoded.y, encoded.encoders.num_classes())
        .expect("forest fits");
    Recommender::new(forest, encoded.encoders).expect("pair is compatible")
}
