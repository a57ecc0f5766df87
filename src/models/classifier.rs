use serde::{Deserialize, Serialize};

use super::{Artifact, ModelError, Result, check_columns, check_finite};
use crate::features::FeatureValue;
use crate::features::classification::{COLUMNS, ClassificationFeatures};

/// Columns the classifier receives as category labels rather than numbers.
pub const CATEGORICAL_COLUMNS: [&str; 1] = ["language"];

const NAME: &str = "classifier";

/// sklearn marks leaves with this child index.
const TREE_LEAF: i64 = -1;

fn default_threshold() -> f64 {
    0.5
}

/// Binary flop classifier plus the column encoding it was trained behind.
#[derive(Debug, Deserialize)]
pub struct FlopClassifier {
    input_columns: Vec<String>,
    #[serde(default)]
    categories: Vec<CategoryEncoding>,
    /// Class 1 is predicted when P(flop) exceeds this.
    #[serde(default = "default_threshold")]
    decision_threshold: f64,
    model: ClassifierModel,
}

/// One-hot encoding of a categorical column. Unlisted values encode as all zeros.
#[derive(Debug, Deserialize)]
pub struct CategoryEncoding {
    pub column: String,
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    RandomForest {
        n_features: usize,
        trees: Vec<DecisionTree>,
    },
    LogisticRegression {
        coefficients: Vec<f64>,
        intercept: f64,
    },
}

/// A fitted binary decision tree in parallel-array form.
/// Node 0 is the root; a node is a leaf when `children_left[i] == -1`.
#[derive(Debug, Deserialize)]
pub struct DecisionTree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    /// Per-node class weights `[not_flop, flop]`.
    value: Vec<[f64; 2]>,
}

/// Shape of a loaded classifier, for the `models` listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierSummary {
    pub kind: &'static str,
    /// Forest size; `None` for logistic regression.
    pub trees: Option<usize>,
    pub input_columns: usize,
    pub encoded_width: usize,
    pub decision_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlopPrediction {
    /// P(flop), in [0, 1].
    pub probability: f64,
    /// 1 = flop, 0 = performs well.
    pub label: u8,
}

impl FlopPrediction {
    pub fn is_flop(&self) -> bool {
        self.label == 1
    }

    pub fn verdict(&self) -> &'static str {
        if self.is_flop() {
            "High Risk of Flop"
        } else {
            "Likely to Perform Well"
        }
    }
}

impl Artifact for FlopClassifier {
    const NAME: &'static str = NAME;

    fn validate(&self) -> Result<()> {
        check_columns(NAME, &COLUMNS, &self.input_columns)?;

        let mut declared: Vec<&str> = self.categories.iter().map(|c| c.column.as_str()).collect();
        declared.sort_unstable();
        let mut wanted = CATEGORICAL_COLUMNS.to_vec();
        wanted.sort_unstable();
        if declared != wanted {
            return Err(ModelError::Shape {
                artifact: NAME,
                message: format!(
                    "categorical encodings {:?} do not match categorical columns {:?}",
                    declared, wanted
                ),
            });
        }
        if let Some(empty) = self.categories.iter().find(|c| c.values.is_empty()) {
            return Err(ModelError::Shape {
                artifact: NAME,
                message: format!("categorical column {} has no values", empty.column),
            });
        }
        for encoding in &self.categories {
            for (i, value) in encoding.values.iter().enumerate() {
                if encoding.values[..i].contains(value) {
                    return Err(ModelError::Shape {
                        artifact: NAME,
                        message: format!(
                            "categorical column {} lists {:?} more than once",
                            encoding.column, value
                        ),
                    });
                }
            }
        }

        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(ModelError::InvalidValue {
                artifact: NAME,
                message: format!("decision_threshold {} is outside [0, 1]", self.decision_threshold),
            });
        }

        let width = self.encoded_width();
        match &self.model {
            ClassifierModel::RandomForest { n_features, trees } => {
                if *n_features != width {
                    return Err(ModelError::Shape {
                        artifact: NAME,
                        message: format!(
                            "forest expects {} features but the encoding produces {}",
                            n_features, width
                        ),
                    });
                }
                if trees.is_empty() {
                    return Err(ModelError::Shape {
                        artifact: NAME,
                        message: "forest has no trees".to_string(),
                    });
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(width).map_err(|message| ModelError::Shape {
                        artifact: NAME,
                        message: format!("tree {}: {}", i, message),
                    })?;
                }
            }
            ClassifierModel::LogisticRegression {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != width {
                    return Err(ModelError::Shape {
                        artifact: NAME,
                        message: format!(
                            "{} coefficients but the encoding produces {} features",
                            coefficients.len(),
                            width
                        ),
                    });
                }
                check_finite(NAME, "coefficients", coefficients)?;
                check_finite(NAME, "intercept", &[*intercept])?;
            }
        }
        Ok(())
    }
}

impl FlopClassifier {
    /// Number of model inputs after one-hot expansion.
    pub fn encoded_width(&self) -> usize {
        let numeric = self
            .input_columns
            .iter()
            .filter(|c| !CATEGORICAL_COLUMNS.contains(&c.as_str()))
            .count();
        let one_hot: usize = self.categories.iter().map(|c| c.values.len()).sum();
        numeric + one_hot
    }

    pub fn decision_threshold(&self) -> f64 {
        self.decision_threshold
    }

    /// Numeric columns in input order, followed by one one-hot block per categorical column.
    pub fn encode(&self, features: &ClassificationFeatures) -> Vec<f64> {
        let cells = features.cells();
        let mut encoded = Vec::with_capacity(self.encoded_width());

        for (_, value) in &cells {
            if let FeatureValue::Number(v) = value {
                encoded.push(*v);
            }
        }

        for encoding in &self.categories {
            let label = cells.iter().find_map(|(name, value)| match value {
                FeatureValue::Category(s) if *name == encoding.column => Some(*s),
                _ => None,
            });
            let hit = label.and_then(|l| encoding.values.iter().position(|v| v == l));
            if hit.is_none() {
                log::warn!(
                    "{} value {:?} was not seen in training, encoding as all zeros",
                    encoding.column,
                    label
                );
            }
            encoded.extend((0..encoding.values.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
        }

        encoded
    }

    /// Probability of the flop class for one record.
    pub fn predict_proba(&self, features: &ClassificationFeatures) -> f64 {
        let x = self.encode(features);
        let p = match &self.model {
            ClassifierModel::RandomForest { trees, .. } => {
                let total: f64 = trees.iter().map(|t| t.predict_proba(&x)).sum();
                total / trees.len() as f64
            }
            ClassifierModel::LogisticRegression {
                coefficients,
                intercept,
            } => {
                let z: f64 = coefficients.iter().zip(&x).map(|(w, v)| w * v).sum::<f64>() + intercept;
                sigmoid(z)
            }
        };
        p.clamp(0.0, 1.0)
    }

    pub fn predict(&self, features: &ClassificationFeatures) -> FlopPrediction {
        let probability = self.predict_proba(features);
        // Ties go to class 0, the same as argmax over [p0, p1].
        let label = u8::from(probability > self.decision_threshold);
        log::debug!("flop probability {:.4} → label {}", probability, label);
        FlopPrediction { probability, label }
    }

    pub fn summary(&self) -> ClassifierSummary {
        let (kind, trees) = match &self.model {
            ClassifierModel::RandomForest { trees, .. } => ("random_forest", Some(trees.len())),
            ClassifierModel::LogisticRegression { .. } => ("logistic_regression", None),
        };
        ClassifierSummary {
            kind,
            trees,
            input_columns: self.input_columns.len(),
            encoded_width: self.encoded_width(),
            decision_threshold: self.decision_threshold,
        }
    }

    pub fn describe(&self) -> String {
        let s = self.summary();
        let kind = match s.trees {
            Some(n) => format!("random forest, {} trees", n),
            None => "logistic regression".to_string(),
        };
        format!(
            "flop classifier: {} over {} columns ({} encoded), threshold {}",
            kind, s.input_columns, s.encoded_width, s.decision_threshold
        )
    }
}

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, width: usize) -> std::result::Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("node arrays have different lengths".to_string());
        }

        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left == TREE_LEAF {
                if right != TREE_LEAF {
                    return Err(format!("node {} has a right child but no left child", i));
                }
                let [w0, w1] = self.value[i];
                if !(w0.is_finite() && w1.is_finite()) || w0 < 0.0 || w1 < 0.0 || w0 + w1 <= 0.0 {
                    return Err(format!("leaf {} has invalid class weights {:?}", i, self.value[i]));
                }
                continue;
            }

            // Children always follow their parent, so descent terminates.
            for child in [left, right] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {} has out-of-order child {}", i, child));
                }
            }
            let feature = self.feature[i];
            if feature < 0 || feature as usize >= width {
                return Err(format!("node {} splits on feature {} of {}", i, feature, width));
            }
            if !self.threshold[i].is_finite() {
                return Err(format!("node {} has a non-finite threshold", i));
            }
        }
        Ok(())
    }

    /// Share of class-1 weight in the leaf `x` lands in. `x <= threshold` goes left.
    fn predict_proba(&self, x: &[f64]) -> f64 {
        let mut node = 0usize;
        while self.children_left[node] != TREE_LEAF {
            let f = self.feature[node] as usize;
            node = if x[f] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        let [w0, w1] = self.value[node];
        w1 / (w0 + w1)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Language, SongInput};
    use crate::models::fixtures;

    fn features(f: impl FnOnce(&mut SongInput)) -> ClassificationFeatures {
        let mut s = SongInput::default();
        f(&mut s);
        ClassificationFeatures::from_input(&s)
    }

    fn columns_json() -> String {
        serde_json::to_string(&COLUMNS).unwrap()
    }

    fn logistic_json(coefficients: &[f64], intercept: f64, threshold: f64) -> String {
        format!(
            r#"{{
                "input_columns": {},
                "categories": [{{"column": "language", "values": ["English", "Korean"]}}],
                "decision_threshold": {},
                "model": {{"kind": "logistic_regression", "coefficients": {:?}, "intercept": {}}}
            }}"#,
            columns_json(),
            threshold,
            coefficients,
            intercept
        )
    }

    #[test]
    fn fixture_forest_default_song() {
        let clf = FlopClassifier::from_json(fixtures::CLASSIFIER).unwrap();
        let pred = clf.predict(&features(|_| {}));
        // Leaves: 0.3, 0.2, 0.4
        assert!((pred.probability - 0.3).abs() < 1e-12);
        assert_eq!(pred.label, 0);
        assert_eq!(pred.verdict(), "Likely to Perform Well");
    }

    #[test]
    fn fixture_forest_spoken_word_song() {
        let clf = FlopClassifier::from_json(fixtures::CLASSIFIER).unwrap();
        let pred = clf.predict(&features(|s| {
            s.speechiness = 0.9;
            s.year = 1995;
            s.language = Language::Unknown;
        }));
        // Leaves: 0.9, 0.7, 0.8
        assert!((pred.probability - 0.8).abs() < 1e-12);
        assert!(pred.is_flop());
        assert_eq!(pred.verdict(), "High Risk of Flop");
    }

    #[test]
    fn split_goes_left_on_equal_threshold() {
        let clf = FlopClassifier::from_json(fixtures::CLASSIFIER).unwrap();
        // speechiness exactly at 0.5 stays on the left branch of tree 0;
        // energy_loudness = 0.5 * -30 = -15 also sits on its threshold.
        let pred = clf.predict(&features(|s| {
            s.speechiness = 0.5;
            s.loudness = -30.0;
        }));
        // Leaves: 0.8, 0.2, 0.4
        assert!((pred.probability - 1.4 / 3.0).abs() < 1e-12);
        assert_eq!(pred.label, 0);
    }

    #[test]
    fn one_hot_encoding_layout() {
        let clf = FlopClassifier::from_json(fixtures::CLASSIFIER).unwrap();
        let x = clf.encode(&features(|s| s.language = Language::Korean));
        assert_eq!(x.len(), 23);
        assert_eq!(x[2], 180_000.0);
        assert_eq!(x[9], 2020.0);
        assert_eq!(&x[16..], &[0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn unseen_category_encodes_as_zeros() {
        let clf = FlopClassifier::from_json(&logistic_json(&[0.0; 18], 0.0, 0.5)).unwrap();
        let x = clf.encode(&features(|s| s.language = Language::Tamil));
        assert_eq!(x.len(), 18);
        assert_eq!(&x[16..], &[0.0, 0.0]);
    }

    #[test]
    fn logistic_regression_probability() {
        let mut coefficients = [0.0; 18];
        coefficients[3] = 2.0; // energy
        coefficients[17] = 1.0; // Korean
        let clf = FlopClassifier::from_json(&logistic_json(&coefficients, -1.0, 0.5)).unwrap();

        let pred = clf.predict(&features(|s| s.energy = 0.5));
        assert!((pred.probability - 0.5).abs() < 1e-12);
        assert_eq!(pred.label, 0, "probability equal to threshold is not a flop");

        let pred = clf.predict(&features(|s| {
            s.energy = 0.5;
            s.language = Language::Korean;
        }));
        assert!((pred.probability - sigmoid(1.0)).abs() < 1e-12);
        assert_eq!(pred.label, 1);
    }

    #[test]
    fn custom_threshold_moves_label() {
        let clf = FlopClassifier::from_json(&logistic_json(&[0.0; 18], 0.0, 0.4)).unwrap();
        let pred = clf.predict(&features(|_| {}));
        assert_eq!(pred.probability, 0.5);
        assert_eq!(pred.label, 1);
        assert_eq!(clf.decision_threshold(), 0.4);
    }

    #[test]
    fn probability_stays_in_unit_interval() {
        let clf = FlopClassifier::from_json(&logistic_json(&[1e3; 18], 1e3, 0.5)).unwrap();
        let p = clf.predict_proba(&features(|_| {}));
        assert!((0.0..=1.0).contains(&p));
        let clf = FlopClassifier::from_json(&logistic_json(&[-1e3; 18], -1e3, 0.5)).unwrap();
        let p = clf.predict_proba(&features(|_| {}));
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn reordered_columns_rejected() {
        let mut cols: Vec<&str> = COLUMNS.to_vec();
        cols.swap(0, 1);
        let json = logistic_json(&[0.0; 18], 0.0, 0.5)
            .replacen(&columns_json(), &serde_json::to_string(&cols).unwrap(), 1);
        let err = FlopClassifier::from_json(&json).unwrap_err();
        assert!(matches!(err, ModelError::SchemaMismatch { artifact: "classifier", .. }));
    }

    #[test]
    fn width_mismatch_rejected() {
        let err = FlopClassifier::from_json(&logistic_json(&[0.0; 17], 0.0, 0.5)).unwrap_err();
        assert!(matches!(err, ModelError::Shape { .. }));
    }

    #[test]
    fn missing_language_encoding_rejected() {
        let json = format!(
            r#"{{"input_columns": {}, "model": {{"kind": "logistic_regression", "coefficients": {:?}, "intercept": 0.0}}}}"#,
            columns_json(),
            [0.0; 16]
        );
        let err = FlopClassifier::from_json(&json).unwrap_err();
        assert!(matches!(err, ModelError::Shape { .. }));
    }

    #[test]
    fn duplicate_category_value_rejected() {
        let json = logistic_json(&[0.0; 18], 0.0, 0.5)
            .replacen(r#"["English", "Korean"]"#, r#"["Korean", "Korean"]"#, 1);
        let err = FlopClassifier::from_json(&json).unwrap_err();
        assert!(matches!(err, ModelError::Shape { artifact: "classifier", .. }));
        assert!(err.to_string().contains("\"Korean\" more than once"));
    }

    #[test]
    fn threshold_outside_unit_interval_rejected() {
        let err = FlopClassifier::from_json(&logistic_json(&[0.0; 18], 0.0, 1.5)).unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { .. }));
    }

    fn single_tree(tree: &str) -> String {
        format!(
            r#"{{
                "input_columns": {},
                "categories": [{{"column": "language", "values": ["English"]}}],
                "model": {{"kind": "random_forest", "n_features": 17, "trees": [{}]}}
            }}"#,
            columns_json(),
            tree
        )
    }

    #[test]
    fn tree_with_backward_child_rejected() {
        let json = single_tree(
            r#"{"children_left": [1, 0], "children_right": [1, -1], "feature": [0, -2],
                "threshold": [0.5, -2.0], "value": [[1, 1], [1, 0]]}"#,
        );
        let err = FlopClassifier::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("tree 0"));
    }

    #[test]
    fn tree_with_feature_out_of_range_rejected() {
        let json = single_tree(
            r#"{"children_left": [1, -1, -1], "children_right": [2, -1, -1], "feature": [17, -2, -2],
                "threshold": [0.5, -2.0, -2.0], "value": [[2, 2], [1, 1], [1, 1]]}"#,
        );
        assert!(FlopClassifier::from_json(&json).is_err());
    }

    #[test]
    fn tree_with_empty_leaf_rejected() {
        let json = single_tree(
            r#"{"children_left": [-1], "children_right": [-1], "feature": [-2],
                "threshold": [-2.0], "value": [[0, 0]]}"#,
        );
        assert!(FlopClassifier::from_json(&json).is_err());
    }

    #[test]
    fn single_leaf_tree_is_constant() {
        let json = single_tree(
            r#"{"children_left": [-1], "children_right": [-1], "feature": [-2],
                "threshold": [-2.0], "value": [[1, 3]]}"#,
        );
        let clf = FlopClassifier::from_json(&json).unwrap();
        assert!((clf.predict_proba(&features(|_| {})) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn summary_of_fixture_forest() {
        let clf = FlopClassifier::from_json(fixtures::CLASSIFIER).unwrap();
        let s = clf.summary();
        assert_eq!(s.kind, "random_forest");
        assert_eq!(s.trees, Some(3));
        assert_eq!(s.input_columns, 17);
        assert_eq!(s.encoded_width, 23);
        assert_eq!(s.decision_threshold, 0.5);

        let clf = FlopClassifier::from_json(&logistic_json(&[0.0; 18], 0.0, 0.5)).unwrap();
        assert_eq!(clf.summary().trees, None);
    }

    #[test]
    fn describe_mentions_forest() {
        let clf = FlopClassifier::from_json(fixtures::CLASSIFIER).unwrap();
        let d = clf.describe();
        assert!(d.contains("random forest, 3 trees"));
        assert!(d.contains("23 encoded"));
    }
}
