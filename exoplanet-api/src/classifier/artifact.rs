//! JSON Model Artifact
//!
//! Fitted estimators exported from the training side as plain JSON.
//! Trees use the array layout of a fitted CART tree: node `i` is a leaf
//! when `children_left[i] == -1`, otherwise rows with
//! `x[feature[i]] <= threshold[i]` go left.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Classifier, ModelError};

const LEAF: i64 = -1;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Serialized model as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub model_type: Option<String>,

    /// Training column order, if the exporter recorded it
    #[serde(default)]
    pub feature_names_in: Option<Vec<String>>,

    /// Class attached to each output index
    pub classes: Vec<Value>,

    pub estimator: Estimator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    DecisionTree {
        tree: Tree,
    },
    RandomForest {
        trees: Vec<Tree>,
    },
    /// One-vs-rest linear decision function. A single coefficient row is
    /// the binary case.
    LogisticRegression {
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights
    pub value: Vec<Vec<f64>>,
}

impl Tree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    /// Check internal consistency and return the input width the tree reads
    fn validate(&self, n_classes: usize) -> Result<usize, ModelError> {
        let n = self.node_count();
        if n == 0 {
            return Err(ModelError::Invalid("tree has no nodes".to_string()));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(ModelError::Invalid(format!(
                "tree arrays disagree on node count (expected {})",
                n
            )));
        }

        let mut width = 0usize;
        for node in 0..n {
            let left = self.children_left[node];
            let right = self.children_right[node];

            if left == LEAF {
                if self.value[node].len() != n_classes {
                    return Err(ModelError::Invalid(format!(
                        "leaf {} has {} class weights, expected {}",
                        node,
                        self.value[node].len(),
                        n_classes
                    )));
                }
                continue;
            }

            // Children always come after their parent in CART layout
            for child in [left, right] {
                if child <= node as i64 || child as usize >= n {
                    return Err(ModelError::Invalid(format!(
                        "node {} has out-of-range child {}",
                        node, child
                    )));
                }
            }

            let feature = self.feature[node];
            if feature < 0 {
                return Err(ModelError::Invalid(format!(
                    "split node {} has negative feature index",
                    node
                )));
            }
            width = width.max(feature as usize + 1);
        }

        Ok(width)
    }

    /// Normalized class distribution of the leaf this row falls into
    fn leaf_distribution(&self, row: &[f64]) -> Vec<f64> {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let weights = &self.value[node];
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            weights.iter().map(|w| w / total).collect()
        } else {
            weights.clone()
        }
    }
}

// ============================================================================
// LOADED MODEL
// ============================================================================

/// A validated artifact ready for inference
#[derive(Debug, Clone)]
pub struct LoadedModel {
    artifact: ModelArtifact,
    input_width: usize,
}

impl LoadedModel {
    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let artifact: ModelArtifact = serde_json::from_str(raw)?;
        Self::new(artifact)
    }

    pub fn new(artifact: ModelArtifact) -> Result<Self, ModelError> {
        let n_classes = artifact.classes.len();
        if n_classes == 0 {
            return Err(ModelError::Invalid("no classes".to_string()));
        }

        let input_width = match &artifact.estimator {
            Estimator::DecisionTree { tree } => tree.validate(n_classes)?,
            Estimator::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(ModelError::Invalid("forest has no trees".to_string()));
                }
                let mut width = 0;
                for tree in trees {
                    width = width.max(tree.validate(n_classes)?);
                }
                width
            }
            Estimator::LogisticRegression { coef, intercept } => {
                validate_linear(coef, intercept, n_classes)?
            }
        };

        if let Some(names) = &artifact.feature_names_in {
            if names.len() < input_width {
                return Err(ModelError::Invalid(format!(
                    "model reads {} features but names only {}",
                    input_width,
                    names.len()
                )));
            }
        }

        Ok(Self { artifact, input_width })
    }

    /// Index into `classes` of the winning output
    fn predict_index(&self, row: &[f64]) -> usize {
        match &self.artifact.estimator {
            Estimator::DecisionTree { tree } => argmax(&tree.leaf_distribution(row)),
            Estimator::RandomForest { trees } => {
                let mut proba = vec![0.0; self.artifact.classes.len()];
                for tree in trees {
                    for (acc, p) in proba.iter_mut().zip(tree.leaf_distribution(row)) {
                        *acc += p;
                    }
                }
                argmax(&proba)
            }
            Estimator::LogisticRegression { coef, intercept } => {
                let scores: Vec<f64> = coef
                    .iter()
                    .zip(intercept)
                    .map(|(w, b)| b + w.iter().zip(row).map(|(w, x)| w * x).sum::<f64>())
                    .collect();

                if scores.len() == 1 {
                    usize::from(scores[0] > 0.0)
                } else {
                    argmax(&scores)
                }
            }
        }
    }
}

impl Classifier for LoadedModel {
    fn feature_names(&self) -> Option<&[String]> {
        self.artifact.feature_names_in.as_deref()
    }

    fn predict(&self, row: &[f64]) -> Result<Value, ModelError> {
        if row.len() < self.input_width {
            return Err(ModelError::Inference(format!(
                "model expects {} features, got {}",
                self.input_width,
                row.len()
            )));
        }

        let index = self.predict_index(row);
        self.artifact
            .classes
            .get(index)
            .cloned()
            .ok_or_else(|| ModelError::Inference(format!("no class at output index {}", index)))
    }

    fn describe(&self) -> String {
        let kind = match &self.artifact.estimator {
            Estimator::DecisionTree { .. } => "decision_tree".to_string(),
            Estimator::RandomForest { trees } => format!("random_forest[{} trees]", trees.len()),
            Estimator::LogisticRegression { .. } => "logistic_regression".to_string(),
        };
        match &self.artifact.model_type {
            Some(name) => format!("{} ({}, {} classes)", name, kind, self.artifact.classes.len()),
            None => format!("{} ({} classes)", kind, self.artifact.classes.len()),
        }
    }
}

fn validate_linear(coef: &[Vec<f64>], intercept: &[f64], n_classes: usize) -> Result<usize, ModelError> {
    if coef.is_empty() || coef.len() != intercept.len() {
        return Err(ModelError::Invalid(format!(
            "{} coefficient rows for {} intercepts",
            coef.len(),
            intercept.len()
        )));
    }

    let binary = coef.len() == 1 && n_classes == 2;
    if !binary && coef.len() != n_classes {
        return Err(ModelError::Invalid(format!(
            "{} coefficient rows for {} classes",
            coef.len(),
            n_classes
        )));
    }

    let width = coef[0].len();
    if coef.iter().any(|row| row.len() != width) {
        return Err(ModelError::Invalid("ragged coefficient matrix".to_string()));
    }
    Ok(width)
}

/// First index of the maximum, like numpy's argmax
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// depth <= 100 → class 0, else period <= 5 → class 1, else class 2
    fn two_level_tree() -> Tree {
        Tree {
            children_left: vec![1, -1, 3, -1, -1],
            children_right: vec![2, -1, 4, -1, -1],
            feature: vec![1, -2, 0, -2, -2],
            threshold: vec![100.0, -2.0, 5.0, -2.0, -2.0],
            value: vec![
                vec![10.0, 10.0, 10.0],
                vec![10.0, 0.0, 0.0],
                vec![0.0, 10.0, 10.0],
                vec![0.0, 10.0, 0.0],
                vec![0.0, 0.0, 10.0],
            ],
        }
    }

    fn tree_model(classes: Vec<Value>) -> LoadedModel {
        LoadedModel::new(ModelArtifact {
            model_type: None,
            feature_names_in: Some(vec!["period".to_string(), "depth".to_string()]),
            classes,
            estimator: Estimator::DecisionTree { tree: two_level_tree() },
        })
        .unwrap()
    }

    #[test]
    fn test_decision_tree_paths() {
        let model = tree_model(vec![json!(0), json!(1), json!(2)]);

        assert_eq!(model.predict(&[3.0, 50.0]).unwrap(), json!(0));
        assert_eq!(model.predict(&[3.0, 500.0]).unwrap(), json!(1));
        assert_eq!(model.predict(&[30.0, 500.0]).unwrap(), json!(2));
        // Threshold is inclusive on the left
        assert_eq!(model.predict(&[5.0, 100.0]).unwrap(), json!(0));
    }

    #[test]
    fn test_classes_returned_verbatim() {
        let model = tree_model(vec![json!("0"), json!([1]), json!({"value": 2})]);
        assert_eq!(model.predict(&[3.0, 500.0]).unwrap(), json!([1]));
        assert_eq!(model.predict(&[30.0, 500.0]).unwrap(), json!({"value": 2}));
    }

    #[test]
    fn test_short_row_rejected() {
        let model = tree_model(vec![json!(0), json!(1), json!(2)]);
        let err = model.predict(&[1.0]).unwrap_err();
        assert!(matches!(err, ModelError::Inference(_)));
    }

    #[test]
    fn test_random_forest_averages_probabilities() {
        let stump = |left: Vec<f64>, right: Vec<f64>| Tree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![0.5, -2.0, -2.0],
            value: vec![vec![1.0, 1.0], left, right],
        };

        // Tree A is confident, trees B and C lean weakly the other way
        let model = LoadedModel::new(ModelArtifact {
            model_type: Some("rf".to_string()),
            feature_names_in: None,
            classes: vec![json!(0), json!(1)],
            estimator: Estimator::RandomForest {
                trees: vec![
                    stump(vec![100.0, 0.0], vec![0.0, 1.0]),
                    stump(vec![4.0, 6.0], vec![1.0, 0.0]),
                    stump(vec![4.0, 6.0], vec![1.0, 0.0]),
                ],
            },
        })
        .unwrap();

        // mean([1.0, 0.4, 0.4]) = 0.6 for class 0
        assert_eq!(model.predict(&[0.0]).unwrap(), json!(0));
        // mean([0.0, 1.0, 1.0]) for class 0
        assert_eq!(model.predict(&[1.0]).unwrap(), json!(0));
        assert!(model.describe().contains("random_forest[3 trees]"));
    }

    #[test]
    fn test_logistic_regression_binary_and_multiclass() {
        let binary = LoadedModel::new(ModelArtifact {
            model_type: None,
            feature_names_in: None,
            classes: vec![json!(0), json!(1)],
            estimator: Estimator::LogisticRegression {
                coef: vec![vec![1.0, -1.0]],
                intercept: vec![0.0],
            },
        })
        .unwrap();
        assert_eq!(binary.predict(&[2.0, 1.0]).unwrap(), json!(1));
        assert_eq!(binary.predict(&[1.0, 2.0]).unwrap(), json!(0));

        let multi = LoadedModel::new(ModelArtifact {
            model_type: None,
            feature_names_in: None,
            classes: vec![json!(0), json!(1), json!(2)],
            estimator: Estimator::LogisticRegression {
                coef: vec![vec![0.0], vec![1.0], vec![-1.0]],
                intercept: vec![0.5, 0.0, 0.0],
            },
        })
        .unwrap();
        assert_eq!(multi.predict(&[2.0]).unwrap(), json!(1));
        assert_eq!(multi.predict(&[-2.0]).unwrap(), json!(2));
        assert_eq!(multi.predict(&[0.0]).unwrap(), json!(0));
    }

    #[test]
    fn test_validation_errors() {
        let mut tree = two_level_tree();
        tree.threshold.pop();
        let err = LoadedModel::new(ModelArtifact {
            model_type: None,
            feature_names_in: None,
            classes: vec![json!(0), json!(1), json!(2)],
            estimator: Estimator::DecisionTree { tree },
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::Invalid(_)));

        // Leaf width must match the class count
        let err = LoadedModel::new(ModelArtifact {
            model_type: None,
            feature_names_in: None,
            classes: vec![json!(0), json!(1)],
            estimator: Estimator::DecisionTree { tree: two_level_tree() },
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::Invalid(_)));

        // Names must cover every feature the tree reads
        let err = LoadedModel::new(ModelArtifact {
            model_type: None,
            feature_names_in: Some(vec!["period".to_string()]),
            classes: vec![json!(0), json!(1), json!(2)],
            estimator: Estimator::DecisionTree { tree: two_level_tree() },
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::Invalid(_)));

        let err = LoadedModel::new(ModelArtifact {
            model_type: None,
            feature_names_in: None,
            classes: vec![json!(0), json!(1), json!(2)],
            estimator: Estimator::LogisticRegression {
                coef: vec![vec![1.0], vec![1.0]],
                intercept: vec![0.0, 0.0],
            },
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::Invalid(_)));
    }

    #[test]
    fn test_artifact_json_shape() {
        let model = LoadedModel::from_json(
            r#"{
                "classes": [0, 1],
                "estimator": { "kind": "logistic_regression", "coef": [[2.0]], "intercept": [-1.0] }
            }"#,
        )
        .unwrap();
        assert!(model.feature_names().is_none());
        assert_eq!(model.describe(), "logistic_regression (2 classes)");
        assert_eq!(model.predict(&[1.0]).unwrap(), json!(1));
    }
}
