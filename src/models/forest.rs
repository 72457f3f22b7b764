//! Random-forest classifier loaded from a JSON artifact.
//!
//! Each tree is a flat node array with node 0 as the root. Every node stores
//! the fraud-class probability of the training samples that reached it, which
//! lets the same structure serve both scoring (mean leaf value over trees) and
//! path attribution: every split on a row's path credits the change in node
//! value to the split feature. Per tree, root value plus credited changes
//! equals the leaf value, so the forest's mean root value plus the averaged
//! contributions reproduces the predicted probability.

use crate::error::{Result, ScoringError};
use crate::models::{AttributionEngine, ModelScore, ScoringModel};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A tree node. Leaves have no `feature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Feature index to split on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<usize>,

    /// Split threshold; `x[feature] <= threshold` goes left
    #[serde(default)]
    pub threshold: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<usize>,

    /// Fraud-class probability at this node
    pub value: f64,
}

impl Node {
    /// Create a split node
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize, value: f64) -> Self {
        Self {
            feature: Some(feature),
            threshold,
            left: Some(left),
            right: Some(right),
            value,
        }
    }

    /// Create a leaf node
    pub fn leaf(value: f64) -> Self {
        Self {
            feature: None,
            threshold: 0.0,
            left: None,
            right: None,
            value,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature.is_none()
    }
}

/// A single decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Walk from the root to a leaf, crediting value changes to split
    /// features in `contributions`. Returns the leaf value.
    ///
    /// The tree must have passed [`DecisionTree::validate`].
    fn walk(&self, features: &[f64], mut contributions: Option<&mut [f64]>) -> f64 {
        let mut node = &self.nodes[0];
        while let (Some(feature), Some(left), Some(right)) = (node.feature, node.left, node.right) {
            let next = if features[feature] <= node.threshold {
                &self.nodes[left]
            } else {
                &self.nodes[right]
            };
            if let Some(contributions) = contributions.as_deref_mut() {
                contributions[feature] += next.value - node.value;
            }
            node = next;
        }
        node.value
    }

    /// Evaluate this tree on a feature vector
    fn evaluate(&self, features: &[f64]) -> f64 {
        self.walk(features, None)
    }

    fn root_value(&self) -> f64 {
        self.nodes[0].value
    }

    /// Validate tree structure against the feature count
    pub fn validate(&self, feature_count: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if !node.value.is_finite() || !(0.0..=1.0).contains(&node.value) {
                return Err(format!("Node {} has value outside [0, 1]: {}", i, node.value));
            }
            let Some(feature) = node.feature else {
                continue;
            };
            if feature >= feature_count {
                return Err(format!("Node {} splits on unknown feature {}", i, feature));
            }
            if !node.threshold.is_finite() {
                return Err(format!("Node {} has a non-finite threshold", i));
            }
            // children after their parent rules out cycles
            for (side, child) in [("left", node.left), ("right", node.right)] {
                match child {
                    Some(c) if c > i && c < self.nodes.len() => {}
                    _ => return Err(format!("Node {} has invalid {} child: {:?}", i, side, child)),
                }
            }
        }

        Ok(())
    }
}

/// Ensemble of decision trees voting by averaged class probability.
///
/// Every constructor, serde included, validates the trees against the
/// feature count, so scoring never indexes outside a row or node array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawForest")]
pub struct RandomForest {
    /// Feature columns in the order the trees index them
    feature_names: Vec<String>,
    trees: Vec<DecisionTree>,
}

/// Unvalidated wire form of [`RandomForest`]
#[derive(Deserialize)]
struct RawForest {
    feature_names: Vec<String>,
    trees: Vec<DecisionTree>,
}

impl TryFrom<RawForest> for RandomForest {
    type Error = String;

    fn try_from(raw: RawForest) -> std::result::Result<Self, String> {
        let forest = Self {
            feature_names: raw.feature_names,
            trees: raw.trees,
        };
        forest.check_trees()?;
        Ok(forest)
    }
}

impl RandomForest {
    /// Build and validate a forest
    pub fn new(feature_names: Vec<String>, trees: Vec<DecisionTree>) -> Result<Self> {
        let forest = Self {
            feature_names,
            trees,
        };
        forest.check_trees().map_err(ScoringError::Artifact)?;
        Ok(forest)
    }

    /// Load a forest artifact from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(ScoringError::from_artifact_json)
    }

    fn check_trees(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_names.len())
                .map_err(|e| format!("Tree {} validation failed: {}", i, e))?;
        }
        Ok(())
    }

    /// Feature columns in the order the trees index them
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Mean root value, the score of a row before any split is applied
    pub fn bias(&self) -> f64 {
        self.trees.iter().map(DecisionTree::root_value).sum::<f64>() / self.trees.len() as f64
    }

    /// Fraud probability of a single row
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        total / self.trees.len() as f64
    }

    /// Per-feature contributions of a single row
    pub fn contributions(&self, features: &[f64]) -> Vec<f64> {
        let mut contributions = vec![0.0; self.feature_names.len()];
        for tree in &self.trees {
            tree.walk(features, Some(contributions.as_mut_slice()));
        }
        let n = self.trees.len() as f64;
        contributions.iter_mut().for_each(|c| *c /= n);
        contributions
    }

    fn check_width(&self, features: &[Vec<f64>]) -> Result<()> {
        let expected = self.feature_names.len();
        match features.iter().position(|row| row.len() != expected) {
            Some(i) => Err(ScoringError::Model(format!(
                "row {} has {} features, forest expects {}",
                i,
                features[i].len(),
                expected
            ))),
            None => Ok(()),
        }
    }
}

impl ScoringModel for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<ModelScore>> {
        self.check_width(features)?;
        Ok(features
            .iter()
            .map(|row| {
                let probability = self.predict_proba(row);
                let label = u8::from(probability > 0.5);
                ModelScore::new(label, probability)
            })
            .collect())
    }
}

impl AttributionEngine for RandomForest {
    fn explain_batch(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.check_width(features)?;
        Ok(features.iter().map(|row| self.contributions(row)).collect())
    }
}
