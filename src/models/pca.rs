use serde::Deserialize;

use super::{Artifact, ModelError, Result, check_finite};

const NAME: &str = "projector";

/// Fitted linear projection (PCA): `(x - mean) · componentsᵀ`,
/// optionally whitened by `sqrt(explained_variance)`.
#[derive(Debug, Deserialize)]
pub struct Projector {
    mean: Vec<f64>,
    /// One row per output dimension, each as wide as `mean`.
    components: Vec<Vec<f64>>,
    #[serde(default)]
    explained_variance: Option<Vec<f64>>,
    #[serde(default)]
    whiten: bool,
}

impl Artifact for Projector {
    const NAME: &'static str = NAME;

    fn validate(&self) -> Result<()> {
        if self.mean.is_empty() || self.components.is_empty() {
            return Err(ModelError::Shape {
                artifact: NAME,
                message: "mean and components must be non-empty".to_string(),
            });
        }
        check_finite(NAME, "mean", &self.mean)?;
        for (i, row) in self.components.iter().enumerate() {
            if row.len() != self.mean.len() {
                return Err(ModelError::Shape {
                    artifact: NAME,
                    message: format!(
                        "component {} has {} weights, expected {}",
                        i,
                        row.len(),
                        self.mean.len()
                    ),
                });
            }
            check_finite(NAME, &format!("components[{}]", i), row)?;
        }

        if self.whiten {
            let variance = self.explained_variance.as_deref().unwrap_or_default();
            if variance.len() != self.components.len() {
                return Err(ModelError::Shape {
                    artifact: NAME,
                    message: format!(
                        "whitening needs {} explained variances, found {}",
                        self.components.len(),
                        variance.len()
                    ),
                });
            }
            if let Some(i) = variance.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(ModelError::InvalidValue {
                    artifact: NAME,
                    message: format!("explained_variance[{}] must be positive", i),
                });
            }
        }
        Ok(())
    }
}

impl Projector {
    pub fn input_width(&self) -> usize {
        self.mean.len()
    }

    pub fn output_width(&self) -> usize {
        self.components.len()
    }

    pub fn transform(&self, x: &[f64]) -> Vec<f64> {
        let centered: Vec<f64> = x.iter().zip(&self.mean).map(|(v, m)| v - m).collect();
        let variance = if self.whiten {
            self.explained_variance.as_deref()
        } else {
            None
        };

        self.components
            .iter()
            .enumerate()
            .map(|(k, row)| {
                let dot: f64 = row.iter().zip(&centered).map(|(w, c)| w * c).sum();
                match variance {
                    Some(var) => dot / var[k].sqrt(),
                    None => dot,
                }
            })
            .collect()
    }
}
