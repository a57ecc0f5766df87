use serde::Deserialize;

use super::{Artifact, ModelError, Result, check_columns, check_finite};
use crate::features::clustering::COLUMNS;

const NAME: &str = "scaler";

/// Fitted standard scaler: `(x - mean) / scale` per column.
#[derive(Debug, Deserialize)]
pub struct Scaler {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Artifact for Scaler {
    const NAME: &'static str = NAME;

    fn validate(&self) -> Result<()> {
        check_columns(NAME, &COLUMNS, &self.feature_names)?;
        let n = self.feature_names.len();
        if self.mean.len() != n || self.scale.len() != n {
            return Err(ModelError::Shape {
                artifact: NAME,
                message: format!(
                    "{} columns but {} means and {} scales",
                    n,
                    self.mean.len(),
                    self.scale.len()
                ),
            });
        }
        check_finite(NAME, "mean", &self.mean)?;
        check_finite(NAME, "scale", &self.scale)?;
        if let Some(i) = self.scale.iter().position(|s| *s == 0.0) {
            return Err(ModelError::InvalidValue {
                artifact: NAME,
                message: format!("scale[{}] ({}) is zero", i, self.feature_names[i]),
            });
        }
        Ok(())
    }
}

impl Scaler {
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }
}
