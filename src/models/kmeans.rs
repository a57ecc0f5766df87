use serde::Deserialize;

use super::{Artifact, ModelError, Result, check_finite};

const NAME: &str = "centroids";

/// Fitted k-means centroids. Assignment is to the nearest centroid by Euclidean distance.
#[derive(Debug, Deserialize)]
pub struct CentroidModel {
    cluster_centers: Vec<Vec<f64>>,
}

impl Artifact for CentroidModel {
    const NAME: &'static str = NAME;

    fn validate(&self) -> Result<()> {
        let Some(first) = self.cluster_centers.first() else {
            return Err(ModelError::Shape {
                artifact: NAME,
                message: "no cluster centers".to_string(),
            });
        };
        if first.is_empty() {
            return Err(ModelError::Shape {
                artifact: NAME,
                message: "cluster centers have zero width".to_string(),
            });
        }
        for (i, c) in self.cluster_centers.iter().enumerate() {
            if c.len() != first.len() {
                return Err(ModelError::Shape {
                    artifact: NAME,
                    message: format!("center {} has width {}, expected {}", i, c.len(), first.len()),
                });
            }
            check_finite(NAME, &format!("cluster_centers[{}]", i), c)?;
        }
        Ok(())
    }
}

impl CentroidModel {
    pub fn n_clusters(&self) -> usize {
        self.cluster_centers.len()
    }

    pub fn width(&self) -> usize {
        self.cluster_centers.first().map_or(0, Vec::len)
    }

    /// Index of the nearest center. Ties go to the lower index.
    pub fn predict(&self, x: &[f64]) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, center) in self.cluster_centers.iter().enumerate() {
            let dist = squared_distance(center, x);
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        best
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    fn model() -> CentroidModel {
        CentroidModel::from_json(r#"{"cluster_centers": [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]]}"#)
            .unwrap()
    }

    #[test]
    fn nearest_center_wins() {
        let m = model();
        assert_eq!(m.predict(&[1.0, 1.0]), 0);
        assert_eq!(m.predict(&[9.0, -2.0]), 1);
        assert_eq!(m.predict(&[-3.0, 8.0]), 2);
    }

    #[test]
    fn tie_goes_to_lower_index() {
        let m = model();
        assert_eq!(m.predict(&[5.0, 0.0]), 0);
        assert_eq!(m.predict(&[5.0, 5.0]), 0);
    }

    #[test]
    fn ragged_centers_rejected() {
        let err = CentroidModel::from_json(r#"{"cluster_centers": [[0.0, 0.0], [1.0]]}"#).unwrap_err();
        assert!(matches!(err, ModelError::Shape { .. }));
    }

    #[test]
    fn empty_model_rejected() {
        assert!(CentroidModel::from_json(r#"{"cluster_centers": []}"#).is_err());
        assert!(CentroidModel::from_json(r#"{"cluster_centers": [[]]}"#).is_err());
    }

    #[test]
    fn fixture_loads() {
        let m = CentroidModel::from_json(fixtures::CENTROIDS).unwrap();
        assert_eq!(m.n_clusters(), 3);
        assert_eq!(m.width(), 2);
    }
}
