use serde::Serialize;

use super::{Artifact, CentroidModel, ModelError, Projector, Result, Scaler};
use crate::features::ClusteringFeatures;
use crate::segments::Segment;

/// Scaler → projector → centroid assignment, checked end to end at construction.
#[derive(Debug)]
pub struct SegmentPipeline {
    scaler: Scaler,
    projector: Projector,
    centroids: CentroidModel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentAssignment {
    pub cluster_id: usize,
    pub segment: Segment,
    /// Song position in the reduced space the centroids live in.
    pub projection: Vec<f64>,
}

/// Widths along the chain, for the `models` listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub scaler_width: usize,
    pub projector_input: usize,
    pub projector_output: usize,
    pub clusters: usize,
}

impl SegmentPipeline {
    pub fn new(scaler: Scaler, projector: Projector, centroids: CentroidModel) -> Result<Self> {
        if scaler.width() != projector.input_width() {
            return Err(ModelError::Shape {
                artifact: Projector::NAME,
                message: format!(
                    "projector takes {} inputs but the scaler produces {}",
                    projector.input_width(),
                    scaler.width()
                ),
            });
        }
        if projector.output_width() != centroids.width() {
            return Err(ModelError::Shape {
                artifact: CentroidModel::NAME,
                message: format!(
                    "centers have width {} but the projector produces {}",
                    centroids.width(),
                    projector.output_width()
                ),
            });
        }
        if centroids.n_clusters() != Segment::ALL.len() {
            return Err(ModelError::SegmentCount {
                expected: Segment::ALL.len(),
                found: centroids.n_clusters(),
            });
        }
        Ok(Self {
            scaler,
            projector,
            centroids,
        })
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn assign(&self, features: &ClusteringFeatures) -> Result<SegmentAssignment> {
        let scaled = self.scaler.transform(&features.to_vector());
        let projection = self.projector.transform(&scaled);
        let cluster_id = self.centroids.predict(&projection);
        let segment = Segment::from_id(cluster_id).ok_or(ModelError::UnknownCluster(cluster_id))?;
        log::debug!("projection {:?} → cluster {}", projection, cluster_id);
        Ok(SegmentAssignment {
            cluster_id,
            segment,
            projection,
        })
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            scaler_width: self.scaler.width(),
            projector_input: self.projector.input_width(),
            projector_output: self.projector.output_width(),
            clusters: self.centroids.n_clusters(),
        }
    }

    pub fn describe(&self) -> String {
        let s = self.summary();
        format!(
            "segmenter: scaler ({} columns) → projector ({} → {}) → {} centroids",
            s.scaler_width, s.projector_input, s.projector_output, s.clusters
        )
    }
}
