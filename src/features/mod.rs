//! Feature engineering: raw song attributes → the exact records each model was trained on.
//!
//! Both records are rebuilt from scratch for every analysis. Column names and order
//! are part of the contract with the pre-trained artifacts; the model loaders compare
//! them against the names each artifact was exported with.

pub mod classification;
pub mod clustering;

use std::fmt;

use serde::Serialize;

pub use classification::ClassificationFeatures;
pub use clustering::ClusteringFeatures;

/// Latest release year in the training data. `song_age` is measured from here,
/// not from today, so the classifier sees the same scale it learned.
pub const DATASET_MAX_YEAR: i32 = 2020;

/// Added to energy before dividing so the acoustic/energy ratio stays finite at zero energy.
pub const RATIO_EPSILON: f64 = 1e-5;

pub const HIGH_ACOUSTIC_THRESHOLD: f64 = 0.7;
pub const HIGH_SPEECH_THRESHOLD: f64 = 0.6;

/// A single named cell of a feature record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Category(&'static str),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Self::Number(v) => write!(f, "{:.4}", v),
            Self::Category(s) => f.write_str(s),
        }
    }
}

/// Shared interaction terms used by both records.
pub(crate) fn energy_loudness(energy: f64, loudness: f64) -> f64 {
    energy * loudness
}

pub(crate) fn dance_valence(danceability: f64, valence: f64) -> f64 {
    danceability * valence
}

pub(crate) fn speech_energy(speechiness: f64, energy: f64) -> f64 {
    speechiness * energy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_value_display() {
        assert_eq!(FeatureValue::Number(180000.0).to_string(), "180000");
        assert_eq!(FeatureValue::Number(-5.0).to_string(), "-5");
        assert_eq!(FeatureValue::Number(0.12345).to_string(), "0.1235");
        assert_eq!(FeatureValue::Category("Korean").to_string(), "Korean");
    }
}
