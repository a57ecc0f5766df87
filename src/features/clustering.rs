use serde::Serialize;

use super::{FeatureValue, HIGH_ACOUSTIC_THRESHOLD, HIGH_SPEECH_THRESHOLD};
use crate::input::SongInput;

/// Column names of the segmentation pipeline's input, in training order.
pub const COLUMNS: [&str; 16] = [
    "acousticness",
    "danceability",
    "energy",
    "instrumentalness",
    "liveness",
    "loudness",
    "speechiness",
    "tempo",
    "valence",
    "duration_min",
    "energy_loudness",
    "dance_valence",
    "speech_energy",
    "minor_mode",
    "high_acoustic",
    "high_speech",
];

/// Input record for the scaler → projector → centroid pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteringFeatures {
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub valence: f64,
    pub duration_min: f64,
    pub energy_loudness: f64,
    pub dance_valence: f64,
    pub speech_energy: f64,
    pub minor_mode: u8,
    pub high_acoustic: bool,
    pub high_speech: bool,
}

impl ClusteringFeatures {
    /// Assumes `song.mode` is 0 or 1 (checked by `SongInput::validate`).
    pub fn from_input(song: &SongInput) -> Self {
        Self {
            acousticness: song.acousticness,
            danceability: song.danceability,
            energy: song.energy,
            instrumentalness: song.instrumentalness,
            liveness: song.liveness,
            loudness: song.loudness,
            speechiness: song.speechiness,
            tempo: song.tempo,
            valence: song.valence,
            duration_min: song.duration_min,
            energy_loudness: super::energy_loudness(song.energy, song.loudness),
            dance_valence: super::dance_valence(song.danceability, song.valence),
            speech_energy: super::speech_energy(song.speechiness, song.energy),
            minor_mode: 1u8.saturating_sub(song.mode),
            high_acoustic: song.acousticness > HIGH_ACOUSTIC_THRESHOLD,
            high_speech: song.speechiness > HIGH_SPEECH_THRESHOLD,
        }
    }

    /// Dense vector in `COLUMNS` order; flags become 0.0/1.0.
    pub fn to_vector(&self) -> [f64; 16] {
        [
            self.acousticness,
            self.danceability,
            self.energy,
            self.instrumentalness,
            self.liveness,
            self.loudness,
            self.speechiness,
            self.tempo,
            self.valence,
            self.duration_min,
            self.energy_loudness,
            self.dance_valence,
            self.speech_energy,
            self.minor_mode as f64,
            flag(self.high_acoustic),
            flag(self.high_speech),
        ]
    }

    pub fn cells(&self) -> [(&'static str, FeatureValue); 16] {
        let v = self.to_vector();
        std::array::from_fn(|i| (COLUMNS[i], FeatureValue::Number(v[i])))
    }
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}
