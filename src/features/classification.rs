use serde::Serialize;

use super::{DATASET_MAX_YEAR, FeatureValue, RATIO_EPSILON};
use crate::input::{Language, SongInput};

/// Column names of the flop classifier's input, in training order.
pub const COLUMNS: [&str; 17] = [
    "acousticness",
    "danceability",
    "duration_ms",
    "energy",
    "liveness",
    "loudness",
    "speechiness",
    "tempo",
    "valence",
    "year",
    "song_age",
    "energy_loudness",
    "dance_valence",
    "speech_energy",
    "acoustic_energy_ratio",
    "tempo_energy",
    "language",
];

/// Input record for the flop classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationFeatures {
    pub acousticness: f64,
    pub danceability: f64,
    pub duration_ms: f64,
    pub energy: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub valence: f64,
    pub year: i32,
    pub song_age: i32,
    pub energy_loudness: f64,
    pub dance_valence: f64,
    pub speech_energy: f64,
    pub acoustic_energy_ratio: f64,
    pub tempo_energy: f64,
    pub language: Language,
}

impl ClassificationFeatures {
    pub fn from_input(song: &SongInput) -> Self {
        Self {
            acousticness: song.acousticness,
            danceability: song.danceability,
            duration_ms: song.duration_min * 60_000.0,
            energy: song.energy,
            liveness: song.liveness,
            loudness: song.loudness,
            speechiness: song.speechiness,
            tempo: song.tempo,
            valence: song.valence,
            year: song.year,
            song_age: DATASET_MAX_YEAR - song.year,
            energy_loudness: super::energy_loudness(song.energy, song.loudness),
            dance_valence: super::dance_valence(song.danceability, song.valence),
            speech_energy: super::speech_energy(song.speechiness, song.energy),
            acoustic_energy_ratio: song.acousticness / (song.energy + RATIO_EPSILON),
            tempo_energy: song.tempo * song.energy,
            language: song.language,
        }
    }

    /// Named cells in `COLUMNS` order.
    pub fn cells(&self) -> [(&'static str, FeatureValue); 17] {
        use FeatureValue::{Category, Number};
        [
            (COLUMNS[0], Number(self.acousticness)),
            (COLUMNS[1], Number(self.danceability)),
            (COLUMNS[2], Number(self.duration_ms)),
            (COLUMNS[3], Number(self.energy)),
            (COLUMNS[4], Number(self.liveness)),
            (COLUMNS[5], Number(self.loudness)),
            (COLUMNS[6], Number(self.speechiness)),
            (COLUMNS[7], Number(self.tempo)),
            (COLUMNS[8], Number(self.valence)),
            (COLUMNS[9], Number(self.year as f64)),
            (COLUMNS[10], Number(self.song_age as f64)),
            (COLUMNS[11], Number(self.energy_loudness)),
            (COLUMNS[12], Number(self.dance_valence)),
            (COLUMNS[13], Number(self.speech_energy)),
            (COLUMNS[14], Number(self.acoustic_energy_ratio)),
            (COLUMNS[15], Number(self.tempo_energy)),
            (COLUMNS[16], Category(self.language.label())),
        ]
    }
}
