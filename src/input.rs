use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Earliest release year the input accepts.
pub const MIN_YEAR: i32 = 1990;

pub const LOUDNESS_RANGE: (f64, f64) = (-60.0, 0.0);
pub const TEMPO_RANGE: (f64, f64) = (50.0, 200.0);
pub const DURATION_MIN_RANGE: (f64, f64) = (1.0, 10.0);
pub const UNIT_RANGE: (f64, f64) = (0.0, 1.0);

pub const TIME_SIGNATURES: [u8; 3] = [3, 4, 5];

#[derive(Error, Debug, PartialEq)]
pub enum InputError {
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} = {value} is not one of {allowed:?}")]
    NotAllowed {
        field: &'static str,
        value: i64,
        allowed: &'static [u8],
    },
    #[error("unknown language \"{0}\" (expected one of: {list})", list = Language::labels().join(", "))]
    UnknownLanguage(String),
}

/// Song language, the single categorical feature the classifier consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Korean,
    Tamil,
    Malayalam,
    Telugu,
    Unknown,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::English,
        Language::Hindi,
        Language::Korean,
        Language::Tamil,
        Language::Malayalam,
        Language::Telugu,
        Language::Unknown,
    ];

    /// Category label as the classifier's encoder saw it during training.
    pub fn label(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Korean => "Korean",
            Self::Tamil => "Tamil",
            Self::Malayalam => "Malayalam",
            Self::Telugu => "Telugu",
            Self::Unknown => "Unknown",
        }
    }

    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|l| l.label()).collect()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Language {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .find(|l| l.label().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| InputError::UnknownLanguage(s.to_string()))
    }
}

impl TryFrom<String> for Language {
    type Error = InputError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Language> for String {
    fn from(l: Language) -> Self {
        l.label().to_string()
    }
}

/// Raw song attributes as a user enters them.
/// Missing fields in serialized form take the same defaults the interactive sliders start at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongInput {
    pub year: i32,
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    /// Pitch class 0-11. Collected but unused by either model.
    pub key: u8,
    /// 1 = major, 0 = minor.
    pub mode: u8,
    /// Collected but unused by either model.
    pub time_signature: u8,
    pub liveness: f64,
    /// dB, -60..0
    pub loudness: f64,
    pub speechiness: f64,
    /// BPM
    pub tempo: f64,
    pub valence: f64,
    pub duration_min: f64,
    pub language: Language,
}

impl Default for SongInput {
    fn default() -> Self {
        Self {
            year: 2020,
            acousticness: 0.5,
            danceability: 0.5,
            energy: 0.5,
            instrumentalness: 0.0,
            key: 5,
            mode: 0,
            time_signature: 3,
            liveness: 0.2,
            loudness: -10.0,
            speechiness: 0.1,
            tempo: 120.0,
            valence: 0.5,
            duration_min: 3.0,
            language: Language::English,
        }
    }
}

impl SongInput {
    /// Check every attribute against the input bounds.
    /// `current_year` caps the release year.
    pub fn validate(&self, current_year: i32) -> Result<(), InputError> {
        check_range("year", self.year as f64, MIN_YEAR as f64, current_year as f64)?;

        let unit_fields = [
            ("acousticness", self.acousticness),
            ("danceability", self.danceability),
            ("energy", self.energy),
            ("instrumentalness", self.instrumentalness),
            ("liveness", self.liveness),
            ("speechiness", self.speechiness),
            ("valence", self.valence),
        ];
        for (field, value) in unit_fields {
            check_range(field, value, UNIT_RANGE.0, UNIT_RANGE.1)?;
        }

        check_range("loudness", self.loudness, LOUDNESS_RANGE.0, LOUDNESS_RANGE.1)?;
        check_range("tempo", self.tempo, TEMPO_RANGE.0, TEMPO_RANGE.1)?;
        check_range(
            "duration_min",
            self.duration_min,
            DURATION_MIN_RANGE.0,
            DURATION_MIN_RANGE.1,
        )?;
        check_range("key", self.key as f64, 0.0, 11.0)?;

        if self.mode > 1 {
            return Err(InputError::NotAllowed {
                field: "mode",
                value: self.mode as i64,
                allowed: &[0, 1],
            });
        }
        if !TIME_SIGNATURES.contains(&self.time_signature) {
            return Err(InputError::NotAllowed {
                field: "time_signature",
                value: self.time_signature as i64,
                allowed: &TIME_SIGNATURES,
            });
        }

        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(InputError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Current calendar year from the local clock.
pub fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Local::now().year()
}
