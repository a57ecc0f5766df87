use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::features::{ClassificationFeatures, ClusteringFeatures};
use crate::input::{InputError, SongInput};
use crate::models::{FlopPrediction, ModelError, ModelSet, SegmentAssignment};

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Failed to read batch file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse batch file: {0}")]
    Parse(serde_json::Error),
    #[error("Malformed song: {0}")]
    Row(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;

/// Both engineered records for one song.
#[derive(Debug, Clone, Serialize)]
pub struct EngineeredFeatures {
    pub classification: ClassificationFeatures,
    pub clustering: ClusteringFeatures,
}

/// Everything computed for one song.
#[derive(Debug, Clone, Serialize)]
pub struct SongReport {
    pub input: SongInput,
    pub features: EngineeredFeatures,
    pub flop: FlopPrediction,
    pub segment: SegmentAssignment,
}

/// Validate the raw input, then derive both feature records.
pub fn engineer(song: &SongInput, current_year: i32) -> Result<EngineeredFeatures> {
    song.validate(current_year)?;
    Ok(EngineeredFeatures {
        classification: ClassificationFeatures::from_input(song),
        clustering: ClusteringFeatures::from_input(song),
    })
}

/// Run both pipelines on one song. Nothing is cached between calls.
pub fn analyze_song(models: &ModelSet, song: &SongInput, current_year: i32) -> Result<SongReport> {
    let features = engineer(song, current_year)?;
    let flop = models.classifier.predict(&features.classification);
    let segment = models.segmenter.assign(&features.clustering)?;
    Ok(SongReport {
        input: song.clone(),
        features,
        flop,
        segment,
    })
}

/// One line of a batch, numbered from 1.
#[derive(Debug)]
pub struct BatchRow {
    pub row: usize,
    pub outcome: Result<SongReport>,
}

pub struct BatchResult {
    pub rows: Vec<BatchRow>,
    pub analyzed: usize,
    pub failed: usize,
}

/// Parse songs from a JSON array or from a stream of JSON objects.
/// A stream may hold one object per line or pretty-printed objects; rows are
/// numbered by the line each object starts on. Blank lines and `#` comments are
/// skipped, and a malformed object fails only its own row.
pub fn parse_batch(text: &str) -> Result<Vec<(usize, Result<SongInput>)>> {
    if text.trim_start().starts_with('[') {
        let values: Vec<serde_json::Value> = serde_json::from_str(text).map_err(AnalyzeError::Parse)?;
        return Ok(values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i + 1, serde_json::from_value(v).map_err(AnalyzeError::Row)))
            .collect());
    }

    let mut songs = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    let mut counted = 0;
    loop {
        let rest = &text[pos..];
        let start = pos + (rest.len() - rest.trim_start().len());
        if start == text.len() {
            break;
        }
        line += text[counted..start].matches('\n').count();
        counted = start;

        if text[start..].starts_with('#') {
            pos = next_line(text, start);
            continue;
        }

        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<serde_json::Value>();
        match stream.next() {
            Some(Ok(value)) => {
                songs.push((line, serde_json::from_value(value).map_err(AnalyzeError::Row)));
                pos = start + stream.byte_offset();
            }
            Some(Err(e)) => {
                songs.push((line, Err(AnalyzeError::Row(e))));
                pos = next_object_line(text, start);
            }
            None => break,
        }
    }
    Ok(songs)
}

/// Byte offset just past the newline ending the line that contains `from`.
fn next_line(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |i| from + i + 1)
}

/// Resync after a malformed object: the next line whose first non-blank character opens an object.
fn next_object_line(text: &str, from: usize) -> usize {
    let mut pos = next_line(text, from);
    while pos < text.len() && !text[pos..].trim_start_matches([' ', '\t']).starts_with('{') {
        pos = next_line(text, pos);
    }
    pos
}

pub fn load_batch(path: &Path) -> Result<Vec<(usize, Result<SongInput>)>> {
    let text = std::fs::read_to_string(path).map_err(|source| AnalyzeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_batch(&text)
}

/// Analyze every parsed song; failures are recorded per row and do not stop the batch.
pub fn analyze_batch(
    models: &ModelSet,
    songs: Vec<(usize, Result<SongInput>)>,
    current_year: i32,
) -> BatchResult {
    let mut analyzed = 0;
    let mut failed = 0;

    let rows = songs
        .into_iter()
        .map(|(row, parsed)| {
            let outcome = parsed.and_then(|song| analyze_song(models, &song, current_year));
            match &outcome {
                Ok(_) => analyzed += 1,
                Err(e) => {
                    log::warn!("Row {}: {}", row, e);
                    failed += 1;
                }
            }
            BatchRow { row, outcome }
        })
        .collect();

    BatchResult {
        rows,
        analyzed,
        failed,
    }
}
