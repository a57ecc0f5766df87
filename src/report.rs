//! Text rendering of analysis results.

use std::fmt::Write;
use std::path::Path;

use crate::analyzer::{BatchRow, SongReport};
use crate::features::{ClassificationFeatures, ClusteringFeatures, FeatureValue};
use crate::models::{FlopPrediction, ModelSummary, SegmentAssignment};
use crate::segments::Segment;

/// Flop panel: probability, verdict, and the record the classifier saw.
pub fn flop_panel(features: &ClassificationFeatures, prediction: &FlopPrediction) -> String {
    let mut out = String::new();
    writeln!(out, "Flop Prediction").ok();
    writeln!(out, "===============").ok();
    writeln!(out, "Flop Probability: {:.2}%", prediction.probability * 100.0).ok();
    writeln!(out, "Verdict:          {}", prediction.verdict()).ok();
    writeln!(out).ok();
    out.push_str(&feature_table(&features.cells()));
    out
}

/// Segment panel: cluster id, name, description, popularity tier.
pub fn segment_panel(assignment: &SegmentAssignment) -> String {
    let info = assignment.segment.info();
    let mut out = String::new();
    writeln!(out, "Song Segment Analysis").ok();
    writeln!(out, "=====================").ok();
    writeln!(out, "Cluster {}: {}", assignment.cluster_id, info.name).ok();
    writeln!(out, "{}", info.description).ok();
    writeln!(out, "Popularity Insight: {}", info.popularity).ok();
    out
}

/// Both panels for one song.
pub fn song_report(report: &SongReport) -> String {
    let mut out = flop_panel(&report.features.classification, &report.flop);
    out.push('\n');
    out.push_str(&segment_panel(&report.segment));
    out
}

/// Two-column name/value table.
pub fn feature_table(cells: &[(&'static str, FeatureValue)]) -> String {
    let mut out = String::new();
    writeln!(out, "{:<24} {:>14}", "Feature", "Value").ok();
    writeln!(out, "{}", "-".repeat(39)).ok();
    for (name, value) in cells {
        writeln!(out, "{:<24} {:>14}", name, value.to_string()).ok();
    }
    out
}

pub fn features_report(classification: &ClassificationFeatures, clustering: &ClusteringFeatures) -> String {
    let mut out = String::new();
    writeln!(out, "Classification features ({} columns)", classification.cells().len()).ok();
    out.push_str(&feature_table(&classification.cells()));
    writeln!(out).ok();
    writeln!(out, "Clustering features ({} columns)", clustering.cells().len()).ok();
    out.push_str(&feature_table(&clustering.cells()));
    out
}

pub fn segments_table() -> String {
    let mut out = String::new();
    writeln!(out, "{:>2}  {:<36} {:<24} {}", "Id", "Segment", "Popularity", "Description").ok();
    writeln!(out, "{}", "-".repeat(110)).ok();
    for seg in Segment::ALL {
        let info = seg.info();
        writeln!(
            out,
            "{:>2}  {:<36} {:<24} {}",
            seg.id(),
            info.name,
            info.popularity,
            info.description
        )
        .ok();
    }
    out
}

/// Batch rows as a JSON array: `{row, report}` or `{row, error}` per row.
pub fn batch_json(rows: &[BatchRow]) -> serde_json::Value {
    rows.iter()
        .map(|r| match &r.outcome {
            Ok(report) => serde_json::json!({ "row": r.row, "report": report }),
            Err(e) => serde_json::json!({ "row": r.row, "error": e.to_string() }),
        })
        .collect()
}

/// Loaded-artifact summary for `models --json`.
pub fn models_json(dir: &Path, summary: &ModelSummary) -> serde_json::Value {
    serde_json::json!({
        "models_dir": dir.display().to_string(),
        "classifier": summary.classifier,
        "segmenter": summary.segmenter,
    })
}

/// One line per batch row; failed rows show their error.
pub fn batch_table(rows: &[BatchRow]) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{:>5} {:>5} {:<10} {:>7}  {:<24} {}",
        "Row", "Year", "Language", "Flop%", "Verdict", "Segment"
    )
    .ok();
    writeln!(out, "{}", "-".repeat(100)).ok();

    for r in rows {
        match &r.outcome {
            Ok(report) => {
                writeln!(
                    out,
                    "{:>5} {:>5} {:<10} {:>6.1}%  {:<24} {}: {}",
                    r.row,
                    report.input.year,
                    report.input.language,
                    report.flop.probability * 100.0,
                    report.flop.verdict(),
                    report.segment.cluster_id,
                    report.segment.segment.info().name,
                )
                .ok();
            }
            Err(e) => {
                writeln!(out, "{:>5} error: {}", r.row, e).ok();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{analyze_batch, analyze_song, parse_batch};
    use crate::input::SongInput;
    use crate::models::fixtures;

    #[test]
    fn flop_panel_shows_probability_and_record() {
        let models = fixtures::model_set();
        let report = analyze_song(&models, &SongInput::default(), 2024).unwrap();
        let text = flop_panel(&report.features.classification, &report.flop);
        assert!(text.contains("Flop Probability: 30.00%"));
        assert!(text.contains("Likely to Perform Well"));
        assert!(text.contains("duration_ms"));
        assert!(text.contains("180000"));
        assert!(text.contains("English"));
    }

    #[test]
    fn segment_panel_lines() {
        let models = fixtures::model_set();
        let report = analyze_song(&models, &SongInput::default(), 2024).unwrap();
        let text = segment_panel(&report.segment);
        assert!(text.contains("Cluster 1: Acoustic / Emotional / Indie"));
        assert!(text.contains("Popularity Insight: Medium Popularity"));
    }

    #[test]
    fn features_report_lists_both_records() {
        let song = SongInput::default();
        let text = features_report(
            &ClassificationFeatures::from_input(&song),
            &ClusteringFeatures::from_input(&song),
        );
        assert!(text.contains("Classification features (17 columns)"));
        assert!(text.contains("Clustering features (16 columns)"));
        assert!(text.contains("acoustic_energy_ratio"));
        assert!(text.contains("high_speech"));
    }

    #[test]
    fn segments_table_has_every_segment() {
        let text = segments_table();
        for seg in Segment::ALL {
            assert!(text.contains(seg.info().name));
        }
    }

    #[test]
    fn batch_json_of_empty_batch_is_empty_array() {
        let songs = parse_batch("").unwrap();
        let result = analyze_batch(&fixtures::model_set(), songs, 2024);
        let text = serde_json::to_string_pretty(&batch_json(&result.rows)).unwrap();
        assert_eq!(text, "[]");
    }

    #[test]
    fn batch_json_marks_failed_rows() {
        let models = fixtures::model_set();
        let songs = parse_batch("{}\n{\"year\": 1900}\n").unwrap();
        let result = analyze_batch(&models, songs, 2024);
        let text = serde_json::to_string(&batch_json(&result.rows)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["row"], 1);
        assert_eq!(parsed[0]["report"]["flop"]["label"], 0);
        assert_eq!(parsed[1]["row"], 2);
        assert_eq!(parsed[1]["error"], "Invalid input: year = 1900");
    }

    #[test]
    fn models_json_parses() {
        let summary = fixtures::model_set().summary();
        let text = serde_json::to_string_pretty(&models_json(Path::new("models"), &summary)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["models_dir"], "models");
        assert_eq!(parsed["classifier"]["trees"], 3);
        assert_eq!(parsed["classifier"]["decision_threshold"], 0.5);
        assert_eq!(parsed["segmenter"]["scaler_width"], 16);
    }

    #[test]
    fn batch_table_includes_errors() {
        let models = fixtures::model_set();
        let songs = parse_batch("{}\n{\"year\": 1900}\n").unwrap();
        let result = analyze_batch(&models, songs, 2024);
        let text = batch_table(&result.rows);
        assert!(text.contains("Likely to Perform Well"));
        assert!(text.contains("    2 error: Invalid input: year = 1900"));
    }
}
