use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use songscope::config::AppConfig;
use songscope::input::{Language, SongInput};
use songscope::models::ModelSet;
use songscope::segments::Segment;
use songscope::{analyzer, report};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "songscope", version, about = "Song flop-risk and segment predictor")]
struct Cli {
    /// Directory holding the exported model artifacts
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Raw song attributes. Defaults match the interactive sliders' starting positions.
#[derive(Args, Clone)]
struct SongArgs {
    /// Release year (1990 to current year)
    #[arg(long, default_value_t = 2020)]
    year: i32,

    /// Acousticness (0.0-1.0)
    #[arg(long, default_value_t = 0.5)]
    acousticness: f64,

    /// Danceability (0.0-1.0)
    #[arg(long, default_value_t = 0.5)]
    danceability: f64,

    /// Energy (0.0-1.0)
    #[arg(long, default_value_t = 0.5)]
    energy: f64,

    /// Instrumentalness (0.0-1.0)
    #[arg(long, default_value_t = 0.0)]
    instrumentalness: f64,

    /// Key (0-11)
    #[arg(long, default_value_t = 5)]
    key: u8,

    /// Mode (1 = major, 0 = minor)
    #[arg(long, default_value_t = 0)]
    mode: u8,

    /// Time signature (3, 4 or 5)
    #[arg(long, default_value_t = 3)]
    time_signature: u8,

    /// Liveness (0.0-1.0)
    #[arg(long, default_value_t = 0.2)]
    liveness: f64,

    /// Loudness in dB (-60 to 0)
    #[arg(long, default_value_t = -10.0, allow_hyphen_values = true)]
    loudness: f64,

    /// Speechiness (0.0-1.0)
    #[arg(long, default_value_t = 0.1)]
    speechiness: f64,

    /// Tempo in BPM (50-200)
    #[arg(long, default_value_t = 120.0)]
    tempo: f64,

    /// Valence (0.0-1.0)
    #[arg(long, default_value_t = 0.5)]
    valence: f64,

    /// Duration in minutes (1-10)
    #[arg(long, default_value_t = 3.0)]
    duration_min: f64,

    /// Language (English, Hindi, Korean, Tamil, Malayalam, Telugu, Unknown)
    #[arg(long, default_value_t = Language::English)]
    language: Language,
}

impl From<SongArgs> for SongInput {
    fn from(a: SongArgs) -> Self {
        Self {
            year: a.year,
            acousticness: a.acousticness,
            danceability: a.danceability,
            energy: a.energy,
            instrumentalness: a.instrumentalness,
            key: a.key,
            mode: a.mode,
            time_signature: a.time_signature,
            liveness: a.liveness,
            loudness: a.loudness,
            speechiness: a.speechiness,
            tempo: a.tempo,
            valence: a.valence,
            duration_min: a.duration_min,
            language: a.language,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Predict flop risk and song segment
    Predict {
        #[command(flatten)]
        song: SongArgs,
    },

    /// Predict flop risk only, showing the classifier's feature record
    Flop {
        #[command(flatten)]
        song: SongArgs,
    },

    /// Assign the song to a segment only
    Segment {
        #[command(flatten)]
        song: SongArgs,
    },

    /// Show the engineered feature records without running any model
    Features {
        #[command(flatten)]
        song: SongArgs,
    },

    /// Analyze songs from a JSON array or JSON-lines file
    Batch {
        /// File of songs (missing fields take the slider defaults)
        file: PathBuf,
    },

    /// Describe the loaded model artifacts
    Models,

    /// List the song segments
    Segments,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();
    let models_dir = config.resolve_models_dir(cli.models_dir.clone());
    let current_year = songscope::input::current_year();

    let load_models = || {
        ModelSet::load(&models_dir, &config.artifacts)
            .with_context(|| format!("Failed to load models from {}", models_dir.display()))
    };

    match cli.command {
        Commands::Predict { song } => {
            let models = load_models()?;
            let report = analyzer::analyze_song(&models, &song.into(), current_year)
                .context("Analysis failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report::song_report(&report));
            }
        }

        Commands::Flop { song } => {
            let models = load_models()?;
            let features = analyzer::engineer(&song.into(), current_year)
                .context("Invalid song")?;
            let prediction = models.classifier.predict(&features.classification);
            if cli.json {
                let out = serde_json::json!({
                    "features": features.classification,
                    "flop": prediction,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", report::flop_panel(&features.classification, &prediction));
            }
        }

        Commands::Segment { song } => {
            let models = load_models()?;
            let features = analyzer::engineer(&song.into(), current_year)
                .context("Invalid song")?;
            let assignment = models.segmenter.assign(&features.clustering)
                .context("Segmentation failed")?;
            if cli.json {
                let info = assignment.segment.info();
                let out = serde_json::json!({
                    "features": features.clustering,
                    "segment": assignment,
                    "info": info,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", report::segment_panel(&assignment));
            }
        }

        Commands::Features { song } => {
            let features = analyzer::engineer(&song.into(), current_year)
                .context("Invalid song")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&features)?);
            } else {
                print!(
                    "{}",
                    report::features_report(&features.classification, &features.clustering)
                );
            }
        }

        Commands::Batch { file } => {
            let models = load_models()?;
            let songs = analyzer::load_batch(&file).context("Failed to load batch")?;
            if songs.is_empty() && !cli.json {
                println!("No songs in {}.", file.display());
                return Ok(());
            }

            let result = analyzer::analyze_batch(&models, songs, current_year);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report::batch_json(&result.rows))?);
            } else {
                print!("{}", report::batch_table(&result.rows));
                println!();
                println!(
                    "Batch complete: {} analyzed, {} failed",
                    result.analyzed, result.failed
                );
            }
        }

        Commands::Models => {
            let models = load_models()?;
            if cli.json {
                let out = report::models_json(&models_dir, &models.summary());
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Models: {}", models_dir.display());
                println!("  {}", models.classifier.describe());
                println!("  {}", models.segmenter.describe());
            }
        }

        Commands::Segments => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&Segment::catalog())?);
            } else {
                print!("{}", report::segments_table());
            }
        }
    }

    Ok(())
}
