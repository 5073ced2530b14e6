//! Console person search over one or more video files.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sightline_media::{
    build_target, load_reference_photo, scan_many, Annotator, MatchOutcome, ModelCapabilities,
    ModelPaths, OpenCvVideoOpener, ScanConfig, ScanControl, Scanner, Sighting,
};
use sightline_models::{MatchKind, NO_PANT_COLOR};

#[derive(Parser)]
#[command(
    name = "sightline-scan",
    version,
    about = "Search recorded video for a person by face and clothing colour",
    long_about = None
)]
struct Cli {
    /// Reference photo of the person
    #[arg(short, long)]
    photo: PathBuf,

    /// Shirt colour worn ("none" to ignore)
    #[arg(short, long)]
    shirt: String,

    /// Pant colour worn ("none" to ignore)
    #[arg(long, default_value = NO_PANT_COLOR)]
    pants: String,

    /// Video to search; repeat for several videos
    #[arg(short, long = "video", required = true)]
    videos: Vec<PathBuf>,

    /// Where to write the annotated match frame
    #[arg(short, long, default_value = "match.jpg")]
    output: PathBuf,

    /// Abort each scan after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Save face-only candidate frames into this directory
    #[arg(long)]
    save_candidates: Option<PathBuf>,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    // Per-detection score lines are logged at debug by the scan loop
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sightline_media::scan=debug"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(false))
            .with(env_filter)
            .init();
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    info!("==================================================");
    info!(photo = %cli.photo.display(), "Searching for person");
    info!(shirt = %cli.shirt, pants = %cli.pants, "Clothing");
    info!(videos = cli.videos.len(), "Videos to scan");
    info!("==================================================");

    let paths = ModelPaths::from_env();
    let capabilities =
        Arc::new(ModelCapabilities::load(&paths).context("Failed to load face models")?);
    let annotator = Annotator::load(paths.font.as_deref());
    if !annotator.has_font() {
        warn!("No font found; match frames will carry boxes without labels");
    }

    let mut config = ScanConfig::from_env();
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(secs);
    }
    let scanner = Scanner::new(Arc::clone(&capabilities), config).with_annotator(annotator);

    let photo = load_reference_photo(&cli.photo).context("Failed to load reference photo")?;
    let target = build_target(&capabilities, &photo, &cli.shirt, &cli.pants)
        .context("Could not build a face descriptor from the reference photo")?;

    if let Some(dir) = &cli.save_candidates {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let opener = OpenCvVideoOpener;
    let control = ScanControl::new();
    let results = scan_many(&scanner, &opener, &cli.videos, &target, &control, |video, sighting| {
        if sighting.kind != MatchKind::FaceOnlyMatch {
            return;
        }
        warn!(
            video = %video.display(),
            frame = sighting.sample.frame_index,
            face_score = sighting.scores.face_score,
            "Face matches but clothing differs; check manually"
        );
        if let Some(dir) = &cli.save_candidates {
            if let Err(e) = save_candidate(dir, video, sighting) {
                error!(error = %e, "Failed to save candidate frame");
            }
        }
    });

    let mut best: Option<(PathBuf, Sighting)> = None;
    let mut failures = 0usize;
    for scan in results {
        match scan.result {
            Ok(report) => {
                info!(
                    video = %scan.path.display(),
                    frames_sampled = report.stats.frames_sampled,
                    faces = report.stats.faces_located,
                    elapsed_ms = report.stats.elapsed.as_millis() as u64,
                    "Scan finished"
                );
                if let MatchOutcome::FullMatch(sighting) = report.outcome {
                    let better = best
                        .as_ref()
                        .map_or(true, |(_, b)| sighting.scores.final_score > b.scores.final_score);
                    if better {
                        best = Some((scan.path, *sighting));
                    }
                }
            }
            Err(e) => {
                failures += 1;
                error!(video = %scan.path.display(), error = %e, "Scan failed");
            }
        }
    }

    match best {
        Some((video, sighting)) => {
            sighting
                .sample
                .image
                .save(&cli.output)
                .with_context(|| format!("Failed to write {}", cli.output.display()))?;
            info!(
                video = %video.display(),
                frame = sighting.sample.frame_index,
                timestamp_seconds = sighting.sample.timestamp_seconds,
                final_score = sighting.scores.final_score,
                output = %cli.output.display(),
                "MATCH FOUND"
            );
            Ok(())
        }
        None if failures == cli.videos.len() => bail!("Every scan failed"),
        None => {
            info!("No match found");
            Ok(())
        }
    }
}

fn save_candidate(dir: &Path, video: &Path, sighting: &Sighting) -> Result<()> {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let path = dir.join(format!("{stem}_frame{}.jpg", sighting.sample.frame_index));
    sighting.sample.image.save(&path)?;
    info!(path = %path.display(), "Candidate frame saved");
    Ok(())
}
