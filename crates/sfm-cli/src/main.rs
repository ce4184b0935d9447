//! Command-line front-end for the SfM pipeline orchestrator.

use anyhow::Context;
use clap::{ArgAction, Parser};
use sfm_core::{
    CameraModel, MatcherWeights, OutputConfig, ReconstructionConfig, RetrievalId, RunConfig,
    UnknownId,
};
use sfm_pipeline::{Collaborators, PipelineDriver};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

/// Structure-from-motion pipeline runner.
#[derive(Debug, Parser)]
#[command(author, version, about = "Structure-from-motion pipeline orchestrator")]
struct Args {
    /// Directory of input images.
    #[arg(long)]
    images: PathBuf,

    /// Feature extractor configuration, or 'none' to skip extraction.
    #[arg(long, default_value = "superpoint_aachen")]
    feature: String,

    /// Pairing strategy ('exhaustive' or 'retrieval'), or 'none' to skip.
    #[arg(long, default_value = "retrieval")]
    pairs: String,

    /// Global descriptor used for retrieval pairing.
    #[arg(long, default_value = "netvlad")]
    retrieval: RetrievalId,

    /// Number of top matches per image in retrieval pairing.
    #[arg(long, default_value_t = 50)]
    top_k_matches: usize,

    /// Matcher configuration, or 'none' to skip matching.
    #[arg(long, default_value = "superglue")]
    matcher: String,

    /// Weight profile for matchers that take one.
    #[arg(long, default_value = "outdoor")]
    matcher_weights: MatcherWeights,

    /// Run SfM reconstruction.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    reconstruction: bool,

    /// Camera model for reconstruction.
    #[arg(long, default_value = "OPENCV")]
    camera_model: CameraModel,

    /// Use the same camera for all images.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    single_camera: bool,

    /// Perform global bundle adjustment after reconstruction.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    global_bundle_adjustment: bool,

    /// Refine the principal point in a second bundle adjustment pass.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    refine_principal_point: bool,

    /// Overwrite existing results instead of reusing them.
    #[arg(long)]
    overwrite: bool,

    /// Show collaborator progress output.
    #[arg(long)]
    progress: bool,

    /// Show verbose output.
    #[arg(long)]
    verbose: bool,

    /// Suppress all output.
    #[arg(long)]
    quiet: bool,

    /// CPU threads for reconstruction (defaults to available parallelism).
    #[arg(long)]
    num_threads: Option<NonZeroUsize>,

    /// Python interpreter used for the hloc/pycolmap collaborators.
    #[arg(long, default_value = "python3")]
    python: PathBuf,
}

/// Parse a stage identifier, with 'none' disabling the stage.
fn parse_optional<T: FromStr<Err = UnknownId>>(token: &str) -> Result<Option<T>, UnknownId> {
    if token.eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        token.parse().map(Some)
    }
}

fn build_config(args: &Args) -> Result<RunConfig, UnknownId> {
    Ok(RunConfig {
        feature: parse_optional(&args.feature)?,
        pairing: parse_optional(&args.pairs)?,
        retrieval: args.retrieval,
        top_k_matches: args.top_k_matches,
        matcher: parse_optional(&args.matcher)?,
        matcher_weights: args.matcher_weights,
        reconstruction: args.reconstruction.then(|| ReconstructionConfig {
            camera_model: args.camera_model,
            single_camera: args.single_camera,
            global_bundle_adjustment: args.global_bundle_adjustment,
            refine_principal_point: args.refine_principal_point,
            num_threads: args.num_threads,
        }),
        overwrite: args.overwrite,
        output: OutputConfig {
            verbose: args.verbose,
            progress: args.progress,
            quiet: args.quiet,
        },
    })
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = build_config(&args)?;

    env_logger::Builder::new()
        .filter_level(config.output.level_filter())
        .format_timestamp(None)
        .format_target(false)
        .init();

    let driver = PipelineDriver::new(config, Collaborators::hloc(args.python.clone()));
    let report = driver
        .run(&args.images)
        .with_context(|| format!("pipeline run over '{}' failed", args.images.display()))?;

    log::info!(
        "pipeline finished: {} stage(s) completed, {} reused from cache",
        report.completed.len(),
        report.reused.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfm_core::{FeatureId, MatcherId, PairingStrategy};

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["sfm-cli"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn defaults_build_the_default_run_config() {
        let args = parse(&["--images", "scene/images"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn none_disables_optional_stages() {
        let args = parse(&[
            "--images", "imgs", "--feature", "none", "--pairs", "none", "--matcher", "none",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.feature, None);
        assert_eq!(config.pairing, None);
        assert_eq!(config.matcher, None);
    }

    #[test]
    fn stage_ids_parse_to_enums() {
        let args = parse(&[
            "--images",
            "imgs",
            "--feature",
            "disk",
            "--pairs",
            "exhaustive",
            "--matcher",
            "disk+lightglue",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.feature, Some(FeatureId::Disk));
        assert_eq!(config.pairing, Some(PairingStrategy::Exhaustive));
        assert_eq!(config.matcher, Some(MatcherId::DiskLightglue));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_stage_id_is_rejected() {
        let args = parse(&["--images", "imgs", "--matcher", "flann"]);
        let err = build_config(&args).unwrap_err();
        assert_eq!(err.kind, "matcher");
        assert_eq!(err.token, "flann");
    }

    #[test]
    fn reconstruction_false_disables_the_stage() {
        let args = parse(&["--images", "imgs", "--reconstruction", "false"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.reconstruction, None);
    }

    #[test]
    fn reconstruction_sub_options_are_threaded_through() {
        let args = parse(&[
            "--images",
            "imgs",
            "--camera-model",
            "PINHOLE",
            "--single-camera",
            "false",
            "--refine-principal-point",
            "false",
            "--num-threads",
            "4",
        ]);
        let config = build_config(&args).unwrap();
        let rc = config.reconstruction.unwrap();
        assert_eq!(rc.camera_model, CameraModel::Pinhole);
        assert!(!rc.single_camera);
        assert!(rc.global_bundle_adjustment);
        assert!(!rc.refine_principal_point);
        assert_eq!(rc.num_threads, NonZeroUsize::new(4));
    }

    #[test]
    fn verbosity_flags_map_to_output_config() {
        let args = parse(&["--images", "imgs", "--verbose", "--progress"]);
        let config = build_config(&args).unwrap();
        assert!(config.output.verbose);
        assert!(config.output.progress);
        assert!(!config.output.quiet);
    }
}
