//! Error taxonomy for the pipeline orchestrator.
//!
//! Failures are fatal by design: no stage retries, and no stage substitutes
//! a default for a missing input. Every error carries enough context (the
//! stage, the offending configuration value or path) for the user to fix
//! the invocation and re-run; cached artifacts make the re-run cheap.

use crate::ids::{FeatureId, MatcherId};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Identifies a pipeline stage in logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    FeatureExtraction,
    Pairing,
    Matching,
    Reconstruction,
    BundleAdjustment,
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageId::FeatureExtraction => "feature extraction",
            StageId::Pairing => "pairing",
            StageId::Matching => "matching",
            StageId::Reconstruction => "reconstruction",
            StageId::BundleAdjustment => "bundle adjustment",
        };
        f.write_str(name)
    }
}

/// A feature/matcher combination rejected by the compatibility validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("feature '{feature}' is not compatible with matcher '{matcher}' (compatible: {allowed})")]
pub struct IncompatibleConfig {
    pub feature: FeatureId,
    pub matcher: MatcherId,
    /// Human-readable description of the allowed combinations for the
    /// constraint that was violated.
    pub allowed: &'static str,
}

/// Failure of one stage invocation.
#[derive(Debug, Error)]
pub enum StageError {
    /// The stage's collaborator call failed (missing weights, malformed
    /// file, solver divergence, subprocess exit). Propagated unmodified.
    #[error("{stage} failed: {message}")]
    Collaborator { stage: StageId, message: String },

    /// An expected artifact file was absent when a downstream stage tried
    /// to consume it.
    #[error("{stage} requires '{}' which does not exist; re-run the producing stage", path.display())]
    PartialArtifact { stage: StageId, path: PathBuf },

    /// A stage needs an input that no enabled upstream stage is configured
    /// to produce.
    #[error("{stage} needs {what}, but no stage is configured to produce it")]
    MissingInput { stage: StageId, what: &'static str },

    /// I/O failure while the orchestrator itself read or wrote an artifact.
    #[error("{stage}: i/o error on '{}'", path.display())]
    Io {
        stage: StageId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StageError {
    /// The stage that produced this error.
    pub fn stage(&self) -> StageId {
        match self {
            StageError::Collaborator { stage, .. }
            | StageError::PartialArtifact { stage, .. }
            | StageError::MissingInput { stage, .. }
            | StageError::Io { stage, .. } => *stage,
        }
    }
}

/// Top-level error for one pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Incompatible configuration, rejected before any stage executed.
    #[error(transparent)]
    Config(#[from] IncompatibleConfig),

    /// Empty or unreadable image directory.
    #[error("input error: {0}")]
    Input(String),

    /// A stage failed; the run stopped at that stage.
    #[error(transparent)]
    Stage(#[from] StageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incompatible_config_message_names_both_sides() {
        let err = IncompatibleConfig {
            feature: FeatureId::Disk,
            matcher: MatcherId::SuperpointLightglue,
            allowed: "superpoint_aachen, superpoint_max, superpoint_inloc",
        };
        let msg = err.to_string();
        assert!(msg.contains("disk"));
        assert!(msg.contains("superpoint+lightglue"));
        assert!(msg.contains("superpoint_max"));
    }

    #[test]
    fn stage_error_reports_its_stage() {
        let err = StageError::PartialArtifact {
            stage: StageId::Matching,
            path: PathBuf::from("/tmp/pairs.txt"),
        };
        assert_eq!(err.stage(), StageId::Matching);
        assert!(err.to_string().contains("matching"));
        assert!(err.to_string().contains("pairs.txt"));
    }

    #[test]
    fn pipeline_error_wraps_config_transparently() {
        let err = PipelineError::from(IncompatibleConfig {
            feature: FeatureId::R2d2,
            matcher: MatcherId::Superglue,
            allowed: "NN-ratio, NN-mutual",
        });
        assert!(err.to_string().contains("r2d2"));
    }
}
