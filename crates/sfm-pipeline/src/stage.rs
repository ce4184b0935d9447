//! Stage collaborator contracts.
//!
//! Each pipeline stage is an external collaborator behind one of the traits
//! here. The traits carry typed request structs holding the resolved
//! artifact paths, the relevant slice of the run configuration, and the
//! stdio policy derived from the output controller. How a collaborator
//! computes its artifact is its own business; the orchestrator only relies
//! on the declared output appearing at the requested path.

use sfm_core::{CameraMode, CameraModel, MatcherWeights, OutputConfig, StageError};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ─────────────────────────────────────────────────────────────────────────────
// Stdio policy
// ─────────────────────────────────────────────────────────────────────────────

/// Where a collaborator subprocess's output streams go.
///
/// Collaborators emit diagnostics on stdout and progress indicators on
/// stderr; the policy maps the run's verbosity axes onto those streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdioPolicy {
    show_stdout: bool,
    show_stderr: bool,
}

impl StdioPolicy {
    pub fn from_output(output: &OutputConfig) -> Self {
        Self {
            show_stdout: output.show_collaborator_stdout(),
            show_stderr: output.show_collaborator_progress(),
        }
    }

    pub fn stdout(&self) -> Stdio {
        if self.show_stdout {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }

    pub fn stderr(&self) -> Stdio {
        if self.show_stderr {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }

    /// Configure `cmd`'s output streams according to this policy.
    pub fn apply_to(&self, cmd: &mut Command) {
        cmd.stdout(self.stdout()).stderr(self.stderr());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Inputs for one feature-extraction invocation.
///
/// Used both for the primary descriptors and for the nested
/// retrieval-descriptor extraction that retrieval pairing performs; the two
/// differ only in `conf_name` and `feature_path`.
#[derive(Debug, Clone)]
pub struct ExtractionRequest<'a> {
    /// Extractor configuration name on the collaborator side.
    pub conf_name: &'a str,
    pub image_dir: &'a Path,
    /// Relative image names, sorted.
    pub image_names: &'a [String],
    /// Where the descriptor file must be written.
    pub feature_path: &'a Path,
    pub stdio: StdioPolicy,
}

/// Inputs for one pairing invocation.
#[derive(Debug, Clone)]
pub struct PairingRequest<'a> {
    pub image_names: &'a [String],
    pub image_dir: &'a Path,
    /// Primary descriptor file, when feature extraction is enabled.
    pub descriptors: Option<&'a Path>,
    /// Retrieval descriptor file; present for retrieval pairing only.
    pub retrieval_descriptors: Option<&'a Path>,
    /// Neighbors to select per image, already clamped to the image count;
    /// present for retrieval pairing only.
    pub num_matched: Option<usize>,
    /// Where the pair list must be written.
    pub output: &'a Path,
    pub stdio: StdioPolicy,
}

/// Inputs for one matching invocation.
#[derive(Debug, Clone)]
pub struct MatchingRequest<'a> {
    /// Matcher configuration name on the collaborator side.
    pub conf_name: &'a str,
    /// Weight profile; `Some` only when the matcher's model declares a
    /// weights option.
    pub weights: Option<MatcherWeights>,
    pub pairs: &'a Path,
    pub descriptors: &'a Path,
    /// Where the match file must be written.
    pub matches: &'a Path,
    pub stdio: StdioPolicy,
}

/// Inputs for one reconstruction invocation.
#[derive(Debug, Clone)]
pub struct ReconstructionRequest<'a> {
    pub image_dir: &'a Path,
    pub image_names: &'a [String],
    pub pairs: &'a Path,
    pub descriptors: &'a Path,
    pub matches: &'a Path,
    /// Where the sparse model must be written.
    pub sfm_dir: &'a Path,
    pub camera_model: CameraModel,
    pub camera_mode: CameraMode,
    /// Worker threads for the collaborator's internal parallelism.
    pub num_threads: usize,
    pub stdio: StdioPolicy,
}

/// Inputs for one bundle-adjustment pass over an existing sparse model.
///
/// The model is loaded from and rewritten to `sfm_dir` in place.
#[derive(Debug, Clone)]
pub struct BundleAdjustRequest<'a> {
    pub sfm_dir: &'a Path,
    pub refine_principal_point: bool,
    pub stdio: StdioPolicy,
}

// ─────────────────────────────────────────────────────────────────────────────
// Contracts
// ─────────────────────────────────────────────────────────────────────────────

/// Computes per-image keypoint or global descriptors into a descriptor file.
pub trait FeatureExtraction {
    fn extract(&self, req: &ExtractionRequest<'_>) -> Result<PathBuf, StageError>;
}

/// Selects which image pairs are worth matching and writes the pair list.
pub trait Pairing {
    fn generate_pairs(&self, req: &PairingRequest<'_>) -> Result<PathBuf, StageError>;
}

/// Finds corresponding keypoints between paired images.
pub trait Matching {
    fn match_features(&self, req: &MatchingRequest<'_>) -> Result<PathBuf, StageError>;
}

/// Estimates camera poses and a sparse point cloud, and refines them.
pub trait Reconstruction {
    fn reconstruct(&self, req: &ReconstructionRequest<'_>) -> Result<PathBuf, StageError>;
    fn bundle_adjust(&self, req: &BundleAdjustRequest<'_>) -> Result<(), StageError>;
}

/// The full set of collaborators the driver invokes.
pub struct Collaborators {
    pub extractor: Box<dyn FeatureExtraction>,
    pub exhaustive_pairing: Box<dyn Pairing>,
    pub retrieval_pairing: Box<dyn Pairing>,
    pub matching: Box<dyn Matching>,
    pub reconstruction: Box<dyn Reconstruction>,
}
