//! Fully-resolved run configuration.
//!
//! A [`RunConfig`] is the validated set of choices for one pipeline
//! execution. It is constructed once (by the CLI or a test), checked by
//! [`crate::compat::validate`], and then handed to the driver, which owns
//! it for the duration of the run. Stages whose identifier is `None` are
//! disabled and skipped by the driver.

use crate::compat;
use crate::error::IncompatibleConfig;
use crate::ids::{
    CameraModel, FeatureId, MatcherId, MatcherWeights, PairingStrategy, RetrievalId,
};
use crate::output::OutputConfig;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Whether all images share one camera instance or each gets its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraMode {
    /// One shared camera for all images.
    Single,
    /// One camera per image.
    PerImage,
}

impl CameraMode {
    pub fn from_single_camera(single_camera: bool) -> Self {
        if single_camera {
            CameraMode::Single
        } else {
            CameraMode::PerImage
        }
    }
}

/// Sub-options for the reconstruction stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// Camera model string handed to the reconstruction collaborator.
    pub camera_model: CameraModel,
    /// Use the same camera for all images.
    pub single_camera: bool,
    /// Run a global bundle adjustment pass after mapping.
    pub global_bundle_adjustment: bool,
    /// Run a second bundle adjustment pass with principal-point refinement.
    /// Applied only after a first stabilizing pass; the refinement is
    /// numerically less stable early.
    pub refine_principal_point: bool,
    /// Worker threads for the reconstruction collaborator. `None` means
    /// derive from available parallelism.
    pub num_threads: Option<NonZeroUsize>,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            camera_model: CameraModel::Opencv,
            single_camera: true,
            global_bundle_adjustment: true,
            refine_principal_point: true,
            num_threads: None,
        }
    }
}

impl ReconstructionConfig {
    /// Camera mode derived from `single_camera`.
    pub fn camera_mode(&self) -> CameraMode {
        CameraMode::from_single_camera(self.single_camera)
    }

    /// Explicit thread count, or the host's available parallelism.
    pub fn effective_num_threads(&self) -> usize {
        match self.num_threads {
            Some(n) => n.get(),
            None => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

/// The fully-resolved configuration for one pipeline run.
///
/// Immutable once constructed. Invalid feature/matcher combinations must
/// never reach the driver; call [`RunConfig::validate`] (the driver does so
/// as well, before touching the filesystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Feature extractor; `None` disables extraction.
    pub feature: Option<FeatureId>,
    /// Pairing strategy; `None` disables pairing.
    pub pairing: Option<PairingStrategy>,
    /// Retrieval descriptor used when `pairing` is retrieval.
    pub retrieval: RetrievalId,
    /// Number of nearest neighbors requested per image in retrieval
    /// pairing, before clamping to the image count.
    pub top_k_matches: usize,
    /// Matcher; `None` disables matching.
    pub matcher: Option<MatcherId>,
    /// Weight profile, threaded through only to matchers whose model
    /// declares a weights option.
    pub matcher_weights: MatcherWeights,
    /// Reconstruction stage options; `None` disables reconstruction.
    pub reconstruction: Option<ReconstructionConfig>,
    /// Recompute and replace existing artifacts instead of reusing them.
    pub overwrite: bool,
    /// Verbosity axes applied uniformly to every stage invocation.
    pub output: OutputConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            feature: Some(FeatureId::SuperpointAachen),
            pairing: Some(PairingStrategy::Retrieval),
            retrieval: RetrievalId::Netvlad,
            top_k_matches: 50,
            matcher: Some(MatcherId::Superglue),
            matcher_weights: MatcherWeights::Outdoor,
            reconstruction: Some(ReconstructionConfig::default()),
            overwrite: false,
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    /// Check feature/matcher compatibility. Pure; no filesystem access.
    pub fn validate(&self) -> Result<(), IncompatibleConfig> {
        compat::validate(self)
    }
}
