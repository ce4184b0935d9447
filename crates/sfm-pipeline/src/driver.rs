//! The pipeline driver state machine.
//!
//! Stages run in a fixed linear order: extraction, pairing, matching,
//! reconstruction, bundle adjustment. Whether a stage runs is decided
//! solely by the run configuration; whether its collaborator is actually
//! invoked is decided per artifact by the reuse policy. The driver is
//! single-threaded and strictly sequential at the stage level — each
//! collaborator call blocks until it completes or fails, and the first
//! failure ends the run.

use crate::stage::{
    BundleAdjustRequest, Collaborators, ExtractionRequest, MatchingRequest, PairingRequest,
    ReconstructionRequest, StdioPolicy,
};
use log::{debug, info};
use sfm_core::{
    reuse_existing, ArtifactLayout, ImageSet, PairingStrategy, PipelineError, RunConfig,
    StageError, StageId,
};
use std::path::{Path, PathBuf};

/// States of the driver state machine.
///
/// Transitions are strictly linear; `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Extracting,
    Pairing,
    Matching,
    Reconstructing,
    BundleAdjusting,
    Done,
    Failed,
}

/// Working state of one run: current machine state, the resolved layout,
/// the image set, and which stages completed, were invoked, or were
/// satisfied from cache. Created at run start, mutated only by the driver,
/// discarded at run end.
#[derive(Debug)]
struct PipelineState {
    state: DriverState,
    layout: ArtifactLayout,
    images: ImageSet,
    completed: Vec<StageId>,
    invoked: Vec<StageId>,
    reused: Vec<StageId>,
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunReport {
    pub state: DriverState,
    pub layout: ArtifactLayout,
    pub image_count: usize,
    /// Stages that completed, whether by invocation or cache reuse.
    pub completed: Vec<StageId>,
    /// Stages whose collaborator was actually invoked.
    pub invoked: Vec<StageId>,
    /// Stages satisfied entirely from cached artifacts.
    pub reused: Vec<StageId>,
}

/// Drives one pipeline run from a validated configuration.
pub struct PipelineDriver {
    config: RunConfig,
    collaborators: Collaborators,
}

impl PipelineDriver {
    pub fn new(config: RunConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run all enabled stages against the images under `image_dir`.
    ///
    /// Artifacts land in deterministic locations under the image
    /// directory's parent; see [`ArtifactLayout`]. Validation and image
    /// discovery happen before any artifact is touched.
    pub fn run(&self, image_dir: &Path) -> Result<RunReport, PipelineError> {
        self.config.validate()?;

        let _output_guard = self.config.output.apply();

        let images = ImageSet::discover(image_dir)?;
        let root = run_root(image_dir);
        let layout = ArtifactLayout::resolve(root, &self.config);

        let mut st = PipelineState {
            state: DriverState::Idle,
            layout,
            images,
            completed: Vec::new(),
            invoked: Vec::new(),
            reused: Vec::new(),
        };

        match self.execute(image_dir, &mut st) {
            Ok(()) => {
                st.state = DriverState::Done;
                Ok(RunReport {
                    state: st.state,
                    layout: st.layout,
                    image_count: st.images.len(),
                    completed: st.completed,
                    invoked: st.invoked,
                    reused: st.reused,
                })
            }
            Err(err) => {
                st.state = DriverState::Failed;
                Err(err)
            }
        }
    }

    fn execute(&self, image_dir: &Path, st: &mut PipelineState) -> Result<(), PipelineError> {
        let overwrite = self.config.overwrite;
        let stdio = StdioPolicy::from_output(&self.config.output);

        // ── Feature extraction ──────────────────────────────────────────────
        if let (Some(feature), Some(descriptors)) =
            (self.config.feature, st.layout.descriptors.clone())
        {
            st.state = DriverState::Extracting;
            if reuse_existing(&descriptors, overwrite) {
                debug!("reusing cached descriptors at '{}'", descriptors.display());
                st.reused.push(StageId::FeatureExtraction);
            } else {
                info!("feature extraction: {feature}");
                ensure_dir(StageId::FeatureExtraction, &st.layout.work_dir)?;
                self.collaborators.extractor.extract(&ExtractionRequest {
                    conf_name: feature.as_str(),
                    image_dir,
                    image_names: st.images.names(),
                    feature_path: &descriptors,
                    stdio,
                })?;
                st.invoked.push(StageId::FeatureExtraction);
            }
            st.completed.push(StageId::FeatureExtraction);
        }

        // ── Pairing ─────────────────────────────────────────────────────────
        if let Some(strategy) = self.config.pairing {
            st.state = DriverState::Pairing;
            match strategy {
                PairingStrategy::Exhaustive => {
                    if reuse_existing(&st.layout.pairs, overwrite) {
                        debug!("reusing cached pairs at '{}'", st.layout.pairs.display());
                        st.reused.push(StageId::Pairing);
                    } else {
                        info!("image pairing: exhaustive");
                        ensure_dir(StageId::Pairing, &st.layout.work_dir)?;
                        self.collaborators
                            .exhaustive_pairing
                            .generate_pairs(&PairingRequest {
                                image_names: st.images.names(),
                                image_dir,
                                descriptors: st.layout.descriptors.as_deref(),
                                retrieval_descriptors: None,
                                num_matched: None,
                                output: &st.layout.pairs,
                                stdio,
                            })?;
                        st.invoked.push(StageId::Pairing);
                    }
                }
                PairingStrategy::Retrieval => {
                    self.run_retrieval_pairing(image_dir, st, stdio)?;
                }
            }
            st.completed.push(StageId::Pairing);
        }

        // ── Matching ────────────────────────────────────────────────────────
        if let Some(matcher) = self.config.matcher {
            st.state = DriverState::Matching;
            if reuse_existing(&st.layout.matches, overwrite) {
                debug!("reusing cached matches at '{}'", st.layout.matches.display());
                st.reused.push(StageId::Matching);
            } else {
                let descriptors = require_descriptors(StageId::Matching, &st.layout)?;
                require_artifact(StageId::Matching, &descriptors)?;
                require_artifact(StageId::Matching, &st.layout.pairs)?;

                let conf = matcher.config();
                // The same matcher id can run with either weight profile,
                // so the profile is threaded through here, not baked into
                // the static configuration record.
                let weights = conf.has_weights.then_some(self.config.matcher_weights);
                match weights {
                    Some(w) => info!("feature matching: {matcher} ({w})"),
                    None => info!("feature matching: {matcher}"),
                }
                ensure_dir(StageId::Matching, &st.layout.work_dir)?;
                self.collaborators.matching.match_features(&MatchingRequest {
                    conf_name: conf.conf_name,
                    weights,
                    pairs: &st.layout.pairs,
                    descriptors: &descriptors,
                    matches: &st.layout.matches,
                    stdio,
                })?;
                st.invoked.push(StageId::Matching);
            }
            st.completed.push(StageId::Matching);
        }

        // ── Reconstruction and bundle adjustment ────────────────────────────
        if let Some(rc) = &self.config.reconstruction {
            st.state = DriverState::Reconstructing;
            let mut reconstruction_ran = false;
            if reuse_existing(&st.layout.sfm_dir, overwrite) {
                debug!(
                    "reusing sparse model at '{}'",
                    st.layout.sfm_dir.display()
                );
                st.reused.push(StageId::Reconstruction);
            } else {
                let descriptors = require_descriptors(StageId::Reconstruction, &st.layout)?;
                require_artifact(StageId::Reconstruction, &descriptors)?;
                require_artifact(StageId::Reconstruction, &st.layout.pairs)?;
                require_artifact(StageId::Reconstruction, &st.layout.matches)?;

                info!(
                    "reconstruction: {} images, camera model {}",
                    st.images.len(),
                    rc.camera_model
                );
                self.collaborators
                    .reconstruction
                    .reconstruct(&ReconstructionRequest {
                        image_dir,
                        image_names: st.images.names(),
                        pairs: &st.layout.pairs,
                        descriptors: &descriptors,
                        matches: &st.layout.matches,
                        sfm_dir: &st.layout.sfm_dir,
                        camera_model: rc.camera_model,
                        camera_mode: rc.camera_mode(),
                        num_threads: rc.effective_num_threads(),
                        stdio,
                    })?;
                reconstruction_ran = true;
                st.invoked.push(StageId::Reconstruction);
            }
            st.completed.push(StageId::Reconstruction);

            if rc.global_bundle_adjustment {
                if reconstruction_ran {
                    st.state = DriverState::BundleAdjusting;
                    info!("global bundle adjustment");
                    self.collaborators
                        .reconstruction
                        .bundle_adjust(&BundleAdjustRequest {
                            sfm_dir: &st.layout.sfm_dir,
                            refine_principal_point: false,
                            stdio,
                        })?;
                    if rc.refine_principal_point {
                        // Principal-point refinement only after a first
                        // stabilizing pass.
                        debug!("second bundle adjustment pass, refining principal point");
                        self.collaborators
                            .reconstruction
                            .bundle_adjust(&BundleAdjustRequest {
                                sfm_dir: &st.layout.sfm_dir,
                                refine_principal_point: true,
                                stdio,
                            })?;
                    }
                    st.invoked.push(StageId::BundleAdjustment);
                    st.completed.push(StageId::BundleAdjustment);
                } else {
                    debug!("skipping bundle adjustment: sparse model was reused");
                    st.reused.push(StageId::BundleAdjustment);
                }
            }
        }

        Ok(())
    }

    /// Retrieval pairing: a nested retrieval-descriptor extraction (always
    /// part of this strategy, whether or not primary extraction ran),
    /// followed by top-k neighbor selection.
    fn run_retrieval_pairing(
        &self,
        image_dir: &Path,
        st: &mut PipelineState,
        stdio: StdioPolicy,
    ) -> Result<(), PipelineError> {
        let retrieval = self.config.retrieval;
        let retrieval_descriptors = match st.layout.retrieval_descriptors.clone() {
            Some(path) => path,
            None => st.layout.work_dir.join(retrieval.descriptor_file_name()),
        };

        if reuse_existing(&retrieval_descriptors, self.config.overwrite) {
            debug!(
                "reusing cached retrieval descriptors at '{}'",
                retrieval_descriptors.display()
            );
        } else {
            info!("feature extraction for retrieval: {retrieval}");
            ensure_dir(StageId::Pairing, &st.layout.work_dir)?;
            self.collaborators.extractor.extract(&ExtractionRequest {
                conf_name: retrieval.as_str(),
                image_dir,
                image_names: st.images.names(),
                feature_path: &retrieval_descriptors,
                stdio,
            })?;
        }

        if reuse_existing(&st.layout.pairs, self.config.overwrite) {
            debug!("reusing cached pairs at '{}'", st.layout.pairs.display());
            st.reused.push(StageId::Pairing);
        } else {
            require_artifact(StageId::Pairing, &retrieval_descriptors)?;
            info!("image pairing: retrieval");
            ensure_dir(StageId::Pairing, &st.layout.work_dir)?;
            let num_matched = st.images.len().min(self.config.top_k_matches);
            self.collaborators
                .retrieval_pairing
                .generate_pairs(&PairingRequest {
                    image_names: st.images.names(),
                    image_dir,
                    descriptors: st.layout.descriptors.as_deref(),
                    retrieval_descriptors: Some(&retrieval_descriptors),
                    num_matched: Some(num_matched),
                    output: &st.layout.pairs,
                    stdio,
                })?;
            st.invoked.push(StageId::Pairing);
        }
        Ok(())
    }
}

/// Artifacts are rooted at the image directory's parent.
fn run_root(image_dir: &Path) -> &Path {
    match image_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn ensure_dir(stage: StageId, dir: &Path) -> Result<(), StageError> {
    std::fs::create_dir_all(dir).map_err(|source| StageError::Io {
        stage,
        path: dir.to_path_buf(),
        source,
    })
}

fn require_artifact(stage: StageId, path: &Path) -> Result<(), StageError> {
    if path.exists() {
        Ok(())
    } else {
        Err(StageError::PartialArtifact {
            stage,
            path: path.to_path_buf(),
        })
    }
}

fn require_descriptors(stage: StageId, layout: &ArtifactLayout) -> Result<PathBuf, StageError> {
    layout
        .descriptors
        .clone()
        .ok_or(StageError::MissingInput {
            stage,
            what: "a descriptor file (enable feature extraction)",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_root_is_the_parent_directory() {
        assert_eq!(run_root(Path::new("/data/scene/images")), Path::new("/data/scene"));
        assert_eq!(run_root(Path::new("images")), Path::new("."));
    }

    #[test]
    fn require_artifact_reports_missing_path() {
        let err = require_artifact(StageId::Matching, Path::new("/no/such/pairs.txt")).unwrap_err();
        match err {
            StageError::PartialArtifact { stage, path } => {
                assert_eq!(stage, StageId::Matching);
                assert_eq!(path, Path::new("/no/such/pairs.txt"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
