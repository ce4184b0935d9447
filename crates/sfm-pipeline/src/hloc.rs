//! Subprocess-backed collaborators.
//!
//! The expensive stages are driven by hloc and pycolmap running in a Python
//! interpreter. Each collaborator launches a small embedded driver snippet
//! with `python -c`; snippets are used instead of the hloc module CLIs
//! because some parameters (the matcher weights profile, the camera mode)
//! are only reachable programmatically.
//!
//! The orchestrator decides reuse-vs-recompute before a collaborator is
//! invoked, so every snippet passes `overwrite=True` to hloc — by the time
//! a subprocess starts, the decision to replace the artifact is final.

use crate::exhaustive::ExhaustivePairing;
use crate::stage::{
    BundleAdjustRequest, Collaborators, ExtractionRequest, FeatureExtraction, Matching,
    MatchingRequest, Pairing, Reconstruction, ReconstructionRequest, StdioPolicy,
};
use sfm_core::{CameraMode, StageError, StageId};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

const EXTRACT_SCRIPT: &str = r#"
import sys
from pathlib import Path
from hloc import extract_features

conf_name, image_dir, feature_path = sys.argv[1:4]
image_list = sys.argv[4:]
feature_path = Path(feature_path)
extract_features.main(
    conf=extract_features.confs[conf_name],
    image_dir=Path(image_dir),
    export_dir=feature_path.parent,
    image_list=image_list,
    feature_path=feature_path,
    overwrite=True,
)
"#;

const RETRIEVAL_PAIRS_SCRIPT: &str = r#"
import sys
from pathlib import Path
from hloc import pairs_from_retrieval

descriptors, output, num_matched = sys.argv[1:4]
pairs_from_retrieval.main(
    descriptors=Path(descriptors),
    output=Path(output),
    num_matched=int(num_matched),
)
"#;

const MATCH_SCRIPT: &str = r#"
import sys
from pathlib import Path
from hloc import match_features

conf_name, weights, pairs, features, matches = sys.argv[1:6]
conf = match_features.confs[conf_name]
if weights != "-":
    conf["model"]["weights"] = weights
matches = Path(matches)
match_features.main(
    conf=conf,
    pairs=Path(pairs),
    features=Path(features),
    export_dir=matches.parent,
    matches=matches,
    overwrite=True,
)
"#;

const RECONSTRUCT_SCRIPT: &str = r#"
import sys
from pathlib import Path
import pycolmap
from hloc import reconstruction

(sfm_dir, image_dir, pairs, features, matches,
 camera_model, camera_mode, num_threads) = sys.argv[1:9]
image_list = sys.argv[9:]
mode = pycolmap.CameraMode.SINGLE if camera_mode == "single" else pycolmap.CameraMode.PER_IMAGE
reconstruction.main(
    sfm_dir=Path(sfm_dir),
    image_dir=Path(image_dir),
    pairs=Path(pairs),
    features=Path(features),
    matches=Path(matches),
    camera_mode=mode,
    image_list=image_list,
    image_options=pycolmap.ImageReaderOptions(camera_model=camera_model),
    mapper_options={"num_threads": int(num_threads)},
)
"#;

const BUNDLE_SCRIPT: &str = r#"
import sys
import pycolmap

sfm_dir, refine_pp = sys.argv[1:3]
rec = pycolmap.Reconstruction()
rec.read(sfm_dir)
options = pycolmap.BundleAdjustmentOptions(refine_principal_point=(refine_pp == "1"))
pycolmap.bundle_adjustment(rec, options)
rec.write(sfm_dir)
"#;

fn run_python(
    python: &Path,
    stage: StageId,
    script: &str,
    args: Vec<OsString>,
    stdio: StdioPolicy,
) -> Result<(), StageError> {
    let mut cmd = Command::new(python);
    cmd.arg("-c").arg(script).args(args);
    stdio.apply_to(&mut cmd);

    let status = cmd.status().map_err(|e| StageError::Collaborator {
        stage,
        message: format!("failed to launch '{}': {e}", python.display()),
    })?;
    if !status.success() {
        return Err(StageError::Collaborator {
            stage,
            message: format!("python exited with {status}"),
        });
    }
    Ok(())
}

/// hloc-backed feature extraction, for both local and retrieval descriptors.
pub struct HlocFeatureExtraction {
    python: PathBuf,
}

impl FeatureExtraction for HlocFeatureExtraction {
    fn extract(&self, req: &ExtractionRequest<'_>) -> Result<PathBuf, StageError> {
        let mut args: Vec<OsString> = vec![
            req.conf_name.into(),
            req.image_dir.into(),
            req.feature_path.into(),
        ];
        args.extend(req.image_names.iter().map(OsString::from));
        run_python(
            &self.python,
            StageId::FeatureExtraction,
            EXTRACT_SCRIPT,
            args,
            req.stdio,
        )?;
        Ok(req.feature_path.to_path_buf())
    }
}

/// hloc-backed retrieval pairing (top-k nearest neighbors by global
/// descriptor similarity, self-pairs excluded).
pub struct HlocRetrievalPairing {
    python: PathBuf,
}

impl Pairing for HlocRetrievalPairing {
    fn generate_pairs(&self, req: &crate::stage::PairingRequest<'_>) -> Result<PathBuf, StageError> {
        let descriptors = req
            .retrieval_descriptors
            .ok_or(StageError::MissingInput {
                stage: StageId::Pairing,
                what: "retrieval descriptors",
            })?;
        let num_matched = req.num_matched.ok_or(StageError::MissingInput {
            stage: StageId::Pairing,
            what: "a neighbor count",
        })?;
        let args: Vec<OsString> = vec![
            descriptors.into(),
            req.output.into(),
            num_matched.to_string().into(),
        ];
        run_python(
            &self.python,
            StageId::Pairing,
            RETRIEVAL_PAIRS_SCRIPT,
            args,
            req.stdio,
        )?;
        Ok(req.output.to_path_buf())
    }
}

/// hloc-backed feature matching.
pub struct HlocMatching {
    python: PathBuf,
}

impl Matching for HlocMatching {
    fn match_features(&self, req: &MatchingRequest<'_>) -> Result<PathBuf, StageError> {
        // "-" tells the snippet to leave the model's default weights alone.
        let weights = req.weights.map(|w| w.as_str()).unwrap_or("-");
        let args: Vec<OsString> = vec![
            req.conf_name.into(),
            weights.into(),
            req.pairs.into(),
            req.descriptors.into(),
            req.matches.into(),
        ];
        run_python(&self.python, StageId::Matching, MATCH_SCRIPT, args, req.stdio)?;
        Ok(req.matches.to_path_buf())
    }
}

/// pycolmap-backed incremental mapping and bundle adjustment.
pub struct PycolmapReconstruction {
    python: PathBuf,
}

impl Reconstruction for PycolmapReconstruction {
    fn reconstruct(&self, req: &ReconstructionRequest<'_>) -> Result<PathBuf, StageError> {
        let camera_mode = match req.camera_mode {
            CameraMode::Single => "single",
            CameraMode::PerImage => "per_image",
        };
        let mut args: Vec<OsString> = vec![
            req.sfm_dir.into(),
            req.image_dir.into(),
            req.pairs.into(),
            req.descriptors.into(),
            req.matches.into(),
            req.camera_model.as_str().into(),
            camera_mode.into(),
            req.num_threads.to_string().into(),
        ];
        args.extend(req.image_names.iter().map(OsString::from));
        run_python(
            &self.python,
            StageId::Reconstruction,
            RECONSTRUCT_SCRIPT,
            args,
            req.stdio,
        )?;
        Ok(req.sfm_dir.to_path_buf())
    }

    fn bundle_adjust(&self, req: &BundleAdjustRequest<'_>) -> Result<(), StageError> {
        let args: Vec<OsString> = vec![
            req.sfm_dir.into(),
            if req.refine_principal_point { "1" } else { "0" }.into(),
        ];
        run_python(
            &self.python,
            StageId::BundleAdjustment,
            BUNDLE_SCRIPT,
            args,
            req.stdio,
        )
    }
}

impl Collaborators {
    /// The default collaborator set: hloc/pycolmap subprocesses for the
    /// learned stages, the native pairer for exhaustive pairing.
    pub fn hloc(python: impl Into<PathBuf>) -> Self {
        let python = python.into();
        Self {
            extractor: Box::new(HlocFeatureExtraction {
                python: python.clone(),
            }),
            exhaustive_pairing: Box::new(ExhaustivePairing),
            retrieval_pairing: Box::new(HlocRetrievalPairing {
                python: python.clone(),
            }),
            matching: Box::new(HlocMatching {
                python: python.clone(),
            }),
            reconstruction: Box::new(PycolmapReconstruction { python }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfm_core::OutputConfig;

    #[test]
    fn missing_interpreter_is_a_collaborator_error() {
        let pairing = HlocRetrievalPairing {
            python: PathBuf::from("/nonexistent/python3"),
        };
        let dir = tempfile::tempdir().unwrap();
        let descriptors = dir.path().join("netvlad.h5");
        let output = dir.path().join("pairs.txt");
        let names = vec!["a.jpg".to_string(), "b.jpg".to_string()];

        let err = pairing
            .generate_pairs(&crate::stage::PairingRequest {
                image_names: &names,
                image_dir: dir.path(),
                descriptors: None,
                retrieval_descriptors: Some(&descriptors),
                num_matched: Some(2),
                output: &output,
                stdio: StdioPolicy::from_output(&OutputConfig::default()),
            })
            .unwrap_err();

        match err {
            StageError::Collaborator { stage, message } => {
                assert_eq!(stage, StageId::Pairing);
                assert!(message.contains("failed to launch"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn retrieval_pairing_needs_descriptors_and_count() {
        let pairing = HlocRetrievalPairing {
            python: PathBuf::from("python3"),
        };
        let names = vec!["a.jpg".to_string()];
        let output = PathBuf::from("pairs.txt");

        let err = pairing
            .generate_pairs(&crate::stage::PairingRequest {
                image_names: &names,
                image_dir: Path::new("."),
                descriptors: None,
                retrieval_descriptors: None,
                num_matched: Some(1),
                output: &output,
                stdio: StdioPolicy::from_output(&OutputConfig::default()),
            })
            .unwrap_err();
        assert!(matches!(err, StageError::MissingInput { .. }));
    }
}
