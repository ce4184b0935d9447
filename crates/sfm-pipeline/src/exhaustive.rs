//! Built-in exhaustive pairer.
//!
//! Exhaustive pairing needs nothing but the image set, so it is implemented
//! natively instead of delegating to a subprocess: every unordered pair of
//! distinct images, one `a b` line per pair, in the lexicographic order of
//! the (already sorted) image set. For `n` images that is C(n, 2) lines.

use crate::stage::{Pairing, PairingRequest};
use sfm_core::{StageError, StageId};
use std::path::PathBuf;

/// Native exhaustive pairing collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustivePairing;

impl Pairing for ExhaustivePairing {
    fn generate_pairs(&self, req: &PairingRequest<'_>) -> Result<PathBuf, StageError> {
        let names = req.image_names;
        let mut buf = String::new();
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                buf.push_str(a);
                buf.push(' ');
                buf.push_str(b);
                buf.push('\n');
            }
        }
        std::fs::write(req.output, buf).map_err(|source| StageError::Io {
            stage: StageId::Pairing,
            path: req.output.to_path_buf(),
            source,
        })?;
        Ok(req.output.to_path_buf())
    }
}
