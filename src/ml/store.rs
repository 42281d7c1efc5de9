//! Persistence for [`FittedPipeline`] artifacts.
//!
//! File layout: 8-byte magic, little-endian `u32` format version, 32-byte
//! BLAKE3 digest of the payload, then the JSON payload. Anything that does
//! not match is rejected as incompatible rather than decoded.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::{debug, info};

use super::fitted::{FORMAT_VERSION, FittedPipeline};

const MAGIC: &[u8; 8] = b"MACADVSR";
const DIGEST_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + 4 + DIGEST_LEN;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("incompatible model artifact {path}: {reason}")]
    Incompatible { path: PathBuf, reason: String },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn incompatible(path: &Path, reason: impl Into<String>) -> Self {
        StoreError::Incompatible {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Write the artifact via a temporary file in the target directory, then
/// rename it into place.
pub fn save_pipeline(pipeline: &FittedPipeline, path: &Path) -> Result<(), StoreError> {
    let bytes = encode_artifact(pipeline)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| StoreError::io(&dir, source))?;
    let mut tmp =
        tempfile::NamedTempFile::new_in(&dir).map_err(|source| StoreError::io(&dir, source))?;
    tmp.write_all(&bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|source| StoreError::io(tmp.path(), source))?;
    tmp.persist(path).map_err(|err| StoreError::io(path, err.error))?;
    info!("Model saved to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Read and verify an artifact written by [`save_pipeline`].
pub fn load_pipeline(path: &Path) -> Result<FittedPipeline, StoreError> {
    let bytes = std::fs::read(path).map_err(|source| StoreError::io(path, source))?;
    let pipeline = decode_artifact(&bytes).map_err(|reason| StoreError::incompatible(path, reason))?;
    debug!(
        "Loaded model from {} ({} members)",
        path.display(),
        pipeline.forest.n_members()
    );
    Ok(pipeline)
}

fn encode_artifact(pipeline: &FittedPipeline) -> Result<Vec<u8>, StoreError> {
    let payload = serde_json::to_vec(pipeline)?;
    let digest = blake3::hash(&payload);
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(digest.as_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

fn decode_artifact(bytes: &[u8]) -> Result<FittedPipeline, String> {
    if bytes.len() < HEADER_LEN {
        return Err(format!("file too short ({} bytes)", bytes.len()));
    }
    let (magic, rest) = bytes.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err("not a model artifact (bad magic)".to_string());
    }
    let (version, rest) = rest.split_at(4);
    let mut version_bytes = [0u8; 4];
    version_bytes.copy_from_slice(version);
    let version = u32::from_le_bytes(version_bytes);
    if version != FORMAT_VERSION {
        return Err(format!(
            "unsupported format version {version} (expected {FORMAT_VERSION})"
        ));
    }
    let (digest, payload) = rest.split_at(DIGEST_LEN);
    if blake3::hash(payload).as_bytes().as_slice() != digest {
        return Err("checksum mismatch".to_string());
    }
    let pipeline: FittedPipeline =
        serde_json::from_slice(payload).map_err(|err| format!("invalid payload: {err}"))?;
    pipeline.validate()?;
    Ok(pipeline)
}

/// Read-only model handle loaded on first use and shared afterwards.
///
/// A failed load leaves the handle empty so a later call can retry.
#[derive(Debug)]
pub struct SharedPipeline {
    path: PathBuf,
    cell: OnceLock<Arc<FittedPipeline>>,
}

impl SharedPipeline {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Return the shared pipeline, loading it from disk on the first call.
    pub fn get(&self) -> Result<Arc<FittedPipeline>, StoreError> {
        if let Some(pipeline) = self.cell.get() {
            return Ok(Arc::clone(pipeline));
        }
        let loaded = Arc::new(load_pipeline(&self.path)?);
        Ok(Arc::clone(self.cell.get_or_init(|| loaded)))
    }
}
