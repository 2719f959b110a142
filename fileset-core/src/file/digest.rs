use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::file::classify;

const SIGNATURE_SEPARATOR: &str = "|";

/// Fingerprint a list of paths.
///
/// Each path contributes `path&<mtime ms>-<size>`, with either field left
/// empty when not requested or when the path is gone. Signatures are joined
/// in list order and hashed with SHA-256, hex encoded.
pub async fn file_list_hash(
    paths: &[PathBuf],
    include_last_modified: bool,
    include_size: bool,
) -> Result<String> {
    let mut signatures = Vec::with_capacity(paths.len());
    for path in paths {
        let stats = if include_last_modified || include_size {
            classify::stat(path).await?
        } else {
            None
        };

        let last_modified = stats
            .as_ref()
            .filter(|_| include_last_modified)
            .and_then(|stats| stats.last_modified_millis())
            .map(|millis| millis.to_string())
            .unwrap_or_default();
        let size = stats
            .as_ref()
            .filter(|_| include_size)
            .map(|stats| stats.size.to_string())
            .unwrap_or_default();

        signatures.push(format!("{}&{last_modified}-{size}", path.display()));
    }

    let mut hasher = Sha256::new();
    hasher.update(signatures.join(SIGNATURE_SEPARATOR).as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
