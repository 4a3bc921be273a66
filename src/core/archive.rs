//! Gzipped tar backups carrying a SHA-256 manifest

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use super::backend::RestoreSummary;
use super::error::BackendError;

/// Name of the manifest entry mapping archived paths to their digests
pub const MANIFEST_NAME: &str = "verify.json";

const MAX_COMPRESSION_LEVEL: u32 = 9;

fn archive_name(relative: &str) -> String {
    relative
        .replace('\\', "/")
        .trim_start_matches('/')
        .to_string()
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

fn is_safe(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Pack `files` (relative to `base_directory`) into `destination`
pub fn create(
    files: &[String],
    base_directory: &Path,
    destination: &Path,
    compression_level: u32,
) -> Result<(), BackendError> {
    let writer = BufWriter::new(File::create(destination)?);
    let encoder = GzEncoder::new(
        writer,
        Compression::new(compression_level.min(MAX_COMPRESSION_LEVEL)),
    );
    let mut builder = tar::Builder::new(encoder);

    let mut manifest: BTreeMap<String, String> = BTreeMap::new();
    for relative in files {
        let name = archive_name(relative);
        let data = fs::read(base_directory.join(&name))?;
        manifest.insert(name.clone(), sha256_hex(&data));

        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, &name, data.as_slice())?;
    }

    let manifest = serde_json::to_vec_pretty(&manifest)?;
    let mut header = tar::Header::new_gnu();
    header.set_size(manifest.len() as u64);
    header.set_mode(0o644);
    builder.append_data(&mut header, MANIFEST_NAME, manifest.as_slice())?;

    builder.into_inner()?.finish()?.flush()?;
    Ok(())
}

/// Restore every manifest entry whose digest matches into `restore_base`
pub fn restore(archive: &Path, restore_base: &Path) -> Result<RestoreSummary, BackendError> {
    let decoder = GzDecoder::new(BufReader::new(File::open(archive)?));
    let mut tar = tar::Archive::new(decoder);

    let mut entries: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut manifest: Option<BTreeMap<String, String>> = None;
    for entry in tar.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;

        if name == MANIFEST_NAME {
            manifest = Some(serde_json::from_slice(&data)?);
        } else {
            entries.insert(name, data);
        }
    }

    let manifest = manifest.ok_or_else(|| {
        BackendError::Verification(format!("archive has no {MANIFEST_NAME} manifest"))
    })?;

    let mut summary = RestoreSummary::default();
    for (name, expected) in &manifest {
        let verified = entries
            .get(name)
            .filter(|data| is_safe(name) && sha256_hex(data) == *expected);
        match verified {
            Some(data) => {
                let target = restore_base.join(name);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, data)?;
                summary.success_count += 1;
            }
            None => {
                tracing::warn!("Skipping unverified archive entry: {}", name);
                summary.failed_count += 1;
                summary.failed_paths.push(name.clone());
            }
        }
    }

    Ok(summary)
}
