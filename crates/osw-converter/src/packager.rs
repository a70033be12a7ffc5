//! Normalization of converter output into one deliverable.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use osw_core::JobError;

use crate::error::ConversionError;
use crate::filesystem::FsUtils;

/// Turns one or many artifacts into exactly one file.
#[derive(Debug, Clone, Default)]
pub struct OutputPackager;

impl OutputPackager {
    /// Create a packager.
    pub fn new() -> Self {
        Self
    }

    /// Package `artifacts` into a single deliverable.
    ///
    /// One artifact is returned unchanged. Several are written into
    /// `<dest_dir>/<job_prefix>.zip` under their base names, each original
    /// deleted as soon as it is in the archive. No artifacts is an error.
    pub async fn package(
        &self,
        artifacts: Vec<PathBuf>,
        job_prefix: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, JobError> {
        match artifacts.len() {
            0 => Err(JobError::Packaging(
                "conversion reported success without artifacts".to_string(),
            )),
            1 => {
                let mut artifacts = artifacts;
                Ok(artifacts.remove(0))
            }
            count => {
                let archive_path =
                    dest_dir.join(format!("{}.zip", FsUtils::sanitize_stem(job_prefix)));
                let target = archive_path.clone();
                tokio::task::spawn_blocking(move || write_archive(&artifacts, &target))
                    .await
                    .map_err(ConversionError::from)
                    .and_then(|r| r)
                    .map_err(|e| JobError::Packaging(e.to_string()))?;

                info!(
                    artifacts = count,
                    archive = %archive_path.display(),
                    "Packaged converter output"
                );
                Ok(archive_path)
            }
        }
    }
}

fn write_archive(artifacts: &[PathBuf], archive_path: &Path) -> Result<(), ConversionError> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(artifacts.len());
    for path in artifacts {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ConversionError::InvalidArtifact { path: path.clone() })?;
        if !seen.insert(name) {
            return Err(ConversionError::DuplicateEntry {
                name: name.to_string(),
            });
        }
        names.push(name);
    }

    let mut writer = ZipWriter::new(File::create(archive_path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (path, name) in artifacts.iter().zip(names) {
        writer.start_file(name, options)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut writer)?;
        drop(source);
        fs::remove_file(path)?;
        debug!(artifact = %path.display(), "Added artifact to archive");
    }

    writer.finish()?;
    Ok(())
}
