//! Filesystem utilities for jobs and converter output.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ConversionError;

/// Longest path component produced by the sanitizers, in characters.
const MAX_COMPONENT_CHARS: usize = 200;

/// Length of the random suffix of a job directory name.
const JOB_DIR_SUFFIX_LEN: usize = 12;

/// Filesystem utility functions.
pub struct FsUtils;

impl FsUtils {
    /// Sanitize an identifier or file stem for use as a path component.
    pub fn sanitize_stem(name: &str) -> String {
        let sanitized: String = clean(name).chars().take(MAX_COMPONENT_CHARS).collect();
        or_unnamed(sanitized)
    }

    /// Sanitize a file name, shortening only the stem so the extension
    /// (everything from the first `.` after the first character) survives.
    pub fn sanitize_file_name(name: &str) -> String {
        let cleaned = clean(name);
        let split = cleaned
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '.')
            .map_or(cleaned.len(), |(i, _)| i);
        let (stem, ext) = cleaned.split_at(split);

        let ext_chars = ext.chars().count();
        if ext_chars >= MAX_COMPONENT_CHARS {
            return Self::sanitize_stem(name);
        }
        let stem: String = stem.chars().take(MAX_COMPONENT_CHARS - ext_chars).collect();
        or_unnamed(format!("{stem}{ext}"))
    }

    /// Directory name unique to one job: `[SanitizedId]_[random]`.
    pub fn unique_dir_name(job_id: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "{}_{}",
            Self::sanitize_stem(job_id),
            &suffix[..JOB_DIR_SUFFIX_LEN]
        )
    }

    /// Whether `name` has the shape produced by [`unique_dir_name`](Self::unique_dir_name).
    pub fn is_job_dir_name(name: &str) -> bool {
        let Some((id, suffix)) = name.rsplit_once('_') else {
            return false;
        };
        !id.is_empty()
            && suffix.len() == JOB_DIR_SUFFIX_LEN
            && suffix
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, 'a'..='f'))
    }

    /// All regular files under `dir`, sorted by path.
    pub async fn collect_files(dir: &Path) -> Result<Vec<PathBuf>, ConversionError> {
        let mut files = Vec::new();
        let mut dirs_to_visit = vec![dir.to_path_buf()];

        while let Some(current_dir) = dirs_to_visit.pop() {
            let mut entries = tokio::fs::read_dir(&current_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_file() {
                    files.push(entry.path());
                } else if file_type.is_dir() {
                    dirs_to_visit.push(entry.path());
                }
            }
        }

        files.sort();
        Ok(files)
    }

    /// Total size of `paths`, failing if any of them is missing.
    pub async fn total_size(paths: &[PathBuf]) -> Result<u64, ConversionError> {
        let mut total = 0u64;
        for path in paths {
            total += tokio::fs::metadata(path).await?.len();
        }
        Ok(total)
    }
}

fn clean(name: &str) -> String {
    name.chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect()
}

// A bare "." or ".." would escape the parent directory.
fn or_unnamed(sanitized: String) -> String {
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "unnamed".to_string()
    } else {
        sanitized
    }
}
