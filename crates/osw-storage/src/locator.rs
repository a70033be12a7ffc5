//! Locators of input objects.
//!
//! Producers send either a full blob URL
//! (`https://<account>/<container>/<path>`), possibly percent-encoded, or a
//! path relative to the container. Both resolve to the same container
//! relative path.

use std::path::Path;

use percent_encoding::percent_decode_str;
use url::Url;

use osw_core::JobError;
use osw_core::types::DataFormat;

/// A validated, container-relative object path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocator {
    raw: String,
    path: String,
}

impl BlobLocator {
    /// Parse `raw` against `container`.
    ///
    /// The container segment and everything before it are dropped. `.` and
    /// `..` segments are rejected, as is a locator with no file name.
    pub fn parse(raw: &str, container: &str) -> Result<Self, JobError> {
        let decoded = decode(raw).map_err(|reason| JobError::acquisition(raw, reason))?;
        // URL parsing would silently normalize dot segments away.
        if has_dot_segment(&decoded) {
            return Err(JobError::acquisition(raw, "path traversal is not allowed"));
        }

        // Decode exactly once: a `%25` in a blob name stays a literal `%`.
        let full_path = match Url::parse(raw) {
            Ok(url) if is_object_url(&url) => {
                decode(url.path()).map_err(|reason| JobError::acquisition(raw, reason))?
            }
            _ => match Url::parse(&decoded) {
                Ok(url) if is_object_url(&url) => url_path(&decoded).to_string(),
                _ => decoded,
            },
        };

        if has_dot_segment(&full_path) {
            return Err(JobError::acquisition(raw, "path traversal is not allowed"));
        }
        let segments: Vec<&str> = full_path.split('/').filter(|s| !s.is_empty()).collect();

        let relative = match segments.iter().position(|s| *s == container) {
            Some(index) => &segments[index + 1..],
            None => &segments[..],
        };
        if relative.is_empty() {
            return Err(JobError::acquisition(raw, "locator has no file name"));
        }

        Ok(Self {
            raw: raw.to_string(),
            path: relative.join("/"),
        })
    }

    /// Locator as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Container-relative path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Format implied by the file extension.
    pub fn format(&self) -> Option<DataFormat> {
        DataFormat::from_path(Path::new(self.file_name()))
    }
}

fn is_object_url(url: &Url) -> bool {
    url.has_host() || url.scheme() == "file"
}

/// Path part of an already decoded URL, taken verbatim.
fn url_path(decoded: &str) -> &str {
    decoded
        .split_once("://")
        .and_then(|(_, rest)| rest.find('/').map(|i| &rest[i..]))
        .unwrap_or_default()
}

fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|s| s == "." || s == "..")
}

fn decode(value: &str) -> Result<String, String> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| format!("locator is not valid UTF-8 once decoded: {e}"))
}
