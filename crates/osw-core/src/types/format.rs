//! Data format tags and extension inference.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

macro_rules! define_extensions {
    ($($variant:ident => $ext:literal),* $(,)?) => {
        static EXTENSION_MAP: LazyLock<HashMap<&'static str, DataFormat>> = LazyLock::new(|| {
            HashMap::from([$(($ext, DataFormat::$variant),)*])
        });

        impl DataFormat {
            /// All file extensions the converter accepts as input.
            pub const SUPPORTED_EXTENSIONS: &'static [&'static str] = &[$($ext,)*];
        }
    };
}

define_extensions! {
    GraphArchive => "zip",
    OsmXml       => "xml",
    OsmXml       => "osm",
    OsmPbf       => "pbf",
}

/// Exchange formats understood by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataFormat {
    /// Zipped tabular graph (OSW).
    GraphArchive,
    /// OSM XML document.
    OsmXml,
    /// OSM protocol-buffer binary.
    OsmPbf,
}

impl DataFormat {
    /// Infer the format of a file from its last extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        EXTENSION_MAP.get(ext.as_str()).copied()
    }

    /// Parse a format tag as used by on-demand requests.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "osw" | "zip" | "graph-archive" => Some(Self::GraphArchive),
            "osm" | "xml" | "osm-xml" => Some(Self::OsmXml),
            "pbf" | "osm-pbf" => Some(Self::OsmPbf),
            _ => None,
        }
    }

    /// Whether this is the archive (OSW) family.
    pub fn is_archive(&self) -> bool {
        matches!(self, Self::GraphArchive)
    }

    /// Conversion direction for an input of this format.
    pub fn direction(&self) -> ConversionDirection {
        if self.is_archive() {
            ConversionDirection::OswToOsm
        } else {
            ConversionDirection::OsmToOsw
        }
    }

    /// Format a converter produces by default for an input of this format.
    pub fn default_target(&self) -> Self {
        match self.direction() {
            ConversionDirection::OswToOsm => Self::OsmXml,
            ConversionDirection::OsmToOsw => Self::GraphArchive,
        }
    }

    /// Whether a conversion from `self` to `target` crosses format families.
    pub fn can_convert_to(&self, target: Self) -> bool {
        self.is_archive() != target.is_archive()
    }

    /// Short tag used in logs and converter arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GraphArchive => "osw",
            Self::OsmXml => "osm",
            Self::OsmPbf => "pbf",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a conversion runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionDirection {
    /// Graph archive to OSM.
    OswToOsm,
    /// OSM XML/PBF to graph archive.
    OsmToOsw,
}
