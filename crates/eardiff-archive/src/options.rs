//! Scan configuration
//!
//! [`ScanOptions`] is passed explicitly through every flatten call; nothing
//! about a scan lives in process-wide state.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::zip::ZipEntry;

/// Extensions treated as nested archives unless overridden
pub const DEFAULT_NESTED_EXTENSIONS: &[&str] = &["jar", "war", "ear"];

/// How a nested archive's bytes are materialized before descending into it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStrategy {
    /// Buffer in memory up to the memory limit, spill to a temp file above it
    #[default]
    Auto,
    /// Always decompress into memory
    Memory,
    /// Always stream into a scoped temporary file
    Disk,
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionStrategy::Auto => "auto",
            ExtractionStrategy::Memory => "memory",
            ExtractionStrategy::Disk => "disk",
        };
        f.write_str(name)
    }
}

impl FromStr for ExtractionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ExtractionStrategy::Auto),
            "memory" => Ok(ExtractionStrategy::Memory),
            "disk" => Ok(ExtractionStrategy::Disk),
            _ => Err(format!("Unknown extraction strategy: {}", s)),
        }
    }
}

/// Configuration options for flattening archives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Lowercase extensions (without dot) that mark nested archives
    pub nested_extensions: Vec<String>,
    /// Maximum nesting depth below the top-level archive
    pub max_nesting_depth: u32,
    /// Where nested archive bytes go while they are scanned
    pub extraction: ExtractionStrategy,
    /// Largest uncompressed nested archive held in memory (in bytes)
    pub memory_limit: u64,
    /// Directory for temporary extraction files, system default if unset
    pub temp_dir: Option<PathBuf>,
    /// Whether to use memory mapping for large top-level archives
    pub use_memory_mapping: bool,
    /// Minimum file size to enable memory mapping
    pub memory_mapping_threshold: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            nested_extensions: DEFAULT_NESTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_nesting_depth: 32,
            extraction: ExtractionStrategy::Auto,
            memory_limit: 256 * 1024 * 1024, // 256 MB
            temp_dir: None,
            use_memory_mapping: true,
            memory_mapping_threshold: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl ScanOptions {
    /// Replace the nested archive extensions, normalizing case and dots
    pub fn with_nested_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.nested_extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Whether the flattener should descend into `entry`
    pub fn is_nested_archive(&self, entry: &ZipEntry) -> bool {
        !entry.is_directory
            && self
                .nested_extensions
                .iter()
                .any(|ext| entry.has_extension(ext))
    }

    /// Resolve `Auto` into a concrete strategy for one entry
    pub fn strategy_for(&self, entry: &ZipEntry) -> ExtractionStrategy {
        match self.extraction {
            ExtractionStrategy::Auto if entry.uncompressed_size > self.memory_limit => {
                ExtractionStrategy::Disk
            }
            ExtractionStrategy::Auto => ExtractionStrategy::Memory,
            concrete => concrete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::CompressionMethod;

    fn entry(name: &str, size: u64) -> ZipEntry {
        ZipEntry {
            name: name.to_string(),
            compression: CompressionMethod::Deflate,
            crc32: 0,
            compressed_size: size,
            uncompressed_size: size,
            local_header_offset: 0,
            flags: 0,
            is_directory: name.ends_with('/'),
        }
    }

    #[test]
    fn test_default_nested_extensions() {
        let options = ScanOptions::default();
        assert!(options.is_nested_archive(&entry("WEB-INF/lib/util.jar", 10)));
        assert!(options.is_nested_archive(&entry("web.WAR", 10)));
        assert!(!options.is_nested_archive(&entry("docs/readme.txt", 10)));
        assert!(!options.is_nested_archive(&entry("lib.jar/", 0)));
    }

    #[test]
    fn test_custom_extensions_are_normalized() {
        let options = ScanOptions::default().with_nested_extensions([".ZIP", " sar ", ""]);
        assert_eq!(options.nested_extensions, ["zip", "sar"]);
        assert!(options.is_nested_archive(&entry("bundle.zip", 1)));
        assert!(!options.is_nested_archive(&entry("lib/util.jar", 1)));
    }

    #[test]
    fn test_auto_strategy_spills_large_entries() {
        let options = ScanOptions {
            memory_limit: 1024,
            ..ScanOptions::default()
        };
        assert_eq!(options.strategy_for(&entry("small.jar", 1024)), ExtractionStrategy::Memory);
        assert_eq!(options.strategy_for(&entry("large.jar", 1025)), ExtractionStrategy::Disk);

        let forced = ScanOptions {
            extraction: ExtractionStrategy::Disk,
            ..options
        };
        assert_eq!(forced.strategy_for(&entry("small.jar", 1)), ExtractionStrategy::Disk);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("auto".parse(), Ok(ExtractionStrategy::Auto));
        assert_eq!("Memory".parse(), Ok(ExtractionStrategy::Memory));
        assert_eq!("disk".parse(), Ok(ExtractionStrategy::Disk));
        assert!("tape".parse::<ExtractionStrategy>().is_err());
    }

    #[test]
    fn test_options_serialize() {
        let json = serde_json::to_value(ScanOptions::default()).unwrap();
        assert_eq!(json["extraction"], "auto");
        assert_eq!(json["max_nesting_depth"], 32);
    }
}
