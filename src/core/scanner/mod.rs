//! # Scanner Module
//!
//! Discovers the images to process in the input directory.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//!
//! ## Example
//! ```rust,ignore
//! use entity_match::core::scanner::{ImageScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let images = scanner.scan(&["All_Images".into()])?;
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Represents a discovered image file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    /// Path to the image file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl ImageFile {
    /// File name without extension, used to name the output folder
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Discovered images, sorted by path
    pub images: Vec<ImageFile>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for image scanners
///
/// Implement this trait to feed the pipeline from another source.
pub trait ImageScanner: Send + Sync {
    /// Scan directories and return discovered images
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError>;

    /// Scan with progress reporting via events
    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_drops_extension() {
        let image = ImageFile {
            path: PathBuf::from("/All_Images/beach_dog.jpeg"),
            size: 10,
        };
        assert_eq!(image.stem(), "beach_dog");
    }

    #[test]
    fn stem_keeps_inner_dots() {
        let image = ImageFile {
            path: PathBuf::from("/All_Images/img.2023.05.jpg"),
            size: 10,
        };
        assert_eq!(image.stem(), "img.2023.05");
    }
}
