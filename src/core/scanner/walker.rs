//! Directory walking implementation using walkdir.

use super::{filter::ImageFilter, ImageFile, ImageScanner, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files
    pub include_hidden: bool,
    /// Maximum directory depth. The input layout is flat, so the default
    /// of 1 only looks at the directory's direct children, which also
    /// keeps earlier output folders out of the scan.
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = jpg/jpeg)
    pub extensions: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: false,
            max_depth: Some(1),
            extensions: None,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self { config, filter }
    }

    /// Scan a single directory
    fn scan_directory(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<(Vec<ImageFile>, Vec<ScanError>), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut images = Vec::new();
        let mut errors = Vec::new();

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = match e.io_error().map(|io| io.kind()) {
                        Some(std::io::ErrorKind::PermissionDenied) => {
                            ScanError::PermissionDenied { path }
                        }
                        _ => ScanError::ReadDirectory {
                            path,
                            source: std::io::Error::other(e.to_string()),
                        },
                    };
                    report_error(events, &mut errors, error);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.filter.should_include(entry.path()) {
                continue;
            }

            let path = entry.path().to_path_buf();
            match entry.metadata() {
                Ok(metadata) => {
                    events.send(Event::Scan(ScanEvent::ImageFound { path: path.clone() }));
                    images.push(ImageFile {
                        path,
                        size: metadata.len(),
                    });
                }
                Err(e) => {
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                    report_error(events, &mut errors, ScanError::ReadDirectory { path, source });
                }
            }
        }

        Ok((images, errors))
    }
}

impl ImageScanner for WalkDirScanner {
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError> {
        self.scan_with_events(paths, &crate::events::null_sender())
    }

    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            paths: paths.to_vec(),
        }));

        let mut all_images = Vec::new();
        let mut all_errors = Vec::new();

        for path in paths {
            match self.scan_directory(path, events) {
                Ok((images, errors)) => {
                    all_images.extend(images);
                    all_errors.extend(errors);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping input: {}", e);
                    report_error(events, &mut all_errors, e);
                }
            }
        }

        // Overlapping inputs must not process an image twice
        all_images.sort_by(|a, b| a.path.cmp(&b.path));
        all_images.dedup_by(|a, b| a.path == b.path);

        events.send(Event::Scan(ScanEvent::Completed {
            total_images: all_images.len(),
        }));

        Ok(ScanResult {
            images: all_images,
            errors: all_errors,
        })
    }
}

/// Record a non-fatal scan error and tell the front end about it
fn report_error(events: &EventSender, errors: &mut Vec<ScanError>, error: ScanError) {
    let path = match &error {
        ScanError::DirectoryNotFound { path }
        | ScanError::PermissionDenied { path }
        | ScanError::ReadDirectory { path, .. } => path.clone(),
    };
    tracing::debug!(path = %path.display(), "scan error: {}", error);
    events.send(Event::Scan(ScanEvent::Error {
        path,
        message: error.to_string(),
    }));
    errors.push(error);
}
