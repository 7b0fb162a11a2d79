//! File filtering logic for the scanner.

use std::collections::HashSet;
use std::path::Path;

/// Filters files to determine if they are images the detector accepts
pub struct ImageFilter {
    /// Lowercase file extensions to include
    extensions: HashSet<String>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl ImageFilter {
    /// Create a new filter accepting `.jpg` and `.jpeg`
    pub fn new() -> Self {
        Self {
            extensions: HashSet::from(["jpg".to_string(), "jpeg".to_string()]),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Override the list of extensions to accept
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Whether `path` names an image the pipeline should process
    pub fn should_include(&self, path: &Path) -> bool {
        if is_hidden(path) && !self.include_hidden {
            return false;
        }
        self.accepts_extension(path)
    }

    fn accepts_extension(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.contains(&ext.to_ascii_lowercase()),
            None => false,
        }
    }
}

/// Dotfiles, e.g. `._IMG_0001.jpg` sidecars left by macOS
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_jpeg_any_case() {
        let filter = ImageFilter::new();
        assert!(filter.should_include(Path::new("/photos/image.jpg")));
        assert!(filter.should_include(Path::new("/photos/image.JPEG")));
        assert!(filter.should_include(Path::new("/photos/image.Jpg")));
    }

    #[test]
    fn filter_excludes_other_formats() {
        let filter = ImageFilter::new();
        assert!(!filter.should_include(Path::new("/photos/image.png")));
        assert!(!filter.should_include(Path::new("/photos/notes.txt")));
    }

    #[test]
    fn filter_excludes_hidden_by_default() {
        let filter = ImageFilter::new();
        assert!(!filter.should_include(Path::new("/photos/.hidden.jpg")));
        assert!(ImageFilter::new()
            .with_hidden(true)
            .should_include(Path::new("/photos/.hidden.jpg")));
    }

    #[test]
    fn custom_extensions_are_normalized() {
        let filter = ImageFilter::new().with_extensions(vec![".PNG".to_string()]);
        assert!(filter.should_include(Path::new("/photos/a.png")));
        assert!(!filter.should_include(Path::new("/photos/a.jpg")));
    }

    #[test]
    fn filter_handles_no_extension() {
        let filter = ImageFilter::new();
        assert!(!filter.should_include(Path::new("/photos/no_extension")));
    }
}
