//! # Error Module
//!
//! Error types for the entity matcher.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Separate fatal from skippable** - a bad photo is recorded, a missing
//!   model aborts the run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum EntityMatchError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Detection error: {0}")]
    Detect(#[from] DetectError),

    #[error("Embedding error: {0}")]
    Embed(#[from] EmbedError),

    #[error("Annotation error: {0}")]
    Annotate(#[from] AnnotateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur during image discovery
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while loading a pretrained model
#[derive(Error, Debug)]
pub enum ModelError {
    /// The weights path does not point at a file
    #[error("Model file '{path}' not found")]
    NotFound { path: PathBuf },

    #[error("Failed to load model {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    #[error("Model {path} has an unexpected signature: {reason}")]
    InvalidSignature { path: PathBuf, reason: String },
}

/// An image file could not be decoded
#[derive(Error, Debug)]
#[error("Failed to decode image {path}: {reason}")]
pub struct DecodeError {
    pub path: PathBuf,
    pub reason: String,
}

/// Errors that occur while running the detector on one image
#[derive(Error, Debug)]
pub enum DetectError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Detector inference failed on {path}: {reason}")]
    Inference { path: PathBuf, reason: String },

    #[error("Detector produced an unexpected output shape {shape:?}")]
    UnexpectedOutput { shape: Vec<usize> },
}

/// Errors that occur while computing an image embedding
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Encoder inference failed on {path}: {reason}")]
    Inference { path: PathBuf, reason: String },

    #[error("Encoder returned an empty embedding for {path}")]
    Empty { path: PathBuf },

    #[error("Embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Errors that occur while drawing and saving output images
#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Failed to create output folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save {path}: {reason}")]
    Save { path: PathBuf, reason: String },
}

impl AnnotateError {
    /// Whether the error leaves the output location unusable
    ///
    /// Decode failures only affect one candidate photo; folder and write
    /// failures mean nothing else can be written either.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AnnotateError::Decode(_))
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, EntityMatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_not_found_names_the_path() {
        let error = ModelError::NotFound {
            path: PathBuf::from("yolov8m.onnx"),
        };
        assert_eq!(error.to_string(), "Model file 'yolov8m.onnx' not found");
    }

    #[test]
    fn decode_error_is_transparent_inside_detect_error() {
        let error: DetectError = DecodeError {
            path: PathBuf::from("/photos/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        }
        .into();
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("invalid JPEG"));
    }

    #[test]
    fn only_decode_failures_are_skippable_when_annotating() {
        let decode = AnnotateError::Decode(DecodeError {
            path: PathBuf::from("/a.jpg"),
            reason: "truncated".to_string(),
        });
        let save = AnnotateError::Save {
            path: PathBuf::from("/out/top1-crop.jpeg"),
            reason: "disk full".to_string(),
        };

        assert!(!decode.is_fatal());
        assert!(save.is_fatal());
    }

    #[test]
    fn top_level_error_wraps_model_error() {
        let error: EntityMatchError = ModelError::NotFound {
            path: PathBuf::from("clip.onnx"),
        }
        .into();
        assert!(error.to_string().starts_with("Model error:"));
    }
}
