//! # Entity Match
//!
//! Finds the objects in a folder of photos and, for every object, saves the
//! photos that look most alike.
//!
//! ## How It Works
//! - An object detector labels every photo (e.g. "dog", "car")
//! - Photos sharing a label form an entity group
//! - An image encoder turns each photo into an embedding vector
//! - Within a group, photos are ranked by cosine similarity to a reference
//! - The top matches are saved with the object's bounding box drawn on them
//!
//! ## Architecture
//! - `core` - The detection, grouping and ranking engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{EntityMatchError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
