//! # entity-match CLI
//!
//! Command-line interface for the entity matcher.
//!
//! ## Usage
//! ```bash
//! entity-match run All_Images --detector yolov8m.onnx --encoder clip-vision.onnx
//! entity-match run ~/Photos --top-k 5 --format json
//! ```

mod cli;

use entity_match::Result;

fn main() -> Result<()> {
    entity_match::init_tracing();
    cli::run()
}
