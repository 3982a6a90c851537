//! Pattern analysis pipeline
//!
//! The pieces the background worker strings together:
//! - [`transcode`] - decode the uploaded payload, bound its size, re-encode as JPEG
//! - [`prompt`] - the fixed instructions sent to the vision model
//! - [`repair`] - turn the model's text into a stable JSON document

pub mod prompt;
pub mod repair;
pub mod transcode;

pub use repair::{repair_analysis, Backfilled, RepairedAnalysis};
pub use transcode::{prepare_image, PreparedImage};
