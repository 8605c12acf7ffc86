//! Image processing pipeline components.
//!
//! This module contains the stages and the two ways of running them:
//! - **stage**: the `Stage` trait and the shared `StageSet`
//! - **decode**: load stage, reads and decodes source files
//! - **resize**: resize stage, bounds the longer edge
//! - **grayscale**: grayscale stage, per-pixel luminance
//! - **encode**: save stage, JPEG output
//! - **channel**: bounded channels and the per-stage task loop
//! - **processor**: the concurrent pipeline assembler
//! - **sequential**: the single-threaded runner
//! - **discovery**: find image files in directories

pub mod channel;
pub mod decode;
pub mod discovery;
pub mod encode;
pub mod grayscale;
pub mod processor;
pub mod resize;
pub mod sequential;
pub mod stage;

// Re-exports for convenient access
pub use decode::LoadStage;
pub use discovery::FileDiscovery;
pub use encode::SaveStage;
pub use grayscale::GrayscaleStage;
pub use processor::Pipeline;
pub use resize::{target_dimensions, ResizeStage};
pub use sequential::SequentialRunner;
pub use stage::{Stage, StageSet};
