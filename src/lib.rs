//! Simulation core for a pixel-based digital logic sandbox.
//!
//! A host decodes a blueprint into a width×height RGBA pixel buffer (that
//! decoding — base64, zstd, clipboard formats — is explicitly this
//! crate's upstream collaborator, not its concern) and hands it to
//! [`preprocess::preprocess`], which compiles it into a directed graph of
//! logic groups. [`project::Project`] then owns that graph plus the
//! simulation state and drives it tick by tick via [`tick::TickEngine`].

pub mod assembler;
pub mod config;
pub mod error;
pub mod ink;
pub mod latch;
pub mod pixel;
pub mod preprocess;
pub mod project;
pub mod state;
pub mod tick;

pub use config::{LatchConfig, ProjectConfig};
pub use error::{AssemblyError, PreprocessError};
pub use ink::Ink;
pub use pixel::{Image, Pixel};
pub use project::Project;
pub use tick::{Parallel, Serial};
