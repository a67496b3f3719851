//! # rqt
//!
//! Training and export tooling for RocketQA dual and cross encoder
//! retrieval models.
//!
//! ## Overview
//!
//! The heavy lifting (the training loop, the inference graph, checkpoint
//! serialization) lives in the wrapped RocketQA/Paddle framework; rqt is
//! the orchestration around it:
//!
//! - Finetuning a base model and promoting the resulting checkpoint into
//!   a servable model directory
//! - Writing the serving config artifacts the inference engine reads
//! - Exporting a trained encoder as a static inference model
//!
//! ## Architecture
//!
//! - `model` - base model registry and encoder kind dispatch
//! - `backend` - seam to the external training framework
//! - `checkpoint` - post-training checkpoint promotion
//! - `export` - inference-graph export contract
//! - `serving` - serving config artifacts
//! - `cli` - command-line interface
//! - `utils` - common utilities

pub mod backend;
pub mod checkpoint;
pub mod cli;
pub mod export;
pub mod model;
pub mod serving;
pub mod utils;

// Re-export commonly used types
pub use anyhow::{Error, Result};
