//! Core types for the admission-control engine
//!
//! This module provides the fundamental types used throughout the engine:
//! - `EngineError` - Error types
//! - `EngineResult` - Result alias

pub mod error;

pub use error::{EngineError, EngineResult};
