//! Stage configuration fetch.
//!
//! This module provides:
//! - A one-shot client for the configuration service
//! - Typed display/character settings with sensible defaults
//!
//! The config is fetched once at startup; a failed fetch keeps the
//! compiled defaults and is never fatal.

mod client;
mod types;

pub use client::fetch_stage_config;
pub use types::{CharacterConfig, StageConfig};
