//! ptsync - keep a local translation tree in sync with ParaTranz
//!
//! This crate provides the core functionality for the `ptsync` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (ProjectId, Project, RemoteFile, Artifact)
//! - [`api`] - Remote project API and its reqwest client
//! - [`sync`] - Export, extraction, normalization and push reconciliation
//! - [`config`] - Configuration management
//! - [`validate`] - JSON validation of the working tree
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod sync;
pub mod validate;

pub use error::{Error, Result};
