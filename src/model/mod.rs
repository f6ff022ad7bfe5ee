//! Data models for ptsync.
//!
//! This module contains the core data types:
//! - [`Project`] - A configured remote project bound to a local locale directory
//! - [`RemoteFile`] - A file record as listed by the remote service
//! - [`Artifact`] - The remote export descriptor used as a freshness token

mod project;
mod remote;

pub use project::{Project, ProjectId};
pub use remote::{Artifact, ExportJob, FileUpload, RemoteFile};
