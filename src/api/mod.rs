//! Remote project API.
//!
//! The sync engine talks to ParaTranz only through the [`ProjectApi`] trait.
//! [`ParaTranzClient`] is the HTTP implementation used by the CLI; tests
//! substitute an in-memory fake.
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌──────────────────┐
//! │ Export/Push  │ ──▶ │ ProjectApi │ ──▶ │ ParaTranzClient  │ ──▶ HTTPS
//! └──────────────┘     └────────────┘     └──────────────────┘
//! ```

mod client;
mod error;
mod provider;

pub use client::{DEFAULT_API_BASE, ParaTranzClient};
pub use error::{ApiError, ApiResult};
pub use provider::ProjectApi;
