//! Core types shared by the library and the CLI.
//!
//! Currently this is the application error type and the user-facing error
//! reporting built on it; see [`error`].

pub mod error;

pub use error::{ErrorContext, SitegenError, create_error_context, user_friendly_error};
