//! Conversational backend module
//!
//! This module forwards user submissions to the conversational backend.
//! The reply itself comes back through the comment stream, so the caller
//! only cares whether the call settled successfully.

mod backend;

pub use backend::{is_backend_configured, send_chat, BackendError};
