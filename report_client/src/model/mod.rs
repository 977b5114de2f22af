//! Data model types exchanged with the mail provider.
//!
//! - `token` — cached OAuth token and client secret files.
//! - `message` — MIME report message and its raw encoding.
pub mod message;
pub mod token;
