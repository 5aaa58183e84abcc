//! Data models for the squad roster.
//!
//! Field names follow the stored document format (camelCase) so documents and
//! cache entries written by earlier clients remain readable.

mod roster;
mod snapshot;
mod user;

pub use roster::*;
pub use snapshot::*;
pub use user::*;
