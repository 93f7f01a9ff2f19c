//! HTTP request handlers.

pub mod collections;
pub mod common;
pub mod health;
pub mod metadata;
pub mod profile;

pub use collections::*;
pub use health::*;
pub use metadata::*;
pub use profile::*;
