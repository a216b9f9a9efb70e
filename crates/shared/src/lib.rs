//! Data model and wire conventions for server-rendered list and form pages.

pub mod domain;
pub mod error;
pub mod protocol;
