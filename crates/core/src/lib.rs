//! Core business logic for the Moz Solidária backend.

pub mod services;

pub use services::*;
