//! Data models

pub mod feedback;

pub use feedback::*;
