//! API route handlers

pub mod actions;
pub mod error;
pub mod hosts;
pub mod system;

pub use error::ApiError;
