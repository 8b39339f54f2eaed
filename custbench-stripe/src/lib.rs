#![forbid(unsafe_code)]

mod classify;
mod client;
mod error;
mod types;

pub use classify::classify_error_body;
pub use client::{DEFAULT_BASE_URL, StripeClient};
pub use error::{Error, Result};
