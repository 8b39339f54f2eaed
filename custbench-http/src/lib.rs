#![forbid(unsafe_code)]

mod client;
mod error;
mod types;
mod util;

pub use client::HttpClient;
pub use error::{Error, FailureStage, Result};
pub use types::{HttpRequest, HttpResponse};
