use reqwest::StatusCode;

mod client;
pub mod databases;
pub mod objects;
pub mod pages;
mod response;

pub use client::Client;

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("in reqwest crate: {}: {}", message, source)]
    ReqwestError {
        source: reqwest::Error,
        message: String,
    },

    #[error("in serde_json crate: {}: {}", message, source)]
    SerdeJsonError {
        source: serde_json::Error,
        message: String,
    },

    #[error("invalid header value: {}: {}", message, source)]
    InvalidHeader {
        source: reqwest::header::InvalidHeaderValue,
        message: String,
    },

    #[error("notion responded {}: {}", status_code, message)]
    FailedStatusCode {
        status_code: StatusCode,
        message: String,
    },
}
