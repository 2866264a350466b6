use reqwest::header::InvalidHeaderValue;

use crate::NotionError;

type Response<T> = Result<T, NotionError>;

pub trait IntoResponse<T> {
    fn into_response(self, message: &str) -> Response<T>;
}

impl<T> IntoResponse<T> for Result<T, reqwest::Error> {
    fn into_response(self, message: &str) -> Response<T> {
        self.map_err(|e| NotionError::ReqwestError {
            source: e,
            message: message.to_string(),
        })
    }
}

impl<T> IntoResponse<T> for Result<T, serde_json::Error> {
    fn into_response(self, message: &str) -> Response<T> {
        self.map_err(|e| NotionError::SerdeJsonError {
            source: e,
            message: message.to_string(),
        })
    }
}

impl<T> IntoResponse<T> for Result<T, InvalidHeaderValue> {
    fn into_response(self, message: &str) -> Response<T> {
        self.map_err(|e| NotionError::InvalidHeader {
            source: e,
            message: message.to_string(),
        })
    }
}
