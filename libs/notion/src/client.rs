use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::{response::IntoResponse, NotionError};

/// Thin client for the Notion REST API.
///
/// Every request carries the bearer token and the pinned `Notion-Version`.
#[derive(Clone, Debug)]
pub struct Client {
    base_url: String,
    client: reqwest::Client,
}

impl Client {
    pub fn new(
        token: &str,
        version: &str,
        base_url: &str,
    ) -> Result<Self, NotionError> {
        let mut authorization =
            HeaderValue::from_str(format!("Bearer {}", token).as_str())
                .into_response("failed to build authorization header")?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(
            "Notion-Version",
            HeaderValue::from_str(version)
                .into_response("failed to build Notion-Version header")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()
            .into_response("failed to build http client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub(crate) async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, NotionError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!(task = "notion request", method = method.as_str(), url);

        let response = self
            .client
            .request(method, url)
            .json(body)
            .send()
            .await
            .into_response("failed to send")?;

        let status = response.status();
        let text = response.text().await.into_response("failed to get text")?;

        if !status.is_success() {
            return Err(NotionError::FailedStatusCode {
                status_code: status,
                message: text,
            });
        }

        serde_json::from_str(&text).into_response("failed to parse response")
    }
}
