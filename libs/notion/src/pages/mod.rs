use reqwest::Method;

use crate::{objects::Page, Client, NotionError};

pub mod request;

use self::request::{CreatePageRequest, UpdatePageRequest};

impl Client {
    pub async fn create_page(
        &self,
        request: &CreatePageRequest,
    ) -> Result<Page, NotionError> {
        self.send(Method::POST, "pages", request).await
    }

    pub async fn update_page(
        &self,
        page_id: &str,
        request: &UpdatePageRequest,
    ) -> Result<Page, NotionError> {
        self.send(Method::PATCH, &format!("pages/{}", page_id), request)
            .await
    }
}
