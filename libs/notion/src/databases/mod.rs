use reqwest::Method;
use tracing::debug;

use crate::{objects::Page, Client, NotionError};

pub mod request;
pub mod response;

use self::{request::QueryDatabaseRequest, response::QueryDatabaseResponse};

impl Client {
    pub async fn query_database(
        &self,
        database_id: &str,
        request: &QueryDatabaseRequest,
    ) -> Result<QueryDatabaseResponse, NotionError> {
        self.send(
            Method::POST,
            &format!("databases/{}/query", database_id),
            request,
        )
        .await
    }

    /// Follows `next_cursor` until the results run out or `limit` pages were
    /// collected.
    pub async fn query_all(
        &self,
        database_id: &str,
        mut request: QueryDatabaseRequest,
        limit: Option<usize>,
    ) -> Result<Vec<Page>, NotionError> {
        let mut pages = vec![];
        loop {
            let mut response =
                self.query_database(database_id, &request).await?;
            pages.append(&mut response.results);

            debug!(
                task = "query_all",
                database_id,
                fetched = pages.len(),
                has_more = response.has_more,
            );

            if let Some(limit) = limit {
                if pages.len() >= limit {
                    pages.truncate(limit);
                    break;
                }
            }

            match response.next_cursor {
                Some(cursor) if response.has_more => {
                    request.start_cursor = Some(cursor);
                }
                _ => break,
            }
        }

        Ok(pages)
    }
}
