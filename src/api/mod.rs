pub mod pagination;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::models::{Column, ItemsPage};

/// Fixed page size for the item query. The remote caps pages at 500.
pub const PAGE_SIZE: u32 = 500;

// ─── Error types ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum MondayError {
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Rate limited – retry after {retry_after:.1}s")]
    RateLimited { retry_after: f64 },
    #[error("Unauthorized – check your API token")]
    Unauthorized,
    #[error("GraphQL error: {0}")]
    Graphql(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

// ─── Source seam ────────────────────────────────────────────────────────────

/// Read-only view of one board on the remote API: the paginated item query and
/// the column schema. The pipeline is written against this trait so tests can
/// substitute in-memory boards.
#[async_trait]
pub trait BoardSource: Send + Sync {
    /// Fetch one page of items. `cursor` is `None` for the first page and the
    /// previous page's continuation cursor afterwards.
    async fn items_page(
        &self,
        board_id: u64,
        cursor: Option<&str>,
    ) -> Result<ItemsPage, MondayError>;

    /// Fetch the board's current column schema.
    async fn board_columns(&self, board_id: u64) -> Result<Vec<Column>, MondayError>;
}

// ─── Client ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MondayClient {
    client: Client,
    endpoint: Url,
    token: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<serde_json::Value>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

impl MondayClient {
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid API endpoint: {endpoint}"))?;

        let client = Client::builder()
            .user_agent("boardcal/0.1.0")
            .build()?;

        Ok(Self {
            client,
            endpoint,
            token: token.to_string(),
        })
    }

    async fn check_status(resp: Response) -> Result<Response, MondayError> {
        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(MondayError::Unauthorized),
            StatusCode::FORBIDDEN => Err(MondayError::Api {
                status: 403,
                message: "Forbidden – insufficient permissions".into(),
            }),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<f64>().ok())
                    .unwrap_or(1.0);
                Err(MondayError::RateLimited { retry_after: retry })
            }
            s if s.is_client_error() || s.is_server_error() => {
                let status = s.as_u16();
                let message = resp.text().await.unwrap_or_default();
                Err(MondayError::Api { status, message })
            }
            _ => Ok(resp),
        }
    }

    /// POST one GraphQL document and unwrap the response envelope. A present
    /// `errors` array takes precedence over any partial `data`.
    async fn graphql(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, MondayError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("Authorization", &self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;

        let envelope: GraphqlResponse = resp.json().await?;
        if let Some(errors) = envelope.errors {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(MondayError::Graphql(message));
        }
        envelope
            .data
            .ok_or_else(|| MondayError::Graphql("response carried no data".into()))
    }

    fn extract<T: serde::de::DeserializeOwned>(
        data: serde_json::Value,
        pointer: &str,
    ) -> Result<T, MondayError> {
        let value = data
            .pointer(pointer)
            .cloned()
            .ok_or_else(|| MondayError::Graphql(format!("missing {pointer} in response")))?;
        serde_json::from_value(value)
            .map_err(|e| MondayError::Graphql(format!("malformed {pointer}: {e}")))
    }
}

#[async_trait]
impl BoardSource for MondayClient {
    async fn items_page(
        &self,
        board_id: u64,
        cursor: Option<&str>,
    ) -> Result<ItemsPage, MondayError> {
        match cursor {
            None => {
                let query = "query ($board: [ID!], $limit: Int!) { \
                    boards(ids: $board) { \
                        items_page(limit: $limit) { \
                            cursor \
                            items { id name column_values { id text } } \
                        } \
                    } \
                }";
                let data = self
                    .graphql(query, json!({ "board": [board_id], "limit": PAGE_SIZE }))
                    .await?;
                Self::extract(data, "/boards/0/items_page")
            }
            Some(cursor) => {
                let query = "query ($cursor: String!, $limit: Int!) { \
                    next_items_page(cursor: $cursor, limit: $limit) { \
                        cursor \
                        items { id name column_values { id text } } \
                    } \
                }";
                let data = self
                    .graphql(query, json!({ "cursor": cursor, "limit": PAGE_SIZE }))
                    .await?;
                Self::extract(data, "/next_items_page")
            }
        }
    }

    async fn board_columns(&self, board_id: u64) -> Result<Vec<Column>, MondayError> {
        let query = "query ($board: [ID!]) { \
            boards(ids: $board) { \
                columns { id title type } \
            } \
        }";
        let data = self.graphql(query, json!({ "board": [board_id] })).await?;
        Self::extract(data, "/boards/0/columns")
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::ColumnKind;

    fn items_page_body(cursor: Option<&str>) -> serde_json::Value {
        json!({
            "data": {
                "boards": [{
                    "items_page": {
                        "cursor": cursor,
                        "items": [
                            { "id": "1", "name": "Alpha", "column_values": [
                                { "id": "date4", "text": "2024-05-01" },
                                { "id": "text1", "text": null }
                            ]}
                        ]
                    }
                }]
            }
        })
    }

    async fn client_for(server: &MockServer) -> MondayClient {
        MondayClient::new(&server.uri(), "test-token").unwrap()
    }

    #[tokio::test]
    async fn first_page_query_parses_items_and_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Authorization", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items_page_body(Some("c1"))))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let page = client.items_page(42, None).await.unwrap();

        assert_eq!(page.cursor.as_deref(), Some("c1"));
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Alpha");
        assert_eq!(page.items[0].column_text("date4"), Some("2024-05-01"));
        assert_eq!(page.items[0].column_text("text1"), None);
    }

    #[tokio::test]
    async fn follow_up_page_uses_continuation_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("next_items_page"))
            .and(body_string_contains("c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "next_items_page": {
                        "cursor": null,
                        "items": [
                            { "id": "2", "name": "Beta", "column_values": [] }
                        ]
                    }
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let page = client.items_page(42, Some("c1")).await.unwrap();

        assert_eq!(page.cursor, None);
        assert_eq!(page.items[0].id, "2");
    }

    #[tokio::test]
    async fn column_schema_maps_kinds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("columns"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "boards": [{
                        "columns": [
                            { "id": "date4", "title": "Due Date", "type": "date" },
                            { "id": "text1", "title": "Location", "type": "text" },
                            { "id": "status", "title": "Status", "type": "status" }
                        ]
                    }]
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let columns = client.board_columns(42).await.unwrap();

        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].kind, ColumnKind::Date);
        assert_eq!(columns[1].kind, ColumnKind::Text);
        assert_eq!(columns[2].kind, ColumnKind::Other);
    }

    #[tokio::test]
    async fn graphql_errors_surface_as_graphql_variant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{ "message": "Board not found" }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.items_page(42, None).await.unwrap_err();

        assert!(matches!(err, MondayError::Graphql(m) if m.contains("Board not found")));
    }

    #[tokio::test]
    async fn http_401_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.board_columns(42).await.unwrap_err();

        assert!(matches!(err, MondayError::Unauthorized));
    }
}
