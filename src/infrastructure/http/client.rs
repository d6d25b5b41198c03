//! HTTP adapter for the message history port.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::dto::{ErrorResponse, MessageResponse};
use crate::domain::entities::ChannelId;
use crate::domain::errors::FetchError;
use crate::domain::ports::{MessageHistoryPort, MessagePage, MessageQuery, MessageSort};

const SESSION_TOKEN_HEADER: &str = "x-session-token";
const USER_AGENT: &str = concat!("voxtail/", env!("CARGO_PKG_VERSION"));

/// REST client for paginated channel history.
pub struct HttpHistoryClient {
    client: Client,
    base_url: String,
    session_token: Option<String>,
}

impl HttpHistoryClient {
    /// Creates a client against the given API base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(
        base_url: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::unexpected(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            session_token: None,
        })
    }

    /// Attaches a session token sent with every request.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    fn build_query(query: &MessageQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![("limit", query.limit.to_string())];
        if let Some(before) = &query.before {
            params.push(("before", before.as_str().to_owned()));
        }
        if let Some(after) = &query.after {
            params.push(("after", after.as_str().to_owned()));
        }
        if let Some(nearby) = &query.nearby {
            params.push(("nearby", nearby.as_str().to_owned()));
        }
        if let Some(sort) = query.sort {
            let value = match sort {
                MessageSort::Latest => "Latest",
                MessageSort::Oldest => "Oldest",
            };
            params.push(("sort", value.to_owned()));
        }
        params
    }

    async fn handle_error_response(
        &self,
        status: StatusCode,
        response: reqwest::Response,
    ) -> FetchError {
        let error_message = match response.json::<ErrorResponse>().await {
            Ok(error) => error.message,
            Err(_) => format!("HTTP {status}"),
        };

        match status {
            StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited { retry_after_ms: 5000 },
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                FetchError::network("history API is temporarily unavailable")
            }
            _ => FetchError::api(status.as_u16(), error_message),
        }
    }
}

#[async_trait]
impl MessageHistoryPort for HttpHistoryClient {
    async fn fetch_messages(
        &self,
        channel_id: &ChannelId,
        query: MessageQuery,
    ) -> Result<MessagePage, FetchError> {
        let url = format!("{}/channels/{}/messages", self.base_url, channel_id.as_str());

        debug!(
            channel_id = %channel_id.as_str(),
            limit = query.limit,
            "Fetching message history page"
        );

        let mut request = self.client.get(&url).query(&Self::build_query(&query));
        if let Some(token) = &self.session_token {
            request = request.header(SESSION_TOKEN_HEADER, token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Failed to reach history API");
            if e.is_timeout() {
                FetchError::network("request timed out")
            } else if e.is_connect() {
                FetchError::network("failed to connect to history API")
            } else {
                FetchError::network(e.to_string())
            }
        })?;

        let status = response.status();

        if !status.is_success() {
            return Err(self.handle_error_response(status, response).await);
        }

        let messages: Vec<MessageResponse> = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse history page");
            FetchError::decode(format!("failed to parse response: {e}"))
        })?;

        debug!(count = messages.len(), "Fetched history page");

        Ok(MessagePage {
            messages: messages.into_iter().map(Into::into).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MessageId;

    #[test]
    fn test_client_creation() {
        let client =
            HttpHistoryClient::new("https://api.example.com", std::time::Duration::from_secs(10));
        assert!(client.is_ok());
    }

    #[test]
    fn test_query_serialization_includes_set_fields() {
        let query = MessageQuery::latest(50)
            .after_message(MessageId::from("01ABC"))
            .sorted(MessageSort::Oldest);

        let params = HttpHistoryClient::build_query(&query);

        assert!(params.contains(&("limit", "50".to_owned())));
        assert!(params.contains(&("after", "01ABC".to_owned())));
        assert!(params.contains(&("sort", "Oldest".to_owned())));
        assert!(!params.iter().any(|(key, _)| *key == "before"));
    }
}
