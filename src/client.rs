//! Shared HTTP client construction.

use crate::config::{HTTP_TIMEOUT, USER_AGENT};
use crate::error::PipelineError;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Build the client used for feeds, article pages, and the Bot API.
///
/// Every request carries the fixed browser `User-Agent` and is bounded by
/// [`HTTP_TIMEOUT`].
pub fn build_client() -> Result<Client, reqwest::Error> {
    build_client_with_timeout(HTTP_TIMEOUT)
}

/// Same as [`build_client`] with a custom per-request time limit.
pub fn build_client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// GET `url` and return the body as text, treating non-2xx as an error.
#[instrument(level = "debug", skip(client))]
pub async fn get_text(client: &Client, url: &str) -> Result<String, PipelineError> {
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.text().await?;
    debug!(bytes = body.len(), "Fetched body");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_user_agent_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let client = build_client().unwrap();
        let body = get_text(&client, &format!("{}/feed", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "hello");

        let requests = server.received_requests().await.unwrap();
        let agent = requests[0].headers.get("user-agent").unwrap();
        assert_eq!(agent.to_str().unwrap(), USER_AGENT);
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = build_client().unwrap();
        let err = get_text(&client, &server.uri()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn slow_response_times_out_as_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = build_client_with_timeout(Duration::from_millis(200)).unwrap();
        let err = get_text(&client, &server.uri()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(matches!(&err, PipelineError::Http(e) if e.is_timeout()));
    }
}
