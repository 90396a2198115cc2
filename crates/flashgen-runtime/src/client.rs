//! InferenceClient: the JSON exchange with the companion's prompt route.
//!
//! One `POST` per request, body `{"front_side", "back_side"}`, answer
//! `{"response"}`. Every outcome is folded into a [`PromptResult`]; nothing
//! here panics on a bad answer.

use std::time::Duration;

use flashgen_core::contracts::{PromptRequestBody, PromptResponseBody, RESPONSE_FIELD};
use flashgen_core::{CompanionConfig, PromptError, PromptRequest, PromptResult};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Async client for the companion's exercise endpoint.
///
/// Cheap to clone: clones share one connection pool.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: Client,
    url: String,
    timeout: Duration,
}

impl InferenceClient {
    /// Build a client for `config.prompt_url()` with the configured deadline.
    ///
    /// Proxies are disabled: the companion always lives on the local host.
    pub fn new(config: &CompanionConfig) -> Result<Self, PromptError> {
        let http = Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| PromptError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: config.prompt_url(),
            timeout: config.request_timeout(),
        })
    }

    /// Override the per-request deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one exercise request and wait for the answer.
    pub async fn submit(&self, request: PromptRequest) -> PromptResult {
        let body = PromptRequestBody::from(&request);
        debug!(url = %self.url, front = %request.front_text, "Submitting exercise request");

        let response = self
            .http
            .post(&self.url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, %status, "Companion rejected exercise request");
            return Err(PromptError::Network(format!("companion answered {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let result = parse_response(&bytes);
        if let Err(e) = &result {
            warn!(url = %self.url, error = %e, "Unusable exercise response");
        }
        result
    }

    /// Like [`Self::submit`], abandoned with `Cancelled` once `cancel` fires.
    pub async fn submit_cancellable(
        &self,
        request: PromptRequest,
        cancel: &CancellationToken,
    ) -> PromptResult {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(url = %self.url, "Exercise request cancelled");
                Err(PromptError::Cancelled)
            }
            result = self.submit(request) => result,
        }
    }

    fn transport_error(&self, e: &reqwest::Error) -> PromptError {
        if e.is_timeout() {
            warn!(url = %self.url, timeout = ?self.timeout, "Exercise request timed out");
            PromptError::Timeout(self.timeout)
        } else {
            warn!(url = %self.url, error = %e, "Exercise request failed");
            PromptError::Network(e.to_string())
        }
    }
}

/// Map a response body to the generated sentence.
///
/// Unparseable JSON is a `Network` failure; valid JSON lacking a string
/// `response` field is a `Protocol` failure.
pub(crate) fn parse_response(body: &[u8]) -> PromptResult {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| PromptError::Network(format!("unparseable response body: {e}")))?;

    PromptResponseBody::from_value(&value)
        .map(|body| body.response)
        .ok_or_else(|| {
            PromptError::Protocol(format!("response body has no string `{RESPONSE_FIELD}` field"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashgen_core::ErrorKind;
    use std::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    fn client_for(port: u16) -> InferenceClient {
        InferenceClient::new(&CompanionConfig::default().with_port(port)).unwrap()
    }

    #[test]
    fn sentence_is_extracted() {
        let text = assert_ok!(parse_response(
            br#"{"response": "He likes to ___ every morning."}"#
        ));
        assert_eq!(text, "He likes to ___ every morning.");
    }

    #[test]
    fn missing_field_is_a_protocol_error() {
        let err = assert_err!(parse_response(br#"{"answer": "nope"}"#));
        assert_eq!(err.kind(), ErrorKind::ProtocolError);

        // Present but not a string is no better
        let err = assert_err!(parse_response(br#"{"response": 42}"#));
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
    }

    #[test]
    fn garbage_body_is_a_network_error() {
        let err = assert_err!(parse_response(b"<html>Internal Server Error</html>"));
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    #[test]
    fn empty_string_response_is_still_a_success() {
        assert_eq!(parse_response(br#"{"response": ""}"#), Ok(String::new()));
    }

    #[test]
    fn targets_the_prompt_route() {
        let client = client_for(8123);
        assert_eq!(client.url(), "http://127.0.0.1:8123/prompt/");
        assert_eq!(client.timeout(), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = client_for(port)
            .submit(PromptRequest::new("run", "to run"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        // Accepted by the kernel backlog, never answered
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let client = client_for(port).with_timeout(Duration::from_millis(200));
        let err = client
            .submit(PromptRequest::new("run", "to run"))
            .await
            .unwrap_err();
        assert_eq!(err, PromptError::Timeout(Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn fired_token_cancels_before_sending() {
        let token = CancellationToken::new();
        token.cancel();

        let result = client_for(9)
            .submit_cancellable(PromptRequest::new("run", "to run"), &token)
            .await;
        assert_eq!(result, Err(PromptError::Cancelled));
    }
}
