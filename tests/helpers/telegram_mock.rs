//! Mock Telegram API Server for testing
//!
//! Simulates the `sendMessage` method of the Bot API with wiremock so the
//! notifier's error classification can be checked against real responses.

use serde_json::{json, Value};
use teloxide::Bot;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_BOT_TOKEN: &str = "12345:test_token";

/// teloxide may send the method name in either case
const SEND_MESSAGE_PATH: &str = r"(?i)/bot[^/]+/sendmessage$";

pub struct TelegramMockServer {
    pub server: MockServer,
}

impl TelegramMockServer {
    pub async fn new() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Bot whose requests go to this server
    pub fn bot(&self) -> Bot {
        let url = url::Url::parse(&self.server.uri()).unwrap();
        Bot::new(TEST_BOT_TOKEN).set_api_url(url)
    }

    pub async fn mock_send_message_ok(&self, chat_id: i64) {
        let body = json!({
            "ok": true,
            "result": {
                "message_id": 123,
                "from": {
                    "id": 12345,
                    "is_bot": true,
                    "first_name": "RegistrationDesk",
                    "username": "regdesk_bot"
                },
                "chat": {
                    "id": chat_id,
                    "type": "private",
                    "first_name": "Test"
                },
                "date": 1640995200,
                "text": "Test message"
            }
        });
        self.mount(ResponseTemplate::new(200).set_body_json(body)).await;
    }

    pub async fn mock_send_message_rate_limited(&self, retry_after: u64) {
        let body = json!({
            "ok": false,
            "error_code": 429,
            "description": format!("Too Many Requests: retry after {retry_after}"),
            "parameters": { "retry_after": retry_after }
        });
        self.mount(ResponseTemplate::new(429).set_body_json(body)).await;
    }

    pub async fn mock_send_message_blocked(&self) {
        let body = json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        });
        self.mount(ResponseTemplate::new(403).set_body_json(body)).await;
    }

    async fn mount(&self, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path_regex(SEND_MESSAGE_PATH))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    pub async fn received_count(&self) -> usize {
        self.server.received_requests().await.map(|r| r.len()).unwrap_or(0)
    }

    pub async fn last_request_json(&self) -> Option<Value> {
        let requests = self.server.received_requests().await?;
        requests.last().and_then(|r| serde_json::from_slice(&r.body).ok())
    }
}
