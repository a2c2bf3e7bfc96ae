use std::ops::Deref;

use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::TEST_TOKEN;

/// Path of the first page.
const ITEMS_PATH: &str = "/v1/admin/items";
/// Path of the token endpoint served by [`ItemsApiMock::mock_token`].
const TOKEN_PATH: &str = "/oauth2/v2.0/token";

/// Mock of the admin items API.
///
/// Every page mock expects exactly one request, which is verified when the mock is dropped.
pub struct ItemsApiMock {
    server: MockServer,
}

impl ItemsApiMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// URL of the first page.
    pub fn endpoint(&self) -> String {
        format!("{}{ITEMS_PATH}", self.server.uri())
    }

    /// URL of page `number`, counting from 1.
    pub fn page_url(&self, number: usize) -> String {
        format!("{}{}", self.server.uri(), page_path(number))
    }

    pub fn token_url(&self) -> String {
        format!("{}{TOKEN_PATH}", self.server.uri())
    }

    /// Mounts a chain of pages, each linking to the next, the last one without a link.
    pub async fn mount_pages(&self, pages: Vec<Vec<Value>>) {
        let count = pages.len();
        for (index, items) in pages.into_iter().enumerate() {
            let number = index + 1;
            let mut body = json!({ "itemEntities": items });
            if number < count {
                body["continuationUri"] = Value::String(self.page_url(number + 1));
            }

            self.mount_page(number, ResponseTemplate::new(200).set_body_json(body), 1)
                .await;
        }
    }

    /// Mounts page `number` with a raw response.
    pub async fn mount_response(&self, number: usize, response: ResponseTemplate) {
        self.mount_page(number, response, 1).await;
    }

    /// Mounts page `number` and expects it never to be requested.
    pub async fn mount_unreachable(&self, number: usize) {
        let body = json!({ "itemEntities": [] });
        self.mount_page(number, ResponseTemplate::new(200).set_body_json(body), 0)
            .await;
    }

    /// Mounts a token endpoint issuing [`TEST_TOKEN`] for `client_id`.
    pub async fn mock_token(&self, client_id: &str) {
        let response = ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TEST_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3599
        }));

        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains(format!("client_id={client_id}")))
            .respond_with(response)
            .named("mock token")
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Mounts a token endpoint rejecting every request.
    pub async fn mock_token_rejected(&self) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .named("rejected token")
            .expect(1)
            .mount(&self.server)
            .await;
    }

    async fn mount_page(&self, number: usize, response: ResponseTemplate, expected: u64) {
        Mock::given(method("GET"))
            .and(path(page_path(number)))
            .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
            .and(header("accept", "application/json"))
            .respond_with(response)
            .named(format!("items page {number}"))
            .expect(expected)
            .mount(&self.server)
            .await;
    }
}

impl Deref for ItemsApiMock {
    type Target = MockServer;

    fn deref(&self) -> &Self::Target {
        &self.server
    }
}

fn page_path(number: usize) -> String {
    if number == 1 {
        ITEMS_PATH.to_string()
    } else {
        format!("{ITEMS_PATH}/pages/{number}")
    }
}
