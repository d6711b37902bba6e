// ── Bulb-service client ──
//
// Talks to a local bulb-control REST service: `PUT /lights/{id}/state`
// for on/off/brightness, `POST /scenes/{name}` to run a scene. Any
// failure stays scoped to its target; the dispatch engine logs and
// moves on.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use padlink_core::{BulbControl, CoreError, SceneTrigger};

#[derive(Clone)]
pub struct BulbServiceClient {
    base_url: String,
    client: reqwest::Client,
}

impl BulbServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Config {
                message: format!("cannot build bulb HTTP client: {e}"),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn put_state(
        &self,
        target: &str,
        body: serde_json::Value,
    ) -> Result<(), CoreError> {
        let url = format!("{}/lights/{target}/state", self.base_url);
        self.client
            .put(&url)
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CoreError::collaborator(target, e))?;
        Ok(())
    }
}

#[async_trait]
impl BulbControl for BulbServiceClient {
    async fn turn_on(&self, target: &str) -> Result<(), CoreError> {
        self.put_state(target, json!({ "on": true })).await
    }

    async fn turn_off(&self, target: &str) -> Result<(), CoreError> {
        self.put_state(target, json!({ "on": false })).await
    }

    async fn set_brightness(&self, target: &str, level: u8) -> Result<(), CoreError> {
        self.put_state(target, json!({ "on": true, "brightness": level.min(100) }))
            .await
    }
}

#[async_trait]
impl SceneTrigger for BulbServiceClient {
    async fn run_scene(&self, name: &str) -> Result<(), CoreError> {
        let url = format!("{}/scenes/{name}", self.base_url);
        self.client
            .post(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CoreError::collaborator(name, e))?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, BulbServiceClient) {
        let server = MockServer::start().await;
        let client =
            BulbServiceClient::new(&server.uri(), Duration::from_secs(5)).expect("client");
        (server, client)
    }

    #[tokio::test]
    async fn turn_on_puts_state() {
        let (server, client) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/lights/kitchen/state"))
            .and(body_json(json!({ "on": true })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client.turn_on("kitchen").await.expect("on");
    }

    #[tokio::test]
    async fn brightness_clamps_to_100() {
        let (server, client) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/lights/lamp/state"))
            .and(body_json(json!({ "on": true, "brightness": 100 })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client.set_brightness("lamp", 250).await.expect("brightness");
    }

    #[tokio::test]
    async fn scene_posts_by_name() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/scenes/movie-night"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client.run_scene("movie-night").await.expect("scene");
    }

    #[tokio::test]
    async fn http_error_becomes_collaborator_failure() {
        let (server, client) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/lights/ghost/state"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client.turn_off("ghost").await.expect_err("404");
        assert!(matches!(err, CoreError::Collaborator { .. }));
    }
}
