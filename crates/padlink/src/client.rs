// ── Daemon client ──
//
// Thin HTTP client the CLI subcommands use to talk to a running
// daemon's trigger endpoint.

use std::time::Duration;

use crate::error::CliError;
use crate::http::{ColorBody, StatusBody};

pub struct DaemonClient {
    base: String,
    client: reqwest::Client,
}

impl DaemonClient {
    pub fn new(endpoint: &str) -> Result<Self, CliError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base: endpoint.trim_end_matches('/').to_owned(),
            client,
        })
    }

    pub async fn trigger(&self, button: u8) -> Result<(), CliError> {
        let response = self
            .client
            .post(format!("{}/trigger/{button}", self.base))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn set_led(&self, r: u8, g: u8, b: u8) -> Result<(), CliError> {
        let response = self
            .client
            .post(format!("{}/led", self.base))
            .json(&ColorBody { r, g, b })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn cycle(&self) -> Result<(), CliError> {
        let response = self
            .client
            .post(format!("{}/led/cycle", self.base))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn status(&self) -> Result<StatusBody, CliError> {
        let response = self
            .client
            .get(format!("{}/status", self.base))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Turn non-2xx responses into a [`CliError::Daemon`] carrying the
    /// body the daemon sent, which holds the useful message.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CliError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CliError::Daemon {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn trigger_posts_to_the_daemon() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trigger/4"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = DaemonClient::new(&server.uri()).expect("client");
        client.trigger(4).await.expect("trigger");
    }

    #[tokio::test]
    async fn daemon_errors_carry_the_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trigger/11"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"bad"}"#))
            .mount(&server)
            .await;

        let client = DaemonClient::new(&server.uri()).expect("client");
        let err = client.trigger(11).await.expect_err("must fail");
        match err {
            CliError::Daemon { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("bad"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn status_decodes_the_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "connected": true,
                "mode": "green",
                "color": { "r": 0, "g": 255, "b": 0 },
            })))
            .mount(&server)
            .await;

        let client = DaemonClient::new(&server.uri()).expect("client");
        let status = client.status().await.expect("status");
        assert!(status.connected);
        assert_eq!(status.mode, "green");
        assert_eq!(status.color.g, 255);
    }
}
