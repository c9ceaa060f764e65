//! Outbound Slack calls: text replies and result uploads.

use std::sync::Arc;

use async_trait::async_trait;
use faceswap_core::{ChatOutbound, FaceswapError, Upload};
use slack_morphism::prelude::*;
use tracing::{debug, info};

use crate::error::{Result, SlackError};

pub struct SlackOutbound {
    client: Arc<SlackHyperClient>,
    token: SlackApiToken,
    bot_token: String,
    http: reqwest::Client,
    api_base: String,
}

impl SlackOutbound {
    pub fn new(client: Arc<SlackHyperClient>, bot_token: &str, api_base: &str) -> Self {
        Self {
            client,
            token: SlackApiToken::new(bot_token.to_string().into()),
            bot_token: bot_token.to_string(),
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChatOutbound for SlackOutbound {
    fn name(&self) -> &str {
        "slack"
    }

    async fn send_text(&self, channel_id: &str, text: &str) -> faceswap_core::Result<()> {
        let session = self.client.open_session(&self.token);
        let req = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel_id.to_string()),
            SlackMessageContent::new().with_text(text.to_string()),
        );
        session
            .chat_post_message(&req)
            .await
            .map_err(|e| FaceswapError::from(SlackError::Client(e.to_string())))?;
        debug!(channel = %channel_id, "slack message sent");
        Ok(())
    }

    async fn upload_file(&self, upload: Upload) -> faceswap_core::Result<()> {
        upload_external(&self.http, &self.bot_token, &self.api_base, &upload)
            .await
            .map_err(|e| FaceswapError::Upload(e.to_string()))
    }
}

/// Upload a file with Slack's external upload flow:
/// 1. `files.getUploadURLExternal` for a pre-signed URL and file id
/// 2. PUT the bytes to that URL
/// 3. `files.completeUploadExternal` to share the file into the channel
///
/// `api_base` is `https://slack.com` in production.
pub async fn upload_external(
    http: &reqwest::Client,
    token: &str,
    api_base: &str,
    upload: &Upload,
) -> Result<()> {
    let length = upload.bytes.len().to_string();
    let slot: serde_json::Value = http
        .post(format!("{api_base}/api/files.getUploadURLExternal"))
        .bearer_auth(token)
        .form(&[
            ("filename", upload.file_name.as_str()),
            ("length", length.as_str()),
        ])
        .send()
        .await?
        .json()
        .await?;
    check_ok("files.getUploadURLExternal", &slot)?;

    let upload_url = slot["upload_url"]
        .as_str()
        .ok_or_else(|| api_error("files.getUploadURLExternal", "missing upload_url"))?;
    let file_id = slot["file_id"]
        .as_str()
        .ok_or_else(|| api_error("files.getUploadURLExternal", "missing file_id"))?;

    http.put(upload_url)
        .header(reqwest::header::CONTENT_TYPE, content_type(&upload.file_name))
        .body(upload.bytes.clone())
        .send()
        .await?
        .error_for_status()?;

    let complete: serde_json::Value = http
        .post(format!("{api_base}/api/files.completeUploadExternal"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "files": [{ "id": file_id, "title": upload.title }],
            "channel_id": upload.channel_id,
        }))
        .send()
        .await?
        .json()
        .await?;
    check_ok("files.completeUploadExternal", &complete)?;

    info!(
        channel = %upload.channel_id,
        file_id = %file_id,
        file_name = %upload.file_name,
        bytes = upload.bytes.len(),
        "uploaded result to slack"
    );
    Ok(())
}

fn check_ok(method: &'static str, body: &serde_json::Value) -> Result<()> {
    if body["ok"].as_bool().unwrap_or(false) {
        return Ok(());
    }
    Err(api_error(method, body["error"].as_str().unwrap_or("unknown")))
}

fn api_error(method: &'static str, reason: &str) -> SlackError {
    SlackError::Api {
        method,
        reason: reason.to_string(),
    }
}

fn content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn upload() -> Upload {
        Upload {
            channel_id: "C123".into(),
            file_name: "walrus.png".into(),
            title: "Face swapped".into(),
            bytes: b"PNGDATA".to_vec(),
        }
    }

    async fn mount_slot(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/files.getUploadURLExternal"))
            .and(header("authorization", "Bearer xoxb-test"))
            .and(body_string_contains("filename=walrus.png"))
            .and(body_string_contains("length=7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "upload_url": format!("{}/upload-slot", server.uri()),
                "file_id": "FTEST"
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn upload_runs_all_three_steps() {
        let server = MockServer::start().await;
        mount_slot(&server).await;

        Mock::given(method("PUT"))
            .and(path("/upload-slot"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/files.completeUploadExternal"))
            .and(body_json(serde_json::json!({
                "files": [{ "id": "FTEST", "title": "Face swapped" }],
                "channel_id": "C123",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let result =
            upload_external(&reqwest::Client::new(), "xoxb-test", &server.uri(), &upload()).await;
        assert!(result.is_ok(), "{result:?}");
    }

    #[tokio::test]
    async fn slot_error_stops_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/files.getUploadURLExternal"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": false, "error": "not_in_channel"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = upload_external(&reqwest::Client::new(), "xoxb-test", &server.uri(), &upload())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not_in_channel"), "{err}");
    }

    #[tokio::test]
    async fn complete_error_is_reported() {
        let server = MockServer::start().await;
        mount_slot(&server).await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/files.completeUploadExternal"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": false, "error": "channel_not_found"})),
            )
            .mount(&server)
            .await;

        let err = upload_external(&reqwest::Client::new(), "xoxb-test", &server.uri(), &upload())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SlackError::Api { method: "files.completeUploadExternal", .. }
        ));
    }

    #[tokio::test]
    async fn rejected_put_is_reported() {
        let server = MockServer::start().await;
        mount_slot(&server).await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = upload_external(&reqwest::Client::new(), "xoxb-test", &server.uri(), &upload())
            .await
            .unwrap_err();
        assert!(matches!(err, SlackError::Http(_)));
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type("a.PNG"), "image/png");
        assert_eq!(content_type("a.jpg"), "image/jpeg");
        assert_eq!(content_type("a.gif"), "image/gif");
        assert_eq!(content_type("noext"), "application/octet-stream");
    }
}
