use async_trait::async_trait;
use reqwest::{Client, multipart};
use std::time::Duration;
use tracing::{debug, error};

use crate::notifier::{ApiResponse, ChatProvider, NotifierConfig, NotifyError, PhotoUpload, TextMessage};

pub struct SlackProvider {
    client: Client,
    api_base: String,
    token: String,
}

impl SlackProvider {
    pub fn new(config: &NotifierConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    async fn check_response(response: reqwest::Response) -> Result<(), NotifyError> {
        let status = response.status();
        let body: ApiResponse = response.json().await?;
        if body.ok {
            Ok(())
        } else {
            let reason = body.error.unwrap_or_else(|| "unknown error".to_string());
            error!("Slack rejected request (HTTP {}): {}", status, reason);
            Err(NotifyError::Api(reason))
        }
    }
}

#[async_trait]
impl ChatProvider for SlackProvider {
    async fn upload_photo(&self, upload: PhotoUpload) -> Result<(), NotifyError> {
        debug!(
            "Uploading {} ({} bytes) to Slack channel {}",
            upload.file_name,
            upload.bytes.len(),
            upload.channel
        );

        let file = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str("image/jpeg")?;
        let form = multipart::Form::new()
            .part("file", file)
            .text("channels", upload.channel)
            .text("initial_comment", upload.caption);

        let response = self
            .client
            .post(self.endpoint("files.upload"))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        Self::check_response(response).await
    }

    async fn post_message(&self, message: TextMessage) -> Result<(), NotifyError> {
        debug!("Posting message to Slack channel {}", message.channel);

        let response = self
            .client
            .post(self.endpoint("chat.postMessage"))
            .bearer_auth(&self.token)
            .json(&message)
            .send()
            .await?;

        Self::check_response(response).await
    }

    fn name(&self) -> &str {
        "Slack"
    }
}
