use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::{
    client::custom_questions_client_error::CustomQuestionsClientError,
    config::config::CONFIG,
    custom_questions::models::{
        CreateTopicRequest, DeleteTopicResponse, ErrorBody, TopicResponse,
    },
    escape_room::models::Topic,
};

/// The three calls the escape room needs from the custom-questions API.
#[async_trait]
pub trait TopicRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Topic>, CustomQuestionsClientError>;

    async fn create(
        &self,
        request: &CreateTopicRequest,
    ) -> Result<Topic, CustomQuestionsClientError>;

    /// Returns how many topics were removed. Unknown titles are not an error.
    async fn delete(&self, title: &str) -> Result<u64, CustomQuestionsClientError>;
}

#[derive(Debug, Clone)]
pub struct CustomQuestionsClient {
    domain: String,
    client: Client,
}

impl CustomQuestionsClient {
    pub fn new(domain: impl Into<String>, client: Client) -> Self {
        let domain = domain.into();

        Self { domain, client }
    }

    pub fn from_config() -> Result<Self, CustomQuestionsClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(CONFIG.client.timeout_secs))
            .build()?;

        Ok(Self::new(&CONFIG.client.api_base, client))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.domain.trim_end_matches('/'), path)
    }

    pub async fn health_check(&self) -> Result<(), CustomQuestionsClientError> {
        let response = self.client.get(self.url("health")).send().await?;
        if !response.status().is_success() {
            error!("Failed health check on custom questions api");
            return Err(CustomQuestionsClientError::ApiError(
                response.status(),
                "Failed to reach custom questions api".into(),
            ));
        }
        info!("Custom questions api is healthy");

        Ok(())
    }

    pub async fn get_topics(&self) -> Result<Vec<TopicResponse>, CustomQuestionsClientError> {
        let url = self.url("api/custom-questions");
        debug!("CustomQuestionsClient fetching topics from: {}", url);

        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    pub async fn create_topic(
        &self,
        request: &CreateTopicRequest,
    ) -> Result<TopicResponse, CustomQuestionsClientError> {
        let url = self.url("api/custom-questions");
        info!("CustomQuestionsClient creating topic '{}'", request.title);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        Self::read_json(response).await
    }

    pub async fn delete_topic(
        &self,
        title: &str,
    ) -> Result<DeleteTopicResponse, CustomQuestionsClientError> {
        let url = self.url("api/custom-questions");
        info!("CustomQuestionsClient deleting topics titled '{}'", title);

        let response = self
            .client
            .delete(&url)
            .query(&[("title", title)])
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
    ) -> Result<T, CustomQuestionsClientError> {
        let status = response.status();
        let body = response.text().await.unwrap_or("No body".into());

        if !status.is_success() {
            error!("CustomQuestionsClient request failed: {} - {}", status, body);
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(CustomQuestionsClientError::ApiError(status, message));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TopicRepository for CustomQuestionsClient {
    async fn list(&self) -> Result<Vec<Topic>, CustomQuestionsClientError> {
        let topics = self
            .get_topics()
            .await?
            .into_iter()
            .map(Topic::from)
            .filter(|t| !t.title.is_empty())
            .collect();

        Ok(topics)
    }

    async fn create(
        &self,
        request: &CreateTopicRequest,
    ) -> Result<Topic, CustomQuestionsClientError> {
        let created = self.create_topic(request).await?;
        Ok(Topic::from(created))
    }

    async fn delete(&self, title: &str) -> Result<u64, CustomQuestionsClientError> {
        let response = self.delete_topic(title).await?;
        Ok(response.deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_targets_configured_api() {
        let client = CustomQuestionsClient::from_config().unwrap();

        assert_eq!(
            client.url("api/custom-questions"),
            format!(
                "{}/api/custom-questions",
                CONFIG.client.api_base.trim_end_matches('/')
            )
        );
    }

    #[test]
    fn trailing_slash_is_not_doubled() {
        let client = CustomQuestionsClient::new("http://localhost:4000/", Client::new());
        assert_eq!(client.url("health"), "http://localhost:4000/health");
    }
}
