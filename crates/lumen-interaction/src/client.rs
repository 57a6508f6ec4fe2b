//! HTTP client for the insight backend.
//!
//! Every operation is one JSON POST round trip with no implicit retry. A
//! failed round trip is reported as a typed `RemoteError`; this layer never
//! substitutes data, leaving the degradation policy to the life cycles above.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use lumen_core::api::{ApiClient, DeepDiveHandle, QueryReply, RemoteError, TurnReply};
use lumen_core::error::{LumenError, Result};
use lumen_core::identity::Identity;

use crate::wire;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reqwest-backed implementation of [`ApiClient`].
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    http: Client,
    base_url: String,
}

impl HttpApiClient {
    /// Creates a client against the given base endpoint address.
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LumenError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Sends a JSON POST and decodes the reply body.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.post(path, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()).into())
    }

    /// Sends a JSON POST and discards the reply body.
    async fn post_unit<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + Sync,
    {
        self.post(path, body).await?;
        Ok(())
    }

    async fn post<B>(&self, path: &str, body: &B) -> Result<reqwest::Response>
    where
        B: Serialize + Sync,
    {
        let url = self.api_url(path);
        tracing::debug!(url = %url, "posting request");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Non-2xx bodies may carry a human-readable message.
            let message = response
                .json::<wire::ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message);
            return Err(RemoteError::status(status.as_u16(), message).into());
        }

        Ok(response)
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn submit_query(&self, identity: &Identity, question: &str) -> Result<QueryReply> {
        let request = wire::QueryRequest {
            user_id: &identity.user_id,
            session_id: &identity.session_id,
            user_question: question,
        };

        let envelope: wire::Envelope<wire::QueryResponseBody> =
            self.post_json("/query", &request).await?;
        Ok(wire::query_reply(envelope.data))
    }

    async fn init_deep_dive(
        &self,
        identity: &Identity,
        last_question: &str,
        last_answer: &str,
    ) -> Result<DeepDiveHandle> {
        let request = wire::InitRequest {
            user_id: &identity.user_id,
            session_id: &identity.session_id,
            last_question,
            last_answer,
        };

        let body: wire::InitResponseBody = self.post_json("/deep_dive/init", &request).await?;
        Ok(DeepDiveHandle {
            conversation_id: body.conversation_id,
        })
    }

    async fn send_turn(
        &self,
        identity: &Identity,
        question: &str,
        conversation_id: &str,
    ) -> Result<TurnReply> {
        let request = wire::TurnRequest {
            user_id: &identity.user_id,
            session_id: &identity.session_id,
            user_question: question,
            conversation_id,
        };

        let envelope: wire::Envelope<wire::TurnResponseBody> =
            self.post_json("/deep_dive/query", &request).await?;
        Ok(wire::turn_reply(envelope.data))
    }

    async fn end_deep_dive(&self, identity: &Identity, conversation_id: &str) -> Result<()> {
        let request = wire::EndRequest {
            user_id: &identity.user_id,
            session_id: &identity.session_id,
            conversation_id,
        };

        self.post_unit("/deep_dive/end", &request).await
    }
}
