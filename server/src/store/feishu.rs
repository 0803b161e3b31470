//! Feishu Bitable implementation of the remote store.

use super::{BatchResponse, RemoteStore, StoreConnector, StoreError};
use crate::config::FeishuConfig;
use async_trait::async_trait;
use bondsync_engine::{CanonicalRecord, RecordId, RemoteEntry, RemotePage, UpdateEntry};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Response envelope shared by the Bitable endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    tenant_access_token: Option<String>,
    #[allow(dead_code)]
    expire: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListData {
    #[serde(default)]
    has_more: bool,
    page_token: Option<String>,
    total: Option<u64>,
    /// `null` on an empty table
    items: Option<Vec<RemoteEntry>>,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Serialize)]
struct NewRow<'a> {
    fields: &'a CanonicalRecord,
}

#[derive(Serialize)]
struct BatchBody<T: Serialize> {
    records: T,
}

/// Unauthenticated client. Call [`StoreConnector::connect`] once per pass.
#[derive(Debug, Clone)]
pub struct FeishuClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    app_token: String,
    table_id: String,
}

impl FeishuClient {
    pub fn new(config: &FeishuConfig) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            app_token: config.app_token.clone(),
            table_id: config.table_id.clone(),
        })
    }

    fn records_url(&self) -> String {
        format!(
            "{}/open-apis/bitable/v1/apps/{}/tables/{}/records",
            self.base_url, self.app_token, self.table_id
        )
    }

    /// Exchange app credentials for a tenant access token.
    async fn fetch_tenant_token(&self) -> Result<String, StoreError> {
        let url = format!(
            "{}/open-apis/auth/v3/tenant_access_token/internal",
            self.base_url
        );

        let response: TokenResponse = self
            .http
            .post(url)
            .json(&TokenRequest {
                app_id: &self.app_id,
                app_secret: &self.app_secret,
            })
            .send()
            .await?
            .json()
            .await?;

        if response.code != 0 {
            return Err(StoreError::Api {
                code: response.code,
                msg: response.msg,
            });
        }

        response
            .tenant_access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StoreError::Decode("token response without tenant_access_token".into()))
    }
}

#[async_trait]
impl StoreConnector for FeishuClient {
    type Store = FeishuSession;

    async fn connect(&self) -> Result<FeishuSession, StoreError> {
        let token = self.fetch_tenant_token().await?;
        tracing::debug!(table_id = %self.table_id, "acquired tenant access token");

        Ok(FeishuSession {
            client: self.clone(),
            token,
        })
    }
}

/// A client holding the token acquired for the current pass.
#[derive(Debug)]
pub struct FeishuSession {
    client: FeishuClient,
    token: String,
}

impl FeishuSession {
    async fn post_batch<T: Serialize + Send>(
        &self,
        action: &str,
        records: T,
    ) -> Result<BatchResponse, StoreError> {
        let url = format!("{}/{}", self.client.records_url(), action);
        let envelope: Envelope<serde_json::Value> = self
            .send_json(self.client.http.post(url).json(&BatchBody { records }))
            .await?;

        Ok(BatchResponse {
            code: envelope.code,
            msg: envelope.msg,
        })
    }

    async fn send_json<R: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<R, StoreError> {
        Ok(request
            .bearer_auth(&self.token)
            .send()
            .await?
            .json()
            .await?)
    }
}

#[async_trait]
impl RemoteStore for FeishuSession {
    async fn query(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<RemotePage, StoreError> {
        let mut request = self
            .client
            .http
            .get(self.client.records_url())
            .query(&[("page_size", page_size.to_string())]);
        if let Some(token) = page_token {
            request = request.query(&[("page_token", token)]);
        }

        let envelope: Envelope<ListData> = self.send_json(request).await?;
        if envelope.code != 0 {
            return Err(StoreError::Api {
                code: envelope.code,
                msg: envelope.msg,
            });
        }

        let data = envelope
            .data
            .ok_or_else(|| StoreError::Decode("list response without data".into()))?;

        Ok(RemotePage {
            entries: data.items.unwrap_or_default(),
            has_more: data.has_more,
            page_token: data.page_token,
            total: data.total,
        })
    }

    async fn create_batch(
        &self,
        records: &[CanonicalRecord],
    ) -> Result<BatchResponse, StoreError> {
        let rows: Vec<NewRow<'_>> = records.iter().map(|fields| NewRow { fields }).collect();
        self.post_batch("batch_create", rows).await
    }

    async fn update_batch(&self, records: &[UpdateEntry]) -> Result<BatchResponse, StoreError> {
        self.post_batch("batch_update", records).await
    }

    async fn delete_batch(&self, ids: &[RecordId]) -> Result<BatchResponse, StoreError> {
        self.post_batch("batch_delete", ids).await
    }
}
