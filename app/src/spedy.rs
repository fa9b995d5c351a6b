use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::config::Credentials;
use crate::models::DocumentRequest;

/// Status e corpo devolvidos pela Spedy
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub status: u16,
    pub body: Value,
}

impl ProviderReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `id` da Spedy, ou o `order_id` ecoado quando não houver `id`
    pub fn order_id(&self) -> Value {
        match self.body.get("id") {
            Some(id) if !id.is_null() => id.clone(),
            _ => self.body.get("order_id").cloned().unwrap_or(Value::Null),
        }
    }
}

/// Cliente HTTP para a API de pedidos da Spedy. Uma tentativa por chamada, sem retry.
#[derive(Clone)]
pub struct SpedyClient {
    http: reqwest::Client,
}

impl SpedyClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("spedy-nf/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Falha ao criar cliente HTTP")?;

        Ok(Self { http })
    }

    /// Erro só quando o envio falha. Corpo ilegível ou não-JSON vira `{}`.
    pub async fn create_order(
        &self,
        credentials: Credentials<'_>,
        payload: &DocumentRequest,
    ) -> Result<ProviderReply, reqwest::Error> {
        let url = credentials.orders_url();
        debug!(%url, "enviando pedido para a Spedy");

        let response = self
            .http
            .post(&url)
            .bearer_auth(credentials.token)
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|_| empty_object()),
            Err(e) => {
                debug!(error = %e, "falha ao ler corpo da resposta da Spedy");
                empty_object()
            }
        };

        Ok(ProviderReply { status, body })
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
