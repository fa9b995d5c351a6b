use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Pedido recebido do cliente. Nada aqui é confiável até passar por `builder::validate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderInput {
    #[serde(default)]
    pub id_empresa: Value,
    #[serde(default, rename = "type")]
    pub document_type: Value,
    #[serde(default)]
    pub emitter: Value,
    #[serde(default, deserialize_with = "present")]
    pub buyer: Option<Value>,
    #[serde(default)]
    pub items: Value,
    #[serde(default)]
    pub services: Value,
    #[serde(default, deserialize_with = "present")]
    pub totals: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub fiscal_details: Option<Value>,
    #[serde(default)]
    pub order_id: Value,
    #[serde(default)]
    pub callbacks: Value,
}

/// Campo presente vira `Some`, mesmo quando o valor é `null`; só a ausência vira `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// NF-e, nota de mercadorias
    Nfe,
    /// NFS-e, nota de serviços
    Nfse,
}

impl DocumentType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "nfe" => Some(DocumentType::Nfe),
            "nfse" => Some(DocumentType::Nfse),
            _ => None,
        }
    }
}

/// Linhas do documento: mercadorias para NF-e, serviços para NFS-e. Nunca as duas.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentLines {
    Items(Vec<Value>),
    Services(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Callbacks {
    pub webhook_url: String,
}

/// Payload enviado para `POST {api_base}/v1/orders`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRequest {
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub order_id: Value,
    pub emitter: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiscal_details: Option<Value>,
    pub callbacks: Callbacks,
}

/// Resposta 201 do endpoint de criação
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub ok: bool,
    pub spedy_order_id: Value,
    pub backoffice_link: String,
    pub spedy_response: Value,
}

#[derive(Debug, Serialize)]
pub struct WebhookReceipt {
    pub ok: bool,
    pub received_at: i64,
    pub headers: serde_json::Map<String, Value>,
    pub body: Value,
}

#[derive(Debug, Serialize)]
pub struct WebhookPing {
    pub ok: bool,
    pub method: String,
    pub ts: i64,
}
