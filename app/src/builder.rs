//! Validação e normalização do pedido antes do envio à Spedy.
//!
//! Nada aqui faz I/O: recebe o pedido já desserializado e a origem da requisição,
//! devolve o `DocumentRequest` pronto ou o primeiro erro de validação encontrado.

use crate::error::ApiError;
use crate::models::{Callbacks, DocumentLines, DocumentRequest, DocumentType, OrderInput};
use crate::utils;
use serde_json::Value;

/// Caminho do receptor de webhooks nesta mesma implantação
pub const WEBHOOK_PATH: &str = "/api/nf-webhook";

/// Protocolo e host pelos quais a requisição chegou
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub proto: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn new(forwarded_proto: Option<&str>, host: &str) -> Self {
        // X-Forwarded-Proto pode vir como lista ("https,http"); vale o primeiro
        let proto = forwarded_proto
            .and_then(|p| p.split(',').next())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or("https");

        Self {
            proto: proto.to_string(),
            host: host.to_string(),
        }
    }

    pub fn webhook_url(&self) -> String {
        format!("{}://{}{}", self.proto, self.host, WEBHOOK_PATH)
    }
}

/// Regras em ordem; a primeira violação encerra.
pub fn validate(input: &OrderInput, require_company_id: bool) -> Result<(DocumentType, DocumentLines), ApiError> {
    if require_company_id && !utils::is_truthy(&input.id_empresa) {
        return Err(ApiError::Validation("id_empresa é obrigatório".to_string()));
    }

    let document_type = input
        .document_type
        .as_str()
        .and_then(DocumentType::parse)
        .ok_or_else(|| ApiError::Validation(r#"type deve ser "nfe" ou "nfse""#.to_string()))?;

    let has_cnpj = input
        .emitter
        .get("cnpj")
        .map(utils::is_truthy)
        .unwrap_or(false);
    if !has_cnpj {
        return Err(ApiError::Validation("emitter.cnpj é obrigatório".to_string()));
    }

    let lines = match document_type {
        DocumentType::Nfe => non_empty_list(&input.items)
            .map(DocumentLines::Items)
            .ok_or_else(|| ApiError::Validation("items obrigatórios para NF-e".to_string()))?,
        DocumentType::Nfse => non_empty_list(&input.services)
            .map(DocumentLines::Services)
            .ok_or_else(|| ApiError::Validation("services obrigatórios para NFS-e".to_string()))?,
    };

    Ok((document_type, lines))
}

fn non_empty_list(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(list) if !list.is_empty() => Some(list.clone()),
        _ => None,
    }
}

pub fn resolve_webhook_url(input: &OrderInput, origin: &RequestOrigin) -> String {
    input
        .callbacks
        .get("webhook_url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| origin.webhook_url())
}

/// O `order_id` do cliente segue intacto; sem ele, gera um novo.
pub fn resolve_order_id(input: &OrderInput) -> Value {
    if utils::is_truthy(&input.order_id) {
        input.order_id.clone()
    } else {
        Value::String(utils::generate_order_id())
    }
}

pub fn build_document_request(
    input: OrderInput,
    origin: &RequestOrigin,
    require_company_id: bool,
) -> Result<DocumentRequest, ApiError> {
    let (document_type, lines) = validate(&input, require_company_id)?;
    let webhook_url = resolve_webhook_url(&input, origin);
    let order_id = resolve_order_id(&input);

    let (items, services) = match lines {
        DocumentLines::Items(items) => (Some(items), None),
        DocumentLines::Services(services) => (None, Some(services)),
    };

    Ok(DocumentRequest {
        document_type,
        order_id,
        emitter: input.emitter,
        buyer: input.buyer,
        items,
        services,
        totals: input.totals,
        fiscal_details: input.fiscal_details,
        callbacks: Callbacks { webhook_url },
    })
}

/// Corpo não-objeto (array, string, null) vira pedido vazio e cai na primeira regra.
pub fn parse_order_input(body: Value) -> OrderInput {
    match body {
        Value::Object(_) => serde_json::from_value(body).unwrap_or_default(),
        _ => OrderInput::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn origin() -> RequestOrigin {
        RequestOrigin::new(None, "nf.example.com")
    }

    fn nfe_order() -> Value {
        json!({
            "type": "nfe",
            "emitter": { "cnpj": "12345678000190" },
            "buyer": { "name": "Maria", "cpf": "12345678909" },
            "items": [{ "sku": "A1", "qty": 2, "price": 10.5 }],
            "services": [{ "code": "ignored" }],
            "totals": { "amount": 21.0 },
            "fiscal_details": { "cfop": "5102" }
        })
    }

    fn nfse_order() -> Value {
        json!({
            "type": "nfse",
            "emitter": { "cnpj": "12345678000190" },
            "items": [{ "sku": "ignored" }],
            "services": [{ "code": "01.07", "amount": 300 }]
        })
    }

    fn rejection(body: Value, require_company_id: bool) -> String {
        match build_document_request(parse_order_input(body), &origin(), require_company_id) {
            Err(ApiError::Validation(msg)) => msg,
            other => panic!("esperava erro de validação, veio {:?}", other),
        }
    }

    #[test]
    fn each_rule_has_its_own_message() {
        let mut body = nfe_order();
        body.as_object_mut().unwrap().remove("type");
        assert_eq!(rejection(body, false), r#"type deve ser "nfe" ou "nfse""#);

        let mut body = nfe_order();
        body["type"] = json!("cte");
        assert_eq!(rejection(body, false), r#"type deve ser "nfe" ou "nfse""#);

        let mut body = nfe_order();
        body["emitter"] = json!({ "cnpj": "" });
        assert_eq!(rejection(body, false), "emitter.cnpj é obrigatório");

        let mut body = nfe_order();
        body.as_object_mut().unwrap().remove("emitter");
        assert_eq!(rejection(body, false), "emitter.cnpj é obrigatório");

        let mut body = nfe_order();
        body["items"] = json!([]);
        assert_eq!(rejection(body, false), "items obrigatórios para NF-e");

        let mut body = nfse_order();
        body["services"] = json!({ "code": "not-a-list" });
        assert_eq!(rejection(body, false), "services obrigatórios para NFS-e");
    }

    #[test]
    fn company_id_checked_first_only_when_required() {
        let body = json!({ "type": "bogus" });
        assert_eq!(rejection(body.clone(), true), "id_empresa é obrigatório");
        assert_eq!(rejection(body, false), r#"type deve ser "nfe" ou "nfse""#);

        let mut body = nfe_order();
        body["id_empresa"] = json!("emp-1");
        assert!(build_document_request(parse_order_input(body), &origin(), true).is_ok());
    }

    #[test]
    fn non_object_body_fails_on_type() {
        assert_eq!(rejection(json!([1, 2]), false), r#"type deve ser "nfe" ou "nfse""#);
        assert_eq!(rejection(Value::Null, false), r#"type deve ser "nfe" ou "nfse""#);
    }

    #[test]
    fn nfe_request_carries_items_only() {
        let request = build_document_request(parse_order_input(nfe_order()), &origin(), false).unwrap();
        assert_eq!(request.document_type, DocumentType::Nfe);
        assert_eq!(request.items.as_ref().map(Vec::len), Some(1));
        assert!(request.services.is_none());

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "nfe");
        assert!(json.get("services").is_none());
        assert_eq!(json["buyer"]["name"], "Maria");
        assert_eq!(json["totals"]["amount"], 21.0);
        assert_eq!(json["fiscal_details"]["cfop"], "5102");
    }

    #[test]
    fn nfse_request_carries_services_only() {
        let request = build_document_request(parse_order_input(nfse_order()), &origin(), false).unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["type"], "nfse");
        assert!(json.get("items").is_none());
        assert_eq!(json["services"][0]["code"], "01.07");
        assert!(json.get("buyer").is_none());
    }

    #[test]
    fn explicit_null_pass_through_fields_are_kept() {
        let mut body = nfse_order();
        body["buyer"] = Value::Null;
        body["totals"] = Value::Null;
        let request = build_document_request(parse_order_input(body), &origin(), false).unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json.get("buyer"), Some(&Value::Null));
        assert_eq!(json.get("totals"), Some(&Value::Null));
        assert!(json.get("fiscal_details").is_none());
    }

    #[test]
    fn caller_order_id_is_kept() {
        let mut body = nfe_order();
        body["order_id"] = json!("pedido-991");
        let request = build_document_request(parse_order_input(body), &origin(), false).unwrap();
        assert_eq!(request.order_id, json!("pedido-991"));
    }

    #[test]
    fn missing_order_id_is_generated() {
        let request = build_document_request(parse_order_input(nfe_order()), &origin(), false).unwrap();
        let id = request.order_id.as_str().unwrap();
        assert!(id.starts_with(utils::ORDER_ID_PREFIX));
        assert!(id.len() > utils::ORDER_ID_PREFIX.len());
    }

    #[test]
    fn caller_webhook_url_is_used_verbatim() {
        let mut body = nfe_order();
        body["callbacks"] = json!({ "webhook_url": "https://erp.example.com/hooks/nf?x=1" });
        let request = build_document_request(parse_order_input(body), &origin(), false).unwrap();
        assert_eq!(request.callbacks.webhook_url, "https://erp.example.com/hooks/nf?x=1");
    }

    #[test]
    fn webhook_url_derived_from_origin() {
        assert_eq!(origin().webhook_url(), "https://nf.example.com/api/nf-webhook");

        let forwarded = RequestOrigin::new(Some("http"), "localhost:8080");
        assert_eq!(forwarded.webhook_url(), "http://localhost:8080/api/nf-webhook");

        let listed = RequestOrigin::new(Some("http, https"), "a.b");
        assert_eq!(listed.proto, "http");

        let mut body = nfe_order();
        body["callbacks"] = json!({ "webhook_url": "" });
        let request = build_document_request(parse_order_input(body), &forwarded, false).unwrap();
        assert_eq!(request.callbacks.webhook_url, "http://localhost:8080/api/nf-webhook");
    }
}
