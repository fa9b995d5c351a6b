//! Receptor de notificações da Spedy. Só confirma o recebimento e devolve o que chegou.

use actix_web::http::header::HeaderMap;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::models::{WebhookPing, WebhookReceipt};
use crate::utils;

#[instrument(name = "handler::nf_webhook", skip_all, fields(bytes = body.len()))]
pub async fn receive_notification(req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let body = parse_body(&body);
    info!(payload = %body, "notificação recebida");

    HttpResponse::Ok().json(WebhookReceipt {
        ok: true,
        received_at: utils::now_millis(),
        headers: headers_to_json(req.headers()),
        body,
    })
}

/// GET e demais métodos: útil como ping
pub async fn ping(req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().json(WebhookPing {
        ok: true,
        method: req.method().to_string(),
        ts: utils::now_millis(),
    })
}

/// JSON quando possível, texto bruto caso contrário, null sem corpo
pub fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

pub fn headers_to_json(headers: &HeaderMap) -> Map<String, Value> {
    let mut out = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        out.insert(name.as_str().to_string(), Value::String(joined));
    }
    out
}
