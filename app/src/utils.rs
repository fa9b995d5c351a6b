use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Prefixo dos identificadores de correlação gerados localmente
pub const ORDER_ID_PREFIX: &str = "fs_";

pub fn read_json_file(path: &str) -> Result<Value> {
    if !Path::new(path).exists() {
        anyhow::bail!("Arquivo não encontrado: {}", path);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Falha ao ler arquivo: {}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Arquivo não contém JSON válido: {}", path))
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Mesma noção de "presente" usada pelos integradores: null, false, 0 e "" contam como ausentes.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Formato: fs_<token aleatório de 128 bits>_<epoch em ms>.
/// Não é chave primária; serve só para correlacionar pedido e webhook.
pub fn generate_order_id() -> String {
    format!(
        "{}{}_{}",
        ORDER_ID_PREFIX,
        uuid::Uuid::new_v4().simple(),
        now_millis()
    )
}
