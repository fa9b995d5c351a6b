use crate::error::ApiError;

pub const DEFAULT_BACKOFFICE_URL: &str = "https://stage-app.spedy.com.br";

const MISSING_CREDENTIALS: &str = "Missing SPEDY_API_BASE or SPEDY_TOKEN environment variables";

/// Configuração da integração com a Spedy, montada uma vez na inicialização.
#[derive(Debug, Clone)]
pub struct SpedyConfig {
    pub api_base: Option<String>,
    pub token: Option<String>,
    /// Link exibido ao cliente após a criação do pedido
    pub backoffice_url: String,
    /// Exige `id_empresa` antes de qualquer outra validação
    pub require_company_id: bool,
}

/// URL base e token já verificados
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub api_base: &'a str,
    pub token: &'a str,
}

impl Default for SpedyConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            token: None,
            backoffice_url: DEFAULT_BACKOFFICE_URL.to_string(),
            require_company_id: false,
        }
    }
}

impl SpedyConfig {
    pub fn credentials(&self) -> Result<Credentials<'_>, ApiError> {
        let api_base = non_empty(&self.api_base);
        let token = non_empty(&self.token);

        match (api_base, token) {
            (Some(api_base), Some(token)) => Ok(Credentials { api_base, token }),
            _ => Err(ApiError::Configuration(MISSING_CREDENTIALS.to_string())),
        }
    }
}

impl Credentials<'_> {
    pub fn orders_url(&self) -> String {
        format!("{}/v1/orders", self.api_base.trim_end_matches('/'))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> SpedyConfig {
        SpedyConfig {
            api_base: Some("https://sandbox-api.spedy.com.br/".to_string()),
            token: Some("tok".to_string()),
            ..SpedyConfig::default()
        }
    }

    #[test]
    fn default_uses_stage_backoffice() {
        let config = SpedyConfig::default();
        assert_eq!(config.backoffice_url, DEFAULT_BACKOFFICE_URL);
        assert!(!config.require_company_id);
    }

    #[test]
    fn missing_or_empty_credentials_are_configuration_errors() {
        assert!(matches!(
            SpedyConfig::default().credentials(),
            Err(ApiError::Configuration(_))
        ));

        let empty_token = SpedyConfig {
            token: Some("  ".to_string()),
            ..configured()
        };
        assert!(matches!(
            empty_token.credentials(),
            Err(ApiError::Configuration(msg)) if msg.contains("SPEDY_TOKEN")
        ));
    }

    #[test]
    fn orders_url_strips_trailing_slash() {
        let config = configured();
        let creds = config.credentials().unwrap();
        assert_eq!(creds.orders_url(), "https://sandbox-api.spedy.com.br/v1/orders");
        assert_eq!(creds.token, "tok");
    }
}
