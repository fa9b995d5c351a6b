use actix_web::http::{header, Method};
use actix_web::{middleware, web, HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::builder::{self, RequestOrigin, WEBHOOK_PATH};
use crate::config::SpedyConfig;
use crate::error::ApiError;
use crate::models::CreatedResponse;
use crate::spedy::SpedyClient;
use crate::ui;
use crate::webhook;

pub const CREATE_PATH: &str = "/api/nf-create-from-order";

/// Limite de corpo nos dois endpoints (o padrão do actix é 256 KiB)
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

pub struct AppState {
    pub config: SpedyConfig,
    pub spedy: SpedyClient,
}

#[instrument(name = "handler::nf_create_from_order", skip_all)]
pub async fn create_document(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    // Sem URL base/token não adianta nem validar
    let credentials = state.config.credentials().inspect_err(|e| error!(error = %e, "configuração ausente"))?;

    let input = builder::parse_order_input(parse_json_body(&body)?);
    let origin = request_origin(&req);

    let payload = builder::build_document_request(input, &origin, state.config.require_company_id)
        .inspect_err(|e| warn!(error = %e, "pedido rejeitado"))?;

    info!(
        order_id = %payload.order_id,
        document_type = ?payload.document_type,
        webhook_url = %payload.callbacks.webhook_url,
        "encaminhando pedido para a Spedy"
    );

    let reply = state
        .spedy
        .create_order(credentials, &payload)
        .await
        .map_err(|e| {
            error!(error = %e, "falha ao chamar a Spedy");
            ApiError::internal(e)
        })?;

    if !reply.is_success() {
        warn!(status = reply.status, response = %reply.body, "Spedy recusou o pedido");
        return Err(ApiError::Upstream {
            http_status: reply.status,
            response: reply.body,
        });
    }

    let spedy_order_id = reply.order_id();
    info!(spedy_order_id = %spedy_order_id, "pedido criado na Spedy");

    Ok(HttpResponse::Created().json(CreatedResponse {
        ok: true,
        spedy_order_id,
        backoffice_link: state.config.backoffice_url.clone(),
        spedy_response: reply.body,
    }))
}

/// Corpo vazio conta como `{}`
fn parse_json_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body)
        .map_err(|_| ApiError::Validation("corpo da requisição deve ser um JSON válido".to_string()))
}

fn request_origin(req: &HttpRequest) -> RequestOrigin {
    let forwarded_proto = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok());

    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| req.connection_info().host().to_string());

    RequestOrigin::new(forwarded_proto, &host)
}

async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

async fn method_not_allowed() -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}

async fn health_check() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "mensagem": "Ponte Spedy está funcionando"
    })))
}

/// CORS permissivo em todas as respostas, inclusive de erro
pub fn cors_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((header::ACCESS_CONTROL_ALLOW_METHODS, "GET,POST,OPTIONS"))
        .add((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type,Authorization"))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(CREATE_PATH)
            .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
            .route(web::post().to(create_document))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource(WEBHOOK_PATH)
            .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
            .route(web::post().to(webhook::receive_notification))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::to(webhook::ping)),
    )
    .route("/health", web::get().to(health_check));
}

pub async fn start_server(config: SpedyConfig, host: &str, port: u16) -> anyhow::Result<()> {
    if config.credentials().is_err() {
        ui::print_warning("SPEDY_API_BASE ou SPEDY_TOKEN não configurados: a emissão responderá 500");
    }

    let app_state = web::Data::new(AppState {
        config,
        spedy: SpedyClient::new()?,
    });

    let address = format!("{}:{}", host, port);

    ui::print_header("🧾 Ponte de emissão NF-e/NFS-e (Spedy)");
    ui::print_success(&format!("Servidor iniciando em http://{}", address));
    ui::print_info("Endpoints disponíveis:");
    use colored::Colorize;
    println!("  {} POST {}  - Cria NF-e/NFS-e a partir de um pedido", "•".cyan(), CREATE_PATH);
    println!("  {} POST {}          - Recebe notificações da Spedy", "•".cyan(), WEBHOOK_PATH);
    println!("  {} GET  /health                  - Verifica status do servidor", "•".cyan());
    ui::print_verbose(&format!("Backoffice: {}", app_state.config.backoffice_url));
    if app_state.config.require_company_id {
        ui::print_verbose("id_empresa obrigatório nos pedidos");
    }
    ui::print_separator();

    info!(%address, "servidor HTTP iniciando");

    actix_web::HttpServer::new(move || {
        actix_web::App::new()
            .app_data(app_state.clone())
            .wrap(cors_headers())
            .configure(routes)
    })
    .bind(&address)?
    .workers(num_cpus::get())
    .run()
    .await?;

    Ok(())
}
