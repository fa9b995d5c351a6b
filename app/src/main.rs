mod api;
mod builder;
mod config;
mod error;
mod models;
mod spedy;
mod ui;
mod utils;
mod webhook;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::builder::RequestOrigin;
use crate::config::{SpedyConfig, DEFAULT_BACKOFFICE_URL};
use crate::error::ApiError;

#[derive(Parser)]
#[command(name = "spedy-nf")]
#[command(about = "Emissão de NF-e/NFS-e na Spedy a partir de pedidos", long_about = None)]
struct Cli {
    /// Modo silencioso (menos saída)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Modo verboso (mais detalhes)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inicia o servidor HTTP (emissão + webhook)
    Server {
        /// Porta do servidor
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Endereço do servidor
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// URL base da API da Spedy
        #[arg(long, env = "SPEDY_API_BASE")]
        spedy_api_base: Option<String>,
        /// Token de acesso da Spedy
        #[arg(long, env = "SPEDY_TOKEN", hide_env_values = true)]
        spedy_token: Option<String>,
        /// Link do backoffice devolvido após a criação
        #[arg(long, env = "SPEDY_BACKOFFICE_URL", default_value = DEFAULT_BACKOFFICE_URL)]
        backoffice_url: String,
        /// Exige id_empresa nos pedidos
        #[arg(long, env = "SPEDY_REQUIRE_COMPANY_ID")]
        require_company_id: bool,
    },
    /// Valida um pedido (arquivo JSON) e mostra o payload que seria enviado, sem chamar a Spedy
    Preview {
        /// Arquivo JSON com o pedido
        file: String,
        /// Host usado para montar a URL de webhook
        #[arg(long, default_value = "localhost:8080")]
        host: String,
        /// Protocolo usado para montar a URL de webhook
        #[arg(long, default_value = "https")]
        proto: String,
        /// Exige id_empresa no pedido
        #[arg(long)]
        require_company_id: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    ui::init(cli.quiet, cli.verbose);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(ui::default_log_level()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Server {
            port,
            host,
            spedy_api_base,
            spedy_token,
            backoffice_url,
            require_company_id,
        } => {
            let config = SpedyConfig {
                api_base: spedy_api_base,
                token: spedy_token,
                backoffice_url,
                require_company_id,
            };
            api::start_server(config, &host, port).await?;
        }
        Commands::Preview {
            file,
            host,
            proto,
            require_company_id,
        } => {
            preview_order(&file, &host, &proto, require_company_id)?;
        }
    }

    Ok(())
}

fn preview_order(file: &str, host: &str, proto: &str, require_company_id: bool) -> Result<()> {
    ui::print_header("🔎 Pré-visualização do pedido");
    ui::print_verbose(&format!("Arquivo: {}", file));

    let input = builder::parse_order_input(utils::read_json_file(file)?);
    let origin = RequestOrigin::new(Some(proto), host);

    let payload = match builder::build_document_request(input, &origin, require_company_id) {
        Ok(payload) => payload,
        Err(ApiError::Validation(msg)) => {
            ui::print_error(&msg);
            anyhow::bail!("Pedido inválido: {}", msg);
        }
        Err(e) => return Err(e.into()),
    };

    ui::print_success("Pedido válido");
    let json = serde_json::to_string_pretty(&payload).context("Falha ao serializar payload")?;
    println!("{}", json);

    Ok(())
}
