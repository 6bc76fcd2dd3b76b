use std::sync::Arc;

use tower_http::cors::CorsLayer;

use tax_assist::config::{EngineConfig, ServerConfig};
use tax_assist::dialogue::{ChatRouteState, DialogueController, FieldRegistry, LlmOracle, chat_routes};
use tax_assist::llm::{LlmConfig, create_provider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let server = ServerConfig::from_env()?;
    let engine = EngineConfig::from_env()?;

    let registry = match &server.schema_path {
        Some(path) => FieldRegistry::from_json_file(path)?,
        None => FieldRegistry::form_1040(),
    };
    let registry = Arc::new(registry);

    eprintln!("📝 Tax Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {} (model: {})", server.backend, server.model);
    eprintln!(
        "   Schema: {} ({} fields)",
        server
            .schema_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in Form 1040".to_string()),
        registry.len()
    );
    eprintln!(
        "   Validation: {}",
        if engine.validate_every_turn {
            "every turn"
        } else {
            "first turn only"
        }
    );
    eprintln!("   Oracle timeout: {:?}", engine.oracle_timeout);
    eprintln!("   Chat API: http://0.0.0.0:{}/api/chats/turn\n", server.port);

    let llm = create_provider(&LlmConfig {
        backend: server.backend,
        api_key: server.api_key.clone(),
        model: server.model.clone(),
    })?;

    // One provider serves both oracle roles.
    let oracle = Arc::new(LlmOracle::new(llm, &engine));
    let controller = Arc::new(DialogueController::new(
        Arc::clone(&registry),
        oracle.clone(),
        oracle,
        engine,
    ));

    let app = chat_routes(ChatRouteState {
        controller,
        registry,
    })
    .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", server.port)).await?;
    tracing::info!(port = server.port, "Chat server started");
    axum::serve(listener, app).await?;

    Ok(())
}
