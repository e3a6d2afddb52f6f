use garage_door_mcp::{
    build_app,
    config::{Config, Transport},
    logging, stdio, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;

    info!(
        tools = state.registry.list().len(),
        backend = ?config.backend,
        widget_base_url = config.widget_base_url.as_deref().unwrap_or("embedded"),
        "tool registry ready"
    );

    match config.transport {
        Transport::Stdio => stdio::run_stdio(state).await?,
        Transport::Http => {
            let bind_socket = config.bind_socket()?;
            let app = build_app(state);
            let listener = tokio::net::TcpListener::bind(bind_socket).await?;

            info!(
                bind_addr = %config.bind_addr,
                bind_port = config.bind_port,
                "server starting"
            );

            axum::serve(listener, app.into_make_service()).await?;
        }
    }
    Ok(())
}
