use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod chat;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod stdio;
pub mod widgets;

use chat::ChatProxy;
use config::Config;
use domain::context::{BookingBackend, Contacts};
use domain::coverage::CoverageTable;
use domain::registry::ToolRegistry;
use domain::tools::build_registry;
use errors::StartupError;
use widgets::{HttpTemplateSource, WidgetRenderer};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ToolRegistry>,
    pub coverage: Arc<CoverageTable>,
    pub contacts: Arc<Contacts>,
    pub backend: BookingBackend,
    pub renderer: WidgetRenderer,
    pub chat: Arc<ChatProxy>,
}

impl AppState {
    pub fn new(
        registry: ToolRegistry,
        coverage: CoverageTable,
        contacts: Contacts,
        backend: BookingBackend,
        renderer: WidgetRenderer,
        chat: ChatProxy,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            coverage: Arc::new(coverage),
            contacts: Arc::new(contacts),
            backend,
            renderer,
            chat: Arc::new(chat),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let renderer = match &config.widget_base_url {
            Some(base_url) => WidgetRenderer::new(Arc::new(HttpTemplateSource::new(
                base_url.clone(),
                client.clone(),
            ))),
            None => WidgetRenderer::embedded(),
        };
        let chat = ChatProxy::new(
            client,
            config.openai_api_key.clone(),
            config.chat_api_base_url.clone(),
            config.chat_default_model.clone(),
        );

        Ok(Self::new(
            build_registry()?,
            CoverageTable::load(config.service_areas_path.as_deref())?,
            config.contacts.clone(),
            config.backend,
            renderer,
            chat,
        ))
    }
}

pub fn build_app(state: AppState) -> Router {
    let fallback = http::handlers::method_not_allowed;

    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .route(
            "/mcp",
            post(http::handlers::mcp_endpoint)
                .get(http::handlers::mcp_descriptor)
                .fallback(fallback),
        )
        .route("/widgets/{file}", get(http::handlers::widget_file))
        .route(
            "/test-tool",
            post(http::harness::run_tool)
                .get(http::harness::usage)
                .fallback(fallback),
        )
        .route("/chat", post(http::chat::chat_endpoint).fallback(fallback))
        .layer(middleware::from_fn(http::cors::cors_middleware))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}

#[cfg(test)]
impl AppState {
    pub(crate) fn for_tests() -> Self {
        Self::with_renderer(WidgetRenderer::embedded())
    }

    pub(crate) fn with_renderer(renderer: WidgetRenderer) -> Self {
        Self::new(
            build_registry().expect("registry builds"),
            CoverageTable::embedded().expect("embedded coverage"),
            Contacts::default(),
            BookingBackend::Mock,
            renderer,
            ChatProxy::new(
                reqwest::Client::new(),
                None,
                config::DEFAULT_CHAT_API_BASE_URL,
                config::DEFAULT_CHAT_MODEL,
            ),
        )
    }
}
