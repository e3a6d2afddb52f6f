//! Widget templates and tool-output injection
//!
//! Each tool result is shown through an HTML template. Templates come from a
//! [`TemplateSource`]: either fetched over HTTP from `WIDGET_BASE_URL` or
//! compiled into the binary. [`WidgetRenderer`] splices the structured result
//! into the page as `window.__TOOL_OUTPUT__`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub const WIDGET_MIME_TYPE: &str = "text/html";
pub const RESOURCE_MIME_TYPE: &str = "text/html+skybridge";
pub const EMBEDDED_URI_PREFIX: &str = "ui://widget/";

const INJECTION_POINT: &str = "</head>";
const BRIDGE_SCRIPT: &str = r#"<script src="https://cdn.openai.com/apps-sdk/bridge.js"></script>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetTemplate {
    pub file: &'static str,
    pub name: &'static str,
}

pub const SERVICE_AREA_RESULT: WidgetTemplate = WidgetTemplate {
    file: "service-area-result.html",
    name: "Service Area Result Widget",
};
pub const DIAGNOSIS_RESULT: WidgetTemplate = WidgetTemplate {
    file: "diagnosis-result.html",
    name: "Diagnosis Result Widget",
};
pub const PROMOTIONS_CAROUSEL: WidgetTemplate = WidgetTemplate {
    file: "promotions-carousel.html",
    name: "Promotions Carousel Widget",
};
pub const AVAILABILITY_SLOTS: WidgetTemplate = WidgetTemplate {
    file: "availability-slots.html",
    name: "Availability Slots Widget",
};
pub const DOOR_STYLES_CAROUSEL: WidgetTemplate = WidgetTemplate {
    file: "door-styles-carousel.html",
    name: "Door Styles Carousel Widget",
};
pub const BOOKING_CONFIRMATION: WidgetTemplate = WidgetTemplate {
    file: "booking-confirmation.html",
    name: "Booking Confirmation Widget",
};

const EMBEDDED: &[(&str, &str)] = &[
    (
        SERVICE_AREA_RESULT.file,
        include_str!("../widgets/service-area-result.html"),
    ),
    (
        DIAGNOSIS_RESULT.file,
        include_str!("../widgets/diagnosis-result.html"),
    ),
    (
        PROMOTIONS_CAROUSEL.file,
        include_str!("../widgets/promotions-carousel.html"),
    ),
    (
        AVAILABILITY_SLOTS.file,
        include_str!("../widgets/availability-slots.html"),
    ),
    (
        DOOR_STYLES_CAROUSEL.file,
        include_str!("../widgets/door-styles-carousel.html"),
    ),
    (
        BOOKING_CONFIRMATION.file,
        include_str!("../widgets/booking-confirmation.html"),
    ),
];

/// Template markup compiled into the binary, looked up by file name.
pub fn embedded_html(file: &str) -> Option<&'static str> {
    EMBEDDED
        .iter()
        .find(|(name, _)| *name == file)
        .map(|(_, html)| *html)
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0}")]
    Fetch(#[from] reqwest::Error),
    #[error("template server answered {status} for {url}")]
    Status { status: u16, url: String },
    #[error("unknown template {0}")]
    UnknownTemplate(String),
    #[error("tool output could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Stable identifier advertised in `tools/list` and `resources/list`.
    fn uri(&self, template: &WidgetTemplate) -> String;

    async fn fetch(&self, template: &WidgetTemplate) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplateSource;

#[async_trait]
impl TemplateSource for EmbeddedTemplateSource {
    fn uri(&self, template: &WidgetTemplate) -> String {
        format!("{EMBEDDED_URI_PREFIX}{}", template.file)
    }

    async fn fetch(&self, template: &WidgetTemplate) -> Result<String, RenderError> {
        embedded_html(template.file)
            .map(str::to_string)
            .ok_or_else(|| RenderError::UnknownTemplate(template.file.to_string()))
    }
}

/// Fetches `<base_url>/<file>` for every render. No caching, no retries.
#[derive(Debug, Clone)]
pub struct HttpTemplateSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTemplateSource {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl TemplateSource for HttpTemplateSource {
    fn uri(&self, template: &WidgetTemplate) -> String {
        format!("{}/{}", self.base_url, template.file)
    }

    async fn fetch(&self, template: &WidgetTemplate) -> Result<String, RenderError> {
        let url = self.uri(template);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedWidget {
    pub uri: String,
    pub mime_type: &'static str,
    pub html: String,
}

#[derive(Clone)]
pub struct WidgetRenderer {
    source: Arc<dyn TemplateSource>,
}

impl std::fmt::Debug for WidgetRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetRenderer").finish_non_exhaustive()
    }
}

impl WidgetRenderer {
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Self { source }
    }

    pub fn embedded() -> Self {
        Self::new(Arc::new(EmbeddedTemplateSource))
    }

    pub fn uri(&self, template: &WidgetTemplate) -> String {
        self.source.uri(template)
    }

    /// Raw template markup, as served by `resources/read`.
    pub async fn fetch(&self, template: &WidgetTemplate) -> Result<String, RenderError> {
        self.source.fetch(template).await
    }

    pub async fn render(
        &self,
        template: &WidgetTemplate,
        output: &Value,
    ) -> Result<RenderedWidget, RenderError> {
        let html = self.source.fetch(template).await?;
        Ok(RenderedWidget {
            uri: self.source.uri(template),
            mime_type: WIDGET_MIME_TYPE,
            html: inject_tool_output(&html, output)?,
        })
    }
}

/// Inserts `<script>window.__TOOL_OUTPUT__ = ...;</script>` before the first
/// `</head>`, or appends it when the page has none, and drops the hosted
/// bridge script tag. `</` inside the payload is written as `<\/` so string
/// data cannot close the script element.
pub fn inject_tool_output(html: &str, output: &Value) -> Result<String, RenderError> {
    let payload = serde_json::to_string(output)?.replace("</", "<\\/");
    let script = format!("<script>window.__TOOL_OUTPUT__ = {payload};</script>");

    let injected = match html.find(INJECTION_POINT) {
        Some(at) => format!("{}{script}{}", &html[..at], &html[at..]),
        None => format!("{html}{script}"),
    };
    Ok(injected.replacen(BRIDGE_SCRIPT, "", 1))
}
