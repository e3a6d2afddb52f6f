use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::context::ToolContext;
use crate::domain::registry::{
    FieldKind, FieldSpec, InputSchema, ToolArgs, ToolDescriptor, ToolError,
};
use crate::widgets::DOOR_STYLES_CAROUSEL;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::optional(
        "style_filter",
        FieldKind::Enum(&["steel", "aluminum", "insulated", "glass", "custom", "all"]),
        "Filter by door material/style",
    ),
    FieldSpec::optional(
        "budget_range",
        FieldKind::Enum(&["economy", "mid-range", "premium", "all"]),
        "Filter by price range",
    ),
];

pub const DESCRIPTOR: ToolDescriptor = ToolDescriptor {
    name: "get_door_styles",
    title: "Browse Garage Door Styles",
    description: "Show available garage door styles for installation. Use when user asks about new door options, styles, or replacements.",
    input_schema: InputSchema { fields: FIELDS },
    handler: run,
    template: DOOR_STYLES_CAROUSEL,
    invoking: "Loading door styles...",
    invoked: "Here are your options",
    hints: &[],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoorStyle {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub material: &'static str,
    pub budget: &'static str,
    pub price_range: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub image_url: &'static str,
}

pub const DOOR_STYLES: &[DoorStyle] = &[
    DoorStyle {
        id: "steel_classic",
        name: "Classic Steel",
        material: "steel",
        budget: "economy",
        price_range: "$800 - $1,500",
        description: "Durable, low-maintenance steel doors in traditional raised panel design",
        features: &["Rust-resistant", "Multiple colors", "10-year warranty"],
        image_url: "/images/doors/steel-classic.jpg",
    },
    DoorStyle {
        id: "steel_carriage",
        name: "Carriage House Steel",
        material: "steel",
        budget: "mid-range",
        price_range: "$1,500 - $2,500",
        description: "Steel doors with carriage house styling for classic curb appeal",
        features: &["Decorative hardware", "Wood-look finish", "Insulation options"],
        image_url: "/images/doors/steel-carriage.jpg",
    },
    DoorStyle {
        id: "insulated_premium",
        name: "Premium Insulated",
        material: "insulated",
        budget: "mid-range",
        price_range: "$1,800 - $3,000",
        description: "Triple-layer insulated doors perfect for temperature control",
        features: &["R-16 insulation", "Energy efficient", "Quieter operation"],
        image_url: "/images/doors/insulated-premium.jpg",
    },
    DoorStyle {
        id: "aluminum_modern",
        name: "Modern Aluminum",
        material: "aluminum",
        budget: "premium",
        price_range: "$3,000 - $5,000",
        description: "Sleek, contemporary aluminum frames with glass panels",
        features: &["Full-view glass", "Powder-coated frames", "Modern aesthetic"],
        image_url: "/images/doors/aluminum-modern.jpg",
    },
    DoorStyle {
        id: "glass_full",
        name: "Full Glass",
        material: "glass",
        budget: "premium",
        price_range: "$4,000 - $7,000",
        description: "Maximum natural light with tempered glass panels",
        features: &["Tempered safety glass", "Frosted options", "Dramatic curb appeal"],
        image_url: "/images/doors/glass-full.jpg",
    },
    DoorStyle {
        id: "custom_design",
        name: "Custom Design",
        material: "custom",
        budget: "premium",
        price_range: "$5,000+",
        description: "Fully customized doors designed to your specifications",
        features: &["Unique designs", "Any material combination", "Architectural matching"],
        image_url: "/images/doors/custom.jpg",
    },
];

#[derive(Debug, Deserialize)]
pub struct GetDoorStylesArgs {
    #[serde(default)]
    pub style_filter: Option<String>,
    #[serde(default)]
    pub budget_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallPromotion {
    pub code: &'static str,
    pub discount: &'static str,
    pub description: &'static str,
}

const NEW_DOOR_PROMOTION: InstallPromotion = InstallPromotion {
    code: "new_door",
    discount: "$200 OFF",
    description: "Any new garage door installation",
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoorStylesResult {
    pub styles: Vec<&'static DoorStyle>,
    pub total_styles: usize,
    pub promotion: InstallPromotion,
    pub consultation_available: bool,
    pub financing_available: bool,
    pub phone_nevada: String,
    pub phone_utah: String,
}

fn run(ctx: &ToolContext<'_>, args: ToolArgs) -> Result<Value, ToolError> {
    let args: GetDoorStylesArgs = serde_json::from_value(Value::Object(args))?;
    let styles = door_styles(args.style_filter.as_deref(), args.budget_range.as_deref());

    Ok(serde_json::to_value(DoorStylesResult {
        total_styles: styles.len(),
        styles,
        promotion: NEW_DOOR_PROMOTION,
        consultation_available: true,
        financing_available: true,
        phone_nevada: ctx.contacts.phone_nevada.clone(),
        phone_utah: ctx.contacts.phone_utah.clone(),
    })?)
}

pub fn door_styles(style_filter: Option<&str>, budget_range: Option<&str>) -> Vec<&'static DoorStyle> {
    let wildcard = |filter: Option<&str>, value: &str| {
        filter.is_none_or(|wanted| wanted == "all" || wanted == value)
    };

    DOOR_STYLES
        .iter()
        .filter(|style| wildcard(style_filter, style.material))
        .filter(|style| wildcard(budget_range, style.budget))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::domain::context::{BookingBackend, Contacts};
    use crate::domain::coverage::CoverageTable;

    fn run_twice(args: serde_json::Value) -> (String, String) {
        let coverage = CoverageTable::embedded().expect("embedded coverage");
        let contacts = Contacts::default();
        let ctx = ToolContext::new(&coverage, &contacts, BookingBackend::Mock, Utc::now());
        let args = args.as_object().cloned().expect("object");

        let first = run(&ctx, args.clone()).expect("first");
        let second = run(&ctx, args).expect("second");
        (
            serde_json::to_string(&first).expect("serialize"),
            serde_json::to_string(&second).expect("serialize"),
        )
    }

    fn ids(styles: &[&DoorStyle]) -> Vec<&'static str> {
        styles.iter().map(|style| style.id).collect()
    }

    #[test]
    fn no_filters_return_whole_catalog_in_order() {
        assert_eq!(door_styles(None, None).len(), DOOR_STYLES.len());
        assert_eq!(door_styles(Some("all"), Some("all")).len(), DOOR_STYLES.len());
    }

    #[test]
    fn style_and_budget_filters_combine() {
        assert_eq!(
            ids(&door_styles(Some("steel"), None)),
            vec!["steel_classic", "steel_carriage"]
        );
        assert_eq!(
            ids(&door_styles(Some("steel"), Some("mid-range"))),
            vec!["steel_carriage"]
        );
        assert_eq!(
            ids(&door_styles(None, Some("premium"))),
            vec!["aluminum_modern", "glass_full", "custom_design"]
        );
        assert!(door_styles(Some("glass"), Some("economy")).is_empty());
    }

    #[test]
    fn material_serializes_as_type() {
        let value = serde_json::to_value(DOOR_STYLES[0].clone()).expect("serialize");
        assert_eq!(value["type"], "steel");
        assert!(value.get("material").is_none());
    }

    #[test]
    fn repeated_calls_serialize_identically() {
        let (first, second) = run_twice(json!({ "style_filter": "steel", "budget_range": "all" }));
        assert_eq!(first, second);
        assert!(first.contains("\"total_styles\":2"));
    }
}
