use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::context::ToolContext;
use crate::domain::registry::{
    FieldKind, FieldSpec, InputSchema, ToolArgs, ToolDescriptor, ToolError,
};
use crate::widgets::PROMOTIONS_CAROUSEL;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::optional(
        "service_type",
        FieldKind::Enum(&["repair", "installation", "maintenance", "all"]),
        "Filter promotions by service type",
    ),
    FieldSpec::optional(
        "issue_type",
        FieldKind::String,
        "Specific issue to find applicable promotions (e.g., 'spring', 'opener')",
    ),
];

pub const DESCRIPTOR: ToolDescriptor = ToolDescriptor {
    name: "get_promotions",
    title: "Get Current Promotions",
    description: "Retrieve current A Plus Garage Door deals, coupons, and special offers. Use when user asks about pricing, discounts, or deals.",
    input_schema: InputSchema { fields: FIELDS },
    handler: run,
    template: PROMOTIONS_CAROUSEL,
    invoking: "Finding current deals...",
    invoked: "Found available promotions",
    hints: &[],
};

const DISCLAIMER: &str = "One coupon per visit. Not stackable with other offers. Terms apply.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Promotion {
    pub id: &'static str,
    pub title: &'static str,
    pub discount: &'static str,
    pub description: &'static str,
    pub service_types: &'static [&'static str],
    pub issue_types: &'static [&'static str],
    pub priority: u32,
    pub valid_until: &'static str,
}

pub const PROMOTIONS: &[Promotion] = &[
    Promotion {
        id: "spring_special",
        title: "Broken Spring Special",
        discount: "$75 OFF 2 Springs / $30 OFF 1",
        description: "Springs are your door's backbone. Replace them now to keep it lifting smooth.",
        service_types: &["repair"],
        issue_types: &["broken_spring", "spring"],
        priority: 1,
        valid_until: "2026-12-31",
    },
    Promotion {
        id: "new_door",
        title: "New Door Savings",
        discount: "$200 OFF Any New Garage Door",
        description: "Steel, insulated, or custom. Boost curb appeal and recoup up to 194% at resale.",
        service_types: &["installation"],
        issue_types: &[],
        priority: 2,
        valid_until: "2026-12-31",
    },
    Promotion {
        id: "tune_up",
        title: "Safety & Maintenance Deal",
        discount: "$49 (Reg. $89)",
        description: "Annual Lube & Tune with 24-Point Safety Inspection. Protect your investment!",
        service_types: &["maintenance"],
        issue_types: &["maintenance", "tune_up", "rollers", "lubrication"],
        priority: 3,
        valid_until: "2026-12-31",
    },
    Promotion {
        id: "opener_special",
        title: "Garage Motor Special",
        discount: "$100 OFF LiftMaster Elite Series",
        description: "Smart features like MyQ app, 2,000-lumen LED, and ultra-quiet motor.",
        service_types: &["repair", "installation"],
        issue_types: &["opener", "motor", "remote"],
        priority: 4,
        valid_until: "2026-12-31",
    },
    Promotion {
        id: "winterization",
        title: "Winterization Special",
        discount: "50% OFF Rollers, Bottom Seals & Weather Trim",
        description: "Prepare your garage for the colder months.",
        service_types: &["maintenance"],
        issue_types: &["weather_seal", "rollers", "seal"],
        priority: 5,
        valid_until: "2026-03-31",
    },
    Promotion {
        id: "new_door_bundle",
        title: "New Door Upgrade Bundle",
        discount: "FREE Rollers + Lube & Tune ($287 Value)",
        description: "Purchase a new garage door motor with installation and get free rollers plus professional tune-up.",
        service_types: &["installation"],
        issue_types: &["opener", "motor"],
        priority: 6,
        valid_until: "2026-12-31",
    },
];

#[derive(Debug, Deserialize)]
pub struct GetPromotionsArgs {
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub issue_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionsResult {
    pub promotions: Vec<&'static Promotion>,
    pub promotion_count: usize,
    pub phone_nevada: String,
    pub phone_utah: String,
    pub disclaimer: &'static str,
}

fn run(ctx: &ToolContext<'_>, args: ToolArgs) -> Result<Value, ToolError> {
    let args: GetPromotionsArgs = serde_json::from_value(Value::Object(args))?;
    let promotions = active_promotions(args.service_type.as_deref(), args.issue_type.as_deref());

    Ok(serde_json::to_value(PromotionsResult {
        promotion_count: promotions.len(),
        promotions,
        phone_nevada: ctx.contacts.phone_nevada.clone(),
        phone_utah: ctx.contacts.phone_utah.clone(),
        disclaimer: DISCLAIMER,
    })?)
}

pub fn active_promotions(
    service_type: Option<&str>,
    issue_type: Option<&str>,
) -> Vec<&'static Promotion> {
    let service_type = service_type.filter(|value| *value != "all");
    let issue_type = issue_type
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase);

    let mut promotions = PROMOTIONS
        .iter()
        .filter(|promo| service_type.is_none_or(|wanted| promo.service_types.contains(&wanted)))
        .filter(|promo| {
            issue_type.as_deref().is_none_or(|issue| {
                promo.issue_types.iter().any(|tag| issue.contains(tag))
            })
        })
        .collect::<Vec<_>>();
    promotions.sort_by_key(|promo| promo.priority);
    promotions
}
