use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::context::ToolContext;
use crate::domain::coverage::{Coordinates, State};
use crate::domain::registry::{
    FieldKind, FieldSpec, InputSchema, ToolArgs, ToolDescriptor, ToolError,
};
use crate::widgets::SERVICE_AREA_RESULT;

const FIELDS: &[FieldSpec] = &[FieldSpec::required(
    "location",
    FieldKind::String,
    "The city name, neighborhood, or zip code the user explicitly mentioned (e.g., 'Henderson', 'Las Vegas', 'Salt Lake City', '89123')",
)];

pub const DESCRIPTOR: ToolDescriptor = ToolDescriptor {
    name: "check_service_area",
    title: "Check Service Area",
    description: "Check if A Plus Garage Door services a specific location. ONLY use this tool when the user has explicitly stated their city, neighborhood, or zip code. Do NOT call this tool if you don't know the user's location - ask them first.",
    input_schema: InputSchema { fields: FIELDS },
    handler: run,
    template: SERVICE_AREA_RESULT,
    invoking: "Checking service area coverage...",
    invoked: "Service area verified",
    hints: &[],
};

const MISSING_LOCATION: &str =
    "Location not provided. Please ask the user for their city or zip code.";

#[derive(Debug, Deserialize)]
pub struct CheckServiceAreaArgs {
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageResult {
    pub location: String,
    pub is_covered: bool,
    pub service_area_name: Option<String>,
    pub state: Option<State>,
    pub phone: Option<String>,
    pub nearest_coverage: Option<String>,
    pub distance_miles: u32,
    pub emergency_available: bool,
    pub map_center: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn run(ctx: &ToolContext<'_>, args: ToolArgs) -> Result<Value, ToolError> {
    let args: CheckServiceAreaArgs = serde_json::from_value(Value::Object(args))?;
    Ok(serde_json::to_value(check_service_area(ctx, &args.location))?)
}

pub fn check_service_area(ctx: &ToolContext<'_>, location: &str) -> CoverageResult {
    let search_term = location.trim().to_lowercase();

    if search_term.chars().count() < 2 {
        return CoverageResult {
            location: if location.is_empty() {
                "unknown".to_string()
            } else {
                location.to_string()
            },
            is_covered: false,
            service_area_name: None,
            state: None,
            phone: None,
            nearest_coverage: None,
            distance_miles: 0,
            emergency_available: false,
            map_center: None,
            error: Some(MISSING_LOCATION.to_string()),
        };
    }

    match ctx.coverage.find(&search_term) {
        Some((state, area)) => CoverageResult {
            location: location.to_string(),
            is_covered: true,
            service_area_name: Some(area.name.clone()),
            state: Some(state),
            phone: Some(ctx.coverage.phone_for(state).to_string()),
            nearest_coverage: None,
            distance_miles: 0,
            emergency_available: true,
            map_center: Some(area.coords),
            error: None,
        },
        None => CoverageResult {
            location: location.to_string(),
            is_covered: false,
            service_area_name: None,
            state: None,
            phone: Some(ctx.coverage.phone_for(State::Nevada).to_string()),
            nearest_coverage: Some(ctx.coverage.coverage_notes.nearest_coverage.clone()),
            distance_miles: 0,
            emergency_available: true,
            map_center: None,
            error: None,
        },
    }
}
