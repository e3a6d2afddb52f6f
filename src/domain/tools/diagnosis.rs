//! Symptom → likely-issue diagnosis
//!
//! A fixed decision table. The "first three issues", "first declared promotion"
//! and "first safety note" selections are stable-order tie-breaks that callers
//! depend on; keep them as they are.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::context::ToolContext;
use crate::domain::registry::{
    FieldKind, FieldSpec, InputSchema, ToolArgs, ToolDescriptor, ToolError,
};
use crate::widgets::DIAGNOSIS_RESULT;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "symptoms",
        FieldKind::StringArray,
        "List of symptoms the user described (e.g., ['won't close', 'grinding noise', 'stuck'])",
    ),
    FieldSpec::optional(
        "door_age_years",
        FieldKind::Number,
        "Approximate age of the garage door in years",
    ),
    FieldSpec::optional(
        "door_type",
        FieldKind::Enum(&["single", "double", "unknown"]),
        "Type of garage door",
    ),
];

pub const DESCRIPTOR: ToolDescriptor = ToolDescriptor {
    name: "diagnose_issue",
    title: "Diagnose Garage Door Issue",
    description: "Diagnose garage door problems from symptoms the user described. Use this AFTER asking about their location and verifying service area coverage. Provides urgency level, likely issues, cost estimates, and safety warnings.",
    input_schema: InputSchema { fields: FIELDS },
    handler: run,
    template: DIAGNOSIS_RESULT,
    invoking: "Analyzing symptoms...",
    invoked: "Diagnosis complete",
    hints: &[],
};

const MAX_ISSUES: usize = 3;
const CONFIDENCE: f64 = 0.85;
const FALLBACK_ISSUE: &str = "opener_failure";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Routine,
    Soon,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Repair,
    Maintenance,
}

struct SymptomPattern {
    pattern: &'static str,
    issues: &'static [&'static str],
    urgency: Urgency,
    service: ServiceKind,
}

const SYMPTOMS: &[SymptomPattern] = &[
    SymptomPattern {
        pattern: "won't open",
        issues: &["broken_spring", "opener_failure", "power_issue"],
        urgency: Urgency::Emergency,
        service: ServiceKind::Repair,
    },
    SymptomPattern {
        pattern: "won't close",
        issues: &["sensor_misalignment", "track_obstruction", "broken_spring"],
        urgency: Urgency::Emergency,
        service: ServiceKind::Repair,
    },
    SymptomPattern {
        pattern: "loud grinding",
        issues: &["worn_rollers", "track_damage", "lack_lubrication"],
        urgency: Urgency::Soon,
        service: ServiceKind::Maintenance,
    },
    SymptomPattern {
        pattern: "moves unevenly",
        issues: &["broken_cable", "worn_rollers", "track_misalignment"],
        urgency: Urgency::Soon,
        service: ServiceKind::Repair,
    },
    SymptomPattern {
        pattern: "opens partially",
        issues: &["broken_spring", "opener_limit_settings", "track_obstruction"],
        urgency: Urgency::Emergency,
        service: ServiceKind::Repair,
    },
    SymptomPattern {
        pattern: "banging noise",
        issues: &["broken_spring", "loose_hardware", "worn_hinges"],
        urgency: Urgency::Emergency,
        service: ServiceKind::Repair,
    },
    SymptomPattern {
        pattern: "remote not working",
        issues: &["dead_battery", "opener_failure", "signal_interference"],
        urgency: Urgency::Routine,
        service: ServiceKind::Repair,
    },
    SymptomPattern {
        pattern: "weather seal damaged",
        issues: &["worn_seal", "rodent_damage"],
        urgency: Urgency::Routine,
        service: ServiceKind::Maintenance,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostRange {
    pub min: u32,
    pub max: u32,
}

struct IssueInfo {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    cost_range: CostRange,
    promotion: Option<&'static str>,
    safety_note: Option<&'static str>,
}

const fn issue(
    key: &'static str,
    name: &'static str,
    description: &'static str,
    min: u32,
    max: u32,
) -> IssueInfo {
    IssueInfo {
        key,
        name,
        description,
        cost_range: CostRange { min, max },
        promotion: None,
        safety_note: None,
    }
}

const ISSUES: &[IssueInfo] = &[
    IssueInfo {
        promotion: Some("spring_special"),
        safety_note: Some("Do not attempt to operate door. Springs under extreme tension."),
        ..issue(
            "broken_spring",
            "Broken Spring",
            "Torsion or extension spring has snapped",
            150,
            350,
        )
    },
    IssueInfo {
        promotion: Some("tune_up"),
        ..issue(
            "worn_rollers",
            "Worn Rollers",
            "Rollers are worn, cracked, or seized",
            100,
            200,
        )
    },
    IssueInfo {
        promotion: Some("opener_special"),
        ..issue(
            "opener_failure",
            "Opener Malfunction",
            "Garage door opener motor or circuit board issue",
            150,
            500,
        )
    },
    IssueInfo {
        safety_note: Some("Door may fall unexpectedly. Do not use."),
        ..issue(
            "broken_cable",
            "Broken Cable",
            "Lift cable has frayed or snapped",
            125,
            250,
        )
    },
    IssueInfo {
        promotion: Some("tune_up"),
        ..issue(
            "sensor_misalignment",
            "Safety Sensor Issue",
            "Photo-eye sensors misaligned or malfunctioning",
            75,
            150,
        )
    },
    issue(
        "track_obstruction",
        "Track Obstruction",
        "Debris or damage blocking the door tracks",
        50,
        150,
    ),
    issue(
        "track_damage",
        "Damaged Track",
        "Door track is bent, dented, or misaligned",
        100,
        300,
    ),
    IssueInfo {
        promotion: Some("tune_up"),
        ..issue(
            "lack_lubrication",
            "Needs Lubrication",
            "Moving parts require maintenance lubrication",
            49,
            89,
        )
    },
    issue(
        "track_misalignment",
        "Track Misalignment",
        "Tracks are not properly aligned",
        75,
        200,
    ),
    issue(
        "power_issue",
        "Power Problem",
        "Electrical connection or power supply issue",
        50,
        150,
    ),
    issue(
        "dead_battery",
        "Dead Remote Battery",
        "Remote control battery needs replacement",
        10,
        25,
    ),
    issue(
        "signal_interference",
        "Signal Interference",
        "Radio frequency interference affecting remote",
        50,
        100,
    ),
    issue(
        "opener_limit_settings",
        "Limit Settings Issue",
        "Opener limit switches need adjustment",
        75,
        150,
    ),
    IssueInfo {
        promotion: Some("tune_up"),
        ..issue(
            "loose_hardware",
            "Loose Hardware",
            "Bolts, brackets, or hinges have loosened",
            50,
            100,
        )
    },
    issue(
        "worn_hinges",
        "Worn Hinges",
        "Door hinges are worn and need replacement",
        75,
        175,
    ),
    IssueInfo {
        promotion: Some("winterization"),
        ..issue(
            "worn_seal",
            "Worn Weather Seal",
            "Bottom seal or weather stripping is deteriorated",
            50,
            150,
        )
    },
    issue(
        "rodent_damage",
        "Rodent Damage",
        "Weather seal damaged by rodents",
        75,
        200,
    ),
];

fn lookup_issue(key: &str) -> Option<&'static IssueInfo> {
    ISSUES.iter().find(|issue| issue.key == key)
}

/// `door_age_years` and `door_type` are accepted and type-checked but do not
/// influence the diagnosis.
#[derive(Debug, Deserialize)]
pub struct DiagnoseIssueArgs {
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikelyIssue {
    pub name: &'static str,
    pub description: &'static str,
    pub cost_range: CostRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_note: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionRef {
    pub code: &'static str,
    pub applicable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub likely_issues: Vec<LikelyIssue>,
    pub confidence: f64,
    pub urgency: Urgency,
    pub recommended_service: ServiceKind,
    pub estimated_cost_range: CostRange,
    pub applicable_promotion: Option<PromotionRef>,
    pub safety_warning: Option<&'static str>,
    pub next_steps: Vec<&'static str>,
}

fn run(_ctx: &ToolContext<'_>, args: ToolArgs) -> Result<Value, ToolError> {
    let args: DiagnoseIssueArgs = serde_json::from_value(Value::Object(args))?;
    Ok(serde_json::to_value(diagnose(&args.symptoms))?)
}

pub fn diagnose(symptoms: &[String]) -> Diagnosis {
    let mut matched: Vec<&'static str> = Vec::new();
    let mut urgency = Urgency::Routine;
    let mut service = ServiceKind::Maintenance;

    for symptom in symptoms {
        let symptom = symptom.to_lowercase();
        for entry in SYMPTOMS.iter().filter(|entry| symptom.contains(entry.pattern)) {
            for key in entry.issues {
                if !matched.contains(key) {
                    matched.push(*key);
                }
            }
            urgency = urgency.max(entry.urgency);
            if entry.service == ServiceKind::Repair {
                service = ServiceKind::Repair;
            }
        }
    }

    if matched.is_empty() {
        matched.push(FALLBACK_ISSUE);
    }

    let likely_issues = matched
        .iter()
        .filter_map(|key| lookup_issue(key))
        .take(MAX_ISSUES)
        .map(|issue| LikelyIssue {
            name: issue.name,
            description: issue.description,
            cost_range: issue.cost_range,
            promotion: issue.promotion,
            safety_note: issue.safety_note,
        })
        .collect::<Vec<_>>();

    let estimated_cost_range = CostRange {
        min: likely_issues
            .iter()
            .map(|issue| issue.cost_range.min)
            .min()
            .unwrap_or(0),
        max: likely_issues
            .iter()
            .map(|issue| issue.cost_range.max)
            .max()
            .unwrap_or(0),
    };

    let applicable_promotion = likely_issues
        .iter()
        .find_map(|issue| issue.promotion)
        .map(|code| PromotionRef {
            code,
            applicable: true,
        });
    let safety_warning = likely_issues.iter().find_map(|issue| issue.safety_note);

    let first_step = if urgency == Urgency::Emergency {
        "Call immediately for emergency service"
    } else {
        "Schedule a service appointment"
    };

    Diagnosis {
        likely_issues,
        confidence: CONFIDENCE,
        urgency,
        recommended_service: service,
        estimated_cost_range,
        applicable_promotion,
        safety_warning,
        next_steps: vec![
            first_step,
            "Avoid using the door until repaired",
            "Ask about current promotions",
        ],
    }
}
