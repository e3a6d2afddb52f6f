use chrono::{Datelike, Duration, NaiveTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::context::{BookingBackend, ToolContext};
use crate::domain::registry::{
    FieldKind, FieldSpec, InputSchema, ToolArgs, ToolDescriptor, ToolError,
};
use crate::domain::tools::availability::{timestamp, BACKEND_NOT_CONFIGURED, TIME_WINDOWS};
use crate::widgets::BOOKING_CONFIRMATION;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "service_type",
        FieldKind::Enum(&["emergency_repair", "standard_repair", "installation", "maintenance"]),
        "Type of service requested",
    ),
    FieldSpec::required(
        "issue_summary",
        FieldKind::String,
        "Brief description of the issue or service needed",
    ),
    FieldSpec::required("customer_name", FieldKind::String, "Customer's full name"),
    FieldSpec::required("phone", FieldKind::String, "Customer's phone number"),
    FieldSpec::required(
        "address",
        FieldKind::String,
        "Service address including city and zip",
    ),
    FieldSpec::optional(
        "preferred_date",
        FieldKind::String,
        "Preferred appointment date (ISO format) - ignored for emergency",
    ),
    FieldSpec::optional(
        "preferred_time_window",
        FieldKind::Enum(&["morning", "afternoon", "evening", "asap"]),
        "Preferred time window",
    ),
    FieldSpec::optional("promotion_code", FieldKind::String, "Promotion code to apply"),
];

pub const DESCRIPTOR: ToolDescriptor = ToolDescriptor {
    name: "create_service_request",
    title: "Book Service Appointment",
    description: "Create a service request and schedule an appointment with A Plus Garage Door. Use when user wants to book repair, installation, or maintenance service.",
    input_schema: InputSchema { fields: FIELDS },
    handler: run,
    template: BOOKING_CONFIRMATION,
    invoking: "Scheduling your appointment...",
    invoked: "Appointment confirmed!",
    hints: &[
        ("openai/destructiveHint", false),
        ("openai/confirmationRequired", true),
    ],
};

const CANCELLATION_POLICY: &str = "Free cancellation up to 2 hours before appointment";
const NEXT_STEPS: [&str; 3] = [
    "You'll receive a text confirmation shortly",
    "Technician will call 30 minutes before arrival",
    "Have photos of your door ready if possible",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedPromotion {
    pub code: &'static str,
    pub title: &'static str,
    pub discount: &'static str,
}

const BOOKABLE_PROMOTIONS: &[AppliedPromotion] = &[
    AppliedPromotion {
        code: "spring_special",
        title: "Broken Spring Special",
        discount: "$75 OFF 2 Springs / $30 OFF 1",
    },
    AppliedPromotion {
        code: "new_door",
        title: "New Door Savings",
        discount: "$200 OFF",
    },
    AppliedPromotion {
        code: "tune_up",
        title: "Safety & Maintenance Deal",
        discount: "$49 (Reg. $89)",
    },
    AppliedPromotion {
        code: "opener_special",
        title: "Garage Motor Special",
        discount: "$100 OFF LiftMaster",
    },
    AppliedPromotion {
        code: "winterization",
        title: "Winterization Special",
        discount: "50% OFF Rollers & Seals",
    },
];

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequestArgs {
    pub service_type: String,
    pub issue_summary: String,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub preferred_date: Option<String>,
    #[serde(default)]
    pub preferred_time_window: Option<String>,
    #[serde(default)]
    pub promotion_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRequest {
    pub confirmation_number: String,
    pub status: &'static str,
    pub service_type: String,
    pub issue_summary: String,
    pub customer_name: String,
    pub scheduled_date: String,
    pub time_window: &'static str,
    pub estimated_arrival: &'static str,
    pub technician: &'static str,
    pub address: String,
    pub phone: String,
    pub contact_phone: String,
    pub promotion_applied: Option<&'static AppliedPromotion>,
    pub can_modify: bool,
    pub cancellation_policy: &'static str,
    pub next_steps: [&'static str; 3],
}

fn run(ctx: &ToolContext<'_>, args: ToolArgs) -> Result<Value, ToolError> {
    let args: CreateServiceRequestArgs = serde_json::from_value(Value::Object(args))?;
    let confirmation_number = confirmation_number(ctx, &mut rand::thread_rng());
    Ok(serde_json::to_value(create_service_request(
        ctx,
        args,
        confirmation_number,
    )?)?)
}

/// `APL-<year>-<five digits>`; the digits are drawn from `10000..=99999`.
pub fn confirmation_number(ctx: &ToolContext<'_>, rng: &mut impl Rng) -> String {
    format!("APL-{}-{}", ctx.now.year(), rng.gen_range(10000..=99999))
}

pub fn create_service_request(
    ctx: &ToolContext<'_>,
    args: CreateServiceRequestArgs,
    confirmation_number: String,
) -> Result<ServiceRequest, ToolError> {
    if ctx.backend != BookingBackend::Mock {
        return Err(ToolError::BackendUnavailable(
            BACKEND_NOT_CONFIGURED.to_string(),
        ));
    }

    let emergency = args.service_type == "emergency_repair";
    let (scheduled_date, time_window) = if emergency {
        (timestamp(ctx.now), "Next available (1-2 hours)")
    } else if let Some(date) = args.preferred_date.clone() {
        (date, preferred_window(args.preferred_time_window.as_deref()))
    } else {
        let tomorrow = (ctx.now + Duration::days(1))
            .date_naive()
            .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default())
            .and_utc();
        (timestamp(tomorrow), TIME_WINDOWS[0])
    };

    let contact_phone = if args.address.to_lowercase().contains("utah") {
        ctx.contacts.phone_utah.clone()
    } else {
        ctx.contacts.phone_nevada.clone()
    };

    let promotion_applied = args
        .promotion_code
        .as_deref()
        .and_then(|code| BOOKABLE_PROMOTIONS.iter().find(|promo| promo.code == code));

    Ok(ServiceRequest {
        confirmation_number,
        status: "confirmed",
        service_type: args.service_type,
        issue_summary: args.issue_summary,
        customer_name: args.customer_name,
        scheduled_date,
        time_window,
        estimated_arrival: if emergency {
            "Within 1-2 hours"
        } else {
            "Technician will call 30 minutes before arrival"
        },
        technician: if emergency {
            "Emergency Team"
        } else {
            "Will be assigned day before"
        },
        address: args.address,
        phone: args.phone,
        contact_phone,
        promotion_applied,
        can_modify: true,
        cancellation_policy: CANCELLATION_POLICY,
        next_steps: NEXT_STEPS,
    })
}

fn preferred_window(window: Option<&str>) -> &'static str {
    match window {
        Some("afternoon") => TIME_WINDOWS[1],
        Some("evening") => TIME_WINDOWS[2],
        Some("asap") => "Next available",
        _ => TIME_WINDOWS[0],
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::domain::context::Contacts;
    use crate::domain::coverage::CoverageTable;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 20, 18, 45, 12)
            .single()
            .expect("valid instant")
    }

    fn with_ctx<T>(backend: BookingBackend, f: impl FnOnce(&ToolContext<'_>) -> T) -> T {
        let coverage = CoverageTable::embedded().expect("embedded coverage");
        let contacts = Contacts::default();
        let ctx = ToolContext::new(&coverage, &contacts, backend, now());
        f(&ctx)
    }

    fn args(service_type: &str) -> CreateServiceRequestArgs {
        CreateServiceRequestArgs {
            service_type: service_type.to_string(),
            issue_summary: "Spring snapped".to_string(),
            customer_name: "Jordan Lee".to_string(),
            phone: "702-555-0100".to_string(),
            address: "123 Main St, Henderson NV".to_string(),
            preferred_date: None,
            preferred_time_window: None,
            promotion_code: None,
        }
    }

    #[test]
    fn confirmation_number_has_year_and_five_digits() {
        with_ctx(BookingBackend::Mock, |ctx| {
            let mut rng = StdRng::seed_from_u64(7);
            for _ in 0..200 {
                let number = confirmation_number(ctx, &mut rng);
                let digits = number.strip_prefix("APL-2025-").expect("prefix");
                let value: u32 = digits.parse().expect("numeric suffix");
                assert!((10000..=99999).contains(&value));
            }
        });
    }

    #[test]
    fn emergency_is_scheduled_now() {
        with_ctx(BookingBackend::Mock, |ctx| {
            let request =
                create_service_request(ctx, args("emergency_repair"), "APL-2025-12345".into())
                    .expect("booked");
            assert_eq!(request.scheduled_date, "2025-11-20T18:45:12.000Z");
            assert_eq!(request.time_window, "Next available (1-2 hours)");
            assert_eq!(request.estimated_arrival, "Within 1-2 hours");
            assert_eq!(request.technician, "Emergency Team");
        });
    }

    #[test]
    fn without_preferred_date_defaults_to_tomorrow_morning() {
        with_ctx(BookingBackend::Mock, |ctx| {
            let request =
                create_service_request(ctx, args("standard_repair"), "APL-2025-12345".into())
                    .expect("booked");
            assert_eq!(request.scheduled_date, "2025-11-21T09:00:00.000Z");
            assert_eq!(request.time_window, "8:00 AM - 12:00 PM");
            assert_eq!(request.technician, "Will be assigned day before");
        });
    }

    #[test]
    fn preferred_date_is_used_verbatim_with_its_window() {
        with_ctx(BookingBackend::Mock, |ctx| {
            let mut input = args("installation");
            input.preferred_date = Some("2025-12-01".to_string());
            input.preferred_time_window = Some("evening".to_string());
            let request = create_service_request(ctx, input, "APL-2025-12345".into()).expect("booked");
            assert_eq!(request.scheduled_date, "2025-12-01");
            assert_eq!(request.time_window, "5:00 PM - 8:00 PM");
        });
    }

    #[test]
    fn known_promotion_resolves_and_unknown_is_null() {
        with_ctx(BookingBackend::Mock, |ctx| {
            let mut input = args("maintenance");
            input.promotion_code = Some("tune_up".to_string());
            let request = create_service_request(ctx, input, "APL-2025-12345".into()).expect("booked");
            assert_eq!(request.promotion_applied.map(|promo| promo.code), Some("tune_up"));

            let mut input = args("maintenance");
            input.promotion_code = Some("bogus".to_string());
            let request = create_service_request(ctx, input, "APL-2025-12345".into()).expect("booked");
            assert!(request.promotion_applied.is_none());
        });
    }

    #[test]
    fn utah_address_gets_utah_contact_phone() {
        with_ctx(BookingBackend::Mock, |ctx| {
            let mut input = args("standard_repair");
            input.address = "55 Temple St, Salt Lake City, Utah".to_string();
            let request = create_service_request(ctx, input, "APL-2025-12345".into()).expect("booked");
            assert_eq!(request.contact_phone, "(801) 683-6222");
        });
    }

    #[test]
    fn unconfigured_backend_is_unavailable() {
        with_ctx(BookingBackend::Unconfigured, |ctx| {
            let err = create_service_request(ctx, args("maintenance"), "APL-2025-12345".into())
                .expect_err("no backend");
            assert!(matches!(err, ToolError::BackendUnavailable(_)));
        });
    }
}
