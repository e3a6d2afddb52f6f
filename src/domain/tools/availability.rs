use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, SecondsFormat, Utc, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::context::{BookingBackend, ToolContext};
use crate::domain::registry::{
    FieldKind, FieldSpec, InputSchema, ToolArgs, ToolDescriptor, ToolError,
};
use crate::widgets::AVAILABILITY_SLOTS;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "service_type",
        FieldKind::Enum(&["emergency", "repair", "installation", "maintenance"]),
        "Type of service",
    ),
    FieldSpec::required(
        "location",
        FieldKind::String,
        "Service location (city or zip code)",
    ),
    FieldSpec::optional(
        "date_range_days",
        FieldKind::Number,
        "Number of days to check availability",
    ),
];

pub const DESCRIPTOR: ToolDescriptor = ToolDescriptor {
    name: "get_availability",
    title: "Check Availability",
    description: "Check available appointment slots for A Plus Garage Door service. Use when user asks about scheduling or availability.",
    input_schema: InputSchema { fields: FIELDS },
    handler: run,
    template: AVAILABILITY_SLOTS,
    invoking: "Checking technician availability...",
    invoked: "Found available slots",
    hints: &[],
};

pub const DEFAULT_DATE_RANGE_DAYS: f64 = 7.0;

pub(crate) const BACKEND_NOT_CONFIGURED: &str = "Scheduling backend integration not yet configured";

pub(crate) const TIME_WINDOWS: [&str; 3] =
    ["8:00 AM - 12:00 PM", "12:00 PM - 5:00 PM", "5:00 PM - 8:00 PM"];

static UTAH_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)utah|salt lake|provo|ogden|st\.? george").expect("valid utah location regex")
});

#[derive(Debug, Deserialize)]
pub struct GetAvailabilityArgs {
    pub service_type: String,
    pub location: String,
    #[serde(default)]
    pub date_range_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilitySlot {
    pub date: String,
    pub time_window: &'static str,
    pub technician: &'static str,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityResult {
    pub service_type: String,
    pub location: String,
    pub emergency_available_now: bool,
    pub available_slots: Vec<AvailabilitySlot>,
    pub next_available: Option<AvailabilitySlot>,
    pub total_slots: usize,
    pub phone: String,
    pub note: &'static str,
}

fn run(ctx: &ToolContext<'_>, args: ToolArgs) -> Result<Value, ToolError> {
    let args: GetAvailabilityArgs = serde_json::from_value(Value::Object(args))?;
    let result = check_availability(
        ctx,
        &args.service_type,
        &args.location,
        args.date_range_days.unwrap_or(DEFAULT_DATE_RANGE_DAYS),
    )?;
    Ok(serde_json::to_value(result)?)
}

pub fn check_availability(
    ctx: &ToolContext<'_>,
    service_type: &str,
    location: &str,
    date_range_days: f64,
) -> Result<AvailabilityResult, ToolError> {
    if ctx.backend != BookingBackend::Mock {
        return Err(ToolError::BackendUnavailable(
            BACKEND_NOT_CONFIGURED.to_string(),
        ));
    }

    let emergency = service_type == "emergency";
    let slots = if emergency {
        vec![AvailabilitySlot {
            date: timestamp(ctx.now),
            time_window: "Immediate (1-2 hours)",
            technician: "Emergency Team",
            available: true,
        }]
    } else {
        upcoming_slots(ctx.now, day_count(ctx.now, date_range_days)?)
    };

    let phone = if UTAH_LOCATION.is_match(location) {
        ctx.contacts.phone_utah.clone()
    } else {
        ctx.contacts.phone_nevada.clone()
    };

    Ok(AvailabilityResult {
        service_type: service_type.to_string(),
        location: location.to_string(),
        emergency_available_now: emergency,
        next_available: slots.first().cloned(),
        total_slots: slots.len(),
        available_slots: slots,
        phone,
        note: if emergency {
            "24/7 emergency service available - call now for immediate dispatch"
        } else {
            "Book online or call to schedule your preferred time"
        },
    })
}

/// Number of day offsets to scan. Fractional ranges round up, so `1.5`
/// covers today and tomorrow. Ranges reaching past the representable calendar
/// are rejected.
fn day_count(now: DateTime<Utc>, days: f64) -> Result<i64, ToolError> {
    if days.is_nan() || days <= 0.0 {
        return Ok(0);
    }

    let count = days.ceil() as i64;
    Duration::try_days(count - 1)
        .and_then(|span| now.checked_add_signed(span))
        .map(|_| count)
        .ok_or_else(|| {
            ToolError::InvalidArguments(format!("date_range_days {days} is out of range"))
        })
}

fn upcoming_slots(now: DateTime<Utc>, days: i64) -> Vec<AvailabilitySlot> {
    let mut slots = Vec::new();
    for offset in 0..days {
        let date = now + Duration::days(offset);
        if date.weekday() == Weekday::Sun {
            continue;
        }

        let per_day = if offset < 3 { 2 } else { 1 };
        for window in TIME_WINDOWS.iter().take(per_day) {
            slots.push(AvailabilitySlot {
                date: timestamp(date),
                time_window: window,
                technician: if offset == 0 { "Available" } else { "Will assign" },
                available: true,
            });
        }
    }
    slots
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::context::Contacts;
    use crate::domain::coverage::CoverageTable;

    // 2025-06-02 is a Monday.
    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 15, 30, 0)
            .single()
            .expect("valid instant")
    }

    fn with_ctx<T>(
        backend: BookingBackend,
        now: DateTime<Utc>,
        f: impl FnOnce(&ToolContext<'_>) -> T,
    ) -> T {
        let coverage = CoverageTable::embedded().expect("embedded coverage");
        let contacts = Contacts::default();
        let ctx = ToolContext::new(&coverage, &contacts, backend, now);
        f(&ctx)
    }

    #[test]
    fn emergency_is_a_single_immediate_slot() {
        with_ctx(BookingBackend::Mock, monday(), |ctx| {
            let result = check_availability(ctx, "emergency", "Henderson", 7.0).expect("slots");
            assert!(result.emergency_available_now);
            assert_eq!(result.total_slots, 1);
            assert_eq!(result.available_slots[0].time_window, "Immediate (1-2 hours)");
            assert_eq!(result.available_slots[0].technician, "Emergency Team");
            assert_eq!(result.next_available, result.available_slots.first().cloned());
        });
    }

    #[test]
    fn week_from_monday_skips_sunday() {
        with_ctx(BookingBackend::Mock, monday(), |ctx| {
            let result = check_availability(ctx, "repair", "Las Vegas", 7.0).expect("slots");
            // Mon, Tue, Wed at two windows each; Thu, Fri, Sat at one; Sunday skipped.
            assert_eq!(result.total_slots, 9);
            assert!(result
                .available_slots
                .iter()
                .all(|slot| !slot.date.starts_with("2025-06-08")));
            assert_eq!(result.available_slots[0].technician, "Available");
            assert_eq!(result.available_slots[2].technician, "Will assign");
            assert_eq!(result.available_slots[0].date, "2025-06-02T15:30:00.000Z");
            assert_eq!(result.phone, "(702) 297-7811");
        });
    }

    #[test]
    fn fractional_ranges_round_up() {
        with_ctx(BookingBackend::Mock, monday(), |ctx| {
            let none = check_availability(ctx, "repair", "Henderson", -5.0).expect("slots");
            assert_eq!(none.total_slots, 0);
            assert!(none.next_available.is_none());

            // Monday and Tuesday, two windows each.
            let fractional = check_availability(ctx, "repair", "Henderson", 1.5).expect("slots");
            assert_eq!(fractional.total_slots, 4);
            assert!(fractional.available_slots[3].date.starts_with("2025-06-03"));
        });
    }

    #[test]
    fn long_ranges_are_not_truncated() {
        with_ctx(BookingBackend::Mock, monday(), |ctx| {
            let result = check_availability(ctx, "repair", "Henderson", 90.0).expect("slots");
            // 90 days hold 12 Sundays; the first three days carry an extra window.
            assert_eq!(result.total_slots, 81);
            let last = result.available_slots.last().expect("last slot");
            assert!(last.date.starts_with("2025-08-30"));
        });
    }

    #[test]
    fn unrepresentable_range_is_invalid() {
        with_ctx(BookingBackend::Mock, monday(), |ctx| {
            for days in [1e9, f64::INFINITY] {
                let err = check_availability(ctx, "repair", "Henderson", days)
                    .expect_err("out of range");
                assert!(matches!(err, ToolError::InvalidArguments(_)), "{days}");
            }

            let emergency = check_availability(ctx, "emergency", "Henderson", f64::INFINITY)
                .expect("emergency ignores the range");
            assert_eq!(emergency.total_slots, 1);
        });
    }

    #[test]
    fn utah_locations_get_the_utah_phone() {
        with_ctx(BookingBackend::Mock, monday(), |ctx| {
            for location in ["Salt Lake City", "PROVO", "St George", "st. george", "Ogden, UT"] {
                let result = check_availability(ctx, "maintenance", location, 3.0).expect("slots");
                assert_eq!(result.phone, "(801) 683-6222", "{location}");
            }
        });
    }

    #[test]
    fn unconfigured_backend_is_unavailable() {
        with_ctx(BookingBackend::Unconfigured, monday(), |ctx| {
            let err = check_availability(ctx, "repair", "Henderson", 7.0).expect_err("no backend");
            assert!(matches!(err, ToolError::BackendUnavailable(_)));
        });
    }
}
