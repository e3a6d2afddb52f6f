use chrono::{DateTime, Utc};

use crate::domain::coverage::CoverageTable;

pub const DEFAULT_PHONE_NEVADA: &str = "(702) 297-7811";
pub const DEFAULT_PHONE_UTAH: &str = "(801) 683-6222";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contacts {
    pub phone_nevada: String,
    pub phone_utah: String,
}

impl Default for Contacts {
    fn default() -> Self {
        Self {
            phone_nevada: DEFAULT_PHONE_NEVADA.to_string(),
            phone_utah: DEFAULT_PHONE_UTAH.to_string(),
        }
    }
}

/// Which scheduling backend availability and booking requests go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingBackend {
    #[default]
    Mock,
    Unconfigured,
}

/// Everything a tool handler may read besides its arguments. Built per request
/// so handlers stay pure functions of their input.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub coverage: &'a CoverageTable,
    pub contacts: &'a Contacts,
    pub backend: BookingBackend,
    pub now: DateTime<Utc>,
}

impl<'a> ToolContext<'a> {
    pub fn new(
        coverage: &'a CoverageTable,
        contacts: &'a Contacts,
        backend: BookingBackend,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            coverage,
            contacts,
            backend,
            now,
        }
    }
}
