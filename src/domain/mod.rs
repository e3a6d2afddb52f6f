//! Garage door service domain
//!
//! Coverage data, the tool registry with its input validator, and the tool
//! handlers themselves. Nothing here knows about transports.

pub mod context;
pub mod coverage;
pub mod registry;
pub mod resources;
pub mod tools;
pub mod validation;
