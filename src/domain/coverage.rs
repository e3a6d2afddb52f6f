//! Service-area coverage document
//!
//! Loaded once at startup from `SERVICE_AREAS_PATH`, or from the copy embedded
//! in the binary, and shared read-only afterwards.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const EMBEDDED_COVERAGE: &str = include_str!("../../data/service-areas.json");

#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("failed to read coverage document {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid coverage document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceArea {
    pub name: String,
    pub zip_prefixes: Vec<String>,
    pub coords: Coordinates,
}

impl ServiceArea {
    /// Exact (case-insensitive) name match first, then zip prefixes in order.
    pub fn matches(&self, search_term: &str) -> bool {
        self.name.to_lowercase() == search_term
            || self
                .zip_prefixes
                .iter()
                .any(|prefix| search_term.starts_with(prefix.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NevadaRegion {
    pub name: String,
    pub areas: Vec<ServiceArea>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtahSubRegion {
    pub key: String,
    pub name: String,
    pub areas: Vec<ServiceArea>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtahRegion {
    pub name: String,
    pub regions: Vec<UtahSubRegion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regions {
    pub nevada: NevadaRegion,
    pub utah: UtahRegion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageNotes {
    pub phone_nevada: String,
    pub phone_utah: String,
    pub nearest_coverage: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum State {
    Nevada,
    Utah,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageTable {
    pub regions: Regions,
    pub coverage_notes: CoverageNotes,
}

impl CoverageTable {
    pub fn load(path: Option<&Path>) -> Result<Self, CoverageError> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| CoverageError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_json(&raw)
            }
            None => Self::embedded(),
        }
    }

    pub fn embedded() -> Result<Self, CoverageError> {
        Self::from_json(EMBEDDED_COVERAGE)
    }

    pub fn from_json(raw: &str) -> Result<Self, CoverageError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// First matching area: Nevada areas in table order, then Utah sub-regions
    /// in table order. `search_term` must already be trimmed and lowercased.
    pub fn find(&self, search_term: &str) -> Option<(State, &ServiceArea)> {
        let nevada = self
            .regions
            .nevada
            .areas
            .iter()
            .find(|area| area.matches(search_term))
            .map(|area| (State::Nevada, area));

        nevada.or_else(|| {
            self.regions
                .utah
                .regions
                .iter()
                .flat_map(|region| region.areas.iter())
                .find(|area| area.matches(search_term))
                .map(|area| (State::Utah, area))
        })
    }

    pub fn phone_for(&self, state: State) -> &str {
        match state {
            State::Nevada => &self.coverage_notes.phone_nevada,
            State::Utah => &self.coverage_notes.phone_utah,
        }
    }
}
