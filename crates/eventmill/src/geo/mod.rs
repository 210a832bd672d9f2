//! Postcode reference data.
//!
//! The normalizer backfills borough and neighbourhood from an optional
//! postcode table. When no table is configured the pipeline runs with
//! [`NoGeo`] and simply never backfills.

use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoPlace {
    pub borough: String,
    pub neighbourhood: String,
}

pub trait GeoLookup: Send + Sync {
    /// Resolves a postcode to its place names. Lookups are insensitive to
    /// case and internal whitespace; a miss means the postcode is unknown.
    fn lookup(&self, postcode: &str) -> Option<GeoPlace>;
}

/// No reference data configured; every lookup misses.
pub struct NoGeo;

impl GeoLookup for NoGeo {
    fn lookup(&self, _postcode: &str) -> Option<GeoPlace> {
        None
    }
}

/// In-memory table loaded from a `postcode,lat,lon,borough,neighbourhood`
/// CSV. Coordinates are present in the source data but unused here.
pub struct PostcodeTable {
    places: HashMap<String, GeoPlace>,
}

impl PostcodeTable {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::ReadPostcodeData {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let table = Self::parse(&raw);
        info!(
            "Loaded {} postcodes from {}",
            table.places.len(),
            path.display()
        );
        Ok(table)
    }

    fn parse(raw: &str) -> Self {
        let mut places = HashMap::new();
        for line in raw.lines().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let columns: Vec<&str> = line.split(',').collect();
            if columns.len() < 5 {
                debug!("Skipping malformed postcode row: {line}");
                continue;
            }
            let postcode = normalize_postcode(columns[0]);
            if postcode.is_empty() {
                continue;
            }
            places.insert(
                postcode,
                GeoPlace {
                    borough: columns[3].trim().to_string(),
                    neighbourhood: columns[4].trim().to_string(),
                },
            );
        }
        Self { places }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl GeoLookup for PostcodeTable {
    fn lookup(&self, postcode: &str) -> Option<GeoPlace> {
        let key = normalize_postcode(postcode);
        if key.is_empty() {
            return None;
        }
        self.places.get(&key).cloned()
    }
}

fn normalize_postcode(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}
