//! EVSE id resolution
//!
//! Splits an externally addressed EVSE id such as `DE*GCE*E00188*001` into
//! country code, operator id and charge station id using one configured
//! pattern. Capture groups 1..=3 are mandatory; group 4, when the pattern
//! declares it, holds the connector suffix.

use regex::Regex;

use crate::shared::errors::{BridgeError, BridgeResult};

pub const DEFAULT_EVSE_ID_PATTERN: &str = r"^([A-Z]{2})\*([A-Z0-9]{3})\*E([0-9]+)\*?(.*)$";

/// The parts of a resolved EVSE id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvseId {
    pub country_code: String,
    pub operator_id: String,
    pub charge_station_id: String,
    pub connector_suffix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EvseResolver {
    pattern: Regex,
}

impl EvseResolver {
    pub fn new(pattern: &str) -> BridgeResult<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| BridgeError::Config(format!("invalid EVSE id pattern: {e}")))?;
        // captures_len counts the implicit whole-match group
        if pattern.captures_len() < 4 {
            return Err(BridgeError::Config(format!(
                "EVSE id pattern needs at least 3 capture groups, has {}",
                pattern.captures_len() - 1
            )));
        }
        Ok(Self { pattern })
    }

    pub fn resolve(&self, evse_id: &str) -> BridgeResult<EvseId> {
        let caps = self
            .pattern
            .captures(evse_id)
            .filter(|c| c.len() >= 4)
            .ok_or_else(|| BridgeError::MalformedEvseId(evse_id.to_string()))?;

        let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
        match (group(1), group(2), group(3)) {
            (Some(country_code), Some(operator_id), Some(charge_station_id)) => Ok(EvseId {
                country_code,
                operator_id,
                charge_station_id,
                connector_suffix: group(4).filter(|s| !s.is_empty()),
            }),
            _ => Err(BridgeError::MalformedEvseId(evse_id.to_string())),
        }
    }

    pub fn country_code(&self, evse_id: &str) -> BridgeResult<String> {
        self.resolve(evse_id).map(|e| e.country_code)
    }

    pub fn operator_id(&self, evse_id: &str) -> BridgeResult<String> {
        self.resolve(evse_id).map(|e| e.operator_id)
    }

    pub fn charge_station_id(&self, evse_id: &str) -> BridgeResult<String> {
        self.resolve(evse_id).map(|e| e.charge_station_id)
    }

    pub fn connector_suffix(&self, evse_id: &str) -> BridgeResult<Option<String>> {
        self.resolve(evse_id).map(|e| e.connector_suffix)
    }
}
