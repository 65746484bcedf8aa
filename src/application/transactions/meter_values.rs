//! Conversion of station meter values into the stored representation
//!
//! 1.6 reports carry the reading as a string and the unit as a bare enum
//! name; 2.0.1 reports carry a number and a `unitOfMeasure` object with a
//! power-of-ten multiplier.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{MeterValue, SampledValue, UnitOfMeasure};

const ENERGY_REGISTER: &str = "Energy.Active.Import.Register";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeterValueV16 {
    timestamp: String,
    #[serde(default)]
    sampled_value: Vec<SampledValueV16>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampledValueV16 {
    value: String,
    context: Option<String>,
    measurand: Option<String>,
    phase: Option<String>,
    location: Option<String>,
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeterValueV201 {
    timestamp: String,
    #[serde(default)]
    sampled_value: Vec<SampledValueV201>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampledValueV201 {
    value: f64,
    context: Option<String>,
    measurand: Option<String>,
    phase: Option<String>,
    location: Option<String>,
    unit_of_measure: Option<UnitOfMeasureV201>,
}

#[derive(Debug, Deserialize)]
struct UnitOfMeasureV201 {
    unit: Option<String>,
    multiplier: Option<i32>,
}

/// Convert a 1.6 `meterValue` / `transactionData` array. Samples whose
/// reading is not numeric are dropped.
pub fn from_v16(meter_values: Option<&Value>) -> Result<Vec<MeterValue>, serde_json::Error> {
    let Some(raw) = meter_values else {
        return Ok(Vec::new());
    };
    let parsed: Vec<MeterValueV16> = serde_json::from_value(raw.clone())?;
    Ok(parsed
        .into_iter()
        .map(|mv| MeterValue {
            timestamp: mv.timestamp,
            sampled_values: mv
                .sampled_value
                .into_iter()
                .filter_map(|sv| {
                    let value = sv.value.trim().parse::<f32>().ok()?;
                    Some(SampledValue {
                        context: sv.context,
                        location: sv.location,
                        measurand: sv.measurand,
                        phase: sv.phase,
                        unit_of_measure: sv.unit.map(|unit| UnitOfMeasure { unit, multiplier: 0 }),
                        value,
                    })
                })
                .collect(),
        })
        .collect())
}

/// Convert a 2.0.1 `meterValue` array.
pub fn from_v201(meter_values: Option<&Value>) -> Result<Vec<MeterValue>, serde_json::Error> {
    let Some(raw) = meter_values else {
        return Ok(Vec::new());
    };
    let parsed: Vec<MeterValueV201> = serde_json::from_value(raw.clone())?;
    Ok(parsed
        .into_iter()
        .map(|mv| MeterValue {
            timestamp: mv.timestamp,
            sampled_values: mv
                .sampled_value
                .into_iter()
                .map(|sv| SampledValue {
                    context: sv.context,
                    location: sv.location,
                    measurand: sv.measurand,
                    phase: sv.phase,
                    unit_of_measure: sv.unit_of_measure.map(|u| UnitOfMeasure {
                        unit: u.unit.unwrap_or_else(|| "Wh".to_string()),
                        multiplier: u.multiplier.unwrap_or(0),
                    }),
                    value: sv.value as f32,
                })
                .collect(),
        })
        .collect())
}

/// The energy register reading in Wh: the first sample measuring
/// `Energy.Active.Import.Register` (the default measurand when absent).
pub fn energy_register_wh(meter_values: &[MeterValue]) -> Option<f32> {
    meter_values
        .iter()
        .flat_map(|mv| mv.sampled_values.iter())
        .find(|sv| sv.measurand.as_deref().map_or(true, |m| m == ENERGY_REGISTER))
        .map(|sv| {
            let (unit, multiplier) = sv
                .unit_of_measure
                .as_ref()
                .map_or(("Wh", 0), |u| (u.unit.as_str(), u.multiplier));
            let scale = if unit.eq_ignore_ascii_case("kWh") { 1000.0 } else { 1.0 };
            sv.value * scale * 10f32.powi(multiplier)
        })
}
