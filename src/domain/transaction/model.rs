//! Transaction domain entity

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOfMeasure {
    pub unit: String,
    pub multiplier: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measure: Option<UnitOfMeasure>,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterValue {
    /// RFC 3339 timestamp as reported by the station.
    pub timestamp: String,
    pub sampled_values: Vec<SampledValue>,
}

impl MeterValue {
    /// The opening sample persisted for every started transaction.
    pub fn transaction_begin(timestamp: String, meter_start_wh: f32) -> Self {
        Self::register_reading("Transaction.Begin", timestamp, meter_start_wh)
    }

    /// Closing sample for stations that only report a final meter reading.
    pub fn transaction_end(timestamp: String, meter_stop_wh: f32) -> Self {
        Self::register_reading("Transaction.End", timestamp, meter_stop_wh)
    }

    fn register_reading(context: &str, timestamp: String, value_wh: f32) -> Self {
        Self {
            timestamp,
            sampled_values: vec![SampledValue {
                context: Some(context.to_string()),
                location: None,
                measurand: Some("MeterValue".to_string()),
                phase: None,
                unit_of_measure: Some(UnitOfMeasure {
                    unit: "Wh".to_string(),
                    multiplier: 1,
                }),
                value: value_wh,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub charge_station_id: String,
    pub transaction_id: String,
    pub id_token: String,
    pub token_type: String,
    pub meter_values: Vec<MeterValue>,
    pub start_seq_no: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_seq_no: Option<i64>,
    pub updated_seq_no_count: u32,
    /// Sequence numbers of the update reports applied so far
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub update_seq_nos: BTreeSet<i64>,
    pub offline: bool,
}

impl Transaction {
    pub fn new(charge_station_id: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            charge_station_id: charge_station_id.into(),
            transaction_id: transaction_id.into(),
            id_token: String::new(),
            token_type: String::new(),
            meter_values: Vec::new(),
            start_seq_no: 0,
            ended_seq_no: None,
            updated_seq_no_count: 0,
            update_seq_nos: BTreeSet::new(),
            offline: false,
        }
    }

    /// Meter values are kept in arrival order, never merged or dropped.
    pub fn append_meter_values(&mut self, meter_values: Vec<MeterValue>) {
        self.meter_values.extend(meter_values);
    }

    /// Apply one update report. A report whose `seq_no` was already applied
    /// is a retransmission and changes nothing; reports without a sequence
    /// number (OCPP 1.6) are always applied. Returns whether it was applied.
    pub fn apply_update(&mut self, seq_no: Option<i64>, meter_values: Vec<MeterValue>) -> bool {
        if let Some(seq_no) = seq_no {
            if !self.update_seq_nos.insert(seq_no) {
                return false;
            }
        }
        self.append_meter_values(meter_values);
        self.updated_seq_no_count += 1;
        true
    }

    pub fn is_ended(&self) -> bool {
        self.ended_seq_no.is_some()
    }
}

/// What a station reported in a start or end event.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionReport {
    pub id_token: String,
    pub token_type: String,
    pub meter_values: Vec<MeterValue>,
    pub seq_no: i64,
    pub offline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_sample_carries_meter_start() {
        let mv = MeterValue::transaction_begin("2024-01-01T00:00:00Z".into(), 1200.0);
        let sv = &mv.sampled_values[0];
        assert_eq!(sv.context.as_deref(), Some("Transaction.Begin"));
        assert_eq!(sv.measurand.as_deref(), Some("MeterValue"));
        assert_eq!(
            sv.unit_of_measure,
            Some(UnitOfMeasure {
                unit: "Wh".into(),
                multiplier: 1
            })
        );
        assert_eq!(sv.value, 1200.0);
    }

    #[test]
    fn equal_samples_are_all_kept_in_order() {
        let mut tx = Transaction::new("CS01", "tx-1");
        let a = MeterValue::transaction_begin("2024-01-01T00:00:00Z".into(), 0.0);
        let b = MeterValue::transaction_begin("2024-01-01T00:05:00Z".into(), 50.0);
        tx.append_meter_values(vec![a.clone()]);
        tx.append_meter_values(vec![a.clone(), b.clone()]);
        assert_eq!(tx.meter_values, vec![a.clone(), a, b]);
    }

    #[test]
    fn update_with_seen_seq_no_is_ignored() {
        let mut tx = Transaction::new("CS01", "tx-1");
        let mv = MeterValue::transaction_begin("2024-01-01T00:05:00Z".into(), 50.0);
        assert!(tx.apply_update(Some(1), vec![mv.clone()]));
        assert!(!tx.apply_update(Some(1), vec![mv.clone()]));
        assert!(tx.apply_update(Some(2), vec![mv.clone()]));
        assert_eq!(tx.updated_seq_no_count, 2);
        assert_eq!(tx.meter_values.len(), 2);
    }

    #[test]
    fn updates_without_seq_no_always_apply() {
        let mut tx = Transaction::new("CS01", "tx-1");
        let mv = MeterValue::transaction_begin("2024-01-01T00:05:00Z".into(), 50.0);
        tx.apply_update(None, vec![mv.clone()]);
        tx.apply_update(None, vec![mv]);
        assert_eq!(tx.updated_seq_no_count, 2);
        assert_eq!(tx.meter_values.len(), 2);
    }
}
