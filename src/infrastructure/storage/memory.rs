//! In-memory store
//!
//! Every collaborator store backed by `DashMap`. Transaction writes go
//! through `entry`, which holds the shard lock for that key only, so
//! concurrent reports for the same transaction serialize while other
//! transactions proceed. A second map indexes transaction ids to the
//! stations using them, so lookups by id alone do not scan.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::registration::model::party_key;
use crate::domain::{
    ChargeStationRuntimeStore, MeterValue, OcpiParty, PartyRole, PartyStore, RegistrationStore,
    RoamingCredential, RuntimeDetails, StoreProvider, Token, TokenPatch, TokenStore,
    Transaction, TransactionReport, TransactionStore,
};
use crate::shared::errors::StoreResult;

type TransactionKey = (String, String);

fn key(charge_station_id: &str, transaction_id: &str) -> TransactionKey {
    (charge_station_id.to_string(), transaction_id.to_string())
}

/// In-memory storage for development and testing
#[derive(Default)]
pub struct InMemoryStore {
    tokens: DashMap<String, Token>,
    runtime: DashMap<String, RuntimeDetails>,
    transactions: DashMap<TransactionKey, Transaction>,
    stations_by_transaction: DashMap<String, BTreeSet<String>>,
    registrations: DashMap<String, RoamingCredential>,
    parties: DashMap<String, OcpiParty>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called after the transaction entry is released; the two maps are
    /// never locked together.
    fn index_transaction(&self, charge_station_id: &str, transaction_id: &str) {
        let known = self
            .stations_by_transaction
            .get(transaction_id)
            .is_some_and(|stations| stations.contains(charge_station_id));
        if !known {
            self.stations_by_transaction
                .entry(transaction_id.to_string())
                .or_default()
                .insert(charge_station_id.to_string());
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryStore {
    async fn set_token(&self, mut token: Token) -> StoreResult<()> {
        token.last_updated = Utc::now();
        self.tokens.insert(token.uid.clone(), token);
        Ok(())
    }

    async fn lookup_token(&self, uid: &str) -> StoreResult<Option<Token>> {
        Ok(self.tokens.get(uid).map(|t| t.clone()))
    }

    async fn patch_token(
        &self,
        country_code: &str,
        party_id: &str,
        uid: &str,
        patch: TokenPatch,
    ) -> StoreResult<Option<Token>> {
        let Some(mut token) = self.tokens.get_mut(uid) else {
            return Ok(None);
        };
        if !token.is_owned_by(country_code, party_id) {
            return Ok(None);
        }
        token.apply(patch);
        Ok(Some(token.value().clone()))
    }
}

#[async_trait]
impl ChargeStationRuntimeStore for InMemoryStore {
    async fn set_runtime_details(
        &self,
        charge_station_id: &str,
        details: RuntimeDetails,
    ) -> StoreResult<()> {
        self.runtime.insert(charge_station_id.to_string(), details);
        Ok(())
    }

    async fn lookup_runtime_details(
        &self,
        charge_station_id: &str,
    ) -> StoreResult<Option<RuntimeDetails>> {
        Ok(self.runtime.get(charge_station_id).map(|d| d.clone()))
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn create_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        report: TransactionReport,
    ) -> StoreResult<()> {
        let mut tx = self
            .transactions
            .entry(key(charge_station_id, transaction_id))
            .or_insert_with(|| Transaction::new(charge_station_id, transaction_id));
        tx.append_meter_values(report.meter_values);
        tx.id_token = report.id_token;
        tx.token_type = report.token_type;
        tx.start_seq_no = report.seq_no;
        tx.offline = report.offline;
        drop(tx);
        self.index_transaction(charge_station_id, transaction_id);
        Ok(())
    }

    async fn update_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        seq_no: Option<i64>,
        meter_values: Vec<MeterValue>,
    ) -> StoreResult<bool> {
        let mut tx = self
            .transactions
            .entry(key(charge_station_id, transaction_id))
            .or_insert_with(|| Transaction::new(charge_station_id, transaction_id));
        let applied = tx.apply_update(seq_no, meter_values);
        drop(tx);
        self.index_transaction(charge_station_id, transaction_id);
        Ok(applied)
    }

    async fn end_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
        report: TransactionReport,
    ) -> StoreResult<()> {
        let mut tx = self
            .transactions
            .entry(key(charge_station_id, transaction_id))
            .or_insert_with(|| Transaction::new(charge_station_id, transaction_id));
        tx.append_meter_values(report.meter_values);
        if tx.id_token.is_empty() {
            tx.id_token = report.id_token;
            tx.token_type = report.token_type;
        }
        tx.ended_seq_no = Some(report.seq_no);
        tx.offline = tx.offline || report.offline;
        drop(tx);
        self.index_transaction(charge_station_id, transaction_id);
        Ok(())
    }

    async fn lookup_transaction(
        &self,
        charge_station_id: &str,
        transaction_id: &str,
    ) -> StoreResult<Option<Transaction>> {
        Ok(self
            .transactions
            .get(&key(charge_station_id, transaction_id))
            .map(|t| t.clone()))
    }

    async fn find_transaction(&self, transaction_id: &str) -> StoreResult<Option<Transaction>> {
        let Some(charge_station_id) = self
            .stations_by_transaction
            .get(transaction_id)
            .and_then(|stations| stations.first().cloned())
        else {
            return Ok(None);
        };
        Ok(self
            .transactions
            .get(&key(&charge_station_id, transaction_id))
            .map(|t| t.clone()))
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn set_registration_details(&self, credential: RoamingCredential) -> StoreResult<()> {
        self.registrations
            .insert(credential.token.clone(), credential);
        Ok(())
    }

    async fn get_registration_details(
        &self,
        token: &str,
    ) -> StoreResult<Option<RoamingCredential>> {
        Ok(self.registrations.get(token).map(|r| r.clone()))
    }
}

#[async_trait]
impl PartyStore for InMemoryStore {
    async fn set_party_details(&self, party: OcpiParty) -> StoreResult<()> {
        self.parties.insert(party.key(), party);
        Ok(())
    }

    async fn get_party_details(
        &self,
        role: PartyRole,
        country_code: &str,
        party_id: &str,
    ) -> StoreResult<Option<OcpiParty>> {
        Ok(self
            .parties
            .get(&party_key(role, country_code, party_id))
            .map(|p| p.clone()))
    }
}

impl StoreProvider for InMemoryStore {
    fn tokens(&self) -> &dyn TokenStore {
        self
    }
    fn runtime(&self) -> &dyn ChargeStationRuntimeStore {
        self
    }
    fn transactions(&self) -> &dyn TransactionStore {
        self
    }
    fn registrations(&self) -> &dyn RegistrationStore {
        self
    }
    fn parties(&self) -> &dyn PartyStore {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegistrationStatus;
    use std::sync::Arc;

    fn report(seq_no: i64, meter_values: Vec<MeterValue>) -> TransactionReport {
        TransactionReport {
            id_token: "DEADBEEF".into(),
            token_type: "ISO14443".into(),
            meter_values,
            seq_no,
            offline: false,
        }
    }

    fn sample(ts: &str, value: f32) -> MeterValue {
        MeterValue::transaction_begin(ts.into(), value)
    }

    fn token(uid: &str) -> Token {
        serde_json::from_value(serde_json::json!({
            "country_code": "NL", "party_id": "EXA", "uid": uid,
            "type": "RFID", "contract_id": "C", "issuer": "I",
            "valid": true, "whitelist": "ALWAYS",
            "last_updated": "2024-01-01T00:00:00Z"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_update_end_lifecycle() {
        let store = InMemoryStore::new();
        store
            .create_transaction("CS01", "tx-1", report(0, vec![sample("t0", 100.0)]))
            .await
            .unwrap();
        store
            .update_transaction("CS01", "tx-1", Some(1), vec![sample("t1", 150.0)])
            .await
            .unwrap();
        store
            .end_transaction("CS01", "tx-1", report(4, vec![sample("t2", 300.0)]))
            .await
            .unwrap();

        let tx = store
            .lookup_transaction("CS01", "tx-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.meter_values.len(), 3);
        assert_eq!(tx.meter_values[0].sampled_values[0].value, 100.0);
        assert_eq!(tx.updated_seq_no_count, 1);
        assert_eq!(tx.ended_seq_no, Some(4));
        assert_eq!(tx.id_token, "DEADBEEF");
    }

    #[tokio::test]
    async fn update_without_start_creates_record() {
        let store = InMemoryStore::new();
        store
            .update_transaction("CS01", "late", None, vec![sample("t1", 1.0)])
            .await
            .unwrap();
        let tx = store.find_transaction("late").await.unwrap().unwrap();
        assert_eq!(tx.charge_station_id, "CS01");
        assert_eq!(tx.updated_seq_no_count, 1);
    }

    #[tokio::test]
    async fn starts_sharing_a_key_keep_every_begin_sample() {
        let store = InMemoryStore::new();
        store
            .create_transaction("CS01", "tx-1", report(0, vec![sample("t0", 0.0)]))
            .await
            .unwrap();
        store
            .create_transaction("CS01", "tx-1", report(0, vec![sample("t0", 0.0)]))
            .await
            .unwrap();
        let tx = store
            .lookup_transaction("CS01", "tx-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.meter_values.len(), 2);
    }

    #[tokio::test]
    async fn count_matches_samples_for_repeated_updates() {
        let store = InMemoryStore::new();
        let mv = sample("t1", 10.0);
        for _ in 0..2 {
            assert!(store
                .update_transaction("cs", "tx", None, vec![mv.clone()])
                .await
                .unwrap());
        }
        let tx = store.lookup_transaction("cs", "tx").await.unwrap().unwrap();
        assert_eq!(tx.updated_seq_no_count, 2);
        assert_eq!(tx.meter_values.len(), 2);
    }

    #[tokio::test]
    async fn retransmitted_update_is_applied_once() {
        let store = InMemoryStore::new();
        let mv = sample("t1", 10.0);
        assert!(store
            .update_transaction("cs", "tx", Some(3), vec![mv.clone()])
            .await
            .unwrap());
        assert!(!store
            .update_transaction("cs", "tx", Some(3), vec![mv])
            .await
            .unwrap());
        let tx = store.lookup_transaction("cs", "tx").await.unwrap().unwrap();
        assert_eq!(tx.updated_seq_no_count, 1);
        assert_eq!(tx.meter_values.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_updates_on_one_key_serialize() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update_transaction("CS01", "tx-1", Some(i), vec![sample("t", 1.0)])
                    .await
            }));
        }
        for h in handles {
            assert!(h.await.unwrap().unwrap());
        }
        let tx = store
            .lookup_transaction("CS01", "tx-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.updated_seq_no_count, 64);
        assert_eq!(tx.meter_values.len(), 64);
    }

    #[tokio::test]
    async fn same_transaction_id_on_two_stations_is_two_records() {
        let store = InMemoryStore::new();
        store
            .create_transaction("CS01", "1", report(0, vec![sample("t0", 1.0)]))
            .await
            .unwrap();
        store
            .create_transaction("CS02", "1", report(0, vec![sample("t0", 2.0)]))
            .await
            .unwrap();
        let cs01 = store.lookup_transaction("CS01", "1").await.unwrap().unwrap();
        let cs02 = store.lookup_transaction("CS02", "1").await.unwrap().unwrap();
        assert_eq!(cs01.meter_values.len(), 1);
        assert_eq!(cs02.meter_values[0].sampled_values[0].value, 2.0);
        assert!(store.lookup_transaction("CS03", "1").await.unwrap().is_none());
        let found = store.find_transaction("1").await.unwrap().unwrap();
        assert_eq!(found.charge_station_id, "CS01");
        assert!(store.find_transaction("2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_token_stamps_last_updated() {
        let store = InMemoryStore::new();
        let stale = token("A");
        let before = stale.last_updated;
        store.set_token(stale).await.unwrap();
        let stored = store.lookup_token("A").await.unwrap().unwrap();
        assert!(stored.last_updated > before);
    }

    #[tokio::test]
    async fn patch_token_requires_owner() {
        let store = InMemoryStore::new();
        store.set_token(token("A")).await.unwrap();
        let patch = TokenPatch {
            valid: Some(false),
            ..TokenPatch::default()
        };
        assert!(store
            .patch_token("DE", "TNM", "A", patch.clone())
            .await
            .unwrap()
            .is_none());
        assert!(store
            .patch_token("NL", "EXA", "missing", patch.clone())
            .await
            .unwrap()
            .is_none());
        let patched = store
            .patch_token("nl", "exa", "A", patch)
            .await
            .unwrap()
            .unwrap();
        assert!(!patched.valid);
    }

    #[tokio::test]
    async fn concurrent_patches_keep_every_field() {
        let store = Arc::new(InMemoryStore::new());
        store.set_token(token("A")).await.unwrap();
        let patches = [
            TokenPatch {
                valid: Some(false),
                ..TokenPatch::default()
            },
            TokenPatch {
                issuer: Some("New issuer".into()),
                ..TokenPatch::default()
            },
            TokenPatch {
                contract_id: Some("NLEXAC00042".into()),
                ..TokenPatch::default()
            },
        ];
        let handles: Vec<_> = patches
            .into_iter()
            .map(|patch| {
                let store = store.clone();
                tokio::spawn(async move { store.patch_token("NL", "EXA", "A", patch).await })
            })
            .collect();
        for h in handles {
            assert!(h.await.unwrap().unwrap().is_some());
        }
        let token = store.lookup_token("A").await.unwrap().unwrap();
        assert!(!token.valid);
        assert_eq!(token.issuer, "New issuer");
        assert_eq!(token.contract_id, "NLEXAC00042");
    }

    #[tokio::test]
    async fn registrations_and_parties() {
        let store = InMemoryStore::new();
        store
            .set_registration_details(RoamingCredential {
                token: "abc".into(),
                status: RegistrationStatus::Registered,
                country_code: "NL".into(),
                party_id: "EXA".into(),
            })
            .await
            .unwrap();
        assert!(store.get_registration_details("abc").await.unwrap().is_some());
        assert!(store.get_registration_details("xyz").await.unwrap().is_none());

        store
            .set_party_details(OcpiParty {
                role: PartyRole::Emsp,
                country_code: "NL".into(),
                party_id: "EXA".into(),
                url: "https://emsp.example.com/ocpi/versions".into(),
                token: "outbound".into(),
            })
            .await
            .unwrap();
        let party = store
            .get_party_details(PartyRole::Emsp, "nl", "exa")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(party.token, "outbound");
    }
}
