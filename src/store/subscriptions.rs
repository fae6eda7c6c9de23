use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::StoreError;
use super::snapshot::Snapshot;
use crate::types::push::{DeliveryOutcome, Subscription, SubscriptionKeys};

#[derive(Default, Serialize, Deserialize)]
struct SubscriptionFile {
    #[serde(default)]
    subscriptions: Vec<Subscription>,
}

#[derive(Default)]
pub struct SubscriptionStore {
    records: Mutex<BTreeMap<String, Subscription>>,
    snapshot: Option<Snapshot>,
}

impl SubscriptionStore {
    pub(super) fn open(path: PathBuf) -> Result<Self, StoreError> {
        let snapshot = Snapshot::new(path, "subscriptions");
        let file: SubscriptionFile = snapshot.load()?;
        let records = file
            .subscriptions
            .into_iter()
            .map(|subscription| (subscription.endpoint.clone(), subscription))
            .collect();
        Ok(Self {
            records: Mutex::new(records),
            snapshot: Some(snapshot),
        })
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("subscriptions lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates the subscription or renews the existing record for the same
    /// endpoint. Either way the result is active.
    pub fn upsert_by_endpoint(
        &self,
        endpoint: &str,
        keys: SubscriptionKeys,
        user_agent: Option<String>,
        now: OffsetDateTime,
    ) -> Result<Subscription, StoreError> {
        let mut records = self.records.lock().expect("subscriptions lock");
        let mut staged = records.clone();
        let subscription = staged
            .entry(endpoint.to_string())
            .and_modify(|existing| {
                existing.keys = keys.clone();
                existing.active = true;
                existing.last_used = now;
                if user_agent.is_some() {
                    existing.user_agent = user_agent.clone();
                }
            })
            .or_insert_with(|| Subscription {
                endpoint: endpoint.to_string(),
                keys: keys.clone(),
                active: true,
                user_agent: user_agent.clone(),
                created_at: now,
                last_used: now,
            })
            .clone();
        self.commit(&mut records, staged)?;
        Ok(subscription)
    }

    /// Returns false when no record exists for `endpoint`.
    pub fn deactivate(&self, endpoint: &str) -> Result<bool, StoreError> {
        let mut records = self.records.lock().expect("subscriptions lock");
        let mut staged = records.clone();
        let Some(subscription) = staged.get_mut(endpoint) else {
            return Ok(false);
        };
        subscription.active = false;
        self.commit(&mut records, staged)?;
        Ok(true)
    }

    /// Deactivates every stored subscription and returns how many were
    /// active. Only reachable through an explicit administrative command.
    pub fn deactivate_all(&self) -> Result<usize, StoreError> {
        let mut records = self.records.lock().expect("subscriptions lock");
        let mut staged = records.clone();
        let mut flipped = 0;
        for subscription in staged.values_mut().filter(|s| s.active) {
            subscription.active = false;
            flipped += 1;
        }
        if flipped > 0 {
            self.commit(&mut records, staged)?;
        }
        Ok(flipped)
    }

    pub fn find_active(&self) -> Vec<Subscription> {
        let records = self.records.lock().expect("subscriptions lock");
        records.values().filter(|s| s.active).cloned().collect()
    }

    /// Applies the result of one settled delivery attempt. Returns false when
    /// the endpoint vanished from the store in the meantime.
    pub fn record_delivery(
        &self,
        endpoint: &str,
        at: OffsetDateTime,
        outcome: DeliveryOutcome,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.lock().expect("subscriptions lock");
        let mut staged = records.clone();
        let Some(subscription) = staged.get_mut(endpoint) else {
            return Ok(false);
        };
        subscription.last_used = at;
        if outcome == DeliveryOutcome::Gone {
            subscription.active = false;
        }
        self.commit(&mut records, staged)?;
        Ok(true)
    }

    pub fn get(&self, endpoint: &str) -> Option<Subscription> {
        let records = self.records.lock().expect("subscriptions lock");
        records.get(endpoint).cloned()
    }

    pub fn list(&self) -> Vec<Subscription> {
        let records = self.records.lock().expect("subscriptions lock");
        records.values().cloned().collect()
    }

    /// Replaces the live records with `staged` once the snapshot is written.
    fn commit(
        &self,
        records: &mut BTreeMap<String, Subscription>,
        staged: BTreeMap<String, Subscription>,
    ) -> Result<(), StoreError> {
        self.persist(&staged)?;
        *records = staged;
        Ok(())
    }

    fn persist(&self, records: &BTreeMap<String, Subscription>) -> Result<(), StoreError> {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Ok(());
        };
        let file = SubscriptionFile {
            subscriptions: records.values().cloned().collect(),
        };
        snapshot.save(&file)
    }
}
