//! Patient desk: record list, view, append-only updates, deactivation.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{info, warn};

use medrec_chain::RecordRegistry;
use medrec_core::{validate, Address, ChainRecord, InFlightGuard, RecordManifest};
use medrec_pinning::PinStore;

use crate::error::PortalError;
use crate::view::{fetch_manifest, RecordView};

pub struct PatientDesk<R, P> {
    account: Address,
    registry: R,
    pins: P,
    guard: InFlightGuard,
}

impl<R: RecordRegistry, P: PinStore> PatientDesk<R, P> {
    pub fn new(account: Address, registry: R, pins: P) -> Self {
        PatientDesk {
            account,
            registry,
            pins,
            guard: InFlightGuard::new(),
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// All of the patient's records, newest first. A record that fails
    /// the existence check or the load is skipped, not fatal.
    pub async fn my_records(&self) -> Result<Vec<ChainRecord>, PortalError> {
        let ids = self.registry.patient_records(self.account).await?;
        let mut records = Vec::with_capacity(ids.len());
        for &id in &ids {
            match self.registry.record_exists(id).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(record = id, "skipping record the contract no longer reports");
                    continue;
                }
                Err(err) => {
                    warn!(record = id, error = %err, "existence check failed, skipping record");
                    continue;
                }
            }
            match self.registry.record(id).await {
                Ok(record) => records.push(record),
                Err(err) => warn!(record = id, error = %err, "skipping record that failed to load"),
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub async fn view_record(&self, id: u64) -> Result<RecordView, PortalError> {
        let record = self.registry.record(id).await?;
        let manifest = fetch_manifest(&self.pins, &record.cid).await;
        Ok(RecordView { record, manifest })
    }

    /// Merge patient-supplied fields into the manifest as one new
    /// `patientUpdates` entry, pin the merged copy, and repoint the
    /// record. The doctor-authored fields are never overwritten; the
    /// payload keeps the full history. Returns the new content
    /// identifier.
    pub async fn submit_update(
        &self,
        id: u64,
        fields: BTreeMap<String, String>,
    ) -> Result<String, PortalError> {
        let _token = self.guard.begin()?;
        // Local guard before any network call.
        validate::patient_update_fields(&fields)?;

        let record = self.registry.record(id).await?;
        if !record.status.can_update() {
            return Err(PortalError::UpdateOnInactive(id));
        }

        let current = self.pins.fetch_json(record.cid.clone()).await?;
        let mut manifest: RecordManifest = serde_json::from_value(current)?;
        manifest.apply_patient_update(fields, Utc::now().timestamp())?;

        let new_cid = self.pins.pin_json(serde_json::to_value(&manifest)?).await?;
        self.registry
            .update_record(self.account, id, new_cid.clone())
            .await?;
        info!(record = id, cid = %new_cid, "patient update merged");
        Ok(new_cid)
    }

    /// One-way Active -> Inactive. Asking again is rejected here as a
    /// no-op, whether or not the contract would also guard it.
    pub async fn deactivate(&self, id: u64) -> Result<(), PortalError> {
        let _token = self.guard.begin()?;
        let record = self.registry.record(id).await?;
        if !record.status.can_deactivate() {
            return Err(PortalError::AlreadyInactive(id));
        }
        self.registry.deactivate_record(self.account, id).await?;
        info!(record = id, "record deactivated");
        Ok(())
    }
}
