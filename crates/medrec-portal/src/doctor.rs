//! Doctor desk: record creation and the doctor's own record list.
//!
//! Creation is a strict sequence: local guards, attachment uploads,
//! manifest assembly, manifest pin, then the single atomic contract
//! call. A failure anywhere aborts the whole sequence; no partial
//! on-chain write can occur because the chain call is last.

use chrono::Utc;
use tracing::{info, warn};

use medrec_chain::RecordRegistry;
use medrec_core::{Address, AttachmentRef, ChainRecord, InFlightGuard, RecordManifest};
use medrec_pinning::PinStore;

use crate::cache::RecordCache;
use crate::error::PortalError;
use crate::view::{fetch_manifest, load_records, RecordView};

/// Form input for a new record.
#[derive(Clone, Debug)]
pub struct NewRecord {
    pub patient: Address,
    pub patient_name: String,
    pub diagnosis: String,
    pub treatment: String,
    pub notes: String,
    /// Visit date (YYYY-MM-DD).
    pub visit_date: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Clone, Debug)]
pub struct Attachment {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct CreatedRecord {
    pub record_id: u64,
    pub manifest_cid: String,
    /// False when the id had to be derived from the record counter
    /// because the RecordCreated event was not decodable.
    pub from_event: bool,
}

pub struct DoctorDesk<R, P> {
    account: Address,
    registry: R,
    pins: P,
    cache: RecordCache,
    guard: InFlightGuard,
}

impl<R: RecordRegistry, P: PinStore> DoctorDesk<R, P> {
    pub fn new(account: Address, registry: R, pins: P, cache: RecordCache) -> Self {
        DoctorDesk {
            account,
            registry,
            pins,
            cache,
            guard: InFlightGuard::new(),
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// Whether the connected account is currently in the authorized set.
    pub async fn authorization(&self) -> Result<bool, PortalError> {
        Ok(self.registry.is_authorized_doctor(self.account).await?)
    }

    /// Create a record for `input.patient`. Attachments are pinned in
    /// submission order and referenced from the manifest; the manifest
    /// pin yields the content identifier the contract stores.
    pub async fn create_record(&self, input: NewRecord) -> Result<CreatedRecord, PortalError> {
        let _token = self.guard.begin()?;

        if !self.registry.is_authorized_doctor(self.account).await? {
            return Err(PortalError::UnauthorizedCaller(self.account));
        }

        let mut manifest = RecordManifest {
            patient_name: input.patient_name,
            diagnosis: input.diagnosis,
            treatment: input.treatment,
            notes: input.notes,
            visit_date: input.visit_date,
            doctor: self.account,
            patient: input.patient,
            created_at: Utc::now().timestamp(),
            attachments: Vec::with_capacity(input.attachments.len()),
            patient_updates: Vec::new(),
            extra: serde_json::Map::new(),
        };
        manifest.validate()?;

        for attachment in input.attachments {
            let cid = self
                .pins
                .pin_file(attachment.name.clone(), attachment.bytes)
                .await?;
            manifest.attachments.push(AttachmentRef {
                name: attachment.name,
                cid,
            });
        }

        let manifest_cid = self.pins.pin_json(serde_json::to_value(&manifest)?).await?;

        let event_id = self
            .registry
            .create_record(self.account, input.patient, manifest_cid.clone())
            .await?;
        let (record_id, from_event) = match event_id {
            Some(id) => (id, true),
            // Fallback: the counter equals the newest id. Racy under
            // concurrent creators; known weak point, not fixed.
            None => (self.registry.record_count().await?, false),
        };

        self.cache.remember(self.account, record_id);
        info!(record_id, cid = %manifest_cid, patient = %input.patient, "record created");
        Ok(CreatedRecord {
            record_id,
            manifest_cid,
            from_event,
        })
    }

    /// The doctor's records. The contract query is the source of truth;
    /// the local cache only steps in when that query fails.
    pub async fn my_records(&self) -> Result<Vec<ChainRecord>, PortalError> {
        let ids = match self.registry.doctor_records(self.account).await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "doctor record query failed, falling back to local cache");
                self.cache.load(self.account)
            }
        };
        Ok(load_records(&self.registry, &ids).await)
    }

    /// A record plus its payload; gateway failures are captured in the
    /// view rather than failing it.
    pub async fn view_record(&self, id: u64) -> Result<RecordView, PortalError> {
        let record = self.registry.record(id).await?;
        let manifest = fetch_manifest(&self.pins, &record.cid).await;
        Ok(RecordView { record, manifest })
    }
}
