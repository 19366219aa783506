//! Dashboard flow tests against in-memory chain and pinning doubles.
//!
//! The doubles enforce the same rules the real contract does (admin-only
//! authorization, doctor-only creation) so the desks' client-side guards
//! can be checked for ordering: a locally rejected operation must never
//! reach a mutating call.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use sha2::{Digest, Sha256};

use medrec_chain::{ChainError, RecordRegistry};
use medrec_core::{Address, ChainRecord, RecordManifest, RecordStatus, Role};
use medrec_pinning::{PinStore, PinningError};
use medrec_portal::{
    resolve_role, AdminDesk, Attachment, DoctorDesk, ManifestOutcome, NewRecord, PatientDesk,
    PortalError, RecordCache,
};

// ==================== CHAIN DOUBLE ====================

struct ChainState {
    admin: Address,
    doctors: Vec<Address>,
    records: BTreeMap<u64, ChainRecord>,
    clock: i64,
}

struct MockChain {
    state: Mutex<ChainState>,
    mutations: AtomicUsize,
    fail_all_reads: AtomicBool,
    fail_doctor_query: AtomicBool,
    emit_event_ids: bool,
}

impl MockChain {
    fn new(admin: Address) -> Arc<Self> {
        Self::build(admin, true)
    }

    /// A chain whose receipts never carry a decodable RecordCreated
    /// event, forcing the counter fallback.
    fn without_event_ids(admin: Address) -> Arc<Self> {
        Self::build(admin, false)
    }

    fn build(admin: Address, emit_event_ids: bool) -> Arc<Self> {
        Arc::new(MockChain {
            state: Mutex::new(ChainState {
                admin,
                doctors: Vec::new(),
                records: BTreeMap::new(),
                clock: 1_700_000_000,
            }),
            mutations: AtomicUsize::new(0),
            fail_all_reads: AtomicBool::new(false),
            fail_doctor_query: AtomicBool::new(false),
            emit_event_ids,
        })
    }

    fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn read_guard(&self) -> Result<(), ChainError> {
        if self.fail_all_reads.load(Ordering::SeqCst) {
            return Err(ChainError::Rejected("rpc unavailable".to_string()));
        }
        Ok(())
    }
}

impl RecordRegistry for MockChain {
    fn admin(&self) -> BoxFuture<'_, Result<Address, ChainError>> {
        Box::pin(async move {
            self.read_guard()?;
            Ok(self.state.lock().unwrap().admin)
        })
    }

    fn is_authorized_doctor(&self, doctor: Address) -> BoxFuture<'_, Result<bool, ChainError>> {
        Box::pin(async move {
            self.read_guard()?;
            Ok(self.state.lock().unwrap().doctors.contains(&doctor))
        })
    }

    fn authorized_doctors(&self) -> BoxFuture<'_, Result<Vec<Address>, ChainError>> {
        Box::pin(async move {
            self.read_guard()?;
            Ok(self.state.lock().unwrap().doctors.clone())
        })
    }

    fn record_count(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        Box::pin(async move {
            self.read_guard()?;
            Ok(self.state.lock().unwrap().records.len() as u64)
        })
    }

    fn record_exists(&self, id: u64) -> BoxFuture<'_, Result<bool, ChainError>> {
        Box::pin(async move {
            self.read_guard()?;
            Ok(self.state.lock().unwrap().records.contains_key(&id))
        })
    }

    fn record(&self, id: u64) -> BoxFuture<'_, Result<ChainRecord, ChainError>> {
        Box::pin(async move {
            self.read_guard()?;
            self.state
                .lock()
                .unwrap()
                .records
                .get(&id)
                .cloned()
                .ok_or_else(|| ChainError::Rejected("record does not exist".to_string()))
        })
    }

    fn patient_records(&self, patient: Address) -> BoxFuture<'_, Result<Vec<u64>, ChainError>> {
        Box::pin(async move {
            self.read_guard()?;
            Ok(self
                .state
                .lock()
                .unwrap()
                .records
                .values()
                .filter(|r| r.patient == patient)
                .map(|r| r.id)
                .collect())
        })
    }

    fn doctor_records(&self, doctor: Address) -> BoxFuture<'_, Result<Vec<u64>, ChainError>> {
        Box::pin(async move {
            self.read_guard()?;
            if self.fail_doctor_query.load(Ordering::SeqCst) {
                return Err(ChainError::Rejected("query failed".to_string()));
            }
            Ok(self
                .state
                .lock()
                .unwrap()
                .records
                .values()
                .filter(|r| r.doctor == doctor)
                .map(|r| r.id)
                .collect())
        })
    }

    fn authorize_doctor(
        &self,
        from: Address,
        doctor: Address,
    ) -> BoxFuture<'_, Result<(), ChainError>> {
        Box::pin(async move {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            if state.admin != from {
                return Err(ChainError::Rejected("caller is not admin".to_string()));
            }
            if !state.doctors.contains(&doctor) {
                state.doctors.push(doctor);
            }
            Ok(())
        })
    }

    fn revoke_doctor(
        &self,
        from: Address,
        doctor: Address,
    ) -> BoxFuture<'_, Result<(), ChainError>> {
        Box::pin(async move {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            if state.admin != from {
                return Err(ChainError::Rejected("caller is not admin".to_string()));
            }
            state.doctors.retain(|d| *d != doctor);
            Ok(())
        })
    }

    fn create_record(
        &self,
        from: Address,
        patient: Address,
        cid: String,
    ) -> BoxFuture<'_, Result<Option<u64>, ChainError>> {
        Box::pin(async move {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            if !state.doctors.contains(&from) {
                return Err(ChainError::Rejected("not an authorized doctor".to_string()));
            }
            let id = state.records.len() as u64 + 1;
            let created_at = state.clock;
            state.clock += 100;
            state.records.insert(
                id,
                ChainRecord {
                    id,
                    patient,
                    doctor: from,
                    cid,
                    created_at,
                    status: RecordStatus::Active,
                },
            );
            Ok(self.emit_event_ids.then_some(id))
        })
    }

    fn update_record(
        &self,
        _from: Address,
        id: u64,
        cid: String,
    ) -> BoxFuture<'_, Result<(), ChainError>> {
        Box::pin(async move {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            let record = state
                .records
                .get_mut(&id)
                .ok_or_else(|| ChainError::Rejected("record does not exist".to_string()))?;
            if !record.status.is_active() {
                return Err(ChainError::Rejected("record inactive".to_string()));
            }
            record.cid = cid;
            Ok(())
        })
    }

    fn deactivate_record(&self, _from: Address, id: u64) -> BoxFuture<'_, Result<(), ChainError>> {
        Box::pin(async move {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            let record = state
                .records
                .get_mut(&id)
                .ok_or_else(|| ChainError::Rejected("record does not exist".to_string()))?;
            record.status = RecordStatus::Inactive;
            Ok(())
        })
    }
}

// ==================== PINNING DOUBLE ====================

#[derive(Default)]
struct MockPins {
    objects: Mutex<HashMap<String, serde_json::Value>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_fetch: AtomicBool,
    uploads: AtomicUsize,
}

fn cid_for(bytes: &[u8]) -> String {
    format!("Qm{}", hex::encode(&Sha256::digest(bytes)[..16]))
}

impl MockPins {
    fn new() -> Arc<Self> {
        Arc::new(MockPins::default())
    }

    fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

impl PinStore for MockPins {
    fn pin_json(&self, payload: serde_json::Value) -> BoxFuture<'_, Result<String, PinningError>> {
        Box::pin(async move {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            let cid = cid_for(payload.to_string().as_bytes());
            self.objects.lock().unwrap().insert(cid.clone(), payload);
            Ok(cid)
        })
    }

    fn pin_file(
        &self,
        _file_name: String,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, Result<String, PinningError>> {
        Box::pin(async move {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            let cid = cid_for(&bytes);
            self.blobs.lock().unwrap().insert(cid.clone(), bytes);
            Ok(cid)
        })
    }

    fn fetch_json(&self, cid: String) -> BoxFuture<'_, Result<serde_json::Value, PinningError>> {
        Box::pin(async move {
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(PinningError::GatewayStatus { cid, status: 502 });
            }
            self.objects
                .lock()
                .unwrap()
                .get(&cid)
                .cloned()
                .ok_or(PinningError::GatewayStatus { cid, status: 404 })
        })
    }
}

// ==================== HELPERS ====================

fn addr(tail: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = tail;
    Address::from_bytes(bytes)
}

fn temp_cache(tag: &str) -> RecordCache {
    let dir = std::env::temp_dir().join(format!(
        "medrec-flows-test-{}-{tag}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    RecordCache::new(dir)
}

fn new_record(patient: Address) -> NewRecord {
    NewRecord {
        patient,
        patient_name: "Jane Roe".to_string(),
        diagnosis: "Acute bronchitis".to_string(),
        treatment: "Rest and fluids".to_string(),
        notes: "Follow up in two weeks".to_string(),
        visit_date: "2026-03-14".to_string(),
        attachments: Vec::new(),
    }
}

async fn fetch_manifest(pins: &MockPins, cid: &str) -> RecordManifest {
    let value = pins.fetch_json(cid.to_string()).await.unwrap();
    serde_json::from_value(value).unwrap()
}

// ==================== ROLE RESOLUTION ====================

#[tokio::test]
async fn role_resolution_priority_chain() {
    let admin: Address = "0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED".parse().unwrap();
    let chain = MockChain::new(admin);
    let doctor = addr(2);
    chain.state.lock().unwrap().doctors.push(doctor);

    // Same admin account written in lowercase still classifies as Admin.
    let lower: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
    assert_eq!(resolve_role(&*chain, lower).await, Role::Admin);
    assert_eq!(resolve_role(&*chain, doctor).await, Role::Doctor);
    assert_eq!(resolve_role(&*chain, addr(9)).await, Role::Patient);
}

#[tokio::test]
async fn role_resolution_fails_closed_to_patient() {
    let chain = MockChain::new(addr(1));
    chain.state.lock().unwrap().doctors.push(addr(1));
    chain.fail_all_reads.store(true, Ordering::SeqCst);
    // Even the admin account falls back to the least-privileged role
    // when the queries error out.
    assert_eq!(resolve_role(&*chain, addr(1)).await, Role::Patient);
}

// ==================== ADMIN DESK ====================

#[tokio::test]
async fn authorize_then_revoke_restores_membership() {
    let admin = addr(1);
    let chain = MockChain::new(admin);
    let desk = AdminDesk::new(admin, chain.clone());

    let view = desk.authorize(addr(2)).await.unwrap();
    assert_eq!(view.doctors, vec![addr(2)]);
    assert_eq!(view.stats.total_doctors, 1);

    let view = desk.revoke(addr(2)).await.unwrap();
    assert!(view.doctors.is_empty());
    assert_eq!(view.stats.total_doctors, 0);
}

#[tokio::test]
async fn revoke_of_non_member_never_reaches_the_chain() {
    let admin = addr(1);
    let chain = MockChain::new(admin);
    let desk = AdminDesk::new(admin, chain.clone());

    let err = desk.revoke(addr(5)).await.unwrap_err();
    assert!(matches!(err, PortalError::NotAuthorized(a) if a == addr(5)));
    assert_eq!(chain.mutation_count(), 0);
}

#[tokio::test]
async fn double_authorize_is_rejected_after_the_read_query() {
    let admin = addr(1);
    let chain = MockChain::new(admin);
    let desk = AdminDesk::new(admin, chain.clone());

    desk.authorize(addr(2)).await.unwrap();
    let err = desk.authorize(addr(2)).await.unwrap_err();
    assert!(matches!(err, PortalError::AlreadyAuthorized(_)));
    assert_eq!(chain.mutation_count(), 1);
}

#[tokio::test]
async fn non_admin_caller_is_stopped_client_side() {
    let chain = MockChain::new(addr(1));
    let desk = AdminDesk::new(addr(9), chain.clone());

    let err = desk.authorize(addr(2)).await.unwrap_err();
    assert!(matches!(err, PortalError::NotAdmin));
    assert_eq!(chain.mutation_count(), 0);
}

#[tokio::test]
async fn authorized_doctor_sees_it_on_their_dashboard() {
    let admin = addr(1);
    let doc: Address = "0x00000000000000000000000000000000000d0c01".parse().unwrap();
    let chain = MockChain::new(admin);
    let pins = MockPins::new();

    AdminDesk::new(admin, chain.clone())
        .authorize(doc)
        .await
        .unwrap();

    let desk = DoctorDesk::new(doc, chain.clone(), pins, temp_cache("doc-auth"));
    assert!(desk.authorization().await.unwrap());
}

// ==================== DOCTOR DESK ====================

#[tokio::test]
async fn created_record_round_trips_through_the_gateway() {
    let admin = addr(1);
    let doctor = addr(2);
    let patient = addr(3);
    let chain = MockChain::new(admin);
    let pins = MockPins::new();

    AdminDesk::new(admin, chain.clone())
        .authorize(doctor)
        .await
        .unwrap();
    let desk = DoctorDesk::new(doctor, chain.clone(), pins.clone(), temp_cache("roundtrip"));

    let created = desk.create_record(new_record(patient)).await.unwrap();
    assert!(created.from_event);

    // Fetching the record by its returned id yields a CID whose payload
    // is exactly the manifest that was pinned.
    let record = chain.record(created.record_id).await.unwrap();
    assert_eq!(record.cid, created.manifest_cid);
    assert_eq!(record.patient, patient);
    assert_eq!(record.doctor, doctor);
    assert!(record.is_active());

    let manifest = fetch_manifest(&pins, &record.cid).await;
    assert_eq!(manifest.diagnosis, "Acute bronchitis");
    assert_eq!(manifest.patient, patient);
    assert_eq!(manifest.doctor, doctor);
    assert!(manifest.patient_updates.is_empty());
}

#[tokio::test]
async fn missing_event_falls_back_to_the_record_counter() {
    let admin = addr(1);
    let doctor = addr(2);
    let chain = MockChain::without_event_ids(admin);
    let pins = MockPins::new();

    AdminDesk::new(admin, chain.clone())
        .authorize(doctor)
        .await
        .unwrap();
    let desk = DoctorDesk::new(doctor, chain.clone(), pins, temp_cache("fallback"));

    let created = desk.create_record(new_record(addr(3))).await.unwrap();
    assert!(!created.from_event);
    assert_eq!(created.record_id, 1);
    assert!(chain.record(1).await.is_ok());
}

#[tokio::test]
async fn attachments_keep_submission_order() {
    let admin = addr(1);
    let doctor = addr(2);
    let chain = MockChain::new(admin);
    let pins = MockPins::new();

    AdminDesk::new(admin, chain.clone())
        .authorize(doctor)
        .await
        .unwrap();
    let desk = DoctorDesk::new(doctor, chain.clone(), pins.clone(), temp_cache("attach"));

    let mut input = new_record(addr(3));
    input.attachments = vec![
        Attachment {
            name: "xray.png".to_string(),
            bytes: b"scan-one".to_vec(),
        },
        Attachment {
            name: "labs.pdf".to_string(),
            bytes: b"scan-two".to_vec(),
        },
    ];
    let created = desk.create_record(input).await.unwrap();

    let manifest = fetch_manifest(&pins, &created.manifest_cid).await;
    assert_eq!(manifest.attachments.len(), 2);
    assert_eq!(manifest.attachments[0].name, "xray.png");
    assert_eq!(manifest.attachments[0].cid, cid_for(b"scan-one"));
    assert_eq!(manifest.attachments[1].name, "labs.pdf");
    assert_eq!(manifest.attachments[1].cid, cid_for(b"scan-two"));
}

#[tokio::test]
async fn unauthorized_doctor_uploads_nothing() {
    let chain = MockChain::new(addr(1));
    let pins = MockPins::new();
    let desk = DoctorDesk::new(addr(7), chain.clone(), pins.clone(), temp_cache("unauth"));

    let mut input = new_record(addr(3));
    input.attachments = vec![Attachment {
        name: "xray.png".to_string(),
        bytes: b"scan".to_vec(),
    }];
    let err = desk.create_record(input).await.unwrap_err();
    assert!(matches!(err, PortalError::UnauthorizedCaller(_)));
    // The guard fired before any upload or chain call.
    assert_eq!(pins.upload_count(), 0);
    assert_eq!(chain.mutation_count(), 0);
}

#[tokio::test]
async fn doctor_listing_falls_back_to_the_local_cache() {
    let admin = addr(1);
    let doctor = addr(2);
    let chain = MockChain::new(admin);
    let pins = MockPins::new();

    AdminDesk::new(admin, chain.clone())
        .authorize(doctor)
        .await
        .unwrap();
    let desk = DoctorDesk::new(doctor, chain.clone(), pins, temp_cache("cachefb"));
    let created = desk.create_record(new_record(addr(3))).await.unwrap();

    chain.fail_doctor_query.store(true, Ordering::SeqCst);
    let records = desk.my_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, created.record_id);
}

#[tokio::test]
async fn gateway_failure_is_captured_in_the_view() {
    let admin = addr(1);
    let doctor = addr(2);
    let chain = MockChain::new(admin);
    let pins = MockPins::new();

    AdminDesk::new(admin, chain.clone())
        .authorize(doctor)
        .await
        .unwrap();
    let desk = DoctorDesk::new(doctor, chain.clone(), pins.clone(), temp_cache("gateway"));
    let created = desk.create_record(new_record(addr(3))).await.unwrap();

    pins.fail_fetch.store(true, Ordering::SeqCst);
    let view = desk.view_record(created.record_id).await.unwrap();
    assert!(matches!(view.manifest, ManifestOutcome::Unavailable(_)));
    assert_eq!(view.record.id, created.record_id);
}

// ==================== PATIENT DESK ====================

#[tokio::test]
async fn patient_update_is_append_only() {
    let admin = addr(1);
    let doctor = addr(2);
    let patient = addr(3);
    let chain = MockChain::new(admin);
    let pins = MockPins::new();

    AdminDesk::new(admin, chain.clone())
        .authorize(doctor)
        .await
        .unwrap();
    let created = DoctorDesk::new(doctor, chain.clone(), pins.clone(), temp_cache("update"))
        .create_record(new_record(patient))
        .await
        .unwrap();

    let desk = PatientDesk::new(patient, chain.clone(), pins.clone());
    let mut fields = BTreeMap::new();
    fields.insert("symptoms".to_string(), "persistent cough".to_string());
    let new_cid = desk.submit_update(created.record_id, fields).await.unwrap();
    assert_ne!(new_cid, created.manifest_cid);

    // The on-chain pointer moved; the status label did not.
    let record = chain.record(created.record_id).await.unwrap();
    assert_eq!(record.cid, new_cid);
    assert!(record.is_active());

    // Doctor-authored fields are intact; the update landed as one entry.
    let merged = fetch_manifest(&pins, &new_cid).await;
    assert_eq!(merged.diagnosis, "Acute bronchitis");
    assert_eq!(merged.treatment, "Rest and fluids");
    assert_eq!(merged.patient_updates.len(), 1);
    let entry = &merged.patient_updates[0];
    assert_eq!(entry.fields.len(), 1);
    assert_eq!(entry.fields["symptoms"], "persistent cough");
    assert!(entry.updated_at > 0);

    // The original manifest is still addressable: pinned content is
    // immutable, only the pointer changed.
    let original = fetch_manifest(&pins, &created.manifest_cid).await;
    assert!(original.patient_updates.is_empty());
}

#[tokio::test]
async fn empty_update_is_rejected_before_any_network_call() {
    let chain = MockChain::new(addr(1));
    let pins = MockPins::new();
    let desk = PatientDesk::new(addr(3), chain.clone(), pins.clone());

    let err = desk.submit_update(1, BTreeMap::new()).await.unwrap_err();
    assert!(matches!(err, PortalError::Core(_)));
    assert_eq!(chain.mutation_count(), 0);
    assert_eq!(pins.upload_count(), 0);
}

#[tokio::test]
async fn second_deactivate_is_a_client_side_noop() {
    let admin = addr(1);
    let doctor = addr(2);
    let patient = addr(3);
    let chain = MockChain::new(admin);
    let pins = MockPins::new();

    AdminDesk::new(admin, chain.clone())
        .authorize(doctor)
        .await
        .unwrap();
    let created = DoctorDesk::new(doctor, chain.clone(), pins.clone(), temp_cache("deact"))
        .create_record(new_record(patient))
        .await
        .unwrap();

    let desk = PatientDesk::new(patient, chain.clone(), pins);
    desk.deactivate(created.record_id).await.unwrap();
    let before = chain.mutation_count();

    let err = desk.deactivate(created.record_id).await.unwrap_err();
    assert!(matches!(err, PortalError::AlreadyInactive(id) if id == created.record_id));
    assert_eq!(chain.mutation_count(), before);
}

#[tokio::test]
async fn updates_on_inactive_records_are_refused() {
    let admin = addr(1);
    let doctor = addr(2);
    let patient = addr(3);
    let chain = MockChain::new(admin);
    let pins = MockPins::new();

    AdminDesk::new(admin, chain.clone())
        .authorize(doctor)
        .await
        .unwrap();
    let created = DoctorDesk::new(doctor, chain.clone(), pins.clone(), temp_cache("inactive"))
        .create_record(new_record(patient))
        .await
        .unwrap();

    let desk = PatientDesk::new(patient, chain.clone(), pins.clone());
    desk.deactivate(created.record_id).await.unwrap();

    let mut fields = BTreeMap::new();
    fields.insert("symptoms".to_string(), "cough".to_string());
    let uploads_before = pins.upload_count();
    let err = desk.submit_update(created.record_id, fields).await.unwrap_err();
    assert!(matches!(err, PortalError::UpdateOnInactive(_)));
    assert_eq!(pins.upload_count(), uploads_before);
}

#[tokio::test]
async fn patient_listing_is_newest_first_and_skips_broken_ids() {
    let admin = addr(1);
    let doctor = addr(2);
    let patient = addr(3);
    let chain = MockChain::new(admin);
    let pins = MockPins::new();

    AdminDesk::new(admin, chain.clone())
        .authorize(doctor)
        .await
        .unwrap();
    let doc_desk = DoctorDesk::new(doctor, chain.clone(), pins.clone(), temp_cache("newest"));
    let first = doc_desk.create_record(new_record(patient)).await.unwrap();
    let second = doc_desk.create_record(new_record(patient)).await.unwrap();

    let desk = PatientDesk::new(patient, chain.clone(), pins);
    let records = desk.my_records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, second.record_id);
    assert_eq!(records[1].id, first.record_id);
}
