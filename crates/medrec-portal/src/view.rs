//! Shared record-view helpers for the doctor and patient desks.

use serde::Serialize;
use tracing::warn;

use medrec_chain::RecordRegistry;
use medrec_core::{ChainRecord, RecordManifest};
use medrec_pinning::PinStore;

/// Outcome of fetching a record's off-chain payload. A gateway failure
/// is captured and shown in place of the payload; it never fails the
/// surrounding view.
#[derive(Clone, Debug, Serialize)]
pub enum ManifestOutcome {
    Loaded(RecordManifest),
    Unavailable(String),
}

/// One record plus its payload, rendered as a single item.
#[derive(Clone, Debug, Serialize)]
pub struct RecordView {
    pub record: ChainRecord,
    pub manifest: ManifestOutcome,
}

/// Load a batch of records by id, skipping entries that fail to load.
pub(crate) async fn load_records<R: RecordRegistry + ?Sized>(
    registry: &R,
    ids: &[u64],
) -> Vec<ChainRecord> {
    let mut records = Vec::with_capacity(ids.len());
    for &id in ids {
        match registry.record(id).await {
            Ok(record) => records.push(record),
            Err(err) => warn!(record = id, error = %err, "skipping record that failed to load"),
        }
    }
    records
}

pub(crate) async fn fetch_manifest<P: PinStore + ?Sized>(pins: &P, cid: &str) -> ManifestOutcome {
    match pins.fetch_json(cid.to_string()).await {
        Ok(value) => match serde_json::from_value::<RecordManifest>(value) {
            Ok(manifest) => ManifestOutcome::Loaded(manifest),
            Err(err) => ManifestOutcome::Unavailable(format!("malformed manifest: {err}")),
        },
        Err(err) => ManifestOutcome::Unavailable(err.to_string()),
    }
}
