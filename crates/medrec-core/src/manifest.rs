//! Off-chain record manifests.
//!
//! The manifest is the JSON document a doctor authors when creating a
//! record. It is content-addressed and immutable once pinned: an update
//! never edits a manifest in place, it pins a merged copy and repoints
//! the on-chain record at the new content identifier.
//!
//! Patient updates are append-only. The doctor-authored clinical fields
//! are never overwritten; each update becomes one entry in the
//! `patientUpdates` list, preserving the original content as an audit
//! trail inside the payload. Unknown JSON fields round-trip untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::CoreError;
use crate::validate;

/// Reference to an uploaded attachment blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub cid: String,
}

/// One append-only patient amendment: the supplied fields plus the
/// moment they were merged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatientUpdate {
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

/// The medical manifest pinned off-chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordManifest {
    pub patient_name: String,
    pub diagnosis: String,
    pub treatment: String,
    #[serde(default)]
    pub notes: String,
    /// Visit date as entered by the doctor (YYYY-MM-DD).
    #[serde(rename = "date")]
    pub visit_date: String,
    pub doctor: Address,
    pub patient: Address,
    /// Authoring time, unix seconds.
    #[serde(rename = "timestamp")]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patient_updates: Vec<PatientUpdate>,
    /// Fields this client does not know about survive a merge round trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RecordManifest {
    /// Validate the doctor-authored fields before any upload happens.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::required("patient name", &self.patient_name)?;
        validate::required("diagnosis", &self.diagnosis)?;
        validate::required("treatment", &self.treatment)?;
        validate::required("date", &self.visit_date)?;
        for attachment in &self.attachments {
            validate::cid(&attachment.cid)?;
        }
        Ok(())
    }

    /// Merge a patient amendment. Clinical fields are untouched by
    /// construction; the amendment lands as one new entry at the end of
    /// `patientUpdates`.
    pub fn apply_patient_update(
        &mut self,
        fields: BTreeMap<String, String>,
        updated_at: i64,
    ) -> Result<(), CoreError> {
        validate::patient_update_fields(&fields)?;
        self.patient_updates.push(PatientUpdate { updated_at, fields });
        Ok(())
    }
}
