//! Medrec Portal - Role Dashboards
//!
//! The user-facing layer of the client. A connected account is
//! classified once per (account, contract) pair and handed the matching
//! desk:
//!
//! - [`AdminDesk`]: doctor authorization management and contract stats.
//! - [`DoctorDesk`]: record creation (attachments, manifest, pin,
//!   submit) and the doctor's own record list.
//! - [`PatientDesk`]: record list and view, append-only patient
//!   updates, one-way deactivation.
//!
//! Every desk checks its preconditions locally before touching the
//! network; the contract remains the actual enforcer. The `medrec`
//! binary in `main.rs` exposes the desks as per-role subcommands.

pub mod admin;
pub mod cache;
pub mod config;
pub mod doctor;
pub mod error;
pub mod patient;
pub mod render;
pub mod roles;
pub mod view;

pub use admin::{AdminDesk, AdminView, ContractStats};
pub use cache::RecordCache;
pub use config::PortalConfig;
pub use doctor::{Attachment, CreatedRecord, DoctorDesk, NewRecord};
pub use error::PortalError;
pub use patient::PatientDesk;
pub use roles::resolve_role;
pub use view::{ManifestOutcome, RecordView};
