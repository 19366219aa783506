//! Administrator desk: doctor authorization management.
//!
//! Each mutating operation is guarded client-side (caller is the
//! administrator, the membership precondition holds) before gas is
//! spent; the contract enforces the same rules authoritatively. On
//! success the authorized set and the contract statistics are
//! re-queried so the caller always sees post-mutation state; on failure
//! nothing local is mutated.

use serde::Serialize;
use tracing::info;

use medrec_chain::RecordRegistry;
use medrec_core::{Address, InFlightGuard};

use crate::error::PortalError;

#[derive(Clone, Debug, Serialize)]
pub struct ContractStats {
    pub total_records: u64,
    pub total_doctors: usize,
    pub admin: Address,
}

/// Post-operation snapshot: the authorized set plus fresh statistics.
#[derive(Clone, Debug, Serialize)]
pub struct AdminView {
    pub doctors: Vec<Address>,
    pub stats: ContractStats,
}

pub struct AdminDesk<R> {
    account: Address,
    registry: R,
    guard: InFlightGuard,
}

impl<R: RecordRegistry> AdminDesk<R> {
    pub fn new(account: Address, registry: R) -> Self {
        AdminDesk {
            account,
            registry,
            guard: InFlightGuard::new(),
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// The current authorized set and contract statistics.
    pub async fn overview(&self) -> Result<AdminView, PortalError> {
        let (doctors, total_records, admin) = tokio::try_join!(
            self.registry.authorized_doctors(),
            self.registry.record_count(),
            self.registry.admin(),
        )?;
        Ok(AdminView {
            stats: ContractStats {
                total_records,
                total_doctors: doctors.len(),
                admin,
            },
            doctors,
        })
    }

    /// Read-only probe used by the status checker form.
    pub async fn check_status(&self, doctor: Address) -> Result<bool, PortalError> {
        Ok(self.registry.is_authorized_doctor(doctor).await?)
    }

    pub async fn authorize(&self, doctor: Address) -> Result<AdminView, PortalError> {
        let _token = self.guard.begin()?;
        self.ensure_admin().await?;
        if self.registry.is_authorized_doctor(doctor).await? {
            return Err(PortalError::AlreadyAuthorized(doctor));
        }
        self.registry.authorize_doctor(self.account, doctor).await?;
        info!(doctor = %doctor, "doctor authorized");
        self.overview().await
    }

    pub async fn revoke(&self, doctor: Address) -> Result<AdminView, PortalError> {
        let _token = self.guard.begin()?;
        self.ensure_admin().await?;
        if !self.registry.is_authorized_doctor(doctor).await? {
            return Err(PortalError::NotAuthorized(doctor));
        }
        self.registry.revoke_doctor(self.account, doctor).await?;
        info!(doctor = %doctor, "doctor revoked");
        self.overview().await
    }

    /// Client-side UX check; the contract rejects non-admin callers
    /// regardless.
    async fn ensure_admin(&self) -> Result<(), PortalError> {
        if self.registry.admin().await? != self.account {
            return Err(PortalError::NotAdmin);
        }
        Ok(())
    }
}
