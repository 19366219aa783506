//! Role resolution against the live contract.
//!
//! Runs once per distinct (account, contract) pair. Query failures are
//! logged and resolve to Patient: the client never defaults to a
//! privileged role on error.

use tracing::{debug, warn};

use medrec_chain::{ChainError, RecordRegistry};
use medrec_core::{Address, Role};

pub async fn resolve_role<R: RecordRegistry + ?Sized>(registry: &R, account: Address) -> Role {
    match query_role(registry, account).await {
        Ok(role) => {
            debug!(%account, %role, "role resolved");
            role
        }
        Err(err) => {
            warn!(%account, error = %err, "role query failed; defaulting to least-privileged role");
            Role::Patient
        }
    }
}

async fn query_role<R: RecordRegistry + ?Sized>(
    registry: &R,
    account: Address,
) -> Result<Role, ChainError> {
    let admin = registry.admin().await?;
    if admin == account {
        // Short-circuit: no doctor query for the administrator.
        return Ok(Role::Admin);
    }
    let is_doctor = registry.is_authorized_doctor(account).await?;
    Ok(Role::classify(account, admin, is_doctor))
}
