//! Typed handle for the records contract.
//!
//! [`RecordRegistry`] is the seam the dashboards program against;
//! [`Web3Registry`] is the live implementation, bound to one deployed
//! contract address and the interface description shipped with this
//! crate. Read methods are plain queries. Write methods estimate gas
//! first, add the fixed margin, submit, and fail on a mined revert.

use futures::future::BoxFuture;
use tracing::debug;
use web3::contract::{Contract, Options};
use web3::types::{TransactionReceipt, H160, H256, U256};
use web3::{Transport, Web3};

use medrec_core::{gas, Address, ChainRecord, RecordStatus};

use crate::error::ChainError;

/// Interface description of the records contract (external collaborator).
pub const REGISTRY_ABI: &[u8] = include_bytes!("../abi/patient_records.json");

pub trait RecordRegistry: Send + Sync {
    fn admin(&self) -> BoxFuture<'_, Result<Address, ChainError>>;
    fn is_authorized_doctor(&self, doctor: Address) -> BoxFuture<'_, Result<bool, ChainError>>;
    fn authorized_doctors(&self) -> BoxFuture<'_, Result<Vec<Address>, ChainError>>;
    fn record_count(&self) -> BoxFuture<'_, Result<u64, ChainError>>;
    fn record_exists(&self, id: u64) -> BoxFuture<'_, Result<bool, ChainError>>;
    fn record(&self, id: u64) -> BoxFuture<'_, Result<ChainRecord, ChainError>>;
    fn patient_records(&self, patient: Address) -> BoxFuture<'_, Result<Vec<u64>, ChainError>>;
    fn doctor_records(&self, doctor: Address) -> BoxFuture<'_, Result<Vec<u64>, ChainError>>;
    fn authorize_doctor(&self, from: Address, doctor: Address)
        -> BoxFuture<'_, Result<(), ChainError>>;
    fn revoke_doctor(&self, from: Address, doctor: Address)
        -> BoxFuture<'_, Result<(), ChainError>>;
    /// Returns the new record id when the RecordCreated event could be
    /// decoded from the receipt; callers fall back to the record counter
    /// otherwise.
    fn create_record(
        &self,
        from: Address,
        patient: Address,
        cid: String,
    ) -> BoxFuture<'_, Result<Option<u64>, ChainError>>;
    fn update_record(
        &self,
        from: Address,
        id: u64,
        cid: String,
    ) -> BoxFuture<'_, Result<(), ChainError>>;
    fn deactivate_record(&self, from: Address, id: u64) -> BoxFuture<'_, Result<(), ChainError>>;
}

/// Live registry over a web3 transport.
pub struct Web3Registry<T: Transport> {
    contract: Contract<T>,
    record_created: H256,
}

impl<T: Transport> Web3Registry<T> {
    /// Bind to the deployed contract at `address`.
    pub fn new(web3: &Web3<T>, address: Address) -> Result<Self, ChainError> {
        let contract = Contract::from_json(web3.eth(), to_h160(address), REGISTRY_ABI)?;
        let record_created = contract.abi().event("RecordCreated")?.signature();
        Ok(Web3Registry {
            contract,
            record_created,
        })
    }

    pub fn address(&self) -> Address {
        from_h160(self.contract.address())
    }

    /// Estimate, apply the margin, submit, wait for the receipt.
    async fn send(
        &self,
        method: &'static str,
        params: impl web3::contract::tokens::Tokenize + Clone,
        from: Address,
    ) -> Result<TransactionReceipt, ChainError> {
        let estimate = self
            .contract
            .estimate_gas(method, params.clone(), to_h160(from), Options::default())
            .await
            .map_err(|source| ChainError::Query { method, source })?;
        let gas = estimate * U256::from(100 + gas::GAS_MARGIN_PERCENT) / U256::from(100u64);
        debug!(method, %estimate, %gas, "submitting transaction");
        let receipt = self
            .contract
            .call_with_confirmations(
                method,
                params,
                to_h160(from),
                Options {
                    gas: Some(gas),
                    ..Options::default()
                },
                1,
            )
            .await
            .map_err(|source| ChainError::Transaction { method, source })?;
        if receipt.status == Some(0.into()) {
            return Err(ChainError::Reverted { method });
        }
        Ok(receipt)
    }

    fn created_record_id(&self, receipt: &TransactionReceipt) -> Option<u64> {
        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.contract.address())
            .find_map(|log| record_id_from_topics(&log.topics, &self.record_created))
    }
}

impl<T> RecordRegistry for Web3Registry<T>
where
    T: Transport + Send + Sync + 'static,
    T::Out: Send,
{
    fn admin(&self) -> BoxFuture<'_, Result<Address, ChainError>> {
        Box::pin(async move {
            let admin: H160 = self
                .contract
                .query("admin", (), None, Options::default(), None)
                .await
                .map_err(|source| ChainError::Query {
                    method: "admin",
                    source,
                })?;
            Ok(from_h160(admin))
        })
    }

    fn is_authorized_doctor(&self, doctor: Address) -> BoxFuture<'_, Result<bool, ChainError>> {
        Box::pin(async move {
            self.contract
                .query(
                    "isAuthorizedDoctor",
                    (to_h160(doctor),),
                    None,
                    Options::default(),
                    None,
                )
                .await
                .map_err(|source| ChainError::Query {
                    method: "isAuthorizedDoctor",
                    source,
                })
        })
    }

    fn authorized_doctors(&self) -> BoxFuture<'_, Result<Vec<Address>, ChainError>> {
        Box::pin(async move {
            let doctors: Vec<H160> = self
                .contract
                .query("getAuthorizedDoctors", (), None, Options::default(), None)
                .await
                .map_err(|source| ChainError::Query {
                    method: "getAuthorizedDoctors",
                    source,
                })?;
            Ok(doctors.into_iter().map(from_h160).collect())
        })
    }

    fn record_count(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        Box::pin(async move {
            let count: U256 = self
                .contract
                .query("recordCount", (), None, Options::default(), None)
                .await
                .map_err(|source| ChainError::Query {
                    method: "recordCount",
                    source,
                })?;
            Ok(u256_to_u64(count))
        })
    }

    fn record_exists(&self, id: u64) -> BoxFuture<'_, Result<bool, ChainError>> {
        Box::pin(async move {
            self.contract
                .query(
                    "recordExistsCheck",
                    (U256::from(id),),
                    None,
                    Options::default(),
                    None,
                )
                .await
                .map_err(|source| ChainError::Query {
                    method: "recordExistsCheck",
                    source,
                })
        })
    }

    fn record(&self, id: u64) -> BoxFuture<'_, Result<ChainRecord, ChainError>> {
        Box::pin(async move {
            let (id_out, patient, doctor, cid, timestamp, active): (
                U256,
                H160,
                H160,
                String,
                U256,
                bool,
            ) = self
                .contract
                .query("getRecord", (U256::from(id),), None, Options::default(), None)
                .await
                .map_err(|source| ChainError::Query {
                    method: "getRecord",
                    source,
                })?;
            Ok(ChainRecord {
                id: u256_to_u64(id_out),
                patient: from_h160(patient),
                doctor: from_h160(doctor),
                cid,
                created_at: u256_to_u64(timestamp) as i64,
                status: RecordStatus::from_active_flag(active),
            })
        })
    }

    fn patient_records(&self, patient: Address) -> BoxFuture<'_, Result<Vec<u64>, ChainError>> {
        Box::pin(async move {
            let ids: Vec<U256> = self
                .contract
                .query(
                    "getPatientRecords",
                    (to_h160(patient),),
                    None,
                    Options::default(),
                    None,
                )
                .await
                .map_err(|source| ChainError::Query {
                    method: "getPatientRecords",
                    source,
                })?;
            Ok(ids.into_iter().map(u256_to_u64).collect())
        })
    }

    fn doctor_records(&self, doctor: Address) -> BoxFuture<'_, Result<Vec<u64>, ChainError>> {
        Box::pin(async move {
            let ids: Vec<U256> = self
                .contract
                .query(
                    "getDoctorRecords",
                    (to_h160(doctor),),
                    None,
                    Options::default(),
                    None,
                )
                .await
                .map_err(|source| ChainError::Query {
                    method: "getDoctorRecords",
                    source,
                })?;
            Ok(ids.into_iter().map(u256_to_u64).collect())
        })
    }

    fn authorize_doctor(
        &self,
        from: Address,
        doctor: Address,
    ) -> BoxFuture<'_, Result<(), ChainError>> {
        Box::pin(async move {
            self.send("authorizeDoctor", (to_h160(doctor),), from).await?;
            Ok(())
        })
    }

    fn revoke_doctor(
        &self,
        from: Address,
        doctor: Address,
    ) -> BoxFuture<'_, Result<(), ChainError>> {
        Box::pin(async move {
            self.send("revokeDoctor", (to_h160(doctor),), from).await?;
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
            let receipt = self
                .send("createRecord", (to_h160(patient), cid), from)
                .await?;
            Ok(self.created_record_id(&receipt))
        })
    }

    fn update_record(
        &self,
        from: Address,
        id: u64,
        cid: String,
    ) -> BoxFuture<'_, Result<(), ChainError>> {
        Box::pin(async move {
            self.send("updateRecord", (U256::from(id), cid), from).await?;
            Ok(())
        })
    }

    fn deactivate_record(&self, from: Address, id: u64) -> BoxFuture<'_, Result<(), ChainError>> {
        Box::pin(async move {
            self.send("deactivateRecord", (U256::from(id),), from).await?;
            Ok(())
        })
    }
}

impl<T: RecordRegistry + ?Sized> RecordRegistry for std::sync::Arc<T> {
    fn admin(&self) -> BoxFuture<'_, Result<Address, ChainError>> {
        (**self).admin()
    }
    fn is_authorized_doctor(&self, doctor: Address) -> BoxFuture<'_, Result<bool, ChainError>> {
        (**self).is_authorized_doctor(doctor)
    }
    fn authorized_doctors(&self) -> BoxFuture<'_, Result<Vec<Address>, ChainError>> {
        (**self).authorized_doctors()
    }
    fn record_count(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        (**self).record_count()
    }
    fn record_exists(&self, id: u64) -> BoxFuture<'_, Result<bool, ChainError>> {
        (**self).record_exists(id)
    }
    fn record(&self, id: u64) -> BoxFuture<'_, Result<ChainRecord, ChainError>> {
        (**self).record(id)
    }
    fn patient_records(&self, patient: Address) -> BoxFuture<'_, Result<Vec<u64>, ChainError>> {
        (**self).patient_records(patient)
    }
    fn doctor_records(&self, doctor: Address) -> BoxFuture<'_, Result<Vec<u64>, ChainError>> {
        (**self).doctor_records(doctor)
    }
    fn authorize_doctor(
        &self,
        from: Address,
        doctor: Address,
    ) -> BoxFuture<'_, Result<(), ChainError>> {
        (**self).authorize_doctor(from, doctor)
    }
    fn revoke_doctor(
        &self,
        from: Address,
        doctor: Address,
    ) -> BoxFuture<'_, Result<(), ChainError>> {
        (**self).revoke_doctor(from, doctor)
    }
    fn create_record(
        &self,
        from: Address,
        patient: Address,
        cid: String,
    ) -> BoxFuture<'_, Result<Option<u64>, ChainError>> {
        (**self).create_record(from, patient, cid)
    }
    fn update_record(
        &self,
        from: Address,
        id: u64,
        cid: String,
    ) -> BoxFuture<'_, Result<(), ChainError>> {
        (**self).update_record(from, id, cid)
    }
    fn deactivate_record(&self, from: Address, id: u64) -> BoxFuture<'_, Result<(), ChainError>> {
        (**self).deactivate_record(from, id)
    }
}

fn to_h160(address: Address) -> H160 {
    H160::from(*address.as_bytes())
}

fn from_h160(value: H160) -> Address {
    Address::from_bytes(value.0)
}

fn u256_to_u64(value: U256) -> u64 {
    value.min(U256::from(u64::MAX)).as_u64()
}

/// First topic is the event signature; the indexed record id sits in
/// the second topic.
fn record_id_from_topics(topics: &[H256], signature: &H256) -> Option<u64> {
    if topics.first() != Some(signature) {
        return None;
    }
    topics
        .get(1)
        .map(|topic| u256_to_u64(U256::from_big_endian(topic.as_bytes())))
}
