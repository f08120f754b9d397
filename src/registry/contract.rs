//! `PedigreePal` contract bindings and the JSON-RPC backed registry.
//!
//! # Responsibilities
//! - Encode `registerDog` / `retrieveDog` / `dogCount` calls
//! - Sign and broadcast writes through the local wallet's provider
//! - Poll for receipts until the node reports the transaction mined
//! - Translate node errors into [`ProviderError`]

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionReceipt;
use alloy::sol;
use alloy::transports::TransportError;
use async_trait::async_trait;
use tokio::time::interval;

use crate::error::ProviderError;
use crate::registry::backend::{Registry, TxReceipt};
use crate::registry::types::{DogRecord, DogRegistration};
use crate::types::{DogId, Sex};
use crate::wallet::LocalWallet;

sol! {
    #[sol(rpc)]
    contract PedigreePal {
        struct Dog {
            uint256 id;
            string name;
            string breed;
            uint8 sex;
            uint256 age;
            uint256 mother;
            uint256 father;
        }

        /// Emitted when a dog is added to the registry.
        event DogRegistered(uint256 indexed dogId, address indexed owner);

        function registerDog(string name, string breed, uint8 sex, uint256 age, uint256 mother, uint256 father) external;
        function retrieveDog(uint256 dogId) external view returns (Dog memory);
        function dogCount() external view returns (uint256);
    }
}

/// Registry reached over JSON-RPC, signing with a [`LocalWallet`].
pub struct ContractRegistry {
    wallet: Arc<LocalWallet>,
    address: Address,
    poll_interval: Duration,
}

impl ContractRegistry {
    /// # Arguments
    /// * `wallet` - Signing agent; its current network decides the RPC endpoint
    /// * `address` - Deployed `PedigreePal` contract
    /// * `poll_interval` - Delay between receipt polls
    pub fn new(wallet: Arc<LocalWallet>, address: Address, poll_interval: Duration) -> Self {
        Self {
            wallet,
            address,
            poll_interval,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn instance(&self) -> Result<PedigreePal::PedigreePalInstance<DynProvider>, ProviderError> {
        Ok(PedigreePal::new(self.address, self.wallet.provider()?))
    }
}

#[async_trait]
impl Registry for ContractRegistry {
    async fn register_dog(&self, from: Address, dog: &DogRegistration) -> Result<TxHash, ProviderError> {
        let contract = self.instance()?;
        let pending = contract
            .registerDog(
                dog.name.clone(),
                dog.breed.clone(),
                dog.sex.as_u8(),
                U256::from(dog.age),
                U256::from(DogId::to_wire(dog.mother_id)),
                U256::from(DogId::to_wire(dog.father_id)),
            )
            .from(from)
            .send()
            .await
            .map_err(contract_error)?;

        let hash = *pending.tx_hash();
        tracing::debug!(tx_hash = %hash, from = %from, "registerDog broadcast");
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, ProviderError> {
        let provider = self.wallet.provider()?;
        let mut ticker = interval(self.poll_interval);

        loop {
            ticker.tick().await;

            match provider
                .get_transaction_receipt(hash)
                .await
                .map_err(transport_error)?
            {
                Some(receipt) => return Ok(decode_receipt(hash, &receipt)),
                None => tracing::debug!(tx_hash = %hash, "Transaction pending"),
            }
        }
    }

    async fn retrieve_dog(&self, id: DogId) -> Result<Option<DogRecord>, ProviderError> {
        let dog = self
            .instance()?
            .retrieveDog(U256::from(id.0))
            .call()
            .await
            .map_err(contract_error)?;
        decode_dog(dog)
    }

    async fn dog_count(&self) -> Result<u64, ProviderError> {
        let count = self
            .instance()?
            .dogCount()
            .call()
            .await
            .map_err(contract_error)?;
        to_u64("dogCount", count)
    }
}

impl std::fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractRegistry")
            .field("address", &self.address)
            .field("chain_id", &self.wallet.current_chain())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

fn decode_receipt(hash: TxHash, receipt: &TransactionReceipt) -> TxReceipt {
    let registered_id = receipt
        .inner
        .logs()
        .iter()
        .filter_map(|log| log.log_decode::<PedigreePal::DogRegistered>().ok())
        .find_map(|decoded| u64::try_from(decoded.inner.dogId).ok())
        .and_then(DogId::from_wire);

    TxReceipt {
        hash,
        success: receipt.status(),
        block_number: receipt.block_number,
        registered_id,
    }
}

/// A zeroed struct is how the contract answers for an unknown id.
fn decode_dog(dog: PedigreePal::Dog) -> Result<Option<DogRecord>, ProviderError> {
    let Some(id) = DogId::from_wire(to_u64("id", dog.id)?) else {
        return Ok(None);
    };
    let sex = Sex::from_u8(dog.sex)
        .ok_or_else(|| ProviderError::internal(format!("Unknown sex code {} for dog {}", dog.sex, id)))?;

    Ok(Some(DogRecord {
        id,
        name: dog.name,
        breed: dog.breed,
        sex,
        age: to_u64("age", dog.age)?,
        mother_id: DogId::from_wire(to_u64("mother", dog.mother)?),
        father_id: DogId::from_wire(to_u64("father", dog.father)?),
    }))
}

fn to_u64(field: &str, value: U256) -> Result<u64, ProviderError> {
    u64::try_from(value)
        .map_err(|_| ProviderError::internal(format!("Registry returned out of range {field}: {value}")))
}

/// Keep the node's JSON-RPC error payload so classification can see its code.
fn transport_error(err: TransportError) -> ProviderError {
    match err.as_error_resp() {
        Some(payload) => ProviderError {
            code: payload.code,
            message: payload.message.to_string(),
            data: payload
                .data
                .as_ref()
                .and_then(|raw| serde_json::from_str(raw.get()).ok()),
        },
        None => ProviderError::internal(err.to_string()),
    }
}

fn contract_error(err: alloy::contract::Error) -> ProviderError {
    match err {
        alloy::contract::Error::TransportError(err) => transport_error(err),
        other => ProviderError::internal(other.to_string()),
    }
}
