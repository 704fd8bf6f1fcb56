//! Signs and broadcasts prepared calls.

use alloy::{
    network::{EthereumWallet, TransactionBuilder as _},
    primitives::{Address, B256},
    providers::{PendingTransactionError, Provider as _, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::TransportError,
};
use url::Url;

use crate::{
    options::{CommonOptions, OptionsError},
    tx::TxConfig,
};

/// Sends transactions from a local key to one chain.
#[derive(Clone, Debug)]
pub struct Submitter {
    chain_id: u64,
    rpc_url: Url,
    signer: PrivateKeySigner,
}

impl Submitter {
    pub fn new(options: &CommonOptions) -> Result<Self, SubmitError> {
        let rpc_url = options
            .read_only()
            .endpoint()
            .map_err(SubmitErrorKind::Endpoint)?;
        Ok(Self {
            chain_id: options.chain_id,
            rpc_url,
            signer: options.signer.clone(),
        })
    }

    /// Address the transactions are sent from.
    pub fn sender(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Broadcasts `tx` and waits until it is included. A reverted receipt is
    /// an error.
    pub async fn submit(&self, tx: &TxConfig) -> Result<B256, SubmitError> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.rpc_url.clone());

        let request = TransactionRequest::default()
            .with_to(tx.to)
            .with_input(tx.data.clone())
            .with_value(tx.value)
            .with_chain_id(self.chain_id);

        tracing::info!(
            chain_id = self.chain_id,
            to = %tx.to,
            from = %self.sender(),
            "submitting transaction"
        );

        let pending = provider
            .send_transaction(request)
            .await
            .map_err(SubmitErrorKind::Send)?;
        let tx_hash = *pending.tx_hash();

        tracing::info!(
            chain_id = self.chain_id,
            %tx_hash,
            "transaction submitted, waiting for confirmation"
        );

        let receipt = pending
            .get_receipt()
            .await
            .map_err(SubmitErrorKind::Receipt)?;

        if !receipt.status() {
            return Err(SubmitErrorKind::Reverted { tx_hash }.into());
        }

        tracing::info!(
            chain_id = self.chain_id,
            %tx_hash,
            block = ?receipt.block_number,
            "transaction confirmed"
        );

        Ok(tx_hash)
    }
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct SubmitError(SubmitErrorKind);

impl From<SubmitErrorKind> for SubmitError {
    fn from(value: SubmitErrorKind) -> Self {
        Self(value)
    }
}

#[derive(Debug, thiserror::Error)]
enum SubmitErrorKind {
    #[error("failed resolving the RPC endpoint")]
    Endpoint(#[source] OptionsError),
    #[error("failed sending transaction")]
    Send(#[source] TransportError),
    #[error("failed waiting for transaction receipt")]
    Receipt(#[source] PendingTransactionError),
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: B256 },
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn options(chain_id: u64, rpc_url: Option<&str>) -> CommonOptions {
        CommonOptions {
            signer: KEY.parse().unwrap(),
            chain_id,
            rpc_url: rpc_url.map(|u| u.parse().unwrap()),
        }
    }

    #[test]
    fn sender_is_the_key_address() {
        let submitter = Submitter::new(&options(8453, None)).unwrap();
        assert_eq!(
            submitter.sender().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        assert_eq!(submitter.chain_id(), 8453);
    }

    #[test]
    fn unknown_chain_without_rpc_is_rejected() {
        assert!(Submitter::new(&options(31337, None)).is_err());
        assert!(Submitter::new(&options(31337, Some("http://localhost:8545"))).is_ok());
    }
}
