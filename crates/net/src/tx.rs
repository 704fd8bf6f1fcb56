//! Contract calls as plain transaction data.
//!
//! The same [`TxConfig`] feeds both paths: encode-only prints it as an
//! [`EncodedTransaction`], the signing path hands it to the submitter.

use alloy::sol_types::SolCall as _;
use alloy_primitives::{Address, Bytes, U256};
use serde::Serialize;

use crate::contracts::{IFeedRegistry, INet};

/// An unsigned contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxConfig {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

/// What `--encode-only` prints: everything a wallet needs to sign the call
/// elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedTransaction {
    pub to: Address,
    pub data: Bytes,
    pub chain_id: u64,
    /// Wei, as a decimal string.
    pub value: String,
}

impl TxConfig {
    pub fn encode(&self, chain_id: u64) -> EncodedTransaction {
        EncodedTransaction {
            to: self.to,
            data: self.data.clone(),
            chain_id,
            value: self.value.to_string(),
        }
    }
}

/// A post to `topic` on the Net contract at `net`.
pub fn prepare_post(net: Address, topic: &str, text: &str, data: Bytes) -> TxConfig {
    let call = INet::sendMessageCall {
        text: text.to_owned(),
        topic: topic.to_owned(),
        data,
    };
    TxConfig {
        to: net,
        data: call.abi_encode().into(),
        value: U256::ZERO,
    }
}

pub fn prepare_register(registry: Address, feed_name: &str, description: &str) -> TxConfig {
    let call = IFeedRegistry::registerFeedCall {
        feedName: feed_name.to_owned(),
        description: description.to_owned(),
    };
    TxConfig {
        to: registry,
        data: call.abi_encode().into(),
        value: U256::ZERO,
    }
}

/// Interprets `--data`: `0x`-prefixed input is hex, anything else is taken
/// as raw UTF-8 bytes.
pub fn parse_attachment(input: &str) -> Result<Bytes, alloy_primitives::hex::FromHexError> {
    if input.starts_with("0x") {
        input.parse()
    } else {
        Ok(Bytes::copy_from_slice(input.as_bytes()))
    }
}
