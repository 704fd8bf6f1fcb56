//! Read-only queries against the feed registry.

use alloy::{
    network::TransactionBuilder as _,
    primitives::{Address, U256},
    providers::{Provider as _, ProviderBuilder},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
    transports::TransportError,
};
use serde::Serialize;
use url::Url;

use crate::{
    contracts::IFeedRegistry,
    options::{OptionsError, ReadOnlyOptions},
};

/// Feeds listed when the caller gives no limit.
pub const DEFAULT_FEED_LIMIT: u64 = 50;

/// A registry entry as printed by `feeds --json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedInfo {
    pub name: String,
    pub description: String,
    pub registrant: Address,
    /// Unix seconds.
    pub registered_at: u64,
}

impl From<IFeedRegistry::RegisteredFeed> for FeedInfo {
    fn from(feed: IFeedRegistry::RegisteredFeed) -> Self {
        Self {
            name: feed.feedName,
            description: feed.description,
            registrant: feed.registrant,
            registered_at: feed.registeredAt,
        }
    }
}

/// `eth_call` access to one registry deployment.
#[derive(Clone, Debug)]
pub struct FeedRegistry {
    address: Address,
    rpc_url: Url,
}

impl FeedRegistry {
    pub fn new(address: Address, options: &ReadOnlyOptions) -> Result<Self, RegistryError> {
        let rpc_url = options.endpoint().map_err(RegistryErrorKind::Endpoint)?;
        Ok(Self { address, rpc_url })
    }

    pub async fn is_registered(&self, feed_name: &str) -> Result<bool, RegistryError> {
        self.call(IFeedRegistry::isFeedRegisteredCall {
            feedName: feed_name.to_owned(),
        })
        .await
    }

    /// Up to `limit` feeds in registration order.
    pub async fn registered_feeds(&self, limit: u64) -> Result<Vec<FeedInfo>, RegistryError> {
        let feeds = self
            .call(IFeedRegistry::getRegisteredFeedsCall {
                offset: U256::ZERO,
                limit: U256::from(limit),
            })
            .await?;
        Ok(feeds.into_iter().map(FeedInfo::from).collect())
    }

    async fn call<C: SolCall>(&self, call: C) -> Result<C::Return, RegistryError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let request = TransactionRequest::default()
            .with_to(self.address)
            .with_input(call.abi_encode());

        tracing::debug!(
            registry = %self.address,
            function = C::SIGNATURE,
            "calling feed registry"
        );

        let output = provider
            .call(request)
            .await
            .map_err(|source| RegistryErrorKind::Call {
                function: C::SIGNATURE,
                source,
            })?;

        Ok(
            C::abi_decode_returns(&output).map_err(|source| RegistryErrorKind::Decode {
                function: C::SIGNATURE,
                source,
            })?,
        )
    }
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct RegistryError(RegistryErrorKind);

impl From<RegistryErrorKind> for RegistryError {
    fn from(value: RegistryErrorKind) -> Self {
        Self(value)
    }
}

#[derive(Debug, thiserror::Error)]
enum RegistryErrorKind {
    #[error("failed resolving the RPC endpoint")]
    Endpoint(#[source] OptionsError),
    #[error("registry call `{function}` failed")]
    Call {
        function: &'static str,
        #[source]
        source: TransportError,
    },
    #[error("registry returned data that does not decode as `{function}`")]
    Decode {
        function: &'static str,
        #[source]
        source: alloy::sol_types::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn unknown_chain_without_rpc_is_rejected() {
        let registry = address!("0x1111111111111111111111111111111111111111");
        let options = ReadOnlyOptions {
            chain_id: 31337,
            rpc_url: None,
        };
        assert!(FeedRegistry::new(registry, &options).is_err());
    }

    #[test]
    fn registry_entries_serialize_for_json_output() {
        let feed = FeedInfo::from(IFeedRegistry::RegisteredFeed {
            feedName: "general".to_owned(),
            description: "anything goes".to_owned(),
            registrant: address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            registeredAt: 1_700_000_000,
        });
        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["name"], "general");
        assert_eq!(json["registeredAt"], 1_700_000_000u64);
        assert_eq!(
            json["registrant"].as_str().unwrap().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn feed_list_decodes_from_return_data() {
        let feeds = vec![IFeedRegistry::RegisteredFeed {
            feedName: "general".to_owned(),
            description: String::new(),
            registrant: Address::ZERO,
            registeredAt: 7,
        }];
        let encoded = IFeedRegistry::getRegisteredFeedsCall::abi_encode_returns(&feeds);
        let decoded = IFeedRegistry::getRegisteredFeedsCall::abi_decode_returns(&encoded).unwrap();
        let decoded: Vec<FeedInfo> = decoded.into_iter().map(FeedInfo::from).collect();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].name, "general");
        assert_eq!(decoded[0].registered_at, 7);
    }
}
