//! Resolves chain id, RPC endpoint and signing key from flags and the
//! environment.
//!
//! Flags always win. After that the botchan-specific variable is consulted,
//! then the shared `NET_*` one. Empty values count as unset.

use alloy::signers::local::PrivateKeySigner;
use url::Url;

/// Base mainnet.
pub const DEFAULT_CHAIN_ID: u64 = 8453;
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;

pub const CHAIN_ID_VARS: &[&str] = &["BOTCHAN_CHAIN_ID", "NET_CHAIN_ID"];
pub const RPC_URL_VARS: &[&str] = &["BOTCHAN_RPC_URL", "NET_RPC_URL"];
pub const PRIVATE_KEY_VARS: &[&str] = &["BOTCHAN_PRIVATE_KEY", "NET_PRIVATE_KEY", "PRIVATE_KEY"];

const ENCODE_ONLY_HINT: &str =
    ", or use --encode-only to output transaction data without submitting";

/// Length of a `0x`-prefixed 32 byte hex key.
const PRIVATE_KEY_LEN: usize = 66;

/// Public endpoint used when no RPC URL is configured.
pub fn default_rpc_url(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        DEFAULT_CHAIN_ID => Some("https://mainnet.base.org"),
        BASE_SEPOLIA_CHAIN_ID => Some("https://sepolia.base.org"),
        _ => None,
    }
}

/// Options for commands that never sign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadOnlyOptions {
    pub chain_id: u64,
    pub rpc_url: Option<Url>,
}

impl ReadOnlyOptions {
    pub fn from_env(chain_id: Option<u64>, rpc_url: Option<Url>) -> Result<Self, OptionsError> {
        Self::resolve(chain_id, rpc_url, process_env)
    }

    pub fn resolve(
        chain_id: Option<u64>,
        rpc_url: Option<Url>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, OptionsError> {
        Ok(Self {
            chain_id: resolve_chain_id(chain_id, &env)?,
            rpc_url: resolve_rpc_url(rpc_url, &env)?,
        })
    }

    /// The configured endpoint, or the chain's public default.
    pub fn endpoint(&self) -> Result<Url, OptionsError> {
        if let Some(url) = &self.rpc_url {
            return Ok(url.clone());
        }
        let default = default_rpc_url(self.chain_id).ok_or(OptionsErrorKind::NoRpcUrl {
            chain_id: self.chain_id,
        })?;
        Ok(Url::parse(default).map_err(|source| OptionsErrorKind::InvalidRpcUrl {
            value: default.to_owned(),
            source,
        })?)
    }
}

/// Options for commands that sign and broadcast.
#[derive(Clone, Debug)]
pub struct CommonOptions {
    pub signer: PrivateKeySigner,
    pub chain_id: u64,
    pub rpc_url: Option<Url>,
}

/// Where the private key came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySource {
    Flag,
    Env(&'static str),
}

impl CommonOptions {
    pub fn from_env(
        private_key: Option<&str>,
        chain_id: Option<u64>,
        rpc_url: Option<Url>,
        supports_encode_only: bool,
    ) -> Result<(Self, KeySource), OptionsError> {
        Self::resolve(
            private_key,
            chain_id,
            rpc_url,
            supports_encode_only,
            process_env,
        )
    }

    /// Resolves the signing options. A key passed as a flag is accepted but
    /// reported as [`KeySource::Flag`] so the caller can warn about it.
    pub fn resolve(
        private_key: Option<&str>,
        chain_id: Option<u64>,
        rpc_url: Option<Url>,
        supports_encode_only: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(Self, KeySource), OptionsError> {
        let (key, source) = match private_key.filter(|k| !k.is_empty()) {
            Some(key) => (key.to_owned(), KeySource::Flag),
            None => first_env(PRIVATE_KEY_VARS, &env)
                .map(|(name, key)| (key, KeySource::Env(name)))
                .ok_or(OptionsErrorKind::MissingPrivateKey {
                    hint: if supports_encode_only {
                        ENCODE_ONLY_HINT
                    } else {
                        ""
                    },
                })?,
        };

        let signer = parse_private_key(&key)?;
        let read_only = ReadOnlyOptions::resolve(chain_id, rpc_url, env)?;
        Ok((
            Self {
                signer,
                chain_id: read_only.chain_id,
                rpc_url: read_only.rpc_url,
            },
            source,
        ))
    }

    pub fn read_only(&self) -> ReadOnlyOptions {
        ReadOnlyOptions {
            chain_id: self.chain_id,
            rpc_url: self.rpc_url.clone(),
        }
    }
}

fn parse_private_key(key: &str) -> Result<PrivateKeySigner, OptionsError> {
    if !key.starts_with("0x") || key.len() != PRIVATE_KEY_LEN {
        return Err(OptionsErrorKind::MalformedPrivateKey.into());
    }
    let signer = key
        .parse::<PrivateKeySigner>()
        .map_err(|_| OptionsErrorKind::MalformedPrivateKey)?;
    Ok(signer)
}

fn resolve_chain_id(
    flag: Option<u64>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<u64, OptionsError> {
    if let Some(chain_id) = flag {
        return Ok(chain_id);
    }
    match first_env(CHAIN_ID_VARS, env) {
        Some((name, value)) => value.trim().parse().map_err(|source| {
            OptionsError::from(OptionsErrorKind::InvalidChainId {
                name,
                value,
                source,
            })
        }),
        None => Ok(DEFAULT_CHAIN_ID),
    }
}

fn resolve_rpc_url(
    flag: Option<Url>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Option<Url>, OptionsError> {
    if flag.is_some() {
        return Ok(flag);
    }
    first_env(RPC_URL_VARS, env)
        .map(|(_, value)| {
            Url::parse(&value).map_err(|source| {
                OptionsError::from(OptionsErrorKind::InvalidRpcUrl { value, source })
            })
        })
        .transpose()
}

fn first_env(
    names: &[&'static str],
    env: &impl Fn(&str) -> Option<String>,
) -> Option<(&'static str, String)> {
    names
        .iter()
        .find_map(|&name| env(name).filter(|v| !v.is_empty()).map(|v| (name, v)))
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct OptionsError(OptionsErrorKind);

impl From<OptionsErrorKind> for OptionsError {
    fn from(value: OptionsErrorKind) -> Self {
        Self(value)
    }
}

#[derive(Debug, thiserror::Error)]
enum OptionsErrorKind {
    #[error(
        "private key is required; provide it via --private-key or the \
         BOTCHAN_PRIVATE_KEY/NET_PRIVATE_KEY environment variable{hint}"
    )]
    MissingPrivateKey { hint: &'static str },
    #[error("invalid private key format (must be 0x-prefixed, 66 characters)")]
    MalformedPrivateKey,
    #[error("env var `{name}` is not a valid chain id: `{value}`")]
    InvalidChainId {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("`{value}` is not a valid RPC URL")]
    InvalidRpcUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("no RPC URL configured for chain {chain_id}; pass --rpc-url or set BOTCHAN_RPC_URL")]
    NoRpcUrl { chain_id: u64 },
}
