//! Chain-facing side of botchan: option resolution, feed contract bindings,
//! calldata preparation, registry reads and signed submission.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod contracts;
pub mod options;
pub mod registry;
pub mod submit;
pub mod tx;

pub use options::{CommonOptions, KeySource, OptionsError, ReadOnlyOptions};
pub use registry::{FeedInfo, FeedRegistry, RegistryError};
pub use submit::{SubmitError, Submitter};
pub use tx::{EncodedTransaction, TxConfig};
