use std::path::PathBuf;

use thiserror::Error;

use crate::events::EventKind;

/// Errors produced while binding to or talking with the election contract.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The interface description could not be read from disk.
    #[error("failed to read contract interface from {path}: {source}")]
    ArtifactRead {
        /// Location of the description.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The interface description is not a valid ABI or build artifact.
    #[error("invalid contract interface: {0}")]
    ArtifactParse(#[from] serde_json::Error),
    /// The interface description lacks a method or event the client needs.
    #[error("contract interface has no {kind} named `{name}`")]
    MissingAbiItem {
        /// `"function"` or `"event"`.
        kind: &'static str,
        /// The missing item.
        name: &'static str,
    },
    /// No address was configured and the artifact has no deployment on the connected network.
    #[error("contract is not deployed on network {network_id}")]
    UnknownDeployment {
        /// Network id reported by the provider.
        network_id: String,
    },
    /// The provider could not be constructed or queried.
    #[error("provider error: {0}")]
    Provider(String),
    /// The configured signing key is unusable.
    #[error("invalid wallet key: {0}")]
    WalletKey(String),
    /// A read-only contract call failed.
    #[error("call to `{method}` failed: {reason}")]
    Call {
        /// Contract method.
        method: &'static str,
        /// Provider or contract error message.
        reason: String,
    },
    /// A transaction was rejected, reverted or dropped.
    #[error("transaction `{method}` failed: {reason}")]
    Transaction {
        /// Contract method.
        method: &'static str,
        /// Provider or contract error message.
        reason: String,
    },
    /// A value returned by the contract does not fit the client's data model.
    #[error("contract returned an out of range {field}")]
    OutOfRange {
        /// Offending field.
        field: &'static str,
    },
    /// An event could not be subscribed to or decoded.
    #[error("{kind} subscription failed: {reason}")]
    Subscription {
        /// Event kind of the subscription.
        kind: EventKind,
        /// Provider or decoding error message.
        reason: String,
    },
    /// No account is bound to the session, so nothing can be sent.
    #[error("no account is bound to this session")]
    NoAccount,
}
