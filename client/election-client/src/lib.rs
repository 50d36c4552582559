#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

mod actions;
/// Contract interface descriptions (bare ABIs and Truffle build artifacts).
pub mod artifact;
mod candidate;
/// Client configuration and the TOML loader.
pub mod config;
/// The contract seam and the calls it accepts.
pub mod contract;
mod error;
/// `ethers`-backed implementation of [`ElectionContract`].
pub mod eth;
/// Typed contract events and per-kind event streams.
pub mod events;
mod guard;
#[cfg(feature = "mocks")]
pub mod mocks;
/// Provider detection and account binding.
pub mod provider;
mod render;
mod session;
mod subscriber;
/// The rendering-agnostic view model.
pub mod view;

pub use actions::ActionOutcome;
pub use candidate::{Candidate, CandidateStatus};
pub use config::{from_toml_path, ClientConfig, ContractConfig, ProviderConfig};
pub use contract::{ElectionCall, ElectionContract};
pub use error::ClientError;
pub use events::{ElectionEvent, EventKind, EventStream};
pub use guard::{GuardPolicy, PendingFlag, PendingGuard};
pub use session::ElectionSession;
pub use subscriber::Subscriptions;
pub use view::ViewState;
