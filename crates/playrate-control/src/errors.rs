//! Control-side error types.

use playrate_core::ProtocolError;
use playrate_settings::StoreError;
use thiserror::Error;

use crate::tabs::TabId;

/// A single message or injection attempt failed.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Nothing in the tab is listening for messages.
    #[error("no page agent is listening in tab {0}")]
    NoReceiver(TabId),
    /// The tab id does not refer to an open tab.
    #[error("tab {0} does not exist")]
    NoSuchTab(TabId),
    /// The browser refused to run the agent script in the tab.
    #[error("cannot inject page agent into tab {tab}: {reason}")]
    InjectionRefused {
        /// Target tab.
        tab: TabId,
        /// Browser-supplied reason.
        reason: String,
    },
    /// The agent answered with an error.
    #[error("page agent in tab {tab} rejected message: {reason}")]
    Rejected {
        /// Target tab.
        tab: TabId,
        /// The agent's error text.
        reason: String,
    },
    /// The reply could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// A dispatcher or popup operation failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Injecting the agent did not succeed.
    #[error("injection into tab {tab} failed: {source}")]
    InjectionFailed {
        /// Target tab.
        tab: TabId,
        /// Underlying failure.
        #[source]
        source: TransportError,
    },
    /// The retried delivery after injection failed as well.
    #[error("delivery to tab {tab} failed after injection: {source}")]
    DeliveryFailed {
        /// Target tab.
        tab: TabId,
        /// Underlying failure.
        #[source]
        source: TransportError,
    },
    /// Reading or writing the settings store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for dispatcher operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
