//! Agent error types.

use thiserror::Error;

use crate::page::MediaId;

/// Failure applying a rate to one media element.
#[derive(Debug, Error, PartialEq)]
pub enum MediaError {
    /// The element is no longer in the document.
    #[error("media element {0} is detached")]
    Detached(MediaId),
    /// The element refused the rate.
    #[error("media element {id} rejected rate {rate}: {reason}")]
    Rejected {
        /// Element id.
        id: MediaId,
        /// The rate that was refused.
        rate: f64,
        /// Host-supplied reason.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display() {
        let err = MediaError::Rejected {
            id: 3,
            rate: 16.0,
            reason: "NotSupportedError".into(),
        };
        assert_eq!(
            err.to_string(),
            "media element 3 rejected rate 16: NotSupportedError"
        );
    }

    #[test]
    fn detached_display() {
        assert_eq!(MediaError::Detached(7).to_string(), "media element 7 is detached");
    }
}
