//! Workshop error types.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use moduploader_protocol::{AppId, PublishedFileId, ResultCode};

use crate::types::Phase;

/// Reason an existing item cannot be updated by this operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    NotFound,
    QueryFailed(ResultCode),
    WrongApp { expected: AppId, actual: AppId },
    NotAuthor,
    NotModCategory,
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "item not found"),
            Self::QueryFailed(code) => write!(f, "item query failed: {code}"),
            Self::WrongApp { expected, actual } => {
                write!(f, "item belongs to app {actual}, not {expected}")
            }
            Self::NotAuthor => write!(f, "you are not the author of this item"),
            Self::NotModCategory => write!(f, "item is not a mod"),
        }
    }
}

/// Errors produced while resolving or publishing a workshop item.
#[derive(Debug, thiserror::Error)]
pub enum WorkshopError {
    #[error("invalid item: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{} cannot be updated: {}", describe_item(.title, .id), join(.reasons))]
    Ineligible {
        id: PublishedFileId,
        title: Option<String>,
        reasons: Vec<Ineligibility>,
    },

    #[error("no payload ({}) found in {}", .extensions.join(", "), .dir.display())]
    NoPayloadFound {
        dir: PathBuf,
        extensions: Vec<String>,
    },

    #[error("{phase} failed for {}: {code}", item_label(.item))]
    Service {
        phase: Phase,
        code: ResultCode,
        item: Option<PublishedFileId>,
    },

    #[error("cannot lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{phase} timed out after {after:?}")]
    Timeout { phase: Phase, after: Duration },

    #[error("{phase} cancelled")]
    Cancelled { phase: Phase },

    #[error("workshop service dropped the pending {phase} call")]
    Disconnected { phase: Phase },

    #[error("steam error: {0}")]
    Steam(#[from] moduploader_steam::SteamError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkshopError {
    /// Returns true if another attempt of the same phase may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Service { .. } | Self::Disconnected { .. })
    }

    /// Phase the error was raised in, when it comes from a service call.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Service { phase, .. }
            | Self::Timeout { phase, .. }
            | Self::Cancelled { phase }
            | Self::Disconnected { phase } => Some(*phase),
            Self::Validation(_) => Some(Phase::Validate),
            Self::Ineligible { .. } => Some(Phase::Resolve),
            Self::NoPayloadFound { .. } | Self::Lock { .. } => Some(Phase::Guard),
            Self::Steam(_) | Self::Io(_) => None,
        }
    }
}

fn join(reasons: &[Ineligibility]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_item(title: &Option<String>, id: &PublishedFileId) -> String {
    match title.as_deref() {
        Some(title) if !title.is_empty() => format!("{title} ({id})"),
        _ => format!("item {id}"),
    }
}

fn item_label(item: &Option<PublishedFileId>) -> String {
    match item {
        Some(id) => format!("item {id}"),
        None => "new item".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ineligible_lists_every_reason() {
        let err = WorkshopError::Ineligible {
            id: PublishedFileId(9),
            title: Some("Road Tool".into()),
            reasons: vec![
                Ineligibility::WrongApp {
                    expected: AppId(255_710),
                    actual: AppId(440),
                },
                Ineligibility::NotAuthor,
                Ineligibility::NotModCategory,
            ],
        };
        assert_eq!(
            err.to_string(),
            "Road Tool (9) cannot be updated: item belongs to app 440, not 255710; \
             you are not the author of this item; item is not a mod"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn service_error_names_phase_code_and_item() {
        let err = WorkshopError::Service {
            phase: Phase::Upload,
            code: ResultCode::LimitExceeded,
            item: Some(PublishedFileId(12345)),
        };
        assert_eq!(
            err.to_string(),
            "upload failed for item 12345: quota or size limit exceeded (25)"
        );
        assert!(err.is_retryable());
        assert_eq!(err.phase(), Some(Phase::Upload));
    }

    #[test]
    fn validation_joins_reasons() {
        let err = WorkshopError::Validation(vec!["title is required".into(), "no content".into()]);
        assert_eq!(err.to_string(), "invalid item: title is required; no content");
        assert!(!err.is_retryable());
    }

    #[test]
    fn lock_errors_are_not_retried() {
        let err = WorkshopError::Lock {
            path: PathBuf::from("/mods/foo/Foo.dll"),
            source: std::io::Error::new(std::io::ErrorKind::WouldBlock, "locked"),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.phase(), Some(Phase::Guard));
    }
}
