//! Steam result codes.
//!
//! Subset of the Steamworks `EResult` enumeration that the workshop calls
//! actually report. Unknown values are kept verbatim in [`ResultCode::Other`]
//! so no information is lost when a failure is surfaced.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result code reported by the workshop service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ResultCode {
    Ok,
    Fail,
    NoConnection,
    InvalidParam,
    FileNotFound,
    Busy,
    InvalidState,
    InvalidName,
    DuplicateName,
    AccessDenied,
    Timeout,
    Banned,
    ServiceUnavailable,
    NotLoggedOn,
    InsufficientPrivilege,
    LimitExceeded,
    LockingFailed,
    IoFailure,
    Other(i32),
}

impl ResultCode {
    /// Numeric `EResult` value.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 1,
            Self::Fail => 2,
            Self::NoConnection => 3,
            Self::InvalidParam => 8,
            Self::FileNotFound => 9,
            Self::Busy => 10,
            Self::InvalidState => 11,
            Self::InvalidName => 12,
            Self::DuplicateName => 14,
            Self::AccessDenied => 15,
            Self::Timeout => 16,
            Self::Banned => 17,
            Self::ServiceUnavailable => 20,
            Self::NotLoggedOn => 21,
            Self::InsufficientPrivilege => 24,
            Self::LimitExceeded => 25,
            Self::LockingFailed => 33,
            Self::IoFailure => 37,
            Self::Other(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Human readable explanation, as shown to the operator.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Fail => "generic failure",
            Self::NoConnection => "no connection to Steam",
            Self::InvalidParam => "invalid parameter (check title, tags and preview size)",
            Self::FileNotFound => "file or item not found",
            Self::Busy => "Steam is busy, try again later",
            Self::InvalidState => "item is in an invalid state",
            Self::InvalidName => "invalid name",
            Self::DuplicateName => "duplicate name",
            Self::AccessDenied => "access denied (is the workshop legal agreement accepted?)",
            Self::Timeout => "operation timed out",
            Self::Banned => "account is banned from the workshop",
            Self::ServiceUnavailable => "workshop service unavailable",
            Self::NotLoggedOn => "not logged on to Steam",
            Self::InsufficientPrivilege => "insufficient privilege",
            Self::LimitExceeded => "quota or size limit exceeded",
            Self::LockingFailed => "failed to acquire the item lock",
            Self::IoFailure => "I/O failure",
            Self::Other(_) => "unrecognized result",
        }
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        match code {
            1 => Self::Ok,
            2 => Self::Fail,
            3 => Self::NoConnection,
            8 => Self::InvalidParam,
            9 => Self::FileNotFound,
            10 => Self::Busy,
            11 => Self::InvalidState,
            12 => Self::InvalidName,
            14 => Self::DuplicateName,
            15 => Self::AccessDenied,
            16 => Self::Timeout,
            17 => Self::Banned,
            20 => Self::ServiceUnavailable,
            21 => Self::NotLoggedOn,
            24 => Self::InsufficientPrivilege,
            25 => Self::LimitExceeded,
            33 => Self::LockingFailed,
            37 => Self::IoFailure,
            other => Self::Other(other),
        }
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.describe(), self.code())
    }
}
