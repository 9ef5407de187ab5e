//! Transition Policy
//!
//! Decides which status may follow which. The store evaluates the policy
//! against the locked current status, so the check and the write see the
//! same row version.

use serde::{Deserialize, Serialize};

use crate::error::GrievanceError;
use crate::types::GrievanceStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any status may follow any other, including re-opening a closed grievance.
    #[default]
    Permissive,
    /// Status rank never decreases and `closed` is terminal.
    ForwardOnly,
}

impl TransitionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::ForwardOnly => "forward_only",
        }
    }

    pub fn allows(&self, from: GrievanceStatus, to: GrievanceStatus) -> bool {
        match self {
            Self::Permissive => true,
            Self::ForwardOnly => from != GrievanceStatus::Closed && to.rank() >= from.rank(),
        }
    }

    pub fn check(&self, from: GrievanceStatus, to: GrievanceStatus) -> Result<(), GrievanceError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(GrievanceError::InvalidArgument(format!(
                "transition {from} -> {to} not allowed under {} policy",
                self.as_str()
            )))
        }
    }
}

impl std::str::FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permissive" => Ok(Self::Permissive),
            "forward_only" => Ok(Self::ForwardOnly),
            _ => Err(format!("Unknown transition policy: {}", s)),
        }
    }
}
