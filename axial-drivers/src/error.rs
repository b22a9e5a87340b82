//! Driver errors

use core::fmt;

use axial_hal::{push_truncated, ChannelError};
use heapless::Vec;

use crate::component::Name;
use crate::composite::MAX_MEMBERS;

/// One member's failure during a composite operation
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemberFailure {
    /// Name of the failing member
    pub name: Name,
    pub error: ChannelError,
}

/// Failures collected by a composite open/close
///
/// Every member is attempted; this holds each failure in member order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompositeError {
    failures: Vec<MemberFailure, MAX_MEMBERS>,
}

impl CompositeError {
    pub(crate) fn push(&mut self, name: &str, error: ChannelError) {
        let mut failure = MemberFailure {
            name: Name::new(),
            error,
        };
        push_truncated(&mut failure.name, name);
        // Capacity matches the member limit, so this cannot overflow
        let _ = self.failures.push(failure);
    }

    pub fn failures(&self) -> &[MemberFailure] {
        &self.failures
    }

    /// First failure, if any
    pub fn first(&self) -> Option<&MemberFailure> {
        self.failures.first()
    }

    /// Check if a named member failed
    pub fn contains(&self, name: &str) -> bool {
        self.failures.iter().any(|f| f.name.as_str() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok` if nothing failed
    pub(crate) fn into_result(self) -> Result<(), CompositeError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} member(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.name, failure.error)?;
        }
        Ok(())
    }
}

/// Joint errors
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JointError {
    /// A single channel command or query failed
    Channel(ChannelError),
    /// Opening or closing the joint's channels failed
    Composite(CompositeError),
}

impl From<ChannelError> for JointError {
    fn from(e: ChannelError) -> Self {
        JointError::Channel(e)
    }
}

impl From<CompositeError> for JointError {
    fn from(e: CompositeError) -> Self {
        JointError::Composite(e)
    }
}

impl fmt::Display for JointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JointError::Channel(e) => write!(f, "channel error: {}", e),
            JointError::Composite(e) => write!(f, "composite error: {}", e),
        }
    }
}
