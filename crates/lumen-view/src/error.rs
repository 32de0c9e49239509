#![forbid(unsafe_code)]

//! Errors from core creation and binding.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | No factory | View type never registered | View stays `NoCore` |
//! | Factory error | Platform refused to build the core | View stays `NoCore` |
//! | Binding error | Core returned one of the view's own properties | Core is released |

use std::fmt;

use lumen_runtime::BindError;

use crate::registry::ViewTypeId;

/// Failure reported by a core constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub view_type: ViewTypeId,
    pub reason: String,
}

impl CoreError {
    pub fn new(view_type: ViewTypeId, reason: impl Into<String>) -> Self {
        Self {
            view_type,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot create {} core: {}", self.view_type, self.reason)
    }
}

impl std::error::Error for CoreError {}

/// Errors surfaced by view operations that may create a core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// No constructor is registered for the view type.
    NoCoreFactory(ViewTypeId),
    /// The registered constructor failed.
    CoreCreation(CoreError),
    /// Linking a view property to its core counterpart failed.
    Binding(BindError),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCoreFactory(view_type) => {
                write!(f, "no core factory registered for view type '{view_type}'")
            }
            Self::CoreCreation(err) => write!(f, "{err}"),
            Self::Binding(err) => write!(f, "core binding failed: {err}"),
        }
    }
}

impl std::error::Error for ViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoCoreFactory(_) => None,
            Self::CoreCreation(err) => Some(err),
            Self::Binding(err) => Some(err),
        }
    }
}

impl From<CoreError> for ViewError {
    fn from(err: CoreError) -> Self {
        Self::CoreCreation(err)
    }
}

impl From<BindError> for ViewError {
    fn from(err: BindError) -> Self {
        Self::Binding(err)
    }
}
