#![forbid(unsafe_code)]

//! The capability contract between views and platform cores.
//!
//! A core is the platform object behind a view. Lumen never looks inside
//! it: a core only exposes [`Property`] handles named after the view's core
//! properties, and the view links its own properties to them in the
//! direction each property declares.
//!
//! # Core lifecycle
//!
//! ```text
//! NoCore ──► CoreCreationPending ──► CoreBound ──► CoreDetaching ──► NoCore
//!               │ factory failed                      (unbind, drop)
//!               └──────────────► NoCore
//! ```

use lumen_core::Rect;
use lumen_runtime::Property;

use crate::registry::ViewTypeId;
use crate::view::View;

/// Core properties every view has.
pub trait ViewCore {
    /// View → core.
    fn visible(&self) -> &Property<bool>;
    /// Bidirectional: layout writes it, the platform may adjust it.
    fn geometry(&self) -> &Property<Rect>;
}

/// Ties a concrete view type to its core trait and creation snapshot.
pub trait CoreKind: View + Sized {
    /// The core trait objects of this view type implement.
    type Core: ViewCore + ?Sized + 'static;
    /// Property values handed to the core constructor.
    type Snapshot: 'static;

    /// Stable key in the [`CoreRegistry`](crate::CoreRegistry).
    const TYPE_ID: ViewTypeId;

    /// Capture the current property values.
    fn snapshot(&self) -> Self::Snapshot;
}

/// Where a view is in its core lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoreState {
    /// No platform object; writes are stored locally only.
    #[default]
    NoCore,
    /// The factory is running.
    CoreCreationPending,
    /// A core exists and the view's properties are linked to it.
    CoreBound,
    /// Links are being dropped ahead of releasing the core.
    CoreDetaching,
}
