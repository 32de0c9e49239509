#![forbid(unsafe_code)]

//! Views and platform core binding for Lumen.
//!
//! # Role in Lumen
//! `lumen-view` owns the platform-independent view tree. Every view keeps
//! its state in [`Property`](lumen_runtime::Property) fields and, once it
//! needs an on-screen presence, asks the [`CoreRegistry`] for a platform
//! core and binds its properties to the core's.
//!
//! # Primary responsibilities
//! - **View / ViewBase**: parent links, child management, core lifecycle.
//! - **Core binding**: the `NoCore → CoreCreationPending → CoreBound →
//!   CoreDetaching → NoCore` state machine.
//! - **CoreRegistry**: per-view-type core constructors.
//! - **Window / ContainerView**: the concrete views.
//! - **Headless backend**: in-memory cores for tests and displayless runs.

pub mod child;
pub mod config;
pub mod container;
pub mod error;
pub mod headless;
pub mod registry;
pub mod view;
pub mod view_core;
pub mod window;

pub use child::{ChildSlot, adopt, release};
pub use config::ViewConfig;
pub use container::{ContainerCore, ContainerSnapshot, ContainerView};
pub use error::{CoreError, ViewError};
pub use headless::{HeadlessBackend, HeadlessContainer, HeadlessWindow, TITLE_BAR_HEIGHT};
pub use registry::{CoreRegistry, ViewTypeId};
pub use view::{View, ViewBase, ViewId, ViewRef};
pub use view_core::{CoreKind, CoreState, ViewCore};
pub use window::{Window, WindowCore, WindowSnapshot};
