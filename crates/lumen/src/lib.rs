#![forbid(unsafe_code)]

//! Lumen public facade.
//!
//! Re-exports the member crates and provides a [`prelude`] for application
//! code.
//!
//! # Example
//!
//! ```
//! use lumen::prelude::*;
//! use std::rc::Rc;
//!
//! let backend = HeadlessBackend::new();
//! let mut registry = CoreRegistry::new();
//! backend.register_all(&mut registry);
//! let registry = Rc::new(registry);
//!
//! let window = Window::new(&registry);
//! window.title.set("Hello".to_string());
//! window.base().visible.set(true);
//!
//! assert_eq!(backend.last_window().unwrap().title().get(), "Hello");
//! ```

pub use lumen_core;
pub use lumen_runtime;
pub use lumen_view;

pub use lumen_core::{Orientation, Point, Rect, Size, UiLength, Unit, orientation_to_string};
pub use lumen_runtime::{BindError, BindMode, BindingScope, Connection, Property, Subscription, connect};
pub use lumen_view::{
    ContainerView, CoreError, CoreRegistry, CoreState, HeadlessBackend, View, ViewConfig, ViewError,
    ViewRef, Window,
};

pub mod prelude {
    //! Common imports for application code.

    pub use lumen_core::{Orientation, Rect, UiLength};
    pub use lumen_runtime::{BindMode, Property, Subscription};
    pub use lumen_view::{
        ContainerView, CoreRegistry, HeadlessBackend, View, ViewConfig, ViewError, ViewRef, Window,
    };
}
