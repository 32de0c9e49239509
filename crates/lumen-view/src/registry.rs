#![forbid(unsafe_code)]

//! Core constructor registry.
//!
//! Backends register one constructor per concrete view type at startup.
//! Views look their constructor up by [`ViewTypeId`] the first time they
//! need a core.
//!
//! # Invariants
//!
//! 1. At most one constructor per view type; registering again replaces it.
//! 2. A lookup for an unregistered type fails with
//!    [`ViewError::NoCoreFactory`]; it never falls back to another type.
//! 3. The registry is bound to the thread that created it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use lumen_core::ThreadAffinity;

use crate::config::ViewConfig;
use crate::error::{CoreError, ViewError};
use crate::view_core::CoreKind;

/// Stable identifier of a concrete view type.
pub type ViewTypeId = &'static str;

type Constructor<V> =
    Rc<dyn Fn(&<V as CoreKind>::Snapshot) -> Result<Box<<V as CoreKind>::Core>, CoreError>>;

/// Table of core constructors keyed by view type.
pub struct CoreRegistry {
    /// Each entry is a type-erased `Constructor<V>` for the `V` whose
    /// `TYPE_ID` is the key.
    factories: HashMap<ViewTypeId, Box<dyn Any>>,
    config: ViewConfig,
    affinity: ThreadAffinity,
}

impl CoreRegistry {
    /// Empty registry with default configuration, bound to this thread.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ViewConfig::default())
    }

    /// Empty registry bound to this thread.
    #[must_use]
    pub fn with_config(config: ViewConfig) -> Self {
        Self {
            factories: HashMap::new(),
            config,
            affinity: ThreadAffinity::current(config.thread_check),
        }
    }

    /// Register the core constructor for view type `V`.
    pub fn register<V, F>(&mut self, constructor: F) -> &mut Self
    where
        V: CoreKind,
        F: Fn(&V::Snapshot) -> Result<Box<V::Core>, CoreError> + 'static,
    {
        let constructor: Constructor<V> = Rc::new(constructor);
        self.factories.insert(V::TYPE_ID, Box::new(constructor));
        self
    }

    #[must_use]
    pub fn contains(&self, view_type: ViewTypeId) -> bool {
        self.factories.contains_key(view_type)
    }

    /// Registered view types, sorted.
    #[must_use]
    pub fn type_ids(&self) -> Vec<ViewTypeId> {
        let mut ids: Vec<_> = self.factories.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    #[must_use]
    pub fn affinity(&self) -> &ThreadAffinity {
        &self.affinity
    }

    /// Build a core for `view`.
    ///
    /// # Errors
    ///
    /// [`ViewError::NoCoreFactory`] when `V` has no constructor,
    /// [`ViewError::CoreCreation`] when the constructor fails.
    pub fn create<V: CoreKind>(&self, view: &V) -> Result<Box<V::Core>, ViewError> {
        let constructor = self
            .factories
            .get(V::TYPE_ID)
            .and_then(|entry| entry.downcast_ref::<Constructor<V>>())
            .cloned()
            .ok_or(ViewError::NoCoreFactory(V::TYPE_ID))?;
        let snapshot = view.snapshot();
        constructor(&snapshot).map_err(ViewError::CoreCreation)
    }
}

impl Default for CoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreRegistry")
            .field("types", &self.type_ids())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessBackend;
    use crate::window::{Window, WindowCore};
    use crate::view::View;

    #[test]
    fn unregistered_type_has_no_factory() {
        let registry = Rc::new(CoreRegistry::new());
        let window = Window::new(&registry);
        let err = registry.create(&*window).err().unwrap();
        assert!(matches!(err, ViewError::NoCoreFactory("Window")));
    }

    #[test]
    fn register_replaces_previous_constructor() {
        let backend = HeadlessBackend::new();
        let mut registry = CoreRegistry::new();
        backend.register_all(&mut registry);
        registry.register::<Window, _>(|_| -> Result<Box<dyn WindowCore>, CoreError> {
            Err(CoreError::new("Window", "replaced"))
        });
        let registry = Rc::new(registry);

        let window = Window::new(&registry);
        let err = window.ensure_core().unwrap_err();
        assert!(err.to_string().contains("replaced"));
        assert_eq!(backend.created("Window"), 0);
        assert_eq!(registry.type_ids().len(), 2);
    }

    #[test]
    fn config_is_shared_with_views() {
        let config = ViewConfig::default().with_cascade_child_cores(false);
        let registry = Rc::new(CoreRegistry::with_config(config));
        let window = Window::new(&registry);
        assert!(!window.base().registry().config().cascade_child_cores);
        assert!(registry.affinity().is_owner_thread());
    }

    #[test]
    fn debug_lists_types() {
        let backend = HeadlessBackend::new();
        let mut registry = CoreRegistry::new();
        backend.register_all(&mut registry);
        let dbg = format!("{registry:?}");
        assert!(dbg.contains("ContainerView"));
        assert!(dbg.contains("Window"));
        assert!(registry.contains("Window"));
        assert!(!registry.contains("Button"));
    }
}
