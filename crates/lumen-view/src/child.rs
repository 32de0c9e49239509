#![forbid(unsafe_code)]

//! Re-parenting.
//!
//! A parent never reaches into a child's internals: it only moves the
//! child's parent link, and the child tears its own core down when it
//! loses its parent.
//!
//! # Invariants
//!
//! 1. [`adopt`] sets the child's new parent *before* notifying the old
//!    parent through [`View::child_view_stolen`]. When the old parent then
//!    drops its reference, [`release`] sees the child already belongs to
//!    someone else and leaves it alone.
//! 2. A child moving between parents loses its core; it gets a new one from
//!    the new parent's core, if that parent has one.

use std::cell::RefCell;

use tracing::trace;

use crate::error::ViewError;
use crate::view::{View, ViewRef};

/// Make `parent` the parent of `child`.
///
/// # Errors
///
/// Core creation failures for `child` when `parent` already has a core. The
/// child is parented either way.
pub fn adopt(parent: &dyn View, child: &ViewRef) -> Result<(), ViewError> {
    parent.base().check_thread("adopt");
    let child_base = child.base();
    if child_base.is_child_of(parent.base()) {
        return Ok(());
    }

    let previous = child_base.parent();
    child.release_core();
    child_base.set_parent(Some(parent.base()));
    trace!(
        child = child_base.id().get(),
        parent = parent.base().id().get(),
        stolen_from = previous.as_ref().map(|p| p.base().id().get()),
        "view adopted"
    );
    if let Some(previous) = previous {
        previous.child_view_stolen(child);
    }

    if parent.base().has_core() && parent.base().config_cascades() {
        child.ensure_core()?;
    }
    Ok(())
}

/// Detach `child` from `parent`. A no-op when `child` has meanwhile been
/// adopted by another parent.
pub fn release(parent: &dyn View, child: &ViewRef) {
    parent.base().check_thread("release");
    let child_base = child.base();
    if !child_base.is_child_of(parent.base()) {
        return;
    }
    child_base.set_parent(None);
    child.release_core();
    trace!(child = child_base.id().get(), parent = parent.base().id().get(), "view released");
}

/// Holds the single child a view currently owns and applies re-parenting
/// when it changes.
#[derive(Debug, Default)]
pub struct ChildSlot {
    current: RefCell<Option<ViewRef>>,
}

impl ChildSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<ViewRef> {
        self.current.borrow().clone()
    }

    /// Replace the child: release the old one, adopt the new one.
    ///
    /// # Errors
    ///
    /// Core creation failures from adopting the new child.
    pub fn update(&self, parent: &dyn View, child: Option<ViewRef>) -> Result<(), ViewError> {
        let old = self.current.replace(child.clone());
        if old == child {
            return Ok(());
        }
        if let Some(old) = old {
            release(parent, &old);
        }
        match child {
            Some(child) => adopt(parent, &child),
            None => Ok(()),
        }
    }

    /// Forget the child without releasing it.
    pub fn clear(&self) -> Option<ViewRef> {
        self.current.borrow_mut().take()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::container::ContainerView;
    use crate::headless::HeadlessBackend;
    use crate::registry::CoreRegistry;
    use crate::window::Window;

    fn registry() -> (HeadlessBackend, Rc<CoreRegistry>) {
        let backend = HeadlessBackend::new();
        let mut registry = CoreRegistry::new();
        backend.register_all(&mut registry);
        (backend, Rc::new(registry))
    }

    #[test]
    fn adopt_sets_parent() {
        let (_, registry) = registry();
        let parent = ContainerView::new(&registry);
        let child = ViewRef::from(ContainerView::new(&registry));
        adopt(&*parent, &child).unwrap();
        assert!(child.base().is_child_of(parent.base()));
    }

    #[test]
    fn release_from_wrong_parent_is_ignored() {
        let (_, registry) = registry();
        let parent = ContainerView::new(&registry);
        let other = ContainerView::new(&registry);
        let child = ViewRef::from(ContainerView::new(&registry));
        adopt(&*parent, &child).unwrap();

        release(&*other, &child);
        assert!(child.base().is_child_of(parent.base()));
    }

    #[test]
    fn adopting_into_bound_parent_replaces_the_core() {
        let (backend, registry) = registry();
        let first = Window::new(&registry);
        let second = Window::new(&registry);
        first.ensure_core().unwrap();
        second.ensure_core().unwrap();

        let child = ViewRef::from(ContainerView::new(&registry));
        adopt(&*first, &child).unwrap();
        assert!(child.base().has_core());
        adopt(&*second, &child).unwrap();
        assert!(child.base().has_core());
        assert_eq!(backend.created("ContainerView"), 2);
        assert_eq!(backend.live("ContainerView"), 1);
    }

    #[test]
    fn slot_update_swaps_children() {
        let (_, registry) = registry();
        let parent = ContainerView::new(&registry);
        let a = ViewRef::from(ContainerView::new(&registry));
        let b = ViewRef::from(ContainerView::new(&registry));
        let slot = ChildSlot::new();

        slot.update(&*parent, Some(a.clone())).unwrap();
        slot.update(&*parent, Some(b.clone())).unwrap();
        assert_eq!(slot.get(), Some(b.clone()));
        assert!(a.base().parent().is_none());
        assert!(b.base().is_child_of(parent.base()));

        assert_eq!(slot.clear(), Some(b.clone()));
        assert!(b.base().is_child_of(parent.base()));
    }
}
