#![forbid(unsafe_code)]

//! A view that hosts an ordered list of child views.
//!
//! Children are adopted when they enter [`ContainerView::children`] and
//! released when they leave it. A child added to a second container is
//! stolen: the first container forgets it without touching its core.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use lumen_core::Rect;
use lumen_runtime::{BindMode, Property};
use tracing::warn;

use crate::child::{adopt, release};
use crate::error::ViewError;
use crate::registry::{CoreRegistry, ViewTypeId};
use crate::view::{View, ViewBase, ViewRef, base_core_properties};
use crate::view_core::{CoreKind, ViewCore};

/// Core properties of a container.
pub trait ContainerCore: ViewCore {
    /// View → core: children in paint order.
    fn children(&self) -> &Property<Vec<ViewRef>>;
}

/// Container property values handed to the core constructor.
#[derive(Debug, Clone)]
pub struct ContainerSnapshot {
    pub visible: bool,
    pub geometry: Rect,
    pub children: Vec<ViewRef>,
}

/// Ordered collection of child views.
pub struct ContainerView {
    base: ViewBase,
    pub children: Property<Vec<ViewRef>>,
    adopted: RefCell<Vec<ViewRef>>,
}

impl ContainerView {
    pub fn new(registry: &Rc<CoreRegistry>) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let this_view: Weak<dyn View> = this.clone();
            let container = Self {
                base: ViewBase::new(Self::TYPE_ID, registry, this_view),
                children: Property::new(Vec::new()),
                adopted: RefCell::new(Vec::new()),
            };

            let weak = this.clone();
            container.base.hold(container.children.on_change(move |children| {
                if let Some(container) = weak.upgrade() {
                    container.children_changed(children);
                }
            }));

            let base = &container.base;
            base.watch_core_creating(&base.visible, this.clone(), |visible| *visible);
            base.watch_core_creating(&base.geometry, this.clone(), |_| true);
            base.watch_core_creating(&container.children, this.clone(), |children| !children.is_empty());
            container
        })
    }

    /// Append `child`, stealing it from its current parent.
    ///
    /// # Errors
    ///
    /// Core creation failures for `child`. It is added either way.
    pub fn add_child_view(&self, child: ViewRef) -> Result<(), ViewError> {
        self.base.check_thread("add_child_view");
        if self.children.with(|children| children.contains(&child)) {
            return Ok(());
        }
        self.base.take_core_error();
        self.children.update(|children| children.push(child));
        match self.base.take_core_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Remove `child` if present. Its core is released.
    pub fn remove_child_view(&self, child: &ViewRef) {
        self.base.check_thread("remove_child_view");
        if self.children.with(|children| children.contains(child)) {
            self.children.update(|children| children.retain(|c| c != child));
        }
    }

    /// Reconcile the adopted set with the new child list.
    fn children_changed(&self, children: &[ViewRef]) {
        let previous = self.adopted.replace(children.to_vec());
        for old in previous.iter().filter(|old| !children.contains(*old)) {
            release(self, old);
        }

        let mut first_error = None;
        for child in children.iter().filter(|child| !previous.contains(*child)) {
            if let Err(err) = adopt(self, child) {
                first_error.get_or_insert(err);
            }
        }
        if let Some(err) = first_error {
            warn!(view_id = self.base.id().get(), error = %err, "child core creation failed");
            self.base.park_core_error(err);
        }
    }
}

impl CoreKind for ContainerView {
    type Core = dyn ContainerCore;
    type Snapshot = ContainerSnapshot;

    const TYPE_ID: ViewTypeId = "ContainerView";

    fn snapshot(&self) -> ContainerSnapshot {
        ContainerSnapshot {
            visible: self.base.visible.get(),
            geometry: self.base.geometry.get(),
            children: self.children.get(),
        }
    }
}

impl View for ContainerView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn child_views(&self) -> Vec<ViewRef> {
        self.base.check_thread("child_views");
        self.children.get()
    }

    fn remove_all_child_views(&self) {
        self.base.check_thread("remove_all_child_views");
        self.children.set(Vec::new());
    }

    fn child_view_stolen(&self, child: &ViewRef) {
        self.base.check_thread("child_view_stolen");
        if self.children.with(|children| children.contains(child)) {
            self.children.update(|children| children.retain(|c| c != child));
        }
    }

    fn ensure_core(&self) -> Result<(), ViewError> {
        self.base.create_core(self)
    }

    fn bind_view_core(&self) -> Result<(), ViewError> {
        let Some((visible, geometry, children)) =
            self.base.with_core::<dyn ContainerCore, _>(|core| {
                let (visible, geometry) = base_core_properties(core);
                (visible, geometry, core.children().clone())
            })
        else {
            return Ok(());
        };
        let mut links = self.base.begin_core_links(&visible, &geometry)?;
        links.connect(&self.children, &children, BindMode::Unidirectional)?;
        self.base.install_core_links(links);
        Ok(())
    }
}

impl Drop for ContainerView {
    fn drop(&mut self) {
        let adopted = std::mem::take(self.adopted.get_mut());
        for child in &adopted {
            release(&*self, child);
        }
        self.base.detach_core();
    }
}

impl fmt::Debug for ContainerView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerView")
            .field("base", &self.base)
            .field("children", &self.children.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessBackend;
    use crate::window::Window;

    fn setup() -> (HeadlessBackend, Rc<CoreRegistry>) {
        let backend = HeadlessBackend::new();
        let mut registry = CoreRegistry::new();
        backend.register_all(&mut registry);
        (backend, Rc::new(registry))
    }

    fn shown_window(registry: &Rc<CoreRegistry>) -> (Rc<Window>, Rc<ContainerView>) {
        let window = Window::new(registry);
        let root = ContainerView::new(registry);
        window.set_content_view(Some(ViewRef::from(root.clone()))).unwrap();
        (window, root)
    }

    #[test]
    fn detached_container_stays_without_core() {
        let (backend, registry) = setup();
        let container = ContainerView::new(&registry);
        container.base().visible.set(false);
        container.base().visible.set(true);
        assert!(!container.base().has_core());
        assert_eq!(backend.created("ContainerView"), 0);
    }

    #[test]
    fn added_child_gets_core_from_bound_parent() {
        let (_, registry) = setup();
        let (_window, root) = shown_window(&registry);
        let child = ContainerView::new(&registry);
        root.add_child_view(ViewRef::from(child.clone())).unwrap();

        assert!(child.base().has_core());
        assert_eq!(child.base().parent(), Some(ViewRef::from(root.clone())));
        assert_eq!(root.child_views(), vec![ViewRef::from(child.clone())]);
    }

    #[test]
    fn adding_twice_keeps_one_entry() {
        let (_, registry) = setup();
        let root = ContainerView::new(&registry);
        let child = ViewRef::from(ContainerView::new(&registry));
        root.add_child_view(child.clone()).unwrap();
        root.add_child_view(child.clone()).unwrap();
        assert_eq!(root.children.with(Vec::len), 1);
    }

    #[test]
    fn removed_child_loses_core_and_parent() {
        let (backend, registry) = setup();
        let (_window, root) = shown_window(&registry);
        let child = ContainerView::new(&registry);
        let child_ref = ViewRef::from(child.clone());
        root.add_child_view(child_ref.clone()).unwrap();

        root.remove_child_view(&child_ref);
        assert!(!child.base().has_core());
        assert_eq!(child.base().parent(), None);
        assert_eq!(backend.live("ContainerView"), 1);
        let root_core = &backend.containers()[0];
        assert!(root_core.is_live());
        assert!(root_core.children().with(Vec::is_empty));
    }

    #[test]
    fn remove_all_child_views_releases_every_child() {
        let (backend, registry) = setup();
        let (_window, root) = shown_window(&registry);
        let children: Vec<_> = (0..3).map(|_| ContainerView::new(&registry)).collect();
        for child in &children {
            root.add_child_view(ViewRef::from(child.clone())).unwrap();
        }
        assert_eq!(backend.live("ContainerView"), 4);

        root.remove_all_child_views();
        assert!(root.child_views().is_empty());
        for child in &children {
            assert!(!child.base().has_core());
            assert!(child.base().parent().is_none());
        }
        assert_eq!(backend.live("ContainerView"), 1);
    }

    #[test]
    fn stolen_child_moves_between_containers() {
        let (_, registry) = setup();
        let first = ContainerView::new(&registry);
        let second = ContainerView::new(&registry);
        let child = ViewRef::from(ContainerView::new(&registry));

        first.add_child_view(child.clone()).unwrap();
        second.add_child_view(child.clone()).unwrap();
        assert!(first.child_views().is_empty());
        assert_eq!(second.child_views(), vec![child.clone()]);
        assert_eq!(child.base().parent(), Some(ViewRef::from(second.clone())));
    }

    #[test]
    fn stale_steal_is_ignored() {
        let (_, registry) = setup();
        let container = ContainerView::new(&registry);
        let kept = ViewRef::from(ContainerView::new(&registry));
        let stranger = ViewRef::from(ContainerView::new(&registry));
        container.add_child_view(kept.clone()).unwrap();

        container.child_view_stolen(&stranger);
        assert_eq!(container.child_views(), vec![kept]);
    }

    #[test]
    fn releasing_parent_core_cascades() {
        let (backend, registry) = setup();
        let (window, root) = shown_window(&registry);
        let child = ContainerView::new(&registry);
        root.add_child_view(ViewRef::from(child.clone())).unwrap();

        window.release_core();
        assert!(!window.base().has_core());
        assert!(!root.base().has_core());
        assert!(!child.base().has_core());
        assert_eq!(backend.live("ContainerView"), 0);
        // Values survive the release.
        assert_eq!(root.child_views(), vec![ViewRef::from(child.clone())]);
    }

    #[test]
    fn dropping_container_releases_children() {
        let (_, registry) = setup();
        let container = ContainerView::new(&registry);
        let child = ContainerView::new(&registry);
        container.add_child_view(ViewRef::from(child.clone())).unwrap();
        drop(container);
        assert!(child.base().parent().is_none());
    }
}
