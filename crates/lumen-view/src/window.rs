#![forbid(unsafe_code)]

//! Top-level window.
//!
//! A [`Window`] owns at most one content view. Assigning
//! [`Window::content_view`] re-parents the new content (stealing it from its
//! previous parent if needed) and releases the old one.
//!
//! # Core links
//!
//! | Property               | Direction     | Core-creating |
//! |------------------------|---------------|---------------|
//! | `visible`              | view → core   | when `true`   |
//! | `geometry`             | both          | yes           |
//! | `content_view`         | view → core   | when set      |
//! | `title`                | view → core   | no            |
//! | `allowed_orientations` | view → core   | no            |
//! | `current_orientation`  | core → view   | no            |
//! | `content_geometry`     | core → view   | yes           |
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use lumen_view::{ContainerView, CoreRegistry, HeadlessBackend, View, ViewRef, Window};
//!
//! let backend = HeadlessBackend::new();
//! let mut registry = CoreRegistry::new();
//! backend.register_all(&mut registry);
//! let registry = Rc::new(registry);
//!
//! let window = Window::new(&registry);
//! let content = ContainerView::new(&registry);
//! window.set_content_view(Some(ViewRef::from(content.clone()))).unwrap();
//! window.base().visible.set(true);
//!
//! assert!(window.base().has_core());
//! assert!(content.base().has_core());
//! ```

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

use lumen_core::{Orientation, Rect};
use lumen_runtime::{BindMode, Property};
use tracing::warn;

use crate::child::{ChildSlot, release};
use crate::error::ViewError;
use crate::registry::{CoreRegistry, ViewTypeId};
use crate::view::{View, ViewBase, ViewRef, base_core_properties};
use crate::view_core::{CoreKind, ViewCore};

/// Core properties of a window.
pub trait WindowCore: ViewCore {
    /// View → core: the view whose platform representation fills the window.
    fn content_view(&self) -> &Property<Option<ViewRef>>;
    /// View → core.
    fn title(&self) -> &Property<String>;
    /// View → core: orientations the window may assume.
    fn allowed_orientations(&self) -> &Property<Orientation>;
    /// Core → view: orientation the window currently has.
    fn current_orientation(&self) -> &Property<Orientation>;
    /// Core → view: usable area once platform chrome is subtracted.
    fn content_geometry(&self) -> &Property<Rect>;
}

/// Window property values handed to the core constructor.
#[derive(Debug, Clone)]
pub struct WindowSnapshot {
    pub visible: bool,
    pub geometry: Rect,
    pub content_view: Option<ViewRef>,
    pub title: String,
    pub allowed_orientations: Orientation,
    pub current_orientation: Orientation,
    pub content_geometry: Rect,
}

/// A top-level window with a single content view.
pub struct Window {
    base: ViewBase,
    pub content_view: Property<Option<ViewRef>>,
    pub title: Property<String>,
    pub allowed_orientations: Property<Orientation>,
    pub current_orientation: Property<Orientation>,
    pub content_geometry: Property<Rect>,
    content: ChildSlot,
}

impl Window {
    /// Create a window. It stays without a core until it is shown, given
    /// geometry or content, or [`View::ensure_core`] is called.
    pub fn new(registry: &Rc<CoreRegistry>) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let this_view: Weak<dyn View> = this.clone();
            let window = Self {
                base: ViewBase::new(Self::TYPE_ID, registry, this_view),
                content_view: Property::new(None),
                title: Property::new(String::new()),
                allowed_orientations: Property::new(Orientation::ALL),
                current_orientation: Property::new(Orientation::PORTRAIT),
                content_geometry: Property::new(Rect::default()),
                content: ChildSlot::new(),
            };
            window.base.visible.set(false);

            // Re-parent before the core-creating reaction so a core created
            // by this change already sees the new content as a child.
            let weak = this.clone();
            window.base.hold(window.content_view.on_change(move |content| {
                if let Some(window) = weak.upgrade() {
                    window.content_view_changed(content.clone());
                }
            }));

            let base = &window.base;
            base.watch_core_creating(&base.visible, this.clone(), |visible| *visible);
            base.watch_core_creating(&window.content_view, this.clone(), Option::is_some);
            base.watch_core_creating(&base.geometry, this.clone(), |_| true);
            base.watch_core_creating(&window.content_geometry, this.clone(), |_| true);
            window
        })
    }

    /// Set the content view and report core creation failures for it.
    ///
    /// # Errors
    ///
    /// Core creation failures triggered by this assignment. The content is
    /// assigned either way.
    pub fn set_content_view(&self, content: Option<ViewRef>) -> Result<(), ViewError> {
        self.base.check_thread("set_content_view");
        self.base.take_core_error();
        self.content_view.set(content);
        match self.base.take_core_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn content_view_changed(&self, content: Option<ViewRef>) {
        if let Err(err) = self.content.update(self, content) {
            warn!(view_id = self.base.id().get(), error = %err, "content view core creation failed");
            self.base.park_core_error(err);
        }
    }
}

impl CoreKind for Window {
    type Core = dyn WindowCore;
    type Snapshot = WindowSnapshot;

    const TYPE_ID: ViewTypeId = "Window";

    fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            visible: self.base.visible.get(),
            geometry: self.base.geometry.get(),
            content_view: self.content_view.get(),
            title: self.title.get(),
            allowed_orientations: self.allowed_orientations.get(),
            current_orientation: self.current_orientation.get(),
            content_geometry: self.content_geometry.get(),
        }
    }
}

/// Property handles cloned out of a window core so no core borrow is held
/// while linking.
struct WindowCoreProperties {
    visible: Property<bool>,
    geometry: Property<Rect>,
    content_view: Property<Option<ViewRef>>,
    title: Property<String>,
    allowed_orientations: Property<Orientation>,
    current_orientation: Property<Orientation>,
    content_geometry: Property<Rect>,
}

impl WindowCoreProperties {
    fn of(core: &dyn WindowCore) -> Self {
        let (visible, geometry) = base_core_properties(core);
        Self {
            visible,
            geometry,
            content_view: core.content_view().clone(),
            title: core.title().clone(),
            allowed_orientations: core.allowed_orientations().clone(),
            current_orientation: core.current_orientation().clone(),
            content_geometry: core.content_geometry().clone(),
        }
    }
}

impl View for Window {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn child_views(&self) -> Vec<ViewRef> {
        self.base.check_thread("child_views");
        self.content_view.get().into_iter().collect()
    }

    fn remove_all_child_views(&self) {
        self.base.check_thread("remove_all_child_views");
        self.content_view.set(None);
    }

    fn child_view_stolen(&self, child: &ViewRef) {
        self.base.check_thread("child_view_stolen");
        if self.content_view.with(|content| content.as_ref() == Some(child)) {
            self.content_view.set(None);
        }
    }

    fn ensure_core(&self) -> Result<(), ViewError> {
        self.base.create_core(self)
    }

    fn bind_view_core(&self) -> Result<(), ViewError> {
        let Some(core) = self
            .base
            .with_core::<dyn WindowCore, _>(|core| WindowCoreProperties::of(core))
        else {
            return Ok(());
        };
        let mut links = self.base.begin_core_links(&core.visible, &core.geometry)?;
        links
            .connect(&self.content_view, &core.content_view, BindMode::Unidirectional)?
            .connect(&self.title, &core.title, BindMode::Unidirectional)?
            .connect(&self.allowed_orientations, &core.allowed_orientations, BindMode::Unidirectional)?
            .connect(&core.current_orientation, &self.current_orientation, BindMode::Unidirectional)?
            .connect(&core.content_geometry, &self.content_geometry, BindMode::Unidirectional)?;
        self.base.install_core_links(links);
        Ok(())
    }

    /// A top-level window hosts a core on its own. Nested in another view,
    /// it waits for that view's core like any other child.
    fn can_host_core(&self) -> bool {
        match self.base.parent() {
            None => true,
            Some(parent) => parent.base().has_core(),
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if let Some(content) = self.content.clear() {
            release(&*self, &content);
        }
        self.base.detach_core();
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("base", &self.base)
            .field("title", &self.title.get())
            .field("content_view", &self.content_view.get())
            .field("allowed_orientations", &self.allowed_orientations.get())
            .field("current_orientation", &self.current_orientation.get())
            .finish()
    }
}
