#![forbid(unsafe_code)]

//! In-memory cores for tests and runs without a display.
//!
//! [`HeadlessBackend`] registers a core constructor for every view type.
//! Each core it builds is a set of plain properties plus a little simulated
//! platform behavior:
//!
//! - a window's `content_geometry` follows its `geometry` minus a title bar
//!   of [`TITLE_BAR_HEIGHT`];
//! - a window whose current orientation leaves the allowed set falls back to
//!   the first allowed orientation.
//!
//! The backend keeps a [`HeadlessWindow`] / [`HeadlessContainer`] handle for
//! every live core and forgets it when the core drops. Handles share the
//! core's properties, so tests can inspect what reached the core and push
//! platform-side changes. A handle the caller cloned outlives its core;
//! writes through it after the core is gone reach nobody.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use lumen_core::Orientation;
//! use lumen_view::{CoreRegistry, HeadlessBackend, View, Window};
//!
//! let backend = HeadlessBackend::new();
//! let mut registry = CoreRegistry::new();
//! backend.register_all(&mut registry);
//! let window = Window::new(&Rc::new(registry));
//! window.ensure_core().unwrap();
//!
//! let platform = backend.last_window().unwrap();
//! assert!(platform.rotate(Orientation::LANDSCAPE_LEFT));
//! assert_eq!(window.current_orientation.get(), Orientation::LANDSCAPE_LEFT);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use lumen_core::{Orientation, Rect};
use lumen_runtime::{BindingScope, Property};
use tracing::debug;

use crate::container::{ContainerCore, ContainerSnapshot, ContainerView};
use crate::error::CoreError;
use crate::registry::{CoreRegistry, ViewTypeId};
use crate::view::ViewRef;
use crate::view_core::{CoreKind, ViewCore};
use crate::window::{Window, WindowCore, WindowSnapshot};

/// Height of the simulated window title bar.
pub const TITLE_BAR_HEIGHT: f64 = 24.0;

/// Content area of a window with the given frame, in window coordinates.
#[must_use]
pub fn content_area(frame: &Rect) -> Rect {
    Rect::new(0.0, 0.0, frame.width, frame.height).inset(0.0, TITLE_BAR_HEIGHT, 0.0, 0.0)
}

#[derive(Default)]
struct BackendState {
    created: RefCell<HashMap<ViewTypeId, usize>>,
    released: RefCell<HashMap<ViewTypeId, usize>>,
    fail_next: RefCell<HashSet<ViewTypeId>>,
    windows: RefCell<Vec<HeadlessWindow>>,
    containers: RefCell<Vec<HeadlessContainer>>,
}

impl BackendState {
    fn take_failure(&self, view_type: ViewTypeId) -> Result<(), CoreError> {
        if self.fail_next.borrow_mut().remove(view_type) {
            return Err(CoreError::new(view_type, "injected failure"));
        }
        Ok(())
    }

    fn record_created(&self, view_type: ViewTypeId) {
        *self.created.borrow_mut().entry(view_type).or_default() += 1;
        debug!(view_type, "headless core created");
    }

    fn record_released(&self, view_type: ViewTypeId) {
        *self.released.borrow_mut().entry(view_type).or_default() += 1;
        self.windows.borrow_mut().retain(HeadlessWindow::is_live);
        self.containers.borrow_mut().retain(HeadlessContainer::is_live);
        debug!(view_type, "headless core dropped");
    }
}

/// Factory of in-memory cores. Cloning shares the counters and handles.
#[derive(Clone, Default)]
pub struct HeadlessBackend {
    state: Rc<BackendState>,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for every view type in this crate.
    pub fn register_all(&self, registry: &mut CoreRegistry) {
        let windows = Rc::clone(&self.state);
        let containers = Rc::clone(&self.state);
        registry
            .register::<Window, _>(move |snapshot| {
                HeadlessWindowCore::create(&windows, snapshot).map(|core| Box::new(core) as Box<dyn WindowCore>)
            })
            .register::<ContainerView, _>(move |snapshot| {
                HeadlessContainerCore::create(&containers, snapshot)
                    .map(|core| Box::new(core) as Box<dyn ContainerCore>)
            });
    }

    /// Make the next core creation for `view_type` fail once.
    pub fn fail_next(&self, view_type: ViewTypeId) {
        self.state.fail_next.borrow_mut().insert(view_type);
    }

    /// Cores built so far for `view_type`.
    #[must_use]
    pub fn created(&self, view_type: ViewTypeId) -> usize {
        self.state.created.borrow().get(view_type).copied().unwrap_or(0)
    }

    /// Cores dropped so far for `view_type`.
    #[must_use]
    pub fn released(&self, view_type: ViewTypeId) -> usize {
        self.state.released.borrow().get(view_type).copied().unwrap_or(0)
    }

    /// Cores of `view_type` currently alive.
    #[must_use]
    pub fn live(&self, view_type: ViewTypeId) -> usize {
        self.created(view_type) - self.released(view_type)
    }

    /// Handles to the live window cores, oldest first.
    #[must_use]
    pub fn windows(&self) -> Vec<HeadlessWindow> {
        self.state.windows.borrow().clone()
    }

    #[must_use]
    pub fn last_window(&self) -> Option<HeadlessWindow> {
        self.state.windows.borrow().last().cloned()
    }

    /// Handles to the live container cores, oldest first.
    #[must_use]
    pub fn containers(&self) -> Vec<HeadlessContainer> {
        self.state.containers.borrow().clone()
    }

    #[must_use]
    pub fn last_container(&self) -> Option<HeadlessContainer> {
        self.state.containers.borrow().last().cloned()
    }
}

impl fmt::Debug for HeadlessBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessBackend")
            .field("created", &*self.state.created.borrow())
            .field("released", &*self.state.released.borrow())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Shared view of a headless window core's properties.
#[derive(Clone)]
pub struct HeadlessWindow {
    visible: Property<bool>,
    geometry: Property<Rect>,
    content_view: Property<Option<ViewRef>>,
    title: Property<String>,
    allowed_orientations: Property<Orientation>,
    current_orientation: Property<Orientation>,
    content_geometry: Property<Rect>,
    live: Rc<Cell<bool>>,
}

impl HeadlessWindow {
    fn from_snapshot(snapshot: &WindowSnapshot) -> Self {
        let allowed = snapshot.allowed_orientations;
        let current = if allowed.contains(snapshot.current_orientation) {
            snapshot.current_orientation
        } else {
            allowed.members().next().unwrap_or(snapshot.current_orientation)
        };
        Self {
            visible: Property::new(snapshot.visible),
            geometry: Property::new(snapshot.geometry),
            content_view: Property::new(snapshot.content_view.clone()),
            title: Property::new(snapshot.title.clone()),
            allowed_orientations: Property::new(snapshot.allowed_orientations),
            current_orientation: Property::new(current),
            content_geometry: Property::new(content_area(&snapshot.geometry)),
            live: Rc::new(Cell::new(true)),
        }
    }

    /// Whether the core behind this handle still exists.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    pub fn visible(&self) -> &Property<bool> {
        &self.visible
    }

    pub fn geometry(&self) -> &Property<Rect> {
        &self.geometry
    }

    pub fn content_view(&self) -> &Property<Option<ViewRef>> {
        &self.content_view
    }

    pub fn title(&self) -> &Property<String> {
        &self.title
    }

    pub fn allowed_orientations(&self) -> &Property<Orientation> {
        &self.allowed_orientations
    }

    pub fn current_orientation(&self) -> &Property<Orientation> {
        &self.current_orientation
    }

    pub fn content_geometry(&self) -> &Property<Rect> {
        &self.content_geometry
    }

    /// Simulate the device turning. Refused unless `orientation` is a single
    /// allowed orientation.
    pub fn rotate(&self, orientation: Orientation) -> bool {
        if !orientation.is_single() || !self.allowed_orientations.get().contains(orientation) {
            return false;
        }
        self.current_orientation.set(orientation);
        true
    }

    /// Simulate the user resizing or moving the window.
    pub fn resize(&self, frame: Rect) {
        self.geometry.set(frame);
    }

    /// Simulate the platform changing the content area on its own (a
    /// toolbar appearing, for instance).
    pub fn set_content_area(&self, area: Rect) {
        self.content_geometry.set(area);
    }
}

impl fmt::Debug for HeadlessWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessWindow")
            .field("live", &self.live.get())
            .field("title", &self.title.get())
            .field("geometry", &self.geometry.get())
            .field("current_orientation", &self.current_orientation.get())
            .finish()
    }
}

struct HeadlessWindowCore {
    props: HeadlessWindow,
    backend: Rc<BackendState>,
    _platform: BindingScope,
}

impl HeadlessWindowCore {
    fn create(backend: &Rc<BackendState>, snapshot: &WindowSnapshot) -> Result<Self, CoreError> {
        backend.take_failure(Window::TYPE_ID)?;
        let props = HeadlessWindow::from_snapshot(snapshot);

        let mut platform = BindingScope::new();
        let content_geometry = props.content_geometry.clone();
        platform.subscribe(&props.geometry, move |frame| {
            content_geometry.set(content_area(frame));
        });
        let current = props.current_orientation.clone();
        platform.subscribe(&props.allowed_orientations, move |allowed| {
            if current.with(|current| allowed.contains(*current)) {
                return;
            }
            if let Some(fallback) = allowed.members().next() {
                current.set(fallback);
            }
        });

        backend.record_created(Window::TYPE_ID);
        backend.windows.borrow_mut().push(props.clone());
        Ok(Self {
            props,
            backend: Rc::clone(backend),
            _platform: platform,
        })
    }
}

impl ViewCore for HeadlessWindowCore {
    fn visible(&self) -> &Property<bool> {
        &self.props.visible
    }

    fn geometry(&self) -> &Property<Rect> {
        &self.props.geometry
    }
}

impl WindowCore for HeadlessWindowCore {
    fn content_view(&self) -> &Property<Option<ViewRef>> {
        &self.props.content_view
    }

    fn title(&self) -> &Property<String> {
        &self.props.title
    }

    fn allowed_orientations(&self) -> &Property<Orientation> {
        &self.props.allowed_orientations
    }

    fn current_orientation(&self) -> &Property<Orientation> {
        &self.props.current_orientation
    }

    fn content_geometry(&self) -> &Property<Rect> {
        &self.props.content_geometry
    }
}

impl Drop for HeadlessWindowCore {
    fn drop(&mut self) {
        self.props.live.set(false);
        // The core must not keep its content view alive.
        self.props.content_view.set(None);
        self.backend.record_released(Window::TYPE_ID);
    }
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// Shared view of a headless container core's properties.
#[derive(Clone)]
pub struct HeadlessContainer {
    visible: Property<bool>,
    geometry: Property<Rect>,
    children: Property<Vec<ViewRef>>,
    live: Rc<Cell<bool>>,
}

impl HeadlessContainer {
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    pub fn visible(&self) -> &Property<bool> {
        &self.visible
    }

    pub fn geometry(&self) -> &Property<Rect> {
        &self.geometry
    }

    pub fn children(&self) -> &Property<Vec<ViewRef>> {
        &self.children
    }
}

impl fmt::Debug for HeadlessContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessContainer")
            .field("live", &self.live.get())
            .field("children", &self.children.with(Vec::len))
            .finish()
    }
}

struct HeadlessContainerCore {
    props: HeadlessContainer,
    backend: Rc<BackendState>,
}

impl HeadlessContainerCore {
    fn create(backend: &Rc<BackendState>, snapshot: &ContainerSnapshot) -> Result<Self, CoreError> {
        backend.take_failure(ContainerView::TYPE_ID)?;
        let props = HeadlessContainer {
            visible: Property::new(snapshot.visible),
            geometry: Property::new(snapshot.geometry),
            children: Property::new(snapshot.children.clone()),
            live: Rc::new(Cell::new(true)),
        };
        backend.record_created(ContainerView::TYPE_ID);
        backend.containers.borrow_mut().push(props.clone());
        Ok(Self {
            props,
            backend: Rc::clone(backend),
        })
    }
}

impl ViewCore for HeadlessContainerCore {
    fn visible(&self) -> &Property<bool> {
        &self.props.visible
    }

    fn geometry(&self) -> &Property<Rect> {
        &self.props.geometry
    }
}

impl ContainerCore for HeadlessContainerCore {
    fn children(&self) -> &Property<Vec<ViewRef>> {
        &self.props.children
    }
}

impl Drop for HeadlessContainerCore {
    fn drop(&mut self) {
        self.props.live.set(false);
        self.props.children.set(Vec::new());
        self.backend.record_released(ContainerView::TYPE_ID);
    }
}
