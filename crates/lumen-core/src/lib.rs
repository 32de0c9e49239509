#![forbid(unsafe_code)]

//! Core value types for Lumen.
//!
//! # Role in Lumen
//! `lumen-core` is the leaf crate. It owns the plain value types that flow
//! through view properties and across the boundary to platform cores, and
//! the thread-affinity check every view operation runs before touching the
//! object model.
//!
//! # Primary responsibilities
//! - **UiLength**: a unit tag paired with a magnitude.
//! - **Orientation**: the fixed set of physical window orientations.
//! - **Geometry**: points, sizes, and rectangles in view coordinates.
//! - **ThreadAffinity**: UI-thread precondition checks.
//!
//! # How it fits in the system
//! `lumen-runtime` provides the reactive `Property<T>` that stores these
//! values; `lumen-view` binds those properties to platform cores. Nothing in
//! this crate knows about either.

pub mod geometry;
pub mod length;
pub mod orientation;
pub mod thread;

pub use geometry::{Point, Rect, Size};
pub use length::{UiLength, Unit};
pub use orientation::{Orientation, orientation_to_string};
pub use thread::{ThreadAffinity, ThreadCheck};
