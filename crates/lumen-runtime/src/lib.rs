#![forbid(unsafe_code)]

//! Reactive runtime for Lumen.
//!
//! Holds the observable [`Property`](reactive::Property) every view field is
//! built from and the binding machinery that links properties to each other
//! and to platform cores.

pub mod reactive;

pub use reactive::{
    BindError, BindMode, BindingScope, Connection, Property, Subscription, WeakProperty, connect,
};
