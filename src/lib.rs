//! A library for sharing one mutable application state between many
//! independent consumers (similar to a redux store built from hooks).
//!
//! Independently written modules ("slices") each contribute their
//! initial state and their reducers to a single [Store] with
//! [Store::init_store()]. Consumers read the state and dispatch
//! actions through a [Binding], and are notified synchronously with
//! the new state after every [Store::dispatch()].

pub mod binding;
pub mod config;
mod error;
mod listener;
mod reducer;
mod state;
mod store;

pub use binding::{Binding, Dispatcher};
pub use config::{LogLevel, StoreConfig};
pub use error::{ReducerError, Result, StoreError};
pub use listener::{Callback, Subscription};
pub use reducer::*;
pub use state::*;
pub use store::{Store, StoreRef};
