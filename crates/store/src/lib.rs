//! `adminshell-store` — the client-side Identity Store.
//!
//! One store per client session holds "who is logged in". Every UI fragment
//! reads the same snapshot and is notified of the same changes, in the order
//! the mutations were applied.

pub mod store;
pub mod subscription;

pub use store::{IdentityChange, IdentityStore, IdentityUpdate};
pub use subscription::{Subscription, Watcher};
