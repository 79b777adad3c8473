#![warn(missing_docs)]
//! In-memory [`NamedCache`](shelter_backend::NamedCache) for shelter,
//! powered by Moka.
//!
//! Each namespace is its own Moka async cache, so deleting a namespace never
//! touches its neighbours.

mod backend;
mod builder;

pub use backend::{MokaHandle, MokaNamedCache};
pub use builder::MokaNamedCacheBuilder;
pub use moka::policy::EvictionPolicy;
