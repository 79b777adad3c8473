#![warn(missing_docs)]
//! # shelter-core
//!
//! Core types and traits for the shelter offline-resilient fetch cache.
//!
//! This crate holds the vocabulary shared by every other shelter crate:
//!
//! - **Identity** of cached requests ([`RequestKey`]) and of the hosts that
//!   serve them ([`Origin`], [`OriginPattern`])
//! - **Partitions** of the named cache ([`NamespaceName`])
//! - **Payloads** that flow through the interceptor ([`FetchRequest`],
//!   [`FetchResponse`], [`OnceBody`], [`CacheEntry`])
//! - **Policy** vocabulary ([`Strategy`], [`PolicyRule`])
//! - **Seams** to the outside world ([`Transport`], [`Offload`])
//!
//! Storage abstractions live in `shelter-backend`; orchestration lives in
//! `shelter`.

pub mod body;
pub mod entry;
pub mod key;
pub mod label;
pub mod namespace;
pub mod offload;
pub mod origin;
pub mod request;
pub mod response;
pub mod strategy;
pub mod transport;

pub use body::{BodyError, OnceBody};
pub use entry::CacheEntry;
pub use key::RequestKey;
pub use label::BackendLabel;
pub use namespace::NamespaceName;
pub use offload::{DisabledOffload, Offload};
pub use origin::{Origin, OriginError, OriginPattern};
pub use request::FetchRequest;
pub use response::{CacheStatus, FetchResponse, ResponseSource};
pub use strategy::{PolicyRule, Strategy};
pub use transport::{BoxError, NetworkError, Transport};
#[doc(hidden)]
pub use smol_str::SmolStr;

/// Raw byte data type used for response payloads.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
