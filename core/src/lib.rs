//! Synchronous reconciliation client for the VergeOS API.
//!
//! # Overview
//! Converges remote resources (VMs, drives, NICs, users, group members,
//! networks) to a desired state over the JSON API with Basic auth.
//!
//! # Design
//! - `Client` is the transport layer: it builds authenticated requests,
//!   sends them through an `HttpTransport`, and classifies responses into
//!   bodies or `ApiError`s. It holds no per-call state.
//! - `DesiredState` records field values plus which ones the caller touched;
//!   `Changeset` serializes exactly the touched fields.
//! - `Reconciler` runs the create/read/update/delete lifecycle for one
//!   resource kind, tracking the server-assigned key in a `ManagedResource`.
//! - `CollectionQuery` lists collections with server-side filters and
//!   client-side predicates, and hosts the read-only catalog lookups.
//! - Resource kinds are plain schema data declared with `resource_kind!`.

pub mod catalog;
pub mod changeset;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod http;
pub mod kinds;
pub mod observer;
pub mod query;
pub mod reconcile;
pub mod schema;
pub mod types;

#[cfg(test)]
mod testing;

pub use changeset::{Changeset, DesiredState};
pub use client::Client;
pub use collection::{field_equals, CollectionQuery};
pub use config::{ConfigError, Credential};
pub use error::{ApiError, Error, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, UreqTransport};
pub use observer::{Event, Observer, RecordingObserver, TracingObserver};
pub use query::{Filter, QueryOptions, DEFAULT_FIELDS};
pub use reconcile::{LifecycleState, ManagedResource, Outcome, ReadOutcome, Reconciler};
pub use schema::{Access, Field, FieldSpec, FieldType, ResourceKind};
pub use types::{ObservedState, ResourceKey, ResponseEnvelope};
