//! Create/read/update/delete lifecycle shared by every resource kind.
//!
//! # Design
//! A `ManagedResource` is the caller-held record of one remote object: its
//! server-assigned key, lifecycle state, and the last observed body. The
//! `Reconciler` drives it through
//! `Absent -> Creating -> Present -> Updating -> Present -> Deleting -> Absent`,
//! landing in `Failed` whenever an operation errors.
//!
//! Every successful write is followed by a read, and a read replaces the
//! observed body wholesale. A key is only ever cleared by a successful
//! delete or by a read that gets 404, so a create whose follow-up read fails
//! still leaves the key in place for the next pass.

use std::fmt;
use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::changeset::DesiredState;
use crate::client::{decode, Client};
use crate::collection::CollectionQuery;
use crate::error::{ApiError, Error, Result};
use crate::http::{HttpResponse, HttpTransport};
use crate::query::QueryOptions;
use crate::schema::{Field, ResourceKind};
use crate::types::{ObservedState, ResourceKey, ResponseEnvelope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Absent,
    Creating,
    Present,
    Updating,
    Deleting,
    Failed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Absent => "absent",
            LifecycleState::Creating => "creating",
            LifecycleState::Present => "present",
            LifecycleState::Updating => "updating",
            LifecycleState::Deleting => "deleting",
            LifecycleState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Caller-held identity and last known state of one remote object.
pub struct ManagedResource<K: ResourceKind> {
    key: Option<ResourceKey>,
    state: LifecycleState,
    observed: Option<ObservedState>,
    kind: PhantomData<K>,
}

impl<K: ResourceKind> ManagedResource<K> {
    /// A resource that has not been created yet.
    pub fn new() -> Self {
        Self {
            key: None,
            state: LifecycleState::Absent,
            observed: None,
            kind: PhantomData,
        }
    }

    /// A resource whose key was persisted by an earlier pass.
    ///
    /// An empty key is treated as "not yet created".
    pub fn from_key(key: impl Into<ResourceKey>) -> Self {
        let key = key.into();
        if key.is_empty() {
            return Self::new();
        }
        Self {
            key: Some(key),
            state: LifecycleState::Present,
            observed: None,
            kind: PhantomData,
        }
    }

    pub fn key(&self) -> Option<&ResourceKey> {
        self.key.as_ref()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn observed(&self) -> Option<&ObservedState> {
        self.observed.as_ref()
    }

    fn require_key(&self, operation: &'static str) -> Result<ResourceKey> {
        let key = self.key.clone().ok_or_else(|| Error::InvalidTransition {
            kind: K::NAME,
            state: self.state.to_string(),
            operation,
        })?;
        // Dot segments are resolved away by URL parsing even when escaped.
        if matches!(key.as_str(), "." | "..") {
            return Err(Error::InvalidKey {
                kind: K::NAME,
                key: key.to_string(),
            });
        }
        Ok(key)
    }

    fn mark_gone(&mut self) {
        self.key = None;
        self.observed = None;
        self.state = LifecycleState::Absent;
    }

    /// Record `Failed` when `result` is an error.
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.state = LifecycleState::Failed;
        }
        result
    }
}

impl<K: ResourceKind> Default for ManagedResource<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ResourceKind> fmt::Debug for ManagedResource<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedResource")
            .field("kind", &K::NAME)
            .field("key", &self.key)
            .field("state", &self.state)
            .field("observed", &self.observed)
            .finish()
    }
}

/// What a read found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Found,
    /// The server answered 404; the key has been cleared.
    Gone,
}

/// What `converge` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    /// A create-only field changed: deleted and created again.
    Replaced,
    Unchanged,
}

/// Drives `ManagedResource`s of kind `K` through the API.
pub struct Reconciler<'c, K: ResourceKind, T: HttpTransport> {
    client: &'c Client<T>,
    kind: PhantomData<K>,
}

impl<'c, K: ResourceKind, T: HttpTransport> Reconciler<'c, K, T> {
    pub fn new(client: &'c Client<T>) -> Self {
        Self {
            client,
            kind: PhantomData,
        }
    }

    /// POST the touched fields, adopt the returned key, then read back.
    pub fn create(
        &self,
        resource: &mut ManagedResource<K>,
        desired: &DesiredState<K>,
    ) -> Result<()> {
        if resource.key.is_some() {
            return Err(Error::InvalidTransition {
                kind: K::NAME,
                state: resource.state.to_string(),
                operation: "create",
            });
        }
        if let Some(field) = desired.missing_required().first() {
            return Err(Error::InvalidField {
                kind: K::NAME,
                field: field.key(),
                message: "required on create".to_string(),
            });
        }

        resource.state = LifecycleState::Creating;
        let result = self.post_new(desired);
        let key = resource.settle(result)?;
        tracing::debug!(kind = K::NAME, %key, "created");

        resource.key = Some(key);
        resource.state = LifecycleState::Present;
        self.read(resource).map(|_| ())
    }

    fn post_new(&self, desired: &DesiredState<K>) -> Result<ResourceKey> {
        let body = desired.changeset().to_json()?;
        let response = self.client.post(K::ENDPOINT, &body)?;
        let envelope: ResponseEnvelope = decode(K::ENDPOINT, &response)?;
        check_envelope(K::ENDPOINT, &response, &envelope)?;
        envelope.key().cloned().ok_or_else(|| Error::Decode {
            endpoint: K::ENDPOINT.to_string(),
            message: "response carried no $key".to_string(),
        })
    }

    /// GET the resource by key and replace the observed state.
    ///
    /// A 404 clears the key and moves the resource to `Absent`.
    pub fn read(&self, resource: &mut ManagedResource<K>) -> Result<ReadOutcome> {
        let key = resource.require_key("read")?;
        let endpoint = K::member_endpoint(key.as_str());

        let response = match self.client.get(&endpoint, None) {
            Err(Error::Api(err)) if err.is_not_found() => {
                tracing::debug!(kind = K::NAME, %key, "not found, marking absent");
                resource.mark_gone();
                return Ok(ReadOutcome::Gone);
            }
            other => resource.settle(other)?,
        };

        let result = expect_ok(&endpoint, &response)
            .and_then(|()| decode::<Map<String, Value>>(&endpoint, &response));
        let body = resource.settle(result)?;
        resource.observed = Some(ObservedState::new(body));
        resource.state = LifecycleState::Present;
        Ok(ReadOutcome::Found)
    }

    /// PUT the touched fields, then read back.
    pub fn update(
        &self,
        resource: &mut ManagedResource<K>,
        desired: &DesiredState<K>,
    ) -> Result<()> {
        let key = resource.require_key("update")?;
        if let Some(field) = desired.touched_create_only() {
            return Err(Error::InvalidField {
                kind: K::NAME,
                field: field.key(),
                message: "can only be set on create; replace the resource".to_string(),
            });
        }

        resource.state = LifecycleState::Updating;
        let endpoint = K::member_endpoint(key.as_str());
        let result = self.put_changes(&endpoint, desired);
        resource.settle(result)?;
        tracing::debug!(kind = K::NAME, %key, "updated");

        resource.state = LifecycleState::Present;
        self.read(resource).map(|_| ())
    }

    fn put_changes(&self, endpoint: &str, desired: &DesiredState<K>) -> Result<()> {
        let body = desired.changeset().to_json()?;
        let response = self.client.put(endpoint, &body)?;
        expect_ok(endpoint, &response)?;
        if let Ok(envelope) = serde_json::from_str::<ResponseEnvelope>(&response.body) {
            check_envelope(endpoint, &response, &envelope)?;
        }
        Ok(())
    }

    /// DELETE the resource and clear its key.
    ///
    /// Whatever the server answers for an already-deleted key is passed
    /// through unchanged.
    pub fn delete(&self, resource: &mut ManagedResource<K>) -> Result<()> {
        let key = resource.require_key("delete")?;
        resource.state = LifecycleState::Deleting;
        let result = self.client.delete(&K::member_endpoint(key.as_str()));
        resource.settle(result)?;
        tracing::debug!(kind = K::NAME, %key, "deleted");
        resource.mark_gone();
        Ok(())
    }

    /// List entries of this kind; see `CollectionQuery::list`.
    pub fn list(
        &self,
        query: &QueryOptions,
        predicate: Option<&dyn Fn(&ObservedState) -> bool>,
    ) -> Result<Vec<ObservedState>> {
        CollectionQuery::new(self.client).list(K::ENDPOINT, query, predicate)
    }

    /// Bring the remote object in line with `desired`.
    ///
    /// Every field with a value counts as intended; only the ones that
    /// differ from the server are sent on update.
    pub fn converge(
        &self,
        resource: &mut ManagedResource<K>,
        mut desired: DesiredState<K>,
    ) -> Result<Outcome> {
        if resource.key.is_some() {
            self.read(resource)?;
        }
        let Some(observed) = resource.observed.clone() else {
            desired.touch_all();
            self.create(resource, &desired)?;
            return Ok(Outcome::Created);
        };

        if desired.requires_replacement(&observed) {
            self.delete(resource)?;
            desired.touch_all();
            self.create(resource, &desired)?;
            return Ok(Outcome::Replaced);
        }

        desired.touch_changed(&observed);
        if desired.touched().next().is_none() {
            return Ok(Outcome::Unchanged);
        }
        self.update(resource, &desired)?;
        Ok(Outcome::Updated)
    }
}

fn expect_ok(endpoint: &str, response: &HttpResponse) -> Result<()> {
    if response.status == 200 {
        Ok(())
    } else {
        Err(Error::UnexpectedStatus {
            status: response.status,
            endpoint: endpoint.to_string(),
        })
    }
}

/// An `err` in a write envelope is a failure whatever the status.
fn check_envelope(endpoint: &str, response: &HttpResponse, envelope: &ResponseEnvelope) -> Result<()> {
    match envelope.error_message() {
        Some(message) => Err(ApiError {
            message: message.to_string(),
            status: response.status,
            endpoint: endpoint.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}
