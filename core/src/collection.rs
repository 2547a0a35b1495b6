//! Collection reads with server-side filtering and client-side post-filters.
//!
//! Some predicates (exact boolean matches such as `is_snapshot`) are not
//! reliable through the API's filter grammar, so `list` re-checks them on
//! the decoded entries. Results keep the server's order.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::client::{decode, Client};
use crate::error::Result;
use crate::http::HttpTransport;
use crate::query::QueryOptions;
use crate::types::ObservedState;

/// Read-many queries over one client.
pub struct CollectionQuery<'c, T: HttpTransport> {
    client: &'c Client<T>,
}

impl<'c, T: HttpTransport> CollectionQuery<'c, T> {
    pub fn new(client: &'c Client<T>) -> Self {
        Self { client }
    }

    pub(crate) fn client(&self) -> &'c Client<T> {
        self.client
    }

    /// One GET on `endpoint`, keeping entries that pass `predicate`.
    pub fn list(
        &self,
        endpoint: &str,
        query: &QueryOptions,
        predicate: Option<&dyn Fn(&ObservedState) -> bool>,
    ) -> Result<Vec<ObservedState>> {
        let response = self.client.get(endpoint, Some(query))?;
        let entries: Vec<Map<String, Value>> = decode(endpoint, &response)?;
        let entries = entries.into_iter().map(ObservedState::new);
        Ok(match predicate {
            Some(keep) => entries.filter(|entry| keep(entry)).collect(),
            None => entries.collect(),
        })
    }

    /// Like `list`, decoding each entry into `D` before filtering.
    pub fn list_as<D: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &QueryOptions,
        predicate: impl Fn(&D) -> bool,
    ) -> Result<Vec<D>> {
        let response = self.client.get(endpoint, Some(query))?;
        let entries: Vec<D> = decode(endpoint, &response)?;
        Ok(entries.into_iter().filter(|entry| predicate(entry)).collect())
    }
}

/// Keep entries whose `key` equals `expected`.
pub fn field_equals(key: &str, expected: Value) -> impl Fn(&ObservedState) -> bool + '_ {
    move |entry| entry.matches(key, &expected)
}
