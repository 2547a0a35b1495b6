//! Desired state and the sparse payloads built from it.
//!
//! # Design
//! The API treats an absent field as "leave unchanged", so a payload must
//! carry exactly the fields the caller means to write. `DesiredState` keeps a
//! value per field plus a separate touched set; `Changeset` serializes only
//! the touched fields, each encoded under its declared `FieldSpec` policy.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::schema::{Access, Field, ResourceKind};
use crate::types::ObservedState;

/// Field values for one kind, with a touched marker per field.
pub struct DesiredState<K: ResourceKind> {
    values: BTreeMap<K::Field, Value>,
    touched: BTreeSet<K::Field>,
    kind: PhantomData<K>,
}

impl<K: ResourceKind> DesiredState<K> {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            touched: BTreeSet::new(),
            kind: PhantomData,
        }
    }

    /// Record `value` for `field` and mark it touched.
    pub fn set(&mut self, field: K::Field, value: impl Into<Value>) -> Result<&mut Self> {
        let spec = field.spec();
        let value = value.into();
        let invalid = |message: String| Error::InvalidField {
            kind: K::NAME,
            field: spec.key,
            message,
        };
        if !spec.is_settable() {
            return Err(invalid("field is read-only".to_string()));
        }
        spec.validate(&value).map_err(invalid)?;
        self.values.insert(field, value);
        self.touched.insert(field);
        Ok(self)
    }

    /// Builder form of `set`.
    pub fn with(mut self, field: K::Field, value: impl Into<Value>) -> Result<Self> {
        self.set(field, value)?;
        Ok(self)
    }

    pub fn get(&self, field: K::Field) -> Option<&Value> {
        self.values.get(&field)
    }

    pub fn is_touched(&self, field: K::Field) -> bool {
        self.touched.contains(&field)
    }

    /// Touched fields in declaration order.
    pub fn touched(&self) -> impl Iterator<Item = K::Field> + '_ {
        self.touched.iter().copied()
    }

    /// Mark `field` touched; no-op when it has no value.
    pub fn touch(&mut self, field: K::Field) {
        if self.values.contains_key(&field) {
            self.touched.insert(field);
        }
    }

    pub fn untouch(&mut self, field: K::Field) {
        self.touched.remove(&field);
    }

    /// Mark every field that has a value.
    pub fn touch_all(&mut self) {
        self.touched = self.values.keys().copied().collect();
    }

    pub fn untouch_all(&mut self) {
        self.touched.clear();
    }

    /// Keep touched only the fields whose value differs from `observed`.
    pub fn touch_changed(&mut self, observed: &ObservedState) {
        self.touched = self
            .values
            .iter()
            .filter(|(field, value)| differs(**field, value, observed))
            .map(|(field, _)| *field)
            .collect();
    }

    /// Required fields the next changeset would not carry: unset, or set
    /// but untouched.
    pub fn missing_required(&self) -> Vec<K::Field> {
        K::Field::ALL
            .iter()
            .copied()
            .filter(|f| {
                f.spec().required && !(self.values.contains_key(f) && self.touched.contains(f))
            })
            .collect()
    }

    /// True when a create-only field differs from `observed`.
    pub fn requires_replacement(&self, observed: &ObservedState) -> bool {
        self.values.iter().any(|(field, value)| {
            field.spec().access == Access::CreateOnly && differs(*field, value, observed)
        })
    }

    /// Touched create-only fields, which an in-place update cannot write.
    pub(crate) fn touched_create_only(&self) -> Option<K::Field> {
        self.touched()
            .find(|f| f.spec().access == Access::CreateOnly)
    }

    pub fn changeset(&self) -> Changeset {
        Changeset::build(self)
    }
}

impl<K: ResourceKind> Default for DesiredState<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ResourceKind> Clone for DesiredState<K> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            touched: self.touched.clone(),
            kind: PhantomData,
        }
    }
}

impl<K: ResourceKind> fmt::Debug for DesiredState<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesiredState")
            .field("kind", &K::NAME)
            .field("values", &self.values)
            .field("touched", &self.touched)
            .finish()
    }
}

fn differs<F: Field>(field: F, desired: &Value, observed: &ObservedState) -> bool {
    let spec = field.spec();
    let current = match observed.get(spec.key) {
        None | Some(Value::Null) => spec.ty.zero(),
        Some(v) => v.clone(),
    };
    spec.encode(desired) != spec.encode(&current)
}

/// Sparse JSON object holding exactly the touched fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset(Map<String, Value>);

impl Changeset {
    pub fn build<K: ResourceKind>(desired: &DesiredState<K>) -> Self {
        let mut body = Map::new();
        for field in desired.touched() {
            if let Some(value) = desired.get(field) {
                let spec = field.spec();
                body.insert(spec.key.to_string(), spec.encode(value));
            }
        }
        Self(body)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.0).map_err(|e| Error::Encode(e.to_string()))
    }
}
