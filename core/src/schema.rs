//! Field-level schema for managed resource kinds.
//!
//! # Design
//! Each kind declares a field enum; every variant maps to a `FieldSpec`
//! holding its JSON key, type, access, and encoding policy. Desired state is
//! keyed by that enum, so nothing in the reconciler looks fields up by name.
//! Kinds are declared with `resource_kind!`.

use std::fmt::Debug;
use std::hash::Hash;

use serde_json::Value;
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Str,
    Bool,
}

impl FieldType {
    /// The value an unset field of this type decodes to.
    pub fn zero(self) -> Value {
        match self {
            FieldType::Int => Value::from(0),
            FieldType::Str => Value::from(""),
            FieldType::Bool => Value::from(false),
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Str => value.is_string(),
            FieldType::Bool => value.is_boolean(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldType::Int => "integer",
            FieldType::Str => "string",
            FieldType::Bool => "boolean",
        }
    }
}

/// Who may write a field, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    /// Written on create only; changing it means replacing the resource.
    CreateOnly,
    /// Server-populated; never sent.
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub ty: FieldType,
    pub access: Access,
    pub required: bool,
    /// A zero value (`0`, `""`) is sent as `null`.
    pub nullable: bool,
    /// Allowed values for string fields; empty means unconstrained.
    pub one_of: &'static [&'static str],
}

impl FieldSpec {
    const fn of(key: &'static str, ty: FieldType) -> Self {
        Self {
            key,
            ty,
            access: Access::ReadWrite,
            required: false,
            nullable: false,
            one_of: &[],
        }
    }

    pub const fn int(key: &'static str) -> Self {
        Self::of(key, FieldType::Int)
    }

    pub const fn string(key: &'static str) -> Self {
        Self::of(key, FieldType::Str)
    }

    pub const fn boolean(key: &'static str) -> Self {
        Self::of(key, FieldType::Bool)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn create_only(mut self) -> Self {
        self.access = Access::CreateOnly;
        self
    }

    pub const fn computed(mut self) -> Self {
        self.access = Access::ReadOnly;
        self
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.one_of = values;
        self
    }

    pub fn is_settable(&self) -> bool {
        self.access != Access::ReadOnly
    }

    /// Check `value` against the declared type and allowed values.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        if value.is_null() {
            return if self.nullable {
                Ok(())
            } else {
                Err("null is not allowed".to_string())
            };
        }
        if !self.ty.accepts(value) {
            return Err(format!("expected {}, got {value}", self.ty.name()));
        }
        if let (false, Some(s)) = (self.one_of.is_empty(), value.as_str()) {
            if !self.one_of.contains(&s) {
                return Err(format!("expected one of {}", self.one_of.join(", ")));
            }
        }
        Ok(())
    }

    /// The wire form of `value` under this field's policy.
    pub fn encode(&self, value: &Value) -> Value {
        if self.nullable && *value == self.ty.zero() {
            Value::Null
        } else {
            value.clone()
        }
    }
}

/// A field identifier of one resource kind.
pub trait Field: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Every field, in declaration order.
    const ALL: &'static [Self];

    fn spec(self) -> FieldSpec;

    fn key(self) -> &'static str {
        self.spec().key
    }
}

/// A category of managed remote object.
pub trait ResourceKind {
    /// Short name used in errors and logs.
    const NAME: &'static str;
    /// Collection path relative to the host, e.g. `api/v4/vms`.
    const ENDPOINT: &'static str;

    type Field: Field;

    /// Path of one member, with `key` escaped as a single path segment.
    fn member_endpoint(key: &str) -> String {
        format!("{}/{}", Self::ENDPOINT, encode_path_segment(key))
    }
}

/// Percent-encode `segment` so `/`, `?`, `#` and friends cannot leave it.
///
/// `.` and `..` pass through unchanged; callers reject them as keys.
pub fn encode_path_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes())
        .map(|chunk| if chunk == "+" { "%20" } else { chunk })
        .collect()
}

/// Declare a resource kind and its field enum.
///
/// ```
/// use vergeio_core::resource_kind;
/// use vergeio_core::schema::{Field, FieldSpec, ResourceKind};
///
/// resource_kind! {
///     /// Snapshot profiles.
///     pub struct Profile("snapshot_profile", "api/v4/snapshot_profiles");
///     pub enum ProfileField {
///         Name => FieldSpec::string("name").required(),
///         Description => FieldSpec::string("description"),
///     }
/// }
///
/// assert_eq!(Profile::ENDPOINT, "api/v4/snapshot_profiles");
/// assert_eq!(ProfileField::Name.key(), "name");
/// ```
#[macro_export]
macro_rules! resource_kind {
    (
        $(#[$kind_meta:meta])*
        $vis:vis struct $kind:ident($name:literal, $endpoint:literal);
        $(#[$field_meta:meta])*
        $field_vis:vis enum $field:ident {
            $( $(#[$variant_meta:meta])* $variant:ident => $spec:expr ),+ $(,)?
        }
    ) => {
        $(#[$kind_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis struct $kind;

        $(#[$field_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $field_vis enum $field {
            $( $(#[$variant_meta])* $variant ),+
        }

        impl $crate::schema::Field for $field {
            const ALL: &'static [Self] = &[ $( $field::$variant ),+ ];

            fn spec(self) -> $crate::schema::FieldSpec {
                match self {
                    $( $field::$variant => $spec ),+
                }
            }
        }

        impl $crate::schema::ResourceKind for $kind {
            const NAME: &'static str = $name;
            const ENDPOINT: &'static str = $endpoint;
            type Field = $field;
        }
    };
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    crate::resource_kind! {
        struct Widget("widget", "api/v4/widgets");
        enum WidgetField {
            Name => FieldSpec::string("name").required(),
            Size => FieldSpec::int("size"),
            Parent => FieldSpec::int("parent").nullable(),
            Color => FieldSpec::string("color").one_of(&["red", "blue"]),
            Serial => FieldSpec::string("serial").computed(),
        }
    }

    #[test]
    fn macro_wires_kind_and_fields() {
        assert_eq!(Widget::NAME, "widget");
        assert_eq!(Widget::member_endpoint("3"), "api/v4/widgets/3");
        assert_eq!(WidgetField::ALL.len(), 5);
        assert_eq!(WidgetField::Parent.key(), "parent");
        assert!(WidgetField::Name.spec().required);
        assert!(!WidgetField::Serial.spec().is_settable());
    }

    #[test]
    fn member_endpoint_keeps_key_in_one_segment() {
        assert_eq!(
            Widget::member_endpoint("../users/1"),
            "api/v4/widgets/..%2Fusers%2F1"
        );
        assert_eq!(Widget::member_endpoint("a?b"), "api/v4/widgets/a%3Fb");
        assert_eq!(Widget::member_endpoint("x#y"), "api/v4/widgets/x%23y");
        assert_eq!(Widget::member_endpoint("a b+c"), "api/v4/widgets/a%20b%2Bc");
    }

    #[test]
    fn validate_checks_type() {
        let spec = WidgetField::Size.spec();
        assert!(spec.validate(&json!(4)).is_ok());
        assert_eq!(
            spec.validate(&json!("4")).unwrap_err(),
            "expected integer, got \"4\""
        );
    }

    #[test]
    fn validate_checks_allowed_values() {
        let spec = WidgetField::Color.spec();
        assert!(spec.validate(&json!("red")).is_ok());
        assert_eq!(
            spec.validate(&json!("green")).unwrap_err(),
            "expected one of red, blue"
        );
    }

    #[test]
    fn null_only_allowed_when_nullable() {
        assert!(WidgetField::Parent.spec().validate(&Value::Null).is_ok());
        assert!(WidgetField::Size.spec().validate(&Value::Null).is_err());
    }

    #[test]
    fn nullable_zero_encodes_as_null() {
        assert_eq!(WidgetField::Parent.spec().encode(&json!(0)), Value::Null);
        assert_eq!(WidgetField::Parent.spec().encode(&json!(9)), json!(9));
        assert_eq!(WidgetField::Size.spec().encode(&json!(0)), json!(0));
    }
}
