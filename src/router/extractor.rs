use crate::core::{Result, RouterError};
use log::warn;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

/// A call argument the router can read a routing attribute from.
///
/// Plain strings are the routing value themselves; structured arguments
/// expose named fields.
pub trait RouteArgument: Sync {
    /// The argument as a bare routing value, if it is a plain string.
    fn as_plain_str(&self) -> Option<&str> {
        None
    }

    /// Value of the named field rendered as a string.
    fn field(&self, name: &str) -> Option<String>;
}

impl RouteArgument for &str {
    fn as_plain_str(&self) -> Option<&str> {
        Some(*self)
    }

    fn field(&self, _name: &str) -> Option<String> {
        None
    }
}

impl RouteArgument for String {
    fn as_plain_str(&self) -> Option<&str> {
        Some(self)
    }

    fn field(&self, _name: &str) -> Option<String> {
        None
    }
}

impl RouteArgument for JsonValue {
    fn as_plain_str(&self) -> Option<&str> {
        self.as_str()
    }

    fn field(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl RouteArgument for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl RouteArgument for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Implement [`RouteArgument`] for a struct by listing the fields that may
/// carry a routing value. Each listed field must implement `ToString`.
///
/// ```
/// use db_router::{route_fields, RouteArgument};
///
/// struct UserReq {
///     user_id: String,
///     age: u32,
/// }
///
/// route_fields!(UserReq { "userId" => user_id, "age" => age });
///
/// let req = UserReq { user_id: "u-1".into(), age: 7 };
/// assert_eq!(req.field("userId").as_deref(), Some("u-1"));
/// assert_eq!(req.field("age").as_deref(), Some("7"));
/// assert_eq!(req.field("name"), None);
/// ```
#[macro_export]
macro_rules! route_fields {
    ($ty:ty { $($name:literal => $field:ident),+ $(,)? }) => {
        impl $crate::RouteArgument for $ty {
            fn field(&self, name: &str) -> Option<String> {
                match name {
                    $($name => Some(self.$field.to_string()),)+
                    _ => None,
                }
            }
        }
    };
}

/// Resolves the routing value out of a call's arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeExtractor;

impl AttributeExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `attribute` from `args`.
    ///
    /// A single plain-string argument is the routing value itself. Otherwise
    /// arguments are scanned in order and the first non-blank field named
    /// `attribute` wins.
    pub fn extract(&self, attribute: &str, args: &[&dyn RouteArgument]) -> Result<String> {
        if let [single] = args {
            if let Some(value) = single.as_plain_str() {
                return Ok(value.to_string());
            }
        }

        let found = args
            .iter()
            .filter_map(|arg| arg.field(attribute))
            .find(|value| !value.trim().is_empty());

        match found {
            Some(value) => Ok(value),
            None => {
                warn!(
                    "routing attribute '{}' not found in {} call argument(s)",
                    attribute,
                    args.len()
                );
                Err(RouterError::AttributeNotFound(attribute.to_string()))
            }
        }
    }
}
