use std::collections::HashMap;

/// Routing marker of a call site.
///
/// `routing_key` names the argument attribute to route by; empty means the
/// configured default. `split_table` enables statement rewriting; left unset
/// on a method marker, it is taken from the namespace marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSpec {
    pub routing_key: String,
    pub split_table: Option<bool>,
}

impl RouteSpec {
    /// Route by an explicit attribute.
    pub fn key(routing_key: &str) -> Self {
        Self {
            routing_key: routing_key.to_string(),
            split_table: None,
        }
    }

    /// Route by the configured default attribute.
    pub fn default_key() -> Self {
        Self::default()
    }

    pub fn split_table(mut self, split_table: bool) -> Self {
        self.split_table = Some(split_table);
        self
    }
}

/// Call-site markers keyed by call identifier (`namespace.method`).
///
/// A marker registered for a namespace (e.g. `app.UserDao`) covers every
/// call in it that has no marker of its own.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    specs: HashMap<String, RouteSpec>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, call_id: &str, spec: RouteSpec) -> &mut Self {
        self.specs.insert(call_id.to_string(), spec);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, call_id: &str, spec: RouteSpec) -> Self {
        self.register(call_id, spec);
        self
    }

    pub fn lookup(&self, call_id: &str) -> Option<&RouteSpec> {
        self.specs.get(call_id).or_else(|| {
            call_id
                .rsplit_once('.')
                .and_then(|(namespace, _)| self.specs.get(namespace))
        })
    }

    /// Whether statements of this call target a split table.
    ///
    /// The call's own marker decides when it sets `split_table`; otherwise
    /// the namespace marker does.
    pub fn is_split_table(&self, call_id: &str) -> bool {
        let own = self.specs.get(call_id).and_then(|spec| spec.split_table);
        let namespace = || {
            call_id
                .rsplit_once('.')
                .and_then(|(namespace, _)| self.specs.get(namespace))
                .and_then(|spec| spec.split_table)
        };
        own.or_else(namespace).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
