//! Parameter sources and their normalization into a name to value map.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::NimbleError;
use crate::meta::finders::GetterByParam;
use crate::meta::{Accessible, MemberSet};
use crate::types::Value;

/// Parameter name to value.
pub type ValueMap = HashMap<String, Value>;

/// Explicit name/value pairs.
///
/// ```rust
/// use nimble_sql::prelude::*;
///
/// let params = NbParams::new().add("id", 7_i64).add("name", "Tyrion");
/// assert_eq!(params.get("id"), Some(&Value::Long(7)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NbParams {
    values: IndexMap<String, Value>,
}

impl NbParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing any earlier value.
    #[must_use]
    pub fn add(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Where named parameter values come from.
#[derive(Clone, Default)]
pub enum ParamSource<'a> {
    /// No source; only explicitly set parameters are available.
    #[default]
    None,
    Map(&'a ValueMap),
    /// A JSON object, typically produced by [`ParamSource::serialized`].
    Json(JsonValue),
    /// Accessors of an entity, matched as `get_` + parameter name.
    Object(&'a dyn Accessible),
    Params(NbParams),
}

impl std::fmt::Debug for ParamSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamSource::None => f.write_str("None"),
            ParamSource::Map(map) => f.debug_tuple("Map").field(map).finish(),
            ParamSource::Json(json) => f.debug_tuple("Json").field(json).finish(),
            ParamSource::Object(obj) => f
                .debug_tuple("Object")
                .field(&obj.entity_meta().type_name)
                .finish(),
            ParamSource::Params(params) => f.debug_tuple("Params").field(params).finish(),
        }
    }
}

impl<'a> ParamSource<'a> {
    /// Serialize `value` into a JSON source.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::SourceError` if serialization fails.
    pub fn serialized<T: Serialize + ?Sized>(value: &T) -> Result<Self, NimbleError> {
        serde_json::to_value(value)
            .map(ParamSource::Json)
            .map_err(|e| NimbleError::SourceError(e.to_string()))
    }

    /// Resolve every name in `names` against this source.
    ///
    /// Repeated names are resolved once.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::BindingError` naming the first parameter with no value,
    /// or `NimbleError::SourceError` if a JSON source is not an object.
    pub fn value_map(&self, names: &[&str]) -> Result<ValueMap, NimbleError> {
        match self {
            ParamSource::None => match names.first() {
                Some(name) => Err(NimbleError::binding(name, "no parameter source")),
                None => Ok(ValueMap::new()),
            },
            ParamSource::Map(map) => Ok((*map).clone()),
            ParamSource::Json(json) => json_values(json, names),
            ParamSource::Object(obj) => object_values(*obj, names),
            ParamSource::Params(params) => {
                let mut out = ValueMap::with_capacity(names.len());
                for name in names {
                    let value = params
                        .get(name)
                        .ok_or_else(|| NimbleError::binding(name, "not set"))?;
                    out.insert((*name).to_string(), value.clone());
                }
                Ok(out)
            }
        }
    }
}

impl<'a> From<&'a ValueMap> for ParamSource<'a> {
    fn from(map: &'a ValueMap) -> Self {
        ParamSource::Map(map)
    }
}

impl From<NbParams> for ParamSource<'_> {
    fn from(params: NbParams) -> Self {
        ParamSource::Params(params)
    }
}

fn object_values(obj: &dyn Accessible, names: &[&str]) -> Result<ValueMap, NimbleError> {
    let meta = obj.entity_meta();
    let mut getters = MemberSet::new(meta.methods);
    let mut out = ValueMap::with_capacity(names.len());

    for name in names {
        if out.contains_key(*name) {
            continue;
        }
        let mut finder = GetterByParam::new(name);
        getters.enumerate(&mut [&mut finder]);
        let getter = finder
            .matched
            .map(|index| getters.get(index))
            .ok_or_else(|| {
                NimbleError::binding(name, format!("no accessor on {}", meta.type_name))
            })?;
        let value = obj.get(getter.name).ok_or_else(|| {
            NimbleError::metadata(meta.type_name, format!("accessor {} not implemented", getter.name))
        })?;
        out.insert((*name).to_string(), value);
    }
    Ok(out)
}

fn json_values(json: &JsonValue, names: &[&str]) -> Result<ValueMap, NimbleError> {
    let JsonValue::Object(object) = json else {
        return Err(NimbleError::SourceError(format!(
            "parameter source must serialize to an object, got {json}"
        )));
    };
    let mut out = ValueMap::with_capacity(names.len());
    for name in names {
        let value = object
            .get(*name)
            .ok_or_else(|| NimbleError::binding(name, "missing from serialized source"))?;
        out.insert((*name).to_string(), json_to_value(value));
    }
    Ok(out)
}

/// Scalars map to their natural variant, arrays to `List`, objects stay `Json`.
#[must_use]
pub fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Long)
            .or_else(|| n.as_f64().map(Value::Double))
            .unwrap_or_else(|| Value::Text(n.to_string())),
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        JsonValue::Object(_) => Value::Json(json.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{EntityMeta, Member};
    use crate::types::ValueType;

    struct Probe {
        name: String,
        age: i32,
    }

    static PROBE: EntityMeta = EntityMeta {
        type_name: "Probe",
        table: None,
        fields: &[],
        methods: &[
            Member::getter("get_name", ValueType::Text),
            Member::getter("get_age", ValueType::Int),
        ],
    };

    impl Accessible for Probe {
        fn entity_meta(&self) -> &'static EntityMeta {
            &PROBE
        }

        fn get(&self, accessor: &str) -> Option<Value> {
            match accessor {
                "get_name" => Some(Value::Text(self.name.clone())),
                "get_age" => Some(Value::Int(self.age)),
                _ => None,
            }
        }

        fn set(&mut self, mutator: &str, _value: Value) -> Result<(), NimbleError> {
            Err(PROBE.unknown_member(mutator))
        }
    }

    #[test]
    fn object_accessors_match_case_insensitively() {
        let probe = Probe {
            name: "Jaime".into(),
            age: 40,
        };
        let source = ParamSource::Object(&probe);
        let map = source.value_map(&["NAME", "age", "NAME"]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["NAME"], Value::Text("Jaime".into()));
        assert_eq!(map["age"], Value::Int(40));
    }

    #[test]
    fn object_missing_accessor_names_the_parameter() {
        let probe = Probe {
            name: String::new(),
            age: 0,
        };
        let err = ParamSource::Object(&probe)
            .value_map(&["name", "birthDate"])
            .unwrap_err();
        assert_eq!(err.parameter(), Some("birthDate"));
    }

    #[test]
    fn each_accessor_is_used_once_per_call() {
        let probe = Probe {
            name: "x".into(),
            age: 1,
        };
        let err = ParamSource::Object(&probe)
            .value_map(&["name", "Name"])
            .unwrap_err();
        assert_eq!(err.parameter(), Some("Name"));
    }

    #[test]
    fn builder_lookup_is_direct() {
        let source = ParamSource::from(NbParams::new().add("a", 1_i64));
        assert_eq!(source.value_map(&["a"]).unwrap()["a"], Value::Long(1));
        assert_eq!(
            source.value_map(&["b"]).unwrap_err().parameter(),
            Some("b")
        );
    }

    #[derive(Serialize)]
    struct Filter {
        name: &'static str,
        ids: Vec<i64>,
        extra: serde_json::Value,
    }

    #[test]
    fn serialized_sources_become_values() {
        let filter = Filter {
            name: "Cercei",
            ids: vec![1, 2],
            extra: serde_json::json!({"k": true}),
        };
        let source = ParamSource::serialized(&filter).unwrap();
        let map = source.value_map(&["name", "ids", "extra"]).unwrap();
        assert_eq!(map["name"], Value::Text("Cercei".into()));
        assert_eq!(map["ids"], Value::List(vec![Value::Long(1), Value::Long(2)]));
        assert_eq!(map["extra"], Value::Json(serde_json::json!({"k": true})));

        let scalar = ParamSource::serialized(&5).unwrap();
        let err = scalar.value_map(&["x"]).unwrap_err();
        assert!(matches!(err, NimbleError::SourceError(_)));
    }
}
