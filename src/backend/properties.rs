//! Property bags mirrored from ConnMan objects.
//!
//! ConnMan reports every object as `a{sv}`. Values are scalars, string
//! lists, or one level of nested dictionaries (`Ethernet`, `IPv4`, ...).
//! Updates are partial: nested dictionaries merge per inner key.

use std::collections::{BTreeMap, HashMap};

use zbus::zvariant::{OwnedValue, Value};

use super::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl TryFrom<&Value<'_>> for PropertyValue {
    type Error = Error;

    fn try_from(value: &Value<'_>) -> Result<Self> {
        Ok(match value {
            Value::Bool(b) => Self::Bool(*b),
            Value::U8(n) => Self::Int(i64::from(*n)),
            Value::I16(n) => Self::Int(i64::from(*n)),
            Value::U16(n) => Self::Int(i64::from(*n)),
            Value::I32(n) => Self::Int(i64::from(*n)),
            Value::U32(n) => Self::Int(i64::from(*n)),
            Value::I64(n) => Self::Int(*n),
            Value::U64(n) => Self::Int(i64::try_from(*n).unwrap_or(i64::MAX)),
            Value::F64(f) => Self::Float(*f),
            Value::Str(s) => Self::Text(s.to_string()),
            Value::ObjectPath(p) => Self::Text(p.to_string()),
            Value::Value(inner) => Self::try_from(inner.as_ref())?,
            Value::Array(items) => Self::List(
                items
                    .iter()
                    .map(|item| PropertyValue::try_from(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Dict(_) => {
                let entries = HashMap::<String, OwnedValue>::try_from(value.try_to_owned()?)?;
                let mut map = BTreeMap::new();
                for (key, inner) in &entries {
                    map.insert(key.clone(), Self::try_from(&**inner)?);
                }
                Self::Map(map)
            }
            other => {
                return Err(Error::MalformedProperty {
                    name: String::new(),
                    reason: format!("unsupported signature {}", other.value_signature()),
                })
            }
        })
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u8> for PropertyValue {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(value: PropertyMap) -> Self {
        Self::Map(value.0)
    }
}

/// Mirrored property set of one remote object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap(BTreeMap<String, PropertyValue>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a decoded `a{sv}` reply.
    pub fn from_dbus(map: &HashMap<String, OwnedValue>) -> Result<Self> {
        let mut out = BTreeMap::new();
        for (name, value) in map {
            out.insert(name.clone(), convert_named(name, value)?);
        }
        Ok(Self(out))
    }

    /// Single-entry map, as produced by a `PropertyChanged` signal.
    pub fn single(name: &str, value: PropertyValue) -> Self {
        let mut map = Self::new();
        map.insert(name, value);
        map
    }

    /// Convert the `(s, v)` payload of a `PropertyChanged` signal.
    pub fn from_change(name: &str, value: &Value<'_>) -> Result<Self> {
        Ok(Self::single(name, convert_named(name, value)?))
    }

    pub fn insert(&mut self, name: &str, value: impl Into<PropertyValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropertyValue::as_str)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(PropertyValue::as_bool)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropertyValue::as_int)
    }

    /// Inner key of a nested dictionary, e.g. `Ethernet.Interface`.
    pub fn nested_str(&self, name: &str, key: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::Map(inner) => inner.get(key).and_then(PropertyValue::as_str),
            _ => None,
        }
    }

    /// First element of a string list, e.g. the primary `Security` method.
    pub fn first_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::List(items) => items.first().and_then(PropertyValue::as_str),
            _ => None,
        }
    }

    /// Apply a partial update.
    ///
    /// Nested dictionaries merge per inner key; everything else replaces.
    pub fn merge(&mut self, delta: &PropertyMap) {
        for (name, value) in &delta.0 {
            match (self.0.get_mut(name), value) {
                (Some(PropertyValue::Map(current)), PropertyValue::Map(update)) => {
                    for (key, inner) in update {
                        current.insert(key.clone(), inner.clone());
                    }
                }
                _ => {
                    self.0.insert(name.clone(), value.clone());
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }
}

fn convert_named(name: &str, value: &Value<'_>) -> Result<PropertyValue> {
    PropertyValue::try_from(value).map_err(|e| match e {
        Error::MalformedProperty { reason, .. } => Error::MalformedProperty {
            name: name.to_string(),
            reason,
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ethernet(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs
            .iter()
            .fold(PropertyMap::new(), |map, (k, v)| map.with(k, *v))
    }

    #[test]
    fn nested_merge_keeps_absent_inner_keys() {
        let mut props = PropertyMap::new()
            .with("Name", "Home")
            .with(
                "Ethernet",
                ethernet(&[("Interface", "wlan0"), ("Address", "00:11:22:33:44:55")]),
            );

        props.merge(&PropertyMap::new().with("Ethernet", ethernet(&[("MTU", "1500")])));

        assert_eq!(props.nested_str("Ethernet", "Interface"), Some("wlan0"));
        assert_eq!(props.nested_str("Ethernet", "Address"), Some("00:11:22:33:44:55"));
        assert_eq!(props.nested_str("Ethernet", "MTU"), Some("1500"));
        assert_eq!(props.str("Name"), Some("Home"));
    }

    #[test]
    fn nested_merge_overwrites_present_inner_keys() {
        let mut props =
            PropertyMap::new().with("Ethernet", ethernet(&[("Interface", "wlan0")]));
        props.merge(&PropertyMap::new().with("Ethernet", ethernet(&[("Interface", "wlan1")])));
        assert_eq!(props.nested_str("Ethernet", "Interface"), Some("wlan1"));
    }

    #[test]
    fn lists_and_scalars_replace() {
        let mut props = PropertyMap::new()
            .with("Security", vec!["psk", "wps"])
            .with("Strength", 40u8);
        props.merge(
            &PropertyMap::new()
                .with("Security", vec!["none"])
                .with("Strength", 90u8),
        );
        assert_eq!(props.first_str("Security"), Some("none"));
        assert_eq!(props.get("Security"), Some(&PropertyValue::from(vec!["none"])));
        assert_eq!(props.int("Strength"), Some(90));
    }

    #[test]
    fn converts_dbus_scalars_and_arrays() {
        assert_eq!(
            PropertyValue::try_from(&Value::from(true)).unwrap(),
            PropertyValue::Bool(true)
        );
        assert_eq!(
            PropertyValue::try_from(&Value::from(72u8)).unwrap(),
            PropertyValue::Int(72)
        );
        assert_eq!(
            PropertyValue::try_from(&Value::from("ready")).unwrap(),
            PropertyValue::Text("ready".into())
        );
        assert_eq!(
            PropertyValue::try_from(&Value::new(vec!["psk", "wps"])).unwrap(),
            PropertyValue::from(vec!["psk", "wps"])
        );
    }

    #[test]
    fn unwraps_nested_variants() {
        let wrapped = Value::Value(Box::new(Value::from("online")));
        assert_eq!(
            PropertyValue::try_from(&wrapped).unwrap(),
            PropertyValue::Text("online".into())
        );
    }

    #[test]
    fn reply_maps_convert_every_entry() {
        let mut raw = HashMap::new();
        raw.insert(
            "State".to_string(),
            OwnedValue::try_from(Value::from("idle")).unwrap(),
        );
        raw.insert(
            "Favorite".to_string(),
            OwnedValue::try_from(Value::from(false)).unwrap(),
        );
        let props = PropertyMap::from_dbus(&raw).unwrap();
        assert_eq!(props.str("State"), Some("idle"));
        assert_eq!(props.bool("Favorite"), Some(false));
    }

    #[test]
    fn property_change_becomes_single_entry_delta() {
        let delta = PropertyMap::from_change("Strength", &Value::from(64u8)).unwrap();
        assert_eq!(delta.int("Strength"), Some(64));
        assert_eq!(delta.iter().count(), 1);
    }
}
