//! Value and parameter types shared by every driver.

use std::fmt;

/// Default command timeout, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT: u32 = 30;

/// A single database value, as bound to a parameter or read from a row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Blob(v) => write!(f, "0x{}", hex::encode(v)),
        }
    }
}

macro_rules! value_from_integer {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Integer(i64::from(v))
            }
        })*
    };
}

value_from_integer!(i8, i16, i32, i64, u8, u16, u32, bool);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A named parameter bound to a command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Strip a leading `@`, `:` or `$` placeholder prefix.
pub fn bare_parameter_name(name: &str) -> &str {
    name.strip_prefix(['@', ':', '$']).unwrap_or(name)
}

/// Ordered set of parameters attached to a command.
///
/// Lookups by name ignore the placeholder prefix, so `@age`, `:age` and
/// `age` all refer to the same parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterCollection {
    items: Vec<Parameter>,
}

impl ParameterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, parameter: Parameter) {
        self.items.push(parameter);
    }

    /// Add a parameter built from a name and value.
    pub fn add_with_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.add(Parameter::new(name, value));
    }

    pub fn add_range(&mut self, parameters: impl IntoIterator<Item = Parameter>) {
        self.items.extend(parameters);
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        let wanted = bare_parameter_name(name);
        self.items
            .iter()
            .find(|p| bare_parameter_name(&p.name) == wanted)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        let wanted = bare_parameter_name(name);
        self.items
            .iter_mut()
            .find(|p| bare_parameter_name(&p.name) == wanted)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove the parameter with the given name, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<Parameter> {
        let wanted = bare_parameter_name(name);
        let index = self
            .items
            .iter()
            .position(|p| bare_parameter_name(&p.name) == wanted)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a ParameterCollection {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Parameter> for ParameterCollection {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Closed,
    Open,
    Connecting,
    Executing,
    Fetching,
    Broken,
}

/// Transaction isolation level requested from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IsolationLevel {
    #[default]
    Unspecified,
    Chaos,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
    Snapshot,
}

/// How the command text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandType {
    #[default]
    Text,
    StoredProcedure,
    TableDirect,
}

/// How command results are applied to an updated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdateRowSource {
    None,
    OutputParameters,
    FirstReturnedRecord,
    #[default]
    Both,
}
