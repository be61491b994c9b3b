use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{FieldKind, RecordError, Result};

/// One value stored under a key of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<f64>),
    Record(Record),
    List(Vec<Record>),
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Bool(_) => FieldKind::Bool,
            Field::Int(_) => FieldKind::Int,
            Field::Float(_) => FieldKind::Float,
            Field::Str(_) => FieldKind::Str,
            Field::Tuple(_) => FieldKind::Tuple,
            Field::Record(_) => FieldKind::Record,
            Field::List(_) => FieldKind::List,
        }
    }
}

/// Ordered key/value store used as the persistence medium for the whole
/// widget tree. Writers fill a fresh record top down, readers drain one
/// with typed accessors and explicit defaults, so missing keys never
/// fail and foreign keys are simply left untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: IndexMap<String, Field>,
}

impl Record {
    pub fn new() -> Self {
        Record {
            fields: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Stores a scalar under `key`. Writing the same key twice is a
    /// hard error so serialization bugs surface at the source.
    pub fn write(&mut self, key: &str, value: impl Into<Field>) -> Result<()> {
        if self.fields.contains_key(key) {
            return Err(RecordError::DuplicateKey {
                key: key.to_string(),
            });
        }
        self.fields.insert(key.to_string(), value.into());
        Ok(())
    }

    fn fetch(&self, key: &str, expected: FieldKind) -> Result<Option<&Field>> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(field) if field.kind() == expected => Ok(Some(field)),
            Some(field) => Err(RecordError::KindMismatch {
                key: key.to_string(),
                expected,
                actual: field.kind(),
            }),
        }
    }

    pub fn read_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.fetch(key, FieldKind::Bool)? {
            Some(Field::Bool(value)) => Ok(*value),
            _ => Ok(default),
        }
    }

    pub fn read_int(&self, key: &str, default: i64) -> Result<i64> {
        match self.fetch(key, FieldKind::Int)? {
            Some(Field::Int(value)) => Ok(*value),
            _ => Ok(default),
        }
    }

    pub fn read_float(&self, key: &str, default: f64) -> Result<f64> {
        match self.fetch(key, FieldKind::Float)? {
            Some(Field::Float(value)) => Ok(*value),
            _ => Ok(default),
        }
    }

    pub fn read_str(&self, key: &str, default: &str) -> Result<String> {
        match self.fetch(key, FieldKind::Str)? {
            Some(Field::Str(value)) => Ok(value.clone()),
            _ => Ok(default.to_string()),
        }
    }

    /// Reads a coordinate pair. Tuples of any other arity are invalid.
    pub fn read_pair(&self, key: &str, default: (f64, f64)) -> Result<(f64, f64)> {
        match self.fetch(key, FieldKind::Tuple)? {
            Some(Field::Tuple(values)) => {
                if values.len() != 2 {
                    return Err(RecordError::invalid(key, "wrong tuple dimensions"));
                }
                Ok((values[0], values[1]))
            }
            _ => Ok(default),
        }
    }

    /// Appends an empty record to the list under `key`, creating the
    /// list on first use, and hands the new entry out for filling.
    pub fn push(&mut self, key: &str) -> Result<&mut Record> {
        let field = self
            .fields
            .entry(key.to_string())
            .or_insert_with(|| Field::List(Vec::new()));
        match field {
            Field::List(items) => {
                items.push(Record::new());
                let index = items.len() - 1;
                Ok(&mut items[index])
            }
            other => Err(RecordError::KindMismatch {
                key: key.to_string(),
                expected: FieldKind::List,
                actual: other.kind(),
            }),
        }
    }

    /// Removes and returns the front entry of the list under `key`.
    /// A missing key or an exhausted list yields `None`.
    pub fn pop(&mut self, key: &str) -> Result<Option<Record>> {
        match self.fields.get_mut(key) {
            None => Ok(None),
            Some(Field::List(items)) => {
                if items.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(items.remove(0)))
                }
            }
            Some(other) => Err(RecordError::KindMismatch {
                key: key.to_string(),
                expected: FieldKind::List,
                actual: other.kind(),
            }),
        }
    }

    /// Returns the nested record under `key`, creating it on first use.
    pub fn sub(&mut self, key: &str) -> Result<&mut Record> {
        let field = self
            .fields
            .entry(key.to_string())
            .or_insert_with(|| Field::Record(Record::new()));
        match field {
            Field::Record(record) => Ok(record),
            other => Err(RecordError::KindMismatch {
                key: key.to_string(),
                expected: FieldKind::Record,
                actual: other.kind(),
            }),
        }
    }
}

// -------------------- JSON conversion --------------------

impl Record {
    pub fn from_json_str(text: &str) -> Result<Record> {
        let value: JsonValue = serde_json::from_str(text)?;
        match value {
            JsonValue::Object(object) => Ok(Record::from_json_object(object)),
            _ => Err(RecordError::invalid("root", "expected an object")),
        }
    }

    fn from_json_object(object: JsonMap<String, JsonValue>) -> Record {
        let mut record = Record::new();
        for (key, value) in object {
            if let Some(field) = Field::from_json_value(value) {
                record.fields.insert(key, field);
            }
        }
        record
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json_value())?)
    }

    pub fn to_json_value(&self) -> JsonValue {
        JsonValue::Object(
            self.fields
                .iter()
                .map(|(key, field)| (key.clone(), field.to_json_value()))
                .collect::<JsonMap<String, JsonValue>>(),
        )
    }
}

impl Field {
    /// Maps a JSON value onto a field. Shapes with no field equivalent,
    /// null included, are dropped so documents written by newer versions
    /// still load.
    fn from_json_value(value: JsonValue) -> Option<Field> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(v) => Some(Field::Bool(v)),
            JsonValue::Number(v) => {
                if let Some(i) = v.as_i64() {
                    Some(Field::Int(i))
                } else {
                    v.as_f64().map(Field::Float)
                }
            }
            JsonValue::String(v) => Some(Field::Str(v)),
            JsonValue::Array(values) => {
                if values.is_empty() {
                    Some(Field::List(Vec::new()))
                } else if values.iter().all(|v| v.is_number()) {
                    let mut tuple = Vec::with_capacity(values.len());
                    for v in &values {
                        tuple.push(v.as_f64()?);
                    }
                    Some(Field::Tuple(tuple))
                } else if values.iter().all(|v| v.is_object()) {
                    let items = values
                        .into_iter()
                        .map(|v| match v {
                            JsonValue::Object(object) => Record::from_json_object(object),
                            _ => Record::new(),
                        })
                        .collect();
                    Some(Field::List(items))
                } else {
                    None
                }
            }
            JsonValue::Object(object) => Some(Field::Record(Record::from_json_object(object))),
        }
    }

    fn to_json_value(&self) -> JsonValue {
        match self {
            Field::Bool(v) => JsonValue::Bool(*v),
            Field::Int(v) => JsonValue::Number((*v).into()),
            Field::Float(v) => float_to_json(*v),
            Field::Str(v) => JsonValue::String(v.clone()),
            Field::Tuple(v) => JsonValue::Array(v.iter().map(|f| float_to_json(*f)).collect()),
            Field::Record(v) => v.to_json_value(),
            Field::List(v) => JsonValue::Array(v.iter().map(Record::to_json_value).collect()),
        }
    }
}

fn float_to_json(value: f64) -> JsonValue {
    match serde_json::Number::from_f64(value) {
        Some(v) => JsonValue::Number(v),
        None => JsonValue::Null,
    }
}

// -------------------- From implementations --------------------

impl From<bool> for Field {
    #[inline]
    fn from(v: bool) -> Self {
        Field::Bool(v)
    }
}

impl From<i32> for Field {
    #[inline]
    fn from(v: i32) -> Self {
        Field::Int(v as i64)
    }
}

impl From<i64> for Field {
    #[inline]
    fn from(v: i64) -> Self {
        Field::Int(v)
    }
}

impl From<f32> for Field {
    #[inline]
    fn from(v: f32) -> Self {
        Field::Float(v as f64)
    }
}

impl From<f64> for Field {
    #[inline]
    fn from(v: f64) -> Self {
        Field::Float(v)
    }
}

impl From<&str> for Field {
    #[inline]
    fn from(v: &str) -> Self {
        Field::Str(v.to_string())
    }
}

impl From<String> for Field {
    #[inline]
    fn from(v: String) -> Self {
        Field::Str(v)
    }
}

impl From<(f64, f64)> for Field {
    #[inline]
    fn from(v: (f64, f64)) -> Self {
        Field::Tuple(vec![v.0, v.1])
    }
}

impl From<(f32, f32)> for Field {
    #[inline]
    fn from(v: (f32, f32)) -> Self {
        Field::Tuple(vec![v.0 as f64, v.1 as f64])
    }
}
