use crate::core::base::*;
use log::*;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::String(v) => write!(f, "\"{}\"", v),
        }
    }
}

/// Named runtime properties, keyed by dotted names such as `sampler.type`.
/// Lookups never fail: a missing or mistyped key yields the caller's default.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    values: HashMap<String, PropertyValue>,
    keys: Vec<String>,
}

impl Properties {
    pub fn new() -> Self {
        Properties {
            values: HashMap::new(),
            keys: Vec::new(),
        }
    }

    fn set(&mut self, key: &str, v: PropertyValue) {
        if self.values.insert(key.to_string(), v).is_none() {
            self.keys.push(key.to_string());
        }
    }

    pub fn add_bool(&mut self, key: &str, v: bool) {
        self.set(key, PropertyValue::Bool(v));
    }

    pub fn add_int(&mut self, key: &str, v: i64) {
        self.set(key, PropertyValue::Int(v));
    }

    pub fn add_float(&mut self, key: &str, v: f64) {
        self.set(key, PropertyValue::Float(v));
    }

    pub fn add_string(&mut self, key: &str, v: &str) {
        self.set(key, PropertyValue::String(v.to_string()));
    }

    /// Copies every property of `other`, overriding existing keys.
    pub fn merge(&mut self, other: &Properties) {
        for key in other.keys.iter() {
            if let Some(v) = other.values.get(key) {
                self.set(key, v.clone());
            }
        }
    }

    pub fn has(&self, key: &str) -> bool {
        return self.values.contains_key(key);
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        return self.values.get(key);
    }

    pub fn keys(&self) -> &[String] {
        return &self.keys;
    }

    /// Keys starting with `prefix`, in insertion order.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        return self
            .keys
            .iter()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
    }

    pub fn find_one_bool(&self, key: &str, value: bool) -> bool {
        match self.values.get(key) {
            Some(PropertyValue::Bool(v)) => *v,
            Some(PropertyValue::Int(v)) => *v != 0,
            Some(PropertyValue::String(s)) if s == "true" || s == "false" => s == "true",
            Some(v) => {
                warn!("Property \"{}\" = {} is not a bool.", key, v);
                value
            }
            None => value,
        }
    }

    pub fn find_one_int(&self, key: &str, value: i64) -> i64 {
        match self.values.get(key) {
            Some(PropertyValue::Int(v)) => *v,
            Some(v) => {
                warn!("Property \"{}\" = {} is not an int.", key, v);
                value
            }
            None => value,
        }
    }

    pub fn find_one_float(&self, key: &str, value: Float) -> Float {
        match self.values.get(key) {
            Some(PropertyValue::Float(v)) => *v as Float,
            Some(PropertyValue::Int(v)) => *v as Float,
            Some(v) => {
                warn!("Property \"{}\" = {} is not a float.", key, v);
                value
            }
            None => value,
        }
    }

    pub fn find_one_double(&self, key: &str, value: f64) -> f64 {
        match self.values.get(key) {
            Some(PropertyValue::Float(v)) => *v,
            Some(PropertyValue::Int(v)) => *v as f64,
            Some(v) => {
                warn!("Property \"{}\" = {} is not a float.", key, v);
                value
            }
            None => value,
        }
    }

    pub fn find_one_string(&self, key: &str, value: &str) -> String {
        match self.values.get(key) {
            Some(PropertyValue::String(v)) => v.clone(),
            Some(v) => v.to_string(),
            None => String::from(value),
        }
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in self.keys.iter() {
            if let Some(v) = self.values.get(key) {
                writeln!(f, "{} = {}", key, v)?;
            }
        }
        Ok(())
    }
}
