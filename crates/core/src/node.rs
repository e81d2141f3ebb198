use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NodeParams {
    pub values: BTreeMap<String, ParamValue>,
}

impl NodeParams {
    pub fn with(mut self, key: &str, value: ParamValue) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        self.values
            .get(key)
            .and_then(|value| match value {
                ParamValue::Float(v) => Some(*v),
                ParamValue::Int(v) => Some(*v as f32),
                _ => None,
            })
            .unwrap_or(default)
    }

    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.values
            .get(key)
            .and_then(|value| match value {
                ParamValue::Int(v) => Some(*v),
                _ => None,
            })
            .unwrap_or(default)
    }

    pub fn get_string<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values
            .get(key)
            .and_then(|value| match value {
                ParamValue::String(v) => Some(v.as_str()),
                _ => None,
            })
            .unwrap_or(default)
    }

    /// `self` layered over `defaults`.
    pub fn merged_over(&self, defaults: &NodeParams) -> NodeParams {
        let mut values = defaults.values.clone();
        values.extend(self.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        NodeParams { values }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Int(i32),
    String(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeDefinition {
    pub id: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub inputs: Vec<PinDefinition>,
    pub outputs: Vec<PinDefinition>,
    pub output_node: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PinDefinition {
    pub name: &'static str,
    pub pin_type: PinType,
    pub optional: bool,
}

/// Value types the host carries between nodes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinType {
    #[serde(rename = "MESHBAKE_MODEL")]
    Model,
    #[serde(rename = "IMAGE")]
    Image,
    #[serde(rename = "MASK")]
    Mask,
    #[serde(rename = "MESH")]
    Mesh,
}
