use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Float16,
    Float32,
    Int32,
    Uint32,
    Int8,
    Uint8,
}

impl DataType {
    pub fn bytes_per_element(self) -> usize {
        match self {
            DataType::Float16 => 2,
            DataType::Float32 => 4,
            DataType::Int32 => 4,
            DataType::Uint32 => 4,
            DataType::Int8 => 1,
            DataType::Uint8 => 1,
        }
    }
}

/// Shape metadata of a tensor variable. Storage lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorDesc {
    pub data_type: DataType,
    #[serde(default)]
    pub shape: Vec<i64>,
}

impl TensorDesc {
    pub fn new(data_type: DataType, shape: Vec<i64>) -> Self {
        Self { data_type, shape }
    }

    pub fn dims(&self) -> &[i64] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Replace the shape, keeping the data type.
    pub fn resize(&mut self, shape: Vec<i64>) {
        self.shape = shape;
    }

    /// `None` when an extent is negative (unknown) or the product overflows.
    pub fn element_count(&self) -> Option<usize> {
        let mut count = 1usize;
        for &dim in &self.shape {
            let dim = usize::try_from(dim).ok()?;
            count = count.checked_mul(dim)?;
        }
        Some(count)
    }

    pub fn byte_length(&self) -> Option<usize> {
        let elements = self.element_count()?;
        elements.checked_mul(self.data_type.bytes_per_element())
    }
}

/// Attribute value attached to an operator description.
///
/// Variants are tried in declaration order when deserializing, so booleans
/// and integers win over floats and integer lists win over float lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Bool(bool),
    Int(i64),
    Ints(Vec<i64>),
    Float(f64),
    Floats(Vec<f64>),
    String(String),
    Strings(Vec<String>),
}

impl Attribute {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Attribute::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            Attribute::Ints(values) => Some(values),
            _ => None,
        }
    }
}

pub type VariableNameMap = HashMap<String, Vec<String>>;
pub type AttributeMap = HashMap<String, Attribute>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpDesc {
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default)]
    pub inputs: VariableNameMap,
    #[serde(default)]
    pub outputs: VariableNameMap,
    #[serde(default)]
    pub attrs: AttributeMap,
    #[serde(default)]
    pub label: Option<String>,
}

impl OpDesc {
    pub fn display_name(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.op_type.clone())
    }

    /// The variable bound to an input slot, when exactly one is.
    pub fn input(&self, slot: &str) -> Option<&str> {
        single(self.inputs.get(slot)?)
    }

    pub fn output(&self, slot: &str) -> Option<&str> {
        single(self.outputs.get(slot)?)
    }
}

fn single(names: &[String]) -> Option<&str> {
    match names {
        [name] => Some(name.as_str()),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramDesc {
    pub vars: HashMap<String, TensorDesc>,
    #[serde(default)]
    pub ops: Vec<OpDesc>,
}

/// Named tensor descriptors operators read from and write their outputs to.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: HashMap<String, TensorDesc>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(&self, name: &str) -> Option<&TensorDesc> {
        self.vars.get(name)
    }

    pub fn set_var(&mut self, name: impl Into<String>, desc: TensorDesc) {
        self.vars.insert(name.into(), desc);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl From<HashMap<String, TensorDesc>> for Scope {
    fn from(vars: HashMap<String, TensorDesc>) -> Self {
        Self { vars }
    }
}
