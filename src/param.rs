use crate::desc::{OpDesc, Scope, TensorDesc};
use crate::error::OpError;

pub const INPUT_SLOT: &str = "Input";
pub const FILTER_SLOT: &str = "Filter";
pub const OUTPUT_SLOT: &str = "Output";

/// Resolved inputs, output and attributes of a transposed convolution.
///
/// Built once when the operator is constructed. Shape inference reads
/// everything and replaces only the output descriptor's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvTransposeParam {
    input: TensorDesc,
    filter: TensorDesc,
    output: TensorDesc,
    strides: Vec<i64>,
    paddings: Vec<i64>,
    dilations: Vec<i64>,
    groups: i64,
}

impl ConvTransposeParam {
    pub fn new(
        input: TensorDesc,
        filter: TensorDesc,
        output: TensorDesc,
        strides: Vec<i64>,
        paddings: Vec<i64>,
        dilations: Vec<i64>,
        groups: i64,
    ) -> Self {
        Self {
            input,
            filter,
            output,
            strides,
            paddings,
            dilations,
            groups,
        }
    }

    /// Bind the `Input`/`Filter`/`Output` slots against `scope` and parse
    /// the `strides`, `paddings`, `dilations` and `groups` attributes.
    pub fn from_op_desc(op: &OpDesc, scope: &Scope) -> Result<Self, OpError> {
        let input = bind_var(op, scope, op.inputs.get(INPUT_SLOT), INPUT_SLOT)?;
        let filter = bind_var(op, scope, op.inputs.get(FILTER_SLOT), FILTER_SLOT)?;
        let output = bind_var(op, scope, op.outputs.get(OUTPUT_SLOT), OUTPUT_SLOT)?;

        Ok(Self {
            input,
            filter,
            output,
            strides: ints_attr(op, "strides")?,
            paddings: ints_attr(op, "paddings")?,
            dilations: ints_attr(op, "dilations")?,
            groups: int_attr(op, "groups")?,
        })
    }

    pub fn input(&self) -> &TensorDesc {
        &self.input
    }

    pub fn filter(&self) -> &TensorDesc {
        &self.filter
    }

    pub fn output(&self) -> &TensorDesc {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut TensorDesc {
        &mut self.output
    }

    pub fn strides(&self) -> &[i64] {
        &self.strides
    }

    pub fn paddings(&self) -> &[i64] {
        &self.paddings
    }

    pub fn dilations(&self) -> &[i64] {
        &self.dilations
    }

    pub fn groups(&self) -> i64 {
        self.groups
    }
}

fn bind_var(
    op: &OpDesc,
    scope: &Scope,
    vars: Option<&Vec<String>>,
    slot: &'static str,
) -> Result<TensorDesc, OpError> {
    let name = match vars.map(Vec::as_slice).unwrap_or_default() {
        [] => {
            return Err(OpError::MissingVariableSlot {
                op_type: op.op_type.clone(),
                slot,
            });
        }
        [name] => name,
        names => {
            return Err(OpError::SlotArity {
                op_type: op.op_type.clone(),
                slot,
                count: names.len(),
            });
        }
    };
    scope
        .var(name)
        .cloned()
        .ok_or_else(|| OpError::UnknownVariable {
            op_type: op.op_type.clone(),
            name: name.to_string(),
        })
}

fn ints_attr(op: &OpDesc, name: &'static str) -> Result<Vec<i64>, OpError> {
    let attr = op.attrs.get(name).ok_or_else(|| OpError::MissingAttribute {
        op_type: op.op_type.clone(),
        name,
    })?;
    attr.as_ints()
        .map(<[i64]>::to_vec)
        .ok_or_else(|| OpError::AttributeType {
            op_type: op.op_type.clone(),
            name,
            expected: "a list of integers",
        })
}

fn int_attr(op: &OpDesc, name: &'static str) -> Result<i64, OpError> {
    let attr = op.attrs.get(name).ok_or_else(|| OpError::MissingAttribute {
        op_type: op.op_type.clone(),
        name,
    })?;
    attr.as_int().ok_or_else(|| OpError::AttributeType {
        op_type: op.op_type.clone(),
        name,
        expected: "an integer",
    })
}
