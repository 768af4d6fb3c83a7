use log::{debug, warn};
use serde::Serialize;

use crate::desc::{OpDesc, ProgramDesc, Scope, TensorDesc};
use crate::device::DeviceKind;
use crate::error::OpError;
use crate::registry::OperatorRegistry;

#[derive(Debug, Clone)]
pub struct ContextProperties {
    pub tensor_byte_length_limit: usize,
    pub backend: DeviceKind,
}

impl Default for ContextProperties {
    fn default() -> Self {
        Self {
            tensor_byte_length_limit: 256 * 1024 * 1024,
            backend: DeviceKind::Cpu,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InferredOutput {
    pub operation: String,
    pub variable: String,
    #[serde(flatten)]
    pub descriptor: TensorDesc,
}

#[derive(Debug)]
pub struct ValidationArtifacts {
    /// Inferred outputs in operation order.
    pub outputs: Vec<InferredOutput>,
    /// Scope after every operation wrote its outputs back.
    pub scope: Scope,
}

impl ValidationArtifacts {
    /// Pretty-printed JSON array of the inferred outputs.
    pub fn outputs_json(&self) -> Result<String, OpError> {
        serde_json::to_string_pretty(&self.outputs).map_err(|source| OpError::Serialize { source })
    }
}

/// Runs shape inference over every operation of a program in order.
pub struct ProgramValidator<'a> {
    program: &'a ProgramDesc,
    registry: &'a OperatorRegistry,
    context: ContextProperties,
}

impl<'a> ProgramValidator<'a> {
    pub fn new(
        program: &'a ProgramDesc,
        registry: &'a OperatorRegistry,
        context: ContextProperties,
    ) -> Self {
        Self {
            program,
            registry,
            context,
        }
    }

    pub fn validate(self) -> Result<ValidationArtifacts, OpError> {
        let mut scope = Scope::from(self.program.vars.clone());
        let mut outputs = Vec::new();

        for (index, op) in self.program.ops.iter().enumerate() {
            let op_name = op.display_name();
            let inferred = self
                .run_operation(op, &scope)
                .inspect_err(|err| warn!("operation `{}` (#{}) rejected: {}", op_name, index, err))
                .map_err(|err| err.in_operation(op_name.clone(), index))?;

            for (variable, descriptor) in inferred {
                debug!("`{}` -> {} {:?}", op_name, variable, descriptor.shape);
                scope.set_var(variable.clone(), descriptor.clone());
                outputs.push(InferredOutput {
                    operation: op_name.clone(),
                    variable,
                    descriptor,
                });
            }
        }

        Ok(ValidationArtifacts { outputs, scope })
    }

    fn run_operation(
        &self,
        op: &OpDesc,
        scope: &Scope,
    ) -> Result<Vec<(String, TensorDesc)>, OpError> {
        let mut operator = self.registry.create(op, scope, self.context.backend)?;
        operator.infer_shape()?;

        let mut inferred = Vec::new();
        for (name, descriptor) in operator.outputs() {
            // Unknown extents (negative batch) have no byte length to check.
            if let Some(byte_length) = descriptor.byte_length()
                && byte_length > self.context.tensor_byte_length_limit
            {
                return Err(OpError::TensorLimit {
                    name: name.to_string(),
                    byte_length,
                    limit: self.context.tensor_byte_length_limit,
                });
            }
            inferred.push((name.to_string(), descriptor.clone()));
        }
        Ok(inferred)
    }
}
