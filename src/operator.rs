use std::marker::PhantomData;

use log::debug;

use crate::desc::{OpDesc, Scope, TensorDesc};
use crate::device::{Device, DeviceKind, Element};
use crate::error::OpError;
use crate::param::{ConvTransposeParam, OUTPUT_SLOT};
use crate::shape_inference::infer_conv_transpose_shape;

/// Object-safe view of a constructed operator, as handed out by the registry.
pub trait InferShape: Send + Sync {
    fn op_type(&self) -> &str;
    fn device_kind(&self) -> DeviceKind;
    /// Compute the output shape and resize the output descriptor.
    fn infer_shape(&mut self) -> Result<(), OpError>;
    /// `(variable name, descriptor)` for every output.
    fn outputs(&self) -> Vec<(&str, &TensorDesc)>;
}

/// Transposed convolution operator for backend `D` and element type `T`.
pub struct ConvTransposeOp<D: Device, T: Element> {
    op_type: String,
    output_name: String,
    param: ConvTransposeParam,
    policy: D::Policy,
    _marker: PhantomData<fn() -> T>,
}

impl<D: Device, T: Element> ConvTransposeOp<D, T> {
    pub fn new(op: &OpDesc, scope: &Scope) -> Result<Self, OpError> {
        let param = ConvTransposeParam::from_op_desc(op, scope)?;
        let output_name = op
            .output(OUTPUT_SLOT)
            .ok_or_else(|| OpError::MissingVariableSlot {
                op_type: op.op_type.clone(),
                slot: OUTPUT_SLOT,
            })?
            .to_string();
        Ok(Self {
            op_type: op.op_type.clone(),
            output_name,
            param,
            policy: D::Policy::default(),
            _marker: PhantomData,
        })
    }

    pub fn param(&self) -> &ConvTransposeParam {
        &self.param
    }
}

impl<D: Device, T: Element> InferShape for ConvTransposeOp<D, T> {
    fn op_type(&self) -> &str {
        &self.op_type
    }

    fn device_kind(&self) -> DeviceKind {
        D::KIND
    }

    fn infer_shape(&mut self) -> Result<(), OpError> {
        infer_conv_transpose_shape(&mut self.param, &self.policy)?;
        debug!(
            "{} [{} {:?}]: `{}` -> {:?}",
            self.op_type,
            D::KIND,
            T::DATA_TYPE,
            self.output_name,
            self.param.output().dims()
        );
        Ok(())
    }

    fn outputs(&self) -> Vec<(&str, &TensorDesc)> {
        vec![(self.output_name.as_str(), self.param.output())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::DataType;
    use crate::device::{Cpu, Fpga, MaliGpu};

    fn fixture() -> (OpDesc, Scope) {
        let op: OpDesc = serde_json::from_str(
            r#"{
                "type": "conv2d_transpose",
                "inputs": {"Input": ["x"], "Filter": ["w"]},
                "outputs": {"Output": ["y"]},
                "attrs": {"strides": [2, 2], "paddings": [1, 1], "dilations": [1, 1], "groups": 2}
            }"#,
        )
        .unwrap();
        let mut scope = Scope::new();
        scope.set_var("x", TensorDesc::new(DataType::Float32, vec![1, 4, 8, 8]));
        scope.set_var("w", TensorDesc::new(DataType::Float32, vec![4, 2, 3, 3]));
        scope.set_var("y", TensorDesc::new(DataType::Float32, vec![]));
        (op, scope)
    }

    fn infer_with<D: Device, T: Element>(op: &OpDesc, scope: &Scope) -> Vec<i64> {
        let mut operator = ConvTransposeOp::<D, T>::new(op, scope).unwrap();
        operator.infer_shape().unwrap();
        assert_eq!(operator.device_kind(), D::KIND);
        let outputs = operator.outputs();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].0, "y");
        outputs[0].1.shape.clone()
    }

    #[test]
    fn same_shape_on_every_backend() {
        let (op, scope) = fixture();
        let cpu = infer_with::<Cpu, f32>(&op, &scope);
        let mali = infer_with::<MaliGpu, f32>(&op, &scope);
        let fpga = infer_with::<Fpga, i8>(&op, &scope);
        assert_eq!(cpu, vec![1, 4, 15, 15]);
        assert_eq!(mali, cpu);
        assert_eq!(fpga, cpu);
    }

    #[test]
    fn failed_inference_leaves_output_untouched() {
        let (op, mut scope) = fixture();
        scope.set_var("w", TensorDesc::new(DataType::Float32, vec![3, 2, 3, 3]));
        scope.set_var("y", TensorDesc::new(DataType::Float32, vec![9, 9]));
        let mut operator = ConvTransposeOp::<Cpu, f32>::new(&op, &scope).unwrap();
        assert!(matches!(
            operator.infer_shape(),
            Err(OpError::ChannelMismatch { .. })
        ));
        assert_eq!(operator.param().output().dims(), &[9, 9]);
        assert_eq!(operator.op_type(), "conv2d_transpose");
    }
}
