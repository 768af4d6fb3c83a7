use std::collections::HashMap;

use crate::desc::{OpDesc, Scope};
use crate::device::{Device, DeviceKind, Element};
use crate::error::OpError;
use crate::operator::{ConvTransposeOp, InferShape};

pub const CONV2D_TRANSPOSE: &str = "conv2d_transpose";
pub const CONV3D_TRANSPOSE: &str = "conv3d_transpose";

pub type OpFactory = fn(&OpDesc, &Scope) -> Result<Box<dyn InferShape>, OpError>;

/// Operator factories keyed by operator type and backend.
pub struct OperatorRegistry {
    factories: HashMap<&'static str, HashMap<DeviceKind, OpFactory>>,
}

impl OperatorRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding every backend compiled into this build.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        #[cfg(feature = "cpu")]
        registry.register_conv_transpose::<crate::device::Cpu, f32>();
        #[cfg(feature = "mali-gpu")]
        registry.register_conv_transpose::<crate::device::MaliGpu, f32>();
        #[cfg(feature = "fpga")]
        registry.register_conv_transpose::<crate::device::Fpga, f32>();
        registry
    }

    pub fn register(&mut self, op_type: &'static str, backend: DeviceKind, factory: OpFactory) {
        self.factories
            .entry(op_type)
            .or_default()
            .insert(backend, factory);
    }

    fn register_conv_transpose<D: Device, T: Element>(&mut self) {
        fn build<D: Device, T: Element>(
            op: &OpDesc,
            scope: &Scope,
        ) -> Result<Box<dyn InferShape>, OpError> {
            Ok(Box::new(ConvTransposeOp::<D, T>::new(op, scope)?))
        }

        for op_type in [CONV2D_TRANSPOSE, CONV3D_TRANSPOSE] {
            self.register(op_type, D::KIND, build::<D, T>);
        }
    }

    pub fn available_operators(&self, backend: DeviceKind) -> Vec<&'static str> {
        let mut keys: Vec<_> = self
            .factories
            .iter()
            .filter(|(_, backends)| backends.contains_key(&backend))
            .map(|(op_type, _)| *op_type)
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn available_backends(&self) -> Vec<DeviceKind> {
        DeviceKind::ALL
            .into_iter()
            .filter(|kind| {
                self.factories
                    .values()
                    .any(|backends| backends.contains_key(kind))
            })
            .collect()
    }

    pub fn create(
        &self,
        op: &OpDesc,
        scope: &Scope,
        backend: DeviceKind,
    ) -> Result<Box<dyn InferShape>, OpError> {
        let factory = self
            .factories
            .get(op.op_type.as_str())
            .and_then(|backends| backends.get(&backend));
        let Some(factory) = factory else {
            return Err(OpError::UnsupportedOperator {
                op_type: op.op_type.clone(),
                backend,
                available: self.available_operators(backend),
            });
        };
        factory(op, scope)
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
