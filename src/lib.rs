pub mod desc;
pub mod device;
pub mod error;
pub mod loader;
pub mod operator;
pub mod param;
pub mod registry;
pub mod shape_inference;
pub mod validator;

pub use desc::{Attribute, DataType, OpDesc, ProgramDesc, Scope, TensorDesc};
pub use device::{Cpu, Device, DeviceKind, Element, Fpga, MaliGpu};
pub use error::OpError;
pub use loader::{load_program_from_path, program_from_json_str};
pub use operator::{ConvTransposeOp, InferShape};
pub use param::ConvTransposeParam;
pub use registry::OperatorRegistry;
pub use shape_inference::{
    ShapePolicy, SpatialAxis, StandardPolicy, compute_conv_transpose_shape, conv_output_size,
    infer_conv_transpose_shape, validate_conv_transpose,
};
pub use validator::{ContextProperties, ProgramValidator, ValidationArtifacts};
