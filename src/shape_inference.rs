//! Shape inference and validation for transposed convolution

use log::trace;

use crate::error::OpError;
use crate::param::ConvTransposeParam;

/// Number of leading non-spatial axes: `[batch, channels, ...]`
const NON_SPATIAL_DIMS: usize = 2;

/// Inputs to the extent rule along a single spatial axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialAxis {
    pub input: i64,
    pub kernel: i64,
    pub stride: i64,
    pub padding: i64,
    pub dilation: i64,
}

impl SpatialAxis {
    /// Kernel extent once dilation gaps are inserted between taps
    pub fn effective_kernel(&self) -> Option<i64> {
        self.dilation
            .checked_mul(self.kernel.checked_sub(1)?)?
            .checked_add(1)
    }
}

/// Backend hook for the spatial extent rule.
///
/// Every shipped backend uses [`StandardPolicy`]. A backend whose kernels
/// produce a different extent supplies its own policy through
/// [`crate::device::Device::Policy`] instead of branching inside the
/// inference routine.
pub trait ShapePolicy {
    /// Output extent along one spatial axis, `None` on 64-bit overflow.
    fn output_extent(&self, axis: SpatialAxis) -> Option<i64>;
}

/// `(input - 1) * stride - 2 * padding + dilation * (kernel - 1) + 1`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardPolicy;

impl ShapePolicy for StandardPolicy {
    fn output_extent(&self, axis: SpatialAxis) -> Option<i64> {
        let effective_kernel = axis.effective_kernel()?;
        axis.input
            .checked_sub(1)?
            .checked_mul(axis.stride)?
            .checked_sub(axis.padding.checked_mul(2)?)?
            .checked_add(effective_kernel)
    }
}

/// Output extent of the forward convolution along one axis.
///
/// `(input + 2 * padding - effective_kernel) / stride + 1`, with floor
/// division. A transposed convolution maps this extent back to `input`.
/// `None` when `stride` is not positive or the arithmetic overflows.
pub fn conv_output_size(
    input: i64,
    kernel: i64,
    stride: i64,
    padding: i64,
    dilation: i64,
) -> Option<i64> {
    if stride < 1 {
        return None;
    }
    let axis = SpatialAxis {
        input,
        kernel,
        stride,
        padding,
        dilation,
    };
    input
        .checked_add(padding.checked_mul(2)?)?
        .checked_sub(axis.effective_kernel()?)?
        .checked_div_euclid(stride)?
        .checked_add(1)
}

/// Check rank, hyperparameter and channel consistency of a transposed
/// convolution before any extent is computed.
///
/// Structural checks run first, in order: input rank is 4 or 5, filter
/// rank equals input rank, `strides` has one entry per spatial axis,
/// `paddings` and `dilations` match `strides`, input channels equal the
/// filter's input channels. Value checks follow: strides and dilations
/// are at least 1, paddings are non-negative, groups is at least 1.
pub fn validate_conv_transpose(param: &ConvTransposeParam) -> Result<(), OpError> {
    let in_dims = param.input().dims();
    let filter_dims = param.filter().dims();
    let strides = param.strides();
    let paddings = param.paddings();
    let dilations = param.dilations();

    if in_dims.len() != 4 && in_dims.len() != 5 {
        return Err(OpError::RankMismatch {
            reason: "input must be a 4-D or 5-D tensor",
            input_rank: in_dims.len(),
            filter_rank: filter_dims.len(),
        });
    }
    if in_dims.len() != filter_dims.len() {
        return Err(OpError::RankMismatch {
            reason: "input and filter must have the same rank",
            input_rank: in_dims.len(),
            filter_rank: filter_dims.len(),
        });
    }

    let spatial_rank = in_dims.len() - NON_SPATIAL_DIMS;
    if strides.len() != spatial_rank {
        return Err(OpError::HyperparameterLengthMismatch {
            name: "strides",
            expected: spatial_rank,
            actual: strides.len(),
        });
    }
    if paddings.len() != strides.len() {
        return Err(OpError::HyperparameterLengthMismatch {
            name: "paddings",
            expected: strides.len(),
            actual: paddings.len(),
        });
    }
    if dilations.len() != strides.len() {
        return Err(OpError::HyperparameterLengthMismatch {
            name: "dilations",
            expected: strides.len(),
            actual: dilations.len(),
        });
    }

    if in_dims[1] != filter_dims[0] {
        return Err(OpError::ChannelMismatch {
            input_channels: in_dims[1],
            filter_channels: filter_dims[0],
        });
    }

    check_each("strides", strides, 1)?;
    check_each("paddings", paddings, 0)?;
    check_each("dilations", dilations, 1)?;
    if param.groups() < 1 {
        return Err(OpError::InvalidHyperparameter {
            name: "groups",
            index: None,
            value: param.groups(),
        });
    }

    Ok(())
}

fn check_each(name: &'static str, values: &[i64], min: i64) -> Result<(), OpError> {
    match values.iter().position(|&value| value < min) {
        Some(index) => Err(OpError::InvalidHyperparameter {
            name,
            index: Some(index),
            value: values[index],
        }),
        None => Ok(()),
    }
}

/// Infer the output shape of a transposed convolution without writing it.
///
/// Output is `[batch, filter_dims[1] * groups, spatial...]` where each
/// spatial extent comes from `policy`. Every extent after the batch axis
/// must be positive.
pub fn compute_conv_transpose_shape<P: ShapePolicy + ?Sized>(
    param: &ConvTransposeParam,
    policy: &P,
) -> Result<Vec<i64>, OpError> {
    validate_conv_transpose(param)?;

    let in_dims = param.input().dims();
    let filter_dims = param.filter().dims();

    let out_channels = filter_dims[1]
        .checked_mul(param.groups())
        .ok_or(OpError::ExtentOverflow { dim: 1 })?;
    if out_channels <= 0 {
        return Err(OpError::DegenerateOutputShape {
            dim: 1,
            extent: out_channels,
        });
    }

    let mut output_shape = Vec::with_capacity(in_dims.len());
    output_shape.push(in_dims[0]);
    output_shape.push(out_channels);

    for (i, &stride) in param.strides().iter().enumerate() {
        let dim = i + NON_SPATIAL_DIMS;
        let axis = SpatialAxis {
            input: in_dims[dim],
            kernel: filter_dims[dim],
            stride,
            padding: param.paddings()[i],
            dilation: param.dilations()[i],
        };
        let extent = policy
            .output_extent(axis)
            .ok_or(OpError::ExtentOverflow { dim })?;
        if extent <= 0 {
            return Err(OpError::DegenerateOutputShape { dim, extent });
        }
        output_shape.push(extent);
    }

    Ok(output_shape)
}

/// Infer the output shape of a transposed convolution and resize the
/// output descriptor to it.
///
/// On error the output descriptor is left exactly as it was.
pub fn infer_conv_transpose_shape<P: ShapePolicy + ?Sized>(
    param: &mut ConvTransposeParam,
    policy: &P,
) -> Result<(), OpError> {
    let output_shape = compute_conv_transpose_shape(param, policy)?;
    trace!(
        "conv transpose: input {:?} filter {:?} -> output {:?}",
        param.input().dims(),
        param.filter().dims(),
        output_shape
    );
    param.output_mut().resize(output_shape);
    Ok(())
}
