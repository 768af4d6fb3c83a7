//! Backend capability markers and element types.
//!
//! Operators are generic over a [`Device`] and an [`Element`] so a kernel can
//! later be picked per backend. Shape inference is identical for every
//! instantiation; the only backend hook it sees is [`Device::Policy`].

use std::str::FromStr;

use crate::desc::DataType;
use crate::shape_inference::{ShapePolicy, StandardPolicy};

/// Backend an operator is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// General-purpose CPU
    Cpu,
    /// ARM Mali mobile GPU
    MaliGpu,
    /// Reconfigurable accelerator
    Fpga,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 3] = [DeviceKind::Cpu, DeviceKind::MaliGpu, DeviceKind::Fpga];

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Cpu => "cpu",
            DeviceKind::MaliGpu => "mali-gpu",
            DeviceKind::Fpga => "fpga",
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.to_ascii_lowercase();
        DeviceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == key)
            .ok_or_else(|| {
                format!(
                    "unknown backend `{}` (expected one of: cpu, mali-gpu, fpga)",
                    s
                )
            })
    }
}

pub trait Device: Send + Sync + 'static {
    const KIND: DeviceKind;
    /// Shape rules for this backend.
    type Policy: ShapePolicy + Default + Send + Sync;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Cpu;

#[derive(Debug, Clone, Copy, Default)]
pub struct MaliGpu;

#[derive(Debug, Clone, Copy, Default)]
pub struct Fpga;

impl Device for Cpu {
    const KIND: DeviceKind = DeviceKind::Cpu;
    type Policy = StandardPolicy;
}

impl Device for MaliGpu {
    const KIND: DeviceKind = DeviceKind::MaliGpu;
    type Policy = StandardPolicy;
}

impl Device for Fpga {
    const KIND: DeviceKind = DeviceKind::Fpga;
    type Policy = StandardPolicy;
}

/// Element type a kernel computes in.
pub trait Element: Copy + Send + Sync + 'static {
    const DATA_TYPE: DataType;
}

macro_rules! impl_element {
    ($($ty:ty => $dt:ident),* $(,)?) => {
        $(impl Element for $ty {
            const DATA_TYPE: DataType = DataType::$dt;
        })*
    };
}

impl_element! {
    f32 => Float32,
    i32 => Int32,
    u32 => Uint32,
    i8 => Int8,
    u8 => Uint8,
}
