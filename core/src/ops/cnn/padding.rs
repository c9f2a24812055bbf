use crate::internal::*;
use std::fmt;
use std::str::FromStr;

/// TensorFlow padding modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaddingSpec {
    #[default]
    Valid,
    /// Output length is `ceil(input / stride)`, extra padding goes after.
    Same,
}

use PaddingSpec::*;

#[derive(Debug, Clone, new, PartialEq, Eq)]
pub struct ComputedPaddedDim {
    pub input: usize,
    pub output: usize,
    pub pad_before: usize,
    pub pad_after: usize,
}

impl PaddingSpec {
    pub fn compute(
        &self,
        input_spatial_shape: &[usize],
        kernel_spatial_shape: &[usize],
        strides: &[usize],
    ) -> NetResult<TVec<ComputedPaddedDim>> {
        (0..input_spatial_shape.len())
            .map(|d| {
                self.compute_one(input_spatial_shape[d], kernel_spatial_shape[d], strides[d])
            })
            .collect()
    }

    pub fn compute_one(
        &self,
        input: usize,
        kernel: usize,
        stride: usize,
    ) -> NetResult<ComputedPaddedDim> {
        if kernel == 0 || stride == 0 {
            bail!(NetError::InvalidParameter(format!(
                "kernel ({kernel}) and stride ({stride}) must be positive"
            )))
        }
        match self {
            Valid => Self::valid(input, kernel, stride),
            Same => Ok(Self::same(input, kernel, stride)),
        }
    }

    fn valid(input: usize, kernel: usize, stride: usize) -> NetResult<ComputedPaddedDim> {
        if input < kernel {
            bail!(NetError::ShapeMismatch(format!(
                "VALID padding with a kernel of {kernel} on an input of {input}"
            )))
        }
        let output = (input - kernel) / stride + 1;
        Ok(ComputedPaddedDim::new(input, output, 0, 0))
    }

    fn same(input: usize, kernel: usize, stride: usize) -> ComputedPaddedDim {
        let output = input.div_ceil(stride);
        let pad = ((output.max(1) - 1) * stride + kernel).saturating_sub(input);
        let lower_pad = pad / 2;
        let higher_pad = pad - lower_pad;
        ComputedPaddedDim::new(input, output, lower_pad, higher_pad)
    }
}

impl FromStr for PaddingSpec {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> NetResult<PaddingSpec> {
        match s {
            "VALID" | "valid" => Ok(Valid),
            "SAME" | "same" => Ok(Same),
            _ => bail!(NetError::UnknownOperation(format!("padding {s:?}"))),
        }
    }
}

impl fmt::Display for PaddingSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Valid => "VALID",
            Same => "SAME",
        })
    }
}
