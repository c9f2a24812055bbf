use crate::internal::*;
use std::fmt;
use std::str::FromStr;

/// Layout of image tensors: channel-last (`NHWC`) or channel-first (`NCHW`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum DataFormat {
    #[default]
    NHWC,
    NCHW,
}

impl DataFormat {
    pub fn shape<S: AsRef<[usize]>>(&self, shape: S) -> NetResult<DataShape> {
        let shape = shape.as_ref();
        if shape.len() != 4 {
            bail!(NetError::ShapeMismatch(format!(
                "{self:?} data format expects a rank 4 tensor, got shape {shape:?}"
            )))
        }
        Ok(DataShape { fmt: *self, shape: shape.into() })
    }

    pub fn from_n_c_hw(&self, n: usize, c: usize, hw: impl AsRef<[usize]>) -> NetResult<DataShape> {
        let hw = hw.as_ref();
        let mut me = tvec!(n);
        if *self == DataFormat::NCHW {
            me.push(c);
        }
        me.extend(hw.iter().cloned());
        if *self == DataFormat::NHWC {
            me.push(c);
        }
        self.shape(me)
    }

    /// Axis holding the channels.
    pub fn c_axis(&self) -> usize {
        match self {
            DataFormat::NHWC => 3,
            DataFormat::NCHW => 1,
        }
    }

    pub fn h_axis(&self) -> usize {
        match self {
            DataFormat::NHWC => 1,
            DataFormat::NCHW => 2,
        }
    }

    pub fn hw_axes(&self) -> ::std::ops::Range<usize> {
        self.h_axis()..self.h_axis() + 2
    }
}

impl FromStr for DataFormat {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> NetResult<DataFormat> {
        match s {
            "NHWC" | "channels_last" => Ok(DataFormat::NHWC),
            "NCHW" | "channels_first" => Ok(DataFormat::NCHW),
            _ => bail!(NetError::UnknownOperation(format!("data format {s:?}"))),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A rank 4 image tensor shape, with its layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataShape {
    pub fmt: DataFormat,
    pub shape: TVec<usize>,
}

impl DataShape {
    #[inline]
    pub fn n(&self) -> usize {
        self.shape[0]
    }

    #[inline]
    pub fn c(&self) -> usize {
        self.shape[self.fmt.c_axis()]
    }

    #[inline]
    pub fn hw_dims(&self) -> &[usize] {
        &self.shape[self.fmt.hw_axes()]
    }
}
