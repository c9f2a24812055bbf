//! Shorthands for writing module columns.
use convnet_core::prelude::*;

pub(crate) use convnet_core::module::OpDesc::Share as SHARE;
pub(crate) use convnet_core::ops::cnn::PaddingSpec::{Same as SAME, Valid as VALID};

pub(crate) fn conv(n: usize, kh: usize, kw: usize) -> OpDesc {
    OpDesc::conv(n, kh, kw)
}

pub(crate) fn conv_s(
    n: usize,
    kh: usize,
    kw: usize,
    sh: usize,
    sw: usize,
    padding: PaddingSpec,
) -> OpDesc {
    OpDesc::conv_strided(n, kh, kw, sh, sw, padding)
}

pub(crate) fn mpool(kh: usize, kw: usize, sh: usize, sw: usize, padding: PaddingSpec) -> OpDesc {
    OpDesc::mpool(kh, kw, sh, sw, padding)
}

pub(crate) fn apool(kh: usize, kw: usize, sh: usize, sw: usize, padding: PaddingSpec) -> OpDesc {
    OpDesc::apool(kh, kw, sh, sw, padding)
}
