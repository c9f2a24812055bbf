//! # convnet-core
//!
//! Typed graph construction for inception-family convolutional networks.
//!
//! The numeric engine is out of scope: this crate builds the graph such an
//! engine would execute, with every outlet carrying a fully determined
//! [`TypedFact`](model::TypedFact). Networks are described through a
//! [`ConvNetBuilder`](builder::ConvNetBuilder), and multi-branch blocks
//! through [`BranchSpec`](module::BranchSpec).
//!
//! ## Example
//!
//! ```
//! use convnet_core::prelude::*;
//!
//! let images = TypedFact::f32([8, 35, 35, 192]);
//! let mut cnn = ConvNetBuilder::new(images, DataFormat::NHWC).unwrap();
//! let spec: BranchSpec = "conv(64,1,1); conv(48,1,1) > conv(64,5,5)".parse().unwrap();
//! cnn.inception_module("incept_v3_a", &spec).unwrap();
//! assert_eq!(cnn.top_size(), 128);
//! assert_eq!(cnn.top_fact().unwrap().shape.as_slice(), &[8, 35, 35, 128]);
//! ```

#[macro_use]
extern crate derive_new;
#[allow(unused_imports)]
#[macro_use]
extern crate log;
#[macro_use]
extern crate downcast_rs;

#[macro_use]
pub mod macros;

pub mod builder;
pub mod errors;
pub mod model;
pub mod module;
pub mod ops;

pub use anyhow;
pub use ndarray;

/// A Smallvec instantiation with 4 embeddable values.
///
/// Used for node outputs and tensor shapes.
pub type TVec<T> = smallvec::SmallVec<[T; 4]>;

pub mod prelude {
    pub use crate::builder::{AuxiliaryScope, BatchNormConfig, ConvNetBuilder};
    pub use crate::errors::{NetError, NetErrorExt, NetResult};
    pub use crate::model::{DatumType, InletId, Node, OutletId, TypedFact, TypedModel};
    pub use crate::module::{BranchSpec, ConvDesc, OpDesc, PoolDesc};
    pub use crate::ops::cnn::PaddingSpec;
    pub use crate::ops::nn::DataFormat;
    pub use crate::tvec;
    pub use crate::TVec;
}

pub mod internal {
    pub use crate::errors::{NetError, NetErrorExt, NetResult};
    pub use crate::model::*;
    pub use crate::ops::{Op, OpParams};
    pub use crate::prelude::*;
    pub use anyhow::{Context, anyhow, bail, ensure, format_err};
    pub use std::borrow::Cow;
    pub use std::collections::HashMap;
}

#[cfg(test)]
#[allow(dead_code)]
pub fn setup_test_logger() {
    let _ = env_logger::Builder::from_default_env().filter_level(log::LevelFilter::Trace).try_init();
}
