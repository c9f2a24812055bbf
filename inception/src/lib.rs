//! # convnet-inception
//!
//! Inception v3 and v4 topologies, assembled from inception modules over a
//! [`ConvNetBuilder`](convnet_core::builder::ConvNetBuilder), and the linear
//! softmax model.
//!
//! ## Example
//!
//! ```
//! use convnet_inception::prelude::*;
//!
//! let config = InceptionConfig::default().with_batch_size(4);
//! let inception = Inception::new("inception3", config).unwrap();
//! let graph = inception.inference(&inception.image_fact()).unwrap();
//! assert_eq!(graph.output_fact().unwrap().shape.as_slice(), &[4, 2048]);
//! ```

#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate log;

mod columns;
pub mod config;
pub mod graph;
pub mod inception;
pub mod linear;
mod v3;
mod v4;

pub use convnet_core;

pub mod prelude {
    pub use crate::config::InceptionConfig;
    pub use crate::graph::NetworkGraph;
    pub use crate::inception::{Inception, InceptionVersion};
    pub use crate::linear::LinearSoftmax;
    pub use convnet_core::prelude::*;
}

#[cfg(test)]
#[allow(dead_code)]
pub(crate) fn setup_test_logger() {
    let _ = env_logger::Builder::from_default_env().filter_level(log::LevelFilter::Debug).try_init();
}
