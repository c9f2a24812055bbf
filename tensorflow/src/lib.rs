//! # convnet-tensorflow
//!
//! Training inputs in TensorFlow formats: `Example` protobuf messages,
//! schema driven feature parsing, the imagenet record decoder, and TFRecord
//! framing.
//!
//! ## Example
//!
//! ```
//! use convnet_tensorflow::prelude::*;
//! use convnet_tensorflow::record::*;
//! use convnet_tensorflow::tfpb::example;
//!
//! let bytes = example()
//!     .bytes(IMAGE_ENCODED, "jpeg bytes")
//!     .int64(CLASS_LABEL, 7)
//!     .bytes(CLASS_TEXT, "cock")
//!     .int64(HEIGHT, 299)
//!     .int64(WIDTH, 299)
//!     .write_to_bytes();
//!
//! let mut writer = RecordWriter::new(vec![]);
//! writer.write_record(&bytes).unwrap();
//! let framed = writer.into_inner();
//!
//! for payload in RecordReader::new(&*framed) {
//!     let record = decode(&payload.unwrap()).unwrap();
//!     assert_eq!(record.label(), 7);
//!     assert_eq!(record.text(), "cock");
//! }
//! ```

#[macro_use]
extern crate derive_new;
#[allow(unused_imports)]
#[macro_use]
extern crate log;

pub mod example;
pub mod record;
pub mod tfpb;
pub mod tfrecord;

pub use convnet_core;

pub mod prelude {
    pub use crate::example::{FeatureKind, FeatureSpec, FeatureValue, parse_single_example};
    pub use crate::record::{BoundingBox, Record, decode};
    pub use crate::tfrecord::{RecordReader, RecordWriter};
    pub use convnet_core::prelude::{NetError, NetErrorExt, NetResult};
}

#[cfg(test)]
#[allow(dead_code)]
pub(crate) fn setup_test_logger() {
    let _ = env_logger::Builder::from_default_env().filter_level(log::LevelFilter::Trace).try_init();
}
