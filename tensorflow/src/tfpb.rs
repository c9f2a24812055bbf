//! Messages of TensorFlow `tensorflow/core/example/{example,feature}.proto`,
//! and a few helpers to build them.
use std::collections::HashMap;

use convnet_core::internal::*;
use prost::Message;

/// Containers to hold repeated fundamental values.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FloatList {
    #[prost(float, repeated, tag = "1")]
    pub value: ::prost::alloc::vec::Vec<f32>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Int64List {
    #[prost(int64, repeated, tag = "1")]
    pub value: ::prost::alloc::vec::Vec<i64>,
}
/// Containers for non-sequential data.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Feature {
    /// Each feature can be exactly one kind.
    #[prost(oneof = "feature::Kind", tags = "1, 2, 3")]
    pub kind: ::core::option::Option<feature::Kind>,
}
/// Nested message and enum types in `Feature`.
pub mod feature {
    /// Each feature can be exactly one kind.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        BytesList(super::BytesList),
        #[prost(message, tag = "2")]
        FloatList(super::FloatList),
        #[prost(message, tag = "3")]
        Int64List(super::Int64List),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Features {
    /// Map from feature name to feature.
    #[prost(map = "string, message", tag = "1")]
    pub feature: ::std::collections::HashMap<::prost::alloc::string::String, Feature>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: ::core::option::Option<Features>,
}

pub fn example() -> Example {
    Example { features: Some(Features { feature: HashMap::new() }) }
}

impl Example {
    pub fn feature<S: ToString>(mut self, key: S, feature: Feature) -> Example {
        self.features.get_or_insert_with(Features::default).feature.insert(key.to_string(), feature);
        self
    }

    pub fn bytes<S: ToString>(self, key: S, value: impl Into<Vec<u8>>) -> Example {
        self.feature(key, Feature::bytes_list(vec![value.into()]))
    }

    pub fn int64<S: ToString>(self, key: S, value: i64) -> Example {
        self.feature(key, Feature::int64_list(vec![value]))
    }

    pub fn floats<S: ToString>(self, key: S, values: &[f32]) -> Example {
        self.feature(key, Feature::float_list(values.to_vec()))
    }

    pub fn write_to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    pub fn decode_from(bytes: &[u8]) -> NetResult<Example> {
        Example::decode(bytes).map_err(|e| {
            anyhow!(NetError::MalformedRecord(format!("Prost/Protobuf decoding error: {e}")))
        })
    }
}

impl Feature {
    pub fn bytes_list(value: Vec<Vec<u8>>) -> Feature {
        Feature { kind: Some(feature::Kind::BytesList(BytesList { value })) }
    }

    pub fn float_list(value: Vec<f32>) -> Feature {
        Feature { kind: Some(feature::Kind::FloatList(FloatList { value })) }
    }

    pub fn int64_list(value: Vec<i64>) -> Feature {
        Feature { kind: Some(feature::Kind::Int64List(Int64List { value })) }
    }
}
