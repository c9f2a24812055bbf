//! Schema driven extraction of features from a serialized `Example`, after
//! TensorFlow's `parse_single_example`.
use std::fmt;

use convnet_core::internal::*;

use crate::tfpb::{Example, feature::Kind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Bytes,
    Float,
    Int64,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            FeatureKind::Bytes => "bytes",
            FeatureKind::Float => "float",
            FeatureKind::Int64 => "int64",
        })
    }
}

/// Values of one feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Bytes(Vec<Vec<u8>>),
    Float(Vec<f32>),
    Int64(Vec<i64>),
}

impl FeatureValue {
    pub fn empty(kind: FeatureKind) -> FeatureValue {
        match kind {
            FeatureKind::Bytes => FeatureValue::Bytes(vec![]),
            FeatureKind::Float => FeatureValue::Float(vec![]),
            FeatureKind::Int64 => FeatureValue::Int64(vec![]),
        }
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Bytes(_) => FeatureKind::Bytes,
            FeatureValue::Float(_) => FeatureKind::Float,
            FeatureValue::Int64(_) => FeatureKind::Int64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FeatureValue::Bytes(v) => v.len(),
            FeatureValue::Float(v) => v.len(),
            FeatureValue::Int64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> Option<&[Vec<u8>]> {
        if let FeatureValue::Bytes(v) = self { Some(v) } else { None }
    }

    pub fn as_floats(&self) -> Option<&[f32]> {
        if let FeatureValue::Float(v) = self { Some(v) } else { None }
    }

    pub fn as_int64s(&self) -> Option<&[i64]> {
        if let FeatureValue::Int64(v) = self { Some(v) } else { None }
    }
}

impl From<Kind> for FeatureValue {
    fn from(kind: Kind) -> FeatureValue {
        match kind {
            Kind::BytesList(l) => FeatureValue::Bytes(l.value),
            Kind::FloatList(l) => FeatureValue::Float(l.value),
            Kind::Int64List(l) => FeatureValue::Int64(l.value),
        }
    }
}

/// How a feature is expected to appear in an example.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureSpec {
    /// A required scalar. An empty value list stands for `default`.
    FixedLen { kind: FeatureKind, default: FeatureValue },
    /// An optional list of any length. Missing means empty.
    VarLen { kind: FeatureKind },
}

impl FeatureSpec {
    pub fn fixed_bytes(default: &[u8]) -> FeatureSpec {
        FeatureSpec::FixedLen {
            kind: FeatureKind::Bytes,
            default: FeatureValue::Bytes(vec![default.to_vec()]),
        }
    }

    pub fn fixed_int64(default: i64) -> FeatureSpec {
        FeatureSpec::FixedLen { kind: FeatureKind::Int64, default: FeatureValue::Int64(vec![default]) }
    }

    pub fn fixed_float(default: f32) -> FeatureSpec {
        FeatureSpec::FixedLen { kind: FeatureKind::Float, default: FeatureValue::Float(vec![default]) }
    }

    pub fn var_len(kind: FeatureKind) -> FeatureSpec {
        FeatureSpec::VarLen { kind }
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureSpec::FixedLen { kind, .. } | FeatureSpec::VarLen { kind } => *kind,
        }
    }
}

fn malformed(msg: String) -> convnet_core::anyhow::Error {
    anyhow!(NetError::MalformedRecord(msg))
}

/// Decode a serialized `Example` and extract the features named in `specs`.
///
/// Features of the example not in `specs` are ignored.
pub fn parse_single_example(
    bytes: &[u8],
    specs: &[(&str, FeatureSpec)],
) -> NetResult<HashMap<String, FeatureValue>> {
    let example = Example::decode_from(bytes)?;
    let mut features = example.features.map(|f| f.feature).unwrap_or_default();
    let mut parsed = HashMap::with_capacity(specs.len());
    for (name, spec) in specs {
        let value = match features.remove(*name) {
            None => match spec {
                FeatureSpec::FixedLen { .. } => {
                    return Err(malformed(format!("required feature {name:?} is missing")));
                }
                FeatureSpec::VarLen { kind } => FeatureValue::empty(*kind),
            },
            Some(feature) => {
                let value = feature
                    .kind
                    .map(FeatureValue::from)
                    .unwrap_or_else(|| FeatureValue::empty(spec.kind()));
                if value.kind() != spec.kind() && !value.is_empty() {
                    return Err(malformed(format!(
                        "feature {name:?} holds {} values, expected {}",
                        value.kind(),
                        spec.kind()
                    )));
                }
                match spec {
                    FeatureSpec::FixedLen { default, .. } => match value.len() {
                        0 => default.clone(),
                        1 => value,
                        n => {
                            return Err(malformed(format!(
                                "feature {name:?} holds {n} values, expected one"
                            )));
                        }
                    },
                    FeatureSpec::VarLen { kind } if value.is_empty() => FeatureValue::empty(*kind),
                    FeatureSpec::VarLen { .. } => value,
                }
            }
        };
        parsed.insert(name.to_string(), value);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfpb::{Feature, example};

    fn specs() -> Vec<(&'static str, FeatureSpec)> {
        vec![
            ("label", FeatureSpec::fixed_int64(-1)),
            ("name", FeatureSpec::fixed_bytes(b"")),
            ("scores", FeatureSpec::var_len(FeatureKind::Float)),
            ("weight", FeatureSpec::fixed_float(1.0)),
        ]
    }

    #[test]
    fn fixed_and_var_len() {
        let bytes = example()
            .int64("label", 615)
            .bytes("name", "knee pad")
            .floats("scores", &[0.1, 0.9])
            .floats("weight", &[0.5])
            .bytes("ignored", "whatever")
            .write_to_bytes();
        let features = parse_single_example(&bytes, &specs()).unwrap();
        assert_eq!(features.len(), 4);
        assert_eq!(features["label"].as_int64s().unwrap(), &[615]);
        assert_eq!(features["weight"].as_floats().unwrap(), &[0.5]);
        assert_eq!(features["name"].as_bytes().unwrap(), &[b"knee pad".to_vec()]);
        assert_eq!(features["scores"].as_floats().unwrap(), &[0.1, 0.9]);
    }

    #[test]
    fn defaults_and_absent_lists() {
        let bytes = example()
            .feature("label", Feature::int64_list(vec![]))
            .feature("name", Feature { kind: None })
            .feature("weight", Feature::float_list(vec![]))
            .write_to_bytes();
        let features = parse_single_example(&bytes, &specs()).unwrap();
        assert_eq!(features["label"], FeatureValue::Int64(vec![-1]));
        assert_eq!(features["name"], FeatureValue::Bytes(vec![vec![]]));
        assert_eq!(features["scores"], FeatureValue::Float(vec![]));
        assert_eq!(features["weight"], FeatureValue::Float(vec![1.0]));
        assert_eq!(features["label"].as_floats(), None);
    }

    #[test]
    fn missing_required() {
        let bytes = example().int64("label", 3).write_to_bytes();
        let e = parse_single_example(&bytes, &specs()).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::MalformedRecord(_))));
    }

    #[test]
    fn wrong_kind_or_arity() {
        let bytes = example().floats("label", &[1.0]).bytes("name", "x").write_to_bytes();
        let e = parse_single_example(&bytes, &specs()).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::MalformedRecord(_))));
        let bytes = example()
            .feature("label", Feature::int64_list(vec![1, 2]))
            .bytes("name", "x")
            .write_to_bytes();
        let e = parse_single_example(&bytes, &specs()).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::MalformedRecord(_))));
    }

    #[test]
    fn garbage() {
        let e = parse_single_example(&[0xff, 0xff, 0xff], &specs()).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::MalformedRecord(_))));
    }
}
