//! Inception modules: parallel columns of layers applied to the same input,
//! concatenated along the channel axis.
//!
//! A [`BranchSpec`] can be built from [`OpDesc`] values or parsed from a
//! compact textual form. Columns are separated by `;`, operations within a
//! column by `>`:
//!
//! ```text
//! conv(64,1,1); conv(48,1,1) > conv(64,5,5); share > conv(384,3,1)
//! ```
//!
//! `conv(n,kh,kw[,sh,sw[,PADDING]])` defaults to unit strides and `SAME`
//! padding, `mpool(kh,kw[,sh,sw[,PADDING]])` and `apool(..)` default to
//! strides of 2 and `VALID` padding. `share` reuses the tensor computed at
//! the same position by the previous column.
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use crate::internal::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct ConvDesc {
    pub num_out_channels: usize,
    pub kernel: [usize; 2],
    pub strides: [usize; 2],
    pub padding: PaddingSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct PoolDesc {
    pub kernel: [usize; 2],
    pub strides: [usize; 2],
    pub padding: PaddingSpec,
}

impl fmt::Display for PoolDesc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [kh, kw] = self.kernel;
        let [sh, sw] = self.strides;
        write!(f, "{kh},{kw},{sh},{sw},{}", self.padding)
    }
}

/// One operation in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpDesc {
    Conv(ConvDesc),
    MaxPool(PoolDesc),
    AvgPool(PoolDesc),
    /// Reuse the tensor of the previous column at the same position.
    Share,
}

impl OpDesc {
    /// `n` channels convolution, unit strides, `SAME` padding.
    pub fn conv(n: usize, kh: usize, kw: usize) -> OpDesc {
        OpDesc::Conv(ConvDesc::new(n, [kh, kw], [1, 1], PaddingSpec::Same))
    }

    pub fn conv_strided(
        n: usize,
        kh: usize,
        kw: usize,
        sh: usize,
        sw: usize,
        padding: PaddingSpec,
    ) -> OpDesc {
        OpDesc::Conv(ConvDesc::new(n, [kh, kw], [sh, sw], padding))
    }

    pub fn mpool(kh: usize, kw: usize, sh: usize, sw: usize, padding: PaddingSpec) -> OpDesc {
        OpDesc::MaxPool(PoolDesc::new([kh, kw], [sh, sw], padding))
    }

    pub fn apool(kh: usize, kw: usize, sh: usize, sw: usize, padding: PaddingSpec) -> OpDesc {
        OpDesc::AvgPool(PoolDesc::new([kh, kw], [sh, sw], padding))
    }
}

impl fmt::Display for OpDesc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpDesc::Conv(c) => write!(
                f,
                "conv({},{},{},{},{},{})",
                c.num_out_channels, c.kernel[0], c.kernel[1], c.strides[0], c.strides[1], c.padding
            ),
            OpDesc::MaxPool(p) => write!(f, "mpool({p})"),
            OpDesc::AvgPool(p) => write!(f, "apool({p})"),
            OpDesc::Share => write!(f, "share"),
        }
    }
}

fn parse_args(tag: &str, args: &str) -> NetResult<(TVec<usize>, Option<PaddingSpec>)> {
    let mut numbers = tvec!();
    let mut padding = None;
    for (ix, arg) in args.split(',').map(|a| a.trim()).enumerate() {
        if let Ok(n) = arg.parse::<usize>() {
            if padding.is_some() {
                bail!(NetError::UnknownOperation(format!("{tag}({args}): padding must come last")))
            }
            numbers.push(n);
        } else if padding.is_none() && ix > 0 && arg.chars().all(|c| c.is_ascii_alphabetic()) {
            padding = Some(arg.parse()?);
        } else {
            bail!(NetError::InvalidParameter(format!("{tag}({args}): invalid argument {arg:?}")))
        }
    }
    Ok((numbers, padding))
}

impl FromStr for OpDesc {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> NetResult<OpDesc> {
        let s = s.trim();
        if s == "share" || s == "share()" {
            return Ok(OpDesc::Share);
        }
        let (tag, args) = s
            .strip_suffix(')')
            .and_then(|s| s.split_once('('))
            .ok_or_else(|| NetError::UnknownOperation(format!("{s:?}")))?;
        let tag = tag.trim();
        if !["conv", "mpool", "apool"].contains(&tag) {
            bail!(NetError::UnknownOperation(format!("{tag:?} in {s:?}")))
        }
        let (n, padding) = parse_args(tag, args)?;
        let op = match (tag, &*n, padding) {
            ("conv", &[c, kh, kw], None) => OpDesc::conv(c, kh, kw),
            ("conv", &[c, kh, kw, sh, sw], p) => {
                OpDesc::conv_strided(c, kh, kw, sh, sw, p.unwrap_or(PaddingSpec::Same))
            }
            ("mpool" | "apool", &[kh, kw], None) => pool(tag, kh, kw, 2, 2, PaddingSpec::Valid),
            ("mpool" | "apool", &[kh, kw, sh, sw], p) => {
                pool(tag, kh, kw, sh, sw, p.unwrap_or(PaddingSpec::Valid))
            }
            _ => bail!(NetError::UnknownOperation(format!("wrong arguments in {s:?}"))),
        };
        Ok(op)
    }
}

fn pool(tag: &str, kh: usize, kw: usize, sh: usize, sw: usize, padding: PaddingSpec) -> OpDesc {
    if tag == "mpool" {
        OpDesc::mpool(kh, kw, sh, sw, padding)
    } else {
        OpDesc::apool(kh, kw, sh, sw, padding)
    }
}

/// Columns of an inception module, in concatenation order.
#[derive(Debug, Clone, PartialEq, Eq, Default, new)]
pub struct BranchSpec {
    pub columns: Vec<Vec<OpDesc>>,
}

impl From<Vec<Vec<OpDesc>>> for BranchSpec {
    fn from(columns: Vec<Vec<OpDesc>>) -> BranchSpec {
        BranchSpec { columns }
    }
}

impl FromStr for BranchSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> NetResult<BranchSpec> {
        let columns = s
            .split(';')
            .map(|column| {
                if column.trim().is_empty() {
                    Ok(vec![])
                } else {
                    column.split('>').map(|op| op.parse()).collect::<NetResult<Vec<OpDesc>>>()
                }
            })
            .collect::<NetResult<Vec<_>>>()
            .with_context(|| format!("Parsing branch spec {s:?}"))?;
        Ok(BranchSpec { columns })
    }
}

impl fmt::Display for BranchSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.columns.iter().map(|c| c.iter().join(" > ")).join("; "))
    }
}

impl BranchSpec {
    /// Checks column emptiness and share back-references.
    pub fn validate(&self, module: &str) -> NetResult<()> {
        for (c, column) in self.columns.iter().enumerate() {
            if column.is_empty() {
                bail!(NetError::EmptyBranch { module: module.to_string(), column: c })
            }
            for (position, op) in column.iter().enumerate() {
                if *op != OpDesc::Share {
                    continue;
                }
                let available = if c == 0 { 0 } else { self.columns[c - 1].len() };
                if position >= available {
                    bail!(NetError::ShareIndexOutOfRange {
                        module: module.to_string(),
                        column: c,
                        position,
                        available
                    })
                }
            }
        }
        Ok(())
    }
}

impl ConvNetBuilder {
    /// Apply an inception module to the top tensor.
    ///
    /// Every column starts from the module input; the last tensors of all
    /// columns are concatenated along the channel axis in column order. The
    /// module nodes are named after `name` and a per-name counter
    /// (`incept_v3_a0/conv7`...). On failure, the builder is left as it was.
    pub fn inception_module(&mut self, name: &str, spec: &BranchSpec) -> NetResult<OutletId> {
        if spec.columns.is_empty() {
            bail!(NetError::EmptyBranch { module: name.to_string(), column: 0 })
        }
        spec.validate(name)?;
        self.atomic(|cnn| {
            let leaf = cnn.unique_name(name);
            let module = cnn.scoped(&leaf);
            cnn.with_scope(&leaf, |cnn| cnn.wire_columns(spec))
                .with_context(|| format!("Building inception module {module}"))?;
            debug!(
                "{module}: {} columns, {} channels, {:?}",
                spec.columns.len(),
                cnn.top_size(),
                cnn.top_fact()?
            );
            Ok(cnn.top())
        })
    }

    fn wire_columns(&mut self, spec: &BranchSpec) -> NetResult<OutletId> {
        let input = (self.top(), self.top_size());
        let mut col_layers: Vec<Vec<(OutletId, usize)>> = vec![];
        for (c, column) in spec.columns.iter().enumerate() {
            self.set_top(input.0, input.1);
            let mut layers = vec![];
            for (l, op) in column.iter().enumerate() {
                match op {
                    OpDesc::Conv(d) => {
                        self.conv(d.num_out_channels, d.kernel, d.strides, d.padding)?;
                    }
                    OpDesc::MaxPool(d) => {
                        self.max_pool(d.kernel, d.strides, d.padding)?;
                    }
                    OpDesc::AvgPool(d) => {
                        self.avg_pool(d.kernel, d.strides, d.padding)?;
                    }
                    OpDesc::Share => {
                        let (outlet, size) = col_layers[c - 1][l];
                        self.set_top(outlet, size);
                    }
                }
                layers.push((self.top(), self.top_size()));
            }
            col_layers.push(layers);
        }
        let last: TVec<(OutletId, usize)> =
            col_layers.iter().filter_map(|layers| layers.last().copied()).collect();
        self.concat(&last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(fmt: DataFormat) -> ConvNetBuilder {
        let shape = fmt.from_n_c_hw(8, 288, [35, 35]).unwrap().shape;
        ConvNetBuilder::new(TypedFact::f32(shape), fmt).unwrap().with_batch_norm(true)
    }

    #[test]
    fn parse_ops() {
        assert_eq!("conv(64,3,3)".parse::<OpDesc>().unwrap(), OpDesc::conv(64, 3, 3));
        assert_eq!(
            " conv(96, 3, 3, 2, 2, VALID) ".parse::<OpDesc>().unwrap(),
            OpDesc::conv_strided(96, 3, 3, 2, 2, PaddingSpec::Valid)
        );
        assert_eq!(
            "mpool(3,3,2,2,VALID)".parse::<OpDesc>().unwrap(),
            OpDesc::mpool(3, 3, 2, 2, PaddingSpec::Valid)
        );
        assert_eq!(
            "apool(3,3,1,1,SAME)".parse::<OpDesc>().unwrap(),
            OpDesc::apool(3, 3, 1, 1, PaddingSpec::Same)
        );
        assert_eq!("mpool(3,3)".parse::<OpDesc>().unwrap(), OpDesc::mpool(3, 3, 2, 2, PaddingSpec::Valid));
        assert_eq!("share".parse::<OpDesc>().unwrap(), OpDesc::Share);
    }

    #[test]
    fn parse_unknown() {
        for s in ["lrn(5)", "conv(64,3,3,2,2,FULL)", "conv(64)", "share(1)", "conv 64"] {
            let e = s.parse::<OpDesc>().unwrap_err();
            assert!(
                matches!(e.net_error(), Some(NetError::UnknownOperation(_))),
                "{s}: {e:?}"
            );
        }
        let e = "conv(64,-3,3)".parse::<OpDesc>().unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::InvalidParameter(_))));
    }

    #[test]
    fn display_parses_back() {
        let spec: BranchSpec =
            "conv(64,1,1); conv(48,1,1) > conv(64,5,5); share > conv(384,3,1)".parse().unwrap();
        assert_eq!(spec.to_string().parse::<BranchSpec>().unwrap(), spec);
        assert_eq!(spec.columns.len(), 3);
        assert_eq!(spec.columns[2], vec![OpDesc::Share, OpDesc::conv(384, 3, 1)]);
    }

    #[test]
    fn v3_a_channels() {
        let mut cnn = builder(DataFormat::NHWC);
        let spec: BranchSpec = "conv(64,1,1); conv(48,1,1) > conv(64,5,5); \
             conv(64,1,1) > conv(96,3,3) > conv(96,3,3); apool(3,3,1,1,SAME) > conv(64,1,1)"
            .parse()
            .unwrap();
        let out = cnn.inception_module("incept_v3_a", &spec).unwrap();
        assert_eq!(cnn.top(), out);
        assert_eq!(cnn.top_size(), 64 + 64 + 96 + 64);
        assert_eq!(cnn.top_fact().unwrap(), &TypedFact::f32([8, 35, 35, 288]));
        let concat = cnn.model().node_by_name("incept_v3_a0/concat").unwrap();
        assert_eq!(concat.inputs.len(), 4);
        assert!(cnn.model().node_by_name("incept_v3_a0/conv0/BatchNorm").is_ok());
        assert!(cnn.model().node_by_name("incept_v3_a0/apool0").is_ok());
        cnn.inception_module("incept_v3_a", &spec).unwrap();
        assert!(cnn.model().node_by_name("incept_v3_a1/conv7").is_ok());
    }

    #[test]
    fn reduction_nchw() {
        let mut cnn = builder(DataFormat::NCHW);
        let spec: BranchSpec = "conv(384,3,3,2,2,VALID); \
             conv(64,1,1) > conv(96,3,3) > conv(96,3,3,2,2,VALID); mpool(3,3,2,2,VALID)"
            .parse()
            .unwrap();
        cnn.inception_module("incept_v3_b", &spec).unwrap();
        assert_eq!(cnn.top_fact().unwrap(), &TypedFact::f32([8, 768, 17, 17]));
        let concat = cnn.model().node_by_name("incept_v3_b0/concat").unwrap();
        assert_eq!(concat.op_as::<crate::ops::array::Concat>().unwrap().axis, 1);
    }

    #[test]
    fn share_reuses_the_same_tensor() {
        let mut cnn = builder(DataFormat::NHWC);
        let spec: BranchSpec =
            "conv(384,1,1) > conv(384,1,3); share > conv(384,3,1)".parse().unwrap();
        cnn.inception_module("incept_v3_e", &spec).unwrap();
        let model = cnn.model();
        // images + 3 convs of 3 nodes each + concat: the shared conv is wired once
        assert_eq!(model.nodes_len(), 1 + 3 * 3 + 1);
        let shared = model.node_by_name("incept_v3_e0/conv0/Relu").unwrap();
        assert_eq!(shared.outputs[0].successors.len(), 2);
        let second = model.node_by_name("incept_v3_e0/conv2").unwrap();
        assert_eq!(second.inputs, vec![OutletId::new(shared.id, 0)]);
        assert_eq!(cnn.top_size(), 768);
    }

    #[test]
    fn empty_branch() {
        let mut cnn = builder(DataFormat::NHWC);
        let spec: BranchSpec = "conv(64,1,1);;conv(32,1,1)".parse().unwrap();
        let e = cnn.inception_module("m", &spec).unwrap_err();
        assert_eq!(e.net_error(), Some(&NetError::EmptyBranch { module: "m".into(), column: 1 }));
        let e = cnn.inception_module("m", &BranchSpec::default()).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::EmptyBranch { .. })));
        assert_eq!(cnn.model().nodes_len(), 1);
    }

    #[test]
    fn share_out_of_range() {
        let mut cnn = builder(DataFormat::NHWC);
        let spec: BranchSpec = "conv(64,1,1); conv(64,1,1) > share".parse().unwrap();
        let e = cnn.inception_module("m", &spec).unwrap_err();
        assert_eq!(
            e.net_error(),
            Some(&NetError::ShareIndexOutOfRange {
                module: "m".into(),
                column: 1,
                position: 1,
                available: 1
            })
        );
        let spec: BranchSpec = "share; conv(64,1,1)".parse().unwrap();
        let e = cnn.inception_module("m", &spec).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::ShareIndexOutOfRange { column: 0, .. })));
    }

    #[test]
    fn mismatched_columns_roll_back() {
        let mut cnn = builder(DataFormat::NHWC);
        cnn.conv(32, [1, 1], [1, 1], PaddingSpec::Same).unwrap();
        let top = cnn.top();
        let nodes = cnn.model().nodes_len();
        let spec: BranchSpec = "conv(64,1,1); conv(64,3,3,2,2,VALID)".parse().unwrap();
        let e = cnn.inception_module("m", &spec).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::ShapeMismatch(_))));
        assert_eq!(cnn.top(), top);
        assert_eq!(cnn.top_size(), 32);
        assert_eq!(cnn.model().nodes_len(), nodes);
        assert!(cnn.model().node_by_name("m0/conv1").is_err());
        let spec: BranchSpec = "conv(64,1,1)".parse().unwrap();
        cnn.inception_module("m", &spec).unwrap();
        assert!(cnn.model().node_by_name("m0/conv1").is_ok());
    }
}
