use std::fmt;
use std::str::FromStr;

use convnet_core::internal::*;
use ndarray::{ArrayView1, ArrayView2};
use convnet_core::ops::nn::{
    Dense, Reduce, Reducer, SparseSoftmaxCrossEntropy, sparse_softmax_cross_entropy_loss,
};

use crate::config::InceptionConfig;
use crate::graph::NetworkGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InceptionVersion {
    V3,
    V4,
}

impl FromStr for InceptionVersion {
    type Err = convnet_core::anyhow::Error;

    fn from_str(s: &str) -> NetResult<InceptionVersion> {
        match s {
            "inception3" => Ok(InceptionVersion::V3),
            "inception4" => Ok(InceptionVersion::V4),
            _ => bail!(NetError::UnsupportedModel(s.to_string())),
        }
    }
}

impl fmt::Display for InceptionVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InceptionVersion::V3 => write!(f, "inception3"),
            InceptionVersion::V4 => write!(f, "inception4"),
        }
    }
}

/// Network assembler for one Inception variant, fixed at construction.
#[derive(Debug, Clone)]
pub struct Inception {
    version: InceptionVersion,
    config: InceptionConfig,
}

impl Inception {
    /// Select a variant by name: `inception3` or `inception4`.
    pub fn new(model: &str, config: InceptionConfig) -> NetResult<Inception> {
        let version = model.parse::<InceptionVersion>()?;
        config.validate()?;
        if version == InceptionVersion::V4 && config.auxiliary {
            warn!("{version} has no auxiliary head, ignoring the auxiliary option");
        }
        Ok(Inception { version, config })
    }

    pub fn version(&self) -> InceptionVersion {
        self.version
    }

    pub fn config(&self) -> &InceptionConfig {
        &self.config
    }

    /// Shape of an image batch in the configured data format.
    pub fn image_shape(&self) -> TVec<usize> {
        let InceptionConfig { batch_size, image_size, data_format, .. } = self.config;
        match data_format {
            DataFormat::NCHW => tvec!(batch_size, 3, image_size, image_size),
            DataFormat::NHWC => tvec!(batch_size, image_size, image_size, 3),
        }
    }

    pub fn image_fact(&self) -> TypedFact {
        TypedFact::f32(self.image_shape())
    }

    /// Build the network on top of an RGB image batch.
    pub fn inference(&self, images: &TypedFact) -> NetResult<NetworkGraph> {
        let fmt = self.config.data_format;
        let channels = fmt.shape(&images.shape)?.c();
        if channels != 3 {
            bail!(NetError::ShapeMismatch(format!(
                "{} expects RGB images, got {:?} ({:?})",
                self.version, images, fmt
            )))
        }
        let mut cnn = ConvNetBuilder::new(images.clone(), fmt)?
            .with_batch_norm(self.config.use_batch_norm)
            .with_batch_norm_config(self.config.batch_norm)
            .with_phase_train(self.config.phase_train);
        let built = match self.version {
            InceptionVersion::V3 => crate::v3::build(&mut cnn, self.config.auxiliary),
            InceptionVersion::V4 => crate::v4::build(&mut cnn),
        };
        built.with_context(|| format!("Building {}", self.version))?;
        let output = cnn.top();
        let auxiliary = cnn.auxiliary();
        let graph = NetworkGraph::new(cnn.into_model(), output, auxiliary)?;
        info!(
            "Built {}: {} nodes, {} trainable parameters, output {:?}",
            self.version,
            graph.model().nodes_len(),
            graph.model().parameter_count()?,
            graph.output_fact()?
        );
        Ok(graph)
    }

    /// Append the final classification layer to the features, and to the
    /// auxiliary head if any.
    pub fn logits(&self, graph: NetworkGraph, num_classes: usize) -> NetResult<NetworkGraph> {
        if num_classes == 0 {
            bail!(NetError::InvalidParameter("zero classes".into()))
        }
        let output = graph.output();
        let auxiliary = graph.auxiliary();
        let mut model = graph.into_model();
        let logits = affine(&mut model, "logits", output, num_classes)?;
        let aux_logits =
            auxiliary.map(|aux| affine(&mut model, "aux_logits", aux, num_classes)).transpose()?;
        NetworkGraph::new(model, logits, aux_logits)
    }

    /// Batch mean of the sparse softmax cross-entropy between `logits`
    /// `[batch, num_classes]` and class `labels` `[batch]`.
    pub fn loss(&self, logits: ArrayView2<f32>, labels: ArrayView1<i64>) -> NetResult<f32> {
        sparse_softmax_cross_entropy_loss(logits, labels)
    }

    /// Wire the loss computation in the graph, returning the scalar outlet.
    pub fn wire_loss(
        model: &mut TypedModel,
        logits: OutletId,
        labels: OutletId,
    ) -> NetResult<OutletId> {
        let xent =
            model.wire_node("xentropy/xentropy", SparseSoftmaxCrossEntropy, &[logits, labels])?;
        let mean = Reduce::new(tvec!(0), Reducer::Mean, false);
        Ok(model.wire_node("xentropy/xentropy_mean", mean, &xent)?[0])
    }
}

fn affine(
    model: &mut TypedModel,
    name: &str,
    input: OutletId,
    num_classes: usize,
) -> NetResult<OutletId> {
    let features = model.outlet_fact(input)?.shape.last().copied().unwrap_or(0);
    Ok(model.wire_node(name, Dense::new(features, num_classes, true), &[input])?[0])
}
