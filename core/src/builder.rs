//! Layer Builder: a build context threading the current top tensor through a
//! sequence of layer applications.
use std::ops::{Deref, DerefMut};

use itertools::Itertools;

use crate::internal::*;
use crate::ops::array::{Concat, Reshape};
use crate::ops::cnn::{AvgPool, Conv, MaxPool, PoolSpec};
use crate::ops::nn::{BatchNorm, Dense, Dropout, Reduce, Reducer, Relu};

/// Batch normalization hyper-parameters applied after every convolution.
#[derive(Debug, Clone, Copy, PartialEq, new)]
pub struct BatchNormConfig {
    pub decay: f32,
    pub epsilon: f32,
    pub scale: bool,
}

impl Default for BatchNormConfig {
    fn default() -> BatchNormConfig {
        BatchNormConfig { decay: 0.997, epsilon: 1e-3, scale: false }
    }
}

/// Everything an atomic building step may have to put back.
#[derive(Debug, Clone)]
struct Checkpoint {
    nodes: usize,
    top: OutletId,
    top_size: usize,
    counts: HashMap<String, usize>,
    scopes: usize,
}

/// Owns the graph under construction and its current top tensor.
///
/// Every layer method consumes the top tensor and replaces it with its
/// output. Failing methods leave the builder as it was before the call.
///
/// A builder has a single owner and cannot be duplicated:
///
/// ```compile_fail
/// use convnet_core::prelude::*;
/// let cnn = ConvNetBuilder::new(TypedFact::f32([1, 8, 8, 3]), DataFormat::NHWC).unwrap();
/// let _twin = cnn.clone();
/// ```
#[derive(Debug)]
pub struct ConvNetBuilder {
    model: TypedModel,
    top: OutletId,
    top_size: usize,
    data_format: DataFormat,
    use_batch_norm: bool,
    batch_norm_config: BatchNormConfig,
    phase_train: bool,
    counts: HashMap<String, usize>,
    scopes: Vec<String>,
    auxiliary: Option<(OutletId, usize)>,
    auxiliary_active: bool,
}

impl ConvNetBuilder {
    /// Start a network from a rank 4 image input laid out as `data_format`.
    pub fn new(images: TypedFact, data_format: DataFormat) -> NetResult<ConvNetBuilder> {
        if images.datum_type != DatumType::F32 {
            bail!(NetError::ShapeMismatch(format!("images must be f32, got {images:?}")))
        }
        let channels = data_format.shape(&images.shape)?.c();
        let mut model = TypedModel::default();
        let top = model.add_source("images", images)?;
        Ok(ConvNetBuilder {
            model,
            top,
            top_size: channels,
            data_format,
            use_batch_norm: false,
            batch_norm_config: BatchNormConfig::default(),
            phase_train: true,
            counts: HashMap::new(),
            scopes: vec![],
            auxiliary: None,
            auxiliary_active: false,
        })
    }

    pub fn with_batch_norm(mut self, use_batch_norm: bool) -> Self {
        self.use_batch_norm = use_batch_norm;
        self
    }

    pub fn with_batch_norm_config(mut self, config: BatchNormConfig) -> Self {
        self.batch_norm_config = config;
        self
    }

    /// Outside training, dropout layers are not wired.
    pub fn with_phase_train(mut self, phase_train: bool) -> Self {
        self.phase_train = phase_train;
        self
    }

    pub fn top(&self) -> OutletId {
        self.top
    }

    /// Channel count of the top tensor.
    pub fn top_size(&self) -> usize {
        self.top_size
    }

    pub fn top_fact(&self) -> NetResult<&TypedFact> {
        self.model.outlet_fact(self.top)
    }

    pub fn data_format(&self) -> DataFormat {
        self.data_format
    }

    /// Batch dimension of the images the network was started from.
    pub fn batch_size(&self) -> NetResult<usize> {
        let images = self.model.input_fact(0)?;
        Ok(self.data_format.shape(&images.shape)?.n())
    }

    pub fn model(&self) -> &TypedModel {
        &self.model
    }

    /// Output of the auxiliary head, once captured.
    pub fn auxiliary(&self) -> Option<OutletId> {
        self.auxiliary.map(|(outlet, _)| outlet)
    }

    pub fn into_model(self) -> TypedModel {
        self.model
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            nodes: self.model.nodes_len(),
            top: self.top,
            top_size: self.top_size,
            counts: self.counts.clone(),
            scopes: self.scopes.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.model.rollback(checkpoint.nodes);
        self.top = checkpoint.top;
        self.top_size = checkpoint.top_size;
        self.counts = checkpoint.counts;
        self.scopes.truncate(checkpoint.scopes);
    }

    /// Run a building step, putting the builder back as it was if it fails.
    pub(crate) fn atomic<T>(
        &mut self,
        f: impl FnOnce(&mut ConvNetBuilder) -> NetResult<T>,
    ) -> NetResult<T> {
        let checkpoint = self.checkpoint();
        let result = f(self);
        if result.is_err() {
            self.restore(checkpoint);
        }
        result
    }

    pub(crate) fn with_scope<T>(
        &mut self,
        scope: &str,
        f: impl FnOnce(&mut ConvNetBuilder) -> NetResult<T>,
    ) -> NetResult<T> {
        self.scopes.push(scope.to_string());
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Next name for a layer kind: `conv0`, `conv1`...
    pub(crate) fn unique_name(&mut self, prefix: &str) -> String {
        let count = self.counts.entry(prefix.to_string()).or_insert(0);
        let name = format!("{prefix}{count}");
        *count += 1;
        name
    }

    /// Full node name of `leaf` under the current scopes.
    pub(crate) fn scoped(&self, leaf: &str) -> String {
        self.scopes.iter().map(|s| s.as_str()).chain(std::iter::once(leaf)).join("/")
    }

    fn wire(
        &mut self,
        name: impl Into<String>,
        op: impl Into<Box<dyn Op>>,
        inputs: &[OutletId],
    ) -> NetResult<OutletId> {
        Ok(self.model.wire_node(name, op, inputs)?[0])
    }

    pub(crate) fn set_top(&mut self, top: OutletId, top_size: usize) {
        self.top = top;
        self.top_size = top_size;
    }

    /// Convolution, then batch normalization if enabled, then relu.
    pub fn conv(
        &mut self,
        num_out_channels: usize,
        kernel: [usize; 2],
        strides: [usize; 2],
        padding: PaddingSpec,
    ) -> NetResult<OutletId> {
        if num_out_channels == 0 {
            bail!(NetError::InvalidParameter("convolution with zero output channels".into()))
        }
        self.atomic(|cnn| {
            let leaf = cnn.unique_name("conv");
            let name = cnn.scoped(&leaf);
            let pool_spec = PoolSpec::new(cnn.data_format, kernel, padding, strides);
            let conv = Conv::new(pool_spec, cnn.top_size, num_out_channels, !cnn.use_batch_norm);
            let mut wire = cnn.wire(&name, conv, &[cnn.top])?;
            if cnn.use_batch_norm {
                let BatchNormConfig { decay, epsilon, scale } = cnn.batch_norm_config;
                let bn = BatchNorm::new(cnn.data_format, epsilon, decay, scale);
                wire = cnn.wire(format!("{name}/BatchNorm"), bn, &[wire])?;
            }
            let wire = cnn.wire(format!("{name}/Relu"), Relu, &[wire])?;
            cnn.set_top(wire, num_out_channels);
            Ok(wire)
        })
    }

    fn pool(
        &mut self,
        prefix: &str,
        kernel: [usize; 2],
        strides: [usize; 2],
        padding: PaddingSpec,
    ) -> NetResult<OutletId> {
        self.atomic(|cnn| {
            let leaf = cnn.unique_name(prefix);
            let name = cnn.scoped(&leaf);
            let pool_spec = PoolSpec::new(cnn.data_format, kernel, padding, strides);
            let op: Box<dyn Op> = if prefix == "mpool" {
                Box::new(MaxPool::new(pool_spec))
            } else {
                Box::new(AvgPool::new(pool_spec))
            };
            let wire = cnn.wire(name, op, &[cnn.top])?;
            cnn.top = wire;
            Ok(wire)
        })
    }

    pub fn max_pool(
        &mut self,
        kernel: [usize; 2],
        strides: [usize; 2],
        padding: PaddingSpec,
    ) -> NetResult<OutletId> {
        self.pool("mpool", kernel, strides, padding)
    }

    pub fn avg_pool(
        &mut self,
        kernel: [usize; 2],
        strides: [usize; 2],
        padding: PaddingSpec,
    ) -> NetResult<OutletId> {
        self.pool("apool", kernel, strides, padding)
    }

    /// Reshape the top tensor, `-1` standing for the inferred dimension.
    /// The channel count becomes the last dimension.
    pub fn reshape(&mut self, shape: &[isize]) -> NetResult<OutletId> {
        self.atomic(|cnn| {
            let leaf = cnn.unique_name("reshape");
            let name = cnn.scoped(&leaf);
            let wire = cnn.wire(name, Reshape::new(shape.into()), &[cnn.top])?;
            let last = cnn.model.outlet_fact(wire)?.shape.last().copied().unwrap_or(1);
            cnn.set_top(wire, last);
            Ok(wire)
        })
    }

    /// Dropout with the given keep probability, in (0, 1]. Nothing is wired
    /// outside training or for a keep probability of 1.
    pub fn dropout(&mut self, keep_prob: f32) -> NetResult<OutletId> {
        if !(keep_prob > 0.0 && keep_prob <= 1.0) {
            bail!(NetError::InvalidParameter(format!(
                "keep probability must be in (0, 1], got {keep_prob}"
            )))
        }
        if keep_prob == 1.0 || !self.phase_train {
            return Ok(self.top);
        }
        self.atomic(|cnn| {
            let leaf = cnn.unique_name("dropout");
            let name = cnn.scoped(&leaf);
            let wire = cnn.wire(name, Dropout::new(keep_prob), &[cnn.top])?;
            cnn.top = wire;
            Ok(wire)
        })
    }

    /// Standalone batch normalization of the top tensor.
    pub fn batch_norm(&mut self) -> NetResult<OutletId> {
        self.atomic(|cnn| {
            let leaf = cnn.unique_name("batchnorm");
            let name = cnn.scoped(&leaf);
            let BatchNormConfig { decay, epsilon, scale } = cnn.batch_norm_config;
            let bn = BatchNorm::new(cnn.data_format, epsilon, decay, scale);
            let wire = cnn.wire(name, bn, &[cnn.top])?;
            cnn.top = wire;
            Ok(wire)
        })
    }

    /// Fully connected layer over a `[batch, features]` top tensor.
    pub fn affine(&mut self, units: usize, relu: bool) -> NetResult<OutletId> {
        if units == 0 {
            bail!(NetError::InvalidParameter("affine layer with zero units".into()))
        }
        self.atomic(|cnn| {
            let leaf = cnn.unique_name("affine");
            let name = cnn.scoped(&leaf);
            let mut wire = cnn.wire(&name, Dense::new(cnn.top_size, units, true), &[cnn.top])?;
            if relu {
                wire = cnn.wire(format!("{name}/Relu"), Relu, &[wire])?;
            }
            cnn.set_top(wire, units);
            Ok(wire)
        })
    }

    /// Mean over the spatial axes, giving a `[batch, channels]` tensor.
    pub fn spatial_mean(&mut self) -> NetResult<OutletId> {
        self.atomic(|cnn| {
            let leaf = cnn.unique_name("spatial_mean");
            let name = cnn.scoped(&leaf);
            let op = Reduce::new(cnn.data_format.hw_axes().collect(), Reducer::Mean, false);
            let wire = cnn.wire(name, op, &[cnn.top])?;
            cnn.top = wire;
            Ok(wire)
        })
    }

    /// Concatenate tensors along the channel axis, in order.
    pub(crate) fn concat(&mut self, inputs: &[(OutletId, usize)]) -> NetResult<OutletId> {
        let name = self.scoped("concat");
        let outlets: TVec<OutletId> = inputs.iter().map(|(o, _)| *o).collect();
        let wire = self.wire(name, Concat::new(self.data_format.c_axis()), &outlets)?;
        self.set_top(wire, inputs.iter().map(|(_, size)| size).sum());
        Ok(wire)
    }

    /// Enter the auxiliary head scope.
    ///
    /// Layers applied through the returned guard start from the current top
    /// tensor. When the guard goes away the primary top tensor is restored;
    /// the auxiliary branch is only kept if [`AuxiliaryScope::commit`] was
    /// called, otherwise its nodes are rolled back. A network has at most one
    /// auxiliary head.
    pub fn switch_to_auxiliary(&mut self) -> NetResult<AuxiliaryScope<'_>> {
        if self.auxiliary_active {
            bail!(NetError::InvalidBuildState("already in the auxiliary scope".into()))
        }
        if self.auxiliary.is_some() {
            bail!(NetError::InvalidBuildState("auxiliary head already captured".into()))
        }
        debug!("Switching to auxiliary head from {:?}", self.top);
        self.auxiliary_active = true;
        let checkpoint = self.checkpoint();
        Ok(AuxiliaryScope { builder: self, checkpoint: Some(checkpoint), committed: false })
    }

    /// Build the auxiliary head with `f` and capture its output.
    pub fn with_auxiliary(
        &mut self,
        f: impl FnOnce(&mut ConvNetBuilder) -> NetResult<()>,
    ) -> NetResult<OutletId> {
        let mut scope = self.switch_to_auxiliary()?;
        f(&mut *scope)?;
        Ok(scope.commit())
    }
}

/// Guard for the auxiliary head scope, see
/// [`ConvNetBuilder::switch_to_auxiliary`].
#[derive(Debug)]
pub struct AuxiliaryScope<'a> {
    builder: &'a mut ConvNetBuilder,
    checkpoint: Option<Checkpoint>,
    committed: bool,
}

impl AuxiliaryScope<'_> {
    /// Keep the current top tensor as the auxiliary head output, and return
    /// to the primary branch.
    pub fn commit(mut self) -> OutletId {
        let top = self.builder.top;
        self.builder.auxiliary = Some((top, self.builder.top_size));
        self.committed = true;
        top
    }
}

impl Deref for AuxiliaryScope<'_> {
    type Target = ConvNetBuilder;
    fn deref(&self) -> &ConvNetBuilder {
        self.builder
    }
}

impl DerefMut for AuxiliaryScope<'_> {
    fn deref_mut(&mut self) -> &mut ConvNetBuilder {
        self.builder
    }
}

impl Drop for AuxiliaryScope<'_> {
    fn drop(&mut self) {
        if let Some(checkpoint) = self.checkpoint.take() {
            if self.committed {
                self.builder.set_top(checkpoint.top, checkpoint.top_size);
                self.builder.scopes.truncate(checkpoint.scopes);
            } else {
                debug!("Discarding uncommitted auxiliary head");
                self.builder.restore(checkpoint);
            }
        }
        self.builder.auxiliary_active = false;
    }
}
