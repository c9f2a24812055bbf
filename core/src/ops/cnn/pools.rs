use crate::internal::*;

use crate::ops::cnn::PaddingSpec;
use crate::ops::nn::{DataFormat, DataShape};

/// Sliding window geometry shared by convolutions and pools.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct PoolSpec {
    pub data_format: DataFormat,
    pub kernel_shape: [usize; 2],
    pub padding: PaddingSpec,
    pub strides: [usize; 2],
}

impl PoolSpec {
    pub fn info(&self) -> Vec<String> {
        vec![
            format!("Data format: {:?}", self.data_format),
            format!(
                "Kernel shape:{:?} (strides:{:?}, padding:{})",
                self.kernel_shape, self.strides, self.padding,
            ),
        ]
    }

    /// Input and output shapes for an input tensor, the output having
    /// `output_channels` channels (or as many as the input if None).
    pub fn compute_geo(
        &self,
        input_full_shape: &[usize],
        output_channels: Option<usize>,
    ) -> NetResult<(DataShape, DataShape)> {
        let input_shape = self.data_format.shape(input_full_shape)?;
        let computed =
            self.padding.compute(input_shape.hw_dims(), &self.kernel_shape, &self.strides)?;
        let spatial_dims = computed.iter().map(|d| d.output).collect::<TVec<usize>>();
        let output_shape = self.data_format.from_n_c_hw(
            input_shape.n(),
            output_channels.unwrap_or(input_shape.c()),
            spatial_dims,
        )?;
        Ok((input_shape, output_shape))
    }

    pub fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        let input = args_1!(inputs);
        crate::ops::ensure_f32_rank("pool", input, 4)?;
        let (_, output) = self.compute_geo(&input.shape, None)?;
        Ok(tvec!(TypedFact::dt_shape(input.datum_type, &output.shape)))
    }
}

#[derive(Debug, Clone, new)]
pub struct MaxPool {
    pub pool_spec: PoolSpec,
}

impl Op for MaxPool {
    fn name(&self) -> Cow<str> {
        "MaxPool".into()
    }

    fn info(&self) -> NetResult<Vec<String>> {
        Ok(self.pool_spec.info())
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        self.pool_spec.output_facts(inputs)
    }
}

/// Average pooling. Padded cells are excluded from the average, like
/// TensorFlow does.
#[derive(Debug, Clone, new)]
pub struct AvgPool {
    pub pool_spec: PoolSpec,
}

impl Op for AvgPool {
    fn name(&self) -> Cow<str> {
        "AvgPool".into()
    }

    fn info(&self) -> NetResult<Vec<String>> {
        Ok(self.pool_spec.info())
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        self.pool_spec.output_facts(inputs)
    }
}
