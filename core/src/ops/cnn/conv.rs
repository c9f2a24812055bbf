use crate::internal::*;

use crate::ops::cnn::PoolSpec;

/// 2D convolution with an implicit kernel variable of shape
/// `[kh, kw, input_channels, output_channels]`.
#[derive(Debug, Clone, new)]
pub struct Conv {
    pub pool_spec: PoolSpec,
    pub input_channels: usize,
    pub output_channels: usize,
    /// Whether a bias variable is added to the output. Off when a batch
    /// normalization follows.
    pub bias: bool,
}

impl Op for Conv {
    fn name(&self) -> Cow<str> {
        "Conv".into()
    }

    fn info(&self) -> NetResult<Vec<String>> {
        let mut info = self.pool_spec.info();
        info.push(format!(
            "Channels: {} -> {}{}",
            self.input_channels,
            self.output_channels,
            if self.bias { " (+bias)" } else { "" }
        ));
        Ok(info)
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        let input = args_1!(inputs);
        crate::ops::ensure_f32_rank("Conv", input, 4)?;
        let (input_shape, output_shape) =
            self.pool_spec.compute_geo(&input.shape, Some(self.output_channels))?;
        if input_shape.c() != self.input_channels {
            bail!(NetError::ShapeMismatch(format!(
                "Conv expects {} input channels, got {:?} ({:?})",
                self.input_channels, input, self.pool_spec.data_format
            )))
        }
        Ok(tvec!(TypedFact::dt_shape(input.datum_type, &output_shape.shape)))
    }

    fn params(&self, _inputs: &[&TypedFact]) -> NetResult<OpParams> {
        let [kh, kw] = self.pool_spec.kernel_shape;
        let kernel = kh * kw * self.input_channels * self.output_channels;
        let bias = if self.bias { self.output_channels } else { 0 };
        Ok(OpParams::trainable(kernel + bias))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::cnn::PaddingSpec;
    use crate::ops::nn::DataFormat;

    fn conv(fmt: DataFormat, kernel: [usize; 2], strides: [usize; 2], padding: PaddingSpec) -> Conv {
        Conv::new(PoolSpec::new(fmt, kernel, padding, strides), 3, 32, false)
    }

    #[test]
    fn stem_conv() {
        let op = conv(DataFormat::NHWC, [3, 3], [2, 2], PaddingSpec::Valid);
        let facts = op.output_facts(&[&TypedFact::f32([4, 299, 299, 3])]).unwrap();
        assert_eq!(facts[0], TypedFact::f32([4, 149, 149, 32]));
        assert_eq!(op.params(&[]).unwrap().trainable, 3 * 3 * 3 * 32);
    }

    #[test]
    fn asymmetric_kernel_nchw() {
        let op = conv(DataFormat::NCHW, [1, 7], [1, 1], PaddingSpec::Same);
        let facts = op.output_facts(&[&TypedFact::f32([4, 3, 17, 17])]).unwrap();
        assert_eq!(facts[0], TypedFact::f32([4, 32, 17, 17]));
    }

    #[test]
    fn wrong_channel_count() {
        let op = conv(DataFormat::NHWC, [3, 3], [1, 1], PaddingSpec::Same);
        let e = op.output_facts(&[&TypedFact::f32([4, 17, 17, 5])]).unwrap_err();
        assert!(matches!(e.net_error(), Some(NetError::ShapeMismatch(_))));
    }
}
