use crate::internal::*;

use super::DataFormat;

/// Batch normalization over the channel axis.
///
/// Trainable variables are `beta` (and `gamma` when `scale` is set), moving
/// mean and variance are non-trainable.
#[derive(Debug, Clone, new)]
pub struct BatchNorm {
    pub data_format: DataFormat,
    pub epsilon: f32,
    pub decay: f32,
    pub scale: bool,
}

impl BatchNorm {
    fn channels(&self, input: &TypedFact) -> NetResult<usize> {
        Ok(match input.rank() {
            4 => self.data_format.shape(&input.shape)?.c(),
            2 => input.shape[1],
            _ => bail!(NetError::ShapeMismatch(format!(
                "BatchNorm expects a rank 2 or 4 input, got {input:?}"
            ))),
        })
    }
}

impl Op for BatchNorm {
    fn name(&self) -> Cow<str> {
        "BatchNorm".into()
    }

    fn info(&self) -> NetResult<Vec<String>> {
        Ok(vec![format!(
            "epsilon: {} decay: {} scale: {} ({:?})",
            self.epsilon, self.decay, self.scale, self.data_format
        )])
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        let input = args_1!(inputs);
        self.channels(input)?;
        Ok(tvec!(input.clone()))
    }

    fn params(&self, inputs: &[&TypedFact]) -> NetResult<OpParams> {
        let c = self.channels(args_1!(inputs))?;
        Ok(OpParams::new(if self.scale { 2 * c } else { c }, 2 * c))
    }
}
