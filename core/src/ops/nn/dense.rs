use crate::internal::*;

/// Fully connected layer: `x · W + b` over a `[batch, input_dim]` input.
#[derive(Debug, Clone, new)]
pub struct Dense {
    pub input_dim: usize,
    pub units: usize,
    pub bias: bool,
}

impl Op for Dense {
    fn name(&self) -> Cow<str> {
        "Dense".into()
    }

    fn info(&self) -> NetResult<Vec<String>> {
        Ok(vec![format!("{} -> {} (bias: {})", self.input_dim, self.units, self.bias)])
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        let input = args_1!(inputs);
        crate::ops::ensure_f32_rank("Dense", input, 2)?;
        if input.shape[1] != self.input_dim {
            bail!(NetError::ShapeMismatch(format!(
                "Dense expects {} input features, got {:?}",
                self.input_dim, input
            )))
        }
        Ok(tvec!(TypedFact::f32([input.shape[0], self.units])))
    }

    fn params(&self, _inputs: &[&TypedFact]) -> NetResult<OpParams> {
        Ok(OpParams::trainable(
            self.input_dim * self.units + if self.bias { self.units } else { 0 },
        ))
    }
}
