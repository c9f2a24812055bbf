use crate::internal::*;

/// Concatenation along one axis, inputs taken in order.
#[derive(Debug, Clone, new)]
pub struct Concat {
    pub axis: usize,
}

impl Op for Concat {
    fn name(&self) -> Cow<str> {
        "Concat".into()
    }

    fn info(&self) -> NetResult<Vec<String>> {
        Ok(vec![format!("axis: {}", self.axis)])
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        ensure!(!inputs.is_empty(), "Concat needs at least one input");
        let first = inputs[0];
        if self.axis >= first.rank() {
            bail!(NetError::ShapeMismatch(format!(
                "Concat axis {} is invalid for {:?}",
                self.axis, first
            )))
        }
        let mut shape = first.shape.clone();
        shape[self.axis] = 0;
        for input in inputs {
            let compatible = input.datum_type == first.datum_type
                && input.rank() == first.rank()
                && input
                    .shape
                    .iter()
                    .zip(first.shape.iter())
                    .enumerate()
                    .all(|(ix, (a, b))| ix == self.axis || a == b);
            if !compatible {
                bail!(NetError::ShapeMismatch(format!(
                    "Can not concatenate {:?} and {:?} along axis {}",
                    first, input, self.axis
                )))
            }
            shape[self.axis] += input.shape[self.axis];
        }
        Ok(tvec!(TypedFact::dt_shape(first.datum_type, shape)))
    }
}
