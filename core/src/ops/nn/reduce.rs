use crate::internal::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reducer {
    Mean,
}

#[derive(Clone, Debug, new)]
pub struct Reduce {
    pub axes: TVec<usize>,
    pub reducer: Reducer,
    pub keep_dims: bool,
}

impl Op for Reduce {
    fn name(&self) -> Cow<str> {
        format!("Reduce<{:?}>", self.reducer).into()
    }

    fn info(&self) -> NetResult<Vec<String>> {
        Ok(vec![format!("axes: {:?} keep_dims: {}", self.axes, self.keep_dims)])
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        let input = args_1!(inputs);
        if let Some(axis) = self.axes.iter().find(|&&a| a >= input.rank()) {
            bail!(NetError::ShapeMismatch(format!(
                "Can not reduce axis {axis} of {input:?}"
            )))
        }
        let shape: TVec<usize> = input
            .shape
            .iter()
            .enumerate()
            .filter_map(|(ix, &d)| {
                if !self.axes.contains(&ix) {
                    Some(d)
                } else if self.keep_dims {
                    Some(1)
                } else {
                    None
                }
            })
            .collect();
        Ok(tvec!(TypedFact::dt_shape(input.datum_type, shape)))
    }
}
