use crate::internal::*;

/// Training-time dropout. The builder never wires it when the keep
/// probability is 1 or outside of training, so its presence in a graph
/// always means actual masking.
#[derive(Debug, Clone, new)]
pub struct Dropout {
    pub keep_prob: f32,
}

impl Op for Dropout {
    fn name(&self) -> Cow<str> {
        "Dropout".into()
    }

    fn info(&self) -> NetResult<Vec<String>> {
        Ok(vec![format!("keep_prob: {}", self.keep_prob)])
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        Ok(tvec!(args_1!(inputs).clone()))
    }
}
