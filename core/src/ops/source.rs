use crate::internal::*;

/// Graph input placeholder.
#[derive(Debug, Clone, new)]
pub struct Source {
    pub fact: TypedFact,
}

impl Op for Source {
    fn name(&self) -> Cow<str> {
        "Source".into()
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        ensure!(inputs.is_empty(), "Source takes no input");
        Ok(tvec!(self.fact.clone()))
    }
}
