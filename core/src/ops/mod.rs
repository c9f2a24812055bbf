//! Ops
use std::fmt;

use downcast_rs::Downcast;

use crate::internal::*;

pub mod array;
pub mod cnn;
pub mod nn;
pub mod source;

/// Trainable and non-trainable variable counts of an op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, new)]
pub struct OpParams {
    pub trainable: usize,
    pub non_trainable: usize,
}

impl OpParams {
    pub fn trainable(trainable: usize) -> OpParams {
        OpParams { trainable, non_trainable: 0 }
    }
}

/// A graph operation.
///
/// Ops carry no tensor data: they know how to type their outputs from their
/// input facts, and how many variables the engine will have to allocate for
/// them.
pub trait Op: fmt::Debug + dyn_clone::DynClone + Send + Sync + 'static + Downcast {
    fn name(&self) -> Cow<str>;

    /// Short human-readable description of the op attributes.
    fn info(&self) -> NetResult<Vec<String>> {
        Ok(vec![])
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>>;

    #[allow(unused_variables)]
    fn params(&self, inputs: &[&TypedFact]) -> NetResult<OpParams> {
        Ok(OpParams::default())
    }
}

impl_downcast!(Op);
dyn_clone::clone_trait_object!(Op);

impl<O: Op> From<O> for Box<dyn Op> {
    fn from(it: O) -> Box<dyn Op> {
        Box::new(it)
    }
}

/// Checks a fact is a float tensor of the given rank.
pub(crate) fn ensure_f32_rank(op: &str, fact: &TypedFact, rank: usize) -> NetResult<()> {
    if fact.datum_type != DatumType::F32 || fact.rank() != rank {
        bail!(NetError::ShapeMismatch(format!(
            "{op} expects a rank {rank} f32 input, got {fact:?}"
        )))
    }
    Ok(())
}
