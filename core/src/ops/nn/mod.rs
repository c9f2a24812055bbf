mod batch_norm;
mod data_formats;
mod dense;
mod dropout;
mod reduce;
pub mod xent;

pub use self::batch_norm::BatchNorm;
pub use self::data_formats::{DataFormat, DataShape};
pub use self::dense::Dense;
pub use self::dropout::Dropout;
pub use self::reduce::{Reduce, Reducer};
pub use self::xent::{
    SoftmaxCrossEntropy, SparseSoftmaxCrossEntropy, softmax_cross_entropy_loss,
    sparse_softmax_cross_entropy_loss,
};

use crate::internal::*;

#[derive(Debug, Clone, Default)]
pub struct Relu;

impl Op for Relu {
    fn name(&self) -> Cow<str> {
        "Relu".into()
    }

    fn output_facts(&self, inputs: &[&TypedFact]) -> NetResult<TVec<TypedFact>> {
        Ok(tvec!(args_1!(inputs).clone()))
    }
}
