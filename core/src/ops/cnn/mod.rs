mod conv;
mod padding;
mod pools;

pub use self::conv::Conv;
pub use self::padding::{ComputedPaddedDim, PaddingSpec};
pub use self::pools::{AvgPool, MaxPool, PoolSpec};
