mod concat;
mod reshape;

pub use self::concat::Concat;
pub use self::reshape::Reshape;
