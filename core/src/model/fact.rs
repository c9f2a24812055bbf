//! Tensor type information.
use crate::internal::*;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DatumType {
    F32,
    I32,
    I64,
}

impl DatumType {
    pub fn is_float(&self) -> bool {
        *self == DatumType::F32
    }

    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DatumType::F32 => "f32",
            DatumType::I32 => "i32",
            DatumType::I64 => "i64",
        };
        f.write_str(s)
    }
}

/// Fully determined type of a tensor: element type and concrete shape.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypedFact {
    pub datum_type: DatumType,
    pub shape: TVec<usize>,
}

impl TypedFact {
    pub fn dt_shape(datum_type: DatumType, shape: impl AsRef<[usize]>) -> TypedFact {
        TypedFact { datum_type, shape: shape.as_ref().into() }
    }

    pub fn f32(shape: impl AsRef<[usize]>) -> TypedFact {
        Self::dt_shape(DatumType::F32, shape)
    }

    pub fn i64(shape: impl AsRef<[usize]>) -> TypedFact {
        Self::dt_shape(DatumType::I64, shape)
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn volume(&self) -> usize {
        self.shape.iter().product()
    }
}

impl fmt::Debug for TypedFact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for d in self.shape.iter() {
            write!(f, "{d},")?;
        }
        write!(f, "{}", self.datum_type)
    }
}

impl fmt::Display for TypedFact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
