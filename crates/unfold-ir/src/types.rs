//! Value types of the IR.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar element types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimType {
    I8,
    I32,
    I64,
    U8,
    F32,
    Bool,
}

impl PrimType {
    /// All primitive types, in the order the parser tries them.
    pub const ALL: [PrimType; 6] = [
        PrimType::I8,
        PrimType::I32,
        PrimType::I64,
        PrimType::U8,
        PrimType::F32,
        PrimType::Bool,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimType::I8 => "i8",
            PrimType::I32 => "i32",
            PrimType::I64 => "i64",
            PrimType::U8 => "u8",
            PrimType::F32 => "f32",
            PrimType::Bool => "bool",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }
}

/// The type of an IR value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// Scalar value.
    Prim(PrimType),
    /// Dense tensor. An empty shape is a rank-0 tensor.
    Tensor { shape: Vec<u64>, dtype: PrimType },
    /// Fixed-arity product of field types.
    Tuple(Vec<Type>),
    /// Opaque runtime object.
    Object,
}

impl Type {
    pub fn is_tuple(&self) -> bool {
        matches!(self, Type::Tuple(_))
    }

    /// Field types when this is a tuple type.
    pub fn tuple_fields(&self) -> Option<&[Type]> {
        match self {
            Type::Tuple(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn unit() -> Self {
        Type::Tuple(Vec::new())
    }
}

impl From<PrimType> for Type {
    fn from(prim: PrimType) -> Self {
        Type::Prim(prim)
    }
}

impl fmt::Display for PrimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Prim(prim) => write!(f, "{prim}"),
            Type::Tensor { shape, dtype } => {
                f.write_str("tensor<")?;
                for dim in shape {
                    write!(f, "{dim}x")?;
                }
                write!(f, "{dtype}>")
            }
            Type::Tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
            Type::Object => f.write_str("object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested_types() {
        let ty = Type::Tuple(vec![
            Type::Tensor {
                shape: vec![5, 7],
                dtype: PrimType::F32,
            },
            Type::Prim(PrimType::I32),
            Type::unit(),
        ]);
        assert_eq!(ty.to_string(), "(tensor<5x7xf32>, i32, ())");
    }

    #[test]
    fn test_rank_zero_tensor() {
        let ty = Type::Tensor {
            shape: vec![],
            dtype: PrimType::U8,
        };
        assert_eq!(ty.to_string(), "tensor<u8>");
    }

    #[test]
    fn test_prim_names_roundtrip() {
        for prim in PrimType::ALL {
            assert_eq!(PrimType::from_name(prim.name()), Some(prim));
        }
        assert_eq!(PrimType::from_name("tensor"), None);
    }

    #[test]
    fn test_tuple_fields() {
        let ty = Type::Tuple(vec![PrimType::I32.into(), PrimType::Bool.into()]);
        assert!(ty.is_tuple());
        assert_eq!(ty.tuple_fields().map(<[Type]>::len), Some(2));
        assert_eq!(Type::Object.tuple_fields(), None);
    }
}
