//! Semantic type system.
//!
//! Distinct from the type AST: the parser records what the programmer
//! wrote, this module describes what the compiler reasons about. Only
//! `Void` and `Integer` are fully realized; the remaining kinds are
//! reserved for the rest of the language.

use std::fmt;

/// Width of an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntegerSize {
    S8,
    S16,
    S32,
    S64,
}

impl IntegerSize {
    pub fn bits(self) -> u32 {
        match self {
            IntegerSize::S8 => 8,
            IntegerSize::S16 => 16,
            IntegerSize::S32 => 32,
            IntegerSize::S64 => 64,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            IntegerSize::S8 => 1,
            IntegerSize::S16 => 2,
            IntegerSize::S32 => 4,
            IntegerSize::S64 => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Unknown,
    Void,
    Integer { size: IntegerSize, is_signed: bool },
    Float,
    Pointer { pointee: Box<Type>, is_const: bool },
    Struct,
    Enum,
    Union,
}

impl Type {
    pub fn signed(size: IntegerSize) -> Self {
        Type::Integer {
            size,
            is_signed: true,
        }
    }

    pub fn unsigned(size: IntegerSize) -> Self {
        Type::Integer {
            size,
            is_signed: false,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer { .. })
    }

    pub fn is_integer_or_pointer(&self) -> bool {
        matches!(self, Type::Integer { .. } | Type::Pointer { .. })
    }

    /// Whether a value of type `src` may be implicitly converted to `dst`
    /// as part of expression evaluation.
    pub fn can_coerce(dst: &Type, src: &Type) -> bool {
        if src == dst {
            return true;
        }

        match (dst, src) {
            (Type::Integer { .. }, Type::Integer { .. }) => true,
            (Type::Pointer { .. }, Type::Pointer { .. }) => true,
            (Type::Float, Type::Integer { .. }) => true,
            _ => false,
        }
    }

    /// Usual arithmetic conversions: pick the operand type with the larger
    /// positive-representable range, ties going to `first`, then widen
    /// anything narrower than 32 bits to 32 bits.
    pub fn promote(first: &Type, second: &Type) -> Type {
        let (
            Type::Integer {
                size: first_size,
                is_signed: first_signed,
            },
            Type::Integer {
                size: second_size,
                is_signed: second_signed,
            },
        ) = (first, second)
        else {
            return Type::Unknown;
        };

        // rank by highest representable positive value
        let rank = |size: IntegerSize, is_signed: bool| {
            2 * size.bits() + if is_signed { 0 } else { 1 }
        };

        let (mut size, is_signed) =
            if rank(*first_size, *first_signed) >= rank(*second_size, *second_signed) {
                (*first_size, *first_signed)
            } else {
                (*second_size, *second_signed)
            };

        // small-integer promotion
        if size < IntegerSize::S32 {
            size = IntegerSize::S32;
        }

        Type::Integer { size, is_signed }
    }

    /// Size of a value of this type in bytes.
    pub fn size_bytes(&self) -> usize {
        match self {
            Type::Integer { size, .. } => size.bytes(),
            _ => panic!("size of unimplemented type: {}", self),
        }
    }

    /// Required alignment in bytes. Integers align to their size.
    pub fn align_bytes(&self) -> usize {
        self.size_bytes()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => f.write_str("unknown"),
            Type::Void => f.write_str("void"),
            Type::Integer { size, is_signed } => {
                if !is_signed {
                    f.write_str("u")?;
                }
                write!(f, "int{}", size.bits())
            }
            Type::Float => f.write_str("float"),
            Type::Pointer { pointee, .. } => write!(f, "{}*", pointee),
            Type::Struct => f.write_str("struct"),
            Type::Enum => f.write_str("enum"),
            Type::Union => f.write_str("union"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_sizes() {
        assert_eq!(IntegerSize::S8.bytes(), 1);
        assert_eq!(IntegerSize::S16.bytes(), 2);
        assert_eq!(IntegerSize::S32.bytes(), 4);
        assert_eq!(IntegerSize::S64.bytes(), 8);
        assert_eq!(IntegerSize::S64.bits(), 64);
    }

    #[test]
    fn test_equality_requires_width_and_signedness() {
        assert_eq!(Type::signed(IntegerSize::S32), Type::signed(IntegerSize::S32));
        assert_ne!(Type::signed(IntegerSize::S32), Type::unsigned(IntegerSize::S32));
        assert_ne!(Type::signed(IntegerSize::S32), Type::signed(IntegerSize::S64));
    }

    #[test]
    fn test_coercion_between_integers() {
        assert!(Type::can_coerce(
            &Type::signed(IntegerSize::S64),
            &Type::unsigned(IntegerSize::S8)
        ));
        assert!(!Type::can_coerce(
            &Type::Void,
            &Type::signed(IntegerSize::S32)
        ));
        assert!(!Type::can_coerce(
            &Type::signed(IntegerSize::S32),
            &Type::Void
        ));
    }

    #[test]
    fn test_coercion_integer_to_float_reserved() {
        assert!(Type::can_coerce(
            &Type::Float,
            &Type::signed(IntegerSize::S32)
        ));
        assert!(!Type::can_coerce(
            &Type::signed(IntegerSize::S32),
            &Type::Float
        ));
    }

    #[test]
    fn test_promotion_picks_wider_operand() {
        let result = Type::promote(
            &Type::signed(IntegerSize::S64),
            &Type::signed(IntegerSize::S32),
        );
        assert_eq!(result, Type::signed(IntegerSize::S64));
    }

    #[test]
    fn test_promotion_prefers_unsigned_at_equal_width() {
        let result = Type::promote(
            &Type::signed(IntegerSize::S32),
            &Type::unsigned(IntegerSize::S32),
        );
        assert_eq!(result, Type::unsigned(IntegerSize::S32));
    }

    #[test]
    fn test_promotion_ties_break_to_first_operand() {
        let result = Type::promote(
            &Type::signed(IntegerSize::S32),
            &Type::signed(IntegerSize::S32),
        );
        assert_eq!(result, Type::signed(IntegerSize::S32));
    }

    #[test]
    fn test_promotion_widens_small_integers() {
        let result = Type::promote(
            &Type::signed(IntegerSize::S8),
            &Type::signed(IntegerSize::S16),
        );
        assert_eq!(result, Type::signed(IntegerSize::S32));
    }

    #[test]
    fn test_promotion_of_non_integers_is_unknown() {
        assert_eq!(
            Type::promote(&Type::Void, &Type::signed(IntegerSize::S32)),
            Type::Unknown
        );
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Type::signed(IntegerSize::S32).to_string(), "int32");
        assert_eq!(Type::unsigned(IntegerSize::S8).to_string(), "uint8");
        assert_eq!(Type::signed(IntegerSize::S64).to_string(), "int64");
        assert_eq!(Type::Void.to_string(), "void");
    }
}
