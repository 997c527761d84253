//! Type system representation.
//!
//! Types are small structural values. Two types are equal exactly when their
//! displayed names are equal, so they can be compared and hashed directly.

use std::fmt;

/// A type in the quill type system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSymbol {
    Int,
    Float,
    Bool,
    String,
    /// `any`. Operations involving it are checked at runtime.
    Object,
    Void,
    /// An array of `rank` dimensions. The element type may itself be an array.
    Array(Box<TypeSymbol>, u32),
    /// The type of an expression that failed to bind. Displays as `?`.
    Invalid,
}

impl TypeSymbol {
    /// Resolve a built-in type name as written in source.
    pub fn lookup(name: &str) -> Option<TypeSymbol> {
        let ty = match name {
            "int" => TypeSymbol::Int,
            "float" => TypeSymbol::Float,
            "bool" => TypeSymbol::Bool,
            "string" => TypeSymbol::String,
            "any" => TypeSymbol::Object,
            "void" => TypeSymbol::Void,
            _ => return None,
        };
        Some(ty)
    }

    pub fn array(element: TypeSymbol, rank: u32) -> TypeSymbol {
        TypeSymbol::Array(Box::new(element), rank.max(1))
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeSymbol::Int | TypeSymbol::Float)
    }

    /// `int`, `float`, `bool`, or `string`.
    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeSymbol::Int | TypeSymbol::Float | TypeSymbol::Bool | TypeSymbol::String
        )
    }

    #[inline]
    pub fn is_invalid(&self) -> bool {
        matches!(self, TypeSymbol::Invalid)
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, TypeSymbol::Void)
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, TypeSymbol::Object)
    }

    pub fn element_type(&self) -> Option<&TypeSymbol> {
        match self {
            TypeSymbol::Array(element, _) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for TypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSymbol::Int => write!(f, "int"),
            TypeSymbol::Float => write!(f, "float"),
            TypeSymbol::Bool => write!(f, "bool"),
            TypeSymbol::String => write!(f, "string"),
            TypeSymbol::Object => write!(f, "any"),
            TypeSymbol::Void => write!(f, "void"),
            TypeSymbol::Array(element, rank) => {
                write!(f, "{}[", element)?;
                for _ in 1..*rank {
                    write!(f, ",")?;
                }
                write!(f, "]")
            }
            TypeSymbol::Invalid => write!(f, "?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(TypeSymbol::lookup("any"), Some(TypeSymbol::Object));
        assert_eq!(TypeSymbol::lookup("void"), Some(TypeSymbol::Void));
        assert_eq!(TypeSymbol::lookup("number"), None);
    }

    #[test]
    fn test_array_names() {
        let matrix = TypeSymbol::array(TypeSymbol::Int, 2);
        assert_eq!(matrix.to_string(), "int[,]");

        let jagged = TypeSymbol::array(TypeSymbol::array(TypeSymbol::String, 1), 1);
        assert_eq!(jagged.to_string(), "string[][]");
        assert_eq!(jagged.element_type(), Some(&TypeSymbol::array(TypeSymbol::String, 1)));
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(
            TypeSymbol::array(TypeSymbol::Float, 1),
            TypeSymbol::array(TypeSymbol::Float, 1)
        );
        assert_ne!(
            TypeSymbol::array(TypeSymbol::Float, 1),
            TypeSymbol::array(TypeSymbol::Float, 2)
        );
        assert_eq!(TypeSymbol::Invalid.to_string(), "?");
    }
}
