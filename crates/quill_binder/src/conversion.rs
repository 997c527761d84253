//! Conversion classification between types.

use quill_bound::TypeSymbol;

/// How a value of one type may become another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Same type; no conversion node is needed.
    Identity,
    /// Inserted silently where a value is expected.
    Implicit,
    /// Only allowed through a `type(value)` cast.
    Explicit,
    /// Not allowed at all.
    None,
}

/// Classify the conversion from `from` to `to`.
///
/// A failed expression converts to anything by identity so that one error
/// does not cascade into conversion errors.
pub fn classify(from: &TypeSymbol, to: &TypeSymbol) -> Conversion {
    use TypeSymbol::*;

    if from == to || from.is_invalid() || to.is_invalid() {
        return Conversion::Identity;
    }
    if from.is_void() || to.is_void() {
        return Conversion::None;
    }
    match (from, to) {
        (_, Object) => Conversion::Implicit,
        (Object, _) => Conversion::Explicit,
        (Int, Float) => Conversion::Implicit,
        (Float, Int) => Conversion::Explicit,
        (Int | Float | Bool, String) => Conversion::Explicit,
        (Bool, Int | Float) | (Int | Float, Bool) => Conversion::Explicit,
        _ => Conversion::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TypeSymbol::*;

    #[test]
    fn test_conversion_matrix() {
        assert_eq!(classify(&Int, &Int), Conversion::Identity);
        assert_eq!(classify(&Int, &Float), Conversion::Implicit);
        assert_eq!(classify(&Float, &Int), Conversion::Explicit);
        assert_eq!(classify(&Int, &String), Conversion::Explicit);
        assert_eq!(classify(&String, &Int), Conversion::None);
        assert_eq!(classify(&String, &Bool), Conversion::None);
        assert_eq!(classify(&Bool, &Int), Conversion::Explicit);
    }

    #[test]
    fn test_object_conversions() {
        assert_eq!(classify(&String, &Object), Conversion::Implicit);
        assert_eq!(classify(&TypeSymbol::array(Int, 1), &Object), Conversion::Implicit);
        assert_eq!(classify(&Object, &Int), Conversion::Explicit);
        assert_eq!(classify(&Void, &Object), Conversion::None);
        assert_eq!(classify(&Object, &Void), Conversion::None);
    }

    #[test]
    fn test_arrays_convert_only_to_themselves() {
        let ints = TypeSymbol::array(Int, 1);
        let floats = TypeSymbol::array(Float, 1);
        assert_eq!(classify(&ints, &ints.clone()), Conversion::Identity);
        assert_eq!(classify(&ints, &floats), Conversion::None);
    }

    #[test]
    fn test_invalid_never_cascades() {
        assert_eq!(classify(&Invalid, &Int), Conversion::Identity);
        assert_eq!(classify(&Int, &Invalid), Conversion::Identity);
    }
}
