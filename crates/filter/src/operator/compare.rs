//! Type-directed comparisons shared by the leaf operators.

use std::cmp::Ordering;

use recflow_core::{CoercionError, ScalarType, Value, ValueType};

/// Absolute tolerance for float equality.
pub const FLOAT_EPSILON: f64 = 1e-9;

/// Fixed slack for the binary representation of decimal literals, so that
/// `4.999999999` and `5.0` are still within [`FLOAT_EPSILON`].
const DECIMAL_SLACK: f64 = 1e-12;

/// Float equality within an absolute [`FLOAT_EPSILON`].
pub fn float_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= FLOAT_EPSILON + DECIMAL_SLACK
}

/// Scalar type of the elements an operand of type `ty` is compared on.
pub(crate) fn scalar_of(ty: ValueType) -> Option<ScalarType> {
    match ty.element() {
        ValueType::String => Some(ScalarType::String),
        ValueType::Int => Some(ScalarType::Int),
        ValueType::Float => Some(ScalarType::Float),
        _ => None,
    }
}

/// Equality of two values after coercing both to `ty`'s element type.
pub(crate) fn equals(ty: ValueType, a: &Value, b: &Value) -> Result<bool, CoercionError> {
    Ok(match ty {
        ValueType::String | ValueType::List(ScalarType::String) => a.to_text()? == b.to_text()?,
        ValueType::Int | ValueType::List(ScalarType::Int) => a.to_int()? == b.to_int()?,
        ValueType::Float | ValueType::List(ScalarType::Float) => {
            float_eq(a.to_float()?, b.to_float()?)
        }
        ValueType::Bool => a.to_bool()? == b.to_bool()?,
    })
}

/// Numeric ordering of `a` relative to `b`. Exact, with no tolerance;
/// `None` when either side is NaN.
pub(crate) fn ordering(
    ty: ValueType,
    a: &Value,
    b: &Value,
) -> Result<Option<Ordering>, CoercionError> {
    match ty {
        ValueType::Int => Ok(Some(a.to_int()?.cmp(&b.to_int()?))),
        _ => Ok(a.to_float()?.partial_cmp(&b.to_float()?)),
    }
}

/// Whether `needle` equals any element of `haystack`.
pub(crate) fn member(
    ty: ValueType,
    needle: &Value,
    haystack: &[Value],
) -> Result<bool, CoercionError> {
    for candidate in haystack {
        if equals(ty.element(), needle, candidate)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether the two collections share at least one element.
pub(crate) fn intersects(
    ty: ValueType,
    left: &[Value],
    right: &[Value],
) -> Result<bool, CoercionError> {
    for needle in left {
        if member(ty, needle, right)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_eq_absorbs_parse_rounding() {
        assert!(float_eq(4.999999999, 5.0));
        assert!(float_eq(0.1 + 0.2, 0.3));
        assert!(!float_eq(4.9, 5.0));
        assert!(!float_eq(5.0, 5.00001));
    }

    #[test]
    fn float_eq_tolerance_does_not_scale() {
        assert!(float_eq(1e9, 1e9));
        assert!(!float_eq(1e9, 1e9 + 1.19e-7));
        assert!(!float_eq(-1e12, -1e12 + 1e-3));
    }

    #[test]
    fn equals_coerces_both_sides() {
        assert!(equals(ValueType::Int, &Value::from("42"), &Value::Int(42)).unwrap());
        assert!(equals(ValueType::String, &Value::Int(7), &Value::from("7")).unwrap());
        assert!(equals(ValueType::Bool, &Value::from("TRUE"), &Value::Bool(true)).unwrap());
        assert!(!equals(ValueType::Float, &Value::Float(4.9), &Value::Int(5)).unwrap());
    }

    #[test]
    fn equals_on_list_type_compares_elements() {
        let ty = ValueType::List(ScalarType::Int);
        assert!(equals(ty, &Value::from("3"), &Value::Int(3)).unwrap());
        assert!(!equals(ty, &Value::Int(4), &Value::Int(3)).unwrap());
    }

    #[test]
    fn equals_surfaces_coercion_failures() {
        let err = equals(ValueType::Int, &Value::from("abc"), &Value::Int(1)).unwrap_err();
        assert!(matches!(err, CoercionError::Unparsable { target: "int", .. }));
    }

    #[test]
    fn ordering_is_exact() {
        let ord = ordering(ValueType::Float, &Value::Float(4.0), &Value::Float(4.0 + 1e-12));
        assert_eq!(ord.unwrap(), Some(Ordering::Less));

        let ord = ordering(ValueType::Float, &Value::Float(4.0), &Value::Int(4));
        assert_eq!(ord.unwrap(), Some(Ordering::Equal));

        let ord = ordering(ValueType::Int, &Value::Float(4.7), &Value::Int(4));
        assert_eq!(ord.unwrap(), Some(Ordering::Equal));

        let ord = ordering(ValueType::Float, &Value::Float(f64::NAN), &Value::Float(1.0));
        assert_eq!(ord.unwrap(), None);
    }

    #[test]
    fn intersects_is_any_common_element() {
        let ty = ValueType::List(ScalarType::String);
        let left = vec![Value::from("tech"), Value::from("sports")];
        let right = vec![Value::from("music"), Value::from("tech")];
        assert!(intersects(ty, &left, &right).unwrap());

        let left = vec![Value::from("music")];
        let right = vec![Value::from("tech")];
        assert!(!intersects(ty, &left, &right).unwrap());
        assert!(!intersects(ty, &[], &right).unwrap());
    }

    #[test]
    fn member_compares_on_element_type() {
        let haystack = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
        assert!(member(ValueType::List(ScalarType::Int), &Value::from("2"), &haystack).unwrap());
        assert!(!member(ValueType::Int, &Value::Int(4), &haystack).unwrap());
    }

    #[test]
    fn scalar_of_rejects_bool() {
        assert_eq!(scalar_of(ValueType::Bool), None);
        assert_eq!(scalar_of(ValueType::List(ScalarType::Float)), Some(ScalarType::Float));
        assert_eq!(scalar_of(ValueType::Int), Some(ScalarType::Int));
    }
}
