//!
//! The Compare module contains the total-order comparison over dynamically typed field
//! values, used by the sort-by operation.
//!

use std::cmp::Ordering;

use crate::value::Value;

/// Compares two optional field values under a total order
///
/// A missing field compares the same as an explicit null.  The order is:
/// 1. Null sorts before any non-null value; two nulls compare equal.
/// 2. Two numeric values compare by magnitude, widened to floating point, regardless
///    of their original representation.
/// 3. Two values of the same concrete type with a natural order (strings, booleans)
///    compare by that order.
/// 4. Anything else falls back to comparing string renderings, so a mixed-type field
///    can never fail at sort time.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => {
            if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
                x.total_cmp(&y)
            } else {
                a.group_key().cmp(&b.group_key())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sorts_first() {
        assert_eq!(compare_values(None, Some(&Value::Int(0))), Ordering::Less);
        assert_eq!(compare_values(Some(&Value::Null), Some(&Value::String("".to_string()))), Ordering::Less);
        assert_eq!(compare_values(None, Some(&Value::Null)), Ordering::Equal);
    }

    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(compare_values(Some(&Value::Int(2)), Some(&Value::Float(2.5))), Ordering::Less);
        assert_eq!(compare_values(Some(&Value::Float(3.0)), Some(&Value::Int(3))), Ordering::Equal);
        assert_eq!(compare_values(Some(&Value::Int(10)), Some(&Value::Int(9))), Ordering::Greater);
    }

    #[test]
    fn same_type_natural_order() {
        assert_eq!(
            compare_values(Some(&Value::String("abc".to_string())), Some(&Value::String("abd".to_string()))),
            Ordering::Less
        );
        assert_eq!(compare_values(Some(&Value::Bool(false)), Some(&Value::Bool(true))), Ordering::Less);
    }

    #[test]
    fn mixed_types_fall_back_to_strings() {
        //"5" vs "abc" lexicographically
        assert_eq!(
            compare_values(Some(&Value::Int(5)), Some(&Value::String("abc".to_string()))),
            Ordering::Less
        );
        //A boolean against a number: "true" vs "1"
        assert_eq!(
            compare_values(Some(&Value::Bool(true)), Some(&Value::Int(1))),
            Ordering::Greater
        );
    }
}
