//! Pure condition evaluation (Functional Core).

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{DynamockError, Result};
use crate::model::{
    values_equal, AttributeValue, ComparisonOperator, Condition, ExpectedAttributeValue, Item,
};

/// Evaluates one condition against an attribute that may be missing.
///
/// Operand counts are checked before anything is compared, so a malformed
/// condition fails even when the attribute is absent.
pub fn evaluate(condition: &Condition, actual: Option<&AttributeValue>) -> Result<bool> {
    let operands = &condition.attribute_value_list;
    check_operand_count(condition.comparison_operator, operands.len())?;

    let matched = match condition.comparison_operator {
        ComparisonOperator::Eq => actual.is_some_and(|a| values_equal(a, &operands[0])),
        ComparisonOperator::Ne => actual.is_none_or(|a| !values_equal(a, &operands[0])),
        ComparisonOperator::Lt => ordered(actual, &operands[0], |o| o == Ordering::Less)?,
        ComparisonOperator::Le => ordered(actual, &operands[0], |o| o != Ordering::Greater)?,
        ComparisonOperator::Gt => ordered(actual, &operands[0], |o| o == Ordering::Greater)?,
        ComparisonOperator::Ge => ordered(actual, &operands[0], |o| o != Ordering::Less)?,
        ComparisonOperator::In => {
            actual.is_some_and(|a| operands.iter().any(|operand| values_equal(a, operand)))
        }
        ComparisonOperator::Between => {
            let (low, high) = (&operands[0], &operands[1]);
            require_scalar(low)?;
            require_scalar(high)?;
            if low.compare(high) == Some(Ordering::Greater) {
                return Err(DynamockError::validation(
                    "Invalid KeyConditionExpression: The BETWEEN operator requires upper bound to be greater than or equal to lower bound",
                ));
            }
            actual.is_some_and(|a| {
                a.compare(low).is_some_and(|o| o != Ordering::Less)
                    && a.compare(high).is_some_and(|o| o != Ordering::Greater)
            })
        }
        ComparisonOperator::BeginsWith => {
            let prefix = &operands[0];
            if !matches!(prefix, AttributeValue::S(_) | AttributeValue::B(_)) {
                return Err(DynamockError::validation(format!(
                    "One or more parameter values were invalid: ComparisonOperator BEGINS_WITH is not valid for {} AttributeValue type",
                    prefix.type_tag()
                )));
            }
            actual.is_some_and(|a| a.begins_with(prefix))
        }
        ComparisonOperator::Null => actual.is_none(),
        ComparisonOperator::NotNull => actual.is_some(),
        ComparisonOperator::Contains => actual.is_some_and(|a| a.contains(&operands[0])),
        ComparisonOperator::NotContains => actual.is_some_and(|a| !a.contains(&operands[0])),
    };

    Ok(matched)
}

/// Checks the `Expected` preconditions of a conditional write against the
/// item currently stored under the key (if any).
pub fn check_expected(
    expected: &HashMap<String, ExpectedAttributeValue>,
    current: Option<&Item>,
) -> Result<()> {
    for (name, expectation) in expected {
        let actual = current.and_then(|item| item.get(name));

        let satisfied = if let Some(operator) = expectation.comparison_operator {
            if expectation.exists.is_some() || expectation.value.is_some() {
                return Err(DynamockError::validation(
                    "One or more parameter values were invalid: Exists and Value cannot be used with ComparisonOperator",
                ));
            }
            let condition = Condition::new(operator, expectation.attribute_value_list.clone());
            evaluate(&condition, actual)?
        } else {
            match (expectation.exists, &expectation.value) {
                (Some(false), Some(_)) => {
                    return Err(DynamockError::validation(
                        "One or more parameter values were invalid: Value cannot be used when Exists is false",
                    ))
                }
                (Some(false), None) => actual.is_none(),
                (_, Some(value)) => actual.is_some_and(|a| values_equal(a, value)),
                (Some(true), None) | (None, None) => {
                    return Err(DynamockError::validation(format!(
                        "One or more parameter values were invalid: Value must be provided when Exists is true for Attribute: {}",
                        name
                    )))
                }
            }
        };

        if !satisfied {
            tracing::debug!(attribute = %name, "expectation not met");
            return Err(DynamockError::ConditionalCheckFailed);
        }
    }
    Ok(())
}

fn check_operand_count(operator: ComparisonOperator, count: usize) -> Result<()> {
    let valid = match operator {
        ComparisonOperator::Null | ComparisonOperator::NotNull => count == 0,
        ComparisonOperator::Between => count == 2,
        ComparisonOperator::In => count >= 1,
        _ => count == 1,
    };
    if valid {
        Ok(())
    } else {
        Err(DynamockError::validation(format!(
            "One or more parameter values were invalid: Invalid number of argument(s) for the {:?} ComparisonOperator",
            operator
        )))
    }
}

fn require_scalar(operand: &AttributeValue) -> Result<()> {
    operand.scalar_type().map(|_| ()).ok_or_else(|| {
        DynamockError::validation(format!(
            "One or more parameter values were invalid: ComparisonOperator is not valid for {} AttributeValue type",
            operand.type_tag()
        ))
    })
}

fn ordered<F>(actual: Option<&AttributeValue>, operand: &AttributeValue, accept: F) -> Result<bool>
where
    F: Fn(Ordering) -> bool,
{
    require_scalar(operand)?;
    Ok(actual
        .and_then(|a| a.compare(operand))
        .is_some_and(accept))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    fn n(value: &str) -> AttributeValue {
        AttributeValue::N(value.to_string())
    }

    fn cond(operator: ComparisonOperator, values: Vec<AttributeValue>) -> Condition {
        Condition::new(operator, values)
    }

    #[test]
    fn test_comparison_operators_on_strings() {
        let value = s("bar");
        let check = |op, operands| evaluate(&cond(op, operands), Some(&value)).unwrap();

        assert!(check(ComparisonOperator::Eq, vec![s("bar")]));
        assert!(check(ComparisonOperator::Ne, vec![s("ba")]));
        assert!(check(ComparisonOperator::Gt, vec![s("ba")]));
        assert!(check(ComparisonOperator::Ge, vec![s("bar")]));
        assert!(check(ComparisonOperator::Lt, vec![s("bat")]));
        assert!(check(ComparisonOperator::Le, vec![s("bar")]));
        assert!(check(ComparisonOperator::In, vec![s("x"), s("bar")]));
        assert!(check(ComparisonOperator::Between, vec![s("b"), s("c")]));
        assert!(check(ComparisonOperator::BeginsWith, vec![s("ba")]));
        assert!(check(ComparisonOperator::Contains, vec![s("ar")]));
        assert!(!check(ComparisonOperator::NotContains, vec![s("ar")]));
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let value = n("10");
        let result = evaluate(&cond(ComparisonOperator::Gt, vec![n("9")]), Some(&value)).unwrap();
        assert!(result);
    }

    #[test]
    fn test_large_integers_keep_their_order() {
        let bound = n("12345678901234567890");
        let above = n("12345678901234567891");

        let le = cond(ComparisonOperator::Le, vec![bound.clone()]);
        assert!(!evaluate(&le, Some(&above)).unwrap());
        let gt = cond(ComparisonOperator::Gt, vec![bound.clone()]);
        assert!(evaluate(&gt, Some(&above)).unwrap());
        let between = cond(ComparisonOperator::Between, vec![n("0"), bound]);
        assert!(!evaluate(&between, Some(&above)).unwrap());
    }

    #[test]
    fn test_missing_attribute() {
        assert!(evaluate(&cond(ComparisonOperator::Null, vec![]), None).unwrap());
        assert!(!evaluate(&cond(ComparisonOperator::NotNull, vec![]), None).unwrap());
        assert!(!evaluate(&cond(ComparisonOperator::Eq, vec![s("a")]), None).unwrap());
        assert!(evaluate(&cond(ComparisonOperator::Ne, vec![s("a")]), None).unwrap());
    }

    #[test]
    fn test_operand_count_is_validated() {
        let err = evaluate(&cond(ComparisonOperator::Between, vec![s("a")]), None).unwrap_err();
        assert!(matches!(err, DynamockError::Validation(_)));
        let err = evaluate(&cond(ComparisonOperator::Null, vec![s("a")]), None).unwrap_err();
        assert!(matches!(err, DynamockError::Validation(_)));
    }

    #[test]
    fn test_between_rejects_inverted_bounds() {
        let value = n("3");
        let result = evaluate(
            &cond(ComparisonOperator::Between, vec![n("4"), n("2")]),
            Some(&value),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_begins_with_rejects_numbers() {
        let value = n("3");
        let result = evaluate(
            &cond(ComparisonOperator::BeginsWith, vec![n("3")]),
            Some(&value),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mismatched_types_do_not_match() {
        let value = s("3");
        let result = evaluate(&cond(ComparisonOperator::Lt, vec![n("4")]), Some(&value)).unwrap();
        assert!(!result);
    }

    fn item(pairs: &[(&str, AttributeValue)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_expected_exists_false_fails_when_present() {
        let current = item(&[("foo", s("boom"))]);
        let expected = HashMap::from([(
            "foo".to_string(),
            ExpectedAttributeValue {
                exists: Some(false),
                ..Default::default()
            },
        )]);
        assert_eq!(
            check_expected(&expected, Some(&current)),
            Err(DynamockError::ConditionalCheckFailed)
        );
        assert_eq!(check_expected(&expected, None), Ok(()));
    }

    #[test]
    fn test_expected_value_must_match() {
        let current = item(&[("foo", s("boom"))]);
        let expected = HashMap::from([(
            "foo".to_string(),
            ExpectedAttributeValue {
                exists: Some(true),
                value: Some(s("bom")),
                ..Default::default()
            },
        )]);
        assert_eq!(
            check_expected(&expected, Some(&current)),
            Err(DynamockError::ConditionalCheckFailed)
        );

        let expected = HashMap::from([(
            "foo".to_string(),
            ExpectedAttributeValue {
                value: Some(s("boom")),
                ..Default::default()
            },
        )]);
        assert_eq!(check_expected(&expected, Some(&current)), Ok(()));
    }

    #[test]
    fn test_expected_with_comparison_operator() {
        let current = item(&[("count", n("5"))]);
        let expected = HashMap::from([(
            "count".to_string(),
            ExpectedAttributeValue {
                comparison_operator: Some(ComparisonOperator::Lt),
                attribute_value_list: vec![n("10")],
                ..Default::default()
            },
        )]);
        assert_eq!(check_expected(&expected, Some(&current)), Ok(()));
    }

    #[test]
    fn test_expected_rejects_value_with_exists_false() {
        let expected = HashMap::from([(
            "foo".to_string(),
            ExpectedAttributeValue {
                exists: Some(false),
                value: Some(s("x")),
                ..Default::default()
            },
        )]);
        assert!(matches!(
            check_expected(&expected, None),
            Err(DynamockError::Validation(_))
        ));
    }
}
