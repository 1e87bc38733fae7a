//! Applying `AttributeUpdates` to a stored item (Functional Core).

use std::collections::HashMap;

use crate::error::{DynamockError, Result};
use crate::model::{
    add_numbers, normalize_number, AttributeAction, AttributeValue, AttributeValueUpdate, Item,
};

/// Applies every update to `item` in place.
///
/// `key_names` are the primary key attributes, which may never be updated.
pub fn apply_updates(
    item: &mut Item,
    updates: &HashMap<String, AttributeValueUpdate>,
    key_names: &[&str],
) -> Result<()> {
    reject_key_updates(updates, key_names)?;
    for (name, update) in updates {
        if let Some(value) = &update.value {
            value.validate()?;
        }

        match update.action {
            AttributeAction::Put => {
                let value = required_value(name, update)?;
                item.insert(name.clone(), value.clone());
            }
            AttributeAction::Delete => match &update.value {
                None => {
                    item.remove(name);
                }
                Some(value) => delete_from_set(item, name, value)?,
            },
            AttributeAction::Add => {
                let value = required_value(name, update)?;
                let merged = add_value(item.get(name), value)?;
                item.insert(name.clone(), merged);
            }
        }
    }
    Ok(())
}

/// Fails if any update names a primary key attribute.
pub fn reject_key_updates(
    updates: &HashMap<String, AttributeValueUpdate>,
    key_names: &[&str],
) -> Result<()> {
    match updates
        .keys()
        .find(|name| key_names.contains(&name.as_str()))
    {
        Some(name) => Err(DynamockError::validation(format!(
            "One or more parameter values were invalid: Cannot update attribute {}. This attribute is part of the key",
            name
        ))),
        None => Ok(()),
    }
}

fn required_value<'a>(name: &str, update: &'a AttributeValueUpdate) -> Result<&'a AttributeValue> {
    update.value.as_ref().ok_or_else(|| {
        DynamockError::validation(format!(
            "One or more parameter values were invalid: Only DELETE action is allowed when no attribute value is specified: {}",
            name
        ))
    })
}

fn type_mismatch() -> DynamockError {
    DynamockError::validation("Type mismatch for attribute to update")
}

fn add_value(existing: Option<&AttributeValue>, value: &AttributeValue) -> Result<AttributeValue> {
    match (existing, value) {
        (None, AttributeValue::N(n)) => normalize_number(n)
            .map(AttributeValue::N)
            .ok_or_else(type_mismatch),
        (Some(AttributeValue::N(current)), AttributeValue::N(n)) => add_numbers(current, n)
            .map(AttributeValue::N)
            .ok_or_else(type_mismatch),
        (None, AttributeValue::Ss(_) | AttributeValue::Ns(_) | AttributeValue::Bs(_)) => {
            Ok(value.clone())
        }
        (Some(AttributeValue::Ss(current)), AttributeValue::Ss(new)) => {
            Ok(AttributeValue::Ss(union(current, new, |v| Some(v.clone()))))
        }
        (Some(AttributeValue::Bs(current)), AttributeValue::Bs(new)) => {
            Ok(AttributeValue::Bs(union(current, new, |v| Some(v.clone()))))
        }
        (Some(AttributeValue::Ns(current)), AttributeValue::Ns(new)) => {
            Ok(AttributeValue::Ns(union(current, new, |v| normalize_number(v))))
        }
        _ => Err(DynamockError::validation(
            "One or more parameter values were invalid: ADD action is only supported on numbers and sets",
        )),
    }
}

fn delete_from_set(item: &mut Item, name: &str, value: &AttributeValue) -> Result<()> {
    let Some(existing) = item.get(name) else {
        return Ok(());
    };

    let remaining = match (existing, value) {
        (AttributeValue::Ss(current), AttributeValue::Ss(remove)) => {
            AttributeValue::Ss(difference(current, remove, |v| Some(v.clone())))
        }
        (AttributeValue::Bs(current), AttributeValue::Bs(remove)) => {
            AttributeValue::Bs(difference(current, remove, |v| Some(v.clone())))
        }
        (AttributeValue::Ns(current), AttributeValue::Ns(remove)) => {
            AttributeValue::Ns(difference(current, remove, |v| normalize_number(v)))
        }
        (_, AttributeValue::Ss(_) | AttributeValue::Ns(_) | AttributeValue::Bs(_)) => {
            return Err(type_mismatch())
        }
        _ => {
            return Err(DynamockError::validation(
                "One or more parameter values were invalid: DELETE action with value is not supported for the type",
            ))
        }
    };

    let is_empty = match &remaining {
        AttributeValue::Ss(v) | AttributeValue::Ns(v) | AttributeValue::Bs(v) => v.is_empty(),
        _ => false,
    };
    if is_empty {
        item.remove(name);
    } else {
        item.insert(name.to_string(), remaining);
    }
    Ok(())
}

fn union<F>(current: &[String], new: &[String], canonical: F) -> Vec<String>
where
    F: Fn(&String) -> Option<String>,
{
    let mut out = current.to_vec();
    let mut seen: Vec<Option<String>> = current.iter().map(&canonical).collect();
    for value in new {
        let key = canonical(value);
        if !seen.contains(&key) {
            seen.push(key);
            out.push(value.clone());
        }
    }
    out
}

fn difference<F>(current: &[String], remove: &[String], canonical: F) -> Vec<String>
where
    F: Fn(&String) -> Option<String>,
{
    let remove: Vec<Option<String>> = remove.iter().map(&canonical).collect();
    current
        .iter()
        .filter(|v| !remove.contains(&canonical(v)))
        .cloned()
        .collect()
}
