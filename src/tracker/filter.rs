//! Item filtering by a conjunction of conditions.

use std::collections::HashMap;

use crate::tracker::error::{Result, TrackerError};
use crate::tracker::item::Item;
use crate::tracker::parsing::{parse_cond, Cond};

/// A filter built from condition expressions. An item passes when every
/// condition holds for at least one of the values its key expands to.
pub struct ItemFilter {
    conds: Vec<Cond>,
}

impl ItemFilter {
    pub fn from_exprs<S: AsRef<str>>(exprs: &[S]) -> Result<Self> {
        let mut conds = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let cond = parse_cond(expr.as_ref())
                .ok_or_else(|| TrackerError::WrongExpression(expr.as_ref().to_string()))?;
            conds.push(cond);
        }
        Ok(Self { conds })
    }

    pub fn from_cond(cond: Cond) -> Self {
        Self { conds: vec![cond] }
    }

    /// Evaluates the filter against an item. The pseudo-key `_any` expands
    /// to the current values of all of the item's fields.
    pub fn passes_item(&self, item: &mut Item) -> Result<bool> {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for cond in &self.conds {
            if !values.contains_key(&cond.key) {
                values.insert(cond.key.clone(), key_values(item, &cond.key)?);
            }
        }

        Ok(self.matches(
            |key| values.get(key).cloned().unwrap_or_default(),
            None,
        ))
    }

    /// Evaluates the filter against an arbitrary accessor from key to
    /// candidate values. When `error` is supplied, every failed condition
    /// is recorded there rather than stopping at the first mismatch.
    pub fn matches(
        &self,
        accessor: impl Fn(&str) -> Vec<String>,
        error: Option<&mut String>,
    ) -> bool {
        let mut failures = String::new();

        for cond in &self.conds {
            let matched = accessor(&cond.key)
                .iter()
                .any(|value| cond.op.test(value, &cond.value));

            if !matched {
                if !failures.is_empty() {
                    failures.push('\n');
                }
                failures.push_str(&format!("\tnot met for {}: {}", cond.key, cond.text));
            }
        }

        let passed = failures.is_empty();
        if let Some(error) = error {
            *error = failures;
        }
        passed
    }
}

/// Candidate values a condition key stands for on an item: the key's own
/// value, or every current field value for the pseudo-key `_any`.
pub fn key_values(item: &mut Item, key: &str) -> Result<Vec<String>> {
    if key != "_any" {
        return Ok(vec![item.value(key)?]);
    }

    let mut values = Vec::new();
    for name in item.list_record_names()? {
        values.push(item.value(&name)?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with(fields: &[(&str, &str)]) -> Item {
        let mut item = Item::new_fresh("abc".to_string());
        for (i, (key, value)) in fields.iter().enumerate() {
            item.set_value_at(key, value, i as i64).unwrap();
        }
        item
    }

    fn filter(exprs: &[&str]) -> ItemFilter {
        ItemFilter::from_exprs(exprs).unwrap()
    }

    #[test]
    fn malformed_expression_is_reported() {
        assert!(matches!(
            ItemFilter::from_exprs(&["title done"]),
            Err(TrackerError::WrongExpression(_))
        ));
    }

    #[test]
    fn all_conditions_must_hold() {
        let mut item = item_with(&[("status", "done"), ("title", "implement filter")]);

        assert!(filter(&["status==done", "title/ilter"])
            .passes_item(&mut item)
            .unwrap());
        assert!(!filter(&["status==wip", "title/ilter"])
            .passes_item(&mut item)
            .unwrap());
    }

    #[test]
    fn any_matches_any_field_value() {
        let mut item = item_with(&[("status", "done"), ("title", "fix crash")]);

        assert!(filter(&["_any/crash"]).passes_item(&mut item).unwrap());
        assert!(!filter(&["_any/nothing"]).passes_item(&mut item).unwrap());
    }

    #[test]
    fn any_with_no_fields_fails() {
        let mut item = item_with(&[]);
        assert!(!filter(&["_any/x"]).passes_item(&mut item).unwrap());
    }

    #[test]
    fn id_pseudo_field_is_matchable() {
        let mut item = item_with(&[]);
        assert!(filter(&["_id==abc"]).passes_item(&mut item).unwrap());
    }

    #[test]
    fn failures_are_collected_not_short_circuited() {
        let filter = filter(&["status==done", "title==x"]);
        let mut error = String::new();

        let passed = filter.matches(|_| vec!["nope".to_string()], Some(&mut error));
        assert!(!passed);

        let lines: Vec<&str> = error.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("status==done"));
        assert!(lines[1].contains("title==x"));
    }
}
