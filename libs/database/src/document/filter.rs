//! Backend-neutral record filters.
//!
//! A [`Filter`] is a conjunction of field conditions. The in-memory store
//! evaluates it directly against a record's JSON fields; the MongoDB store
//! translates it into a query document. Both follow MongoDB semantics:
//! equality against an array field means "contains", and `null` matches a
//! missing field.

use serde_json::{Map, Value};

use super::{DELETED_ON_FIELD, ID_FIELD};
use crate::common::{DocumentError, DocumentResult};

/// A single condition on one (optionally dotted) field path
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value (or, for array fields, contains it)
    Eq { field: String, value: Value },
    /// Field equals any of the values
    In { field: String, values: Vec<Value> },
    /// Field is present (`true`) or absent (`false`)
    Exists { field: String, exists: bool },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Eq { field, .. }
            | Condition::In { field, .. }
            | Condition::Exists { field, .. } => field,
        }
    }

    fn matches(&self, fields: &Map<String, Value>) -> bool {
        match self {
            Condition::Eq { field, value } => value_matches(lookup(fields, field), value),
            Condition::In { field, values } => {
                let actual = lookup(fields, field);
                values.iter().any(|value| value_matches(actual, value))
            }
            Condition::Exists { field, exists } => lookup(fields, field).is_some() == *exists,
        }
    }
}

/// Conjunction of conditions; the empty filter matches every record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Filter matching every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching the record with the given `id`
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::all().eq(ID_FIELD, id.into())
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_in<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions.push(Condition::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn exists(mut self, field: impl Into<String>, exists: bool) -> Self {
        self.conditions.push(Condition::Exists {
            field: field.into(),
            exists,
        });
        self
    }

    /// Combine with another filter; both must match
    pub fn and(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    /// Restrict to records that have not been soft-deleted
    pub fn not_soft_deleted(self) -> Self {
        self.eq(DELETED_ON_FIELD, Value::Null)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Reject field paths that are empty or look like query operators.
    pub fn validate(&self) -> DocumentResult<()> {
        for condition in &self.conditions {
            let field = condition.field();
            if field.is_empty() || field.split('.').any(str::is_empty) {
                return Err(DocumentError::InvalidFilter(format!(
                    "empty field path '{}'",
                    field
                )));
            }
            if field.starts_with('$') {
                return Err(DocumentError::InvalidFilter(format!(
                    "operator '{}' is not a field",
                    field
                )));
            }
        }
        Ok(())
    }

    /// Evaluate the filter against a record's fields
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|condition| condition.matches(fields))
    }
}

/// Resolve a dotted path inside nested objects
pub(crate) fn lookup<'a>(fields: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn value_matches(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (None | Some(Value::Null), Value::Null) => true,
        (None, _) => false,
        (Some(Value::Array(items)), expected) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        (Some(actual), expected) => values_equal(actual, expected),
    }
}

/// JSON equality where numbers compare by value (1 == 1.0)
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, value)| r.get(key).is_some_and(|other| values_equal(value, other)))
        }
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("record must be an object"),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::all().matches(&record(json!({ "title": "Good board!" }))));
        assert!(Filter::all().is_empty());
    }

    #[test]
    fn test_eq_on_scalar_and_array_fields() {
        let board = record(json!({
            "id": "1",
            "tags": ["featured", "popular"],
            "published": true
        }));

        assert!(Filter::by_id("1").matches(&board));
        assert!(!Filter::by_id("2").matches(&board));
        assert!(Filter::all().eq("tags", "popular").matches(&board));
        assert!(!Filter::all().eq("tags", "trending").matches(&board));
        assert!(Filter::all().eq("published", true).eq("id", "1").matches(&board));
    }

    #[test]
    fn test_null_matches_missing_field() {
        let live = record(json!({ "id": "1" }));
        let deleted = record(json!({ "id": "1", "deletedOn": "2024-01-01T00:00:00Z" }));

        assert!(Filter::all().not_soft_deleted().matches(&live));
        assert!(!Filter::all().not_soft_deleted().matches(&deleted));
    }

    #[test]
    fn test_in_and_exists() {
        let board = record(json!({ "id": "b", "count": 3 }));

        assert!(Filter::all().is_in("id", ["a", "b"]).matches(&board));
        assert!(!Filter::all().is_in("id", Vec::<String>::new()).matches(&board));
        assert!(Filter::all().is_in("count", [3.0]).matches(&board));
        assert!(Filter::all().exists("count", true).matches(&board));
        assert!(Filter::all().exists("deletedOn", false).matches(&board));
    }

    #[test]
    fn test_dotted_paths() {
        let doc = record(json!({ "meta": { "owner": "ana" } }));
        assert!(Filter::all().eq("meta.owner", "ana").matches(&doc));
        assert!(!Filter::all().eq("meta.missing", "ana").matches(&doc));
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        assert!(Filter::by_id("x").validate().is_ok());
        assert!(matches!(
            Filter::all().eq("", 1).validate(),
            Err(DocumentError::InvalidFilter(_))
        ));
        assert!(matches!(
            Filter::all().eq("$where", "1 == 1").validate(),
            Err(DocumentError::InvalidFilter(_))
        ));
        assert!(matches!(
            Filter::all().eq("meta..owner", "x").validate(),
            Err(DocumentError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_and_combines_conditions() {
        let filter = Filter::by_id("1").and(Filter::all().eq("deleted", false));
        assert_eq!(filter.conditions().len(), 2);
    }
}
