//! Generic document repository.
//!
//! [`DocumentRepository`] is the storage facade used by domain crates: find
//! with optional paging, find-one, insert, partial update, replace, soft
//! delete, hard delete, exists, count and distinct. Soft-delete filtering and
//! pagination live here so domains never re-implement them.
//!
//! Records are plain serde types implementing [`Document`]. Both backends
//! work on the record's JSON field map, which keeps filter evaluation,
//! change detection and system fields (`createdOn`, `updatedOn`,
//! `deletedOn`) identical between MongoDB and the in-memory store.
//!
//! ```rust,ignore
//! use database::document::{DocumentRepository, Filter, InMemoryDocumentRepository, Page, ReadOptions};
//!
//! let books = InMemoryDocumentRepository::<Book>::new();
//! books.insert_many(vec![book_a, book_b]).await?;
//!
//! let page = books
//!     .find(Filter::all(), Some(Page::new(1, 2)), ReadOptions::default())
//!     .await?;
//! assert_eq!(page.pages_count, 1);
//! ```

pub mod filter;
pub mod memory;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::common::{DocumentError, DocumentResult};

pub use filter::{Condition, Filter};
pub use memory::InMemoryDocumentRepository;

/// Field holding the application-level record id
pub const ID_FIELD: &str = "id";
/// Caller-visible soft-delete flag
pub const DELETED_FIELD: &str = "deleted";
/// Soft-delete timestamp; a record is soft-deleted exactly when it is present
pub const DELETED_ON_FIELD: &str = "deletedOn";
/// Insert timestamp
pub const CREATED_ON_FIELD: &str = "createdOn";
/// Timestamp of the last effective update or replace
pub const UPDATED_ON_FIELD: &str = "updatedOn";

/// Fields managed by the repository that updates may not touch
///
/// `deleted` is only ever raised by a soft delete, so it never diverges from
/// `deletedOn`.
const SYSTEM_FIELDS: [&str; 5] = [
    ID_FIELD,
    CREATED_ON_FIELD,
    UPDATED_ON_FIELD,
    DELETED_FIELD,
    DELETED_ON_FIELD,
];

/// A record's JSON field map
pub type Fields = Map<String, Value>;

/// A record storable in a [`DocumentRepository`]
///
/// The record must serialize to a JSON object whose id lives under
/// [`ID_FIELD`].
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    /// The record id, if one has been assigned
    fn id(&self) -> Option<&str>;

    /// Assign the record id
    fn set_id(&mut self, id: String);
}

/// 1-indexed page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub per_page: u64,
}

impl Page {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    pub fn validate(&self) -> DocumentResult<()> {
        if self.page == 0 {
            return Err(DocumentError::InvalidPage("page must be at least 1".into()));
        }
        if self.per_page == 0 {
            return Err(DocumentError::InvalidPage("perPage must be at least 1".into()));
        }
        Ok(())
    }

    /// Number of matching records before this page
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// `ceil(count / per_page)`
    pub fn pages_count(&self, count: u64) -> u64 {
        count.div_ceil(self.per_page)
    }
}

/// Read options shared by `find` and `find_one`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Hide soft-deleted records (default `true`)
    pub skip_deleted_on_docs: bool,
}

impl ReadOptions {
    /// Options that also return soft-deleted records
    pub fn include_deleted() -> Self {
        Self {
            skip_deleted_on_docs: false,
        }
    }

    pub(crate) fn scope(&self, filter: Filter) -> Filter {
        if self.skip_deleted_on_docs {
            filter.not_soft_deleted()
        } else {
            filter
        }
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            skip_deleted_on_docs: true,
        }
    }
}

/// Result of [`DocumentRepository::find`]
#[derive(Debug, Clone, PartialEq)]
pub struct FindResult<T> {
    /// Records on the requested page (all matches when unpaged)
    pub results: Vec<T>,
    /// Number of pages; 1 when unpaged
    pub pages_count: u64,
    /// Total number of matching records
    pub count: u64,
}

/// A partial update: either literal fields to set, or a transform that
/// derives them from the existing record.
pub enum Update<T> {
    Set(Fields),
    Apply(Box<dyn Fn(&T) -> Fields + Send + Sync>),
}

impl<T> Update<T> {
    pub fn set(fields: Fields) -> Self {
        Update::Set(fields)
    }

    /// Set fields from any serializable value (e.g. a `json!` object)
    pub fn set_value(value: impl Serialize) -> DocumentResult<Self> {
        Ok(Update::Set(to_fields(&value)?))
    }

    pub fn apply<F>(transform: F) -> Self
    where
        F: Fn(&T) -> Fields + Send + Sync + 'static,
    {
        Update::Apply(Box::new(transform))
    }

    /// The fields this update writes onto `existing`, minus system fields
    fn patch_for(&self, existing: &T) -> Fields {
        let mut patch = match self {
            Update::Set(fields) => fields.clone(),
            Update::Apply(transform) => transform(existing),
        };
        for field in SYSTEM_FIELDS {
            patch.remove(field);
        }
        patch
    }
}

impl<T> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Set(fields) => f.debug_tuple("Set").field(fields).finish(),
            Update::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

/// Result of [`DocumentRepository::update_one`]
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome<T> {
    /// The record changed; carries the post-update record
    Updated(T),
    /// The record matched but every written field already had that value
    Unchanged(T),
    /// No live record matched the filter
    NotMatched,
}

impl<T> UpdateOutcome<T> {
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated(_))
    }

    pub fn document(&self) -> Option<&T> {
        match self {
            UpdateOutcome::Updated(doc) | UpdateOutcome::Unchanged(doc) => Some(doc),
            UpdateOutcome::NotMatched => None,
        }
    }

    pub fn into_document(self) -> Option<T> {
        match self {
            UpdateOutcome::Updated(doc) | UpdateOutcome::Unchanged(doc) => Some(doc),
            UpdateOutcome::NotMatched => None,
        }
    }
}

/// Storage facade over one collection of `T` records
///
/// Updates, replaces, soft deletes, `exists`, `count` and `distinct` only see
/// records that are not soft-deleted. `delete_one`/`delete_many` remove
/// records physically whatever their state.
#[async_trait]
pub trait DocumentRepository<T: Document>: Send + Sync {
    /// All matches, or one page of them in stable insertion order
    async fn find(
        &self,
        filter: Filter,
        page: Option<Page>,
        options: ReadOptions,
    ) -> DocumentResult<FindResult<T>>;

    /// First match, if any
    async fn find_one(&self, filter: Filter, options: ReadOptions) -> DocumentResult<Option<T>>;

    /// Store a record, assigning an id when missing; returns the stored record
    async fn insert_one(&self, doc: T) -> DocumentResult<T>;

    /// Insert each record in turn; earlier inserts stay if a later one fails
    async fn insert_many(&self, docs: Vec<T>) -> DocumentResult<Vec<T>>;

    /// Apply a partial update to the first match
    async fn update_one(
        &self,
        filter: Filter,
        update: Update<T>,
    ) -> DocumentResult<UpdateOutcome<T>>;

    /// Apply a partial update to every match; returns the post-update records
    async fn update_many(&self, filter: Filter, update: Update<T>) -> DocumentResult<Vec<T>>;

    /// Replace every field of the first match except its id
    async fn replace_one(&self, filter: Filter, doc: T) -> DocumentResult<Option<T>>;

    /// Flag matches as deleted and stamp `deletedOn`; returns how many were newly deleted
    async fn delete_soft(&self, filter: Filter) -> DocumentResult<u64>;

    /// Physically remove the first match
    async fn delete_one(&self, filter: Filter) -> DocumentResult<u64>;

    /// Physically remove every match
    async fn delete_many(&self, filter: Filter) -> DocumentResult<u64>;

    async fn exists(&self, filter: Filter) -> DocumentResult<bool> {
        Ok(self.count(filter).await? > 0)
    }

    async fn count(&self, filter: Filter) -> DocumentResult<u64>;

    /// Distinct values of `field` among matches, array fields flattened
    async fn distinct(&self, field: &str, filter: Filter) -> DocumentResult<Vec<Value>>;

    /// Remove every record, soft-deleted or not
    async fn drop_collection(&self) -> DocumentResult<()>;
}

/// Serialize a record into its field map
pub fn to_fields<T: Serialize>(doc: &T) -> DocumentResult<Fields> {
    match serde_json::to_value(doc)? {
        Value::Object(fields) => Ok(fields),
        other => Err(DocumentError::Serialization(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Deserialize a record from its field map
pub fn from_fields<T: DeserializeOwned>(fields: Fields) -> DocumentResult<T> {
    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Current time in the same representation chrono's serde uses
pub(crate) fn timestamp() -> DocumentResult<Value> {
    Ok(serde_json::to_value(Utc::now())?)
}

/// Assign an id when missing and stamp `createdOn`
pub(crate) fn prepare_insert<T: Document>(mut doc: T) -> DocumentResult<Fields> {
    if doc.id().is_none_or(str::is_empty) {
        doc.set_id(Uuid::now_v7().to_string());
    }

    let mut fields = to_fields(&doc)?;
    if fields.get(CREATED_ON_FIELD).is_none_or(Value::is_null) {
        fields.insert(CREATED_ON_FIELD.to_string(), timestamp()?);
    }
    clear_soft_delete(&mut fields);
    Ok(fields)
}

/// New and replaced records start out live
fn clear_soft_delete(fields: &mut Fields) {
    fields.remove(DELETED_ON_FIELD);
    if let Some(deleted) = fields.get_mut(DELETED_FIELD) {
        *deleted = Value::Bool(false);
    }
}

/// Id of a stored record's field map
pub(crate) fn id_of(fields: &Fields) -> DocumentResult<String> {
    fields
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DocumentError::Serialization("stored record has no string id".into()))
}

/// What an update does to one stored record
pub(crate) enum PlannedUpdate<T> {
    Unchanged(T),
    Changed {
        /// Full post-update field map
        fields: Fields,
        /// Only the fields to write
        set: Fields,
    },
}

pub(crate) fn plan_update<T: Document>(
    existing: Fields,
    update: &Update<T>,
) -> DocumentResult<PlannedUpdate<T>> {
    let current: T = from_fields(existing.clone())?;
    let mut set = update.patch_for(&current);

    let unchanged = set.iter().all(|(key, value)| {
        existing
            .get(key)
            .map_or(value.is_null(), |stored| filter::values_equal(stored, value))
    });
    if unchanged {
        return Ok(PlannedUpdate::Unchanged(current));
    }

    set.insert(UPDATED_ON_FIELD.to_string(), timestamp()?);
    let mut fields = existing;
    for (key, value) in &set {
        fields.insert(key.clone(), value.clone());
    }
    Ok(PlannedUpdate::Changed { fields, set })
}

/// Field map that replaces `existing` with `doc`, keeping id and `createdOn`
pub(crate) fn plan_replace<T: Document>(existing: &Fields, doc: &T) -> DocumentResult<Fields> {
    let mut fields = to_fields(doc)?;
    fields.insert(ID_FIELD.to_string(), Value::String(id_of(existing)?));
    clear_soft_delete(&mut fields);
    match existing.get(CREATED_ON_FIELD) {
        Some(created) => fields.insert(CREATED_ON_FIELD.to_string(), created.clone()),
        None => fields.remove(CREATED_ON_FIELD),
    };
    fields.insert(UPDATED_ON_FIELD.to_string(), timestamp()?);
    Ok(fields)
}

/// Fields written by a soft delete
pub(crate) fn soft_delete_fields() -> DocumentResult<Fields> {
    let mut fields = Fields::new();
    fields.insert(DELETED_FIELD.to_string(), Value::Bool(true));
    fields.insert(DELETED_ON_FIELD.to_string(), timestamp()?);
    Ok(fields)
}

/// Push the values of `field` into `out`, flattening arrays and skipping duplicates
pub(crate) fn collect_distinct(fields: &Fields, field: &str, out: &mut Vec<Value>) {
    let Some(value) = filter::lookup(fields, field) else {
        return;
    };
    let values = match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    };
    for value in values {
        if !out.iter().any(|seen| filter::values_equal(seen, &value)) {
            out.push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Note {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        title: String,
        #[serde(rename = "createdOn", default, skip_serializing_if = "Option::is_none")]
        created_on: Option<String>,
    }

    impl Document for Note {
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn set_id(&mut self, id: String) {
            self.id = Some(id);
        }
    }

    fn note(title: &str) -> Note {
        Note {
            id: None,
            title: title.to_string(),
            created_on: None,
        }
    }

    #[test]
    fn test_page_math() {
        let page = Page::new(3, 4);
        assert_eq!(page.skip(), 8);
        assert_eq!(page.pages_count(10), 3);
        assert_eq!(page.pages_count(0), 0);
        assert_eq!(Page::new(1, 2).pages_count(10), 5);
    }

    #[test]
    fn test_page_validation() {
        assert!(Page::new(1, 1).validate().is_ok());
        assert!(matches!(Page::new(0, 10).validate(), Err(DocumentError::InvalidPage(_))));
        assert!(matches!(Page::new(1, 0).validate(), Err(DocumentError::InvalidPage(_))));
    }

    #[test]
    fn test_prepare_insert_assigns_id_and_created_on() {
        let fields = prepare_insert(note("Good book!")).unwrap();
        assert!(!id_of(&fields).unwrap().is_empty());
        assert!(fields.contains_key(CREATED_ON_FIELD));

        let mut keep = note("Kept");
        keep.id = Some("fixed".into());
        assert_eq!(id_of(&prepare_insert(keep).unwrap()).unwrap(), "fixed");
    }

    #[test]
    fn test_plan_update_detects_no_op() {
        let existing = to_fields(&json!({ "id": "1", "title": "Same" })).unwrap();
        let update = Update::<Note>::set_value(json!({ "title": "Same", "id": "other" })).unwrap();

        assert!(matches!(
            plan_update(existing, &update).unwrap(),
            PlannedUpdate::Unchanged(note) if note.id.as_deref() == Some("1")
        ));
    }

    #[test]
    fn test_plan_update_ignores_deleted_flag() {
        let existing = to_fields(&json!({ "id": "1", "title": "Same", "deleted": false })).unwrap();
        let update =
            Update::<Note>::set_value(json!({ "title": "Same", "deleted": true })).unwrap();

        assert!(matches!(
            plan_update(existing, &update).unwrap(),
            PlannedUpdate::Unchanged(_)
        ));
    }

    #[test]
    fn test_new_records_start_live() {
        let mut fields = to_fields(&json!({
            "id": "1",
            "deleted": true,
            "deletedOn": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        clear_soft_delete(&mut fields);
        assert_eq!(fields[DELETED_FIELD], json!(false));
        assert!(!fields.contains_key(DELETED_ON_FIELD));

        let mut untouched = to_fields(&json!({ "id": "2" })).unwrap();
        clear_soft_delete(&mut untouched);
        assert!(!untouched.contains_key(DELETED_FIELD));
    }

    #[test]
    fn test_plan_update_stamps_updated_on() {
        let existing = to_fields(&json!({ "id": "1", "title": "Old" })).unwrap();
        let update = Update::<Note>::apply(|note| {
            to_fields(&json!({ "title": format!("{} Updated", note.title) })).unwrap()
        });

        match plan_update(existing, &update).unwrap() {
            PlannedUpdate::Changed { fields, set } => {
                assert_eq!(fields["title"], json!("Old Updated"));
                assert_eq!(fields["id"], json!("1"));
                assert!(set.contains_key(UPDATED_ON_FIELD));
                assert!(!set.contains_key(ID_FIELD));
            }
            PlannedUpdate::Unchanged(_) => panic!("title changed"),
        }
    }

    #[test]
    fn test_plan_replace_keeps_identity() {
        let existing =
            to_fields(&json!({ "id": "1", "title": "Old", "createdOn": "2024-01-01T00:00:00Z" }))
                .unwrap();
        let mut replacement = note("New");
        replacement.id = Some("hijack".into());

        let fields = plan_replace(&existing, &replacement).unwrap();
        assert_eq!(fields["id"], json!("1"));
        assert_eq!(fields["title"], json!("New"));
        assert_eq!(fields[CREATED_ON_FIELD], json!("2024-01-01T00:00:00Z"));
        assert!(fields.contains_key(UPDATED_ON_FIELD));
    }

    #[test]
    fn test_collect_distinct_flattens_arrays() {
        let mut out = Vec::new();
        collect_distinct(&to_fields(&json!({ "tags": ["a", "b"] })).unwrap(), "tags", &mut out);
        collect_distinct(&to_fields(&json!({ "tags": ["b", "c"] })).unwrap(), "tags", &mut out);
        collect_distinct(&to_fields(&json!({ "title": "x" })).unwrap(), "tags", &mut out);
        assert_eq!(out, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn test_to_fields_rejects_non_objects() {
        assert!(matches!(to_fields(&json!([1, 2])), Err(DocumentError::Serialization(_))));
    }
}
