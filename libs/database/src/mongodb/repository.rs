use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, Bson, Document as BsonDocument, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use serde_json::Value;
use std::marker::PhantomData;
use tracing::{debug, instrument};

use crate::common::{DocumentError, DocumentResult};
use crate::document::{
    Condition, Document, DocumentRepository, Fields, Filter, FindResult, Page, PlannedUpdate,
    ReadOptions, Update, UpdateOutcome, from_fields, id_of, plan_replace, plan_update,
    prepare_insert, soft_delete_fields,
};

const DUPLICATE_KEY: i32 = 11000;

impl From<mongodb::error::Error> for DocumentError {
    fn from(error: mongodb::error::Error) -> Self {
        DocumentError::Backend(error.to_string())
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// Records to skip for `page`; the server rejects skips above `i64::MAX`
fn skip_for(page: &Page) -> u64 {
    page.skip().min(i64::MAX as u64)
}

/// Query matching the record `id` only while it still satisfies `scope`
fn guarded_query(scope: &Filter, id: String) -> DocumentResult<BsonDocument> {
    filter_document(&scope.clone().and(Filter::by_id(id)))
}

fn to_bson(value: &impl serde::Serialize) -> DocumentResult<Bson> {
    bson::to_bson(value).map_err(|e| DocumentError::Serialization(e.to_string()))
}

fn encode(fields: &Fields) -> DocumentResult<BsonDocument> {
    bson::to_document(fields).map_err(|e| DocumentError::Serialization(e.to_string()))
}

/// Field map of a stored document, without the driver's `_id`
fn decode(mut stored: BsonDocument) -> DocumentResult<Fields> {
    stored.remove("_id");
    match Bson::Document(stored).into_relaxed_extjson() {
        Value::Object(fields) => Ok(fields),
        other => Err(DocumentError::Serialization(format!(
            "expected a document, got {}",
            other
        ))),
    }
}

/// Translate a [`Filter`] into a MongoDB query document
pub fn filter_document(filter: &Filter) -> DocumentResult<BsonDocument> {
    filter.validate()?;

    let mut clauses = Vec::with_capacity(filter.conditions().len());
    for condition in filter.conditions() {
        let test = match condition {
            Condition::Eq { value, .. } => to_bson(value)?,
            Condition::In { values, .. } => {
                let values = to_bson(values)?;
                Bson::Document(doc! { "$in": values })
            }
            Condition::Exists { exists, .. } => Bson::Document(doc! { "$exists": *exists }),
        };
        let mut clause = BsonDocument::new();
        clause.insert(condition.field(), test);
        clauses.push(clause);
    }

    Ok(match clauses.len() {
        0 => BsonDocument::new(),
        1 => clauses.remove(0),
        _ => doc! { "$and": clauses },
    })
}

/// [`DocumentRepository`] backed by one MongoDB collection
///
/// Records are stored as plain documents keyed by the application-level
/// `id`; MongoDB's own `_id` only provides insertion order and is never
/// exposed.
pub struct MongoDocumentRepository<T> {
    collection: Collection<BsonDocument>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for MongoDocumentRepository<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> MongoDocumentRepository<T> {
    pub fn new(db: &Database, collection: &str) -> Self {
        Self::from_collection(db.collection(collection))
    }

    pub fn from_collection(collection: Collection<BsonDocument>) -> Self {
        Self {
            collection,
            _marker: PhantomData,
        }
    }

    pub fn collection(&self) -> &Collection<BsonDocument> {
        &self.collection
    }

    /// Create the unique index on `id`
    pub async fn ensure_indexes(&self) -> DocumentResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        debug!(collection = %self.collection.name(), "Ensured unique id index");
        Ok(())
    }

    async fn find_first(&self, filter: &Filter) -> DocumentResult<Option<Fields>> {
        self.collection
            .find_one(filter_document(filter)?)
            .sort(doc! { "_id": 1 })
            .await?
            .map(decode)
            .transpose()
    }

    /// Persist a planned update by record id
    ///
    /// `scope` is re-checked by the write itself, so a record that was
    /// soft-deleted or removed since it was read yields `NotMatched`.
    async fn write_update(
        &self,
        scope: &Filter,
        planned: PlannedUpdate<T>,
    ) -> DocumentResult<UpdateOutcome<T>>
    where
        T: Document,
    {
        match planned {
            PlannedUpdate::Unchanged(doc) => Ok(UpdateOutcome::Unchanged(doc)),
            PlannedUpdate::Changed { fields, set } => {
                let query = guarded_query(scope, id_of(&fields)?)?;
                let set = encode(&set)?;
                let result = self.collection.update_one(query, doc! { "$set": set }).await?;
                if result.matched_count == 0 {
                    debug!("Record left the update scope before the write");
                    return Ok(UpdateOutcome::NotMatched);
                }
                Ok(UpdateOutcome::Updated(from_fields(fields)?))
            }
        }
    }
}

#[async_trait]
impl<T: Document> DocumentRepository<T> for MongoDocumentRepository<T> {
    #[instrument(skip(self))]
    async fn find(
        &self,
        filter: Filter,
        page: Option<Page>,
        options: ReadOptions,
    ) -> DocumentResult<FindResult<T>> {
        if let Some(page) = &page {
            page.validate()?;
        }
        let query = filter_document(&options.scope(filter))?;

        let count = self.collection.count_documents(query.clone()).await?;

        let mut find = self.collection.find(query).sort(doc! { "_id": 1 });
        let pages_count = match page {
            Some(page) => {
                find = find
                    .skip(skip_for(&page))
                    .limit(i64::try_from(page.per_page).unwrap_or(i64::MAX));
                page.pages_count(count)
            }
            None => 1,
        };

        let stored: Vec<BsonDocument> = find.await?.try_collect().await?;
        let results = stored
            .into_iter()
            .map(|doc| decode(doc).and_then(from_fields))
            .collect::<DocumentResult<Vec<T>>>()?;

        Ok(FindResult {
            results,
            pages_count,
            count,
        })
    }

    #[instrument(skip(self))]
    async fn find_one(&self, filter: Filter, options: ReadOptions) -> DocumentResult<Option<T>> {
        self.find_first(&options.scope(filter))
            .await?
            .map(from_fields)
            .transpose()
    }

    #[instrument(skip_all)]
    async fn insert_one(&self, doc: T) -> DocumentResult<T> {
        let fields = prepare_insert(doc)?;
        let id = id_of(&fields)?;

        let taken = self
            .collection
            .count_documents(filter_document(&Filter::by_id(id.as_str()))?)
            .await?;
        if taken > 0 {
            return Err(DocumentError::DuplicateId(id));
        }

        match self.collection.insert_one(encode(&fields)?).await {
            Ok(_) => {
                debug!(%id, "Inserted document");
                from_fields(fields)
            }
            Err(e) if is_duplicate_key(&e) => Err(DocumentError::DuplicateId(id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_many(&self, docs: Vec<T>) -> DocumentResult<Vec<T>> {
        let mut inserted = Vec::with_capacity(docs.len());
        for doc in docs {
            inserted.push(self.insert_one(doc).await?);
        }
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn update_one(
        &self,
        filter: Filter,
        update: Update<T>,
    ) -> DocumentResult<UpdateOutcome<T>> {
        let scope = filter.not_soft_deleted();
        let Some(existing) = self.find_first(&scope).await? else {
            return Ok(UpdateOutcome::NotMatched);
        };
        self.write_update(&scope, plan_update(existing, &update)?).await
    }

    #[instrument(skip(self))]
    async fn update_many(&self, filter: Filter, update: Update<T>) -> DocumentResult<Vec<T>> {
        let scope = filter.not_soft_deleted();
        let matched: Vec<BsonDocument> = self
            .collection
            .find(filter_document(&scope)?)
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;

        let mut updated = Vec::with_capacity(matched.len());
        for stored in matched {
            let outcome = self
                .write_update(&scope, plan_update(decode(stored)?, &update)?)
                .await?;
            updated.extend(outcome.into_document());
        }
        Ok(updated)
    }

    #[instrument(skip(self, doc))]
    async fn replace_one(&self, filter: Filter, doc: T) -> DocumentResult<Option<T>> {
        let scope = filter.not_soft_deleted();
        let Some(existing) = self.find_first(&scope).await? else {
            return Ok(None);
        };

        let fields = plan_replace(&existing, &doc)?;
        let query = guarded_query(&scope, id_of(&existing)?)?;
        let result = self.collection.replace_one(query, encode(&fields)?).await?;
        if result.matched_count == 0 {
            return Ok(None);
        }
        from_fields(fields).map(Some)
    }

    #[instrument(skip(self))]
    async fn delete_soft(&self, filter: Filter) -> DocumentResult<u64> {
        let query = filter_document(&filter.not_soft_deleted())?;
        let stamp = encode(&soft_delete_fields()?)?;
        let result = self
            .collection
            .update_many(query, doc! { "$set": stamp })
            .await?;
        Ok(result.modified_count)
    }

    #[instrument(skip(self))]
    async fn delete_one(&self, filter: Filter) -> DocumentResult<u64> {
        let result = self.collection.delete_one(filter_document(&filter)?).await?;
        Ok(result.deleted_count)
    }

    #[instrument(skip(self))]
    async fn delete_many(&self, filter: Filter) -> DocumentResult<u64> {
        let result = self.collection.delete_many(filter_document(&filter)?).await?;
        Ok(result.deleted_count)
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: Filter) -> DocumentResult<u64> {
        let query = filter_document(&filter.not_soft_deleted())?;
        Ok(self.collection.count_documents(query).await?)
    }

    #[instrument(skip(self))]
    async fn distinct(&self, field: &str, filter: Filter) -> DocumentResult<Vec<Value>> {
        Filter::all().exists(field, true).validate()?;
        let query = filter_document(&filter.not_soft_deleted())?;
        let values = self.collection.distinct(field, query).await?;
        Ok(values.into_iter().map(Bson::into_relaxed_extjson).collect())
    }

    #[instrument(skip(self))]
    async fn drop_collection(&self) -> DocumentResult<()> {
        self.collection.drop().await?;
        self.ensure_indexes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_is_clamped_for_the_server() {
        assert_eq!(skip_for(&Page::new(3, 2)), 4);
        assert_eq!(skip_for(&Page::new(u64::MAX, 2)), i64::MAX as u64);
    }

    #[test]
    fn test_guarded_query_keeps_scope() {
        let scope = Filter::all().eq("published", true).not_soft_deleted();
        let query = guarded_query(&scope, "abc".to_string()).unwrap();
        let clauses = query.get_array("$and").unwrap();
        assert_eq!(clauses.len(), 3);
        assert!(clauses.contains(&Bson::Document(doc! { "id": "abc" })));
        assert!(clauses.contains(&Bson::Document(doc! { "published": true })));
    }

    #[test]
    fn test_filter_document_empty() {
        assert_eq!(filter_document(&Filter::all()).unwrap(), doc! {});
    }

    #[test]
    fn test_filter_document_single_condition() {
        assert_eq!(
            filter_document(&Filter::by_id("abc")).unwrap(),
            doc! { "id": "abc" }
        );
    }

    #[test]
    fn test_filter_document_combines_with_and() {
        let filter = Filter::all()
            .is_in("tags", ["featured", "popular"])
            .exists("content", false)
            .not_soft_deleted();

        assert_eq!(
            filter_document(&filter).unwrap(),
            doc! {
                "$and": [
                    { "tags": { "$in": ["featured", "popular"] } },
                    { "content": { "$exists": false } },
                    { "deletedOn": Bson::Null },
                ]
            }
        );
    }

    #[test]
    fn test_filter_document_rejects_operators() {
        let result = filter_document(&Filter::all().eq("$where", "true"));
        assert!(matches!(result, Err(DocumentError::InvalidFilter(_))));
    }

    #[test]
    fn test_decode_strips_object_id() {
        let stored = doc! {
            "_id": bson::oid::ObjectId::new(),
            "id": "1",
            "title": "Good board!",
            "tags": ["featured"],
            "count": 3,
        };

        let fields = decode(stored).unwrap();
        assert!(!fields.contains_key("_id"));
        assert_eq!(fields["title"], serde_json::json!("Good board!"));
        assert_eq!(fields["tags"], serde_json::json!(["featured"]));
        assert_eq!(fields["count"], serde_json::json!(3));
    }
}
