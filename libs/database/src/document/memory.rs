use async_trait::async_trait;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    Document, DocumentRepository, Fields, Filter, FindResult, Page, PlannedUpdate, ReadOptions,
    Update, UpdateOutcome, collect_distinct, from_fields, id_of, plan_replace, plan_update,
    prepare_insert, soft_delete_fields,
};
use crate::common::{DocumentError, DocumentResult};

/// In-memory document store for tests and local development
///
/// Records are kept in insertion order. Clones share the same storage.
pub struct InMemoryDocumentRepository<T> {
    records: Arc<RwLock<Vec<Fields>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> InMemoryDocumentRepository<T> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            _marker: PhantomData,
        }
    }

    /// Number of stored records, soft-deleted ones included
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl<T> Clone for InMemoryDocumentRepository<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for InMemoryDocumentRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[async_trait]
impl<T: Document> DocumentRepository<T> for InMemoryDocumentRepository<T> {
    async fn find(
        &self,
        filter: Filter,
        page: Option<Page>,
        options: ReadOptions,
    ) -> DocumentResult<FindResult<T>> {
        filter.validate()?;
        if let Some(page) = &page {
            page.validate()?;
        }
        let filter = options.scope(filter);

        let records = self.records.read().await;
        let matched: Vec<&Fields> = records.iter().filter(|r| filter.matches(r)).collect();
        let count = matched.len() as u64;

        let (selected, pages_count): (Vec<&Fields>, u64) = match page {
            Some(page) => (
                matched
                    .into_iter()
                    .skip(to_usize(page.skip()))
                    .take(to_usize(page.per_page))
                    .collect(),
                page.pages_count(count),
            ),
            None => (matched, 1),
        };

        let results = selected
            .into_iter()
            .map(|fields| from_fields(fields.clone()))
            .collect::<DocumentResult<Vec<T>>>()?;

        Ok(FindResult {
            results,
            pages_count,
            count,
        })
    }

    async fn find_one(&self, filter: Filter, options: ReadOptions) -> DocumentResult<Option<T>> {
        filter.validate()?;
        let filter = options.scope(filter);

        let records = self.records.read().await;
        records
            .iter()
            .find(|r| filter.matches(r))
            .map(|fields| from_fields(fields.clone()))
            .transpose()
    }

    async fn insert_one(&self, doc: T) -> DocumentResult<T> {
        let fields = prepare_insert(doc)?;
        let id = id_of(&fields)?;

        let mut records = self.records.write().await;
        if records.iter().any(|r| id_of(r).is_ok_and(|existing| existing == id)) {
            return Err(DocumentError::DuplicateId(id));
        }
        records.push(fields.clone());

        from_fields(fields)
    }

    async fn insert_many(&self, docs: Vec<T>) -> DocumentResult<Vec<T>> {
        let mut inserted = Vec::with_capacity(docs.len());
        for doc in docs {
            inserted.push(self.insert_one(doc).await?);
        }
        Ok(inserted)
    }

    async fn update_one(
        &self,
        filter: Filter,
        update: Update<T>,
    ) -> DocumentResult<UpdateOutcome<T>> {
        filter.validate()?;
        let filter = filter.not_soft_deleted();

        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|r| filter.matches(r)) else {
            return Ok(UpdateOutcome::NotMatched);
        };

        match plan_update(record.clone(), &update)? {
            PlannedUpdate::Unchanged(doc) => Ok(UpdateOutcome::Unchanged(doc)),
            PlannedUpdate::Changed { fields, .. } => {
                *record = fields.clone();
                Ok(UpdateOutcome::Updated(from_fields(fields)?))
            }
        }
    }

    async fn update_many(&self, filter: Filter, update: Update<T>) -> DocumentResult<Vec<T>> {
        filter.validate()?;
        let filter = filter.not_soft_deleted();

        let mut records = self.records.write().await;
        let mut updated = Vec::new();
        for record in records.iter_mut().filter(|r| filter.matches(r)) {
            match plan_update(record.clone(), &update)? {
                PlannedUpdate::Unchanged(doc) => updated.push(doc),
                PlannedUpdate::Changed { fields, .. } => {
                    *record = fields.clone();
                    updated.push(from_fields(fields)?);
                }
            }
        }
        Ok(updated)
    }

    async fn replace_one(&self, filter: Filter, doc: T) -> DocumentResult<Option<T>> {
        filter.validate()?;
        let filter = filter.not_soft_deleted();

        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|r| filter.matches(r)) else {
            return Ok(None);
        };

        let fields = plan_replace(record, &doc)?;
        *record = fields.clone();
        from_fields(fields).map(Some)
    }

    async fn delete_soft(&self, filter: Filter) -> DocumentResult<u64> {
        filter.validate()?;
        let filter = filter.not_soft_deleted();
        let stamp = soft_delete_fields()?;

        let mut records = self.records.write().await;
        let mut deleted = 0;
        for record in records.iter_mut().filter(|r| filter.matches(r)) {
            record.extend(stamp.clone());
            deleted += 1;
        }
        Ok(deleted)
    }

    async fn delete_one(&self, filter: Filter) -> DocumentResult<u64> {
        filter.validate()?;

        let mut records = self.records.write().await;
        match records.iter().position(|r| filter.matches(r)) {
            Some(index) => {
                records.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, filter: Filter) -> DocumentResult<u64> {
        filter.validate()?;

        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !filter.matches(r));
        Ok((before - records.len()) as u64)
    }

    async fn count(&self, filter: Filter) -> DocumentResult<u64> {
        filter.validate()?;
        let filter = filter.not_soft_deleted();

        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn distinct(&self, field: &str, filter: Filter) -> DocumentResult<Vec<Value>> {
        Filter::all().exists(field, true).validate()?;
        filter.validate()?;
        let filter = filter.not_soft_deleted();

        let records = self.records.read().await;
        let mut values = Vec::new();
        for record in records.iter().filter(|r| filter.matches(r)) {
            collect_distinct(record, field, &mut values);
        }
        Ok(values)
    }

    async fn drop_collection(&self) -> DocumentResult<()> {
        self.records.write().await.clear();
        Ok(())
    }
}
