//! Record-level operations.

use tracing::{debug, info, warn};

use crate::error::{GatewayResult, ResourceError, ValidationError};
use crate::query::{Projection, translate};
use crate::types::{
    CreateOutcome, CreateSummary, DeleteAllOutcome, DeleteOutcome, DropOutcome, IndexOutcome,
    ListOutcome, Params, Payload, Record,
};

use super::{Gateway, Target};

impl Gateway {
    /// Creates one or many records.
    ///
    /// Without a payload nothing is written and a zero count is returned.
    /// Exactly one inserted document comes back as a [`Record`]; a batch
    /// comes back as a count summary.
    pub async fn create(&self, params: &Params) -> GatewayResult<CreateOutcome> {
        let target = self.target(params)?;
        let Some(payload) = params.payload()? else {
            debug!(collection = %target.physical, "create without fields, nothing written");
            return Ok(CreateOutcome::Summary(CreateSummary::ok(0)));
        };

        let documents = payload.into_documents();
        if documents.is_empty() {
            return Ok(CreateOutcome::Summary(CreateSummary::ok(0)));
        }

        let mut inserted = self.store.insert(&target.physical, documents).await?;
        debug!(collection = %target.physical, count = inserted.len(), "inserted");

        if inserted.len() == 1 {
            if let Some(document) = inserted.pop() {
                return Ok(CreateOutcome::Record(Record::from_document(
                    document,
                    target.entity_type,
                )));
            }
        }
        Ok(CreateOutcome::Summary(CreateSummary::ok(inserted.len() as u64)))
    }

    /// Reads one record by guid. Returns `None` if it does not exist.
    pub async fn read(&self, params: &Params) -> GatewayResult<Option<Record>> {
        let target = self.target(params)?;
        let guid = params.require_guid()?;
        self.read_record(&target, guid, params.projection().as_ref())
            .await
    }

    /// Reads one record by guid, failing with `NotFound` if it does not
    /// exist.
    pub async fn read_required(&self, params: &Params) -> GatewayResult<Record> {
        let target = self.target(params)?;
        let guid = params.require_guid()?;
        self.read_record(&target, guid, params.projection().as_ref())
            .await?
            .ok_or_else(|| {
                ResourceError::NotFound {
                    entity_type: target.entity_type.to_string(),
                    guid: guid.to_string(),
                }
                .into()
            })
    }

    /// Lists records of an entity type, or the tenant's collections when no
    /// entity type is given.
    pub async fn list(&self, params: &Params) -> GatewayResult<ListOutcome> {
        if params.entity_type.as_deref().is_none_or(str::is_empty) {
            let tenant = params.require_tenant()?;
            let collections = self.list_collections(tenant, params.mode()).await?;
            return Ok(ListOutcome::Collections(collections));
        }

        let target = self.target(params)?;
        let filter = translate(&params.query)?;
        let options = params.find_options();
        debug!(
            collection = %target.physical,
            filter = %filter.to_value(),
            skip = ?options.skip,
            limit = ?options.limit,
            "list"
        );

        let documents = self.store.find(&target.physical, &filter, &options).await?;
        debug!(collection = %target.physical, count = documents.len(), "list result");
        Ok(ListOutcome::Records(
            documents
                .into_iter()
                .map(|document| Record::from_document(document, target.entity_type))
                .collect(),
        ))
    }

    /// Merges `fields` into a record and returns the record as read back
    /// afterwards.
    ///
    /// The read-back also runs when the write matched nothing. A failed write
    /// is returned as the error and nothing is read.
    pub async fn update(&self, params: &Params) -> GatewayResult<Option<Record>> {
        let target = self.target(params)?;
        let guid = params.require_guid()?;
        let fields = match params.payload()? {
            None => return Err(ValidationError::FieldsRequired.into()),
            Some(Payload::One(fields)) => fields,
            Some(Payload::Many(_)) => {
                return Err(ValidationError::InvalidFieldsType {
                    found: "array".to_string(),
                }
                .into());
            }
        };

        let id = self.document_id(guid);
        let result = self.store.update(&target.physical, &id, fields).await?;
        if result.matched == 0 {
            warn!(collection = %target.physical, guid = %guid, "update matched no document");
        } else {
            debug!(
                collection = %target.physical,
                guid = %guid,
                modified = result.modified,
                "updated"
            );
        }

        self.read_record(&target, guid, None).await
    }

    /// Deletes one record and returns it as it was before deletion.
    ///
    /// If the snapshot read fails nothing is removed. A failed removal is
    /// reported in [`DeleteOutcome::removal_error`] next to the snapshot.
    pub async fn delete(&self, params: &Params) -> GatewayResult<DeleteOutcome> {
        let target = self.target(params)?;
        let guid = params.require_guid()?;
        let record = self.read_record(&target, guid, None).await?;

        let id = self.document_id(guid);
        let removal_error = match self.store.remove(&target.physical, &id).await {
            Ok(removed) => {
                debug!(collection = %target.physical, guid = %guid, removed, "deleted");
                None
            }
            Err(e) => {
                warn!(
                    collection = %target.physical,
                    guid = %guid,
                    error = %e,
                    "removal failed after snapshot was taken"
                );
                Some(e)
            }
        };

        Ok(DeleteOutcome {
            record,
            removal_error,
        })
    }

    /// Removes every record of an entity type.
    pub async fn delete_all(&self, params: &Params) -> GatewayResult<DeleteAllOutcome> {
        let target = self.target(params)?;
        reject_guid(params, "deleteAll")?;

        let count = self.store.remove_all(&target.physical).await?;
        info!(tenant = %target.tenant, collection = %target.physical, count, "deleted all records");
        Ok(DeleteAllOutcome::ok(count))
    }

    /// Drops the collection of an entity type.
    pub async fn drop_collection(&self, params: &Params) -> GatewayResult<DropOutcome> {
        let target = self.target(params)?;
        reject_guid(params, "dropCollection")?;

        let result = self.store.drop_collection(&target.physical).await?;
        info!(tenant = %target.tenant, collection = %target.physical, "dropped collection");
        Ok(DropOutcome::ok(result))
    }

    /// Creates an index on an entity type's collection.
    pub async fn index(&self, params: &Params) -> GatewayResult<IndexOutcome> {
        let target = self.target(params)?;
        let spec = params
            .index
            .as_ref()
            .filter(|spec| !spec.is_empty())
            .ok_or(ValidationError::IndexRequired)?;

        let name = self.store.create_index(&target.physical, spec).await?;
        info!(collection = %target.physical, index = %name, "created index");
        Ok(IndexOutcome::ok(name))
    }

    pub(super) async fn read_record(
        &self,
        target: &Target<'_>,
        guid: &str,
        projection: Option<&Projection>,
    ) -> GatewayResult<Option<Record>> {
        let id = self.document_id(guid);
        debug!(
            collection = %target.physical,
            mode = %target.mode,
            id = %id,
            native = id.is_native(),
            "read"
        );
        let document = self
            .store
            .find_one(&target.physical, &id, projection)
            .await?;
        Ok(document.map(|document| Record::from_document(document, target.entity_type)))
    }
}

fn reject_guid(params: &Params, operation: &str) -> Result<(), ValidationError> {
    if params.guid().is_some() {
        return Err(ValidationError::GuidNotAllowed {
            operation: operation.to_string(),
        });
    }
    Ok(())
}
