//! Bulk export and import of a tenant's collections.

use std::sync::Arc;

use futures::stream::{self, FuturesUnordered, StreamExt};
use tracing::{debug, error, info};

use crate::core::{Archive, CollectionExport, ExportFormat};
use crate::error::{BulkError, GatewayResult, StoreError, ValidationError};
use crate::query::{Filter, FindOptions};
use crate::types::{ImportOutcome, Params};

use super::Gateway;

impl Gateway {
    /// Exports one named entity type, or every collection of the tenant, as
    /// an archive.
    ///
    /// The tenant access check runs in both cases. Collections are read
    /// concurrently, bounded by the fan-out limit, and handed to the codec
    /// in enumeration order.
    pub async fn export(&self, params: &Params) -> GatewayResult<Archive> {
        let tenant = params.require_tenant()?;
        let mode = params.mode();
        let format: ExportFormat = params
            .format
            .as_deref()
            .unwrap_or(&self.config.default_export_format)
            .parse()?;

        let named = params.entity_type.as_deref().filter(|t| !t.is_empty());
        if let Some(entity_type) = named {
            self.namer.check_entity_type(entity_type)?;
        }

        let physical_names = self.tenant_collections(tenant, mode).await?;
        let entity_types: Vec<String> = match named {
            Some(entity_type) => {
                let physical = self.namer.resolve(tenant, entity_type, mode);
                if !physical_names.contains(&physical) {
                    return Err(BulkError::CollectionUnavailable {
                        entity_type: entity_type.to_string(),
                    }
                    .into());
                }
                vec![entity_type.to_string()]
            }
            None => {
                if physical_names.is_empty() {
                    return Err(BulkError::NoCollectionsToExport.into());
                }
                physical_names
                    .iter()
                    .map(|physical| self.namer.recover_entity_type(physical, tenant, mode))
                    .collect()
            }
        };

        info!(tenant = %tenant, collections = entity_types.len(), format = %format, "export started");

        let results: Vec<GatewayResult<CollectionExport>> = stream::iter(entity_types)
            .map(|entity_type| async move {
                let physical = self.namer.resolve(tenant, &entity_type, mode);
                let documents = self
                    .store
                    .find(&physical, &Filter::all(), &FindOptions::default())
                    .await?;
                debug!(collection = %physical, count = documents.len(), "collection read for export");
                Ok(CollectionExport::new(entity_type, documents))
            })
            .buffered(self.fan_out_limit())
            .collect()
            .await;
        let collections = results.into_iter().collect::<GatewayResult<Vec<_>>>()?;

        let archive = self.codec.encode(tenant, &collections, format)?;
        info!(
            tenant = %tenant,
            file = %archive.file_name,
            bytes = archive.bytes.len(),
            "export finished"
        );
        Ok(archive)
    }

    /// Imports uploaded archives, one concurrent batch insert per entity
    /// type.
    ///
    /// The first failing batch decides the result; a duplicate key failure
    /// is reported as [`BulkError::DuplicateData`]. Batches still running
    /// at that point are left to finish on their own and their results are
    /// discarded.
    pub async fn import(&self, params: &Params) -> GatewayResult<ImportOutcome> {
        let tenant = params.require_tenant()?;
        let mode = params.mode();
        self.namer
            .check_tenant_access(tenant, mode, self.store.database_name())?;
        if params.files.is_empty() {
            return Err(ValidationError::FilesRequired.into());
        }

        let collections = self.codec.decode(&params.files).inspect_err(|e| {
            error!(tenant = %tenant, error = %e, "import error");
        })?;
        if collections.is_empty() {
            return Err(BulkError::NoCollectionsToImport.into());
        }
        for collection in &collections {
            self.namer.check_entity_type(&collection.entity_type)?;
        }

        let imported: Vec<String> = collections
            .iter()
            .map(|collection| collection.entity_type.clone())
            .collect();
        info!(tenant = %tenant, collections = imported.len(), "import started");

        let mut batches: FuturesUnordered<_> = collections
            .into_iter()
            .map(|collection| {
                let store = Arc::clone(&self.store);
                let physical = self.namer.resolve(tenant, &collection.entity_type, mode);
                tokio::spawn(async move {
                    if collection.documents.is_empty() {
                        return Ok::<_, StoreError>((physical, 0));
                    }
                    let inserted = store.insert(&physical, collection.documents).await?;
                    Ok((physical, inserted.len()))
                })
            })
            .collect();

        while let Some(joined) = batches.next().await {
            match joined {
                Ok(Ok((physical, count))) => {
                    debug!(collection = %physical, count, "batch imported");
                }
                Ok(Err(e)) if e.is_duplicate_key() => {
                    error!(tenant = %tenant, error = %e, "import hit existing data");
                    return Err(BulkError::DuplicateData.into());
                }
                Ok(Err(e)) => {
                    error!(tenant = %tenant, error = %e, "import batch failed");
                    return Err(e.into());
                }
                Err(join_error) => {
                    error!(tenant = %tenant, error = %join_error, "import batch aborted");
                    return Err(BulkError::BranchPanicked {
                        message: join_error.to_string(),
                    }
                    .into());
                }
            }
        }

        info!(tenant = %tenant, imported = ?imported, "import finished");
        Ok(ImportOutcome { ok: true, imported })
    }
}
