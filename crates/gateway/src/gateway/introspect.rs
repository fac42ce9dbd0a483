//! Collection introspection.

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::error::GatewayResult;
use crate::tenant::{TenancyMode, TenantId};
use crate::types::CollectionDescriptor;

use super::Gateway;

impl Gateway {
    /// Lists the collections visible to a tenant, with size and count.
    ///
    /// Runs the tenant access check first. System collections, empty names
    /// and (in shared mode) collections not carrying the tenant id are
    /// skipped. Statistics are fetched concurrently, bounded by the
    /// configured fan-out limit; the result keeps the store's enumeration
    /// order.
    pub async fn list_collections(
        &self,
        tenant: &TenantId,
        mode: TenancyMode,
    ) -> GatewayResult<Vec<CollectionDescriptor>> {
        let physical_names = self.tenant_collections(tenant, mode).await?;
        debug!(tenant = %tenant, mode = %mode, count = physical_names.len(), "listing collections");

        let results: Vec<GatewayResult<CollectionDescriptor>> = stream::iter(physical_names)
            .map(|physical| async move {
                let stats = self.store.collection_stats(&physical).await?;
                let entity_type = self.namer.recover_entity_type(&physical, tenant, mode);
                Ok(CollectionDescriptor::new(entity_type, stats))
            })
            .buffered(self.fan_out_limit())
            .collect()
            .await;

        results.into_iter().collect()
    }

    /// Returns the physical names of the tenant's collections, after the
    /// tenant access check.
    pub(super) async fn tenant_collections(
        &self,
        tenant: &TenantId,
        mode: TenancyMode,
    ) -> GatewayResult<Vec<String>> {
        let database = self.store.database_name();
        self.namer.check_tenant_access(tenant, mode, database)?;

        let namespace = format!("{}.", database);
        let names = self.store.collection_names().await?;
        Ok(names
            .into_iter()
            .map(|name| match name.strip_prefix(&namespace) {
                Some(stripped) => stripped.to_string(),
                None => name,
            })
            .filter(|name| !name.is_empty())
            .filter(|name| !self.namer.is_system_collection(name))
            .filter(|name| self.namer.belongs_to(name, tenant, mode))
            .collect())
    }
}
