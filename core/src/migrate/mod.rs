//! Drives a migration run: layers first, producing the [IdentifierMap], then applications
//! consuming it. The schema specific work is done by the [Migrator] selected from a
//! [MigratorRegistry] by source type.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::{EntityKind, HostApi};
use crate::conf::MigrationSettings;
use crate::error::{MigrationError, Result};
use crate::model::IdentifierMap;
use crate::postprocess::PostProcessors;
use crate::transform::ApplicationOptions;

pub mod boot;
pub mod registry;
pub mod shogun2;

pub use boot::BootMigrator;
pub use registry::MigratorRegistry;
pub use shogun2::Shogun2Migrator;

/// Migrates the records of one source schema.
#[async_trait]
pub trait Migrator: Send + Sync {
    fn name(&self) -> &str;

    fn handles_source_type(&self, source_type: &str) -> bool;

    /// Migrates every source layer and returns which target id each migrated layer received.
    async fn migrate_layers(
        &self,
        ctx: &MigrationContext<'_>,
        report: &mut MigrationReport,
    ) -> Result<IdentifierMap>;

    async fn migrate_applications(
        &self,
        ctx: &MigrationContext<'_>,
        id_map: &IdentifierMap,
        report: &mut MigrationReport,
    ) -> Result<()>;
}

/// Everything a [Migrator] works with during one run.
pub struct MigrationContext<'a> {
    pub source: &'a dyn HostApi,
    pub target: &'a dyn HostApi,
    pub settings: &'a MigrationSettings,
    pub post_processors: &'a PostProcessors,
}

impl<'a> MigrationContext<'a> {
    /// Runs the layer post-processors and saves the layer, returning its target id.
    pub async fn save_layer(&self, mut document: Value) -> Result<i64> {
        self.post_processors.layers.apply(&mut document)?;
        let id = self.target.save(EntityKind::Layer, &document).await?;
        if self.settings.make_public {
            self.target.make_layer_public(id).await?;
        }
        Ok(id)
    }

    pub async fn save_application(&self, mut document: Value) -> Result<i64> {
        self.post_processors.applications.apply(&mut document)?;
        self.target.save(EntityKind::Application, &document).await
    }

    pub fn application_options(&self) -> ApplicationOptions {
        ApplicationOptions {
            map_view_mode: self.settings.map_view_mode,
            legal: self.settings.legal.clone(),
            theme: self.settings.theme.clone(),
        }
    }
}

/// Counts of what happened to the records of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub layers_migrated: usize,
    /// Layers left out because their type has no counterpart in the target system.
    pub layers_skipped: usize,
    pub layers_failed: usize,
    pub applications_migrated: usize,
    pub applications_failed: usize,
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} layers migrated ({} skipped, {} failed), {} applications migrated ({} failed)",
            self.layers_migrated,
            self.layers_skipped,
            self.layers_failed,
            self.applications_migrated,
            self.applications_failed
        )
    }
}

/// Decides whether a failed record ends the run. Fatal errors are handed back, everything else
/// is logged against the record and swallowed.
pub(crate) fn settle_record_error(error: MigrationError, kind: &str, label: &str) -> Result<()> {
    if error.is_fatal() {
        return Err(error);
    }
    warn!("Unable to migrate {kind} {label}: {error}");
    Ok(())
}

/// Deletes every application and then every layer of the target.
pub async fn clear_target(target: &dyn HostApi) -> Result<()> {
    for kind in [EntityKind::Application, EntityKind::Layer] {
        let collection = kind.collection();
        let documents = target.fetch(collection).await?;
        info!("Deleting {} {collection} from target", documents.len());
        for document in documents {
            match document.get("id").and_then(Value::as_i64) {
                Some(id) => target.delete(&format!("{collection}/{id}")).await?,
                None => warn!("Target lists an entry of {collection} without id, leaving it"),
            }
        }
    }
    Ok(())
}

/// Runs a full migration with the migrator handling the configured source type.
pub async fn run_migration(
    registry: &MigratorRegistry,
    ctx: &MigrationContext<'_>,
) -> Result<MigrationReport> {
    let migrator = registry.find(&ctx.settings.source_type)?;
    info!(
        "Migrating from {} to {} using the {} migrator",
        ctx.settings.source.hostname,
        ctx.settings.target.hostname,
        migrator.name()
    );
    if ctx.settings.clear_target {
        clear_target(ctx.target).await?;
    }

    let mut report = MigrationReport::default();
    let id_map = migrator.migrate_layers(ctx, &mut report).await?;
    info!("Migrated {} layers", id_map.len());
    migrator
        .migrate_applications(ctx, &id_map, &mut report)
        .await?;
    info!("Migration finished: {report}");
    Ok(report)
}
