use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::model::IdentifierMap;
use crate::transform::fields::RecordReader;
use crate::transform::{describe_record, transform_application, transform_layer};

use super::{settle_record_error, MigrationContext, MigrationReport, Migrator};

pub const SOURCE_TYPE: &str = "shogun2";

const PROJECT_LAYERS: &str = "rest/projectlayers";
const PROJECT_APPS: &str = "rest/projectapps";

/// Converts records of the legacy schema into the target schema.
pub struct Shogun2Migrator;

impl Shogun2Migrator {
    /// Returns the source and target id of the layer, or `None` when the layer is not migrated.
    async fn migrate_layer(
        &self,
        ctx: &MigrationContext<'_>,
        layer: &Value,
        label: &str,
    ) -> Result<Option<(i64, i64)>> {
        let source_id = RecordReader::new(label).require_i64(layer, "id")?;
        let Some(target) = transform_layer(layer, &ctx.settings.replace_layer_urls)? else {
            return Ok(None);
        };
        let target_id = ctx.save_layer(serde_json::to_value(&target)?).await?;
        info!("Layer {label} saved as {target_id}");
        Ok(Some((source_id, target_id)))
    }
}

#[async_trait]
impl Migrator for Shogun2Migrator {
    fn name(&self) -> &str {
        SOURCE_TYPE
    }

    fn handles_source_type(&self, source_type: &str) -> bool {
        source_type.eq_ignore_ascii_case(SOURCE_TYPE)
    }

    async fn migrate_layers(
        &self,
        ctx: &MigrationContext<'_>,
        report: &mut MigrationReport,
    ) -> Result<IdentifierMap> {
        let layers = ctx.source.fetch(PROJECT_LAYERS).await?;
        info!("Fetched {} layers", layers.len());
        let mut id_map = IdentifierMap::new();
        for layer in &layers {
            let label = describe_record(layer);
            match self.migrate_layer(ctx, layer, &label).await {
                Ok(Some((source_id, target_id))) => {
                    id_map.insert(source_id, target_id);
                    report.layers_migrated += 1;
                }
                Ok(None) => report.layers_skipped += 1,
                Err(e) => {
                    settle_record_error(e, "layer", &label)?;
                    report.layers_failed += 1;
                }
            }
        }
        Ok(id_map)
    }

    async fn migrate_applications(
        &self,
        ctx: &MigrationContext<'_>,
        id_map: &IdentifierMap,
        report: &mut MigrationReport,
    ) -> Result<()> {
        let applications = ctx.source.fetch(PROJECT_APPS).await?;
        info!("Fetched {} applications", applications.len());
        let options = ctx.application_options();
        for application in &applications {
            let label = describe_record(application);
            let migrated = match transform_application(application, id_map, &options) {
                Ok(target) => match serde_json::to_value(&target) {
                    Ok(document) => ctx.save_application(document).await,
                    Err(e) => Err(e.into()),
                },
                Err(e) => Err(e),
            };
            match migrated {
                Ok(id) => {
                    info!("Application {label} saved as {id}");
                    report.applications_migrated += 1;
                }
                Err(e) => {
                    settle_record_error(e, "application", &label)?;
                    report.applications_failed += 1;
                }
            }
        }
        Ok(())
    }
}
