use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::EntityKind;
use crate::error::Result;
use crate::model::IdentifierMap;
use crate::transform::describe_record;
use crate::transform::fields::{as_i64, RecordReader};
use crate::transform::layer_tree::remap_tree;

use super::{settle_record_error, MigrationContext, MigrationReport, Migrator};

pub const SOURCE_TYPE: &str = "boot";

/// Copies records between two installations which already share the target schema. Only ids
/// change: records are saved without their old id and layer references are remapped.
pub struct BootMigrator;

impl BootMigrator {
    async fn migrate_layer(
        &self,
        ctx: &MigrationContext<'_>,
        mut layer: Value,
        label: &str,
    ) -> Result<(i64, i64)> {
        let source_id = RecordReader::new(label).require_i64(&layer, "id")?;
        if let Some(object) = layer.as_object_mut() {
            object.remove("id");
        }
        let target_id = ctx.save_layer(layer).await?;
        info!("Layer {label} saved as {target_id}");
        Ok((source_id, target_id))
    }

    async fn migrate_application(
        &self,
        ctx: &MigrationContext<'_>,
        mut application: Value,
        id_map: &IdentifierMap,
        label: &str,
    ) -> Result<i64> {
        let reader = RecordReader::new(label);
        let Some(object) = application.as_object_mut() else {
            return Err(reader.malformed(""));
        };
        object.remove("id");
        if let Some(tree) = object.get_mut("layerTree") {
            remap_tree(tree, id_map, &reader.at("layerTree"))?;
        }
        if let Some(Value::Array(background_layers)) = object
            .get_mut("clientConfig")
            .and_then(|config| config.get_mut("backgroundLayers"))
        {
            remap_background_layers(background_layers, id_map, label);
        }
        ctx.save_application(application).await
    }
}

/// Unmapped background layers are kept as null entries so positions stay stable.
fn remap_background_layers(layers: &mut [Value], id_map: &IdentifierMap, label: &str) {
    for layer in layers.iter_mut() {
        let source_id = as_i64(layer);
        let resolved = source_id.and_then(|id| id_map.resolve(id));
        if resolved.is_none() {
            warn!("Application {label}: background layer {layer} was not migrated, writing null");
        }
        *layer = resolved.map(Value::from).unwrap_or(Value::Null);
    }
}

#[async_trait]
impl Migrator for BootMigrator {
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
        let layers = ctx.source.fetch(EntityKind::Layer.collection()).await?;
        info!("Fetched {} layers", layers.len());
        let mut id_map = IdentifierMap::new();
        for layer in layers {
            let label = describe_record(&layer);
            match self.migrate_layer(ctx, layer, &label).await {
                Ok((source_id, target_id)) => {
                    id_map.insert(source_id, target_id);
                    report.layers_migrated += 1;
                }
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
        let applications = ctx
            .source
            .fetch(EntityKind::Application.collection())
            .await?;
        info!("Fetched {} applications", applications.len());
        for application in applications {
            let label = describe_record(&application);
            match self
                .migrate_application(ctx, application, id_map, &label)
                .await
            {
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

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::client::{EntityKind, InMemoryHost};
    use crate::conf::MigrationSettings;
    use crate::error::Result;
    use crate::migrate::{run_migration, MigrationContext, MigratorRegistry};
    use crate::postprocess::PostProcessors;

    #[tokio::test]
    async fn copies_records_with_new_ids() -> Result<()> {
        let source = InMemoryHost::new(1)
            .with_resource(
                "layers",
                vec![
                    json!({"id": 5, "name": "a", "type": "WMS", "sourceConfig": {"url": "http://x"}}),
                    json!({"id": 7, "name": "b", "type": "XYZ"}),
                ],
            )
            .with_resource(
                "applications",
                vec![json!({
                    "id": 1,
                    "name": "App",
                    "clientConfig": {"backgroundLayers": [7, 9]},
                    "layerTree": {"title": "root", "children": [{"title": "a", "layerId": 5}]}
                })],
            );
        let target = InMemoryHost::new(200);
        let settings = MigrationSettings {
            source_type: "Boot".to_string(),
            ..Default::default()
        };
        let post_processors = PostProcessors::default();
        let ctx = MigrationContext {
            source: &source,
            target: &target,
            settings: &settings,
            post_processors: &post_processors,
        };
        let report = run_migration(&MigratorRegistry::with_defaults(), &ctx).await?;
        assert_eq!(report.layers_migrated, 2);
        assert_eq!(report.applications_migrated, 1);

        let layers = target.saved(EntityKind::Layer);
        assert_eq!(
            layers[0].1,
            json!({"name": "a", "type": "WMS", "sourceConfig": {"url": "http://x"}})
        );
        let (_, app) = &target.saved(EntityKind::Application)[0];
        assert!(app.get("id").is_none());
        assert_eq!(app["clientConfig"]["backgroundLayers"], json!([201, Value::Null]));
        assert_eq!(app["layerTree"]["children"][0]["layerId"], json!(200));
        Ok(())
    }
}
