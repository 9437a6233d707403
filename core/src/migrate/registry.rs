use tracing::debug;

use crate::error::{MigrationError, Result};

use super::{BootMigrator, Migrator, Shogun2Migrator};

/// The migrators available to a run. Selection asks every registered migrator in registration
/// order whether it handles the source type.
#[derive(Default)]
pub struct MigratorRegistry {
    migrators: Vec<Box<dyn Migrator>>,
}

impl MigratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in migrators.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Shogun2Migrator));
        registry.register(Box::new(BootMigrator));
        registry
    }

    pub fn register(&mut self, migrator: Box<dyn Migrator>) {
        debug!("Registering migrator {}", migrator.name());
        self.migrators.push(migrator);
    }

    pub fn find(&self, source_type: &str) -> Result<&dyn Migrator> {
        self.migrators
            .iter()
            .find(|m| m.handles_source_type(source_type))
            .map(|m| m.as_ref())
            .ok_or_else(|| {
                MigrationError::Config(format!("No migrator handles source type {source_type}"))
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.migrators.iter().map(|m| m.name()).collect()
    }
}
