use std::path::PathBuf;

use clap::Parser;
use mapmigrate::client::HttpHost;
use mapmigrate::conf::{MapViewMode, MigrationSettings, UrlRewriteRules};
use mapmigrate::error::Result;
use mapmigrate::migrate::{run_migration, MigrationContext, MigratorRegistry};
use mapmigrate::postprocess::PostProcessors;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Migrates map applications and layers from a source installation to a target installation.
#[derive(Parser)]
#[clap(version, about)]
struct CliArgs {
    /// YAML settings file. Command line options override its values.
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    #[clap(long)]
    source: Option<String>,
    #[clap(long)]
    source_user: Option<String>,
    #[clap(long, env = "MIGRATE_SOURCE_PASSWORD", hide_env_values = true)]
    source_password: Option<String>,
    /// OpenID Connect client used to obtain a token for the source.
    #[clap(long)]
    source_client_id: Option<String>,

    #[clap(long)]
    target: Option<String>,
    #[clap(long)]
    target_user: Option<String>,
    #[clap(long, env = "MIGRATE_TARGET_PASSWORD", hide_env_values = true)]
    target_password: Option<String>,
    #[clap(long)]
    target_client_id: Option<String>,

    /// Schema of the source, `shogun2` or `boot`.
    #[clap(short = 't', long)]
    source_type: Option<String>,

    /// Layer URL replacements, e.g. `http://old/geoserver::http://new/geoserver,...`
    #[clap(short = 'r', long)]
    replace_layer_urls: Option<UrlRewriteRules>,

    /// Transform map centers and extents to geographic coordinates.
    #[clap(long)]
    reproject: bool,

    /// Grant public read access to every migrated layer.
    #[clap(long)]
    make_public: bool,

    /// Delete all applications and layers of the target before migrating.
    #[clap(long)]
    clear_target: bool,

    #[clap(long)]
    accept_invalid_certs: bool,

    /// Directory with post-processor declarations.
    #[clap(short = 'p', long)]
    plugin_dir: Option<PathBuf>,

    #[clap(long)]
    legal_contact: Option<String>,
    #[clap(long)]
    legal_imprint: Option<String>,
    #[clap(long)]
    legal_privacy: Option<String>,

    #[clap(long)]
    theme_primary_color: Option<String>,
    #[clap(long)]
    theme_secondary_color: Option<String>,
    #[clap(long)]
    theme_complementary_color: Option<String>,
    #[clap(long)]
    theme_logo_path: Option<String>,
    #[clap(long)]
    theme_favicon_path: Option<String>,

    #[clap(short = 'v', long)]
    verbose: bool,
}

fn override_with<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

impl CliArgs {
    fn into_settings(self) -> Result<MigrationSettings> {
        let mut settings = match &self.config {
            Some(path) => MigrationSettings::from_yaml_file(path)?,
            None => MigrationSettings::default(),
        };

        override_with(&mut settings.source.hostname, self.source);
        override_with(&mut settings.source.username, self.source_user);
        override_with(&mut settings.source.password, self.source_password);
        if self.source_client_id.is_some() {
            settings.source.client_id = self.source_client_id;
        }
        override_with(&mut settings.target.hostname, self.target);
        override_with(&mut settings.target.username, self.target_user);
        override_with(&mut settings.target.password, self.target_password);
        if self.target_client_id.is_some() {
            settings.target.client_id = self.target_client_id;
        }
        override_with(&mut settings.source_type, self.source_type);
        override_with(&mut settings.replace_layer_urls, self.replace_layer_urls);
        if self.reproject {
            settings.map_view_mode = MapViewMode::Reproject;
        }
        settings.make_public |= self.make_public;
        settings.clear_target |= self.clear_target;
        settings.accept_invalid_certs |= self.accept_invalid_certs;
        if self.plugin_dir.is_some() {
            settings.plugin_dir = self.plugin_dir;
        }

        let mut legal = settings.legal.take().unwrap_or_default();
        if self.legal_contact.is_some() {
            legal.contact = self.legal_contact;
        }
        if self.legal_imprint.is_some() {
            legal.imprint = self.legal_imprint;
        }
        if self.legal_privacy.is_some() {
            legal.privacy = self.legal_privacy;
        }
        settings.legal = legal.non_empty();

        let mut theme = settings.theme.take().unwrap_or_default();
        if self.theme_primary_color.is_some() {
            theme.primary_color = self.theme_primary_color;
        }
        if self.theme_secondary_color.is_some() {
            theme.secondary_color = self.theme_secondary_color;
        }
        if self.theme_complementary_color.is_some() {
            theme.complementary_color = self.theme_complementary_color;
        }
        if self.theme_logo_path.is_some() {
            theme.logo_path = self.theme_logo_path;
        }
        if self.theme_favicon_path.is_some() {
            theme.favicon_path = self.theme_favicon_path;
        }
        settings.theme = (!theme.is_empty()).then_some(theme);

        settings.validate()?;
        Ok(settings)
    }
}

async fn run(settings: MigrationSettings) -> Result<()> {
    let post_processors = match &settings.plugin_dir {
        Some(dir) => PostProcessors::load_directory(dir)?,
        None => PostProcessors::default(),
    };

    let mut source = HttpHost::new(settings.source.clone(), settings.accept_invalid_certs)?;
    source.authenticate().await?;
    let mut target = HttpHost::new(settings.target.clone(), settings.accept_invalid_certs)?;
    target.authenticate().await?;

    let registry = MigratorRegistry::with_defaults();
    let ctx = MigrationContext {
        source: &source,
        target: &target,
        settings: &settings,
        post_processors: &post_processors,
    };
    let report = run_migration(&registry, &ctx).await?;
    info!("{report}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let result = match args.into_settings() {
        Ok(settings) => run(settings).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        error!("Migration failed: {e}");
    }
    result
}
