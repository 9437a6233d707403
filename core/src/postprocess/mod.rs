use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{MigrationError, Result};

use self::field_ops::{RemoveField, RenameField, SetField};

pub mod field_ops;

/// Mutates a fully transformed target document right before it is saved.
pub trait PostProcessor: Send + Sync {
    fn name(&self) -> &str;

    fn postprocess(&self, document: &mut Value) -> Result<()>;
}

/// Post-processors applied in registration order.
#[derive(Default)]
pub struct PostProcessorChain {
    processors: Vec<Box<dyn PostProcessor>>,
}

impl PostProcessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, processor: Box<dyn PostProcessor>) {
        self.processors.push(processor);
    }

    /// Runs every processor on `document`, stopping at the first failure.
    pub fn apply(&self, document: &mut Value) -> Result<()> {
        for processor in &self.processors {
            debug!("Applying post-processor {}", processor.name());
            processor.postprocess(document)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

/// The two independent chains of a run.
#[derive(Default)]
pub struct PostProcessors {
    pub layers: PostProcessorChain,
    pub applications: PostProcessorChain,
}

/// Which chain a declared post-processor joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainKind {
    Layer,
    Application,
}

/// Built-in post-processors which can be declared in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PostProcessorOptions {
    SetField(SetField),
    RemoveField(RemoveField),
    RenameField(RenameField),
}

/// One entry of a post-processor declaration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostProcessorDeclaration {
    pub chain: ChainKind,
    pub processor: PostProcessorOptions,
}

pub fn initialize_post_processor(options: &PostProcessorOptions) -> Result<Box<dyn PostProcessor>> {
    let path = match options {
        PostProcessorOptions::SetField(p) => &p.path,
        PostProcessorOptions::RemoveField(p) => &p.path,
        PostProcessorOptions::RenameField(p) => &p.path,
    };
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(MigrationError::Config(format!(
            "Invalid field path '{path}' in post-processor declaration"
        )));
    }
    Ok(match options {
        PostProcessorOptions::SetField(p) => Box::new(p.clone()),
        PostProcessorOptions::RemoveField(p) => Box::new(p.clone()),
        PostProcessorOptions::RenameField(p) => Box::new(p.clone()),
    })
}

impl PostProcessors {
    pub fn register(&mut self, chain: ChainKind, processor: Box<dyn PostProcessor>) {
        match chain {
            ChainKind::Layer => self.layers.register(processor),
            ChainKind::Application => self.applications.register(processor),
        }
    }

    pub fn register_declaration(&mut self, declaration: &PostProcessorDeclaration) -> Result<()> {
        let processor = initialize_post_processor(&declaration.processor)?;
        self.register(declaration.chain, processor);
        Ok(())
    }

    /// Loads every YAML file below `dir` in file name order. Each file may hold several
    /// documents, each either a single declaration or a list of them.
    pub fn load_directory(dir: &Path) -> Result<Self> {
        let mut processors = Self::default();
        for path in declaration_files(dir)? {
            for declaration in read_declarations(&path)? {
                processors.register_declaration(&declaration)?;
            }
        }
        info!(
            "Loaded {} layer and {} application post-processors from {}",
            processors.layers.len(),
            processors.applications.len(),
            dir.to_string_lossy()
        );
        Ok(processors)
    }
}

fn declaration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let is_yaml = entry
            .path()
            .extension()
            .map(|ext| ext == "yaml" || ext == "yml")
            .unwrap_or(false);
        if entry.file_type().is_file() && is_yaml {
            files.push(entry.path().to_owned());
        }
    }
    Ok(files)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeclarationDocument {
    Single(PostProcessorDeclaration),
    Many(Vec<PostProcessorDeclaration>),
}

fn read_declarations(path: &Path) -> Result<Vec<PostProcessorDeclaration>> {
    let f = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(f);
    let mut declarations = vec![];
    for document in serde_yaml::Deserializer::from_reader(reader) {
        match DeclarationDocument::deserialize(document).map_err(|e| {
            MigrationError::Config(format!(
                "Unable to read post-processors from {}: {e}",
                path.to_string_lossy()
            ))
        })? {
            DeclarationDocument::Single(d) => declarations.push(d),
            DeclarationDocument::Many(many) => declarations.extend(many),
        }
    }
    Ok(declarations)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::{json, Value};

    use crate::error::{MigrationError, Result};

    use super::{field_ops::SetField, PostProcessor, PostProcessorChain, PostProcessors};

    struct Append(&'static str);

    impl PostProcessor for Append {
        fn name(&self) -> &str {
            "Append"
        }

        fn postprocess(&self, document: &mut Value) -> Result<()> {
            let name = document["name"].as_str().unwrap_or_default().to_string();
            document["name"] = json!(format!("{name}{}", self.0));
            Ok(())
        }
    }

    #[test]
    fn chain_runs_in_registration_order() -> Result<()> {
        let mut chain = PostProcessorChain::new();
        chain.register(Box::new(Append("-a")));
        chain.register(Box::new(Append("-b")));
        let mut doc = json!({"name": "x"});
        chain.apply(&mut doc)?;
        assert_eq!(doc["name"], json!("x-a-b"));
        Ok(())
    }

    #[test]
    fn chain_can_overwrite_earlier_changes() -> Result<()> {
        let mut chain = PostProcessorChain::new();
        chain.register(Box::new(SetField {
            path: "public".to_string(),
            value: json!(false),
        }));
        chain.register(Box::new(SetField {
            path: "public".to_string(),
            value: json!(true),
        }));
        let mut doc = json!({});
        chain.apply(&mut doc)?;
        assert_eq!(doc, json!({"public": true}));
        Ok(())
    }

    #[test]
    fn load_declarations_from_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut first = std::fs::File::create(dir.path().join("01-layers.yaml"))?;
        writeln!(
            first,
            "chain: Layer\nprocessor:\n  type: SetField\n  path: clientConfig.opacity\n  value: 0.75\n---\n\
             - chain: Application\n  processor:\n    type: RemoveField\n    path: clientConfig.theme\n"
        )?;
        let mut second = std::fs::File::create(dir.path().join("02-apps.yml"))?;
        writeln!(
            second,
            "chain: Application\nprocessor:\n  type: RenameField\n  path: clientConfig.mapView.mapExtent\n  to: extent\n"
        )?;
        std::fs::File::create(dir.path().join("README.txt"))?;

        let processors = PostProcessors::load_directory(dir.path())?;
        assert_eq!(processors.layers.len(), 1);
        assert_eq!(processors.applications.len(), 2);

        let mut app = json!({"clientConfig": {"theme": {}, "mapView": {"mapExtent": [1, 2, 3, 4]}}});
        processors.applications.apply(&mut app)?;
        assert_eq!(app, json!({"clientConfig": {"mapView": {"extent": [1, 2, 3, 4]}}}));
        Ok(())
    }

    #[test]
    fn invalid_declaration_is_config_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join("bad.yaml"),
            "chain: Layer\nprocessor:\n  type: DropTable\n",
        )?;
        match PostProcessors::load_directory(dir.path()) {
            Err(MigrationError::Config(_)) => Ok(()),
            Err(e) => panic!("unexpected error {e}"),
            Ok(_) => panic!("declaration should be rejected"),
        }
    }
}
