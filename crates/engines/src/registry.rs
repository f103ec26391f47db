//! EngineRegistry
//!
//! Builds the engine set from an `EngineBlueprint`: resolves binary paths,
//! validates them, and keeps the engines in declaration order.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use contracts::{EngineBlueprint, EngineConfig, EngineKind, PdfEngine};
use tracing::{debug, info, instrument};

use crate::error::{EngineFactoryError, Result};
use crate::{Cad2X, MockEngine, PdfToCairo, QPdf};

/// Ordered set of named engines
#[derive(Default, Clone)]
pub struct EngineRegistry {
    engines: Vec<Arc<dyn PdfEngine>>,
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.names())
            .finish()
    }
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision every enabled engine, reading binary paths from the process
    /// environment when the configuration leaves them out
    pub fn from_blueprint(blueprint: &EngineBlueprint) -> Result<Self> {
        Self::from_blueprint_with(blueprint, |var| std::env::var(var).ok())
    }

    /// Same as [`EngineRegistry::from_blueprint`] with an explicit environment
    #[instrument(
        name = "engine_registry_from_blueprint",
        skip(blueprint, env),
        fields(engine_count = blueprint.engines.len())
    )]
    pub fn from_blueprint_with<F>(blueprint: &EngineBlueprint, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut registry = Self::new();

        for config in &blueprint.engines {
            if !config.enabled {
                debug!(engine = %config.id, "engine disabled, skipping");
                continue;
            }
            registry.register(provision_with(config, &env)?)?;
        }

        info!(engines = ?registry.names(), "engines provisioned");
        Ok(registry)
    }

    /// Add an engine at the end of the declaration order
    ///
    /// # Errors
    /// Fails when an engine with the same name is already registered.
    pub fn register(&mut self, engine: Arc<dyn PdfEngine>) -> Result<()> {
        if self.get(engine.name()).is_some() {
            return Err(EngineFactoryError::DuplicateEngine {
                name: engine.name().to_string(),
            });
        }
        self.engines.push(engine);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn PdfEngine>> {
        self.engines.iter().find(|engine| engine.name() == name)
    }

    /// Engine names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.engines.iter().map(|engine| engine.name()).collect()
    }

    pub fn engines(&self) -> &[Arc<dyn PdfEngine>] {
        &self.engines
    }

    pub fn into_engines(self) -> Vec<Arc<dyn PdfEngine>> {
        self.engines
    }

    /// Pick engines by name, in the order given
    ///
    /// Each name may appear once.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<dyn PdfEngine>>> {
        let mut seen = HashSet::new();
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                if !seen.insert(name) {
                    return Err(EngineFactoryError::DuplicateEngine {
                        name: name.to_string(),
                    });
                }
                self.get(name)
                    .cloned()
                    .ok_or_else(|| EngineFactoryError::UnknownEngine {
                        name: name.to_string(),
                    })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

#[instrument(name = "engine_provision", skip(config, env), fields(engine = %config.id, kind = %config.kind))]
fn provision_with<F>(config: &EngineConfig, env: &F) -> Result<Arc<dyn PdfEngine>>
where
    F: Fn(&str) -> Option<String>,
{
    let engine: Arc<dyn PdfEngine> = match config.kind {
        EngineKind::Mock => Arc::new(MockEngine::from_params(&config.id, &config.params)?),
        EngineKind::QPdf => Arc::new(QPdf::new(&config.id, validated_bin_path(config, env)?)),
        EngineKind::PdfToCairo => Arc::new(PdfToCairo::new(
            &config.id,
            validated_bin_path(config, env)?,
        )),
        EngineKind::Cad2X => Arc::new(Cad2X::new(&config.id, validated_bin_path(config, env)?)),
    };
    debug!("engine provisioned");
    Ok(engine)
}

/// Binary path for `config`: configured value first, then the kind's env var
///
/// Returns `Ok(None)` for kinds that run no binary.
pub fn resolve_bin_path_with<F>(config: &EngineConfig, env: F) -> Result<Option<PathBuf>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(env_var) = config.kind.env_var() else {
        return Ok(None);
    };
    if let Some(path) = &config.bin_path {
        return Ok(Some(path.clone()));
    }
    env(env_var)
        .filter(|value| !value.trim().is_empty())
        .map(|value| Some(PathBuf::from(value)))
        .ok_or_else(|| EngineFactoryError::BinPathNotSet {
            engine: config.id.clone(),
            kind: config.kind,
            env_var,
        })
}

fn validated_bin_path<F>(config: &EngineConfig, env: &F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let path = resolve_bin_path_with(config, env)?.ok_or_else(|| {
        EngineFactoryError::invalid_param(&config.id, "bin_path", "engine kind runs no binary")
    })?;
    if !path.exists() {
        return Err(EngineFactoryError::BinaryNotFound {
            engine: config.id.clone(),
            path,
        });
    }
    Ok(path)
}
