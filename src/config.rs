use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::category::CategoryRules;
use crate::classify::{BackendRegistry, Prediction, StubBackend};

const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_INPUT_WIDTH: u32 = 224;
const DEFAULT_INPUT_HEIGHT: u32 = 224;
const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Deserialize, Default)]
struct WasteSortConfigFile {
    backend: Option<BackendConfigFile>,
    rules: Option<CategoryRules>,
}

#[derive(Debug, Deserialize, Default)]
struct BackendConfigFile {
    kind: Option<String>,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    apply_softmax: Option<bool>,
    top_k: Option<usize>,
    stub_predictions: Option<Vec<Prediction>>,
}

#[derive(Debug, Clone)]
pub struct WasteSortConfig {
    pub backend: BackendSettings,
    pub rules: CategoryRules,
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// `stub` or `tract`.
    pub kind: String,
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub input_width: u32,
    pub input_height: u32,
    pub apply_softmax: bool,
    pub top_k: usize,
    /// Canned answer for the `stub` backend.
    pub stub_predictions: Vec<Prediction>,
}

impl WasteSortConfig {
    /// Load from the JSON file named by `WASTE_SORT_CONFIG` (if set), then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("WASTE_SORT_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Same as `load`, with an explicit config file taking the place of
    /// `WASTE_SORT_CONFIG`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => {
                log::debug!("loading config from {}", path.display());
                Some(read_config_file(path)?)
            }
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: WasteSortConfigFile) -> Self {
        let backend = file.backend.unwrap_or_default();
        Self {
            backend: BackendSettings {
                kind: backend
                    .kind
                    .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
                model_path: backend.model_path,
                labels_path: backend.labels_path,
                input_width: backend.input_width.unwrap_or(DEFAULT_INPUT_WIDTH),
                input_height: backend.input_height.unwrap_or(DEFAULT_INPUT_HEIGHT),
                apply_softmax: backend.apply_softmax.unwrap_or(true),
                top_k: backend.top_k.unwrap_or(DEFAULT_TOP_K),
                stub_predictions: backend.stub_predictions.unwrap_or_default(),
            },
            rules: file.rules.unwrap_or_default(),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(kind) = std::env::var("WASTE_SORT_BACKEND") {
            if !kind.trim().is_empty() {
                self.backend.kind = kind.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("WASTE_SORT_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.backend.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("WASTE_SORT_LABELS_PATH") {
            if !path.trim().is_empty() {
                self.backend.labels_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(top_k) = std::env::var("WASTE_SORT_TOP_K") {
            self.backend.top_k = top_k
                .trim()
                .parse()
                .map_err(|_| anyhow!("WASTE_SORT_TOP_K must be a positive integer"))?;
        }
        if let Ok(rules) = std::env::var("WASTE_SORT_RULES") {
            if !rules.trim().is_empty() {
                self.rules = CategoryRules::parse_pairs(&rules)
                    .map_err(|e| anyhow!("invalid WASTE_SORT_RULES: {}", e))?;
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.backend.kind = self.backend.kind.to_lowercase();
        let backend = &self.backend;

        if backend.input_width == 0 || backend.input_height == 0 {
            return Err(anyhow!("model input dimensions must be greater than zero"));
        }
        if backend.top_k == 0 {
            return Err(anyhow!("top_k must be greater than zero"));
        }
        if let Some(bad) = backend.stub_predictions.iter().find(|p| !p.is_well_formed()) {
            return Err(anyhow!(
                "stub prediction '{}' has confidence {} outside [0, 1]",
                bad.label,
                bad.confidence
            ));
        }
        match backend.kind.as_str() {
            "stub" => {}
            "tract" => {
                if backend.model_path.is_none() {
                    return Err(anyhow!("tract backend requires model_path"));
                }
                if backend.labels_path.is_none() {
                    return Err(anyhow!("tract backend requires labels_path"));
                }
            }
            other => return Err(anyhow!("unknown backend kind '{}'", other)),
        }
        Ok(())
    }
}

impl BackendSettings {
    /// Build the registry of available backends with the configured kind as default.
    ///
    /// The stub backend is always registered.
    pub fn build_registry(&self) -> Result<BackendRegistry> {
        let mut registry = BackendRegistry::new();
        let mut stub_predictions = self.stub_predictions.clone();
        stub_predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        registry.register(StubBackend::new(stub_predictions));

        if self.kind == "tract" {
            self.register_tract(&mut registry)?;
        }
        registry.set_default(&self.kind)?;
        Ok(registry)
    }

    #[cfg(feature = "backend-tract")]
    fn register_tract(&self, registry: &mut BackendRegistry) -> Result<()> {
        let model_path = self
            .model_path
            .as_ref()
            .ok_or_else(|| anyhow!("tract backend requires model_path"))?;
        let labels_path = self
            .labels_path
            .as_ref()
            .ok_or_else(|| anyhow!("tract backend requires labels_path"))?;
        let backend = crate::classify::TractBackend::new(
            model_path,
            labels_path,
            self.input_width,
            self.input_height,
        )?
        .with_softmax(self.apply_softmax)
        .with_top_k(self.top_k);
        registry.register(backend);
        Ok(())
    }

    #[cfg(not(feature = "backend-tract"))]
    fn register_tract(&self, _registry: &mut BackendRegistry) -> Result<()> {
        Err(anyhow!(
            "tract backend requested but waste-sort was built without the backend-tract feature"
        ))
    }
}

fn read_config_file(path: &Path) -> Result<WasteSortConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
