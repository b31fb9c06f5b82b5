//! Dialect Registry
//!
//! Detects which FFI convention a repository follows and builds the
//! matching providers.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::DialectSettings;
use crate::dialect::plugins::{
    DglProvider, MxnetProvider, NoopProvider, TaichiProvider, TorchProvider, TvmProvider,
};
use crate::dialect::traits::DialectProvider;
use crate::error::{NavigatorError, Result};

/// The built-in dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    Tvm,
    Mxnet,
    Torch,
    Dgl,
    Taichi,
}

impl DialectKind {
    /// Detection order; the first dialect whose marker exists wins
    pub const ALL: [DialectKind; 5] = [
        DialectKind::Tvm,
        DialectKind::Mxnet,
        DialectKind::Torch,
        DialectKind::Dgl,
        DialectKind::Taichi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DialectKind::Tvm => "tvm",
            DialectKind::Mxnet => "mxnet",
            DialectKind::Torch => "torch",
            DialectKind::Dgl => "dgl",
            DialectKind::Taichi => "taichi",
        }
    }

    /// Directory, relative to the root, whose presence signals this dialect
    pub fn marker(self) -> PathBuf {
        match self {
            DialectKind::Tvm => Path::new("python").join("tvm"),
            DialectKind::Mxnet => Path::new("python").join("mxnet"),
            DialectKind::Torch => PathBuf::from("torch"),
            DialectKind::Dgl => Path::new("python").join("dgl"),
            DialectKind::Taichi => Path::new("python").join("taichi"),
        }
    }

    /// Look a dialect up by its configuration name
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| NavigatorError::UnknownDialect {
                name: name.to_string(),
                known: Self::ALL.map(DialectKind::name).join(", "),
            })
    }

    /// First dialect whose marker directory exists under `root`
    pub fn detect(root: &Path) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| root.join(kind.marker()).exists())
    }

    /// Dialects named in the settings, or the detected one when none are
    pub fn select(root: &Path, settings: &DialectSettings) -> Result<Vec<Self>> {
        if !settings.enabled.is_empty() {
            return settings
                .enabled
                .iter()
                .map(|name| Self::from_name(name))
                .collect();
        }
        Ok(Self::detect(root).into_iter().collect())
    }

    /// A fresh provider with empty package state
    pub fn instantiate(self) -> Result<Box<dyn DialectProvider>> {
        let provider: Box<dyn DialectProvider> = match self {
            DialectKind::Tvm => Box::new(TvmProvider::new()?),
            DialectKind::Mxnet => Box::new(MxnetProvider::new()?),
            DialectKind::Torch => Box::new(TorchProvider::new()?),
            DialectKind::Dgl => Box::new(DglProvider::new()?),
            DialectKind::Taichi => Box::new(TaichiProvider::new()?),
        };
        Ok(provider)
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The providers active for one workspace generation, in priority order.
pub struct DialectRegistry {
    providers: Vec<Box<dyn DialectProvider>>,
}

impl DialectRegistry {
    /// Instantiate `kinds`; with no kinds the no-op fallback is used
    pub fn from_kinds(kinds: &[DialectKind]) -> Result<Self> {
        let mut providers = kinds
            .iter()
            .map(|kind| kind.instantiate())
            .collect::<Result<Vec<_>>>()?;
        if providers.is_empty() {
            providers.push(Box::new(NoopProvider::new()));
        }
        info!(
            "Active dialects: {}",
            providers
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self { providers })
    }

    /// Build a registry from explicit providers
    pub fn with_providers(providers: Vec<Box<dyn DialectProvider>>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[Box<dyn DialectProvider>] {
        &self.providers
    }

    pub fn providers_mut(&mut self) -> &mut [Box<dyn DialectProvider>] {
        &mut self.providers
    }

    /// Names of the active providers
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Extra scan directories contributed by every provider
    pub fn additional_scan_dirs(&self, root: &Path) -> Vec<PathBuf> {
        self.providers
            .iter()
            .flat_map(|p| p.additional_scan_dirs(root))
            .collect()
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        let fallback: Box<dyn DialectProvider> = Box::new(NoopProvider::new());
        Self::with_providers(vec![fallback])
    }
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
