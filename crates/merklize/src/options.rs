//! # Merklization Options
//!
//! Every collaborator of the merklizer is chosen explicitly per call. Unset
//! options fall back to documented defaults:
//!
//! | option | default |
//! |---|---|
//! | hasher | [`PoseidonHasher`] (BN254, circom parameters) |
//! | merkle tree | empty [`SparseMerkleTree`] of `mt_levels` levels over the hasher |
//! | safe mode | `true` |
//! | document loader | [`CachingLoader`] over an [`HttpLoader`] |
//! | IPFS gateway | none (`ipfs://` contexts fail) |
//! | JSON-LD processor | [`SophiaProcessor`] |
//! | tree levels | [`DEFAULT_MT_LEVELS`] |
//!
//! An explicit document loader takes precedence over the IPFS gateway and
//! HTTP timeout settings, which only configure the default loader.

use std::fmt;
use std::sync::Arc;

use merklize_core::{MerkleTree, MerklizeError, SharedHasher};
use merklize_crypto::{PoseidonHasher, SparseMerkleTree, DEFAULT_MT_LEVELS};
use merklize_jsonld::{
    CachingLoader, DocumentLoader, HttpLoader, JsonLdError, JsonLdProcessor, LoaderConfig,
    SophiaProcessor,
};
use url::Url;

use crate::config::MerklizeConfig;

/// Builder of merklization settings.
pub struct MerklizeOptions {
    hasher: Option<SharedHasher>,
    merkle_tree: Option<Box<dyn MerkleTree>>,
    safe_mode: bool,
    document_loader: Option<Arc<dyn DocumentLoader>>,
    ipfs_gateway: Option<Url>,
    http_timeout_secs: u64,
    processor: Option<Arc<dyn JsonLdProcessor>>,
    mt_levels: usize,
}

impl Default for MerklizeOptions {
    fn default() -> Self {
        Self {
            hasher: None,
            merkle_tree: None,
            safe_mode: true,
            document_loader: None,
            ipfs_gateway: None,
            http_timeout_secs: LoaderConfig::default().timeout_secs,
            processor: None,
            mt_levels: DEFAULT_MT_LEVELS,
        }
    }
}

impl fmt::Debug for MerklizeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerklizeOptions")
            .field("hasher", &self.hasher)
            .field("merkle_tree", &self.merkle_tree.is_some())
            .field("safe_mode", &self.safe_mode)
            .field("document_loader", &self.document_loader.is_some())
            .field("ipfs_gateway", &self.ipfs_gateway)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("processor", &self.processor)
            .field("mt_levels", &self.mt_levels)
            .finish()
    }
}

impl MerklizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options seeded from a [`MerklizeConfig`].
    pub fn from_config(config: &MerklizeConfig) -> Self {
        Self {
            safe_mode: config.safe_mode,
            ipfs_gateway: config.ipfs_gateway.clone(),
            http_timeout_secs: config.http_timeout_secs,
            mt_levels: config.mt_levels,
            ..Self::default()
        }
    }

    pub fn with_hasher(mut self, hasher: SharedHasher) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Tree to populate. It must be empty and use the same hasher.
    pub fn with_merkle_tree(mut self, tree: Box<dyn MerkleTree>) -> Self {
        self.merkle_tree = Some(tree);
        self
    }

    pub fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = safe_mode;
        self
    }

    pub fn with_document_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.document_loader = Some(loader);
        self
    }

    pub fn with_ipfs_gateway(mut self, gateway: Url) -> Self {
        self.ipfs_gateway = Some(gateway);
        self
    }

    pub fn with_http_timeout_secs(mut self, secs: u64) -> Self {
        self.http_timeout_secs = secs;
        self
    }

    pub fn with_processor(mut self, processor: Arc<dyn JsonLdProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Levels of the default tree; ignored when a tree is supplied.
    pub fn with_mt_levels(mut self, levels: usize) -> Self {
        self.mt_levels = levels;
        self
    }

    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    pub fn mt_levels(&self) -> usize {
        self.mt_levels
    }

    pub(crate) fn hasher(&self) -> SharedHasher {
        self.hasher
            .clone()
            .unwrap_or_else(|| Arc::new(PoseidonHasher::new()))
    }

    pub(crate) fn processor(&self) -> Arc<dyn JsonLdProcessor> {
        self.processor
            .clone()
            .unwrap_or_else(|| Arc::new(SophiaProcessor::new()))
    }

    /// The configured loader, or the default caching HTTP loader.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be constructed.
    pub(crate) fn document_loader(&self) -> Result<Arc<dyn DocumentLoader>, MerklizeError> {
        if let Some(loader) = &self.document_loader {
            return Ok(Arc::clone(loader));
        }
        let http = HttpLoader::new(&LoaderConfig {
            ipfs_gateway: self.ipfs_gateway.clone(),
            timeout_secs: self.http_timeout_secs,
        })
        .map_err(JsonLdError::from)?;
        Ok(Arc::new(CachingLoader::new(http)))
    }

    /// Take the supplied tree, or build the default one over `hasher`.
    pub(crate) fn take_merkle_tree(&mut self, hasher: &SharedHasher) -> Box<dyn MerkleTree> {
        self.merkle_tree
            .take()
            .unwrap_or_else(|| Box::new(SparseMerkleTree::new(Arc::clone(hasher), self.mt_levels)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merklize_core::Hasher;
    use merklize_crypto::Sha256Hasher;
    use merklize_jsonld::NoLoader;

    #[test]
    fn defaults() {
        let opts = MerklizeOptions::new();
        assert!(opts.safe_mode());
        assert_eq!(opts.mt_levels(), DEFAULT_MT_LEVELS);
        assert_eq!(opts.hasher().prime(), PoseidonHasher::new().prime());
        assert!(opts.document_loader().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let hasher: SharedHasher = Arc::new(Sha256Hasher::new());
        let mut opts = MerklizeOptions::new()
            .with_safe_mode(false)
            .with_mt_levels(16)
            .with_hasher(Arc::clone(&hasher))
            .with_document_loader(Arc::new(NoLoader));
        assert!(!opts.safe_mode());
        assert_eq!(opts.mt_levels(), 16);
        let loader = opts.document_loader().unwrap();
        assert!(loader.load_document("https://example.com/ctx").is_err());
        let tree = opts.take_merkle_tree(&hasher);
        assert_eq!(tree.root(), num_bigint::BigUint::from(0u32));
    }

    #[test]
    fn config_seeds_options() {
        let config = MerklizeConfig {
            safe_mode: false,
            ipfs_gateway: Some(Url::parse("https://ipfs.io").unwrap()),
            http_timeout_secs: 5,
            mt_levels: 32,
        };
        let opts = MerklizeOptions::from_config(&config);
        assert!(!opts.safe_mode());
        assert_eq!(opts.mt_levels(), 32);
        assert_eq!(opts.http_timeout_secs, 5);
        assert_eq!(opts.ipfs_gateway, config.ipfs_gateway);
    }
}
