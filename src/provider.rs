//! Background-removal providers and the facade that selects between them
//!
//! Two interchangeable providers sit behind [`BackgroundRemover`]:
//! - the local model, loaded once at startup and shared read-only;
//! - the remote Studio API, connected per call with the caller's key.
//!
//! Which one runs is a pure function of the request's credential, see
//! [`ProviderSelection::from_credential`].

use crate::{
    error::{BgRemovalError, Result},
    lifecycle::ModelSlot,
    types::ProcessedImage,
};
use async_trait::async_trait;
use image::DynamicImage;
use std::sync::Arc;

/// Name used for the local provider in errors and logs
pub const LOCAL_PROVIDER: &str = "local";

/// Anything that can turn an image into one whose alpha is the foreground mask
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Short provider name for errors and logs
    fn name(&self) -> &'static str;

    /// Remove the background of `image`
    ///
    /// # Errors
    /// - Provider-specific failures (inference, network, remote API status)
    async fn remove_background(&self, image: DynamicImage) -> Result<ProcessedImage>;
}

/// A provider bound to a caller credential that can also report usage
#[async_trait]
pub trait RemoteProvider: BackgroundRemover {
    /// Fetch the account's usage record, unmodified
    ///
    /// # Errors
    /// - Invalid credential or remote failure
    async fn get_usage(&self) -> Result<serde_json::Value>;
}

/// Factory trait for connecting remote providers
pub trait RemoteProviderFactory: Send + Sync {
    /// Connect a provider scoped to `api_key`
    ///
    /// # Errors
    /// - Empty credential
    /// - HTTP client construction failure
    fn connect(&self, api_key: &str) -> Result<Box<dyn RemoteProvider>>;
}

/// Which provider a request is routed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSelection {
    /// Pre-loaded local model
    Local,
    /// Remote API with the given credential
    Remote(String),
}

impl ProviderSelection {
    /// A non-empty credential selects the remote provider, anything else the local one
    #[must_use]
    pub fn from_credential(credential: Option<&str>) -> Self {
        match credential {
            Some(key) if !key.is_empty() => Self::Remote(key.to_string()),
            _ => Self::Local,
        }
    }
}

/// A provider ready to be invoked for one request
pub enum ResolvedProvider {
    Local(Arc<dyn BackgroundRemover>),
    Remote(Box<dyn RemoteProvider>),
}

impl ResolvedProvider {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Local(provider) => provider.name(),
            Self::Remote(provider) => provider.name(),
        }
    }

    /// Invoke the provider. Failures are wrapped as [`BgRemovalError::Provider`].
    ///
    /// # Errors
    /// - Any provider failure
    pub async fn remove_background(&self, image: DynamicImage) -> Result<ProcessedImage> {
        let name = self.name();
        let result = match self {
            Self::Local(provider) => provider.remove_background(image).await,
            Self::Remote(provider) => provider.remove_background(image).await,
        };
        result.map_err(|e| e.into_provider_error(name))
    }
}

impl std::fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(_) => f.write_str("ResolvedProvider::Local"),
            Self::Remote(_) => f.write_str("ResolvedProvider::Remote"),
        }
    }
}

/// Facade over the local model slot and the remote provider factory
#[derive(Clone)]
pub struct BackgroundRemoval {
    local: Arc<ModelSlot>,
    remote: Arc<dyn RemoteProviderFactory>,
}

impl BackgroundRemoval {
    #[must_use]
    pub fn new(local: Arc<ModelSlot>, remote: Arc<dyn RemoteProviderFactory>) -> Self {
        Self { local, remote }
    }

    /// The process-wide local model slot
    #[must_use]
    pub fn model_slot(&self) -> &Arc<ModelSlot> {
        &self.local
    }

    /// Resolve a selection into an invocable provider.
    ///
    /// The remote path never consults the local model slot.
    ///
    /// # Errors
    /// - `ModelUnavailable` when the local model is not loaded yet
    /// - Remote connection failures, wrapped as provider errors
    pub fn resolve(&self, selection: &ProviderSelection) -> Result<ResolvedProvider> {
        match selection {
            ProviderSelection::Local => self.local.get().map(ResolvedProvider::Local),
            ProviderSelection::Remote(api_key) => {
                let provider = self.remote.connect(api_key).map_err(|e| {
                    e.into_provider_error(crate::studio::STUDIO_PROVIDER)
                })?;
                Ok(ResolvedProvider::Remote(provider))
            },
        }
    }

    /// Remove the background with the provider selected by `credential`
    ///
    /// # Errors
    /// - `ModelUnavailable` on the local path before startup finished
    /// - `Provider` for any downstream failure
    pub async fn remove_background(
        &self,
        image: DynamicImage,
        credential: Option<&str>,
    ) -> Result<ProcessedImage> {
        let provider = self.resolve(&ProviderSelection::from_credential(credential))?;
        tracing::debug!(provider = provider.name(), "Dispatching background removal");
        provider.remove_background(image).await
    }

    /// Forward a usage query to a remote provider scoped to `api_key`
    ///
    /// # Errors
    /// - Empty credential
    /// - Remote failure
    pub async fn usage(&self, api_key: &str) -> Result<serde_json::Value> {
        if api_key.is_empty() {
            return Err(BgRemovalError::invalid_config("API key must not be empty"));
        }
        self.remote.connect(api_key)?.get_usage().await
    }
}

impl std::fmt::Debug for BackgroundRemoval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundRemoval")
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}
