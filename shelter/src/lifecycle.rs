//! Cache versioning: manifest install and cleanup of superseded namespaces.
//!
//! ```text
//! Pending ──on_install──> Installing ──ok──> Installed ──on_activate──> Active ──supersede──> Superseded
//!                              └──err──> Failed (on_activate refused)
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::try_join_all;
use shelter_backend::{DeleteStatus, NamedCache};
use shelter_core::{CacheEntry, FetchRequest, NamespaceName, Origin, RequestKey, Strategy, Transport};
use tracing::{debug, info, warn};

use crate::error::LifecycleError;
use crate::metrics;
use crate::policy::PolicyTable;

/// Lifecycle phase of one cache version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing has been installed yet.
    #[default]
    Pending,
    /// The manifest is being fetched.
    Installing,
    /// The static namespace is fully populated; the version may activate.
    Installed,
    /// The version serves requests and older namespaces are gone.
    Active,
    /// A newer version has taken over.
    Superseded,
    /// The last install failed; the version must not serve requests.
    Failed,
}

/// Outcome of an activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Superseded namespaces that were removed.
    pub deleted: Vec<NamespaceName>,
    /// Superseded namespaces that could not be removed.
    pub failed: Vec<NamespaceName>,
}

/// Installs the static asset manifest and deletes namespaces of older
/// versions.
pub struct CacheLifecycleManager<C> {
    cache: Arc<C>,
    policy: Arc<PolicyTable>,
    assets_origin: Origin,
    manifest: Vec<String>,
    phase: Phase,
}

impl<C> CacheLifecycleManager<C>
where
    C: NamedCache,
{
    /// Creates a manager for the version described by `policy`.
    ///
    /// `manifest` paths are resolved against `assets_origin`.
    pub fn new(
        cache: Arc<C>,
        policy: impl Into<Arc<PolicyTable>>,
        assets_origin: Origin,
        manifest: Vec<String>,
    ) -> Self {
        CacheLifecycleManager {
            cache,
            policy: policy.into(),
            assets_origin,
            manifest,
            phase: Phase::Pending,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Cache version managed by this instance.
    pub fn version(&self) -> u32 {
        self.policy.version()
    }

    /// Fetches every manifest entry and stores them in the static namespace.
    ///
    /// All-or-nothing: every entry is fetched before anything is written,
    /// and a transport failure or a non-2xx response for any entry fails the
    /// install. A static namespace created by a failed install is removed
    /// again. Calling this on an installed or active version does nothing.
    pub async fn on_install<T>(&mut self, transport: &T) -> Result<(), LifecycleError>
    where
        T: Transport + ?Sized,
    {
        if matches!(self.phase, Phase::Installed | Phase::Active) {
            debug!(version = self.version(), "version already installed");
            return Ok(());
        }

        self.phase = Phase::Installing;
        let namespace = self.policy.static_namespace().clone();
        info!(version = self.version(), %namespace, entries = self.manifest.len(), "installing");

        let existed = match self.cache.namespaces().await {
            Ok(names) => names.contains(&namespace),
            Err(error) => {
                self.phase = Phase::Failed;
                metrics::record_install(false);
                return Err(LifecycleError::Storage(error));
            }
        };

        match self.install(transport, &namespace).await {
            Ok(count) => {
                self.phase = Phase::Installed;
                metrics::record_install(true);
                info!(version = self.version(), %namespace, count, "install complete");
                Ok(())
            }
            Err(error) => {
                warn!(version = self.version(), %error, "install failed");
                if !existed {
                    if let Err(error) = self.cache.delete(&namespace).await {
                        warn!(%namespace, %error, "failed to remove partially installed namespace");
                    }
                }
                self.phase = Phase::Failed;
                metrics::record_install(false);
                Err(error)
            }
        }
    }

    async fn install<T>(&self, transport: &T, namespace: &NamespaceName) -> Result<usize, LifecycleError>
    where
        T: Transport + ?Sized,
    {
        let requests = self
            .manifest
            .iter()
            .map(|path| {
                FetchRequest::get(&self.assets_origin.join(path))
                    .map_err(|_| LifecycleError::InvalidManifestPath(path.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let entries = try_join_all(requests.into_iter().map(|request| fetch_entry(transport, request)))
            .await?;

        let count = entries.len();
        let handle = self.cache.open(namespace).await?;
        for (key, entry) in entries {
            self.cache.put(&handle, &key, entry).await?;
        }
        Ok(count)
    }

    /// Deletes every namespace that is not reserved by this version.
    ///
    /// Refused unless this version installed successfully. Deletion is
    /// best-effort: a namespace that cannot be removed is logged and
    /// reported, and does not stop the others or the activation.
    pub async fn on_activate(&mut self) -> Result<ActivationReport, LifecycleError> {
        if !matches!(self.phase, Phase::Installed | Phase::Active) {
            return Err(LifecycleError::NotInstalled {
                version: self.version(),
            });
        }

        let reserved = self.policy.reserved_names();
        let existing = self.cache.namespaces().await.unwrap_or_else(|error| {
            warn!(%error, "failed to list namespaces, skipping cleanup");
            BTreeSet::new()
        });

        let mut report = ActivationReport::default();
        for namespace in existing.into_iter().filter(|name| !reserved.contains(name)) {
            match self.cache.delete(&namespace).await {
                Ok(DeleteStatus::Deleted(_)) | Ok(DeleteStatus::Missing) => {
                    debug!(%namespace, "superseded namespace deleted");
                    report.deleted.push(namespace);
                }
                Err(error) => {
                    warn!(%namespace, %error, "failed to delete superseded namespace");
                    report.failed.push(namespace);
                }
            }
        }
        metrics::record_namespaces_deleted(report.deleted.len());

        self.phase = Phase::Active;
        info!(
            version = self.version(),
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "version activated"
        );
        Ok(report)
    }

    /// Marks this version as replaced by a newer active one.
    pub fn supersede(&mut self) {
        if self.phase == Phase::Active {
            self.phase = Phase::Superseded;
        }
    }
}

async fn fetch_entry<T>(
    transport: &T,
    request: FetchRequest,
) -> Result<(RequestKey, CacheEntry), LifecycleError>
where
    T: Transport + ?Sized,
{
    let url = request.uri().to_string();
    let key = request.key();
    let response = transport
        .fetch(request)
        .await
        .map_err(|error| LifecycleError::ManifestInstall {
            url: url.clone(),
            reason: error.to_string(),
        })?;
    if !response.status().is_success() {
        return Err(LifecycleError::ManifestInstall {
            url,
            reason: format!("unexpected status {}", response.status()),
        });
    }
    let entry = response.into_entry(key.clone(), Strategy::CacheFirst);
    Ok((key, entry))
}
