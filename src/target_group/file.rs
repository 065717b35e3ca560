//! File-backed target group registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::reconcile::{AddressSet, Target};
use crate::target_group::{TargetGroupApi, TargetGroupError};

/// Registry document stored per target group.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Registry {
    #[serde(rename = "Targets", default)]
    targets: Vec<Target>,
}

/// Keeps target group membership in `<dir>/<target group>.json`.
#[derive(Debug, Clone)]
pub struct FileTargetGroup {
    dir: PathBuf,
}

impl FileTargetGroup {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target group ids are ARNs; anything outside `[A-Za-z0-9._-]` becomes `_`.
    fn registry_path(&self, target_group: &str) -> PathBuf {
        let file_name: String = target_group
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }

    async fn load(&self, target_group: &str) -> Result<Registry, TargetGroupError> {
        let path = self.registry_path(target_group);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| TargetGroupError::Malformed {
                target_group: target_group.to_string(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Registry::default()),
            Err(source) => Err(TargetGroupError::Io {
                target_group: target_group.to_string(),
                source,
            }),
        }
    }

    async fn save(&self, target_group: &str, registry: &Registry) -> Result<(), TargetGroupError> {
        let io_err = |source| TargetGroupError::Io {
            target_group: target_group.to_string(),
            source,
        };
        let body = serde_json::to_vec_pretty(registry).map_err(|source| TargetGroupError::Malformed {
            target_group: target_group.to_string(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        let path = self.registry_path(target_group);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl TargetGroupApi for FileTargetGroup {
    async fn describe_registered(&self, target_group: &str) -> Result<AddressSet, TargetGroupError> {
        let registry = self.load(target_group).await?;
        Ok(registry.targets.into_iter().map(|t| t.id).collect())
    }

    async fn register(&self, target_group: &str, targets: &[Target]) -> Result<(), TargetGroupError> {
        let mut registry = self.load(target_group).await?;
        for target in targets {
            registry.targets.retain(|t| !t.same_endpoint(target));
            registry.targets.push(target.clone());
        }
        self.save(target_group, &registry).await?;

        tracing::info!(target_group = %target_group, count = targets.len(), "Registered targets");
        Ok(())
    }

    async fn deregister(&self, target_group: &str, targets: &[Target]) -> Result<(), TargetGroupError> {
        let mut registry = self.load(target_group).await?;
        let before = registry.targets.len();
        registry
            .targets
            .retain(|t| !targets.iter().any(|gone| gone.same_endpoint(t)));
        self.save(target_group, &registry).await?;

        tracing::info!(
            target_group = %target_group,
            removed = before - registry.targets.len(),
            "Deregistered targets"
        );
        Ok(())
    }
}
