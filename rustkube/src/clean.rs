use std::io::Read;

use indexmap::IndexMap;

use crate::direct;
pub use crate::direct::{AuthProvider, ClusterSpec, ContextSpec, ExecConfig, ExecEnvVar, UserSpec};

/// A kubeconfig keyed by entity name.
///
/// Maps keep the order in which names first appear in the document. A name that appears
/// twice keeps its first position and takes the body of its last occurrence.
#[derive(Debug, Clone, Default)]
pub struct KubeConfig {
    pub clusters: IndexMap<String, ClusterSpec>,
    pub users: IndexMap<String, UserSpec>,
    pub contexts: IndexMap<String, ContextSpec>,
}

impl From<direct::KubeConfig> for KubeConfig {
    fn from(kc: direct::KubeConfig) -> Self {
        Self {
            clusters: kc
                .clusters
                .into_iter()
                .map(|cls| (cls.name, cls.cluster))
                .collect(),
            users: kc
                .users
                .into_iter()
                .map(|usr| (usr.name, usr.user))
                .collect(),
            contexts: kc
                .contexts
                .into_iter()
                .map(|ctx| (ctx.name, ctx.context))
                .collect(),
        }
    }
}

impl KubeConfig {
    pub fn from_slice(data: &[u8]) -> anyhow::Result<KubeConfig> {
        direct::KubeConfig::from_slice(data).map(KubeConfig::from)
    }

    pub fn from_reader(reader: impl Read) -> anyhow::Result<KubeConfig> {
        direct::KubeConfig::from_reader(reader).map(KubeConfig::from)
    }

    /// Total number of clusters, users and contexts.
    pub fn entity_count(&self) -> usize {
        self.clusters.len() + self.users.len() + self.contexts.len()
    }
}
