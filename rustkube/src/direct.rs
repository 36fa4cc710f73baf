use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;

use anyhow::Context as _;
use serde::*;

/// Treats an explicit `null` the same as a missing key.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// region: Context
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ContextSpec {
    #[serde(deserialize_with = "nullable")]
    pub cluster: String,
    #[serde(deserialize_with = "nullable")]
    pub user: String,
    pub namespace: Option<String>,
}
#[derive(Deserialize, Debug)]
pub struct Context {
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub context: ContextSpec,
}
// endregion

// region: Cluster
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClusterSpec {
    #[serde(deserialize_with = "nullable")]
    pub server: String,
    pub certificate_authority: Option<PathBuf>,
    pub certificate_authority_data: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub insecure_skip_tls_verify: bool,
    pub tls_server_name: Option<String>,
    pub proxy_url: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Cluster {
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub cluster: ClusterSpec,
}
// endregion

// region: User
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AuthProvider {
    pub name: String,
    /// Sorted so that `--auth-provider-arg` flags come out in a stable order.
    #[serde(default, deserialize_with = "nullable")]
    pub config: BTreeMap<String, String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ExecEnvVar {
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub value: String,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecConfig {
    #[serde(deserialize_with = "nullable")]
    pub command: String,
    pub api_version: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub args: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub env: Vec<ExecEnvVar>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserSpec {
    pub client_certificate: Option<PathBuf>,
    pub client_certificate_data: Option<String>,
    pub client_key: Option<PathBuf>,
    pub client_key_data: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_provider: Option<AuthProvider>,
    pub exec: Option<ExecConfig>,
}

#[derive(Deserialize, Debug)]
pub struct User {
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub user: UserSpec,
}
// endregion

// region: Common
/// A kubeconfig document as it appears on disk: every collection is a list of named items.
/// Keys other than the three collections are ignored.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct KubeConfig {
    #[serde(deserialize_with = "nullable")]
    pub clusters: Vec<Cluster>,
    #[serde(deserialize_with = "nullable")]
    pub users: Vec<User>,
    #[serde(deserialize_with = "nullable")]
    pub contexts: Vec<Context>,
}

impl KubeConfig {
    pub fn from_slice(data: &[u8]) -> anyhow::Result<KubeConfig> {
        // serde_yaml rejects an empty stream, kubectl treats it as an empty config
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(KubeConfig::default());
        }
        serde_yaml::from_slice(data).context("Parsing kube config")
    }

    pub fn from_reader(mut reader: impl Read) -> anyhow::Result<KubeConfig> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .context("Reading kube config")?;
        KubeConfig::from_slice(&data)
    }
}
// endregion
