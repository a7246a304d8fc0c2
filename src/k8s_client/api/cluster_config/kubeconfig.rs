use super::error::ClusterConfigError;
use serde::Deserialize;
use std::{
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
};
use tracing::debug;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct Kubeconfig {
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context", default)]
    pub current_context: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Cluster {
    pub server: String,
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: Option<String>,
    #[serde(rename = "certificate-authority")]
    pub certificate_authority: Option<String>,
    #[serde(rename = "insecure-skip-tls-verify", default)]
    pub insecure_skip_tls_verify: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: User,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct User {
    #[serde(rename = "client-certificate-data")]
    pub client_certificate_data: Option<String>,
    #[serde(rename = "client-key-data")]
    pub client_key_data: Option<String>,
    #[serde(rename = "client-certificate")]
    pub client_certificate: Option<String>,
    #[serde(rename = "client-key")]
    pub client_key: Option<String>,
    pub token: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: Context,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Context {
    pub cluster: String,
    pub user: String,
}

impl Kubeconfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Kubeconfig, ClusterConfigError> {
        let file = fs::File::open(path.as_ref()).map_err(|err| ClusterConfigError::FileOpen {
            path: path.as_ref().into(),
            err,
        })?;
        let kubeconfig: Kubeconfig =
            serde_yaml::from_reader(file).map_err(|err| ClusterConfigError::FileDeserialize {
                path: path.as_ref().into(),
                err,
            })?;
        Ok(kubeconfig)
    }

    pub fn from_default_path() -> Option<Result<Kubeconfig, ClusterConfigError>> {
        let homedir = dirs::home_dir()?;
        let path = homedir.join(".kube").join("config");
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) => match err.kind() {
                io::ErrorKind::NotFound => return None,
                _ => return Some(Err(ClusterConfigError::FileOpen { path, err })),
            },
        };
        Some(serde_yaml::from_reader(file).map_err(|err| ClusterConfigError::FileDeserialize { path, err }))
    }

    /// `$KUBECONFIG` may list several files; only the first one is read,
    /// the others are not merged.
    pub fn from_env() -> Option<Result<Self, ClusterConfigError>> {
        let paths = std::env::var_os("KUBECONFIG")?;
        Some(Self::from_path(first_path(&paths)?))
    }

    /// Resolves a context by name, falling back to `current-context`.
    pub fn resolve(&self, context: Option<&str>) -> Result<(&Cluster, &NamedUser), ClusterConfigError> {
        let context_name = context.unwrap_or(&self.current_context);
        let context = &self
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .ok_or_else(|| ClusterConfigError::MissingContext(context_name.to_string()))?
            .context;
        let cluster = &self
            .clusters
            .iter()
            .find(|c| c.name == context.cluster)
            .ok_or_else(|| ClusterConfigError::MissingCluster(context.cluster.clone()))?
            .cluster;
        let user = self
            .users
            .iter()
            .find(|u| u.name == context.user)
            .ok_or_else(|| ClusterConfigError::MissingUser(context.user.clone()))?;
        Ok((cluster, user))
    }
}

fn first_path(paths: &OsStr) -> Option<PathBuf> {
    let mut paths = std::env::split_paths(paths).filter(|path| !path.as_os_str().is_empty());
    let first = paths.next()?;
    for skipped in paths {
        debug!(path = %skipped.display(), "ignoring additional kubeconfig from $KUBECONFIG");
    }
    Some(first)
}
