mod error;
mod kubeconfig;

pub use error::ClusterConfigError;
pub use kubeconfig::Kubeconfig;
use reqwest::{header::HeaderValue, Certificate, Identity};
use std::{
    fs,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};
use ClusterConfigError as Error;

pub enum AuthMethod {
    Identity(Identity),
    Token(HeaderValue),
    Anonymous,
}

/// Where the API server lives and how to talk to it.
pub struct ClusterConfig {
    pub server: String,
    pub cacert: Option<Certificate>,
    pub auth: AuthMethod,
    pub insecure: bool,
}

impl ClusterConfig {
    /// Unauthenticated plain access, e.g. through `kubectl proxy`.
    pub fn anonymous<S: Into<String>>(server: S) -> Self {
        Self {
            server: server.into(),
            cacert: None,
            auth: AuthMethod::Anonymous,
            insecure: false,
        }
    }

    pub fn in_cluster() -> Option<Result<Self, Error>> {
        const TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
        const CACERT_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

        let token = match fs::File::open(TOKEN_PATH) {
            Ok(file) => file,
            Err(err) => match err.kind() {
                io::ErrorKind::NotFound => return None,
                _ => {
                    return Some(Err(Error::FileOpen {
                        path: TOKEN_PATH.into(),
                        err,
                    }))
                }
            },
        };
        return Some(in_cluster_inner(token));

        fn in_cluster_inner(token_file: fs::File) -> Result<ClusterConfig, Error> {
            let cacert = read_file(Path::new(CACERT_PATH))?;
            let mut token = String::new();
            BufReader::new(token_file)
                .read_to_string(&mut token)
                .map_err(|err| Error::FileRead {
                    path: TOKEN_PATH.into(),
                    err,
                })?;
            Ok(ClusterConfig {
                auth: bearer(&token)?,
                cacert: Some(Certificate::from_pem(&cacert).map_err(Error::Certificate)?),
                server: "https://kubernetes.default.svc:443".into(),
                insecure: false,
            })
        }
    }

    pub fn from_kubeconfig(k: &Kubeconfig, context: Option<&str>) -> Result<Self, Error> {
        let (cluster, user) = k.resolve(context)?;

        let cacert = match (&cluster.certificate_authority_data, &cluster.certificate_authority) {
            (Some(data), _) => Some(base64::decode(data).map_err(Error::InvalidBase64Cacert)?),
            (None, Some(path)) => Some(read_file(Path::new(path))?),
            (None, None) => None,
        };
        let cacert = match cacert {
            Some(pem) => Some(Certificate::from_pem(&pem).map_err(Error::Certificate)?),
            None => None,
        };

        let cert = match (&user.user.client_certificate_data, &user.user.client_certificate) {
            (Some(data), _) => Some(base64::decode(data).map_err(Error::InvalidBase64Cert)?),
            (None, Some(path)) => Some(read_file(Path::new(path))?),
            (None, None) => None,
        };
        let auth = match (cert, &user.user.token) {
            (Some(cert), _) => {
                let mut pem = match (&user.user.client_key_data, &user.user.client_key) {
                    (Some(data), _) => base64::decode(data).map_err(Error::InvalidBase64Key)?,
                    (None, Some(path)) => read_file(Path::new(path))?,
                    (None, None) => return Err(Error::IncompleteIdentity(user.name.clone())),
                };
                // rustls wants key and certificate in one PEM bundle
                pem.push(b'\n');
                pem.extend_from_slice(&cert);
                AuthMethod::Identity(Identity::from_pem(&pem).map_err(Error::Identity)?)
            }
            (None, Some(token)) => bearer(token)?,
            (None, None) => AuthMethod::Anonymous,
        };

        Ok(Self {
            server: cluster.server.clone(),
            cacert,
            auth,
            insecure: cluster.insecure_skip_tls_verify,
        })
    }

    /// Explicit kubeconfig path, then `$KUBECONFIG`, then the in-cluster
    /// service account, then `~/.kube/config`.
    pub fn detect(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Self, Error> {
        if let Some(path) = kubeconfig {
            return Self::from_kubeconfig(&Kubeconfig::from_path(path)?, context);
        }
        let cc = match Kubeconfig::from_env() {
            Some(r) => Self::from_kubeconfig(&r?, context)?,
            None => match Self::in_cluster() {
                Some(cc) => cc?,
                None => match Kubeconfig::from_default_path() {
                    Some(r) => Self::from_kubeconfig(&r?, context)?,
                    None => return Err(Error::Detect),
                },
            },
        };
        Ok(cc)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    let path: PathBuf = path.into();
    let file = fs::File::open(&path).map_err(|err| Error::FileOpen {
        path: path.clone(),
        err,
    })?;
    let mut buf = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut buf)
        .map_err(|err| Error::FileRead { path, err })?;
    Ok(buf)
}

fn bearer(token: &str) -> Result<AuthMethod, Error> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim())).map_err(Error::InvalidToken)?;
    value.set_sensitive(true);
    Ok(AuthMethod::Token(value))
}
