//! Sessions with an HMC.
//!
//! A session is opened in one of three ways:
//!
//! - With a faked HMC: no validation, and the session is never logged off.
//! - With `userid` and `password`: a new HMC session is created and logged
//!   off when the `Session` is closed.
//! - With `session_id`: an existing HMC session is used and left logged on.

use log::debug;
use std::fmt;
use std::sync::Arc;

use crate::auth::HmcAuth;
use zhmc_core::{ClientError, Error, HmcClient, Result};

/// How to authenticate with the HMC.
#[derive(Clone, PartialEq)]
pub enum Credentials {
    /// Create a new session.
    Password {
        /// HMC userid.
        userid: String,
        /// HMC password.
        password: String,
    },
    /// Use an existing session.
    SessionId(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { userid, .. } => f
                .debug_struct("Password")
                .field("userid", userid)
                .field("password", &zhmc_core::utils::BLANKED_OUT)
                .finish(),
            Self::SessionId(_) => f
                .debug_tuple("SessionId")
                .field(&zhmc_core::utils::BLANKED_OUT)
                .finish(),
        }
    }
}

/// Validated parameters for connecting to an HMC.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSpec {
    /// HMC hosts; more than one for redundant HMCs.
    pub hosts: Vec<String>,

    /// Credentials.
    pub credentials: Credentials,

    /// CA certificates for verifying the HMC certificate.
    pub ca_certs: Option<String>,

    /// Verify the HMC certificate.
    pub verify: bool,
}

impl SessionSpec {
    /// Validate the `hmc_auth` parameter.
    ///
    /// Without `session_id`, `userid` and `password` are required. With
    /// `session_id`, they must not be specified.
    pub fn new(hosts: Vec<String>, auth: &HmcAuth) -> Result<Self> {
        const ITEMS: [&str; 2] = ["userid", "password"];
        let given = [auth.userid.as_ref(), auth.password.as_ref()];

        let credentials = match &auth.session_id {
            None => {
                let missing: Vec<&str> = ITEMS
                    .iter()
                    .zip(given)
                    .filter(|(_, v)| v.is_none())
                    .map(|(n, _)| *n)
                    .collect();
                if !missing.is_empty() {
                    return Err(Error::parameter(format!(
                        "Module parameter 'hmc_auth' has no 'session_id' item and therefore \
                         must have items {:?}, but {:?} are missing.",
                        ITEMS, missing
                    )));
                }
                Credentials::Password {
                    userid: auth.userid.clone().unwrap_or_default(),
                    password: auth.password.clone().unwrap_or_default(),
                }
            }
            Some(session_id) => {
                let present: Vec<&str> = ITEMS
                    .iter()
                    .zip(given)
                    .filter(|(_, v)| v.is_some())
                    .map(|(n, _)| *n)
                    .collect();
                if !present.is_empty() {
                    return Err(Error::parameter(format!(
                        "Module parameter 'hmc_auth' has the 'session_id' item and therefore \
                         must not have items {:?}, but {:?} are present.",
                        ITEMS, present
                    )));
                }
                Credentials::SessionId(session_id.clone())
            }
        };

        Ok(Self {
            hosts,
            credentials,
            ca_certs: auth.ca_certs.clone(),
            verify: auth.verify,
        })
    }

    /// Whether the session is owned by the module and must be logged off.
    pub fn owns_session(&self) -> bool {
        matches!(self.credentials, Credentials::Password { .. })
    }
}

/// Establishes HMC client connections.
pub trait Connector: Send + Sync {
    /// Connect to an HMC.
    fn connect(&self, spec: &SessionSpec) -> Result<Arc<dyn HmcClient>>;
}

/// An open session with an HMC.
///
/// Dropping the session logs it off if it is owned by the module.
pub struct Session {
    client: Arc<dyn HmcClient>,
    logoff: bool,
}

impl Session {
    /// Create a session around a client.
    pub fn new(client: Arc<dyn HmcClient>, logoff: bool) -> Self {
        Self { client, logoff }
    }

    /// The HMC client of this session.
    pub fn client(&self) -> &dyn HmcClient {
        self.client.as_ref()
    }

    /// Whether the session is logged off on close.
    pub fn logs_off(&self) -> bool {
        self.logoff
    }

    /// Close the session, logging it off if it is owned by the module.
    ///
    /// Authentication errors during logoff are ignored, since they mean
    /// the session is no longer valid anyway.
    pub fn close(mut self) -> Result<()> {
        self.logoff_once()
    }

    fn logoff_once(&mut self) -> Result<()> {
        if !std::mem::replace(&mut self.logoff, false) {
            return Ok(());
        }
        debug!("Logging off HMC session");
        match self.client.logoff() {
            Err(Error::Client(ClientError::ClientAuth(_))) => Ok(()),
            other => other,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.logoff_once() {
            debug!("Ignoring error during HMC logoff: {}", e);
        }
    }
}

/// Opens sessions, either against a faked HMC or through a `Connector`.
#[derive(Clone, Default)]
pub struct SessionFactory {
    faked: Option<Arc<dyn HmcClient>>,
    connector: Option<Arc<dyn Connector>>,
}

impl SessionFactory {
    /// A factory without any way of reaching an HMC.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory whose sessions all use the given (faked) client.
    pub fn faked(client: Arc<dyn HmcClient>) -> Self {
        Self {
            faked: Some(client),
            connector: None,
        }
    }

    /// A factory connecting to real HMCs through a connector.
    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            faked: None,
            connector: Some(connector),
        }
    }

    /// Whether sessions are opened against a faked HMC.
    pub fn is_faked(&self) -> bool {
        self.faked.is_some()
    }

    /// Open a session.
    ///
    /// # Arguments
    ///
    /// * `hosts` - The parsed `hmc_host` parameter.
    /// * `auth` - The `hmc_auth` parameter.
    ///
    /// # Returns
    ///
    /// The session; a faked session is never logged off.
    pub fn open(&self, hosts: &[String], auth: &HmcAuth) -> Result<Session> {
        if let Some(client) = &self.faked {
            return Ok(Session::new(client.clone(), false));
        }
        let spec = SessionSpec::new(hosts.to_vec(), auth)?;
        let connector = self.connector.as_ref().ok_or_else(|| {
            ClientError::Connection(format!(
                "No HMC connector is available for HMC {:?}",
                spec.hosts
            ))
        })?;
        debug!("Connecting to HMC {:?}", spec.hosts);
        let client = connector.connect(&spec)?;
        let logoff = spec.owns_session();
        Ok(Session::new(client, logoff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faked::FakedHmc;
    use parking_lot::Mutex;

    struct RecordingConnector {
        specs: Mutex<Vec<SessionSpec>>,
        client: Arc<FakedHmc>,
    }

    impl Connector for RecordingConnector {
        fn connect(&self, spec: &SessionSpec) -> Result<Arc<dyn HmcClient>> {
            self.specs.lock().push(spec.clone());
            Ok(self.client.clone())
        }
    }

    fn auth(userid: Option<&str>, password: Option<&str>, session_id: Option<&str>) -> HmcAuth {
        HmcAuth {
            userid: userid.map(str::to_string),
            password: password.map(str::to_string),
            session_id: session_id.map(str::to_string),
            ..HmcAuth::default()
        }
    }

    #[test]
    fn test_missing_password() {
        let err = SessionSpec::new(vec!["hmc".into()], &auth(Some("u"), None, None)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Module parameter 'hmc_auth' has no 'session_id' item and therefore must have \
             items [\"userid\", \"password\"], but [\"password\"] are missing."
        );
    }

    #[test]
    fn test_session_id_excludes_userid() {
        let err = SessionSpec::new(vec!["hmc".into()], &auth(Some("u"), None, Some("sid")))
            .unwrap_err();
        assert!(err.to_string().contains("[\"userid\"] are present"));

        let spec = SessionSpec::new(vec!["hmc".into()], &auth(None, None, Some("sid"))).unwrap();
        assert!(!spec.owns_session());
    }

    #[test]
    fn test_faked_factory_skips_validation() {
        let factory = SessionFactory::faked(Arc::new(FakedHmc::new()));
        let session = factory.open(&[], &HmcAuth::default()).unwrap();
        assert!(!session.logs_off());
    }

    #[test]
    fn test_factory_without_connector() {
        let err = SessionFactory::new()
            .open(&["hmc".into()], &auth(Some("u"), Some("p"), None))
            .err()
            .unwrap();
        assert_eq!(err.class_name(), "ConnectionError");
    }

    #[test]
    fn test_owned_session_is_logged_off() {
        let hmc = Arc::new(FakedHmc::new());
        let connector = Arc::new(RecordingConnector {
            specs: Mutex::new(Vec::new()),
            client: hmc.clone(),
        });
        let factory = SessionFactory::with_connector(connector.clone());

        let session = factory
            .open(&["hmc1".into()], &auth(Some("u"), Some("p"), None))
            .unwrap();
        assert!(session.logs_off());
        session.close().unwrap();
        assert_eq!(hmc.logoff_count(), 1);

        let session = factory
            .open(&["hmc1".into()], &auth(None, None, Some("sid")))
            .unwrap();
        drop(session);
        assert_eq!(hmc.logoff_count(), 1);
        assert_eq!(connector.specs.lock().len(), 2);
    }
}
