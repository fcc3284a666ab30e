//! Client connection to a secret daemon.
//!
//! A `Connect` is cheap to clone. Clones share the underlying D-Bus
//! connection, so they are as thread-safe as `zbus::Connection` is, and
//! closing any of them closes all of them along with every `Secret` they
//! handed out.
use std::sync;
use std::sync::atomic;

use crate::error::{ErrorCode, RemoteError};
use crate::flags::{ListAllSecretsFlags, SecretDefineFlags};
use crate::object;
use crate::secret::Secret;
use crate::server;
use crate::settings;
use crate::store;
use crate::usage::UsageType;

/// URI of a fresh in-process daemon with an empty store.
pub const TEST_URI: &str = "test:///default";
pub const SESSION_URI: &str = "secret:///session";
pub const SYSTEM_URI: &str = "secret:///system";

#[derive(Debug, Clone)]
pub struct Connect {
    connection: zbus::Connection,
    destination: Option<String>,
    uri: String,
    closed: sync::Arc<atomic::AtomicBool>,
    // Keeps an in-process daemon alive for as long as the client.
    _daemon: Option<zbus::Connection>,
}

impl Connect {
    /// Open a connection.
    ///
    /// Accepts `test:///default`, `secret:///session`, `secret:///system`,
    /// or a D-Bus address (`unix:path=…`) of a bus the daemon is on.
    pub async fn open(uri: &str) -> Result<Self, RemoteError> {
        const OPERATION: &str = "virConnectOpen";

        let (connection, destination, daemon) = match uri {
            TEST_URI => {
                let (daemon, connection) = server::in_process(store::SecretStore::default())
                    .await
                    .map_err(|e| RemoteError::new(OPERATION, e.code(), e.to_string()))?;
                (connection, None, Some(daemon))
            }
            SESSION_URI => (
                zbus::Connection::session()
                    .await
                    .map_err(|e| RemoteError::from_zbus(OPERATION, e))?,
                Some(settings::DEFAULT_DBUS_NAME.to_owned()),
                None,
            ),
            SYSTEM_URI => (
                zbus::Connection::system()
                    .await
                    .map_err(|e| RemoteError::from_zbus(OPERATION, e))?,
                Some(settings::DEFAULT_DBUS_NAME.to_owned()),
                None,
            ),
            address if address.contains('=') => {
                let connection = zbus::connection::Builder::address(address)
                    .map_err(|e| RemoteError::from_zbus(OPERATION, e))?
                    .build()
                    .await
                    .map_err(|e| RemoteError::from_zbus(OPERATION, e))?;
                (connection, Some(settings::DEFAULT_DBUS_NAME.to_owned()), None)
            }
            other => {
                return Err(RemoteError::new(
                    OPERATION,
                    ErrorCode::NoConnect,
                    format!("no connection driver available for {}", other),
                ));
            }
        };

        log::debug!("Opened connection to '{uri}'");

        Ok(Self {
            connection,
            destination,
            uri: uri.to_owned(),
            closed: sync::Arc::new(atomic::AtomicBool::new(false)),
            _daemon: daemon,
        })
    }

    /// Wrap an existing D-Bus connection.
    ///
    /// `destination` is the daemon's bus name, or `None` for a peer-to-peer
    /// connection straight to the daemon.
    pub fn from_connection(connection: zbus::Connection, destination: Option<&str>) -> Self {
        Self {
            connection,
            destination: destination.map(str::to_owned),
            uri: destination.unwrap_or("peer").to_owned(),
            closed: sync::Arc::new(atomic::AtomicBool::new(false)),
            _daemon: None,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(atomic::Ordering::Acquire)
    }

    /// Close the connection. Closing an already closed connection does nothing.
    pub async fn close(&self) -> Result<(), RemoteError> {
        if self.closed.swap(true, atomic::Ordering::AcqRel) {
            return Ok(());
        }

        self.connection
            .clone()
            .close()
            .await
            .map_err(|e| RemoteError::from_zbus("virConnectClose", e))?;

        log::debug!("Closed connection to '{}'", self.uri);
        Ok(())
    }

    pub async fn secret_define_xml(
        &self,
        xml: &str,
        flags: SecretDefineFlags,
    ) -> Result<Secret, RemoteError> {
        let path: zvariant::OwnedObjectPath = self
            .call(
                "virSecretDefineXML",
                object::SECRET_ROOT_PATH,
                object::CONNECT_INTERFACE,
                "SecretDefineXML",
                &(xml, flags.bits()),
            )
            .await?;

        Ok(Secret::new(self.clone(), path))
    }

    pub async fn secret_lookup_by_uuid_string(&self, uuid: &str) -> Result<Secret, RemoteError> {
        let path: zvariant::OwnedObjectPath = self
            .call(
                "virSecretLookupByUUIDString",
                object::SECRET_ROOT_PATH,
                object::CONNECT_INTERFACE,
                "SecretLookupByUUIDString",
                &(uuid),
            )
            .await?;

        Ok(Secret::new(self.clone(), path))
    }

    pub async fn secret_lookup_by_usage(
        &self,
        usage_type: UsageType,
        usage_id: &str,
    ) -> Result<Secret, RemoteError> {
        let path: zvariant::OwnedObjectPath = self
            .call(
                "virSecretLookupByUsage",
                object::SECRET_ROOT_PATH,
                object::CONNECT_INTERFACE,
                "SecretLookupByUsage",
                &(usage_type.as_raw(), usage_id),
            )
            .await?;

        Ok(Secret::new(self.clone(), path))
    }

    pub async fn list_all_secrets(
        &self,
        flags: ListAllSecretsFlags,
    ) -> Result<Vec<Secret>, RemoteError> {
        let paths: Vec<zvariant::OwnedObjectPath> = self
            .call(
                "virConnectListAllSecrets",
                object::SECRET_ROOT_PATH,
                object::CONNECT_INTERFACE,
                "ListAllSecrets",
                &(flags.bits()),
            )
            .await?;

        Ok(paths
            .into_iter()
            .map(|path| Secret::new(self.clone(), path))
            .collect())
    }

    pub async fn num_of_secrets(&self) -> Result<usize, RemoteError> {
        const OPERATION: &str = "virConnectNumOfSecrets";

        let count: i32 = self
            .call(
                OPERATION,
                object::SECRET_ROOT_PATH,
                object::CONNECT_INTERFACE,
                "NumOfSecrets",
                &(),
            )
            .await?;

        usize::try_from(count).map_err(|_| {
            RemoteError::new(OPERATION, ErrorCode::Rpc, format!("invalid count {}", count))
        })
    }

    /// UUIDs of at most `max` secrets.
    pub async fn list_secrets(&self, max: usize) -> Result<Vec<String>, RemoteError> {
        let max = i32::try_from(max).unwrap_or(i32::MAX);

        self.call(
            "virConnectListSecrets",
            object::SECRET_ROOT_PATH,
            object::CONNECT_INTERFACE,
            "ListSecrets",
            &(max),
        )
        .await
    }

    pub(crate) fn ensure_open(&self, operation: &'static str) -> Result<(), RemoteError> {
        if self.is_closed() {
            Err(RemoteError::new(
                operation,
                ErrorCode::InvalidConn,
                "connection has been closed",
            ))
        } else {
            Ok(())
        }
    }

    /// Make one method call on the daemon and decode its reply body.
    pub(crate) async fn call<B, R>(
        &self,
        operation: &'static str,
        path: &str,
        interface: &str,
        method: &str,
        body: &B,
    ) -> Result<R, RemoteError>
    where
        B: serde::Serialize + zvariant::DynamicType,
        R: serde::de::DeserializeOwned + zvariant::Type,
    {
        self.ensure_open(operation)?;

        let reply = self
            .connection
            .call_method(
                self.destination.as_deref(),
                path,
                Some(interface),
                method,
                body,
            )
            .await
            .map_err(|e| RemoteError::from_zbus(operation, e))?;

        reply
            .body()
            .deserialize::<R>()
            .map_err(|e| RemoteError::from_zbus(operation, e))
    }
}
