//! Client handle of a daemon-side secret.
//!
//! A `Secret` references a secret, it does not own it: releasing the handle
//! leaves the secret on the daemon, and undefining the secret makes every
//! handle to it stale.
use crate::connect::Connect;
use crate::error::{ErrorCode, RemoteError};
use crate::flags::{SecretValueFlags, SecretXmlFlags};
use crate::object;
use crate::usage::UsageType;
use crate::value;

/// Local state of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Live,
    /// The secret was undefined through this handle.
    Stale,
    /// The handle was released.
    Released,
}

#[derive(Debug)]
pub struct Secret {
    connect: Connect,
    path: zvariant::OwnedObjectPath,
    state: State,
}

impl Secret {
    pub(crate) fn new(connect: Connect, path: zvariant::OwnedObjectPath) -> Self {
        Self {
            connect,
            path,
            state: State::Live,
        }
    }

    /// The connection this handle was obtained from.
    pub fn connection(&self) -> &Connect {
        &self.connect
    }

    pub fn state(&self) -> State {
        self.state
    }

    fn ensure_usable(&self, operation: &'static str) -> Result<(), RemoteError> {
        match self.state {
            State::Live => Ok(()),
            State::Stale => Err(RemoteError::new(
                operation,
                ErrorCode::NoSecret,
                format!("secret '{}' has been undefined", self.path.as_str()),
            )),
            State::Released => Err(RemoteError::new(
                operation,
                ErrorCode::InvalidSecret,
                "Secret has been freed",
            )),
        }
    }

    async fn call<B, R>(
        &self,
        operation: &'static str,
        method: &str,
        body: &B,
    ) -> Result<R, RemoteError>
    where
        B: serde::Serialize + zvariant::DynamicType,
        R: serde::de::DeserializeOwned + zvariant::Type,
    {
        self.ensure_usable(operation)?;

        self.connect
            .call(
                operation,
                self.path.as_str(),
                object::SECRET_INTERFACE,
                method,
                body,
            )
            .await
    }

    pub async fn get_uuid_string(&self) -> Result<String, RemoteError> {
        self.call("virSecretGetUUIDString", "GetUUIDString", &())
            .await
    }

    pub async fn get_usage_type(&self) -> Result<UsageType, RemoteError> {
        let raw: i32 = self
            .call("virSecretGetUsageType", "GetUsageType", &())
            .await?;
        Ok(UsageType::from(raw))
    }

    /// Usage id of the secret. Empty for secrets without a usage.
    pub async fn get_usage_id(&self) -> Result<String, RemoteError> {
        self.call("virSecretGetUsageID", "GetUsageID", &()).await
    }

    pub async fn get_xml_desc(&self, flags: SecretXmlFlags) -> Result<String, RemoteError> {
        self.call("virSecretGetXMLDesc", "GetXMLDesc", &(flags.bits()))
            .await
    }

    /// Replace the secret value. `value` may be empty and may contain NUL bytes.
    pub async fn set_value(
        &self,
        value: &[u8],
        flags: SecretValueFlags,
    ) -> Result<(), RemoteError> {
        let payload = value::Payload::from_slice(value);
        self.call("virSecretSetValue", "SetValue", &(&payload, flags.bits()))
            .await
    }

    /// Fetch the secret value.
    ///
    /// Fails with `NoSecret` when the secret has no value. A value set to
    /// zero bytes is returned as an empty `SecretValue`.
    pub async fn get_value(&self, flags: SecretValueFlags) -> Result<value::SecretValue, RemoteError> {
        let payload: value::Payload = self
            .call("virSecretGetValue", "GetValue", &(flags.bits()))
            .await?;
        Ok(payload.into_value())
    }

    /// Remove the secret from the daemon. The handle becomes stale.
    pub async fn undefine(&mut self) -> Result<(), RemoteError> {
        self.call::<_, ()>("virSecretUndefine", "Undefine", &())
            .await?;

        self.state = State::Stale;
        log::debug!("Secret handle for '{}' is stale", self.path.as_str());
        Ok(())
    }

    /// Release local resources of the handle.
    ///
    /// Never contacts the daemon, so it cannot fail, and releasing twice
    /// does nothing. Every later call on the handle fails.
    pub fn release(&mut self) {
        if self.state != State::Released {
            self.state = State::Released;
            log::debug!("Released secret handle for '{}'", self.path.as_str());
        }
    }
}
