//! Implementation of the `org.libvirt.Connect` D-Bus interface.
//!
//! The connect-level calls of the secret driver: defining secrets, looking
//! them up, and listing them. Each defined secret is served as its own
//! `org.libvirt.Secret` object.
use crate::error;
use crate::flags::{ListAllSecretsFlags, SecretDefineFlags};
use crate::object::secret;
use crate::object::DbusObject;
use crate::store;
use crate::usage::{Usage, UsageType};
use crate::xml::SecretDef;

#[derive(Debug)]
pub struct SecretDriver {
    store: store::SharedStore,
}

impl SecretDriver {
    pub fn new(store: store::SharedStore) -> Self {
        Self { store }
    }
}

impl DbusObject for SecretDriver {
    fn get_object_path(&self) -> zvariant::OwnedObjectPath {
        zvariant::ObjectPath::from_str_unchecked(crate::object::SECRET_ROOT_PATH).into()
    }
}

#[zbus::interface(name = "org.libvirt.Connect")]
impl SecretDriver {
    /// SecretDefineXML method
    #[zbus(name = "SecretDefineXML")]
    async fn secret_define_xml(
        &self,
        xml: &str,
        flags: u32,
        #[zbus(object_server)] object_server: &zbus::ObjectServer,
    ) -> Result<zvariant::OwnedObjectPath, error::Error> {
        let flags = SecretDefineFlags::check(flags)?;
        let def = SecretDef::parse(xml, flags.contains(SecretDefineFlags::VALIDATE))?;
        let id = def.uuid;

        let is_new = self.store.write().await.define(def)?;

        let (secret_path, _) = secret::Secret::new(id, self.store.clone())
            .serve_at(object_server)
            .await?;

        if is_new {
            log::info!("Defined new secret on '{secret_path}'");
        } else {
            log::info!("Redefined secret on '{secret_path}'");
        }

        Ok(secret_path)
    }

    /// SecretLookupByUUIDString method
    #[zbus(name = "SecretLookupByUUIDString")]
    async fn secret_lookup_by_uuid_string(
        &self,
        uuid: &str,
    ) -> Result<zvariant::OwnedObjectPath, error::Error> {
        let id = self.store.read().await.lookup_by_uuid_string(uuid)?;
        Ok(crate::object::secret_path(&id))
    }

    /// SecretLookupByUsage method
    #[zbus(name = "SecretLookupByUsage")]
    async fn secret_lookup_by_usage(
        &self,
        usage_type: i32,
        usage_id: &str,
    ) -> Result<zvariant::OwnedObjectPath, error::Error> {
        let usage = Usage::new(UsageType::from(usage_type), usage_id);
        let id = self.store.read().await.lookup_by_usage(&usage)?;
        Ok(crate::object::secret_path(&id))
    }

    /// ListAllSecrets method
    #[zbus(name = "ListAllSecrets")]
    async fn list_all_secrets(
        &self,
        flags: u32,
    ) -> Result<Vec<zvariant::OwnedObjectPath>, error::Error> {
        let flags = ListAllSecretsFlags::check(flags)?;

        Ok(self
            .store
            .read()
            .await
            .list(flags)
            .iter()
            .map(crate::object::secret_path)
            .collect())
    }

    /// NumOfSecrets method
    #[zbus(name = "NumOfSecrets")]
    async fn num_of_secrets(&self) -> i32 {
        i32::try_from(self.store.read().await.len()).unwrap_or(i32::MAX)
    }

    /// ListSecrets method
    #[zbus(name = "ListSecrets")]
    async fn list_secrets(&self, maxuuids: i32) -> Result<Vec<String>, error::Error> {
        let max = usize::try_from(maxuuids).map_err(|_| error::Error::NegativeCount(maxuuids))?;

        Ok(self
            .store
            .read()
            .await
            .list(ListAllSecretsFlags::empty())
            .iter()
            .take(max)
            .map(|id| id.hyphenated().to_string())
            .collect())
    }
}
