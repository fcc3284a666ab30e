//! Implementation of the `org.libvirt.Secret` D-Bus interface.
use crate::error;
use crate::flags::{SecretValueFlags, SecretXmlFlags};
use crate::object::DbusObject;
use crate::store;
use crate::value;

#[derive(Debug)]
pub struct Secret {
    id: uuid::Uuid,
    store: store::SharedStore,
}

impl DbusObject for Secret {
    fn get_object_path(&self) -> zvariant::OwnedObjectPath {
        crate::object::secret_path(&self.id)
    }
}

impl Secret {
    pub fn new(id: uuid::Uuid, store: store::SharedStore) -> Self {
        Self { id, store }
    }
}

#[zbus::interface(name = "org.libvirt.Secret")]
impl Secret {
    /// GetUUIDString method
    #[zbus(name = "GetUUIDString")]
    async fn get_uuid_string(&self) -> Result<String, error::Error> {
        let store = self.store.read().await;
        let secret = store.get(&self.id)?;
        Ok(secret.def.uuid.hyphenated().to_string())
    }

    /// GetUsageType method
    #[zbus(name = "GetUsageType")]
    async fn get_usage_type(&self) -> Result<i32, error::Error> {
        let store = self.store.read().await;
        let secret = store.get(&self.id)?;
        Ok(secret.def.usage_type().as_raw())
    }

    /// GetUsageID method
    #[zbus(name = "GetUsageID")]
    async fn get_usage_id(&self) -> Result<String, error::Error> {
        let store = self.store.read().await;
        let secret = store.get(&self.id)?;
        Ok(secret.def.usage_id().to_owned())
    }

    /// GetXMLDesc method
    #[zbus(name = "GetXMLDesc")]
    async fn get_xml_desc(&self, flags: u32) -> Result<String, error::Error> {
        SecretXmlFlags::check(flags)?;

        let store = self.store.read().await;
        let secret = store.get(&self.id)?;
        secret.def.format()
    }

    /// SetValue method
    #[zbus(name = "SetValue")]
    async fn set_value(&self, value: value::Payload, flags: u32) -> Result<(), error::Error> {
        SecretValueFlags::check(flags)?;

        self.store
            .write()
            .await
            .set_value(&self.id, value.into_zeroizing())?;

        log::debug!("Set value of secret on '{}'", self.get_object_path());
        Ok(())
    }

    /// GetValue method
    #[zbus(name = "GetValue")]
    async fn get_value(&self, flags: u32) -> Result<value::Payload, error::Error> {
        SecretValueFlags::check(flags)?;

        let value = self.store.read().await.get_value(&self.id)?;
        Ok(value::Payload::from_slice(&value))
    }

    /// Undefine method
    #[zbus(name = "Undefine")]
    async fn undefine(
        &self,
        #[zbus(object_server)] object_server: &zbus::ObjectServer,
    ) -> Result<(), error::Error> {
        self.store.write().await.undefine(&self.id)?;

        self.remove(object_server).await?;

        let secret_path = self.get_object_path();
        log::info!("Undefined secret on '{secret_path}'");

        Ok(())
    }
}
