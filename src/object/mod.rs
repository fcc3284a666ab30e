pub mod driver;
pub mod secret;

use crate::error;

/// Object path of the `org.libvirt.Connect` object.
pub const SECRET_ROOT_PATH: &str = "/org/libvirt/secret";
pub const CONNECT_INTERFACE: &str = "org.libvirt.Connect";
pub const SECRET_INTERFACE: &str = "org.libvirt.Secret";

/// Object path of the secret with the given UUID.
pub fn secret_path(id: &uuid::Uuid) -> zvariant::OwnedObjectPath {
    let mut object_path = SECRET_ROOT_PATH.to_owned();

    object_path.push('/');
    object_path.push_str(
        id.as_simple()
            .encode_lower(&mut uuid::Uuid::encode_buffer()),
    );

    zvariant::ObjectPath::from_str_unchecked(&object_path).into()
}

pub trait DbusObject: zbus::object_server::Interface {
    fn get_object_path(&self) -> zvariant::OwnedObjectPath;

    /// Serve the object at its path. Returns `false` if something is
    /// already served there, in which case the existing object is kept.
    fn serve_at(
        self,
        object_server: &zbus::ObjectServer,
    ) -> impl std::future::Future<Output = Result<(zvariant::OwnedObjectPath, bool), error::Error>> + Send
    where
        Self: Sized,
    {
        async {
            let object_path = self.get_object_path();
            let is_new = object_server.at(object_path.clone(), self).await?;
            Ok((object_path, is_new))
        }
    }

    fn remove(
        &self,
        object_server: &zbus::ObjectServer,
    ) -> impl std::future::Future<Output = Result<bool, error::Error>> + Send
    where
        Self: Sized,
    {
        async {
            let object_path = self.get_object_path();
            Ok(object_server
                .remove::<Self, zvariant::OwnedObjectPath>(object_path)
                .await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_path_uses_simple_uuid() {
        let id = uuid::Uuid::parse_str("c9f2b8f0-3b1c-4b6e-9a57-3f1f5d1d7a10").unwrap();

        assert_eq!(
            secret_path(&id).as_str(),
            "/org/libvirt/secret/c9f2b8f03b1c4b6e9a573f1f5d1d7a10"
        );
    }
}
