//! In-memory secret table of the daemon.
//!
//! Enforces libvirt's rules for defining secrets: one secret per usage,
//! redefinitions keep their usage and value, and a private secret stays
//! private.
use std::collections;
use std::sync;

use zeroize::Zeroizing;

use crate::error;
use crate::flags::ListAllSecretsFlags;
use crate::usage::{Usage, UsageType};
use crate::xml::SecretDef;

/// Largest value accepted by `set_value`, matching libvirt's RPC limit.
pub const DEFAULT_MAX_VALUE_LEN: usize = 65536;

/// Store handle shared by the daemon's D-Bus objects.
pub type SharedStore = sync::Arc<tokio::sync::RwLock<SecretStore>>;

#[derive(Debug)]
pub struct StoredSecret {
    pub def: SecretDef,
    value: Option<Zeroizing<Vec<u8>>>,
}

impl StoredSecret {
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug)]
pub struct SecretStore {
    secrets: collections::BTreeMap<uuid::Uuid, StoredSecret>,
    max_value_len: usize,
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VALUE_LEN)
    }
}

impl SecretStore {
    pub fn new(max_value_len: usize) -> Self {
        Self {
            secrets: collections::BTreeMap::new(),
            max_value_len,
        }
    }

    pub fn shared(self) -> SharedStore {
        sync::Arc::new(tokio::sync::RwLock::new(self))
    }

    /// Define a new secret or redefine an existing one with the same UUID.
    ///
    /// Returns whether the UUID was new.
    pub fn define(&mut self, def: SecretDef) -> Result<bool, error::Error> {
        if let Some(usage) = def.usage.as_ref() {
            if let Some(other) = self.find_by_usage(usage) {
                if other != def.uuid {
                    return Err(error::Error::UsageInUse {
                        uuid: other.hyphenated().to_string(),
                        usage: usage.to_string(),
                    });
                }
            }
        }

        match self.secrets.get_mut(&def.uuid) {
            Some(existing) => {
                if existing.def.usage != def.usage {
                    return Err(error::Error::UsageInUse {
                        uuid: def.uuid.hyphenated().to_string(),
                        usage: existing
                            .def
                            .usage
                            .as_ref()
                            .map(|usage| usage.to_string())
                            .unwrap_or_else(|| UsageType::None.to_string()),
                    });
                }
                if existing.def.private && !def.private {
                    return Err(error::Error::PrivateFlagChange(
                        def.uuid.hyphenated().to_string(),
                    ));
                }
                existing.def = def;
                Ok(false)
            }
            None => {
                self.secrets
                    .insert(def.uuid, StoredSecret { def, value: None });
                Ok(true)
            }
        }
    }

    pub fn get(&self, uuid: &uuid::Uuid) -> Result<&StoredSecret, error::Error> {
        self.secrets
            .get(uuid)
            .ok_or_else(|| error::Error::NoSecretWithUuid(uuid.hyphenated().to_string()))
    }

    pub fn lookup_by_uuid_string(&self, uuid: &str) -> Result<uuid::Uuid, error::Error> {
        let parsed = uuid::Uuid::parse_str(uuid)
            .map_err(|_| error::Error::InvalidUuid(uuid.to_owned()))?;
        self.get(&parsed)?;
        Ok(parsed)
    }

    pub fn lookup_by_usage(&self, usage: &Usage) -> Result<uuid::Uuid, error::Error> {
        self.find_by_usage(usage)
            .ok_or_else(|| error::Error::NoSecretWithUsage(usage.id.clone()))
    }

    fn find_by_usage(&self, usage: &Usage) -> Option<uuid::Uuid> {
        if usage.kind == UsageType::None {
            return None;
        }

        self.secrets
            .values()
            .find(|secret| secret.def.usage.as_ref() == Some(usage))
            .map(|secret| secret.def.uuid)
    }

    pub fn set_value(
        &mut self,
        uuid: &uuid::Uuid,
        value: Zeroizing<Vec<u8>>,
    ) -> Result<(), error::Error> {
        if value.len() > self.max_value_len {
            return Err(error::Error::ValueTooLarge {
                len: value.len(),
                max: self.max_value_len,
            });
        }

        let secret = self
            .secrets
            .get_mut(uuid)
            .ok_or_else(|| error::Error::NoSecretWithUuid(uuid.hyphenated().to_string()))?;
        secret.value = Some(value);
        Ok(())
    }

    /// Copy of the secret value.
    ///
    /// A secret that never had a value set is an error, unlike a secret
    /// whose value was set to zero bytes.
    pub fn get_value(&self, uuid: &uuid::Uuid) -> Result<Zeroizing<Vec<u8>>, error::Error> {
        let secret = self.get(uuid)?;

        if secret.def.private {
            return Err(error::Error::SecretIsPrivate);
        }

        secret
            .value
            .clone()
            .ok_or_else(|| error::Error::NoValue(uuid.hyphenated().to_string()))
    }

    pub fn undefine(&mut self, uuid: &uuid::Uuid) -> Result<(), error::Error> {
        // Dropping the entry zeroes its value.
        self.secrets
            .remove(uuid)
            .map(|_| ())
            .ok_or_else(|| error::Error::NoSecretWithUuid(uuid.hyphenated().to_string()))
    }

    /// UUIDs of the secrets passing `flags`, in ascending order.
    pub fn list(&self, flags: ListAllSecretsFlags) -> Vec<uuid::Uuid> {
        self.secrets
            .values()
            .filter(|secret| flags.matches(secret.def.ephemeral, secret.def.private))
            .map(|secret| secret.def.uuid)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume_def(uuid: &str, volume: &str) -> SecretDef {
        SecretDef {
            uuid: uuid::Uuid::parse_str(uuid).unwrap(),
            ephemeral: false,
            private: false,
            description: None,
            usage: Some(Usage::new(UsageType::Volume, volume)),
        }
    }

    const FIRST: &str = "0a81f5b2-8403-7b23-c8d6-21ccc2f80d6f";
    const SECOND: &str = "5d1f1e2c-3a3e-4c4f-8f3a-6d2b7a9e0c11";

    #[test]
    fn test_define_and_lookup() {
        let mut store = SecretStore::default();
        assert!(store.define(volume_def(FIRST, "pool/vol1")).unwrap());

        let uuid = store.lookup_by_uuid_string(FIRST).unwrap();
        assert_eq!(uuid.hyphenated().to_string(), FIRST);

        let by_usage = store
            .lookup_by_usage(&Usage::new(UsageType::Volume, "pool/vol1"))
            .unwrap();
        assert_eq!(by_usage, uuid);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lookup_failures() {
        let store = SecretStore::default();

        let error = store.lookup_by_uuid_string(FIRST).unwrap_err();
        assert_eq!(error.code(), error::ErrorCode::NoSecret);

        let error = store.lookup_by_uuid_string("nope").unwrap_err();
        assert_eq!(error.code(), error::ErrorCode::InvalidArg);

        let error = store
            .lookup_by_usage(&Usage::new(UsageType::Ceph, "client.admin"))
            .unwrap_err();
        assert_eq!(error.to_string(), "no secret with matching usage 'client.admin'");
    }

    #[test]
    fn test_define_rejects_usage_in_use() {
        let mut store = SecretStore::default();
        store.define(volume_def(FIRST, "pool/vol1")).unwrap();

        let error = store.define(volume_def(SECOND, "pool/vol1")).unwrap_err();
        assert_eq!(error.code(), error::ErrorCode::InternalError);
        assert!(error.to_string().contains(FIRST));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_redefine_rejects_usage_change() {
        let mut store = SecretStore::default();
        store.define(volume_def(FIRST, "pool/vol1")).unwrap();

        let error = store.define(volume_def(FIRST, "pool/vol2")).unwrap_err();
        assert!(error.to_string().contains("volume pool/vol1"));
    }

    #[test]
    fn test_redefine_keeps_value() {
        let mut store = SecretStore::default();
        store.define(volume_def(FIRST, "pool/vol1")).unwrap();
        let uuid = store.lookup_by_uuid_string(FIRST).unwrap();
        store
            .set_value(&uuid, Zeroizing::new(b"hunter2".to_vec()))
            .unwrap();

        let mut redefined = volume_def(FIRST, "pool/vol1");
        redefined.description = Some("rotated".to_owned());
        assert!(!store.define(redefined).unwrap());

        assert_eq!(store.get_value(&uuid).unwrap().as_slice(), b"hunter2");
        assert_eq!(
            store.get(&uuid).unwrap().def.description.as_deref(),
            Some("rotated")
        );
    }

    #[test]
    fn test_redefine_cannot_clear_private() {
        let mut store = SecretStore::default();
        let mut def = volume_def(FIRST, "pool/vol1");
        def.private = true;
        store.define(def).unwrap();

        let error = store.define(volume_def(FIRST, "pool/vol1")).unwrap_err();
        assert_eq!(error.code(), error::ErrorCode::InvalidSecret);
    }

    #[test]
    fn test_usage_none_never_conflicts() {
        let mut store = SecretStore::default();
        let mut first = volume_def(FIRST, "unused");
        first.usage = None;
        let mut second = volume_def(SECOND, "unused");
        second.usage = None;

        store.define(first).unwrap();
        store.define(second).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_value_never_set_is_distinct_from_empty_value() {
        let mut store = SecretStore::default();
        store.define(volume_def(FIRST, "pool/vol1")).unwrap();
        let uuid = store.lookup_by_uuid_string(FIRST).unwrap();

        let error = store.get_value(&uuid).unwrap_err();
        assert_eq!(error.code(), error::ErrorCode::NoSecret);
        assert!(!store.get(&uuid).unwrap().has_value());

        store.set_value(&uuid, Zeroizing::new(Vec::new())).unwrap();
        assert!(store.get_value(&uuid).unwrap().is_empty());
        assert!(store.get(&uuid).unwrap().has_value());
    }

    #[test]
    fn test_private_secret_refuses_get_value() {
        let mut store = SecretStore::default();
        let mut def = volume_def(FIRST, "pool/vol1");
        def.private = true;
        store.define(def).unwrap();
        let uuid = store.lookup_by_uuid_string(FIRST).unwrap();
        store.set_value(&uuid, Zeroizing::new(b"x".to_vec())).unwrap();

        let error = store.get_value(&uuid).unwrap_err();
        assert_eq!(error.to_string(), "secret is private");
    }

    #[test]
    fn test_set_value_rejects_oversized_value() {
        let mut store = SecretStore::new(4);
        store.define(volume_def(FIRST, "pool/vol1")).unwrap();
        let uuid = store.lookup_by_uuid_string(FIRST).unwrap();

        let error = store
            .set_value(&uuid, Zeroizing::new(vec![0; 5]))
            .unwrap_err();
        assert_eq!(error.code(), error::ErrorCode::InvalidArg);
        store.set_value(&uuid, Zeroizing::new(vec![0; 4])).unwrap();
    }

    #[test]
    fn test_undefine_removes_secret() {
        let mut store = SecretStore::default();
        store.define(volume_def(FIRST, "pool/vol1")).unwrap();
        let uuid = store.lookup_by_uuid_string(FIRST).unwrap();

        store.undefine(&uuid).unwrap();

        assert!(store.is_empty());
        assert_eq!(
            store.get_value(&uuid).unwrap_err().code(),
            error::ErrorCode::NoSecret
        );
        assert_eq!(
            store.undefine(&uuid).unwrap_err().code(),
            error::ErrorCode::NoSecret
        );
    }

    #[test]
    fn test_list_filters_and_orders() {
        let mut store = SecretStore::default();
        let mut ephemeral = volume_def(SECOND, "pool/vol2");
        ephemeral.ephemeral = true;
        store.define(ephemeral).unwrap();
        store.define(volume_def(FIRST, "pool/vol1")).unwrap();

        let all = store.list(ListAllSecretsFlags::empty());
        let all: Vec<String> = all.iter().map(|uuid| uuid.hyphenated().to_string()).collect();
        assert_eq!(all, vec![FIRST.to_owned(), SECOND.to_owned()]);

        let only_ephemeral = store.list(ListAllSecretsFlags::EPHEMERAL);
        assert_eq!(only_ephemeral.len(), 1);
        assert_eq!(only_ephemeral[0].hyphenated().to_string(), SECOND);

        assert_eq!(store.list(ListAllSecretsFlags::PRIVATE).len(), 0);
    }
}
