//! Secret value buffers.
//!
//! A value is only ever held in buffers that are zeroed when dropped.
//! Copies made inside the D-Bus message buffers are outside our control.
use std::fmt;

use zeroize::{Zeroize, Zeroizing};

/// A secret value returned by `Secret::get_value`.
///
/// May be empty and may contain NUL bytes. `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(Zeroizing<Vec<u8>>);

impl SecretValue {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl AsRef<[u8]> for SecretValue {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Wire form of a value (`ay`), zeroed on drop.
#[derive(serde::Deserialize, serde::Serialize, zvariant::Type)]
pub(crate) struct Payload(Vec<u8>);

impl Payload {
    pub(crate) fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    pub(crate) fn into_value(mut self) -> SecretValue {
        SecretValue::new(std::mem::take(&mut self.0))
    }

    pub(crate) fn into_zeroizing(mut self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(std::mem::take(&mut self.0))
    }
}

impl Drop for Payload {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
