//! Client and daemon for libvirt secret objects over D-Bus.
//!
//! A [`Connect`] is opened from a URI and hands out [`Secret`] handles. Each
//! handle forwards its calls to the daemon that owns the secret; values are
//! fetched and stored on demand and never cached in the handle.
//!
//! ```no_run
//! # async fn demo() -> Result<(), virt_secret::RemoteError> {
//! use virt_secret::{Connect, SecretDefineFlags, SecretValueFlags};
//!
//! let connect = Connect::open("test:///default").await?;
//! let mut secret = connect
//!     .secret_define_xml(
//!         "<secret><usage type='volume'><volume>pool/vol1</volume></usage></secret>",
//!         SecretDefineFlags::empty(),
//!     )
//!     .await?;
//! secret.set_value(b"s3cr3t\x00pad", SecretValueFlags::empty()).await?;
//! let value = secret.get_value(SecretValueFlags::empty()).await?;
//! assert_eq!(value.as_bytes(), b"s3cr3t\x00pad");
//! secret.undefine().await?;
//! # Ok(())
//! # }
//! ```
pub mod connect;
pub mod error;
pub mod flags;
pub mod object;
pub mod secret;
pub mod server;
pub mod settings;
pub mod store;
pub mod usage;
pub mod value;
pub mod xml;

pub use connect::Connect;
pub use error::{ErrorCode, RemoteError};
pub use flags::{ListAllSecretsFlags, SecretDefineFlags, SecretValueFlags, SecretXmlFlags};
pub use secret::{Secret, State};
pub use usage::{Usage, UsageType};
pub use value::SecretValue;
