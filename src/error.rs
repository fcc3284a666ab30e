use std::fmt;
use zbus::DBusError;

const ERROR_NAME_PREFIX: &str = "org.libvirt.Error.";

/// Subset of libvirt's `virErrorNumber` raised by secret operations.
///
/// Discriminants are the libvirt values, so `code as i32` can be compared
/// with what a native libvirt client reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InternalError = 1,
    NoSupport = 3,
    NoConnect = 5,
    InvalidConn = 6,
    InvalidArg = 8,
    OperationFailed = 9,
    XmlError = 27,
    OperationDenied = 29,
    Rpc = 39,
    OperationInvalid = 55,
    InvalidSecret = 65,
    NoSecret = 66,
}

impl ErrorCode {
    const ALL: [ErrorCode; 12] = [
        ErrorCode::InternalError,
        ErrorCode::NoSupport,
        ErrorCode::NoConnect,
        ErrorCode::InvalidConn,
        ErrorCode::InvalidArg,
        ErrorCode::OperationFailed,
        ErrorCode::XmlError,
        ErrorCode::OperationDenied,
        ErrorCode::Rpc,
        ErrorCode::OperationInvalid,
        ErrorCode::InvalidSecret,
        ErrorCode::NoSecret,
    ];

    fn suffix(&self) -> &'static str {
        match self {
            ErrorCode::InternalError => "InternalError",
            ErrorCode::NoSupport => "NoSupport",
            ErrorCode::NoConnect => "NoConnect",
            ErrorCode::InvalidConn => "InvalidConn",
            ErrorCode::InvalidArg => "InvalidArg",
            ErrorCode::OperationFailed => "OperationFailed",
            ErrorCode::XmlError => "XmlError",
            ErrorCode::OperationDenied => "OperationDenied",
            ErrorCode::Rpc => "Rpc",
            ErrorCode::OperationInvalid => "OperationInvalid",
            ErrorCode::InvalidSecret => "InvalidSecret",
            ErrorCode::NoSecret => "NoSecret",
        }
    }

    /// The D-Bus error name a daemon replies with for this code.
    pub fn dbus_name(&self) -> String {
        let mut name = ERROR_NAME_PREFIX.to_owned();
        name.push_str(self.suffix());
        name
    }

    /// Map a D-Bus error name back to a code.
    ///
    /// Standard `org.freedesktop.DBus.Error` names map to the closest code.
    /// `UnknownObject` on a secret path means the secret was undefined.
    pub fn from_dbus_name(name: &str) -> Option<ErrorCode> {
        if let Some(suffix) = name.strip_prefix(ERROR_NAME_PREFIX) {
            return ErrorCode::ALL
                .iter()
                .find(|code| code.suffix() == suffix)
                .copied();
        }

        match name {
            "org.freedesktop.DBus.Error.UnknownObject"
            | "org.freedesktop.DBus.Error.UnknownInterface" => Some(ErrorCode::NoSecret),
            "org.freedesktop.DBus.Error.InvalidArgs" => Some(ErrorCode::InvalidArg),
            "org.freedesktop.DBus.Error.NotSupported"
            | "org.freedesktop.DBus.Error.UnknownMethod" => Some(ErrorCode::NoSupport),
            "org.freedesktop.DBus.Error.AccessDenied" => Some(ErrorCode::OperationDenied),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.suffix(), *self as i32)
    }
}

/// Failure of a call made through a `Connect` or one of its `Secret` handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// libvirt function name of the failed call, e.g. `virSecretGetValue`.
    pub operation: &'static str,
    pub code: ErrorCode,
    pub message: String,
}

impl RemoteError {
    pub fn new(operation: &'static str, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            operation,
            code,
            message: message.into(),
        }
    }

    pub fn from_zbus(operation: &'static str, error: zbus::Error) -> Self {
        match error {
            zbus::Error::MethodError(name, description, _) => {
                let code = ErrorCode::from_dbus_name(name.as_str()).unwrap_or(ErrorCode::Rpc);
                let message = description.unwrap_or_else(|| name.as_str().to_owned());
                Self::new(operation, code, message)
            }
            zbus::Error::FDO(inner) => {
                let code =
                    ErrorCode::from_dbus_name(inner.name().as_str()).unwrap_or(ErrorCode::Rpc);
                Self::new(operation, code, inner.to_string())
            }
            other => Self::new(operation, ErrorCode::Rpc, other.to_string()),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Call to {} failed: {} [{}]",
            self.operation, self.message, self.code
        )
    }
}

impl std::error::Error for RemoteError {}

/// Daemon-side error.
///
/// Every variant maps to an `ErrorCode`, which names the D-Bus error reply
/// sent back to the caller.
#[derive(Debug)]
pub enum Error {
    Config(config::ConfigError),
    InvalidUuid(String),
    Io(std::io::Error),
    NegativeCount(i32),
    NoSecretWithUsage(String),
    NoSecretWithUuid(String),
    NoValue(String),
    PrivateFlagChange(String),
    SecretIsPrivate,
    UnsupportedFlags { function: &'static str, bits: u32 },
    UsageInUse { uuid: String, usage: String },
    ValueTooLarge { len: usize, max: usize },
    Xml(String),
    Zbus(zbus::Error),
    Zvariant(zvariant::Error),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidUuid(_)
            | Error::NegativeCount(_)
            | Error::UnsupportedFlags { .. }
            | Error::ValueTooLarge { .. } => ErrorCode::InvalidArg,
            Error::NoSecretWithUsage(_) | Error::NoSecretWithUuid(_) | Error::NoValue(_) => {
                ErrorCode::NoSecret
            }
            Error::PrivateFlagChange(_) | Error::SecretIsPrivate => ErrorCode::InvalidSecret,
            Error::Xml(_) => ErrorCode::XmlError,
            Error::Config(_)
            | Error::Io(_)
            | Error::UsageInUse { .. }
            | Error::Zbus(_)
            | Error::Zvariant(_) => ErrorCode::InternalError,
        }
    }
}

impl DBusError for Error {
    fn create_reply(
        &self,
        msg: &zbus::message::Header<'_>,
    ) -> zbus::Result<zbus::message::Message> {
        let message = zbus::message::Message::error(msg, self.name())?.build(&self.to_string())?;
        Ok(message)
    }

    fn name(&self) -> zbus_names::ErrorName<'_> {
        zbus_names::ErrorName::try_from(self.code().dbus_name())
            .expect("error names are built from a fixed, valid prefix")
    }

    fn description(&self) -> Option<&str> {
        match self {
            Error::InvalidUuid(detail)
            | Error::NoSecretWithUsage(detail)
            | Error::NoSecretWithUuid(detail)
            | Error::NoValue(detail)
            | Error::PrivateFlagChange(detail)
            | Error::Xml(detail) => Some(detail.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(inner) => write!(f, "{}", inner),
            Error::InvalidUuid(uuid) => write!(f, "cannot parse UUID '{}'", uuid),
            Error::Io(inner) => write!(f, "{}", inner),
            Error::NegativeCount(count) => {
                write!(f, "negative count is not allowed: {}", count)
            }
            Error::NoSecretWithUsage(usage) => {
                write!(f, "no secret with matching usage '{}'", usage)
            }
            Error::NoSecretWithUuid(uuid) => {
                write!(f, "no secret with matching uuid '{}'", uuid)
            }
            Error::NoValue(uuid) => write!(f, "secret '{}' does not have a value", uuid),
            Error::PrivateFlagChange(uuid) => write!(
                f,
                "cannot change private flag on existing secret '{}'",
                uuid
            ),
            Error::SecretIsPrivate => write!(f, "secret is private"),
            Error::UnsupportedFlags { function, bits } => write!(
                f,
                "unsupported flags (0x{:x}) in function {}",
                bits, function
            ),
            Error::UsageInUse { uuid, usage } => write!(
                f,
                "a secret with UUID {} already defined for use with {}",
                uuid, usage
            ),
            Error::ValueTooLarge { len, max } => write!(
                f,
                "secret value of {} bytes exceeds the maximum of {} bytes",
                len, max
            ),
            Error::Xml(detail) => write!(f, "XML error: {}", detail),
            Error::Zbus(inner) => write!(f, "{}", inner),
            Error::Zvariant(inner) => write!(f, "{}", inner),
        }
    }
}

impl std::error::Error for Error {}

impl From<zbus::Error> for Error {
    fn from(value: zbus::Error) -> Error {
        Error::Zbus(value)
    }
}

impl From<zvariant::Error> for Error {
    fn from(value: zvariant::Error) -> Error {
        Error::Zvariant(value)
    }
}

impl From<config::ConfigError> for Error {
    fn from(value: config::ConfigError) -> Error {
        Error::Config(value)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Error {
        Error::Io(value)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(value: quick_xml::Error) -> Error {
        Error::Xml(value.to_string())
    }
}
