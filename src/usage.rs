//! Secret usage types.
//!
//! The usage type tells which subsystem consumes a secret, and scopes the
//! meaning of the usage id (a volume path, a Ceph user name, an iSCSI
//! target). Raw values are libvirt's `virSecretUsageType`.
use std::fmt;

pub const USAGE_TYPE_NONE: i32 = 0;
pub const USAGE_TYPE_VOLUME: i32 = 1;
pub const USAGE_TYPE_CEPH: i32 = 2;
pub const USAGE_TYPE_ISCSI: i32 = 3;
pub const USAGE_TYPE_TLS: i32 = 4;
pub const USAGE_TYPE_VTPM: i32 = 5;

/// A usage type as reported by a daemon.
///
/// Daemons newer than this crate may report values it does not know about.
/// Those are kept as `Unknown` with their raw value instead of failing, so
/// they can still be passed back to `secret_lookup_by_usage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageType {
    None,
    Volume,
    Ceph,
    Iscsi,
    Tls,
    Vtpm,
    Unknown(i32),
}

impl UsageType {
    pub fn as_raw(&self) -> i32 {
        match self {
            UsageType::None => USAGE_TYPE_NONE,
            UsageType::Volume => USAGE_TYPE_VOLUME,
            UsageType::Ceph => USAGE_TYPE_CEPH,
            UsageType::Iscsi => USAGE_TYPE_ISCSI,
            UsageType::Tls => USAGE_TYPE_TLS,
            UsageType::Vtpm => USAGE_TYPE_VTPM,
            UsageType::Unknown(raw) => *raw,
        }
    }

    /// Name used in the `type` attribute of the XML `<usage>` element.
    pub fn xml_name(&self) -> Option<&'static str> {
        match self {
            UsageType::Volume => Some("volume"),
            UsageType::Ceph => Some("ceph"),
            UsageType::Iscsi => Some("iscsi"),
            UsageType::Tls => Some("tls"),
            UsageType::Vtpm => Some("vtpm"),
            UsageType::None | UsageType::Unknown(_) => None,
        }
    }

    pub fn from_xml_name(name: &str) -> Option<UsageType> {
        match name {
            "volume" => Some(UsageType::Volume),
            "ceph" => Some(UsageType::Ceph),
            "iscsi" => Some(UsageType::Iscsi),
            "tls" => Some(UsageType::Tls),
            "vtpm" => Some(UsageType::Vtpm),
            _ => None,
        }
    }
}

impl From<i32> for UsageType {
    fn from(raw: i32) -> UsageType {
        match raw {
            USAGE_TYPE_NONE => UsageType::None,
            USAGE_TYPE_VOLUME => UsageType::Volume,
            USAGE_TYPE_CEPH => UsageType::Ceph,
            USAGE_TYPE_ISCSI => UsageType::Iscsi,
            USAGE_TYPE_TLS => UsageType::Tls,
            USAGE_TYPE_VTPM => UsageType::Vtpm,
            other => UsageType::Unknown(other),
        }
    }
}

impl From<UsageType> for i32 {
    fn from(usage_type: UsageType) -> i32 {
        usage_type.as_raw()
    }
}

impl fmt::Display for UsageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageType::None => write!(f, "none"),
            UsageType::Unknown(raw) => write!(f, "unknown({})", raw),
            known => write!(f, "{}", known.xml_name().unwrap_or_default()),
        }
    }
}

/// A usage type together with its usage id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Usage {
    pub kind: UsageType,
    pub id: String,
}

impl Usage {
    pub fn new(kind: UsageType, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values_match_libvirt() {
        assert_eq!(UsageType::None.as_raw(), 0);
        assert_eq!(UsageType::Volume.as_raw(), 1);
        assert_eq!(UsageType::Ceph.as_raw(), 2);
        assert_eq!(UsageType::Iscsi.as_raw(), 3);
        assert_eq!(UsageType::Tls.as_raw(), 4);
        assert_eq!(UsageType::Vtpm.as_raw(), 5);
    }

    #[test]
    fn test_unknown_values_are_preserved() {
        let usage_type = UsageType::from(42);
        assert_eq!(usage_type, UsageType::Unknown(42));
        assert_eq!(i32::from(usage_type), 42);
        assert_eq!(usage_type.xml_name(), None);
        assert_eq!(usage_type.to_string(), "unknown(42)");
    }

    #[test]
    fn test_xml_names() {
        for usage_type in [
            UsageType::Volume,
            UsageType::Ceph,
            UsageType::Iscsi,
            UsageType::Tls,
            UsageType::Vtpm,
        ] {
            let name = usage_type.xml_name().unwrap();
            assert_eq!(UsageType::from_xml_name(name), Some(usage_type));
        }
        assert_eq!(UsageType::from_xml_name("none"), None);
    }

    #[test]
    fn test_usage_display() {
        let usage = Usage::new(UsageType::Volume, "pool/vol1");
        assert_eq!(usage.to_string(), "volume pool/vol1");
    }
}
