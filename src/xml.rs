//! Secret XML descriptor.
//!
//! ```xml
//! <secret ephemeral="no" private="yes">
//!   <uuid>c9f2b8f0-3b1c-4b6e-9a57-3f1f5d1d7a10</uuid>
//!   <description>LUKS passphrase</description>
//!   <usage type="volume">
//!     <volume>/var/lib/libvirt/images/guest.img</volume>
//!   </usage>
//! </secret>
//! ```
//!
//! The descriptor holds metadata only; the value is never part of it.
use quick_xml::events::Event;

use crate::error;
use crate::usage::{Usage, UsageType};

/// Elements accepted when parsing with validation.
const KNOWN_ELEMENTS: [&str; 7] = [
    "secret",
    "uuid",
    "description",
    "usage",
    "volume",
    "name",
    "target",
];

/// Validated secret definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretDef {
    pub uuid: uuid::Uuid,
    pub ephemeral: bool,
    pub private: bool,
    pub description: Option<String>,
    pub usage: Option<Usage>,
}

impl SecretDef {
    pub fn usage_type(&self) -> UsageType {
        self.usage
            .as_ref()
            .map(|usage| usage.kind)
            .unwrap_or(UsageType::None)
    }

    pub fn usage_id(&self) -> &str {
        self.usage
            .as_ref()
            .map(|usage| usage.id.as_str())
            .unwrap_or("")
    }

    /// Parse a descriptor. A missing `<uuid>` gets a fresh random one.
    ///
    /// With `strict`, elements outside the secret schema are rejected
    /// instead of ignored.
    pub fn parse(xml: &str, strict: bool) -> Result<SecretDef, error::Error> {
        if strict {
            check_elements(xml)?;
        }

        let document: SecretXml =
            quick_xml::de::from_str(xml).map_err(|e| error::Error::Xml(e.to_string()))?;

        let uuid = match document.uuid.as_deref().map(str::trim) {
            Some(uuid) => uuid::Uuid::parse_str(uuid)
                .map_err(|_| error::Error::Xml(format!("malformed uuid element '{}'", uuid)))?,
            None => uuid::Uuid::new_v4(),
        };

        let usage = document.usage.map(UsageXml::into_usage).transpose()?;

        Ok(SecretDef {
            uuid,
            ephemeral: parse_yes_no("ephemeral", document.ephemeral.as_deref())?,
            private: parse_yes_no("private", document.private.as_deref())?,
            description: document.description,
            usage,
        })
    }

    pub fn format(&self) -> Result<String, error::Error> {
        let document = SecretXml {
            ephemeral: Some(yes_no(self.ephemeral).to_owned()),
            private: Some(yes_no(self.private).to_owned()),
            uuid: Some(self.uuid.hyphenated().to_string()),
            description: self.description.clone(),
            usage: self.usage.as_ref().map(UsageXml::from_usage),
        };

        quick_xml::se::to_string(&document).map_err(|e| error::Error::Xml(e.to_string()))
    }
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
#[serde(rename = "secret")]
struct SecretXml {
    #[serde(rename = "@ephemeral", default, skip_serializing_if = "Option::is_none")]
    ephemeral: Option<String>,
    #[serde(rename = "@private", default, skip_serializing_if = "Option::is_none")]
    private: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    usage: Option<UsageXml>,
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
struct UsageXml {
    #[serde(rename = "@type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

impl UsageXml {
    fn from_usage(usage: &Usage) -> UsageXml {
        let mut xml = UsageXml {
            kind: usage.kind.xml_name().unwrap_or_default().to_owned(),
            volume: None,
            name: None,
            target: None,
        };
        let id = Some(usage.id.clone());
        match usage.kind {
            UsageType::Volume => xml.volume = id,
            UsageType::Iscsi => xml.target = id,
            _ => xml.name = id,
        }
        xml
    }

    fn into_usage(self) -> Result<Usage, error::Error> {
        let kind = UsageType::from_xml_name(&self.kind).ok_or_else(|| {
            error::Error::Xml(format!("unknown secret usage type {}", self.kind))
        })?;

        let (id, element) = match kind {
            UsageType::Volume => (self.volume, "volume"),
            UsageType::Iscsi => (self.target, "target"),
            _ => (self.name, "name"),
        };

        match id.map(|id| id.trim().to_owned()) {
            Some(id) if !id.is_empty() => Ok(Usage::new(kind, id)),
            _ => Err(error::Error::Xml(format!(
                "{} usage specified, but {} is missing",
                self.kind, element
            ))),
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn parse_yes_no(attribute: &str, value: Option<&str>) -> Result<bool, error::Error> {
    match value {
        None | Some("no") => Ok(false),
        Some("yes") => Ok(true),
        Some(other) => Err(error::Error::Xml(format!(
            "invalid value '{}' for attribute '{}'",
            other, attribute
        ))),
    }
}

fn check_elements(xml: &str) -> Result<(), error::Error> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if !KNOWN_ELEMENTS.contains(&name.as_str()) {
                    return Err(error::Error::Xml(format!(
                        "element '{}' is not allowed in secret XML",
                        name
                    )));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOLUME_XML: &str = r#"
        <secret ephemeral='no' private='yes'>
          <uuid>c9f2b8f0-3b1c-4b6e-9a57-3f1f5d1d7a10</uuid>
          <description>LUKS passphrase</description>
          <usage type='volume'>
            <volume>pool/vol1</volume>
          </usage>
        </secret>
    "#;

    #[test]
    fn test_parse_volume_secret() {
        let def = SecretDef::parse(VOLUME_XML, false).unwrap();

        assert_eq!(
            def.uuid.hyphenated().to_string(),
            "c9f2b8f0-3b1c-4b6e-9a57-3f1f5d1d7a10"
        );
        assert!(!def.ephemeral);
        assert!(def.private);
        assert_eq!(def.description.as_deref(), Some("LUKS passphrase"));
        assert_eq!(def.usage_type(), UsageType::Volume);
        assert_eq!(def.usage_id(), "pool/vol1");
    }

    #[test]
    fn test_parse_generates_missing_uuid() {
        let def = SecretDef::parse("<secret/>", false).unwrap();

        assert!(!def.uuid.is_nil());
        assert_eq!(def.usage_type(), UsageType::None);
        assert_eq!(def.usage_id(), "");
    }

    #[test]
    fn test_parse_usage_elements_per_type() {
        let def = SecretDef::parse(
            "<secret><usage type='iscsi'><target>iqn.2013-07.com.example:t1</target></usage></secret>",
            false,
        )
        .unwrap();
        assert_eq!(def.usage_type(), UsageType::Iscsi);
        assert_eq!(def.usage_id(), "iqn.2013-07.com.example:t1");

        let def = SecretDef::parse(
            "<secret><usage type='ceph'><name>client.admin secret</name></usage></secret>",
            false,
        )
        .unwrap();
        assert_eq!(def.usage_type(), UsageType::Ceph);
        assert_eq!(def.usage_id(), "client.admin secret");
    }

    #[test]
    fn test_parse_rejects_missing_usage_id() {
        let error =
            SecretDef::parse("<secret><usage type='volume'/></secret>", false).unwrap_err();
        assert_eq!(error.code(), error::ErrorCode::XmlError);
    }

    #[test]
    fn test_parse_rejects_unknown_usage_type() {
        let error = SecretDef::parse(
            "<secret><usage type='floppy'><name>a</name></usage></secret>",
            false,
        )
        .unwrap_err();
        assert!(error.to_string().contains("unknown secret usage type floppy"));
    }

    #[test]
    fn test_parse_rejects_bad_attribute() {
        let error = SecretDef::parse("<secret private='maybe'/>", false).unwrap_err();
        assert_eq!(error.code(), error::ErrorCode::XmlError);
    }

    #[test]
    fn test_parse_rejects_malformed_uuid() {
        let error =
            SecretDef::parse("<secret><uuid>not-a-uuid</uuid></secret>", false).unwrap_err();
        assert_eq!(error.code(), error::ErrorCode::XmlError);
    }

    #[test]
    fn test_strict_parse_rejects_unknown_elements() {
        let xml = "<secret><uuid>c9f2b8f0-3b1c-4b6e-9a57-3f1f5d1d7a10</uuid><colour>red</colour></secret>";

        assert!(SecretDef::parse(xml, false).is_ok());
        let error = SecretDef::parse(xml, true).unwrap_err();
        assert!(error.to_string().contains("'colour'"));
    }

    #[test]
    fn test_format_contains_metadata() {
        let def = SecretDef::parse(VOLUME_XML, false).unwrap();
        let xml = def.format().unwrap();

        assert!(xml.starts_with("<secret"));
        assert!(xml.contains(r#"private="yes""#));
        assert!(xml.contains("<uuid>c9f2b8f0-3b1c-4b6e-9a57-3f1f5d1d7a10</uuid>"));
        assert!(xml.contains("<volume>pool/vol1</volume>"));

        let reparsed = SecretDef::parse(&xml, true).unwrap();
        assert_eq!(reparsed, def);
    }
}
