use serde::{Deserialize, Serialize};

pub const DEFAULT_SSH_PORT: u16 = 22;

/// A stored SSH destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerProfile {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Port as it appears on disk: older form submissions stored it as text, and
/// anything else is kept so one odd entry cannot spoil the whole file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PortValue {
    Number(serde_json::Number),
    Text(String),
    Other(serde_json::Value),
}

impl PortValue {
    fn parse(&self) -> Option<u16> {
        let value = match self {
            PortValue::Number(number) => match number.as_i64() {
                Some(whole) => whole,
                None => leading_integer(&number.to_string())?,
            },
            PortValue::Text(text) => leading_integer(text)?,
            PortValue::Other(_) => return None,
        };
        u16::try_from(value).ok().filter(|port| *port > 0)
    }
}

/// The optionally signed run of digits at the start of `text`, ignoring
/// leading whitespace and whatever follows: `"2222abc"` reads as 2222.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let digits = unsigned
        .find(|ch: char| !ch.is_ascii_digit())
        .map_or(unsigned, |end| &unsigned[..end]);
    if digits.is_empty() {
        return None;
    }
    let sign_len = text.len() - unsigned.len();
    text[..sign_len + digits.len()].parse().ok()
}

impl From<u16> for PortValue {
    fn from(port: u16) -> Self {
        PortValue::Number(port.into())
    }
}

impl ServerProfile {
    pub fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Port to dial: the stored value when it is a valid port, otherwise 22.
    pub fn effective_port(&self) -> u16 {
        self.port
            .as_ref()
            .and_then(PortValue::parse)
            .unwrap_or(DEFAULT_SSH_PORT)
    }

    /// Trimmed key path, `None` when unset or blank.
    pub fn key_path(&self) -> Option<&str> {
        self.key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Display name, falling back to `user@host`.
    pub fn label(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.target(),
        }
    }
}
