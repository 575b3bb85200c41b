// UBX-MON-VER: receiver and software version
//
// Payload: swVersion CH[30], hwVersion CH[10], then zero or more CH[30]
// extension strings (e.g. "PROTVER=18.00", "MOD=NEO-M8N").

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::ubx::MessageError;

const SW_LEN: usize = 30;
const HW_LEN: usize = 10;
const EXT_LEN: usize = 30;

/// UBX protocol version, minor part in hundredths ("19.2" == 19.20)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (major, minor) = s.split_once('.').unwrap_or((s, "0"));

        let major = major
            .parse::<u8>()
            .map_err(|_| format!("invalid protocol version: {}", s))?;

        if minor.is_empty() || minor.len() > 2 || !minor.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("invalid protocol version: {}", s));
        }
        // "2" means 20 hundredths, "20" means 20, "05" means 5
        let padded = format!("{:0<2}", minor);
        let minor = padded
            .parse::<u8>()
            .map_err(|_| format!("invalid protocol version: {}", s))?;

        Ok(Self { major, minor })
    }
}

/// Decoded MON-VER payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonVer {
    pub software: String,
    pub hardware: String,
    pub extensions: Vec<String>,
}

impl MonVer {
    pub fn decode(payload: &[u8]) -> Result<Self, MessageError> {
        let fixed = SW_LEN + HW_LEN;
        if payload.len() < fixed || (payload.len() - fixed) % EXT_LEN != 0 {
            return Err(MessageError::BadLength {
                message: "MON-VER",
                expected: "40 + 30*N",
                actual: payload.len(),
            });
        }

        let software = c_string(&payload[..SW_LEN])?;
        let hardware = c_string(&payload[SW_LEN..fixed])?;
        let extensions = payload[fixed..]
            .chunks(EXT_LEN)
            .map(c_string)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            software,
            hardware,
            extensions,
        })
    }

    #[cfg(test)]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SW_LEN + HW_LEN + EXT_LEN * self.extensions.len());
        push_padded(&mut out, &self.software, SW_LEN);
        push_padded(&mut out, &self.hardware, HW_LEN);
        for ext in &self.extensions {
            push_padded(&mut out, ext, EXT_LEN);
        }
        out
    }

    /// Value of a `KEY=value` extension
    pub fn extension(&self, key: &str) -> Option<&str> {
        self.extensions.iter().find_map(|ext| {
            let (k, v) = ext.split_once('=')?;
            (k.trim() == key).then(|| v.trim())
        })
    }

    /// Protocol version from the PROTVER extension
    ///
    /// Older firmware writes "PROTVER 15.00" without the equals sign.
    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.extensions.iter().find_map(|ext| {
            let rest = ext.strip_prefix("PROTVER")?;
            let value = rest.trim_start_matches(|c: char| c == '=' || c.is_whitespace());
            value.parse().ok()
        })
    }
}

fn c_string(field: &[u8]) -> Result<String, MessageError> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let text = &field[..end];
    if !text.is_ascii() {
        return Err(MessageError::BadText { message: "MON-VER" });
    }
    Ok(String::from_utf8_lossy(text).trim_end().to_string())
}

fn push_padded(out: &mut Vec<u8>, text: &str, width: usize) {
    let bytes = text.as_bytes();
    // Leave room for the terminating NUL
    let n = bytes.len().min(width - 1);
    out.extend_from_slice(&bytes[..n]);
    out.resize(out.len() + (width - n), 0);
}
