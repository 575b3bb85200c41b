// Dynamic platform models
//
// The dynModel field of CFG-NAV5 tunes the navigation filter to the expected
// motion of the platform. Code 1 is reserved and unused on u-blox 8.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::ubx::messages::ProtocolVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicModel {
    Portable,
    Stationary,
    Pedestrian,
    Automotive,
    Sea,
    Airborne1g,
    Airborne2g,
    Airborne4g,
    Wrist,
    Bike,
}

impl DynamicModel {
    /// All models in code order
    pub const ALL: [DynamicModel; 10] = [
        DynamicModel::Portable,
        DynamicModel::Stationary,
        DynamicModel::Pedestrian,
        DynamicModel::Automotive,
        DynamicModel::Sea,
        DynamicModel::Airborne1g,
        DynamicModel::Airborne2g,
        DynamicModel::Airborne4g,
        DynamicModel::Wrist,
        DynamicModel::Bike,
    ];

    pub fn code(self) -> u8 {
        match self {
            DynamicModel::Portable => 0,
            DynamicModel::Stationary => 2,
            DynamicModel::Pedestrian => 3,
            DynamicModel::Automotive => 4,
            DynamicModel::Sea => 5,
            DynamicModel::Airborne1g => 6,
            DynamicModel::Airborne2g => 7,
            DynamicModel::Airborne4g => 8,
            DynamicModel::Wrist => 9,
            DynamicModel::Bike => 10,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DynamicModel::Portable => "portable",
            DynamicModel::Stationary => "stationary",
            DynamicModel::Pedestrian => "pedestrian",
            DynamicModel::Automotive => "automotive",
            DynamicModel::Sea => "sea",
            DynamicModel::Airborne1g => "airborne1g",
            DynamicModel::Airborne2g => "airborne2g",
            DynamicModel::Airborne4g => "airborne4g",
            DynamicModel::Wrist => "wrist",
            DynamicModel::Bike => "bike",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            DynamicModel::Automotive => &["car"],
            DynamicModel::Sea => &["marine"],
            DynamicModel::Airborne1g => &["airborne<1g", "air1"],
            DynamicModel::Airborne2g => &["airborne<2g", "air2"],
            DynamicModel::Airborne4g => &["airborne<4g", "air4"],
            DynamicModel::Wrist => &["watch"],
            DynamicModel::Bike => &["bicycle"],
            _ => &[],
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DynamicModel::Portable => "Default; moderate speed and altitude changes",
            DynamicModel::Stationary => "Timing and fixed installations; assumes zero dynamics",
            DynamicModel::Pedestrian => "Low acceleration and speed",
            DynamicModel::Automotive => "Road vehicles; low vertical acceleration",
            DynamicModel::Sea => "Vessels at sea level; zero vertical velocity",
            DynamicModel::Airborne1g => "Higher dynamic range than automotive; no 2D fix",
            DynamicModel::Airborne2g => "Airborne with <2g acceleration",
            DynamicModel::Airborne4g => "Airborne with <4g acceleration",
            DynamicModel::Wrist => "Wrist-worn watch; accounts for arm motion",
            DynamicModel::Bike => "Motorbikes and bicycles",
        }
    }

    /// Lowest protocol version whose firmware accepts this model
    pub fn min_protocol_version(self) -> Option<ProtocolVersion> {
        match self {
            DynamicModel::Wrist => Some(ProtocolVersion::new(18, 0)),
            DynamicModel::Bike => Some(ProtocolVersion::new(19, 20)),
            _ => None,
        }
    }

    pub fn is_supported_by(self, version: ProtocolVersion) -> bool {
        self.min_protocol_version()
            .map_or(true, |min| version >= min)
    }

    fn valid_names() -> String {
        DynamicModel::ALL
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DynamicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for DynamicModel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for DynamicModel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl TryFrom<u8> for DynamicModel {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        DynamicModel::ALL
            .into_iter()
            .find(|m| m.code() == code)
            .ok_or(code)
    }
}

impl FromStr for DynamicModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();

        if let Ok(code) = wanted.parse::<u8>() {
            return DynamicModel::try_from(code).map_err(|code| {
                format!(
                    "unknown dynamic model code {} (valid: 0, 2-10)",
                    code
                )
            });
        }

        DynamicModel::ALL
            .into_iter()
            .find(|m| m.name() == wanted || m.aliases().contains(&wanted.as_str()))
            .ok_or_else(|| {
                format!(
                    "unknown dynamic model '{}' (valid: {})",
                    s.trim(),
                    DynamicModel::valid_names()
                )
            })
    }
}
