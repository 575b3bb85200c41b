// UBX message payloads used by gpsmodel
//
// Layouts follow the u-blox 8 / M8 Receiver Description (UBX-13003221).

mod ack;
mod cfg_cfg;
mod mon_ver;
mod nav5;

pub use ack::Ack;
pub use cfg_cfg::{CfgCfg, DeviceMask, SectionMask};
pub use mon_ver::{MonVer, ProtocolVersion};
pub use nav5::{Nav5, Nav5Mask};

pub const CLASS_ACK: u8 = 0x05;
pub const ID_ACK_NAK: u8 = 0x00;
pub const ID_ACK_ACK: u8 = 0x01;

pub const CLASS_CFG: u8 = 0x06;
pub const ID_CFG_CFG: u8 = 0x09;
pub const ID_CFG_NAV5: u8 = 0x24;

pub const CLASS_MON: u8 = 0x0A;
pub const ID_MON_VER: u8 = 0x04;

/// Short name for logs and errors, e.g. `CFG-NAV5`
pub fn message_name(class: u8, id: u8) -> String {
    match (class, id) {
        (CLASS_ACK, ID_ACK_NAK) => "ACK-NAK".to_string(),
        (CLASS_ACK, ID_ACK_ACK) => "ACK-ACK".to_string(),
        (CLASS_CFG, ID_CFG_CFG) => "CFG-CFG".to_string(),
        (CLASS_CFG, ID_CFG_NAV5) => "CFG-NAV5".to_string(),
        (CLASS_MON, ID_MON_VER) => "MON-VER".to_string(),
        _ => format!("{:#04x}/{:#04x}", class, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_name() {
        assert_eq!(message_name(0x06, 0x24), "CFG-NAV5");
        assert_eq!(message_name(0x0A, 0x04), "MON-VER");
        assert_eq!(message_name(0x01, 0x07), "0x01/0x07");
    }
}
