// UBX-CFG-CFG: clear, save and load configurations

use super::{CLASS_CFG, ID_CFG_CFG};
use crate::ubx::Frame;

/// Configuration sections (clearMask / saveMask / loadMask bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionMask(pub u32);

impl SectionMask {
    pub const NONE: Self = Self(0);
    pub const NAV_CONF: Self = Self(0x0000_0008);
    /// ioPort, msgConf, infMsg, navConf, rxmConf, senConf, rinvConf, antConf,
    /// logConf, ftsConf
    pub const ALL: Self = Self(0x0000_1F1F);
}

/// Storage targets (deviceMask bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceMask(pub u8);

impl DeviceMask {
    pub const BBR: Self = Self(0x01);
    pub const FLASH: Self = Self(0x02);
    pub const EEPROM: Self = Self(0x04);
    pub const SPI_FLASH: Self = Self(0x10);
    pub const ALL: Self =
        Self(Self::BBR.0 | Self::FLASH.0 | Self::EEPROM.0 | Self::SPI_FLASH.0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfgCfg {
    pub clear: SectionMask,
    pub save: SectionMask,
    pub load: SectionMask,
    pub devices: DeviceMask,
}

impl CfgCfg {
    /// Copy the current configuration of `sections` to permanent storage
    pub fn save(sections: SectionMask, devices: DeviceMask) -> Self {
        Self {
            clear: SectionMask::NONE,
            save: sections,
            load: SectionMask::NONE,
            devices,
        }
    }

    pub fn encode(&self) -> [u8; 13] {
        let mut out = [0u8; 13];
        out[0..4].copy_from_slice(&self.clear.0.to_le_bytes());
        out[4..8].copy_from_slice(&self.save.0.to_le_bytes());
        out[8..12].copy_from_slice(&self.load.0.to_le_bytes());
        out[12] = self.devices.0;
        out
    }

    pub fn to_frame(&self) -> Frame {
        Frame::new(CLASS_CFG, ID_CFG_CFG, self.encode().to_vec())
    }
}
