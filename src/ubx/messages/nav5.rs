// UBX-CFG-NAV5: navigation engine settings
//
// 36-byte payload. Only fields whose bit is set in `mask` are applied by the
// receiver, so a set with mask = DYN leaves everything else untouched.

use serde::Serialize;

use super::{CLASS_CFG, ID_CFG_NAV5};
use crate::receiver::DynamicModel;
use crate::ubx::{Frame, MessageError};

pub const NAV5_PAYLOAD_LEN: usize = 36;

/// Parameter mask bits of CFG-NAV5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Nav5Mask(pub u16);

impl Nav5Mask {
    pub const DYN: Self = Self(0x0001);
    pub const MIN_EL: Self = Self(0x0002);
    pub const POS_FIX_MODE: Self = Self(0x0004);
    pub const DR_LIM: Self = Self(0x0008);
    pub const POS_MASK: Self = Self(0x0010);
    pub const TIME_MASK: Self = Self(0x0020);
    pub const STATIC_HOLD_MASK: Self = Self(0x0040);
    pub const DGPS_MASK: Self = Self(0x0080);
    pub const CNO_THRESHOLD: Self = Self(0x0100);
    pub const UTC: Self = Self(0x0400);

    const NAMES: [(Self, &'static str); 10] = [
        (Self::DYN, "dyn"),
        (Self::MIN_EL, "minEl"),
        (Self::POS_FIX_MODE, "posFixMode"),
        (Self::DR_LIM, "drLim"),
        (Self::POS_MASK, "posMask"),
        (Self::TIME_MASK, "timeMask"),
        (Self::STATIC_HOLD_MASK, "staticHoldMask"),
        (Self::DGPS_MASK, "dgpsMask"),
        (Self::CNO_THRESHOLD, "cnoThreshold"),
        (Self::UTC, "utc"),
    ];

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Names of the parameter groups set in this mask
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for Nav5Mask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Decoded CFG-NAV5 payload (raw units as transmitted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Nav5 {
    pub mask: Nav5Mask,
    /// Dynamic platform model code
    pub dyn_model: u8,
    /// 1 = 2D only, 2 = 3D only, 3 = auto
    pub fix_mode: u8,
    /// 0.01 m
    pub fixed_alt: i32,
    /// 0.0001 m^2
    pub fixed_alt_var: u32,
    /// Degrees
    pub min_elev: i8,
    /// Seconds
    pub dr_limit: u8,
    /// 0.1
    pub p_dop: u16,
    /// 0.1
    pub t_dop: u16,
    /// Metres
    pub p_acc: u16,
    /// Metres
    pub t_acc: u16,
    /// cm/s
    pub static_hold_thresh: u8,
    /// Seconds
    pub dgnss_timeout: u8,
    pub cno_thresh_num_svs: u8,
    /// dBHz
    pub cno_thresh: u8,
    /// Metres
    pub static_hold_max_dist: u16,
    pub utc_standard: u8,
}

impl Nav5 {
    /// Settings that change only the dynamic platform model
    pub fn dynamic_model_only(model: DynamicModel) -> Self {
        Self {
            mask: Nav5Mask::DYN,
            dyn_model: model.code(),
            ..Self::default()
        }
    }

    pub fn decode(payload: &[u8]) -> Result<Self, MessageError> {
        if payload.len() != NAV5_PAYLOAD_LEN {
            return Err(MessageError::BadLength {
                message: "CFG-NAV5",
                expected: "36",
                actual: payload.len(),
            });
        }

        let u16_at = |off: usize| u16::from_le_bytes([payload[off], payload[off + 1]]);
        let u32_at = |off: usize| {
            u32::from_le_bytes([
                payload[off],
                payload[off + 1],
                payload[off + 2],
                payload[off + 3],
            ])
        };

        Ok(Self {
            mask: Nav5Mask(u16_at(0)),
            dyn_model: payload[2],
            fix_mode: payload[3],
            fixed_alt: u32_at(4) as i32,
            fixed_alt_var: u32_at(8),
            min_elev: payload[12] as i8,
            dr_limit: payload[13],
            p_dop: u16_at(14),
            t_dop: u16_at(16),
            p_acc: u16_at(18),
            t_acc: u16_at(20),
            static_hold_thresh: payload[22],
            dgnss_timeout: payload[23],
            cno_thresh_num_svs: payload[24],
            cno_thresh: payload[25],
            static_hold_max_dist: u16_at(28),
            utc_standard: payload[30],
        })
    }

    pub fn encode(&self) -> [u8; NAV5_PAYLOAD_LEN] {
        let mut out = [0u8; NAV5_PAYLOAD_LEN];
        out[0..2].copy_from_slice(&self.mask.0.to_le_bytes());
        out[2] = self.dyn_model;
        out[3] = self.fix_mode;
        out[4..8].copy_from_slice(&self.fixed_alt.to_le_bytes());
        out[8..12].copy_from_slice(&self.fixed_alt_var.to_le_bytes());
        out[12] = self.min_elev as u8;
        out[13] = self.dr_limit;
        out[14..16].copy_from_slice(&self.p_dop.to_le_bytes());
        out[16..18].copy_from_slice(&self.t_dop.to_le_bytes());
        out[18..20].copy_from_slice(&self.p_acc.to_le_bytes());
        out[20..22].copy_from_slice(&self.t_acc.to_le_bytes());
        out[22] = self.static_hold_thresh;
        out[23] = self.dgnss_timeout;
        out[24] = self.cno_thresh_num_svs;
        out[25] = self.cno_thresh;
        // 26..28 reserved
        out[28..30].copy_from_slice(&self.static_hold_max_dist.to_le_bytes());
        out[30] = self.utc_standard;
        // 31..36 reserved
        out
    }

    pub fn to_frame(&self) -> Frame {
        Frame::new(CLASS_CFG, ID_CFG_NAV5, self.encode().to_vec())
    }
}
