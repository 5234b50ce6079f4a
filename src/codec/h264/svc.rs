//! SVC prefix NAL unit (type 14)
//!
//! Every layer emitted by the repacker is tagged with a 9-byte prefix: a
//! 4-byte start code, the NAL header, the 3-byte SVC header extension and
//! one byte of prefix payload.
//!
//! | byte | field |
//! |------|-------|
//! | 4    | `nal_ref_idc`, `nal_unit_type` = 14 |
//! | 5    | `svc_extension_flag`, `idr_flag`, `priority_id` |
//! | 6    | `no_inter_layer_pred_flag`, `dependency_id`, `quality_id` |
//! | 7    | `temporal_id`, `use_ref_base_pic_flag`, `discardable_flag`, `output_flag` |
//! | 8    | prefix NAL payload |

use super::nal::{NAL_TYPE_IDR, START_CODE_LEN};

/// Length of the prefix including its start code
pub const SVC_PREFIX_LEN: usize = 9;

/// Prefix before the per-unit bits are ORed in
pub const SVC_PREFIX_TEMPLATE: [u8; SVC_PREFIX_LEN] =
    [0x00, 0x00, 0x00, 0x01, 0x0E, 0x80, 0x80, 0x07, 0x20];

/// Highest spatial layer id the 3-bit `dependency_id` field can carry
pub const MAX_SPATIAL_ID: u8 = 7;

/// A filled-in SVC prefix NAL unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvcPrefix {
    bytes: [u8; SVC_PREFIX_LEN],
}

impl SvcPrefix {
    /// Build the prefix for a unit of `nal_type` on spatial layer `spatial_id`
    ///
    /// IDR units get `nal_ref_idc` 3 and the `idr_flag`; everything else gets
    /// `nal_ref_idc` 1. Only the low 3 bits of `spatial_id` are used.
    pub fn new(nal_type: u8, spatial_id: u8) -> Self {
        let mut bytes = SVC_PREFIX_TEMPLATE;
        if nal_type == NAL_TYPE_IDR {
            bytes[4] |= 0x60;
            bytes[5] |= 0x40;
        } else {
            bytes[4] |= 0x20;
        }
        bytes[6] |= (spatial_id << 4) & 0x70;
        SvcPrefix { bytes }
    }

    /// The full prefix, start code included
    pub fn as_bytes(&self) -> &[u8; SVC_PREFIX_LEN] {
        &self.bytes
    }

    /// The prefix without its start code
    pub fn without_start_code(&self) -> &[u8] {
        &self.bytes[START_CODE_LEN..]
    }

    /// NAL reference IDC of the prefix header
    pub fn nal_ref_idc(&self) -> u8 {
        (self.bytes[4] >> 5) & 0x03
    }

    /// Whether the IDR flag is set
    pub fn is_idr(&self) -> bool {
        self.bytes[5] & 0x40 != 0
    }

    pub fn spatial_id(&self) -> u8 {
        (self.bytes[6] >> 4) & 0x07
    }

    pub fn quality_id(&self) -> u8 {
        self.bytes[6] & 0x0F
    }

    pub fn temporal_id(&self) -> u8 {
        (self.bytes[7] >> 5) & 0x07
    }
}
