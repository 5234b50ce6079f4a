//! NAL (Network Abstraction Layer) unit helpers for H.264/AVC
//!
//! Encoder output arrives in Annex B format: each NAL unit is preceded by a
//! start code (0x000001 or 0x00000001). The repacker only ever looks at the
//! header byte that follows a 4-byte start code.
//!
//! ## NAL Unit Types
//!
//! - Type 1: Non-IDR slice (P frame)
//! - Type 5: IDR slice (keyframe)
//! - Type 7: SPS (Sequence Parameter Set)
//! - Type 8: PPS (Picture Parameter Set)
//! - Type 14: SVC prefix NAL unit

// NAL unit type constants
pub const NAL_TYPE_SLICE: u8 = 1;
pub const NAL_TYPE_IDR: u8 = 5;
pub const NAL_TYPE_SPS: u8 = 7;
pub const NAL_TYPE_PPS: u8 = 8;
pub const NAL_TYPE_PREFIX: u8 = 14;

/// 4-byte Annex B start code
pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Length of [`START_CODE`]
pub const START_CODE_LEN: usize = START_CODE.len();

/// A reference to a single NAL unit within a buffer
#[derive(Debug, Clone)]
pub struct NalUnit<'a> {
    /// NAL unit type (lower 5 bits of first byte)
    pub nal_type: u8,
    /// NAL reference IDC (bits 5-6 of first byte)
    pub nal_ref_idc: u8,
    /// Raw NAL unit data including the header byte, without start code
    pub data: &'a [u8],
}

impl<'a> NalUnit<'a> {
    /// Check if this NAL unit carries slice data
    pub fn is_slice(&self) -> bool {
        self.nal_type == NAL_TYPE_SLICE || self.nal_type == NAL_TYPE_IDR
    }
}

/// NAL unit type of an encoder output buffer
///
/// The buffer is expected to start with a 4-byte start code, so the type is
/// read from byte 4. Returns `None` if the buffer is too short.
pub fn nal_type_of(buffer: &[u8]) -> Option<u8> {
    buffer.get(START_CODE_LEN).map(|header| header & 0x1F)
}

/// Length of the start code at `pos`, if there is one
fn start_code_at(data: &[u8], pos: usize) -> Option<usize> {
    match &data[pos..] {
        [0, 0, 0, 1, ..] => Some(4),
        [0, 0, 1, ..] => Some(3),
        _ => None,
    }
}

/// Find all NAL units in an Annex B formatted buffer
///
/// Returned units exclude their start codes. Trailing zero bytes before the
/// next start code belong to that start code and are stripped.
pub fn find_nal_units_annex_b(data: &[u8]) -> Vec<NalUnit<'_>> {
    let mut nals = Vec::new();
    let mut i = 0;

    // Skip to the first start code
    let mut nal_start = loop {
        if i >= data.len() {
            return nals;
        }
        if let Some(len) = start_code_at(data, i) {
            break i + len;
        }
        i += 1;
    };

    loop {
        // Find end of this NAL (next start code or end of data)
        let mut j = nal_start;
        let mut next = None;
        while j + 3 <= data.len() {
            if let Some(len) = start_code_at(data, j) {
                next = Some((j, j + len));
                break;
            }
            j += 1;
        }
        let mut nal_end = next.map(|(end, _)| end).unwrap_or(data.len());

        while nal_end > nal_start && data[nal_end - 1] == 0 {
            nal_end -= 1;
        }

        if nal_end > nal_start {
            let header = data[nal_start];
            nals.push(NalUnit {
                nal_type: header & 0x1F,
                nal_ref_idc: (header >> 5) & 0x03,
                data: &data[nal_start..nal_end],
            });
        }

        match next {
            Some((_, start)) => nal_start = start,
            None => break,
        }
    }

    nals
}
