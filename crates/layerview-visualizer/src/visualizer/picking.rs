//! Index-colour picking.
//!
//! Volume `i` is drawn flat in the colour encoding `i + 1` as
//! `R << 16 | G << 8 | B`; black decodes to "nothing".

/// Largest volume index that fits in 24 bits.
pub const MAX_PICK_INDEX: usize = 0x00FF_FFFE;

/// Flat RGBA colour for volume `index`.
pub fn encode_pick_color(index: usize) -> [f32; 4] {
    let id = (index.min(MAX_PICK_INDEX) + 1) as u32;
    let r = (id >> 16) & 0xFF;
    let g = (id >> 8) & 0xFF;
    let b = id & 0xFF;
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

/// Volume index under a read-back pixel, if any.
pub fn decode_pick_color(rgba: [u8; 4]) -> Option<usize> {
    let id = (u32::from(rgba[0]) << 16) | (u32::from(rgba[1]) << 8) | u32::from(rgba[2]);
    if id == 0 {
        None
    } else {
        Some(id as usize - 1)
    }
}
