//! Per-cell value rules applied while encoding.

/// Placeholder the goggle player renders as an empty cell.
pub const BLANK_CELL: u8 = 0x20;

/// Widen a 1-byte cell into a 2-byte slot (zero high byte).
#[inline]
pub fn widen(value: u8) -> u16 {
    u16::from(value)
}

/// Keep the low byte of a 2-byte cell.
#[inline]
pub fn narrow(value: u16) -> u8 {
    (value & 0x00FF) as u8
}

/// Goggle target rule: `0x00` and out-of-bounds cells become [`BLANK_CELL`],
/// everything else passes through.
#[inline]
pub fn goggle_cell(source: Option<u8>) -> u8 {
    match source {
        None | Some(0x00) => BLANK_CELL,
        Some(v)           => v,
    }
}

/// On-disk form of a goggle cell: remapped low byte, zero high byte.
#[inline]
pub fn goggle_slot(source: Option<u8>) -> [u8; 2] {
    [goggle_cell(source), 0x00]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_substitution() {
        assert_eq!(goggle_slot(Some(0x00)), [0x20, 0x00]);
        assert_eq!(goggle_slot(None),       [0x20, 0x00]);
        assert_eq!(goggle_slot(Some(0x41)), [0x41, 0x00]);
        assert_eq!(goggle_slot(Some(0xFF)), [0xFF, 0x00]);
    }

    #[test]
    fn widen_and_narrow() {
        assert_eq!(widen(0xAB), 0x00AB);
        assert_eq!(narrow(0x12AB), 0xAB);
        assert_eq!(narrow(widen(0x7F)), 0x7F);
    }
}
