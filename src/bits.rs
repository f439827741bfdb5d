//! Bit field helpers shared by the navigation message decoders.
//!
//! Two layouts are handled: 30 bit words right aligned in a `u32`
//! (GPS LNAV, BeiDou D1) where bits are numbered 1..=30 from the MSB,
//! and MSB first byte buffers (Galileo I/NAV, GLONASS strings).

/// Extracts bits `first..=last` of a 30 bit navigation word.
pub(crate) fn word_bits(word: u32, first: u32, last: u32) -> u32 {
    let len = last - first + 1;
    let mask = if len >= 32 { u32::MAX } else { (1u32 << len) - 1 };
    (word >> (30 - last)) & mask
}

/// Interprets the lower `width` bits as a two's complement integer.
pub(crate) fn sign_extend(value: u32, width: u32) -> i32 {
    if width == 0 || width >= 32 {
        return value as i32;
    }
    let shift = 32 - width;
    ((value << shift) as i32) >> shift
}

/// Reads `len` (≤ 32) bits at bit position `pos` of an MSB first buffer.
pub(crate) fn getbitu(buf: &[u8], pos: usize, len: usize) -> u32 {
    (pos..pos + len).fold(0u32, |bits, i| {
        let bit = buf.get(i / 8).map_or(0, |byte| (byte >> (7 - i % 8)) & 1);
        (bits << 1) | bit as u32
    })
}

/// Signed version of [getbitu].
pub(crate) fn getbits(buf: &[u8], pos: usize, len: usize) -> i32 {
    sign_extend(getbitu(buf, pos, len), len as u32)
}

/// Writes the lower `len` (≤ 32) bits of `data` at bit position `pos`.
pub(crate) fn setbitu(buf: &mut [u8], pos: usize, len: usize, data: u32) {
    for (k, i) in (pos..pos + len).enumerate() {
        let Some(byte) = buf.get_mut(i / 8) else {
            return;
        };
        let mask = 1u8 << (7 - i % 8);
        if (data >> (len - 1 - k)) & 1 == 1 {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }
}

/// Signed version of [setbitu].
pub(crate) fn setbits(buf: &mut [u8], pos: usize, len: usize, data: i32) {
    setbitu(buf, pos, len, data as u32);
}

/// CRC-24Q generator polynomial
const CRC24Q_POLY: u32 = 0x1864CFB;

/// CRC-24Q (Qualcomm) over `buf`, starting from `init`.
pub(crate) fn crc24q(buf: &[u8], init: u32) -> u32 {
    let crc = buf.iter().fold(init, |crc, byte| {
        (0..8).fold(crc ^ ((*byte as u32) << 16), |crc, _| {
            let crc = crc << 1;
            if crc & 0x1000000 != 0 {
                crc ^ CRC24Q_POLY
            } else {
                crc
            }
        })
    });
    crc & 0xFFFFFF
}
