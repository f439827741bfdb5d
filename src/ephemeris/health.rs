//! Satellite health words, user range accuracy and fit interval decoding.
use crate::signal::Code;

/// Largest URA index a GPS satellite may broadcast and still be used
pub const MAX_ALLOWED_GPS_URA_IDX: u8 = 15;

/// Returned by [decode_ura_index] for indexes out of the table
pub const INVALID_URA_VALUE: f64 = -1.0;

/// URA [m] for each GPS URA index (IS-GPS-200 20.3.3.3.1.3)
const GPS_URA_VALUES: [f64; 16] = [
    2.0, 2.8, 4.0, 5.7, 8.0, 11.3, 16.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0,
    4096.0, 6144.0,
];

/// Converts a GPS URA index into meters, [INVALID_URA_VALUE] if out of range.
pub fn decode_ura_index(index: u8) -> f64 {
    GPS_URA_VALUES
        .get(index as usize)
        .copied()
        .unwrap_or(INVALID_URA_VALUE)
}

/// Smallest URA index whose value is not lower than `ura` [m].
/// None for negative values and values above the table.
pub fn encode_ura(ura: f64) -> Option<u8> {
    if ura < 0.0 {
        return None;
    }
    GPS_URA_VALUES
        .iter()
        .position(|value| *value >= ura)
        .map(|index| index as u8)
}

/// GPS curve fit interval [s] from the fit interval flag and IODC.
pub fn decode_fit_interval(fit_interval_flag: bool, iodc: u16) -> u32 {
    let hours = if !fit_interval_flag {
        4
    } else {
        match iodc {
            240..=247 => 8,
            248..=255 | 496 => 14,
            497..=503 | 1021..=1023 => 26,
            504..=510 => 50,
            511 | 752..=756 => 74,
            757 => 98,
            _ => 6,
        }
    };
    hours * 60 * 60
}

/// Health estimate of one signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Signal not covered by the health word
    Unknown,
    Unhealthy,
    Healthy,
}

/// Signal component health, 5 LSB of the GPS 6 bit health word
/// (IS-GPS-200 Table 20-VIII)
mod component {
    pub const ALL_SIGNALS_WEAK: u8 = 1;
    pub const ALL_SIGNALS_DEAD: u8 = 2;
    pub const ALL_SIGNALS_NO_DATA: u8 = 3;
    pub const L1_P_SIGNAL_WEAK: u8 = 4;
    pub const L1_P_SIGNAL_DEAD: u8 = 5;
    pub const L1_P_SIGNAL_NO_DATA: u8 = 6;
    pub const L2_P_SIGNAL_WEAK: u8 = 7;
    pub const L2_P_SIGNAL_DEAD: u8 = 8;
    pub const L2_P_SIGNAL_NO_DATA: u8 = 9;
    pub const L1_C_SIGNAL_WEAK: u8 = 10;
    pub const L1_C_SIGNAL_DEAD: u8 = 11;
    pub const L1_C_SIGNAL_NO_DATA: u8 = 12;
    pub const L2_C_SIGNAL_WEAK: u8 = 13;
    pub const L2_C_SIGNAL_DEAD: u8 = 14;
    pub const L2_C_SIGNAL_NO_DATA: u8 = 15;
    pub const L1_L2_P_SIGNAL_WEAK: u8 = 16;
    pub const L1_L2_P_SIGNAL_DEAD: u8 = 17;
    pub const L1_L2_P_SIGNAL_NO_DATA: u8 = 18;
    pub const L1_L2_C_SIGNAL_WEAK: u8 = 19;
    pub const L1_L2_C_SIGNAL_DEAD: u8 = 20;
    pub const L1_L2_C_SIGNAL_NO_DATA: u8 = 21;
    pub const L1_SIGNAL_WEAK: u8 = 22;
    pub const L1_SIGNAL_DEAD: u8 = 23;
    pub const L1_SIGNAL_NO_DATA: u8 = 24;
    pub const L2_SIGNAL_WEAK: u8 = 25;
    pub const L2_SIGNAL_DEAD: u8 = 26;
    pub const L2_SIGNAL_NO_DATA: u8 = 27;
    pub const SV_TEMPORARILY_OUT: u8 = 28;
    pub const SV_WILL_BE_TEMPORARILY_OUT: u8 = 29;
    pub const ONLY_URA_VALID: u8 = 30;
    pub const MULTIPLE_PROBLEMS: u8 = 31;
}

use component::*;

/// NAV data health indication, 3 MSB of the 8 bit almanac health word
pub const NAV_DHI_OK: u8 = 0;

/// NAV data health summary: MSB of the 6 bit health word, 0 when all data is OK
fn nav_data_health_summary(health_bits: u8) -> bool {
    (health_bits >> 5) & 0x1 == 0
}

/// Health of `code` according to a GPS 6 bit health word.
pub fn check_6bit_health(health_bits: u8, code: Code) -> HealthState {
    if matches!(code, Code::GpsL1ca | Code::AuxGps | Code::GpsL1p)
        && !nav_data_health_summary(health_bits)
    {
        return HealthState::Unhealthy;
    }

    let b = health_bits & 0x1F;

    if matches!(
        b,
        ALL_SIGNALS_WEAK
            | ALL_SIGNALS_DEAD
            | ALL_SIGNALS_NO_DATA
            | SV_TEMPORARILY_OUT
            | SV_WILL_BE_TEMPORARILY_OUT
            | ONLY_URA_VALID
            | MULTIPLE_PROBLEMS
    ) {
        return HealthState::Unhealthy;
    }

    let affected = match code {
        Code::GpsL1ca | Code::AuxGps => matches!(
            b,
            L1_C_SIGNAL_WEAK
                | L1_C_SIGNAL_DEAD
                | L1_C_SIGNAL_NO_DATA
                | L1_L2_C_SIGNAL_WEAK
                | L1_L2_C_SIGNAL_DEAD
                | L1_L2_C_SIGNAL_NO_DATA
                | L1_SIGNAL_WEAK
                | L1_SIGNAL_DEAD
                | L1_SIGNAL_NO_DATA
        ),
        Code::GpsL2cm | Code::GpsL2cl | Code::GpsL2cx => matches!(
            b,
            L2_C_SIGNAL_WEAK
                | L2_C_SIGNAL_DEAD
                | L2_C_SIGNAL_NO_DATA
                | L1_L2_C_SIGNAL_WEAK
                | L1_L2_C_SIGNAL_DEAD
                | L1_L2_C_SIGNAL_NO_DATA
                | L2_SIGNAL_WEAK
                | L2_SIGNAL_DEAD
                | L2_SIGNAL_NO_DATA
        ),
        Code::GpsL1p => matches!(
            b,
            L1_P_SIGNAL_WEAK
                | L1_P_SIGNAL_DEAD
                | L1_P_SIGNAL_NO_DATA
                | L1_L2_P_SIGNAL_WEAK
                | L1_L2_P_SIGNAL_DEAD
                | L1_L2_P_SIGNAL_NO_DATA
                | L1_SIGNAL_WEAK
                | L1_SIGNAL_DEAD
                | L1_SIGNAL_NO_DATA
        ),
        Code::GpsL2p => matches!(
            b,
            L2_P_SIGNAL_WEAK
                | L2_P_SIGNAL_DEAD
                | L2_P_SIGNAL_NO_DATA
                | L1_L2_P_SIGNAL_WEAK
                | L1_L2_P_SIGNAL_DEAD
                | L1_L2_P_SIGNAL_NO_DATA
                | L2_SIGNAL_WEAK
                | L2_SIGNAL_DEAD
                | L2_SIGNAL_NO_DATA
        ),
        Code::GpsL5i | Code::GpsL5q | Code::GpsL5x => false,
        _ => return HealthState::Unknown,
    };

    if affected {
        HealthState::Unhealthy
    } else {
        HealthState::Healthy
    }
}

/// False only when the 6 bit health word flags `code` as unhealthy.
pub fn check_6bit_health_word(health_bits: u8, code: Code) -> bool {
    check_6bit_health(health_bits, code) != HealthState::Unhealthy
}

/// Checks the NAV data health indication (3 MSB) of an 8 bit health word.
/// Errors whose bit is set in `disabled_errors` are ignored.
pub fn check_nav_dhi(health_8bits: u8, disabled_errors: u8) -> bool {
    let nav_dhi = (health_8bits >> 5) & 0x7;
    nav_dhi == NAV_DHI_OK || disabled_errors & (1 << nav_dhi) != 0
}

/// Health of `code` according to an 8 bit almanac health word.
pub fn check_8bit_health_word(health_bits: u8, code: Code) -> bool {
    check_nav_dhi(health_bits, 0) && check_6bit_health_word(health_bits, code)
}

/// Health of `code` according to a 6 bit health word of almanac page 25.
pub fn check_alma_page25_health_word(health_bits: u8, code: Code) -> bool {
    let b = health_bits & 0x1F;
    if nav_data_health_summary(health_bits) && b == MULTIPLE_PROBLEMS {
        return false;
    }
    check_6bit_health_word(health_bits, code)
}

/// Extracts the 6 bit ephemeris health word from word 3 of LNAV subframe 1.
pub fn decode_shi_ephemeris(sf1w3: u32) -> u8 {
    ((sf1w3 >> 8) & 0x3F) as u8
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tests::init_logger;
    use rstest::rstest;

    #[rstest]
    #[case(0, 2.0)]
    #[case(5, 11.3)]
    #[case(15, 6144.0)]
    #[case(16, INVALID_URA_VALUE)]
    #[case(255, INVALID_URA_VALUE)]
    fn ura_decoding(#[case] index: u8, #[case] ura: f64) {
        init_logger();
        assert_eq!(decode_ura_index(index), ura);
    }

    #[rstest]
    #[case(-1.0, None)]
    #[case(0.0, Some(0))]
    #[case(2.0, Some(0))]
    #[case(2.5, Some(1))]
    #[case(2000.0, Some(13))]
    #[case(6144.0, Some(15))]
    #[case(33333.0, None)]
    fn ura_encoding(#[case] ura: f64, #[case] index: Option<u8>) {
        init_logger();
        assert_eq!(encode_ura(ura), index);
    }

    #[rstest]
    #[case(false, 0, 4)]
    #[case(false, 250, 4)]
    #[case(true, 0, 6)]
    #[case(true, 240, 8)]
    #[case(true, 496, 14)]
    #[case(true, 1022, 26)]
    #[case(true, 505, 50)]
    #[case(true, 511, 74)]
    #[case(true, 757, 98)]
    fn fit_interval(#[case] flag: bool, #[case] iodc: u16, #[case] hours: u32) {
        init_logger();
        assert_eq!(decode_fit_interval(flag, iodc), hours * 3600);
    }

    #[rstest]
    #[case(0x00, Code::GpsL1ca, true)]
    #[case(0x00, Code::GpsL2cm, true)]
    #[case(0x2B, Code::GpsL1ca, false)]
    #[case(0x2B, Code::GpsL2cm, true)]
    #[case(0x0B, Code::GpsL1ca, false)]
    #[case(0x0B, Code::GpsL2cm, true)]
    #[case(0x2E, Code::GpsL1ca, false)]
    #[case(0x2E, Code::GpsL2cm, false)]
    #[case(0x0E, Code::GpsL1ca, true)]
    #[case(0x0E, Code::GpsL2cm, false)]
    #[case(0x04, Code::GpsL1p, false)]
    #[case(0x07, Code::GpsL2p, false)]
    #[case(0x20, Code::GpsL1p, false)]
    #[case(0x01, Code::GpsL2p, false)]
    #[case(0x00, Code::GpsL5i, true)]
    fn six_bit_health_word(#[case] bits: u8, #[case] code: Code, #[case] healthy: bool) {
        init_logger();
        assert_eq!(check_6bit_health_word(bits, code), healthy);
    }

    #[test]
    fn unknown_signals() {
        init_logger();
        assert_eq!(check_6bit_health(0, Code::GpsL1ci), HealthState::Unknown);
        assert!(check_6bit_health_word(0, Code::GpsL1ci));
        assert_eq!(check_6bit_health(0x1F, Code::GpsL1ci), HealthState::Unhealthy);
    }

    #[test]
    fn eight_bit_health_word() {
        init_logger();
        assert!(check_nav_dhi(0x00, 0));
        assert!(!check_nav_dhi(0x20, 0));
        assert!(check_nav_dhi(0x20, 0x02));
        assert!(check_8bit_health_word(0x00, Code::GpsL1ca));
        assert!(!check_8bit_health_word(0xE0, Code::GpsL1ca));
        assert!(!check_8bit_health_word(0x0B, Code::GpsL1ca));
        assert!(check_alma_page25_health_word(0x0B, Code::GpsL2cm));
        assert!(!check_alma_page25_health_word(0x1F, Code::GpsL2cm));
        assert_eq!(decode_shi_ephemeris(0x3F << 8), 0x3F);
    }
}
