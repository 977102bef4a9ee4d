//! SN76489 attenuation ladder.
//!
//! The chip attenuates each channel in 2 dB steps. Entry 0 is full output,
//! entry 15 is hard silence.

/// Number of attenuation steps including the mute entry.
pub const VOLUME_STEPS: usize = 16;

/// Build the 16-entry output-level table.
///
/// `v[0] = 1.0` and every following step attenuates by a further 2 dB
/// (a factor of `10^-0.1`); entry 15 is 0. The running product is computed
/// in `f64` but each stored entry is `f32`, so the table is bit-identical
/// across platforms.
pub fn attenuation_table() -> [f32; VOLUME_STEPS] {
    let mut table = [0.0f32; VOLUME_STEPS];
    let mut level = 1.0f64;
    for entry in table.iter_mut().take(VOLUME_STEPS - 1) {
        *entry = level as f32;
        level *= 10f64.powf(-0.1);
    }
    table
}
