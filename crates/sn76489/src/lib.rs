//! SN76489 PSG Emulator
//!
//! A cycle-accurate emulator of the Texas Instruments SN76489 Programmable
//! Sound Generator as found in the Sega Master System, Game Gear and many
//! other machines of the era.
//!
//! # Features
//! - 3 square-wave tone channels with 10-bit periods
//! - 1 noise channel driven by a configurable-width LFSR (periodic or white)
//! - Hardware attenuation ladder (2 dB per step, entry 15 is silence)
//! - Fractional-clock rate conversion from chip rate to 44,100 Hz
//! - Optional high-rate "quality" path that steps the generators at clock/16
//!
//! # Quick start
//! ```
//! use sn76489::{PsgSettings, Sn76489};
//!
//! let mut chip = Sn76489::new(&PsgSettings::default()).unwrap();
//! chip.write(0x8E); // Latch tone 0, period low nibble
//! chip.write(0x0D); // Period high six bits
//! chip.write(0x90); // Tone 0 attenuation 0 (full volume)
//! chip.clock();
//! let [a, _, _, noise] = chip.channels();
//! assert!(a.abs() <= 1.0 && noise.abs() <= 1.0);
//! ```
//!
//! Command-stream playback lives in the `vgm-replayer` crate, which drives
//! this chip from parsed VGM opcodes.

#![warn(missing_docs)]

mod chip;
mod settings;
mod tables;

/// Error types for PSG chip emulator operations
///
/// This enum only contains errors that can occur while configuring the core
/// chip emulation. Command-stream errors are handled by the `vgm-replayer`
/// crate.
#[derive(thiserror::Error, Debug)]
pub enum Sn76489Error {
    /// A configuration value was outside the range the hardware supports
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, Sn76489Error>;

// Public API exports
pub use chip::{NoiseMode, Sn76489, SAMPLE_RATE};
pub use settings::PsgSettings;
pub use tables::{attenuation_table, VOLUME_STEPS};
