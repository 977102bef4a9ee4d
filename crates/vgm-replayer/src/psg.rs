//! PSG driver: one or two SN76489 chips behind a single emulator handle.
//!
//! The driver owns the chips, services the PSG opcodes (register writes and
//! Game Gear stereo masks) and maintains the stereo channel views the
//! dispatcher mixes from.

use std::io::Read;

use sn76489::{PsgSettings, Sn76489};

use crate::emulator::{read_operand, EmulatorHandle};
use crate::error::{ReplayerError, Result};

/// Channels per chip: three tones plus noise.
const CHANNELS_PER_CHIP: usize = 4;

/// Opcodes serviced by the driver. The second-chip opcodes are always
/// claimed so that a single-chip stream using them reports
/// `DualChipDisabled` rather than an unknown opcode.
const OPCODES: [u8; 4] = [0x50, 0x30, 0x4F, 0x3F];

/// PSG write opcode, chip #1.
const OP_WRITE_1: u8 = 0x50;
/// PSG write opcode, chip #2.
const OP_WRITE_2: u8 = 0x30;
/// Game Gear stereo mask opcode, chip #1.
const OP_STEREO_1: u8 = 0x4F;
/// Game Gear stereo mask opcode, chip #2.
const OP_STEREO_2: u8 = 0x3F;

/// One or two SN76489 chips exposed to the dispatcher as a single
/// [`EmulatorHandle`].
///
/// # Game Gear stereo
///
/// Each chip carries an 8-bit mask laid out `L3 L2 L1 L0 R3 R2 R1 R0`
/// (channel 3 is noise). After every sample, channel `j` of chip `k` lands
/// in `right[4k + j]` when mask bit `j` is set and in `left[4k + j]` when
/// bit `j + 4` is set; gated-off slots read 0. The power-on mask is 0xFF,
/// all channels on both sides.
pub struct PsgDriver {
    chips: Vec<Sn76489>,
    masks: Vec<u8>,
    left: Vec<f32>,
    right: Vec<f32>,
    dual_chip: bool,
    /// Stereo mask writes are honoured unless the header flagged them off.
    gg_stereo: bool,
}

impl PsgDriver {
    /// Build a driver from header settings; two chip instances when
    /// `dual_chip` is set.
    ///
    /// # Errors
    ///
    /// Propagates [`sn76489::Sn76489Error`] for out-of-range settings.
    pub fn new(settings: &PsgSettings) -> Result<Self> {
        let chip_count = if settings.dual_chip { 2 } else { 1 };
        let mut chips = Vec::with_capacity(chip_count);
        for _ in 0..chip_count {
            chips.push(Sn76489::new(settings)?);
        }
        Ok(PsgDriver {
            chips,
            masks: vec![0xFF; chip_count],
            left: vec![0.0; chip_count * CHANNELS_PER_CHIP],
            right: vec![0.0; chip_count * CHANNELS_PER_CHIP],
            dual_chip: settings.dual_chip,
            gg_stereo: !settings.has_flag(PsgSettings::FLAG_GG_STEREO_OFF),
        })
    }

    /// Number of chip instances (1 or 2).
    pub fn chip_count(&self) -> usize {
        self.chips.len()
    }

    /// Current stereo mask of a chip.
    pub fn stereo_mask(&self, chip: usize) -> u8 {
        self.masks.get(chip).copied().unwrap_or(0xFF)
    }

    /// Access a chip for diagnostics (muting, register inspection).
    pub fn chip_mut(&mut self, chip: usize) -> Option<&mut Sn76489> {
        self.chips.get_mut(chip)
    }

    fn require_second_chip(&self) -> Result<()> {
        if self.dual_chip {
            Ok(())
        } else {
            Err(ReplayerError::DualChipDisabled)
        }
    }

    fn set_stereo_mask(&mut self, chip: usize, mask: u8) {
        if self.gg_stereo {
            self.masks[chip] = mask;
        }
    }

    fn refresh_views(&mut self) {
        for (k, chip) in self.chips.iter().enumerate() {
            let mask = self.masks[k];
            let channels = chip.channels();
            for (j, &value) in channels.iter().enumerate() {
                let slot = k * CHANNELS_PER_CHIP + j;
                self.right[slot] = if mask & (1 << j) != 0 { value } else { 0.0 };
                self.left[slot] = if mask & (1 << (j + 4)) != 0 { value } else { 0.0 };
            }
        }
    }
}

impl EmulatorHandle for PsgDriver {
    fn opcodes(&self) -> &[u8] {
        &OPCODES
    }

    fn execute(&mut self, opcode: u8, data: &mut dyn Read) -> Result<()> {
        match opcode {
            OP_WRITE_1 => {
                let value = read_operand(data)?;
                self.chips[0].write(value);
            }
            OP_WRITE_2 => {
                self.require_second_chip()?;
                let value = read_operand(data)?;
                self.chips[1].write(value);
            }
            OP_STEREO_1 => {
                let mask = read_operand(data)?;
                self.set_stereo_mask(0, mask);
            }
            OP_STEREO_2 => {
                self.require_second_chip()?;
                let mask = read_operand(data)?;
                self.set_stereo_mask(1, mask);
            }
            other => return Err(ReplayerError::UnknownOpcode(other)),
        }
        Ok(())
    }

    fn advance_sample(&mut self, n: u32) {
        for _ in 0..n {
            for chip in &mut self.chips {
                chip.clock();
            }
            self.refresh_views();
        }
    }

    fn left_channels(&self) -> &[f32] {
        &self.left
    }

    fn right_channels(&self) -> &[f32] {
        &self.right
    }
}
