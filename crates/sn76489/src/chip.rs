//! SN76489 tone and noise generation.
//!
//! The hardware steps its generators at clock/16. This model bridges that
//! rate to the 44,100 Hz host rate with a 24-bit fractional accumulator: each
//! host sample advances the generators by the integer part of the running
//! cycle count and retains the fraction. An optional "quality" path instead
//! steps the generators once per internal tick and downsamples with a 2^31
//! rational counter.

use crate::settings::PsgSettings;
use crate::tables::attenuation_table;
use crate::{Result, Sn76489Error};

/// Host output rate in Hz. VGM timing is defined against this rate.
pub const SAMPLE_RATE: u32 = 44_100;

/// Fractional bits in the sample-rate accumulator.
const BASE_FRAC_BITS: u32 = 24;

/// Hardware divider between the input clock and the generator step rate.
const CLOCK_DIVIDER: u32 = 16;

/// One square-wave tone channel.
#[derive(Debug, Clone, Copy)]
struct ToneChannel {
    /// 10-bit period, assembled from the latch nibble and the data byte.
    freq: u16,
    /// Attenuation index 0-15, 15 is silence.
    volume: u8,
    /// Cycle accumulator; bit 0x400 marks a due edge flip.
    count: i32,
    /// Current square level.
    edge: bool,
    /// Host-side diagnostic mute.
    mute: bool,
}

impl ToneChannel {
    fn new() -> Self {
        ToneChannel {
            freq: 0,
            volume: 0x0F,
            count: 0,
            edge: false,
            mute: false,
        }
    }
}

/// Noise generator mode selected by bit 2 of the control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseMode {
    /// Feed bit 0 back unchanged; the seed rotates with period `sr_width`.
    Periodic,
    /// Feed back the parity of the tapped bits; pseudo-random output.
    White,
}

#[derive(Debug, Clone, Copy)]
struct NoiseChannel {
    mode: NoiseMode,
    /// Track the tone-2 period instead of `freq`.
    tone2_ref: bool,
    freq: u16,
    volume: u8,
    count: i32,
    /// LFSR state; never zero.
    seed: u16,
    mute: bool,
}

impl NoiseChannel {
    fn new(sr_width: u8) -> Self {
        NoiseChannel {
            mode: NoiseMode::Periodic,
            tone2_ref: false,
            freq: 32,
            volume: 0x0F,
            count: 0,
            seed: 1 << (sr_width - 1),
            mute: false,
        }
    }
}

/// SN76489 chip model.
///
/// Write register bytes with [`Sn76489::write`], advance one host sample with
/// [`Sn76489::clock`], then read the four per-channel outputs (tones 0-2 and
/// noise) with [`Sn76489::channels`]. No mixing happens here; combining the
/// channels is the caller's business.
#[derive(Debug, Clone)]
pub struct Sn76489 {
    tone: [ToneChannel; 3],
    noise: NoiseChannel,
    /// Last latched register index 0-7; data bytes continue this register.
    adr: u8,
    /// Fractional-cycle accumulator, `BASE_FRAC_BITS` fractional bits.
    base_count: i32,
    /// Cycles per host sample in the same fixed-point format.
    base_incr: i32,
    channels: [f32; 4],
    volume_table: [f32; 16],
    sr_width: u8,
    feedback: u16,
    negate: bool,
    quality: bool,
    /// Rational down-counter state for the quality path.
    sng_time: u32,
    sng_step: u32,
    real_step: u32,
}

impl Sn76489 {
    /// Create a chip instance from header settings.
    ///
    /// # Errors
    ///
    /// Returns [`Sn76489Error::InvalidSetting`] when `sr_width` is 0 or
    /// greater than 16.
    pub fn new(settings: &PsgSettings) -> Result<Self> {
        if settings.sr_width == 0 || settings.sr_width > 16 {
            return Err(Sn76489Error::InvalidSetting(format!(
                "shift register width {} outside 1-16",
                settings.sr_width
            )));
        }

        let base_incr = ((u64::from(settings.clock) << BASE_FRAC_BITS)
            / u64::from(CLOCK_DIVIDER * SAMPLE_RATE)) as i32;
        let internal_clock = settings.clock / CLOCK_DIVIDER;

        Ok(Sn76489 {
            tone: [ToneChannel::new(); 3],
            noise: NoiseChannel::new(settings.sr_width),
            adr: 0,
            base_count: 0,
            base_incr,
            channels: [0.0; 4],
            volume_table: attenuation_table(),
            sr_width: settings.sr_width,
            feedback: settings.feedback,
            negate: settings.has_flag(PsgSettings::FLAG_OUTPUT_NEG),
            quality: false,
            sng_time: 0,
            sng_step: if internal_clock > 0 {
                0x8000_0000u32 / internal_clock
            } else {
                0
            },
            real_step: 0x8000_0000u32 / SAMPLE_RATE,
        })
    }

    /// Reset generators and registers to the power-on state.
    ///
    /// Clock configuration and the quality-mode selection survive a reset.
    pub fn reset(&mut self) {
        self.tone = [ToneChannel::new(); 3];
        self.noise = NoiseChannel::new(self.sr_width);
        self.adr = 0;
        self.base_count = 0;
        self.sng_time = 0;
        self.channels = [0.0; 4];
    }

    /// Apply one register write byte.
    ///
    /// A byte with bit 7 set latches a register index in its upper nibble and
    /// carries four data bits; a byte with bit 7 clear continues the latched
    /// register with the high six bits of a tone period. Continuations while
    /// the noise registers are latched do not alter the noise period.
    pub fn write(&mut self, val: u8) {
        if val & 0x80 != 0 {
            self.adr = (val >> 4) & 0x07;
            match self.adr {
                6 => self.write_noise_control(val),
                7 => self.noise.volume = val & 0x0F,
                1 | 3 | 5 => self.tone[usize::from((self.adr - 1) / 2)].volume = val & 0x0F,
                _ => {
                    let tone = &mut self.tone[usize::from(self.adr / 2)];
                    tone.freq = (tone.freq & 0x3F0) | u16::from(val & 0x0F);
                }
            }
        } else if let Some(tone) = self.tone.get_mut(usize::from(self.adr / 2)) {
            tone.freq = (u16::from(val & 0x3F) << 4) | (tone.freq & 0x0F);
        }
    }

    fn write_noise_control(&mut self, val: u8) {
        self.noise.mode = if val & 0x04 != 0 {
            NoiseMode::White
        } else {
            NoiseMode::Periodic
        };
        if val & 0x03 == 0x03 {
            self.noise.tone2_ref = true;
            self.noise.freq = self.tone[2].freq;
        } else {
            self.noise.tone2_ref = false;
            self.noise.freq = 32 << (val & 0x03);
        }
        if self.noise.freq == 0 {
            self.noise.freq = 1;
        }
        self.noise.seed = 1 << (self.sr_width - 1);
    }

    /// Produce one output sample at the host rate.
    pub fn clock(&mut self) {
        if self.quality {
            while self.real_step > self.sng_time {
                self.sng_time += self.sng_step;
                self.step(1);
            }
            self.sng_time -= self.real_step;
        } else {
            self.base_count += self.base_incr;
            let incr = self.base_count >> BASE_FRAC_BITS;
            self.base_count &= (1 << BASE_FRAC_BITS) - 1;
            self.step(incr);
        }
        self.refresh_channels();
    }

    /// Advance generator counters by `incr` internal ticks.
    fn step(&mut self, incr: i32) {
        self.noise.count += incr;
        if self.noise.count & 0x100 != 0 {
            self.shift_noise();
            let period = if self.noise.tone2_ref {
                self.tone[2].freq
            } else {
                self.noise.freq
            };
            self.noise.count -= i32::from(period);
        }

        for tone in &mut self.tone {
            tone.count += incr;
            if tone.count & 0x400 != 0 {
                if tone.freq > 1 {
                    tone.edge = !tone.edge;
                    tone.count -= i32::from(tone.freq);
                } else {
                    // Periods 0 and 1 are above the audible band; pin the
                    // level instead of toggling at the step rate.
                    tone.edge = true;
                }
            }
        }
    }

    fn shift_noise(&mut self) {
        let fed = match self.noise.mode {
            NoiseMode::White => ((self.noise.seed & self.feedback).count_ones() & 1) as u16,
            NoiseMode::Periodic => self.noise.seed & 1,
        };
        self.noise.seed = (self.noise.seed >> 1) | (fed << (self.sr_width - 1));
    }

    fn refresh_channels(&mut self) {
        let sign = if self.negate { -1.0f32 } else { 1.0f32 };
        for (out, tone) in self.channels.iter_mut().zip(self.tone.iter()) {
            *out = if tone.mute {
                0.0
            } else {
                let level = self.volume_table[usize::from(tone.volume)];
                if tone.edge { level * sign } else { -level * sign }
            };
        }
        self.channels[3] = if self.noise.mute {
            0.0
        } else {
            let level = self.volume_table[usize::from(self.noise.volume)];
            if self.noise.seed & 1 != 0 {
                level * sign
            } else {
                -level * sign
            }
        };
    }

    /// Per-channel outputs of the most recent [`Sn76489::clock`] call:
    /// tones 0-2 followed by noise.
    #[inline]
    pub fn channels(&self) -> [f32; 4] {
        self.channels
    }

    /// Switch between the default fractional-increment path and the
    /// high-rate quality path. Ignored for degenerate clocks below the
    /// divider.
    pub fn set_quality(&mut self, enable: bool) {
        self.quality = enable && self.sng_step > 0;
        self.sng_time = 0;
    }

    /// Mute or unmute one channel (0-2 tones, 3 noise).
    pub fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        match channel {
            0..=2 => self.tone[channel].mute = mute,
            3 => self.noise.mute = mute,
            _ => {}
        }
    }

    /// Whether a channel is muted (out-of-range channels read as unmuted).
    pub fn is_channel_muted(&self, channel: usize) -> bool {
        match channel {
            0..=2 => self.tone[channel].mute,
            3 => self.noise.mute,
            _ => false,
        }
    }

    /// Assembled 10-bit period of a tone channel (0 for invalid indices).
    pub fn tone_period(&self, channel: usize) -> u16 {
        self.tone.get(channel).map_or(0, |t| t.freq)
    }

    /// Attenuation index of a tone channel (15 for invalid indices).
    pub fn tone_attenuation(&self, channel: usize) -> u8 {
        self.tone.get(channel).map_or(0x0F, |t| t.volume)
    }

    /// Current noise generator mode.
    pub fn noise_mode(&self) -> NoiseMode {
        self.noise.mode
    }

    /// Current noise LFSR state.
    pub fn noise_seed(&self) -> u16 {
        self.noise.seed
    }

    /// Noise attenuation index.
    pub fn noise_attenuation(&self) -> u8 {
        self.noise.volume
    }
}
