//! VGM command dispatch, timing and loop playback.
//!
//! [`VgmPlayer`] consumes the music-data region one opcode at a time. Wait
//! and end-of-data opcodes are built in; everything else is routed to the
//! emulator handle that claimed the opcode at install time. Waits advance
//! every installed handle sample by sample and fire the per-sample callback
//! with a borrowed view of the playback state.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use log::debug;

use crate::emulator::{read_operand, EmulatorHandle};
use crate::error::{ReplayerError, Result};
use crate::mixer;
use crate::track::TrackInfo;

/// Wait length of opcode 0x62: one 60 Hz frame at 44,100 Hz.
const FRAME_60HZ_SAMPLES: u32 = 735;
/// Wait length of opcode 0x63: one 50 Hz frame.
const FRAME_50HZ_SAMPLES: u32 = 882;

/// What a single [`VgmPlayer::next`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One command was consumed (a chip write or a wait).
    Command,
    /// The end marker was reached and playback wrapped to the loop point.
    Looped,
    /// The end marker was reached with no loop; the stream is finished.
    Ended,
}

/// Commands the dispatcher executes itself.
#[derive(Debug, Clone, Copy)]
enum Builtin {
    /// `0x61 aa bb`: wait a 16-bit little-endian sample count.
    WaitSamples,
    /// `0x62`: wait one NTSC frame.
    Wait60th,
    /// `0x63`: wait one PAL frame.
    Wait50th,
    /// `0x66`: end of music data.
    End,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Builtin(Builtin),
    Emulator(usize),
}

/// Borrowed playback state handed to the per-sample callback.
///
/// The view is only valid for the duration of the callback; it exposes the
/// counters of the sample that was just produced plus the mixed outputs of
/// all installed emulators.
pub struct SampleView<'v> {
    emulators: &'v [Box<dyn EmulatorHandle>],
    position: u32,
    samples_played: u32,
    loops_played: u32,
}

impl SampleView<'_> {
    /// Sample position within the track, wrapping into the loop region.
    #[inline]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Samples produced since playback started; never decreases.
    #[inline]
    pub fn samples_played(&self) -> u32 {
        self.samples_played
    }

    /// Completed loop count.
    #[inline]
    pub fn loops_played(&self) -> u32 {
        self.loops_played
    }

    /// Wall-clock time of this sample in seconds.
    #[inline]
    pub fn timestamp(&self) -> f64 {
        f64::from(self.samples_played) / f64::from(sn76489::SAMPLE_RATE)
    }

    /// Mixed left output across all emulators.
    pub fn left_output(&self) -> f32 {
        mixer::left_output(self.emulators)
    }

    /// Mixed right output across all emulators.
    pub fn right_output(&self) -> f32 {
        mixer::right_output(self.emulators)
    }

    /// Mono fold-down of the mixed outputs.
    pub fn mono_output(&self) -> f32 {
        mixer::mono_output(self.emulators)
    }
}

type SampleCallback<'a> = Box<dyn FnMut(&SampleView<'_>) + 'a>;

/// Byte-opcode state machine over a VGM music-data region.
///
/// The player owns the data cursor and every installed emulator handle.
/// Each [`VgmPlayer::next`] call consumes exactly one command; the caller
/// drives the loop and decides when to stop on [`Step::Looped`] or
/// [`Step::Ended`].
///
/// # Example
/// ```
/// use sn76489::PsgSettings;
/// use vgm_replayer::{PsgDriver, Step, TrackInfo, VgmPlayer};
///
/// let mut player = VgmPlayer::new(TrackInfo::default(), vec![0x62, 0x66]);
/// player
///     .install(Box::new(PsgDriver::new(&PsgSettings::default()).unwrap()))
///     .unwrap();
/// assert_eq!(player.next().unwrap(), Step::Command);
/// assert_eq!(player.next().unwrap(), Step::Ended);
/// assert!(player.end_of_stream());
/// ```
pub struct VgmPlayer<'a> {
    /// Music-data region; byte 0 corresponds to file offset
    /// `track.data_offset`.
    data: Cursor<Vec<u8>>,
    track: TrackInfo,
    emulators: Vec<Box<dyn EmulatorHandle>>,
    handlers: HashMap<u8, Slot>,
    position: u32,
    samples_played: u32,
    loops_played: u32,
    end_of_stream: bool,
    on_sample: Option<SampleCallback<'a>>,
}

impl<'a> VgmPlayer<'a> {
    /// Create a player over a music-data region already positioned at the
    /// first command.
    pub fn new(track: TrackInfo, data: Vec<u8>) -> Self {
        let mut handlers = HashMap::new();
        handlers.insert(0x61, Slot::Builtin(Builtin::WaitSamples));
        handlers.insert(0x62, Slot::Builtin(Builtin::Wait60th));
        handlers.insert(0x63, Slot::Builtin(Builtin::Wait50th));
        handlers.insert(0x66, Slot::Builtin(Builtin::End));
        VgmPlayer {
            data: Cursor::new(data),
            track,
            emulators: Vec::new(),
            handlers,
            position: 0,
            samples_played: 0,
            loops_played: 0,
            end_of_stream: false,
            on_sample: None,
        }
    }

    /// Install an emulator handle, claiming its opcodes.
    ///
    /// # Errors
    ///
    /// Fails with [`ReplayerError::DuplicateHandler`] when any opcode is
    /// already registered; nothing is registered from the conflicting
    /// handle.
    pub fn install(&mut self, handle: Box<dyn EmulatorHandle>) -> Result<()> {
        for &opcode in handle.opcodes() {
            if self.handlers.contains_key(&opcode) {
                return Err(ReplayerError::DuplicateHandler(opcode));
            }
        }
        let index = self.emulators.len();
        for &opcode in handle.opcodes() {
            self.handlers.insert(opcode, Slot::Emulator(index));
        }
        debug!(
            "installed emulator {} serving {} opcodes",
            index,
            handle.opcodes().len()
        );
        self.emulators.push(handle);
        Ok(())
    }

    /// Register the per-sample callback.
    ///
    /// The callback fires once for every sample produced inside a wait,
    /// after all emulators have advanced for that sample. It must not
    /// re-enter the player.
    pub fn on_sample<F>(&mut self, callback: F)
    where
        F: FnMut(&SampleView<'_>) + 'a,
    {
        self.on_sample = Some(Box::new(callback));
    }

    /// Parse and execute exactly one command.
    ///
    /// # Errors
    ///
    /// [`ReplayerError::AlreadyEnded`] once the stream has finished,
    /// [`ReplayerError::UnknownOpcode`] for unregistered opcodes, and
    /// whatever the executing handler reports.
    pub fn next(&mut self) -> Result<Step> {
        if self.end_of_stream {
            return Err(ReplayerError::AlreadyEnded);
        }

        let mut opcode = [0u8; 1];
        if self.data.read(&mut opcode)? == 0 {
            // Running off the end of the data region ends the stream the
            // same way an explicit end marker does.
            return Ok(self.finish_stream());
        }

        let slot = match self.handlers.get(&opcode[0]) {
            Some(slot) => *slot,
            None => return Err(ReplayerError::UnknownOpcode(opcode[0])),
        };

        match slot {
            Slot::Builtin(Builtin::WaitSamples) => {
                let lo = read_operand(&mut self.data)?;
                let hi = read_operand(&mut self.data)?;
                self.advance_sample(u32::from(u16::from_le_bytes([lo, hi])));
                Ok(Step::Command)
            }
            Slot::Builtin(Builtin::Wait60th) => {
                self.advance_sample(FRAME_60HZ_SAMPLES);
                Ok(Step::Command)
            }
            Slot::Builtin(Builtin::Wait50th) => {
                self.advance_sample(FRAME_50HZ_SAMPLES);
                Ok(Step::Command)
            }
            Slot::Builtin(Builtin::End) => Ok(self.finish_stream()),
            Slot::Emulator(index) => {
                self.emulators[index].execute(opcode[0], &mut self.data)?;
                Ok(Step::Command)
            }
        }
    }

    /// Advance every installed handle by `n` samples, firing the callback
    /// once per sample after all handles have advanced.
    fn advance_sample(&mut self, n: u32) {
        for _ in 0..n {
            self.samples_played += 1;
            self.position += 1;
            for emulator in &mut self.emulators {
                emulator.advance_sample(1);
            }
            if let Some(callback) = self.on_sample.as_mut() {
                let view = SampleView {
                    emulators: &self.emulators,
                    position: self.position,
                    samples_played: self.samples_played,
                    loops_played: self.loops_played,
                };
                callback(&view);
            }
        }
    }

    /// End-of-data handling: wrap to the loop point or finish the stream.
    fn finish_stream(&mut self) -> Step {
        if self.track.has_loop() {
            self.position = self.track.loop_start_sample();
            self.data
                .set_position(u64::from(self.track.loop_data_offset()));
            self.loops_played += 1;
            debug!(
                "loop {} at sample {}",
                self.loops_played, self.samples_played
            );
            Step::Looped
        } else {
            self.end_of_stream = true;
            debug!("end of stream after {} samples", self.samples_played);
            Step::Ended
        }
    }

    /// Sample position within the track, wrapping into the loop region.
    #[inline]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Samples produced since playback started; never decreases.
    #[inline]
    pub fn samples_played(&self) -> u32 {
        self.samples_played
    }

    /// Completed loop count.
    #[inline]
    pub fn loops_played(&self) -> u32 {
        self.loops_played
    }

    /// Whether the stream has finished (sticky).
    #[inline]
    pub fn end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Whether playback is currently inside the loop region.
    pub fn playing_loop(&self) -> bool {
        self.track.has_loop() && self.position >= self.track.loop_start_sample()
    }

    /// Mixed left output of the most recent sample.
    pub fn left_output(&self) -> f32 {
        mixer::left_output(&self.emulators)
    }

    /// Mixed right output of the most recent sample.
    pub fn right_output(&self) -> f32 {
        mixer::right_output(&self.emulators)
    }

    /// Mono fold-down of the mixed outputs.
    pub fn mono_output(&self) -> f32 {
        mixer::mono_output(&self.emulators)
    }
}
