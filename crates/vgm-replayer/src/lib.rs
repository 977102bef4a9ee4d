//! VGM Command-Stream Replayer
//!
//! Plays back the music-data region of a VGM file by dispatching byte
//! opcodes to registered chip emulators and advancing virtual time in
//! 44,100 Hz sample units, including loop semantics.
//!
//! The dispatcher knows nothing about any particular chip: emulators are
//! installed behind the [`EmulatorHandle`] trait, which pairs an opcode set
//! with per-sample advancement and per-channel stereo output views. The one
//! handle this workspace ships is [`PsgDriver`], wrapping one or two SN76489
//! chips from the `sn76489` crate.
//!
//! Header parsing, GD3 tags and VGZ decompression are external concerns;
//! this crate consumes a [`TrackInfo`] plus the raw music-data bytes with
//! the cursor already positioned at the first command.
//!
//! # Quick start
//! ```
//! use sn76489::PsgSettings;
//! use vgm_replayer::{PsgDriver, Step, TrackInfo, VgmPlayer};
//!
//! // One 50 Hz frame of silence, then end of data.
//! let data = vec![0x63, 0x66];
//! let mut player = VgmPlayer::new(TrackInfo::default(), data);
//! player
//!     .install(Box::new(PsgDriver::new(&PsgSettings::default()).unwrap()))
//!     .unwrap();
//!
//! let mut samples = 0u32;
//! loop {
//!     match player.next().unwrap() {
//!         Step::Command | Step::Looped => samples = player.samples_played(),
//!         Step::Ended => break,
//!     }
//! }
//! assert_eq!(samples, 882);
//! ```

#![warn(missing_docs)]

mod emulator;
mod error;
mod mixer;
mod player;
mod psg;
mod track;

pub use emulator::{read_operand, EmulatorHandle};
pub use error::{ReplayerError, Result};
pub use player::{SampleView, Step, VgmPlayer};
pub use psg::PsgDriver;
pub use track::TrackInfo;
