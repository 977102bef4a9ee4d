//! End-to-end playback over hand-built command streams.

use std::cell::Cell;

use sn76489::PsgSettings;
use vgm_replayer::{PsgDriver, ReplayerError, Step, TrackInfo, VgmPlayer};

/// Settings used by the scenario streams: NTSC clock, 16-bit LFSR,
/// taps 0x0009, FREQ0 flag, single chip.
fn scenario_settings() -> PsgSettings {
    PsgSettings {
        flags: PsgSettings::FLAG_FREQ0,
        ..PsgSettings::default()
    }
}

fn player_with_psg<'a>(track: TrackInfo, data: Vec<u8>) -> VgmPlayer<'a> {
    let mut player = VgmPlayer::new(track, data);
    player
        .install(Box::new(PsgDriver::new(&scenario_settings()).unwrap()))
        .unwrap();
    player
}

#[test]
fn minimal_silence_stream() {
    // A bare end marker: no samples, no callbacks.
    let callbacks = Cell::new(0u32);
    let mut player = player_with_psg(TrackInfo::default(), vec![0x66]);
    player.on_sample(|_| callbacks.set(callbacks.get() + 1));

    assert_eq!(player.next().unwrap(), Step::Ended);
    assert_eq!(callbacks.get(), 0);
    assert_eq!(player.samples_played(), 0);
    assert!(player.end_of_stream());
}

#[test]
fn one_frame_wait() {
    let callbacks = Cell::new(0u32);
    let last_position = Cell::new(0u32);
    let mut player = player_with_psg(TrackInfo::default(), vec![0x62, 0x66]);
    player.on_sample(|view| {
        callbacks.set(callbacks.get() + 1);
        last_position.set(view.position());
        assert!(view.samples_played() >= view.position());
    });

    assert_eq!(player.next().unwrap(), Step::Command);
    assert_eq!(callbacks.get(), 735);
    assert_eq!(last_position.get(), 735);
    assert_eq!(player.next().unwrap(), Step::Ended);
    assert_eq!(player.samples_played(), 735);
}

#[test]
fn tone_write_then_single_sample() {
    // Program tone 0 to full volume and a 0x200 period, then wait one
    // sample. The square edge starts low, so the first sample reads -1 on
    // channel 0 and the four-channel mean is -0.25 on both sides.
    let callbacks = Cell::new(0u32);
    let left = Cell::new(0.0f32);
    let right = Cell::new(0.0f32);
    let data = vec![0x50, 0x90, 0x50, 0x00, 0x50, 0x20, 0x61, 0x01, 0x00, 0x66];
    let mut player = player_with_psg(TrackInfo::default(), data);
    player.on_sample(|view| {
        callbacks.set(callbacks.get() + 1);
        left.set(view.left_output());
        right.set(view.right_output());
    });

    // Three register writes, then the wait.
    for _ in 0..4 {
        assert_eq!(player.next().unwrap(), Step::Command);
    }
    assert_eq!(callbacks.get(), 1);
    assert_eq!(left.get(), -0.25);
    assert_eq!(right.get(), -0.25);
    assert_eq!(player.next().unwrap(), Step::Ended);
}

#[test]
fn gg_stereo_mask_stream() {
    // Mask 0x11 keeps only channel 0 on each side; with all volumes still
    // at power-on attenuation the mix stays silent for the whole frame.
    let callbacks = Cell::new(0u32);
    let mut player = player_with_psg(TrackInfo::default(), vec![0x4F, 0x11, 0x62, 0x66]);
    player.on_sample(|view| {
        callbacks.set(callbacks.get() + 1);
        assert_eq!(view.left_output(), 0.0);
        assert_eq!(view.right_output(), 0.0);
        assert_eq!(view.mono_output(), 0.0);
    });

    assert_eq!(player.next().unwrap(), Step::Command);
    assert_eq!(player.next().unwrap(), Step::Command);
    assert_eq!(callbacks.get(), 735);
    assert_eq!(player.next().unwrap(), Step::Ended);
}

#[test]
fn looped_stream_counters() {
    // Loop region is the second 0x62: every wrap replays one frame.
    let track = TrackInfo {
        total_samples: 1470,
        loop_samples: 735,
        loop_offset: 0x41,
        data_offset: 0x40,
    };
    let mut player = player_with_psg(track, vec![0x62, 0x62, 0x66]);

    let mut wraps = 0u32;
    while wraps < 3 {
        match player.next().unwrap() {
            Step::Command => {}
            Step::Looped => {
                wraps += 1;
                assert_eq!(player.loops_played(), wraps);
                assert_eq!(player.position(), 735, "loop wraps to the boundary");
                assert_eq!(player.samples_played(), 1470 + (wraps - 1) * 735);
                assert!(player.playing_loop());
            }
            Step::Ended => panic!("looping stream must not end"),
        }
    }
    assert!(!player.end_of_stream());
}

#[test]
fn dual_chip_write_rejected_in_single_chip_stream() {
    let mut player = player_with_psg(TrackInfo::default(), vec![0x30, 0x00]);
    assert!(matches!(
        player.next(),
        Err(ReplayerError::DualChipDisabled)
    ));
}

#[test]
fn zero_wait_consumes_operands() {
    let callbacks = Cell::new(0u32);
    let mut player = player_with_psg(TrackInfo::default(), vec![0x61, 0x00, 0x00, 0x66]);
    player.on_sample(|_| callbacks.set(callbacks.get() + 1));

    assert_eq!(player.next().unwrap(), Step::Command);
    assert_eq!(callbacks.get(), 0);
    assert_eq!(player.samples_played(), 0);
    // The cursor moved past both operand bytes and finds the end marker.
    assert_eq!(player.next().unwrap(), Step::Ended);
}

#[test]
fn sixteen_bit_wait() {
    // 0x0143 = 323 samples, little-endian operands.
    let mut player = player_with_psg(TrackInfo::default(), vec![0x61, 0x43, 0x01, 0x66]);
    assert_eq!(player.next().unwrap(), Step::Command);
    assert_eq!(player.samples_played(), 323);
}

#[test]
fn eof_without_end_marker_finishes_stream() {
    let mut player = player_with_psg(TrackInfo::default(), vec![0x62]);
    assert_eq!(player.next().unwrap(), Step::Command);
    assert_eq!(player.next().unwrap(), Step::Ended);
    assert!(player.end_of_stream());
}

#[test]
fn eof_with_loop_wraps_like_end_marker() {
    let track = TrackInfo {
        total_samples: 735,
        loop_samples: 735,
        loop_offset: 0x40,
        data_offset: 0x40,
    };
    let mut player = player_with_psg(track, vec![0x62]);
    assert_eq!(player.next().unwrap(), Step::Command);
    assert_eq!(player.next().unwrap(), Step::Looped);
    assert_eq!(player.loops_played(), 1);
    // The cursor wrapped to the start of the data region.
    assert_eq!(player.next().unwrap(), Step::Command);
    assert_eq!(player.samples_played(), 1470);
}

#[test]
fn samples_played_is_monotonic_across_loops() {
    let previous = Cell::new(0u32);
    let track = TrackInfo {
        total_samples: 735,
        loop_samples: 735,
        loop_offset: 0x40,
        data_offset: 0x40,
    };
    let mut player = player_with_psg(track, vec![0x62, 0x66]);
    player.on_sample(|view| {
        assert!(view.samples_played() > previous.get());
        assert!(view.samples_played() >= view.position());
        previous.set(view.samples_played());
    });

    for _ in 0..50 {
        player.next().unwrap();
    }
    assert_eq!(player.loops_played(), 25);
}

#[test]
fn audible_tone_reaches_the_mix() {
    // ~440 Hz tone on channel 0 at full volume for one frame.
    let peak = Cell::new(0.0f32);
    let data = vec![0x50, 0x8E, 0x50, 0x0D, 0x50, 0x90, 0x62, 0x66];
    let mut player = player_with_psg(TrackInfo::default(), data);
    player.on_sample(|view| {
        let mono = view.mono_output().abs();
        if mono > peak.get() {
            peak.set(mono);
        }
        assert!(view.left_output().abs() <= 1.0);
    });

    loop {
        if player.next().unwrap() == Step::Ended {
            break;
        }
    }
    assert!(peak.get() > 0.2, "tone never reached the mix");
}
