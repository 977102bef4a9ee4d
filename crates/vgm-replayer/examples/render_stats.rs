//! Render a hand-built command stream offline and print level statistics.
//!
//! Run with: cargo run --example render_stats -p vgm-replayer

use std::cell::{Cell, RefCell};

use sn76489::PsgSettings;
use vgm_replayer::{PsgDriver, Step, TrackInfo, VgmPlayer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two tones a fifth apart plus white noise, one second of audio.
    let data = vec![
        0x50, 0x8E, 0x50, 0x0D, 0x50, 0x90, // tone 0: period 0xDE, full volume
        0x50, 0xA4, 0x50, 0x09, 0x50, 0xB4, // tone 1: period 0x94, -8 dB
        0x50, 0xE4, 0x50, 0xF6, // white noise, -12 dB
        0x61, 0x44, 0xAC, // wait 44100 samples
        0x66,
    ];

    let peak = Cell::new(0.0f32);
    let samples = RefCell::new(Vec::with_capacity(44_100));

    let mut player = VgmPlayer::new(TrackInfo::default(), data);
    player.install(Box::new(PsgDriver::new(&PsgSettings::default())?))?;
    player.on_sample(|view| {
        let mono = view.mono_output();
        samples.borrow_mut().push(mono);
        if mono.abs() > peak.get() {
            peak.set(mono.abs());
        }
    });

    loop {
        match player.next()? {
            Step::Command | Step::Looped => {}
            Step::Ended => break,
        }
    }

    let samples = samples.borrow();
    let rms = (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt();
    println!("rendered {} samples", samples.len());
    println!("peak  {:+.4}", peak.get());
    println!("rms   {:+.4}", rms);
    Ok(())
}
