//! Emulator-handle contract between the dispatcher and chip drivers.
//!
//! This trait is the single extension point for adding chips: the dispatcher
//! stores handles as `Box<dyn EmulatorHandle>` and never learns what is
//! behind them.

use std::io::{self, Read};

use crate::error::{ReplayerError, Result};

/// A chip driver as seen by the command dispatcher.
///
/// A handle pairs three things: the set of opcode bytes it services, the
/// ability to execute one of those opcodes against a data cursor (reading
/// its own operand bytes), and per-sample advancement with stereo
/// per-channel output views of equal length.
///
/// Handles are driven strictly single-threaded: `execute` and
/// `advance_sample` are never called re-entrantly, and the channel views are
/// only read between advances.
pub trait EmulatorHandle {
    /// Opcode bytes this handle wants routed to [`EmulatorHandle::execute`].
    fn opcodes(&self) -> &[u8];

    /// Execute one serviced opcode.
    ///
    /// `data` is positioned immediately after the opcode byte; the handle
    /// reads exactly the operand bytes the opcode defines.
    fn execute(&mut self, opcode: u8, data: &mut dyn Read) -> Result<()>;

    /// Advance the underlying chip(s) by `n` samples at 44,100 Hz,
    /// refreshing the channel views after each sample.
    fn advance_sample(&mut self, n: u32);

    /// Left per-channel outputs after the most recent advance.
    fn left_channels(&self) -> &[f32];

    /// Right per-channel outputs; same length as
    /// [`EmulatorHandle::left_channels`].
    fn right_channels(&self) -> &[f32];
}

/// Read a single operand byte, mapping a short read to
/// [`ReplayerError::PrematureEof`].
pub fn read_operand(data: &mut dyn Read) -> Result<u8> {
    let mut byte = [0u8; 1];
    match data.read_exact(&mut byte) {
        Ok(()) => Ok(byte[0]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(ReplayerError::PrematureEof),
        Err(e) => Err(e.into()),
    }
}
