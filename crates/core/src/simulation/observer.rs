//! Per-step observation of a running simulation
//!
//! The engine never hands out its working buffers. Observers receive a
//! borrowed landscape for the duration of the callback and copy what they
//! need; [`ChannelObserver`] turns that into owned [`Frame`] messages for a
//! presentation thread.

use crate::core_types::CellState;
use crate::grid::{FieldData, Landscape};
use std::sync::mpsc::{Receiver, SyncSender};

/// Snapshot of the grid after a step
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Steps applied so far (0 = before the first step)
    pub step: usize,
    /// Whether rain was active during this step
    pub rain_active: bool,
    /// Burning cells in this frame
    pub burning: usize,
    /// Copy of the cell states
    pub cells: FieldData<CellState>,
}

impl Frame {
    pub fn capture(step: usize, rain_active: bool, landscape: &Landscape) -> Self {
        Self {
            step,
            rain_active,
            burning: landscape.burning_count(),
            cells: landscape.cells.clone(),
        }
    }
}

/// Receives the landscape after every step of a run
pub trait StepObserver {
    /// Called once before the first step (`step == 0`) and after every step.
    fn observe(&mut self, step: usize, rain_active: bool, landscape: &Landscape);

    /// Called once when the run ends naturally.
    fn finished(&mut self, _steps_taken: usize, _landscape: &Landscape) {}
}

/// Observer that ignores every frame
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl StepObserver for NullObserver {
    fn observe(&mut self, _step: usize, _rain_active: bool, _landscape: &Landscape) {}
}

/// Sends owned frames over a bounded channel
///
/// A full channel blocks the simulation until the receiver catches up, which
/// is how a slow renderer paces the run. Once the receiver is dropped, frames
/// are silently discarded and the run continues.
#[derive(Debug)]
pub struct ChannelObserver {
    sender: SyncSender<Frame>,
    every: usize,
    last_sent: Option<usize>,
    last_rain: bool,
    disconnected: bool,
}

impl ChannelObserver {
    /// Send every `every`-th frame (at least 1) plus the final one.
    pub fn new(sender: SyncSender<Frame>, every: usize) -> Self {
        Self {
            sender,
            every: every.max(1),
            last_sent: None,
            last_rain: false,
            disconnected: false,
        }
    }

    /// Observer paired with its receiver, `capacity` frames deep.
    pub fn channel(capacity: usize, every: usize) -> (Self, Receiver<Frame>) {
        let (sender, receiver) = std::sync::mpsc::sync_channel(capacity);
        (Self::new(sender, every), receiver)
    }

    fn send(&mut self, frame: Frame) {
        if self.disconnected {
            return;
        }
        let step = frame.step;
        // Blocking send; only a vanished receiver is an error
        match self.sender.send(frame) {
            Ok(()) => self.last_sent = Some(step),
            Err(_) => self.disconnected = true,
        }
    }
}

impl StepObserver for ChannelObserver {
    fn observe(&mut self, step: usize, rain_active: bool, landscape: &Landscape) {
        self.last_rain = rain_active;
        if step % self.every == 0 && !self.disconnected {
            self.send(Frame::capture(step, rain_active, landscape));
        }
    }

    fn finished(&mut self, steps_taken: usize, landscape: &Landscape) {
        if self.last_sent != Some(steps_taken) && !self.disconnected {
            self.send(Frame::capture(steps_taken, self.last_rain, landscape));
        }
    }
}
