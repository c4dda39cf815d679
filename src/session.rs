//! Capture session lifecycle: Idle -> Recording -> Idle.
//!
//! While Recording, a dedicated acquisition thread reads blocks from a
//! [`SampleSource`], estimates their loudness and publishes each result to the
//! shared [`ReadingCell`]. Stopping is cooperative: the thread checks its stop
//! flag once per block, so it exits after at most one more read, and the
//! source is closed on that thread after the loop is done.

use crate::audio::{SampleSource, estimate};
use crate::error::{MeterError, MeterResult};
use crate::reading::ReadingCell;
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Recording,
}

enum SessionState {
    Idle,
    Recording {
        stop: Arc<AtomicBool>,
        worker: JoinHandle<()>,
    },
}

pub struct Session {
    readings: ReadingCell,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(readings: ReadingCell) -> Self {
        Self {
            readings,
            state: Mutex::new(SessionState::Idle),
        }
    }

    pub fn readings(&self) -> &ReadingCell {
        &self.readings
    }

    /// A session whose acquisition thread has ended on its own (the stream
    /// failed) reports Idle even before it is joined.
    pub fn status(&self) -> SessionStatus {
        match &*self.lock_state() {
            SessionState::Recording { worker, .. } if !worker.is_finished() => {
                SessionStatus::Recording
            }
            _ => SessionStatus::Idle,
        }
    }

    /// Opens a source with `open` on a new acquisition thread and starts
    /// publishing readings from it.
    ///
    /// Does nothing (and never calls `open`) if already Recording. If `open`
    /// fails the session stays Idle and the error is returned.
    pub fn start<S, F>(&self, open: F) -> MeterResult<()>
    where
        S: SampleSource + 'static,
        F: FnOnce() -> MeterResult<S> + Send + 'static,
    {
        let mut state = self.lock_state();

        if let SessionState::Recording { worker, .. } = &*state {
            if !worker.is_finished() {
                debug!("Start requested while already recording, ignoring");
                return Ok(());
            }
        }
        reap(std::mem::replace(&mut *state, SessionState::Idle));

        let stop = Arc::new(AtomicBool::new(false));
        let (opened_tx, opened_rx) = mpsc::sync_channel::<MeterResult<()>>(1);

        debug!("Spawning acquisition thread...");
        let worker = {
            let readings = self.readings.clone();
            let stop = stop.clone();

            thread::Builder::new()
                .name("acquisition".to_string())
                .spawn(move || {
                    let source = match open() {
                        Ok(source) => {
                            let _ = opened_tx.send(Ok(()));
                            source
                        }
                        Err(err) => {
                            let _ = opened_tx.send(Err(err));
                            return;
                        }
                    };
                    run_acquisition(source, &readings, &stop);
                })?
        };

        match opened_rx.recv() {
            Ok(Ok(())) => {
                *state = SessionState::Recording { stop, worker };
                info!("Recording started");
                Ok(())
            }
            Ok(Err(err)) => {
                let _ = worker.join();
                error!("Failed to start recording: {err}");
                Err(err)
            }
            Err(_) => {
                let _ = worker.join();
                error!("Acquisition thread exited before opening its source");
                Err(MeterError::DeviceUnavailable(
                    "acquisition thread exited during open".to_string(),
                ))
            }
        }
    }

    /// Signals the acquisition thread to finish and waits for it. No-op when Idle.
    pub fn stop(&self) {
        let mut state = self.lock_state();
        if let SessionState::Idle = &*state {
            return;
        }

        debug!("Signaling acquisition thread to stop...");
        reap(std::mem::replace(&mut *state, SessionState::Idle));
        info!("Recording stopped");
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

fn reap(state: SessionState) {
    if let SessionState::Recording { stop, worker } = state {
        stop.store(true, Ordering::Release);
        if worker.join().is_err() {
            error!("Acquisition thread panicked");
        } else {
            debug!("Acquisition thread joined");
        }
    }
}

fn run_acquisition<S: SampleSource>(mut source: S, readings: &ReadingCell, stop: &AtomicBool) {
    debug!("Acquisition thread started");

    while !stop.load(Ordering::Acquire) {
        match source.read_block() {
            // Transient zero-sample read; keep the last reading on screen.
            Ok(block) if block.is_empty() => continue,
            Ok(block) => readings.publish(estimate(&block)),
            Err(err) => {
                error!("Capture ended: {err}");
                break;
            }
        }
    }

    source.close();
    debug!("Acquisition thread shutting down");
}
