//! Run an exchange off the calling thread.
//!
//! The job is handed to the rayon pool and its result comes back over a
//! one-shot channel. The caller keeps ownership of nothing but the
//! [`ExchangeTask`]; the input buffers move into the job and the two
//! rebuilt buffers move back out.

use super::raster::{ExchangeError, RasterBuffer};
use super::{Exchange, exchange};
use std::sync::mpsc::{self, Receiver, TryRecvError};

/// Handle to an exchange running on the rayon pool.
#[derive(Debug)]
pub struct ExchangeTask {
    /// `None` once a result (or the loss of the worker) has been reported.
    rx: Option<Receiver<Result<Exchange, ExchangeError>>>,
}

/// Start exchanging `a` and `b` in the background.
pub fn spawn_exchange(a: RasterBuffer, b: RasterBuffer) -> ExchangeTask {
    let (tx, rx) = mpsc::sync_channel(1);
    rayon::spawn(move || {
        // Receiver may have been dropped; nothing to report to in that case.
        let _ = tx.send(exchange(&a, &b));
    });
    ExchangeTask { rx: Some(rx) }
}

impl ExchangeTask {
    /// Non-blocking check.
    ///
    /// Returns `None` while the job is still running. The outcome is handed
    /// out exactly once; every later call returns `None` again.
    pub fn poll(&mut self) -> Option<Result<Exchange, ExchangeError>> {
        let outcome = match self.rx.as_ref()?.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(ExchangeError::WorkerLost),
        };
        self.rx = None;
        Some(outcome)
    }

    /// True once [`poll`](Self::poll) has handed out the outcome.
    pub fn is_finished(&self) -> bool {
        self.rx.is_none()
    }

    /// Block until the job finishes.
    pub fn wait(self) -> Result<Exchange, ExchangeError> {
        match self.rx {
            Some(rx) => rx.recv().unwrap_or(Err(ExchangeError::WorkerLost)),
            None => Err(ExchangeError::ResultTaken),
        }
    }
}
