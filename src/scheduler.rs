use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

/// Handle to a running [`RepeatingTask`]. Stopping (or dropping) it ends the
/// timer thread; work the body already handed off elsewhere is not cancelled.
pub struct TaskHandle {
    name: String,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop the timer and wait for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Disconnecting the channel wakes the timer out of its wait
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
            debug!(task = %self.name, "task stopped");
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs a closure immediately and then once per interval on its own thread.
pub struct RepeatingTask;

impl RepeatingTask {
    pub fn spawn<F>(name: &str, interval: Duration, mut body: F) -> io::Result<TaskHandle>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || loop {
                body();
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        debug!(task = name, ?interval, "task started");
        Ok(TaskHandle {
            name: name.to_string(),
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }
}
