use std::{
    sync::mpsc::{self, RecvTimeoutError, Sender},
    thread::JoinHandle,
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};

const TICK_INTERVAL: Duration = Duration::from_millis(500);
const DOTS: &[&str] = &[".", "..", "...", "....", ""];

/// A cosmetic "Indexing...." indicator on stderr.
///
/// Runs on its own thread and only ever reads its stop channel, so it
/// cannot influence the work it decorates. Stopped explicitly with
/// [`Spinner::stop`] or implicitly on drop.
pub struct Spinner {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    pub fn start(message: &str) -> Self {
        let (stop, stopped) = mpsc::channel::<()>();

        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{msg}{spinner}")
            .map(|s| s.tick_strings(DOTS))
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(message.to_string());

        let handle = std::thread::spawn(move || {
            loop {
                match stopped.recv_timeout(TICK_INTERVAL) {
                    Err(RecvTimeoutError::Timeout) => bar.tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            bar.finish_and_clear();
        });

        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Signal the indicator to stop and wait for it to clear its line.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::debug!("progress indicator thread panicked");
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.shutdown();
    }
}
