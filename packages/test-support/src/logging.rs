//! Test logging: one-time output setup plus scoped capture.

use once_cell::sync::OnceCell;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Initialize structured logging for tests.
///
/// Idempotent and race-safe. The level comes from `TEST_LOG`, then
/// `RUST_LOG`, then defaults to `"warn"`.
pub fn init() {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = SharedBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Records log output emitted on the current thread while it is alive.
///
/// The capture is installed as the thread's default subscriber, so it sees
/// events from `#[tokio::test]` bodies (single-threaded runtime) and from
/// requests served by an in-process test server. Events from tasks spawned
/// onto other worker threads are not captured.
///
/// Lines are plain text without timestamps or ANSI codes: the level, the
/// message, then any structured fields.
pub struct LogCapture {
    buffer: SharedBuffer,
    _guard: DefaultGuard,
}

impl LogCapture {
    /// Capture everything at `debug` and above.
    pub fn start() -> Self {
        Self::with_filter("debug")
    }

    /// Capture events matching `directives` (`EnvFilter` syntax).
    pub fn with_filter(directives: &str) -> Self {
        let buffer = SharedBuffer::default();
        let subscriber = fmt()
            .with_env_filter(EnvFilter::new(directives))
            .with_writer(buffer.clone())
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .finish();

        Self {
            buffer,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub fn contents(&self) -> String {
        self.buffer.contents()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_records_events() {
        let capture = LogCapture::start();
        tracing::info!(tmdb_id = 550, "Movie cached");
        tracing::trace!("too quiet");

        assert!(capture.contains("Movie cached"));
        assert!(capture.contains("tmdb_id=550"));
        assert!(!capture.contains("too quiet"));
        assert_eq!(capture.lines().len(), 1);
    }

    #[test]
    fn test_capture_ends_when_dropped() {
        let first = LogCapture::start();
        {
            let second = LogCapture::start();
            tracing::warn!("inner");
            assert!(second.contains("inner"));
        }
        tracing::warn!("outer");

        assert!(first.contains("outer"));
        assert!(!first.contains("inner"));
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
