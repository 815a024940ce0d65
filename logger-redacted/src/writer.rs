//! `MakeWriter` wrapper that redacts each formatted log line before output.

use crate::redactor::PiiRedactor;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Wraps another `MakeWriter` and runs every event through a [`PiiRedactor`].
///
/// The fmt layer formats a whole event into one buffer and hands it to the
/// writer with a single `write_all`, so each `write` call sees complete lines.
#[derive(Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
    redactor: Arc<PiiRedactor>,
}

impl<M> RedactingMakeWriter<M> {
    pub fn new(inner: M, redactor: Arc<PiiRedactor>) -> Self {
        Self { inner, redactor }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            redactor: Arc::clone(&self.redactor),
        }
    }
}

pub struct RedactingWriter<W> {
    inner: W,
    redactor: Arc<PiiRedactor>,
}

impl<W: io::Write> io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let redacted = self.redactor.redact(&text);
        self.inner.write_all(redacted.as_bytes())?;
        // The caller's bytes were all consumed even though fewer or more
        // may have been written downstream.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redactor::RedactionConfig;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_writer_redacts_lines() {
        let captured = Captured::default();
        let redactor = Arc::new(PiiRedactor::new(RedactionConfig {
            hash_for_correlation: false,
            ..Default::default()
        }));
        let make_writer = RedactingMakeWriter::new(captured.clone(), redactor);

        let mut writer = make_writer.make_writer();
        writer
            .write_all(b"INFO issued code for 9434765919\n")
            .unwrap();

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output, "INFO issued code for NHS[REDACTED]\n");
    }

    #[test]
    fn test_subscriber_output_is_redacted() {
        let captured = Captured::default();
        let redactor = Arc::new(PiiRedactor::new(RedactionConfig {
            hash_for_correlation: false,
            ..Default::default()
        }));
        let subscriber = tracing_subscriber::fmt()
            .with_writer(RedactingMakeWriter::new(captured.clone(), redactor))
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(email = "jane.roe@example.org", "notification queued");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("notification queued"));
        assert!(output.contains("j***@e***"));
        assert!(!output.contains("jane.roe@example.org"));
    }
}
