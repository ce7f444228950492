//! Log output of the gate, captured through a scoped subscriber

use std::io;
use std::sync::{Arc, Mutex};

use litkit_gate::{AccessGate, Collaborator, Denial, Gated, RecordingSurface, RenderPass, Session};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn capture<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, buf.contents())
}

#[test]
fn test_missing_identity_is_logged_before_setup_screen() {
    let gate = AccessGate::new();
    let mut session = Session::new();
    let mut surface = RecordingSurface::new();

    let (outcome, logs) = capture(|| {
        let mut pass = RenderPass::new(&mut session, &mut surface);
        gate.require_authenticated(&mut pass, |_| ())
    });

    assert!(matches!(
        outcome,
        Gated::Denied(Denial::NotConfigured(Collaborator::Identity))
    ));
    assert!(logs.contains("Collaborator not configured"), "logs: {logs}");
    assert!(logs.contains("identity provider"), "logs: {logs}");
}

#[test]
fn test_missing_billing_is_logged() {
    let gate = AccessGate::new();

    let (err, logs) = capture(|| {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(gate.begin_checkout(&Session::new(), Some("price_x")))
            .unwrap_err()
    });

    assert!(err.is_not_configured());
    assert!(logs.contains("Collaborator not configured"), "logs: {logs}");
    assert!(logs.contains("billing provider"), "logs: {logs}");
}
