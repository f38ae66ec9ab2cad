//! Test support: capture `log` warnings emitted on the calling thread.

use std::sync::{Mutex, Once};
use std::thread::{self, ThreadId};

use log::{Level, LevelFilter, Log, Metadata, Record};

struct Capture {
    records: Mutex<Vec<(ThreadId, String)>>,
}

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            records.push((thread::current().id(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    records: Mutex::new(Vec::new()),
};
static INSTALL: Once = Once::new();

fn take(id: ThreadId) -> Vec<String> {
    let mut records = CAPTURE.records.lock().unwrap_or_else(|e| e.into_inner());
    let (mine, rest): (Vec<_>, Vec<_>) = records.drain(..).partition(|(t, _)| *t == id);
    *records = rest;
    mine.into_iter().map(|(_, msg)| msg).collect()
}

/// Run `f` and return its result with the warnings (and errors) it logged.
///
/// Tests run on separate threads, so records are keyed by thread id.
pub fn warnings_during<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    INSTALL.call_once(|| {
        if log::set_logger(&CAPTURE).is_ok() {
            log::set_max_level(LevelFilter::Warn);
        }
    });
    let id = thread::current().id();
    take(id);
    let out = f();
    (out, take(id))
}
