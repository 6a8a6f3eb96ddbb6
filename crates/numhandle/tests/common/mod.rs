//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::sync::{Arc, Once};

use numhandle::{set_error_handler, ErrorCode, ErrorReport};

thread_local! {
    static REPORTS: RefCell<Vec<ErrorReport>> = const { RefCell::new(Vec::new()) };
}

static INSTALL: Once = Once::new();

/// Route hook reports into a per-thread log and emit `tracing` output
/// when `RUST_LOG` asks for it.
pub fn install() {
    INSTALL.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        set_error_handler(Arc::new(|report: &ErrorReport| {
            REPORTS.with(|log| log.borrow_mut().push(report.clone()));
        }));
    });
}

/// Run `f`, returning its result and the codes it reported.
pub fn reported<R>(f: impl FnOnce() -> R) -> (R, Vec<ErrorCode>) {
    install();
    REPORTS.with(|log| log.borrow_mut().clear());
    let result = f();
    let codes = REPORTS.with(|log| log.borrow_mut().drain(..).map(|r| r.code).collect());
    (result, codes)
}
