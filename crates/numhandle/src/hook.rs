//! The error hook.
//!
//! Every piece of misuse detected by this crate (an index past the end, a
//! view that does not fit its owner, mismatched lengths) is reported here
//! before the operation degrades or returns an error. The hook receives
//! an [`ErrorReport`] with the message, the source location that detected
//! the problem, and a coarse [`ErrorCode`].
//!
//! With no handler installed, reports are logged with `tracing` at `WARN`.
//! A handler installed with [`set_error_handler`] replaces that for the
//! whole process.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::ErrorCode;

/// One diagnostic passed to the error hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Human-readable description.
    pub message: String,
    /// Source file that detected the problem.
    pub file: String,
    /// Line in `file`.
    pub line: u32,
    /// Coarse classification.
    pub code: ErrorCode,
}

/// A process-wide error handler.
pub type ErrorHandler = Arc<dyn Fn(&ErrorReport) + Send + Sync>;

static HANDLER: RwLock<Option<ErrorHandler>> = parking_lot::const_rwlock(None);

/// Install `handler`, returning the one it replaces.
pub fn set_error_handler(handler: ErrorHandler) -> Option<ErrorHandler> {
    HANDLER.write().replace(handler)
}

/// Remove the installed handler, restoring the logging default.
pub fn take_error_handler() -> Option<ErrorHandler> {
    HANDLER.write().take()
}

/// Report a problem to the installed handler.
///
/// Prefer the [`report!`](crate::report) macro, which fills in the source
/// location.
pub fn report_error(message: &str, file: &str, line: u32, code: ErrorCode) {
    let report = ErrorReport {
        message: message.to_owned(),
        file: file.to_owned(),
        line,
        code,
    };
    // Clone out of the lock so a handler may itself swap handlers.
    let handler = HANDLER.read().clone();
    match handler {
        Some(handler) => handler(&report),
        None => tracing::warn!(
            code = %report.code,
            file = %report.file,
            line = report.line,
            "{}",
            report.message
        ),
    }
}

/// Report through the error hook with the caller's `file!()` and `line!()`.
///
/// ```rust
/// use numhandle::{report, ErrorCode};
///
/// report!(ErrorCode::InvalidArgument, "index {} out of range", 7);
/// ```
#[macro_export]
macro_rules! report {
    ($code:expr, $($arg:tt)+) => {
        $crate::hook::report_error(&::std::format!($($arg)+), ::std::file!(), ::std::line!(), $code)
    };
}

/// A recording handler for unit tests.
///
/// Installed once for the test binary; every report lands in a per-thread
/// log, so tests running in parallel only see their own reports.
#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::sync::{Arc, Once};

    use super::{set_error_handler, ErrorReport};

    thread_local! {
        static LOG: RefCell<Vec<ErrorReport>> = const { RefCell::new(Vec::new()) };
    }

    static INSTALL: Once = Once::new();

    fn install() {
        INSTALL.call_once(|| {
            set_error_handler(Arc::new(|report: &ErrorReport| {
                LOG.with(|log| log.borrow_mut().push(report.clone()));
            }));
        });
    }

    /// Run `f` and return its result with the reports it produced.
    pub(crate) fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<ErrorReport>) {
        install();
        LOG.with(|log| log.borrow_mut().clear());
        let result = f();
        let reports = LOG.with(|log| log.borrow_mut().drain(..).collect());
        (result, reports)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::capture;
    use crate::ErrorCode;

    #[test]
    fn test_report_macro_fills_location() {
        let ((), reports) = capture(|| {
            crate::report!(ErrorCode::Fault, "null {}", "vector");
        });
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].message, "null vector");
        assert!(reports[0].file.ends_with("hook.rs"));
        assert!(reports[0].line > 0);
        assert_eq!(reports[0].code, ErrorCode::Fault);
    }

    #[test]
    fn test_reports_are_per_thread() {
        let ((), outer) = capture(|| {
            std::thread::spawn(|| crate::report!(ErrorCode::Failure, "elsewhere"))
                .join()
                .unwrap();
        });
        assert!(outer.is_empty());
    }

    #[test]
    fn test_report_serializes() {
        let ((), reports) = capture(|| crate::report!(ErrorCode::BadLength, "x"));
        let json = serde_json::to_value(&reports[0]).unwrap();
        assert_eq!(json["code"], "bad_length");
        assert_eq!(json["message"], "x");
    }
}
