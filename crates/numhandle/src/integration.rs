//! Adaptive quadrature.
//!
//! [`qag`] forwards to the foreign Gauss-Kronrod integrator, passing a
//! Rust closure through the library's `(function, params)` callback pair.
//! The subinterval storage lives in a [`Workspace`] handle, which can be
//! shared and reused across calls but not deep-copied: the library has no
//! copy routine for it.

use std::any::Any;
use std::os::raw::c_void;
use std::panic::{self, AssertUnwindSafe};

use numhandle_foreign::integration::integration_qag;
use numhandle_foreign::{Function, RawWorkspace};

use crate::handle::Handle;
use crate::{check_status, report, Error, ErrorCode, Result, CHECKS_ENABLED};

/// An owning, reference-counted integration workspace.
pub type Workspace = Handle<RawWorkspace>;

impl Workspace {
    /// Allocate room for `limit` subintervals. `limit == 0` gives a
    /// sentinel that every integration rejects.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] when the foreign allocator fails.
    pub fn new(limit: usize) -> Result<Self> {
        Self::allocate(limit)
    }

    /// Maximum number of subintervals.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.shape().unwrap_or(0)
    }

    /// Subintervals used by the last integration.
    #[must_use]
    pub fn size(&self) -> usize {
        // SAFETY: null or live.
        unsafe { self.as_ptr().as_ref() }.map_or(0, |w| w.size)
    }
}

/// Result of an integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// The integral estimate.
    pub value: f64,
    /// Estimated absolute error.
    pub abserr: f64,
}

/// The closure plus the payload of the first panic it raised. A panic
/// must not unwind through the foreign frames, so it is parked here and
/// resumed once the integrator returns.
struct Integrand<F> {
    f: F,
    panic: Option<Box<dyn Any + Send>>,
}

unsafe extern "C" fn trampoline<F: FnMut(f64) -> f64>(x: f64, params: *mut c_void) -> f64 {
    // SAFETY: params is the Integrand set up by qag for the duration of the call.
    let integrand = unsafe { &mut *params.cast::<Integrand<F>>() };
    if integrand.panic.is_some() {
        return f64::NAN;
    }
    match panic::catch_unwind(AssertUnwindSafe(|| (integrand.f)(x))) {
        Ok(y) => y,
        Err(payload) => {
            integrand.panic = Some(payload);
            f64::NAN
        }
    }
}

/// Integrate `f` over `[a, b]` to within `max(epsabs, epsrel * |I|)`,
/// using at most `limit` subintervals of `workspace`.
///
/// # Panics
///
/// A panic raised by `f` is resumed after the integrator returns.
///
/// # Errors
///
/// - [`Error::Fault`] for an empty or zero-sized workspace;
/// - [`Error::InvalidArgument`] when `limit` exceeds the workspace;
/// - [`Error::Foreign`] with the library's status when it gives up
///   (tolerance not reached, roundoff, bad tolerances).
pub fn qag<F: FnMut(f64) -> f64>(
    f: F,
    a: f64,
    b: f64,
    epsabs: f64,
    epsrel: f64,
    limit: usize,
    workspace: &mut Workspace,
) -> Result<Estimate> {
    let w = workspace.as_ptr();
    if w.is_null() || workspace.is_sentinel() {
        report!(ErrorCode::Fault, "integration needs an allocated workspace");
        return Err(Error::Fault("integration workspace"));
    }
    if CHECKS_ENABLED && limit > workspace.limit() {
        report!(
            ErrorCode::InvalidArgument,
            "limit {limit} exceeds workspace of {}",
            workspace.limit()
        );
        return Err(Error::InvalidArgument(format!(
            "limit {limit} exceeds workspace size {}",
            workspace.limit()
        )));
    }

    let mut integrand = Integrand { f, panic: None };
    let function = Function {
        function: trampoline::<F>,
        params: std::ptr::addr_of_mut!(integrand).cast(),
    };
    let (mut value, mut abserr) = (0.0, 0.0);
    // SAFETY: w is live; function.params points at integrand, alive for the call.
    let code = unsafe { integration_qag(&function, a, b, epsabs, epsrel, limit, w, &mut value, &mut abserr) };
    if let Some(payload) = integrand.panic.take() {
        panic::resume_unwind(payload);
    }
    check_status(code, "adaptive integration")?;
    tracing::trace!(a, b, value, abserr, subintervals = workspace.size(), "integrated");
    Ok(Estimate { value, abserr })
}
