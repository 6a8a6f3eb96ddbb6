//! Adaptive quadrature and its workspace.
//!
//! [`integration_qag`] bisects the subinterval with the largest error
//! estimate until the requested tolerance is met or the workspace is full.
//! Each subinterval is integrated with the 15-point Kronrod rule and its
//! error estimated against the embedded 7-point Gauss rule.

use std::os::raw::{c_int, c_void};

use crate::{alloc_header, fail, free_header, raw_alloc, raw_free, status};

/// A function of one variable with an opaque parameter pointer.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Function {
    /// Callback evaluated at each node.
    pub function: unsafe extern "C" fn(x: f64, params: *mut c_void) -> f64,
    /// Passed through to `function` unchanged.
    pub params: *mut c_void,
}

impl Function {
    #[inline]
    fn eval(&self, x: f64) -> f64 {
        // SAFETY: the caller of the integration routine vouches for the
        // callback/params pair.
        unsafe { (self.function)(x, self.params) }
    }
}

/// Storage for up to `limit` subintervals.
#[repr(C)]
#[derive(Debug)]
pub struct RawWorkspace {
    /// Maximum number of subintervals.
    pub limit: usize,
    /// Subintervals currently in use.
    pub size: usize,
    /// Left endpoints.
    pub alist: *mut f64,
    /// Right endpoints.
    pub blist: *mut f64,
    /// Integral estimates.
    pub rlist: *mut f64,
    /// Error estimates.
    pub elist: *mut f64,
    /// Bisection depth of each subinterval.
    pub level: *mut usize,
}

/// Allocate a workspace for `n` subintervals.
///
/// Returns null with [`status::EDOM`] for `n == 0`.
#[must_use]
pub fn integration_workspace_alloc(n: usize) -> *mut RawWorkspace {
    if n == 0 {
        return fail(status::EDOM);
    }
    let alist = raw_alloc::<f64>(n, true);
    let blist = raw_alloc::<f64>(n, true);
    let rlist = raw_alloc::<f64>(n, true);
    let elist = raw_alloc::<f64>(n, true);
    let level = raw_alloc::<usize>(n, true);
    let w = if [alist, blist, rlist, elist].iter().any(|p| p.is_null()) || level.is_null() {
        std::ptr::null_mut()
    } else {
        alloc_header(RawWorkspace {
            limit: n,
            size: 0,
            alist,
            blist,
            rlist,
            elist,
            level,
        })
    };
    if w.is_null() {
        // SAFETY: each array is null or was allocated above with n elements.
        unsafe {
            raw_free(alist, n);
            raw_free(blist, n);
            raw_free(rlist, n);
            raw_free(elist, n);
            raw_free(level, n);
        }
        return fail(status::NOMEM);
    }
    w
}

/// Release a workspace.
///
/// # Safety
///
/// `w` must be null or a live workspace from this module.
pub unsafe fn integration_workspace_free(w: *mut RawWorkspace) {
    if w.is_null() {
        return;
    }
    // SAFETY: guaranteed by the caller.
    unsafe {
        let n = (*w).limit;
        raw_free((*w).alist, n);
        raw_free((*w).blist, n);
        raw_free((*w).rlist, n);
        raw_free((*w).elist, n);
        raw_free((*w).level, n);
        free_header(w);
    }
}

// ============================================================================
// Gauss-Kronrod 7/15
// ============================================================================

/// Kronrod abscissae; odd indices are shared with the Gauss rule.
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639,
    0.949_107_912_342_758_525,
    0.864_864_423_359_769_073,
    0.741_531_185_599_394_440,
    0.586_087_235_467_691_130,
    0.405_845_151_377_397_167,
    0.207_784_955_007_898_468,
    0.000_000_000_000_000_000,
];

const WGK: [f64; 8] = [
    0.022_935_322_010_529_225,
    0.063_092_092_629_978_553,
    0.104_790_010_322_250_184,
    0.140_653_259_715_525_919,
    0.169_004_726_639_267_903,
    0.190_350_578_064_785_410,
    0.204_432_940_075_298_892,
    0.209_482_141_084_727_828,
];

/// Gauss weights for `XGK[1], XGK[3], XGK[5], XGK[7]`.
const WG: [f64; 4] = [
    0.129_484_966_168_869_693,
    0.279_705_391_489_276_668,
    0.381_830_050_505_118_945,
    0.417_959_183_673_469_388,
];

/// Integrate over `[a, b]`, returning `(kronrod, |kronrod - gauss|)`.
fn qk15(f: &Function, a: f64, b: f64) -> (f64, f64) {
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let fc = f.eval(center);
    let mut kronrod = fc * WGK[7];
    let mut gauss = fc * WG[3];

    for (j, (&x, &wk)) in XGK.iter().zip(WGK.iter()).take(7).enumerate() {
        let dx = half * x;
        let pair = f.eval(center - dx) + f.eval(center + dx);
        kronrod += wk * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    let result = kronrod * half;
    let error = ((kronrod - gauss) * half).abs();
    (result, error)
}

/// Adaptive integration of `f` over `[a, b]`.
///
/// Stops when the summed error estimate is below
/// `max(epsabs, epsrel * |result|)`. Writes the integral estimate and the
/// error estimate through `result` and `abserr`.
///
/// Returns [`status::INVAL`] when `limit` exceeds the workspace,
/// [`status::BADTOL`] for unusable tolerances, [`status::MAXITER`] when
/// `limit` subintervals did not reach the tolerance, and
/// [`status::ROUND`] when bisection stops making progress.
///
/// # Safety
///
/// `w` must be a live workspace, `result` and `abserr` valid for writes,
/// and `f` must be safe to call with its `params`.
#[allow(clippy::too_many_arguments)]
pub unsafe fn integration_qag(
    f: &Function,
    a: f64,
    b: f64,
    epsabs: f64,
    epsrel: f64,
    limit: usize,
    w: *mut RawWorkspace,
    result: *mut f64,
    abserr: *mut f64,
) -> c_int {
    if w.is_null() || result.is_null() || abserr.is_null() {
        return status::FAULT;
    }
    // SAFETY: guaranteed by the caller.
    let w = unsafe { &mut *w };
    // SAFETY: guaranteed by the caller.
    unsafe {
        *result = 0.0;
        *abserr = 0.0;
    }
    if limit == 0 || limit > w.limit {
        return status::INVAL;
    }
    if epsabs <= 0.0 && (epsrel < 50.0 * f64::EPSILON || epsrel < 0.5e-28) {
        return status::BADTOL;
    }

    // SAFETY: each array holds w.limit >= limit elements.
    let (alist, blist, rlist, elist, level) = unsafe {
        (
            std::slice::from_raw_parts_mut(w.alist, w.limit),
            std::slice::from_raw_parts_mut(w.blist, w.limit),
            std::slice::from_raw_parts_mut(w.rlist, w.limit),
            std::slice::from_raw_parts_mut(w.elist, w.limit),
            std::slice::from_raw_parts_mut(w.level, w.limit),
        )
    };

    let (r0, e0) = qk15(f, a, b);
    alist[0] = a;
    blist[0] = b;
    rlist[0] = r0;
    elist[0] = e0;
    level[0] = 0;
    w.size = 1;

    let mut area = r0;
    let mut errsum = e0;
    let mut code = status::SUCCESS;

    while errsum > epsabs.max(epsrel * area.abs()) {
        if w.size >= limit {
            code = status::MAXITER;
            break;
        }
        let worst = (0..w.size)
            .max_by(|&i, &j| elist[i].total_cmp(&elist[j]))
            .unwrap_or(0);

        let a1 = alist[worst];
        let b2 = blist[worst];
        let mid = 0.5 * (a1 + b2);
        if mid <= a1 || mid >= b2 {
            code = status::ROUND;
            break;
        }

        let (r1, e1) = qk15(f, a1, mid);
        let (r2, e2) = qk15(f, mid, b2);

        area += r1 + r2 - rlist[worst];
        errsum += e1 + e2 - elist[worst];

        let depth = level[worst] + 1;
        blist[worst] = mid;
        rlist[worst] = r1;
        elist[worst] = e1;
        level[worst] = depth;

        let next = w.size;
        alist[next] = mid;
        blist[next] = b2;
        rlist[next] = r2;
        elist[next] = e2;
        level[next] = depth;
        w.size += 1;
    }

    // SAFETY: checked non-null above.
    unsafe {
        *result = rlist[..w.size].iter().sum();
        *abserr = errsum;
    }
    code
}
