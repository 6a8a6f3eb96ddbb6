//! Ownership, aliasing and iteration behaviour of handles and views
//!
//! Tests cover:
//! - Deep copies, shares and moves
//! - Views aliasing their owner
//! - Cursor distances and dereferences
//! - Zero-sized construction
//! - Release of every allocation exactly once

mod common;

use common::reported;
use numhandle::prelude::*;
use numhandle::{Error, ErrorCode};
use numhandle_foreign::{clear_allocation_faults, fail_allocations_after, stats};

// ============================================================
// Copy, share and move
// ============================================================

mod ownership_tests {
    use super::*;

    #[test]
    fn test_deep_clone_is_unique_and_equal() {
        let v = VectorF64::from_slice(&[1.0, 2.0, 3.0]).unwrap();
        let alias = v.share();
        let copy = v.deep_clone().unwrap();

        assert!(copy.unique());
        assert_eq!(copy.use_count(), 1);
        assert_eq!(copy.to_vec(), v.to_vec());
        assert_ne!(copy.as_ptr(), v.as_ptr());
        assert_eq!(alias.use_count(), 2);
    }

    #[test]
    fn test_deep_clone_of_matrix_is_independent() {
        let m = MatrixF64::from_row_major(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut copy = m.deep_clone().unwrap();
        copy.set(0, 0, 100.0);
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(copy.get(0, 0), 100.0);
    }

    #[test]
    fn test_share_counts_and_release() {
        let mut h0 = VectorF64::from_slice(&[4.0, 5.0]).unwrap();
        let h1 = h0.share();
        assert_eq!(h0.use_count(), 2);
        assert_eq!(h1.use_count(), 2);
        assert_eq!(h0.as_ptr(), h1.as_ptr());

        h0.set(0, 40.0);
        assert_eq!(h1.get(0), 40.0);

        drop(h1);
        assert_eq!(h0.use_count(), 1);
        assert!(h0.unique());
        assert_eq!(h0.to_vec(), vec![40.0, 5.0]);
    }

    #[test]
    fn test_move_leaves_source_empty() {
        let mut h0 = MatrixF64::alloc(2, 3).unwrap();
        let ptr = h0.as_ptr();
        let h1 = h0.take();

        assert_eq!(h0.use_count(), 0);
        assert!(h0.is_null());
        assert!(h0.as_ptr().is_null());
        assert_eq!(h1.as_ptr(), ptr);
        assert_eq!(h1.use_count(), 1);
        assert_eq!((h1.nrows(), h1.ncols()), (2, 3));
    }

    #[test]
    fn test_assign_releases_previous_object() {
        let before = stats().live();
        let mut a = VectorF64::alloc(3).unwrap();
        let b = VectorF64::alloc(5).unwrap();
        let after_two = stats().live();

        a.assign(&b);
        assert_eq!(a.len(), 5);
        assert_eq!(b.use_count(), 2);
        assert!(stats().live() < after_two);

        drop(a);
        drop(b);
        assert_eq!(stats().live(), before);
    }

    #[test]
    fn test_self_assign_keeps_count() {
        let mut a = VectorF64::alloc(2).unwrap();
        let same = a.share();
        a.assign(&same);
        assert_eq!(a.use_count(), 2);
        drop(same);
        assert!(a.unique());
    }
}

// ============================================================
// Views
// ============================================================

mod view_tests {
    use super::*;

    #[test]
    fn test_mutation_through_view_is_visible_in_owner() {
        let mut m = MatrixF64::zeros(3, 3).unwrap();
        m.column_mut(1).fill(7.0);
        m.diagonal_mut().set(2, -1.0);

        assert_eq!(
            m.to_rows(),
            vec![vec![0.0, 7.0, 0.0], vec![0.0, 7.0, 0.0], vec![0.0, 7.0, -1.0]]
        );
    }

    #[test]
    fn test_nested_views() {
        let mut v = VectorF64::from_slice(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        {
            let mut outer = v.subvector_mut(1, 6);
            let mut inner = outer.subvector_with_stride_mut(1, 2, 3);
            inner.fill(9.0);
        }
        assert_eq!(v.to_vec(), vec![0.0, 1.0, 9.0, 3.0, 9.0, 5.0, 9.0]);
    }

    #[test]
    fn test_view_outlives_nothing_it_borrows() {
        let before = stats().live();
        {
            let m = MatrixF64::alloc(4, 4).unwrap();
            let sub = m.submatrix(1, 1, 2, 2);
            let row = sub.row(1);
            assert_eq!(row.len(), 2);
        }
        assert_eq!(stats().live(), before);
    }

    #[test]
    fn test_view_that_does_not_fit_is_empty() {
        let m = MatrixF64::alloc(2, 2).unwrap();
        let (view, codes) = reported(|| m.submatrix(1, 1, 2, 2).is_null());
        assert!(view);
        assert_eq!(codes, vec![ErrorCode::InvalidArgument]);
    }

    #[test]
    fn test_view_deep_clone_is_an_owner() {
        let m = MatrixF64::from_row_major(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let col = m.column(2).deep_clone().unwrap();
        assert!(col.unique());
        assert_eq!(col.stride(), 1);
        assert_eq!(col.to_vec(), vec![3.0, 6.0]);
    }
}

// ============================================================
// Cursors
// ============================================================

mod cursor_tests {
    use super::*;

    #[test]
    fn test_distance_equals_size() {
        let v = VectorF64::from_slice(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(v.cursor_end() - v.cursor_begin(), 4);
        assert_eq!(v.cursor_rend() - v.cursor_rbegin(), 4);

        let m = MatrixF64::alloc(3, 2).unwrap();
        assert_eq!(m.row_end() - m.row_begin(), 3);
        assert_eq!(m.row_rend() - m.row_rbegin(), 3);
    }

    #[test]
    fn test_begin_and_end_minus_one_address_first_and_last() {
        let v = VectorF64::from_slice(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(v.cursor_begin().get(), 10.0);
        assert_eq!((v.cursor_end() - 1).get(), 30.0);
        assert_eq!(v.cursor_rbegin().get(), 30.0);
        assert_eq!((v.cursor_rend() - 1).get(), 10.0);
    }

    #[test]
    fn test_empty_owner_has_zero_distance() {
        let v = VectorF64::alloc(0).unwrap();
        assert_eq!(v.cursor_end() - v.cursor_begin(), 0);
        assert_eq!(v.cursor_rend() - v.cursor_rbegin(), 0);
        assert!(v.cursor_rbegin() == v.cursor_rend());
    }

    #[test]
    fn test_each_dereference_is_a_fresh_view() {
        let mut m = MatrixF64::zeros(2, 2).unwrap();
        m.set(1, 0, 3.0);
        let cursor = m.row_begin() + 1;
        let a = cursor.get();
        let b = cursor.get();
        assert_ne!(a.as_ptr(), b.as_ptr());
        assert_eq!(a.get(0), b.get(0));
    }

    #[test]
    fn test_dereferencing_end_reports() {
        let v = VectorF64::from_slice(&[1.0]).unwrap();
        let (x, codes) = reported(|| v.cursor_end().get());
        assert_eq!(x, 0.0);
        assert_eq!(codes, vec![ErrorCode::InvalidArgument]);
    }

    #[test]
    fn test_cursors_of_different_owners() {
        let a = VectorF64::alloc(2).unwrap();
        let b = VectorF64::alloc(2).unwrap();
        let (d, codes) = reported(|| a.cursor_end() - b.cursor_begin());
        assert_eq!(d, 0);
        assert_eq!(codes.len(), 1);
        assert!(a.cursor_begin() != b.cursor_begin());
    }
}

// ============================================================
// Zero-sized construction
// ============================================================

mod zero_size_tests {
    use super::*;

    #[test]
    fn test_zero_length_vector_is_constructed() {
        let v = VectorF64::alloc(0).unwrap();
        let default = VectorF64::default();

        assert!(v.is_sentinel());
        assert!(!v.is_null());
        assert_eq!(v.use_count(), 1);
        assert_eq!(v.len(), 0);
        assert!(default.is_null());
        assert_eq!(default.use_count(), 0);
    }

    #[test]
    fn test_reads_on_zero_sized_objects_report() {
        let v = VectorF64::alloc(0).unwrap();
        let (x, codes) = reported(|| v.get(0));
        assert_eq!(x, 0.0);
        assert_eq!(codes, vec![ErrorCode::InvalidArgument]);

        for (n1, n2) in [(0, 4), (3, 0), (0, 0)] {
            let m = MatrixF64::alloc(n1, n2).unwrap();
            assert!(m.is_sentinel());
            assert_eq!(m.len(), 0);
            let (x, codes) = reported(|| m.get(0, 0));
            assert_eq!(x, 0.0);
            assert_eq!(codes.len(), 1);
        }
    }

    #[test]
    fn test_views_of_zero_sized_matrices_are_empty() {
        let before = stats();
        for (n1, n2) in [(3, 0), (0, 4)] {
            let m = MatrixF64::alloc(n1, n2).unwrap();
            let ((empty, forward, backward), codes) = reported(|| {
                let empty = [m.row(0).is_null(), m.column(0).is_null(), m.diagonal().is_null()];
                (empty, m.rows().count(), m.rows().rev().count())
            });
            assert_eq!(empty, [true; 3]);
            assert_eq!((forward, backward), (0, 0));
            // Only the index past the zero dimension is out of range.
            assert_eq!(codes, vec![ErrorCode::InvalidArgument], "{n1}x{n2}");
        }

        let m = MatrixF64::alloc(0, 4).unwrap();
        let (col, codes) = reported(|| m.column(2).is_null());
        assert!(col);
        assert!(codes.is_empty());

        let m = MatrixF64::alloc(3, 0).unwrap();
        let (row, codes) = reported(|| m.row(2).is_null());
        assert!(row);
        assert!(codes.is_empty());

        let after = stats();
        assert_eq!(after.allocation_count, before.allocation_count);
    }

    #[test]
    fn test_zero_sized_objects_never_reach_foreign_allocator() {
        let before = stats();
        let v = VectorF64::alloc(0).unwrap();
        let copy = v.deep_clone().unwrap();
        drop(v);
        drop(copy);
        let after = stats();
        assert_eq!(after.allocation_count, before.allocation_count);
        assert_eq!(after.deallocation_count, before.deallocation_count);
    }
}

// ============================================================
// Release
// ============================================================

mod release_tests {
    use super::*;

    #[test]
    fn test_everything_released_once() {
        let before = stats().live();
        {
            let m = MatrixF64::alloc(3, 3).unwrap();
            let shared = m.share();
            let rows: Vec<_> = shared.rows().collect();
            let copy = m.deep_clone().unwrap();
            assert_eq!(rows.len(), 3);
            assert!(copy.unique());
        }
        assert_eq!(stats().live(), before);
    }

    #[test]
    fn test_allocation_failure_is_an_error() {
        let before = stats().live();
        fail_allocations_after(0);
        let (result, codes) = reported(|| VectorF64::alloc(8));
        clear_allocation_faults();

        assert!(matches!(result, Err(Error::AllocationFailure(_))));
        assert_eq!(codes.len(), 1);
        assert_eq!(stats().live(), before);
    }

    #[test]
    fn test_view_header_failure_gives_empty_view() {
        let v = VectorF64::from_slice(&[1.0, 2.0, 3.0]).unwrap();
        let m = MatrixF64::alloc(3, 3).unwrap();
        let before = stats().live();

        let cases: [(&str, &dyn Fn() -> bool); 4] = [
            ("row", &|| m.row(1).is_null()),
            ("subvector", &|| v.subvector(0, 2).is_null()),
            ("submatrix", &|| m.submatrix(0, 0, 2, 2).is_null()),
            ("row cursor", &|| m.row_begin().get().is_null()),
        ];
        for (what, derive) in cases {
            fail_allocations_after(0);
            let (empty, codes) = reported(derive);
            clear_allocation_faults();
            assert!(empty, "{what}");
            assert_eq!(codes, vec![ErrorCode::NoMemory], "{what}");
            assert_eq!(stats().live(), before, "{what}");
        }

        // Nothing sticks once the allocator recovers.
        assert_eq!(m.row(1).len(), 3);
        assert_eq!(stats().live(), before);
    }

    #[test]
    fn test_partial_failure_releases_what_succeeded() {
        let before = stats().live();
        let m = MatrixF64::alloc(2, 2).unwrap();
        fail_allocations_after(0);
        let (copy, _) = reported(|| m.deep_clone());
        clear_allocation_faults();
        assert!(copy.is_err());
        drop(m);
        assert_eq!(stats().live(), before);
    }
}

// ============================================================
// The 3x4 matrix walk-through
// ============================================================

#[test]
fn test_three_by_four_matrix() {
    let mut m = MatrixF64::alloc(3, 4).unwrap();
    for i in 0..3 {
        for j in 0..4 {
            m.set(i, j, (10 * i + j) as f64);
        }
    }

    let row = m.row(1);
    assert_eq!(row.len(), 4);
    assert_eq!(row.to_vec(), vec![10.0, 11.0, 12.0, 13.0]);
    drop(row);

    let mut seen = Vec::new();
    for row in &m {
        assert_eq!(row.len(), 4);
        seen.push(row.get(0));
    }
    assert_eq!(seen, vec![0.0, 10.0, 20.0]);

    let mut copy = m.deep_clone().unwrap();
    copy.row_mut(1).fill(-1.0);
    assert_eq!(copy.row(1).to_vec(), vec![-1.0; 4]);
    assert_eq!(m.row(1).to_vec(), vec![10.0, 11.0, 12.0, 13.0]);

    for mut row in &mut m {
        row.set(0, 0.5);
    }
    assert_eq!(m.column(0).to_vec(), vec![0.5; 3]);
}
