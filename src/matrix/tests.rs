// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use marlu::c64;
use ndarray::prelude::*;
use strum::IntoEnumIterator;

use super::*;
use crate::constants::PI;

/// One example of each representation. Arrays have shape (3, 1).
fn examples() -> [Matrix; 4] {
    [
        Matrix::RealScalar(2.0),
        Matrix::ComplexScalar(c64::new(0.5, -1.5)),
        Matrix::RealArray(array![[1.0], [2.0], [3.0]]),
        Matrix::ComplexArray(array![
            [c64::new(1.0, 1.0)],
            [c64::new(-2.0, 0.5)],
            [c64::new(0.25, 3.0)]
        ]),
    ]
}

#[test]
fn test_promotion_table_is_complete() {
    for op in BinaryOp::iter() {
        for lhs in examples() {
            for rhs in examples() {
                let expected_kind = lhs.kind().promote(rhs.kind());
                let expected_shape = if lhs.is_scalar() && rhs.is_scalar() {
                    (1, 1)
                } else {
                    (3, 1)
                };

                // Reference: do the arithmetic on complex numbers one cell at
                // a time.
                let mut reference = vec![];
                for ix in 0..expected_shape.0 {
                    let a = lhs.get(ix.min(lhs.shape().0 - 1), 0).unwrap();
                    let b = rhs.get(ix.min(rhs.shape().0 - 1), 0).unwrap();
                    reference.push(op.complex(a, b));
                }

                let result = lhs.clone().binary(op, &rhs).unwrap();
                assert_eq!(
                    result.kind(),
                    expected_kind,
                    "{} {op} {}",
                    lhs.kind(),
                    rhs.kind()
                );
                assert_eq!(result.shape(), expected_shape);
                for (r, e) in result.iter_complex().zip(reference) {
                    assert_abs_diff_eq!(r.re, e.re, epsilon = 1e-12);
                    assert_abs_diff_eq!(r.im, e.im, epsilon = 1e-12);
                }
            }
        }
    }
}

#[test]
fn test_real_array_plus_complex_scalar() {
    let a = Matrix::RealArray(array![[1.0], [2.0], [3.0]]);
    let b = Matrix::ComplexScalar(c64::new(0.0, 1.0));
    let result = a.try_add(&b).unwrap();
    let expected = Matrix::ComplexArray(array![
        [c64::new(1.0, 1.0)],
        [c64::new(2.0, 1.0)],
        [c64::new(3.0, 1.0)]
    ]);
    assert_abs_diff_eq!(result, expected, epsilon = 1e-15);
}

#[test]
fn test_shape_mismatch() {
    let a = Matrix::RealArray(Array2::ones((3, 2)));
    let b = Matrix::ComplexArray(Array2::ones((2, 3)));
    let result = a.try_mul(&b);
    assert_eq!(
        result,
        Err(MatrixError::ShapeMismatch {
            op: "*",
            left: (3, 2),
            right: (2, 3)
        })
    );
}

#[test]
fn test_shape_mismatch_names_each_op() {
    let a = Matrix::RealArray(Array2::ones((3, 2)));
    let b = Matrix::RealArray(Array2::ones((2, 3)));
    for op in BinaryOp::iter() {
        match a.clone().binary(op, &b) {
            Err(MatrixError::ShapeMismatch { op: name, .. }) => {
                assert_eq!(name, op.to_string())
            }
            other => panic!("Expected a shape mismatch for '{op}', got {other:?}"),
        }
    }
}

#[test]
fn test_operand_is_not_aliased() {
    // The left operand's storage may be reused, but a clone held elsewhere
    // must never observe it.
    let a = Matrix::RealArray(array![[1.0, 2.0]]);
    let kept = a.clone();
    let b = a.try_add(&Matrix::RealScalar(10.0)).unwrap();
    assert_eq!(kept, Matrix::RealArray(array![[1.0, 2.0]]));
    assert_eq!(b, Matrix::RealArray(array![[11.0, 12.0]]));
}

#[test]
fn test_unary_functions() {
    let x = Matrix::RealArray(array![[0.0, PI / 2.0]]);
    assert_abs_diff_eq!(
        x.clone().sin(),
        Matrix::RealArray(array![[0.0, 1.0]]),
        epsilon = 1e-15
    );
    assert_abs_diff_eq!(
        x.clone().cos(),
        Matrix::RealArray(array![[1.0, 0.0]]),
        epsilon = 1e-15
    );
    assert_abs_diff_eq!(
        x.negate(),
        Matrix::RealArray(array![[0.0, -PI / 2.0]]),
        epsilon = 1e-15
    );

    let z = Matrix::ComplexScalar(c64::new(0.0, PI));
    assert_abs_diff_eq!(
        z.exp(),
        Matrix::ComplexScalar(c64::new(-1.0, 0.0)),
        epsilon = 1e-15
    );

    let z = Matrix::ComplexScalar(c64::new(-4.0, 0.0));
    assert_abs_diff_eq!(
        z.sqrt(),
        Matrix::ComplexScalar(c64::new(0.0, 2.0)),
        epsilon = 1e-15
    );
    assert!(matches!(Matrix::RealScalar(-4.0).sqrt(), Matrix::RealScalar(v) if v.is_nan()));

    let z = Matrix::ComplexScalar(c64::new(1.0, 2.0));
    assert_eq!(z.conj(), Matrix::ComplexScalar(c64::new(1.0, -2.0)));
    assert_eq!(Matrix::RealScalar(3.0).conj(), Matrix::RealScalar(3.0));

    let z = Matrix::ComplexArray(array![[c64::new(3.0, 4.0)]]);
    assert_eq!(z.clone().abs(), Matrix::RealArray(array![[5.0]]));
    assert_eq!(z.clone().real(), Matrix::RealArray(array![[3.0]]));
    assert_eq!(z.imag(), Matrix::RealArray(array![[4.0]]));
}

#[test]
fn test_real_only_functions_reject_complex() {
    let z = Matrix::ComplexScalar(c64::new(0.1, 0.0));
    assert_eq!(
        z.clone().asin(),
        Err(MatrixError::RealOperandRequired { op: "asin" })
    );
    assert_eq!(
        z.clone().acos(),
        Err(MatrixError::RealOperandRequired { op: "acos" })
    );
    assert_eq!(
        z.clone().atan2(&Matrix::one()),
        Err(MatrixError::RealOperandRequired { op: "atan2" })
    );
    assert_eq!(
        Matrix::one().posdiff(&z),
        Err(MatrixError::RealOperandRequired { op: "posdiff" })
    );
    assert_eq!(
        Matrix::one().min(&z),
        Err(MatrixError::RealOperandRequired { op: "min" })
    );
    assert_eq!(
        z.max(&Matrix::one()),
        Err(MatrixError::RealOperandRequired { op: "max" })
    );
    assert_eq!(
        Matrix::ComplexArray(Array2::zeros((2, 2))).max_value(),
        Err(MatrixError::RealOperandRequired { op: "max" })
    );
}

#[test]
fn test_real_only_functions() {
    let x = Matrix::RealArray(array![[0.5, 1.0]]);
    assert_abs_diff_eq!(
        x.clone().asin().unwrap(),
        Matrix::RealArray(array![[PI / 6.0, PI / 2.0]]),
        epsilon = 1e-15
    );
    assert_abs_diff_eq!(
        x.acos().unwrap(),
        Matrix::RealArray(array![[PI / 3.0, 0.0]]),
        epsilon = 1e-15
    );

    let y = Matrix::RealScalar(1.0);
    assert_abs_diff_eq!(
        y.atan2(&Matrix::RealScalar(-1.0)).unwrap(),
        Matrix::RealScalar(3.0 / 4.0 * PI),
        epsilon = 1e-15
    );

    let a = Matrix::RealArray(array![[1.0, 5.0, -2.0]]);
    let b = Matrix::RealScalar(2.0);
    assert_eq!(
        a.clone().min(&b).unwrap(),
        Matrix::RealArray(array![[1.0, 2.0, -2.0]])
    );
    assert_eq!(
        a.max(&b).unwrap(),
        Matrix::RealArray(array![[2.0, 5.0, 2.0]])
    );
}

#[test]
fn test_posdiff_wraps() {
    let x = Matrix::RealArray(array![[3.0, -3.0, 0.5, PI]]);
    let y = Matrix::RealArray(array![[-3.0, 3.0, 0.25, 0.0]]);
    let d = x.posdiff(&y).unwrap();
    let expected = Matrix::RealArray(array![[6.0 - 2.0 * PI, 2.0 * PI - 6.0, 0.25, -PI]]);
    assert_abs_diff_eq!(d, expected, epsilon = 1e-12);
}

#[test]
fn test_reductions() {
    let a = Matrix::RealArray(array![[1.0, 2.0], [3.0, 6.0]]);
    assert_eq!(a.sum(), Matrix::RealScalar(12.0));
    assert_eq!(a.mean().unwrap(), Matrix::RealScalar(3.0));
    assert_eq!(a.min_value().unwrap(), Matrix::RealScalar(1.0));
    assert_eq!(a.max_value().unwrap(), Matrix::RealScalar(6.0));

    let z = Matrix::ComplexArray(array![[c64::new(1.0, 1.0), c64::new(3.0, -1.0)]]);
    assert_eq!(z.sum(), Matrix::ComplexScalar(c64::new(4.0, 0.0)));
    assert_eq!(z.mean().unwrap(), Matrix::ComplexScalar(c64::new(2.0, 0.0)));

    assert_eq!(
        Matrix::RealArray(Array2::zeros((0, 3))).min_value(),
        Err(MatrixError::Empty { op: "min" })
    );
}

#[test]
fn test_to_complex() {
    let re = Matrix::RealArray(array![[1.0, 2.0]]);
    let im = Matrix::RealArray(array![[3.0, 4.0]]);
    assert_eq!(
        Matrix::to_complex(&re, &im).unwrap(),
        Matrix::ComplexArray(array![[c64::new(1.0, 3.0), c64::new(2.0, 4.0)]])
    );

    let bad = Matrix::RealArray(array![[3.0], [4.0]]);
    assert!(matches!(
        Matrix::to_complex(&re, &bad),
        Err(MatrixError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        Matrix::to_complex(&Matrix::ComplexScalar(c64::new(1.0, 0.0)), &im),
        Err(MatrixError::RealOperandRequired { .. })
    ));
}

#[test]
fn test_expand() {
    let m = Matrix::ComplexScalar(c64::new(1.0, -1.0)).expand(2, 3).unwrap();
    assert_eq!(m.kind(), MatrixKind::ComplexArray);
    assert_eq!(m.shape(), (2, 3));
    assert_eq!(m.get(1, 2).unwrap(), c64::new(1.0, -1.0));
    assert!(m.get(2, 0).is_err());
    assert!(m.expand(3, 2).is_err());
}
