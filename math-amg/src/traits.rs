//! Core traits for the multigrid toolkit
//!
//! - [`ComplexField`]: scalar types the matrices are built from (real and complex)
//! - [`LinearOperator`]: anything that can perform a matrix-vector product
//! - [`Preconditioner`]: approximate inverses (AMG cycles, TFF, identity)

use ndarray::Array1;
use num_complex::{Complex32, Complex64};
use num_traits::{Float, FromPrimitive, NumAssign, One, ToPrimitive, Zero};
use std::fmt::Debug;
use std::ops::Neg;

/// Trait for scalar types that can be used in the sparse kernels.
///
/// Provided for `f64`, `f32`, `Complex64` and `Complex32`. Coarsening
/// criteria that depend on the sign of a coupling use [`ComplexField::re`];
/// magnitude criteria use [`ComplexField::norm`].
pub trait ComplexField:
    NumAssign + Clone + Copy + Send + Sync + Debug + Zero + One + Neg<Output = Self> + 'static
{
    /// The real number type underlying this field
    type Real: Float + NumAssign + FromPrimitive + ToPrimitive + Send + Sync + Debug + 'static;

    /// Complex conjugate
    fn conj(&self) -> Self;

    /// Squared magnitude |z|²
    fn norm_sqr(&self) -> Self::Real;

    /// Magnitude |z|
    fn norm(&self) -> Self::Real {
        self.norm_sqr().sqrt()
    }

    /// Create from a real value
    fn from_real(r: Self::Real) -> Self;

    /// Create from real and imaginary parts
    fn from_re_im(re: Self::Real, im: Self::Real) -> Self;

    /// Real part
    fn re(&self) -> Self::Real;

    /// Imaginary part
    fn im(&self) -> Self::Real;

    /// Check if this is approximately zero
    fn is_zero_approx(&self, tol: Self::Real) -> bool {
        self.norm_sqr() < tol * tol
    }

    /// Multiplicative inverse (1/z)
    fn inv(&self) -> Self;

    /// Square root
    fn sqrt(&self) -> Self;

    /// Convert an `f64` constant into the real type
    #[inline]
    fn real_from_f64(v: f64) -> Self::Real {
        Self::Real::from_f64(v).unwrap_or_else(Self::Real::zero)
    }

    /// Convert an `f64` constant into the field
    #[inline]
    fn from_f64(v: f64) -> Self {
        Self::from_real(Self::real_from_f64(v))
    }

    /// Real part as `f64`, for logging and statistics
    #[inline]
    fn re_f64(&self) -> f64 {
        self.re().to_f64().unwrap_or(0.0)
    }
}

macro_rules! impl_real_field {
    ($t:ty) => {
        impl ComplexField for $t {
            type Real = $t;

            #[inline]
            fn conj(&self) -> Self {
                *self
            }

            #[inline]
            fn norm_sqr(&self) -> $t {
                *self * *self
            }

            #[inline]
            fn norm(&self) -> $t {
                self.abs()
            }

            #[inline]
            fn from_real(r: $t) -> Self {
                r
            }

            #[inline]
            fn from_re_im(re: $t, _im: $t) -> Self {
                re
            }

            #[inline]
            fn re(&self) -> $t {
                *self
            }

            #[inline]
            fn im(&self) -> $t {
                0.0
            }

            #[inline]
            fn inv(&self) -> Self {
                1.0 / *self
            }

            #[inline]
            fn sqrt(&self) -> Self {
                <$t>::sqrt(*self)
            }
        }
    };
}

macro_rules! impl_complex_field {
    ($t:ty, $r:ty) => {
        impl ComplexField for $t {
            type Real = $r;

            #[inline]
            fn conj(&self) -> Self {
                <$t>::conj(self)
            }

            #[inline]
            fn norm_sqr(&self) -> $r {
                self.re * self.re + self.im * self.im
            }

            #[inline]
            fn from_real(r: $r) -> Self {
                <$t>::new(r, 0.0)
            }

            #[inline]
            fn from_re_im(re: $r, im: $r) -> Self {
                <$t>::new(re, im)
            }

            #[inline]
            fn re(&self) -> $r {
                self.re
            }

            #[inline]
            fn im(&self) -> $r {
                self.im
            }

            #[inline]
            fn inv(&self) -> Self {
                let denom = self.re * self.re + self.im * self.im;
                <$t>::new(self.re / denom, -self.im / denom)
            }

            #[inline]
            fn sqrt(&self) -> Self {
                <$t>::sqrt(*self)
            }
        }
    };
}

impl_real_field!(f64);
impl_real_field!(f32);
impl_complex_field!(Complex64, f64);
impl_complex_field!(Complex32, f32);

/// Trait for linear operators (matrices) that can perform matrix-vector products.
///
/// Solvers accept sparse matrices and matrix-free operators interchangeably.
pub trait LinearOperator<T: ComplexField>: Send + Sync {
    /// Number of rows in the operator
    fn num_rows(&self) -> usize;

    /// Number of columns in the operator
    fn num_cols(&self) -> usize;

    /// Apply the operator: y = A * x
    fn apply(&self, x: &Array1<T>) -> Array1<T>;

    /// Apply the transpose: y = A^T * x
    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T>;

    /// Apply the Hermitian (conjugate transpose): y = A^H * x
    fn apply_hermitian(&self, x: &Array1<T>) -> Array1<T> {
        let x_conj: Array1<T> = x.mapv(|v| v.conj());
        self.apply_transpose(&x_conj).mapv(|v| v.conj())
    }

    /// Check if the operator is square
    fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }
}

/// Trait for preconditioners used in iterative solvers.
///
/// A preconditioner M approximates A^(-1). Multigrid cycles and the TFF
/// block decomposition both implement it.
pub trait Preconditioner<T: ComplexField>: Send + Sync {
    /// Apply the preconditioner: z = M * r
    fn apply(&self, r: &Array1<T>) -> Array1<T>;
}

/// Identity preconditioner (no preconditioning)
#[derive(Clone, Debug, Default)]
pub struct IdentityPreconditioner;

impl<T: ComplexField> Preconditioner<T> for IdentityPreconditioner {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        r.clone()
    }
}
