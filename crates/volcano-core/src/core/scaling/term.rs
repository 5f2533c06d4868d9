use serde::Serialize;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A function `a·x + b·y + c` of the two descriptor free energies.
///
/// The same triple describes both a fitted scaling relation for one adsorbate and the
/// free-energy change of one reaction step, so both are expressed through this type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LinearTerm {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Per-adsorbate linear parameters over the descriptor pair.
pub type ScalingRelationParams = LinearTerm;

/// Free-energy change of one reaction step over the descriptor pair.
pub type StepLinearFunction = LinearTerm;

impl LinearTerm {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Identity projection onto the x descriptor.
    pub fn x_identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Identity projection onto the y descriptor.
    pub fn y_identity() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    pub fn constant(c: f64) -> Self {
        Self::new(0.0, 0.0, c)
    }

    #[inline]
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        self.a * x + self.b * y + self.c
    }
}

impl Add for LinearTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            a: self.a + rhs.a,
            b: self.b + rhs.b,
            c: self.c + rhs.c,
        }
    }
}

impl AddAssign for LinearTerm {
    fn add_assign(&mut self, rhs: Self) {
        self.a += rhs.a;
        self.b += rhs.b;
        self.c += rhs.c;
    }
}

impl Sub for LinearTerm {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            a: self.a - rhs.a,
            b: self.b - rhs.b,
            c: self.c - rhs.c,
        }
    }
}

impl SubAssign for LinearTerm {
    fn sub_assign(&mut self, rhs: Self) {
        self.a -= rhs.a;
        self.b -= rhs.b;
        self.c -= rhs.c;
    }
}

impl Mul<f64> for LinearTerm {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            a: self.a * rhs,
            b: self.b * rhs,
            c: self.c * rhs,
        }
    }
}

impl Neg for LinearTerm {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self * -1.0
    }
}

impl std::iter::Sum for LinearTerm {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, term| acc + term)
    }
}
