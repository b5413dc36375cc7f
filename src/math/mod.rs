//! Mathematical utilities: halo shape basis, spline interpolation and
//! weighted least squares.

pub mod basis;
pub mod ols;
pub mod spline;

pub use basis::*;
pub use ols::*;
pub use spline::*;
