//! Pyramid construction kernels: in-place bilinear downscaling at the
//! fixed ratios 7/8 and 13/16, and an in-place 5x5 Gaussian blur built
//! entirely from round-halving adds. The feature pipeline never calls
//! these itself; they belong to whoever assembles the image pyramid.

mod bilinear;
mod gaussian;

pub use bilinear::{bilinear_13_16, bilinear_7_8};
pub use gaussian::gaussian_5x5;
