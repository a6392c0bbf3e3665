//! # Dense linear algebra for influence systems
//!
//! Aerodynamic influence matrices are dense and unsymmetric; a single
//! factorization is reused against many right-hand sides (one per operating
//! point). This crate provides LU factorization with partial pivoting and
//! multi-RHS back substitution.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lu;

pub use lu::{lu_factorize, lu_solve, LuError, LuFactorization};
