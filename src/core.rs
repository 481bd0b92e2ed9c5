//! Core abstractions and types shared by all algorithms.
//!
//! *Users* are mainly interested in implementing the [`Objective`] trait (and
//! [`Gradient`] for the descent framework), optionally specifying the
//! [domain](Domain).

mod base;
mod domain;
mod objective;

pub use base::*;
pub use domain::*;
pub use objective::*;
