// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Q16.16 fixed-point arithmetic.

pub mod ops;

pub mod qformat {
    pub use crate::config::{FRAC_BITS, SCALE};
}
