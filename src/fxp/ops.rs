//! Fixed-point operations.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::types::scalar::FxpScalar;
use crate::fxp::qformat::{FRAC_BITS, SCALE};

fn saturate(value: i64) -> FxpScalar {
    if value > i32::MAX as i64 {
        FxpScalar(i32::MAX)
    } else if value < i32::MIN as i64 {
        FxpScalar(i32::MIN)
    } else {
        FxpScalar(value as i32)
    }
}

/// Basic fixed-point addition with saturation.
pub fn fxp_add(a: FxpScalar, b: FxpScalar) -> FxpScalar {
    FxpScalar(a.0.saturating_add(b.0))
}

/// Basic fixed-point subtraction with saturation.
pub fn fxp_sub(a: FxpScalar, b: FxpScalar) -> FxpScalar {
    FxpScalar(a.0.saturating_sub(b.0))
}

/// Fixed-point multiplication with i64 intermediate, truncating shift and saturation.
pub fn fxp_mul(a: FxpScalar, b: FxpScalar) -> FxpScalar {
    let product = (a.0 as i64) * (b.0 as i64);
    saturate(product >> FRAC_BITS)
}

/// Integer to fixed point, saturating outside the Q16.16 range.
pub fn from_int(value: i64) -> FxpScalar {
    saturate(value.saturating_mul(SCALE as i64))
}

/// Converts a real factor once at setup time. Rounds to nearest.
pub fn from_f64(value: f64) -> FxpScalar {
    let raw = (value * SCALE as f64).round();
    if raw.is_nan() {
        return FxpScalar::ZERO;
    }
    saturate(raw.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
}

/// Fixed point to real, for reporting only.
pub fn to_f64(s: FxpScalar) -> f64 {
    (s.0 as f64) / (SCALE as f64)
}
