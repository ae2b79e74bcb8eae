// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{FuzzyZero, Pixel, f64_bound};

/// Returns the largest integer less than or equal to `c`.
///
/// Non-negative values are truncated.
/// Negative values use `-(trunc(-c) + 1)`, unless `c` is already an integer.
/// Saturates on values outside of the `i64` range. `NaN` is mapped to zero.
#[inline]
pub fn floor_coord(c: f64) -> i64 {
    if c >= 0.0 {
        c as i64
    } else {
        let t = (-c) as i64;
        if (t as f64) < -c {
            -t.saturating_add(1)
        } else {
            -t
        }
    }
}

/// Splits a coordinate into an integer base and a fraction in `[0, 1]`.
#[inline]
pub(crate) fn split_coord(c: f64) -> (i64, f64) {
    let i = floor_coord(c);
    (i, f64_bound(0.0, c - i as f64, 1.0))
}

/// Interpolates a single channel.
///
/// `p00` is the sample at the base position, `p10`, `p01` and `p11` are its
/// right, bottom and bottom-right neighbors.
/// `fx` and `fy` are fractional offsets from the base position.
///
/// The result is rounded and clamped to `0..=255`.
#[inline]
pub fn bilinear(fx: f64, fy: f64, p00: u8, p10: u8, p01: u8, p11: u8) -> u8 {
    let m0 = (1.0 - fx) * p00 as f64 + fx * p10 as f64;
    let m1 = (1.0 - fx) * p01 as f64 + fx * p11 as f64;
    let v = (1.0 - fy) * m0 + fy * m1;
    (f64_bound(0.0, v, 255.0) + 0.5) as u8
}

/// Interpolates every channel of four neighbor pixels independently.
///
/// Alpha is treated like any other channel.
/// The result has the same number of channels as `p00`.
pub fn interpolate_pixel(fx: f64, fy: f64, p00: &Pixel, p10: &Pixel, p01: &Pixel, p11: &Pixel) -> Pixel {
    if fx.is_fuzzy_zero() && fy.is_fuzzy_zero() {
        return *p00;
    }

    let mut out = *p00;
    for (k, c) in out.iter_mut().enumerate() {
        *c = bilinear(fx, fy, p00[k], p10[k], p01[k], p11[k]);
    }

    out
}
