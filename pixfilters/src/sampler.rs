// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{ImageRef, Pixel};

/// An edges processing mode used by [`sample`].
///
/// Only matters when a sampled coordinate lies outside the image.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EdgeMode {
    /// Coordinates are taken modulo the image size.
    Wrap,
    /// Coordinates are clamped to the nearest edge pixel.
    Smear,
    /// Pixels outside the image are all zeros, alpha included.
    Black,
}

impl Default for EdgeMode {
    fn default() -> Self {
        EdgeMode::Wrap
    }
}

enum_from_str!(EdgeMode,
    "wrap"  => EdgeMode::Wrap,
    "smear" => EdgeMode::Smear,
    "black" => EdgeMode::Black
);

/// Fetches a pixel at an arbitrary position.
///
/// Never fails and never reads outside of `image`.
/// The returned pixel always has `image.bpp()` channels.
pub fn sample(image: ImageRef, x: i64, y: i64, mode: EdgeMode) -> Pixel {
    let w = image.width() as i64;
    let h = image.height() as i64;

    let (x, y) = match mode {
        EdgeMode::Wrap => {
            (x.rem_euclid(w), y.rem_euclid(h))
        }
        EdgeMode::Smear => {
            (bound(0, x, w - 1), bound(0, y, h - 1))
        }
        EdgeMode::Black => {
            if x < 0 || x >= w || y < 0 || y >= h {
                return Pixel::zeroed(image.bpp());
            }

            (x, y)
        }
    };

    Pixel::from_slice(image.pixel_at(x as u32, y as u32))
}

#[inline]
fn bound(min: i64, val: i64, max: i64) -> i64 {
    core::cmp::max(min, core::cmp::min(max, val))
}
