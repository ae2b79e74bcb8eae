// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// The default streaming tile size.
pub const TILE_SIZE: u32 = 64;

/// An axis-aligned rectangular window of an image.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Region {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Region {
    /// Creates a new region.
    #[inline]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Region { x, y, width, height }
    }

    /// Returns the left edge.
    #[inline]
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Returns the top edge.
    #[inline]
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Returns the region width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the region height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the exclusive right edge.
    ///
    /// Saturates at `u32::MAX`.
    #[inline]
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Returns the exclusive bottom edge.
    ///
    /// Saturates at `u32::MAX`.
    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Returns the number of pixels in the region.
    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Checks that the region has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Checks that the region lies inside a `width`x`height` image.
    #[inline]
    pub fn fits(&self, width: u32, height: u32) -> bool {
           self.x.checked_add(self.width).map_or(false, |r| r <= width)
        && self.y.checked_add(self.height).map_or(false, |b| b <= height)
    }

    /// Grows the region by `amount` pixels on every side,
    /// clamped to a `width`x`height` image.
    pub fn grow(&self, amount: u32, width: u32, height: u32) -> Self {
        let x1 = self.x.saturating_sub(amount);
        let y1 = self.y.saturating_sub(amount);
        let x2 = core::cmp::min(width, self.right().saturating_add(amount));
        let y2 = core::cmp::min(height, self.bottom().saturating_add(amount));

        Region::new(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
    }

    /// Splits the region into row-major tiles.
    ///
    /// Tiles on the right and bottom borders are clipped to the region.
    /// A zero tile size is treated as 1.
    #[inline]
    pub fn tiles(&self, tile_width: u32, tile_height: u32) -> Tiles {
        Tiles {
            region: *self,
            tile_width: core::cmp::max(tile_width, 1),
            tile_height: core::cmp::max(tile_height, 1),
            x: self.x,
            y: self.y,
        }
    }
}


/// An iterator over region tiles.
///
/// Created by [`Region::tiles`].
#[derive(Clone, Debug)]
pub struct Tiles {
    region: Region,
    tile_width: u32,
    tile_height: u32,
    x: u32,
    y: u32,
}

impl Iterator for Tiles {
    type Item = Region;

    fn next(&mut self) -> Option<Self::Item> {
        if self.region.is_empty() || self.y >= self.region.bottom() {
            return None;
        }

        let w = core::cmp::min(self.tile_width, self.region.right() - self.x);
        let h = core::cmp::min(self.tile_height, self.region.bottom() - self.y);
        let tile = Region::new(self.x, self.y, w, h);

        self.x += w;
        if self.x >= self.region.right() {
            self.x = self.region.x;
            self.y += h;
        }

        Some(tile)
    }
}
