// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`pixfilters` provides low-level pixel-domain resampling and convolution filters:
a displacement filter and an emboss/bumpmap filter.

`pixfilters` doesn't implement the whole filters workflow, just operations on raster images.
Image loading, selection handling, merging results back into persistent storage
and parameter validation beyond what the filters need should be implemented by the caller.

Images are interleaved 8-bit buffers with 1 to 4 channels:

- 1 - gray
- 2 - gray + alpha
- 3 - RGB
- 4 - RGBA

Alpha, when present, is always the last channel.

## Implemented filters

- [`displace`] - per-pixel coordinate perturbation driven by two displacement maps,
  with bilinear resampling and `Wrap`/`Smear`/`Black` edge handling.
- [`emboss`] - surface normals from a 3x3 neighborhood shaded against a distant light,
  either written directly or used to modulate the source colors.

## Performance

Filters work on provided buffers and never allocate.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]

use float_cmp::ApproxEqUlps;
pub use rgb::RGB8;

macro_rules! enum_from_str {
    ($name:ident, $($string:pat => $result:expr),+) => {
        impl core::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($string => Ok($result)),+,
                    _ => Err("invalid value"),
                }
            }
        }
    };
}

mod bilinear;
mod displacement_map;
mod emboss;
mod region;
mod sampler;

pub use bilinear::{bilinear, floor_coord, interpolate_pixel};
pub use displacement_map::{Displacement, displace, map_intensity};
pub use emboss::{Emboss, EmbossMode, LightModel, emboss, shade_row};
pub use region::{Region, Tiles, TILE_SIZE};
pub use sampler::{EdgeMode, sample};

/// The maximum number of channels per pixel.
pub const MAX_CHANNELS: usize = 4;


/// List of all errors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error {
    /// A filter parameter or an image/region combination is invalid.
    ///
    /// For example, a zero depth, a map that doesn't match the source size
    /// or a region that doesn't fit the image.
    InvalidParameter(&'static str),

    /// An image has an unsupported number of channels.
    ///
    /// Only 1, 2, 3 and 4 channels are supported.
    UnsupportedFormat(usize),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Error::InvalidParameter(msg) => {
                write!(f, "invalid parameter: {}", msg)
            }
            Error::UnsupportedFormat(n) => {
                write!(f, "images with {} channels are not supported", n)
            }
        }
    }
}

impl std::error::Error for Error {}


#[inline]
fn check_layout(len: usize, width: u32, height: u32, bpp: usize) -> Result<(), Error> {
    if bpp == 0 || bpp > MAX_CHANNELS {
        return Err(Error::UnsupportedFormat(bpp));
    }

    if width == 0 || height == 0 {
        return Err(Error::InvalidParameter("image size cannot be zero"));
    }

    if width as usize * height as usize * bpp != len {
        return Err(Error::InvalidParameter("image data length doesn't match its size"));
    }

    Ok(())
}


/// An image reference.
///
/// Pixels are stored row by row with interleaved channels.
#[derive(Clone, Copy, Debug)]
pub struct ImageRef<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    bpp: usize,
}

impl<'a> ImageRef<'a> {
    /// Creates a new image reference.
    ///
    /// Doesn't clone the provided data.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` when `bpp` is not in 1..=4.
    /// - `InvalidParameter` when the size is zero or `data` length is not `width * height * bpp`.
    #[inline]
    pub fn new(data: &'a [u8], width: u32, height: u32, bpp: usize) -> Result<Self, Error> {
        check_layout(data.len(), width, height, bpp)?;
        Ok(ImageRef { data, width, height, bpp })
    }

    /// Returns the image width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of bytes per pixel.
    #[inline]
    pub fn bpp(&self) -> usize {
        self.bpp
    }

    /// Checks that the last channel is alpha.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.bpp == 2 || self.bpp == 4
    }

    /// Returns a region that covers the whole image.
    #[inline]
    pub fn region(&self) -> Region {
        Region::new(0, 0, self.width, self.height)
    }

    /// Returns the raw image data.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns pixel channels at the specified position.
    ///
    /// # Panics
    ///
    /// When position is out of bounds.
    #[inline]
    pub fn pixel_at(&self, x: u32, y: u32) -> &'a [u8] {
        let idx = (self.width as usize * y as usize + x as usize) * self.bpp;
        &self.data[idx..idx + self.bpp]
    }

    /// Returns `width` pixels of row `y` starting at column `x`.
    ///
    /// # Panics
    ///
    /// When the span is out of bounds.
    #[inline]
    pub fn row(&self, y: u32, x: u32, width: u32) -> &'a [u8] {
        let start = (self.width as usize * y as usize + x as usize) * self.bpp;
        &self.data[start..start + width as usize * self.bpp]
    }
}


/// A mutable `ImageRef` variant.
#[derive(Debug)]
pub struct ImageRefMut<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    bpp: usize,
}

impl<'a> ImageRefMut<'a> {
    /// Creates a new mutable image reference.
    ///
    /// Doesn't clone the provided data.
    ///
    /// # Errors
    ///
    /// Same as [`ImageRef::new`].
    #[inline]
    pub fn new(data: &'a mut [u8], width: u32, height: u32, bpp: usize) -> Result<Self, Error> {
        check_layout(data.len(), width, height, bpp)?;
        Ok(ImageRefMut { data, width, height, bpp })
    }

    /// Returns the image width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of bytes per pixel.
    #[inline]
    pub fn bpp(&self) -> usize {
        self.bpp
    }

    /// Checks that the last channel is alpha.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.bpp == 2 || self.bpp == 4
    }

    /// Returns a read-only view of the same image.
    #[inline]
    pub fn as_image_ref(&self) -> ImageRef {
        ImageRef {
            data: &*self.data,
            width: self.width,
            height: self.height,
            bpp: self.bpp,
        }
    }

    #[inline]
    fn pixel_at_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let idx = (self.width as usize * y as usize + x as usize) * self.bpp;
        &mut self.data[idx..idx + self.bpp]
    }

    #[inline]
    fn row_mut(&mut self, y: u32, x: u32, width: u32) -> &mut [u8] {
        let start = (self.width as usize * y as usize + x as usize) * self.bpp;
        &mut self.data[start..start + width as usize * self.bpp]
    }
}


/// A single pixel with up to 4 channels.
///
/// Derefs to a slice of exactly `len` channels.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Pixel {
    channels: [u8; MAX_CHANNELS],
    len: u8,
}

impl Pixel {
    /// Creates a pixel from the provided channels.
    ///
    /// Channels after the fourth one are ignored.
    #[inline]
    pub fn from_slice(data: &[u8]) -> Self {
        let len = core::cmp::min(data.len(), MAX_CHANNELS);
        let mut channels = [0; MAX_CHANNELS];
        channels[..len].copy_from_slice(&data[..len]);
        Pixel { channels, len: len as u8 }
    }

    /// Creates a pixel with all `len` channels set to zero, alpha included.
    #[inline]
    pub fn zeroed(len: usize) -> Self {
        Pixel {
            channels: [0; MAX_CHANNELS],
            len: core::cmp::min(len, MAX_CHANNELS) as u8,
        }
    }
}

impl core::ops::Deref for Pixel {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.channels[..self.len as usize]
    }
}

impl core::ops::DerefMut for Pixel {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.channels[..self.len as usize]
    }
}


// TODO: https://github.com/rust-lang/rust/issues/44095
#[inline]
fn f64_bound(min: f64, val: f64, max: f64) -> f64 {
    debug_assert!(min.is_finite());
    debug_assert!(max.is_finite());

    if val > max {
        max
    } else if val < min {
        min
    } else {
        val
    }
}


trait FuzzyEq<Rhs: ?Sized = Self> {
    fn fuzzy_eq(&self, other: &Rhs) -> bool;
}

trait FuzzyZero: FuzzyEq {
    fn is_fuzzy_zero(&self) -> bool;
}

impl FuzzyEq for f64 {
    #[inline]
    fn fuzzy_eq(&self, other: &f64) -> bool {
        self.approx_eq_ulps(other, 4)
    }
}

impl FuzzyZero for f64 {
    #[inline]
    fn is_fuzzy_zero(&self) -> bool {
        self.fuzzy_eq(&0.0)
    }
}
