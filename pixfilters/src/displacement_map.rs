// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::bilinear::{interpolate_pixel, split_coord};
use crate::{EdgeMode, Error, ImageRef, ImageRefMut, Region, RGB8, TILE_SIZE, MAX_CHANNELS, sample};

/// A map intensity that produces no displacement.
const NEUTRAL: f64 = 127.5;

const INTENSITY_RED: f64 = 0.30;
const INTENSITY_GREEN: f64 = 0.59;
const INTENSITY_BLUE: f64 = 0.11;

/// Displacement filter parameters.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Displacement {
    /// Maximum horizontal displacement in pixels.
    ///
    /// Can be negative.
    pub amount_x: f64,
    /// Maximum vertical displacement in pixels.
    ///
    /// Can be negative.
    pub amount_y: f64,
    /// Enables horizontal displacement.
    pub enable_x: bool,
    /// Enables vertical displacement.
    pub enable_y: bool,
    /// How source pixels outside the image are resolved.
    pub edge_mode: EdgeMode,
}

impl Default for Displacement {
    fn default() -> Self {
        Displacement {
            amount_x: 20.0,
            amount_y: 20.0,
            enable_x: true,
            enable_y: true,
            edge_mode: EdgeMode::Wrap,
        }
    }
}

#[inline]
fn intensity(c: RGB8) -> f64 {
      c.r as f64 * INTENSITY_RED
    + c.g as f64 * INTENSITY_GREEN
    + c.b as f64 * INTENSITY_BLUE
}

/// Converts a displacement map pixel into an intensity in `0..=255`.
///
/// Pixels with 3 or more channels use a weighted RGB sum, others use the first channel.
/// When `has_alpha` is set, the last channel blends the intensity toward 127.5,
/// so a fully transparent pixel produces no displacement.
///
/// # Errors
///
/// `UnsupportedFormat` when `pixel` doesn't have 1 to 4 channels.
pub fn map_intensity(pixel: &[u8], has_alpha: bool) -> Result<f64, Error> {
    if pixel.is_empty() || pixel.len() > MAX_CHANNELS {
        return Err(Error::UnsupportedFormat(pixel.len()));
    }

    let mut v = if pixel.len() >= 3 {
        intensity(RGB8::new(pixel[0], pixel[1], pixel[2]))
    } else {
        pixel[0] as f64
    };

    if has_alpha {
        let alpha = pixel[pixel.len() - 1] as f64;
        v = ((v - NEUTRAL) * alpha / 255.0) + NEUTRAL;
    }

    Ok(v)
}

fn check_map<'a>(map: Option<ImageRef<'a>>, src: &ImageRef) -> Result<ImageRef<'a>, Error> {
    let map = map.ok_or(Error::InvalidParameter("an enabled axis requires a displacement map"))?;
    if map.width() != src.width() || map.height() != src.height() {
        return Err(Error::InvalidParameter("a displacement map must have the same size as the source"));
    }

    Ok(map)
}

/// Applies a displacement map.
///
/// Every pixel of `dest` inside `region` is replaced with a bilinear sample of `src`
/// taken at its own position shifted by `amount * (intensity - 127.5) / 127.5`,
/// where intensity comes from the matching pixel of `x_map` or `y_map`.
/// Pixels outside `region` are not touched.
///
/// Maps are read at the same absolute position as the destination pixel,
/// while `src` is sampled as a whole using `params.edge_mode`.
///
/// The region is processed in [`TILE_SIZE`] tiles and `progress` is called
/// after each tile with the fraction of the region done.
///
/// Does nothing when both axes are disabled.
///
/// # Errors
///
/// `InvalidParameter` when:
///
/// - `src` and `dest` have different sizes or channels count
/// - an enabled axis has no map or its map size doesn't match `src`
/// - `region` doesn't fit the image
pub fn displace(
    params: &Displacement,
    src: ImageRef,
    x_map: Option<ImageRef>,
    y_map: Option<ImageRef>,
    region: Region,
    mut dest: ImageRefMut,
    progress: &mut dyn FnMut(f64),
) -> Result<(), Error> {
    if src.width() != dest.width() || src.height() != dest.height() {
        return Err(Error::InvalidParameter("source and destination must have the same size"));
    }

    if src.bpp() != dest.bpp() {
        return Err(Error::InvalidParameter("source and destination must have the same channels"));
    }

    if !region.fits(src.width(), src.height()) {
        return Err(Error::InvalidParameter("region is outside of the image"));
    }

    if !params.enable_x && !params.enable_y {
        return Ok(());
    }

    let x_map = if params.enable_x { Some(check_map(x_map, &src)?) } else { None };
    let y_map = if params.enable_y { Some(check_map(y_map, &src)?) } else { None };

    let offset = |map: Option<ImageRef>, amount: f64, x: u32, y: u32| -> Result<f64, Error> {
        match map {
            Some(map) => {
                let v = map_intensity(map.pixel_at(x, y), map.has_alpha())?;
                Ok(amount * (v - NEUTRAL) / NEUTRAL)
            }
            None => Ok(0.0),
        }
    };

    let total = region.area() as f64;
    let mut done = 0;
    for tile in region.tiles(TILE_SIZE, TILE_SIZE) {
        for y in tile.y()..tile.bottom() {
            for x in tile.x()..tile.right() {
                let need_x = x as f64 + offset(x_map, params.amount_x, x, y)?;
                let need_y = y as f64 + offset(y_map, params.amount_y, x, y)?;

                let (xi, fx) = split_coord(need_x);
                let (yi, fy) = split_coord(need_y);
                let xi1 = xi.saturating_add(1);
                let yi1 = yi.saturating_add(1);

                let mode = params.edge_mode;
                let p00 = sample(src, xi,  yi,  mode);
                let p10 = sample(src, xi1, yi,  mode);
                let p01 = sample(src, xi,  yi1, mode);
                let p11 = sample(src, xi1, yi1, mode);

                let p = interpolate_pixel(fx, fy, &p00, &p10, &p01, &p11);
                dest.pixel_at_mut(x, y).copy_from_slice(&p);
            }
        }

        done += tile.area();
        progress(done as f64 / total);
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32, bpp: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(width as usize * height as usize * bpp);
        for y in 0..height {
            for x in 0..width {
                for c in 0..bpp {
                    data.push((x * 16 + y * 3 + c as u32 * 40) as u8);
                }
            }
        }

        data
    }

    fn run(params: &Displacement, src: &[u8], x_map: &[u8], y_map: &[u8], w: u32, h: u32, bpp: usize) -> Vec<u8> {
        let mut out = src.to_vec();
        let src_ref = ImageRef::new(src, w, h, bpp).unwrap();
        let x_map = ImageRef::new(x_map, w, h, 1).unwrap();
        let y_map = ImageRef::new(y_map, w, h, 1).unwrap();
        displace(
            params,
            src_ref,
            Some(x_map),
            Some(y_map),
            src_ref.region(),
            ImageRefMut::new(&mut out, w, h, bpp).unwrap(),
            &mut |_| {},
        ).unwrap();
        out
    }

    #[test]
    fn intensity_of_gray() {
        assert_eq!(map_intensity(&[200], false).unwrap(), 200.0);
    }

    #[test]
    fn intensity_of_rgb() {
        let v = map_intensity(&[100, 200, 50], false).unwrap();
        assert!((v - (30.0 + 118.0 + 5.5)).abs() < 1e-9);
    }

    #[test]
    fn transparent_map_is_neutral() {
        for pixel in &[[0u8, 0], [255, 0], [17, 0]] {
            assert_eq!(map_intensity(pixel, true).unwrap(), 127.5);
        }

        for pixel in &[[0u8, 0, 0, 0], [255, 255, 255, 0], [3, 99, 250, 0]] {
            assert_eq!(map_intensity(pixel, true).unwrap(), 127.5);
        }
    }

    #[test]
    fn half_transparent_map() {
        assert_eq!(map_intensity(&[255, 51], true).unwrap(), 153.0);
    }

    #[test]
    fn intensity_rejects_bad_pixels() {
        assert_eq!(map_intensity(&[], false), Err(Error::UnsupportedFormat(0)));
        assert_eq!(map_intensity(&[1, 2, 3, 4, 5], false), Err(Error::UnsupportedFormat(5)));
    }

    #[test]
    fn both_axes_disabled_is_identity() {
        let src = gradient(5, 4, 3);
        let map = vec![255; 20];
        let params = Displacement {
            amount_x: 50.0,
            amount_y: 50.0,
            enable_x: false,
            enable_y: false,
            edge_mode: EdgeMode::Black,
        };

        assert_eq!(run(&params, &src, &map, &map, 5, 4, 3), src);
    }

    #[test]
    fn zero_amount_is_identity() {
        let src = gradient(6, 5, 4);
        let x_map: Vec<u8> = (0..30).map(|i| (i * 37 % 256) as u8).collect();
        let y_map = vec![128; 30];
        let params = Displacement {
            amount_x: 0.0,
            amount_y: 0.0,
            enable_x: true,
            enable_y: false,
            edge_mode: EdgeMode::Smear,
        };

        assert_eq!(run(&params, &src, &x_map, &y_map, 6, 5, 4), src);
    }

    #[test]
    fn full_shift_by_one_pixel() {
        // A white map with amount 127.5/127.5 = 1.0 shifts by exactly one pixel.
        let src = gradient(4, 3, 1);
        let x_map = vec![255; 12];
        let y_map = vec![128; 12];
        let params = Displacement {
            amount_x: 1.0,
            amount_y: 0.0,
            enable_x: true,
            enable_y: false,
            edge_mode: EdgeMode::Wrap,
        };

        let out = run(&params, &src, &x_map, &y_map, 4, 3, 1);
        for y in 0..3 {
            for x in 0..4 {
                let expected = src[y * 4 + (x + 1) % 4];
                assert_eq!(out[y * 4 + x], expected);
            }
        }
    }

    #[test]
    fn black_edges() {
        let src = vec![200; 4];
        let x_map = vec![0; 4];
        let y_map = vec![128; 4];
        let params = Displacement {
            amount_x: 1.0,
            amount_y: 0.0,
            enable_x: true,
            enable_y: false,
            edge_mode: EdgeMode::Black,
        };

        // A black map shifts by -1, so the first column reads outside of the image.
        let out = run(&params, &src, &x_map, &y_map, 2, 2, 1);
        assert_eq!(out, vec![0, 200, 0, 200]);
    }

    #[test]
    fn only_region_is_written() {
        let src = gradient(8, 8, 1);
        let mut out = vec![7; 64];
        let map = vec![255; 64];
        let params = Displacement {
            amount_x: 2.0,
            amount_y: 2.0,
            edge_mode: EdgeMode::Smear,
            ..Displacement::default()
        };

        let src_ref = ImageRef::new(&src, 8, 8, 1).unwrap();
        let map_ref = ImageRef::new(&map, 8, 8, 1).unwrap();
        let mut steps = Vec::new();
        displace(
            &params,
            src_ref,
            Some(map_ref),
            Some(map_ref),
            Region::new(2, 2, 3, 3),
            ImageRefMut::new(&mut out, 8, 8, 1).unwrap(),
            &mut |p| steps.push(p),
        ).unwrap();

        for y in 0..8 {
            for x in 0..8 {
                let inside = (2..5).contains(&x) && (2..5).contains(&y);
                if inside {
                    let sx = core::cmp::min(x + 2, 7);
                    let sy = core::cmp::min(y + 2, 7);
                    assert_eq!(out[y * 8 + x], src[sy * 8 + sx]);
                } else {
                    assert_eq!(out[y * 8 + x], 7);
                }
            }
        }

        assert_eq!(steps, vec![1.0]);
    }

    #[test]
    fn progress_over_tiles() {
        let src = gradient(200, 100, 1);
        let mut out = src.clone();
        let map = vec![127; 200 * 100];
        let params = Displacement { amount_x: 0.0, amount_y: 0.0, ..Displacement::default() };

        let src_ref = ImageRef::new(&src, 200, 100, 1).unwrap();
        let map_ref = ImageRef::new(&map, 200, 100, 1).unwrap();
        let mut steps = Vec::new();
        displace(
            &params,
            src_ref,
            Some(map_ref),
            Some(map_ref),
            Region::new(20, 10, 150, 70),
            ImageRefMut::new(&mut out, 200, 100, 1).unwrap(),
            &mut |p| steps.push(p),
        ).unwrap();

        // 3x2 tiles: 64 + 64 + 22 columns, 64 + 6 rows.
        assert_eq!(steps.len(), 6);
        assert_eq!(steps[0], 4096.0 / 10500.0);
        assert_eq!(steps[3], (2.0 * 4096.0 + 1408.0 + 384.0) / 10500.0);
        assert!(steps.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(steps.last(), Some(&1.0));
    }

    #[test]
    fn map_validation() {
        let src = vec![0; 16];
        let small = vec![0; 4];
        let mut out = src.clone();
        let src_ref = ImageRef::new(&src, 4, 4, 1).unwrap();
        let small_ref = ImageRef::new(&small, 2, 2, 1).unwrap();

        let res = displace(
            &Displacement::default(),
            src_ref,
            Some(small_ref),
            Some(src_ref),
            src_ref.region(),
            ImageRefMut::new(&mut out, 4, 4, 1).unwrap(),
            &mut |_| {},
        );
        assert!(matches!(res, Err(Error::InvalidParameter(_))));

        let res = displace(
            &Displacement::default(),
            src_ref,
            None,
            Some(src_ref),
            src_ref.region(),
            ImageRefMut::new(&mut out, 4, 4, 1).unwrap(),
            &mut |_| {},
        );
        assert!(matches!(res, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn region_validation() {
        let src = vec![0; 16];
        let mut out = src.clone();
        let src_ref = ImageRef::new(&src, 4, 4, 1).unwrap();
        let res = displace(
            &Displacement::default(),
            src_ref,
            Some(src_ref),
            Some(src_ref),
            Region::new(2, 2, 3, 1),
            ImageRefMut::new(&mut out, 4, 4, 1).unwrap(),
            &mut |_| {},
        );
        assert!(matches!(res, Err(Error::InvalidParameter(_))));
    }
}
