// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Error, ImageRef, ImageRefMut, Region, f64_bound};

/// Light vector length.
const PIXEL_SCALE: f64 = 255.9;


/// An emboss output mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EmbossMode {
    /// The shade itself is written to every color channel.
    Bumpmap,
    /// Source colors are multiplied by the shade.
    Emboss,
}

impl Default for EmbossMode {
    fn default() -> Self {
        EmbossMode::Emboss
    }
}

enum_from_str!(EmbossMode,
    "bumpmap" => EmbossMode::Bumpmap,
    "emboss"  => EmbossMode::Emboss
);


/// Emboss filter parameters.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Emboss {
    /// Light direction in the image plane, in degrees.
    pub azimuth: f64,
    /// Light angle above the image plane, in degrees.
    pub elevation: f64,
    /// Filter width the 45 degrees slope is associated with.
    ///
    /// Must be at least 1.
    pub depth: u32,
    /// Output mode.
    pub mode: EmbossMode,
}

impl Default for Emboss {
    fn default() -> Self {
        Emboss {
            azimuth: 30.0,
            elevation: 45.0,
            depth: 20,
            mode: EmbossMode::default(),
        }
    }
}


#[derive(Clone, Copy, PartialEq, Debug)]
struct Vector3 {
    x: f64,
    y: f64,
    z: f64,
}

impl Vector3 {
    #[inline]
    fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3 { x, y, z }
    }
}


/// A distant light shading model.
///
/// Computed once per filter run.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LightModel {
    light: Vector3,
    nz: f64,
    nz2: f64,
    nz_lz: f64,
    background: f64,
}

impl LightModel {
    /// Creates a new light model.
    ///
    /// `azimuth` and `elevation` are in degrees.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when `depth` is zero.
    pub fn new(azimuth: f64, elevation: f64, depth: u32) -> Result<Self, Error> {
        if depth < 1 {
            return Err(Error::InvalidParameter("depth must be at least 1"));
        }

        let azimuth = azimuth.to_radians();
        let elevation = elevation.to_radians();
        let light = Vector3::new(
            azimuth.cos() * elevation.cos() * PIXEL_SCALE,
            azimuth.sin() * elevation.cos() * PIXEL_SCALE,
            elevation.sin() * PIXEL_SCALE,
        );

        // The surface normal z component is the slope associated with 45 degrees
        // for a filter of `depth` width. Integer division is intended.
        let nz = ((6 * 255) / depth) as f64;

        Ok(LightModel {
            light,
            nz,
            nz2: nz * nz,
            nz_lz: nz * light.z,
            // A flat surface has a [0 0 1] normal, so L.N is just Lz.
            background: light.z,
        })
    }

    /// Returns the light vector X component.
    #[inline]
    pub fn lx(&self) -> f64 {
        self.light.x
    }

    /// Returns the light vector Y component.
    #[inline]
    pub fn ly(&self) -> f64 {
        self.light.y
    }

    /// Returns the light vector Z component.
    #[inline]
    pub fn lz(&self) -> f64 {
        self.light.z
    }

    /// Returns the surface normal Z component.
    #[inline]
    pub fn nz(&self) -> f64 {
        self.nz
    }

    /// Returns the shade of a flat surface.
    #[inline]
    pub fn background(&self) -> f64 {
        self.background
    }

    /// Shades a surface with the `(nx, ny, Nz)` normal.
    ///
    /// Returns a value in `0..=256`.
    pub fn shade(&self, nx: i32, ny: i32) -> i32 {
        let shade = if nx == 0 && ny == 0 {
            self.background
        } else {
            let nx = nx as f64;
            let ny = ny as f64;
            let n_dot_l = nx * self.light.x + ny * self.light.y + self.nz_lz;
            if n_dot_l < 0.0 {
                0.0
            } else {
                n_dot_l / (nx * nx + ny * ny + self.nz2).sqrt()
            }
        };

        (f64_bound(0.0, shade, 256.0) + 0.5) as i32
    }
}


/// Shades a single row.
///
/// `rows` are the rows above, at and below the output row.
/// All of them, `texture` and `dst` must have the same length, a multiple of `bpp`.
/// Only the first channel of `rows` is used as a bump map.
///
/// When `texture` is set, its color channels are multiplied by the shade,
/// otherwise the shade itself is written to every color channel.
/// Alpha is copied from the middle row.
///
/// The first and the last pixels of `dst` are not touched.
pub fn shade_row(
    light: &LightModel,
    rows: [&[u8]; 3],
    texture: Option<&[u8]>,
    dst: &mut [u8],
    bpp: usize,
    has_alpha: bool,
) {
    debug_assert!(bpp > 0);
    debug_assert!(rows.iter().all(|r| r.len() == dst.len()));

    let width = dst.len() / bpp;
    if width < 3 {
        return;
    }

    let colors = if has_alpha { bpp - 1 } else { bpp };
    let [above, center, below] = rows;
    let bump = |row: &[u8], x: usize| row[x * bpp] as i32;

    for x in 1..width - 1 {
        let nx = bump(above, x - 1) + bump(center, x - 1) + bump(below, x - 1)
               - bump(above, x + 1) - bump(center, x + 1) - bump(below, x + 1);
        let ny = bump(below, x - 1) + bump(below, x) + bump(below, x + 1)
               - bump(above, x - 1) - bump(above, x) - bump(above, x + 1);

        let shade = light.shade(nx, ny);

        let idx = x * bpp;
        let out = &mut dst[idx..idx + bpp];
        match texture {
            Some(texture) => {
                for (c, t) in out[..colors].iter_mut().zip(&texture[idx..idx + colors]) {
                    *c = ((*t as i32 * shade) >> 8) as u8;
                }
            }
            None => {
                let v = core::cmp::min(shade, 255) as u8;
                for c in &mut out[..colors] {
                    *c = v;
                }
            }
        }

        if has_alpha {
            out[colors] = center[idx + colors];
        }
    }
}

/// Applies an emboss filter.
///
/// The working area is `region` grown by `params.depth` on every side
/// and clamped to the image. Each row of it is shaded using its neighbors,
/// the first and the last rows reuse themselves as the missing neighbor.
/// The first and the last columns of the area are not touched.
///
/// In [`EmbossMode::Emboss`] the colors are taken from the row above the output row
/// (the output row itself for the first one), while alpha comes from the output row.
///
/// `dest` usually holds a copy of `src`, so untouched pixels keep their values.
///
/// `progress` is called every `height / 20` rows and once at the end.
///
/// Returns the working area.
///
/// # Errors
///
/// `InvalidParameter` when:
///
/// - `params.depth` is zero
/// - `src` and `dest` have different sizes or channels count
/// - `region` doesn't fit the image
pub fn emboss(
    params: &Emboss,
    src: ImageRef,
    region: Region,
    mut dest: ImageRefMut,
    progress: &mut dyn FnMut(f64),
) -> Result<Region, Error> {
    if src.width() != dest.width() || src.height() != dest.height() {
        return Err(Error::InvalidParameter("source and destination must have the same size"));
    }

    if src.bpp() != dest.bpp() {
        return Err(Error::InvalidParameter("source and destination must have the same channels"));
    }

    if !region.fits(src.width(), src.height()) {
        return Err(Error::InvalidParameter("region is outside of the image"));
    }

    let light = LightModel::new(params.azimuth, params.elevation, params.depth)?;

    let area = region.grow(params.depth, src.width(), src.height());
    if area.is_empty() {
        return Ok(area);
    }

    let bpp = src.bpp();
    let has_alpha = src.has_alpha();
    let step = core::cmp::max(1, area.height() / 20);

    for y in area.y()..area.bottom() {
        let i = y - area.y();
        if i % step == 0 {
            progress(i as f64 / area.height() as f64);
        }

        let above = if y > area.y() { y - 1 } else { y };
        let below = if y + 1 < area.bottom() { y + 1 } else { y };

        let rows = [
            src.row(above, area.x(), area.width()),
            src.row(y,     area.x(), area.width()),
            src.row(below, area.x(), area.width()),
        ];

        let texture = match params.mode {
            EmbossMode::Bumpmap => None,
            EmbossMode::Emboss => Some(rows[0]),
        };

        let dst = dest.row_mut(y, area.x(), area.width());
        shade_row(&light, rows, texture, dst, bpp, has_alpha);
    }

    progress(1.0);

    Ok(area)
}


#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn flat_rows(value: u8, width: usize, bpp: usize) -> Vec<u8> {
        vec![value; width * bpp]
    }

    #[test]
    fn zero_depth() {
        assert_eq!(LightModel::new(30.0, 45.0, 0).unwrap_err(),
                   Error::InvalidParameter("depth must be at least 1"));
    }

    #[test]
    fn vertical_light() {
        for &azimuth in &[0.0, 30.0, 90.0, 211.0, 360.0] {
            let light = LightModel::new(azimuth, 90.0, 20).unwrap();
            assert!(approx_eq!(f64, light.lz(), 255.9, epsilon = 1e-6));
            assert!(approx_eq!(f64, light.lx(), 0.0, epsilon = 1e-6));
            assert!(approx_eq!(f64, light.ly(), 0.0, epsilon = 1e-6));
            assert!(approx_eq!(f64, light.background(), 255.9, epsilon = 1e-6));
        }
    }

    #[test]
    fn normal_scale_uses_integer_division() {
        assert_eq!(LightModel::new(0.0, 45.0, 20).unwrap().nz(), 76.0);
        assert_eq!(LightModel::new(0.0, 45.0, 1).unwrap().nz(), 1530.0);
    }

    #[test]
    fn flat_is_background() {
        for &azimuth in &[0.0, 45.0, 123.0, 300.0] {
            let light = LightModel::new(azimuth, 45.0, 20).unwrap();
            let expected = (light.background() + 0.5) as i32;
            assert_eq!(light.shade(0, 0), expected);

            let row = flat_rows(77, 5, 1);
            let mut dst = vec![0; 5];
            shade_row(&light, [&row, &row, &row], None, &mut dst, 1, false);
            assert_eq!(dst, vec![0, expected as u8, expected as u8, expected as u8, 0]);
        }
    }

    #[test]
    fn facing_away_is_black() {
        // Light from +X, surface slopes away.
        let light = LightModel::new(0.0, 0.0, 1).unwrap();
        assert_eq!(light.shade(-1000, 0), 0);
    }

    #[test]
    fn gradient_sign() {
        // Bright on the left, dark on the right: Nx > 0 faces a light at azimuth 0.
        let light = LightModel::new(0.0, 30.0, 3).unwrap();
        let row = [200, 100, 0];
        let mut dst = [9, 9, 9];
        shade_row(&light, [&row, &row, &row], None, &mut dst, 1, false);

        let nx = 600.0;
        let nz = 510.0;
        let l = light;
        let expected = (nx * l.lx() + nz * l.lz()) / (nx * nx + nz * nz as f64).sqrt();
        assert_eq!(dst, [9, (expected + 0.5) as u8, 9]);
    }

    #[test]
    fn texture_and_alpha() {
        let light = LightModel::new(30.0, 90.0, 20).unwrap();
        // Gray + alpha, constant bump.
        let row = [50, 10, 50, 20, 50, 30];
        let texture = [0, 0, 128, 99, 0, 0];
        let mut dst = [1, 2, 3, 4, 5, 6];
        shade_row(&light, [&row, &row, &row], Some(&texture), &mut dst, 2, true);
        // shade = round(255.9) = 256, so the texture is kept as is.
        assert_eq!(dst, [1, 2, 128, 20, 5, 6]);

        let mut dst = [1, 2, 3, 4, 5, 6];
        shade_row(&light, [&row, &row, &row], None, &mut dst, 2, true);
        assert_eq!(dst, [1, 2, 255, 20, 5, 6]);
    }

    #[test]
    fn texture_is_the_row_above() {
        // RGB, flat bump in red, green grows by 40 per row.
        let mut src = Vec::new();
        for y in 0..4u8 {
            for _ in 0..5 {
                src.extend_from_slice(&[128, 40 * y, 0]);
            }
        }

        let mut out = src.clone();
        let src_ref = ImageRef::new(&src, 5, 4, 3).unwrap();
        emboss(
            &Emboss::default(),
            src_ref,
            src_ref.region(),
            ImageRefMut::new(&mut out, 5, 4, 3).unwrap(),
            &mut |_| {},
        ).unwrap();

        // shade = 181, (128 * 181) >> 8 = 90
        let green = |y: usize| out[(y * 5 + 2) * 3 + 1];
        assert_eq!(out[(1 * 5 + 2) * 3], 90);
        assert_eq!(green(0), 0);
        assert_eq!(green(1), 0);
        assert_eq!(green(2), 28);
        assert_eq!(green(3), 56);
    }

    #[test]
    fn narrow_rows_are_untouched() {
        let light = LightModel::new(30.0, 45.0, 20).unwrap();
        let row = [1, 2];
        let mut dst = [7, 7];
        shade_row(&light, [&row, &row, &row], None, &mut dst, 1, false);
        assert_eq!(dst, [7, 7]);
    }

    #[test]
    fn flat_image() {
        let src = vec![128; 4 * 4];
        let mut out = src.clone();
        let params = Emboss {
            azimuth: 30.0,
            elevation: 45.0,
            depth: 20,
            mode: EmbossMode::Bumpmap,
        };

        let src_ref = ImageRef::new(&src, 4, 4, 1).unwrap();
        let area = emboss(
            &params,
            src_ref,
            src_ref.region(),
            ImageRefMut::new(&mut out, 4, 4, 1).unwrap(),
            &mut |_| {},
        ).unwrap();
        assert_eq!(area, Region::new(0, 0, 4, 4));

        let bg = LightModel::new(30.0, 45.0, 20).unwrap().background().round() as u8;
        for y in 0..4 {
            for x in 0..4 {
                let expected = if x == 0 || x == 3 { 128 } else { bg };
                assert_eq!(out[y * 4 + x], expected);
            }
        }
    }

    #[test]
    fn grown_region() {
        let src = vec![10; 30 * 30];
        let mut out = vec![0; 30 * 30];
        let params = Emboss { depth: 2, ..Emboss::default() };
        let src_ref = ImageRef::new(&src, 30, 30, 1).unwrap();
        let mut steps = Vec::new();
        let area = emboss(
            &params,
            src_ref,
            Region::new(10, 10, 5, 5),
            ImageRefMut::new(&mut out, 30, 30, 1).unwrap(),
            &mut |p| steps.push(p),
        ).unwrap();

        assert_eq!(area, Region::new(8, 8, 9, 9));
        assert_eq!(out[8 * 30 + 7], 0);
        assert_eq!(out[8 * 30 + 8], 0);
        assert_ne!(out[8 * 30 + 9], 0);
        assert_eq!(out[17 * 30 + 9], 0);
        assert_eq!(steps.first(), Some(&0.0));
        assert_eq!(steps.last(), Some(&1.0));
    }

    #[test]
    fn first_and_last_rows_are_shaded() {
        // A horizontal edge at the top: the first row reuses itself above.
        let mut src = vec![0u8; 5 * 3];
        for x in 0..5 {
            src[x] = 255;
        }

        let mut out = src.clone();
        let params = Emboss {
            azimuth: 90.0,
            elevation: 45.0,
            depth: 1,
            mode: EmbossMode::Bumpmap,
        };

        let src_ref = ImageRef::new(&src, 5, 3, 1).unwrap();
        emboss(
            &params,
            src_ref,
            src_ref.region(),
            ImageRefMut::new(&mut out, 5, 3, 1).unwrap(),
            &mut |_| {},
        ).unwrap();

        let light = LightModel::new(90.0, 45.0, 1).unwrap();
        // Row 0: [r0, r0, r1] => Ny = 0 - 765.
        assert_eq!(out[1], light.shade(0, -765) as u8);
        // Row 1: [r0, r1, r2] => Ny = 0 - 765.
        assert_eq!(out[5 + 1], light.shade(0, -765) as u8);
        // Row 2: [r1, r2, r2] => flat.
        assert_eq!(out[10 + 1], light.shade(0, 0) as u8);
    }
}
