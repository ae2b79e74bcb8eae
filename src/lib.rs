// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`rasterfx` applies displacement and emboss filters to raster images.

It owns the images, validates the maps and the selection, runs the
[`pixfilters`] kernels and merges the results back.
Only the selected pixels are changed, everything else is preserved.

```no_run
let mut img = rasterfx::Image::from_file("in.png").unwrap();
rasterfx::emboss(&mut img, &rasterfx::EmbossOptions::default()).unwrap();
img.save_png("out.png").unwrap();
```
*/

#![doc(html_root_url = "https://docs.rs/rasterfx/0.1.0")]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use log::{debug, warn};

pub use pixfilters::{Displacement, EdgeMode, Emboss, EmbossMode, LightModel, Region};

mod error;
mod image;
mod options;

pub use crate::error::Error;
pub use crate::image::Image;
pub use crate::options::{DisplaceOptions, EmbossOptions};


/// Displaces `image` pixels using the provided maps.
///
/// A map is required only for an enabled axis.
/// Maps must have the same size as `image`, but can have any channels count.
///
/// Pixels outside of `opt.region` are left untouched.
pub fn displace(
    image: &mut Image,
    x_map: Option<&Image>,
    y_map: Option<&Image>,
    opt: &DisplaceOptions,
) -> Result<(), Error> {
    let params = &opt.displacement;

    let x_map = if params.enable_x { x_map } else { None };
    let y_map = if params.enable_y { y_map } else { None };
    for map in x_map.iter().chain(y_map.iter()) {
        check_map_size(image, map)?;
    }

    if !params.enable_x && !params.enable_y {
        warn!("Both displacement axes are disabled. Nothing to do.");
        return Ok(());
    }

    let region = opt.region.unwrap_or_else(|| Region::new(0, 0, image.width(), image.height()));
    debug!("Displacing {:?} by {}x{} with {:?} edges.",
           region, params.amount_x, params.amount_y, params.edge_mode);

    let x_map = match x_map {
        Some(map) => Some(map.as_image_ref()?),
        None => None,
    };

    let y_map = match y_map {
        Some(map) => Some(map.as_image_ref()?),
        None => None,
    };

    // The kernel reads from an unmodified copy and writes into `image`,
    // so unselected pixels are kept as is.
    let src = image.clone();
    let src = src.as_image_ref()?;
    let dest = image.as_image_ref_mut()?;

    pixfilters::displace(params, src, x_map, y_map, region, dest, &mut log_progress)?;

    Ok(())
}

/// Embosses `image`.
///
/// Returns the actually changed area, which is `opt.region`
/// grown by the emboss depth.
pub fn emboss(
    image: &mut Image,
    opt: &EmbossOptions,
) -> Result<Region, Error> {
    let params = &opt.emboss;

    let region = opt.region.unwrap_or_else(|| Region::new(0, 0, image.width(), image.height()));
    debug!("Embossing {:?} with light at {}/{} degrees and depth {}.",
           region, params.azimuth, params.elevation, params.depth);

    let src = image.clone();
    let src = src.as_image_ref()?;
    let dest = image.as_image_ref_mut()?;

    let area = pixfilters::emboss(params, src, region, dest, &mut log_progress)?;
    debug!("Embossed {:?} in {:?} mode.", area, params.mode);

    if area.width() < 3 {
        warn!("The emboss area is narrower than 3 pixels. Nothing has changed.");
    }

    Ok(area)
}

fn check_map_size(image: &Image, map: &Image) -> Result<(), Error> {
    if map.width() != image.width() || map.height() != image.height() {
        return Err(Error::MapSizeMismatch {
            expected: (image.width(), image.height()),
            actual: (map.width(), map.height()),
        });
    }

    Ok(())
}

fn log_progress(done: f64) {
    debug!("Progress: {:.0}%", done * 100.0);
}
