// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::Path;

use log::warn;
use pixfilters::{ImageRef, ImageRefMut};

use crate::Error;

#[derive(Clone, Copy, PartialEq, Debug)]
enum ImageFormat {
    PNG,
    JPEG,
}

/// An owned raster image.
///
/// Interleaved 8-bit channels, 1 to 4 per pixel, alpha last.
#[derive(Clone, PartialEq, Debug)]
pub struct Image {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: usize,
}

impl Image {
    /// Creates a new image from raw pixels.
    ///
    /// # Errors
    ///
    /// Fails when `data` doesn't match the provided size and channels count.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: usize) -> Result<Self, Error> {
        ImageRef::new(&data, width, height, channels)?;
        Ok(Image { data, width, height, channels })
    }

    /// Creates an image filled with a single pixel value.
    ///
    /// `pixel.len()` defines the channels count.
    pub fn filled(width: u32, height: u32, pixel: &[u8]) -> Result<Self, Error> {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * pixel.len());
        for _ in 0..count {
            data.extend_from_slice(pixel);
        }

        Image::new(data, width, height, pixel.len())
    }

    /// Loads a PNG or JPEG image from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let data = std::fs::read(path)?;
        Image::from_data(&data)
    }

    /// Decodes a PNG or JPEG image.
    ///
    /// The format is detected by the file signature.
    pub fn from_data(data: &[u8]) -> Result<Self, Error> {
        match get_image_data_format(data) {
            Some(ImageFormat::PNG) => read_png(data),
            Some(ImageFormat::JPEG) => read_jpeg(data),
            None => Err(Error::UnknownImageFormat),
        }
    }

    /// Returns the image width.
    ///
    /// Never zero.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height.
    ///
    /// Never zero.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of channels per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the image content as `u8` slice.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the underlying data.
    pub fn take(self) -> Vec<u8> {
        self.data
    }

    /// Returns a pixel at the specified position.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let idx = (y as usize * self.width as usize + x as usize) * self.channels;
        self.data.get(idx..idx + self.channels)
    }

    /// Borrows the image for filtering.
    pub fn as_image_ref(&self) -> Result<ImageRef, Error> {
        Ok(ImageRef::new(&self.data, self.width, self.height, self.channels)?)
    }

    pub(crate) fn as_image_ref_mut(&mut self) -> Result<ImageRefMut, Error> {
        Ok(ImageRefMut::new(&mut self.data, self.width, self.height, self.channels)?)
    }

    /// Encodes the image as PNG, keeping its channels layout.
    pub fn encode_png(&self) -> Result<Vec<u8>, Error> {
        let mut data = Vec::new();
        self.write_png(&mut data)?;
        Ok(data)
    }

    /// Saves the image as PNG at a provided path.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = std::fs::File::create(path)?;
        let w = std::io::BufWriter::new(file);
        self.write_png(w)
    }

    fn write_png<W: std::io::Write>(&self, w: W) -> Result<(), Error> {
        let color = match self.channels {
            1 => png::ColorType::Grayscale,
            2 => png::ColorType::GrayscaleAlpha,
            3 => png::ColorType::Rgb,
            _ => png::ColorType::Rgba,
        };

        let mut encoder = png::Encoder::new(w, self.width, self.height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.data)?;
        Ok(())
    }
}

fn get_image_data_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageFormat::PNG)
    } else if data.starts_with(&[0xff, 0xd8, 0xff]) {
        Some(ImageFormat::JPEG)
    } else {
        None
    }
}

fn read_png(data: &[u8]) -> Result<Image, Error> {
    let mut decoder = png::Decoder::new(data);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let mut img_data = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut img_data)?;
    img_data.truncate(info.buffer_size());

    let channels = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        png::ColorType::Indexed => {
            warn!("Indexed PNG was not expanded.");
            return Err(Error::UnsupportedPixelFormat);
        }
    };

    Image::new(img_data, info.width, info.height, channels)
}

#[cfg(feature = "raster-images")]
fn read_jpeg(data: &[u8]) -> Result<Image, Error> {
    let mut decoder = jpeg_decoder::Decoder::new(data);
    let img_data = decoder.decode()?;
    let info = decoder.info().ok_or(Error::UnsupportedPixelFormat)?;

    let channels = match info.pixel_format {
        jpeg_decoder::PixelFormat::L8 => 1,
        jpeg_decoder::PixelFormat::RGB24 => 3,
        _ => {
            warn!("{:?} JPEG is not supported.", info.pixel_format);
            return Err(Error::UnsupportedPixelFormat);
        }
    };

    Image::new(img_data, info.width as u32, info.height as u32, channels)
}

#[cfg(not(feature = "raster-images"))]
fn read_jpeg(_: &[u8]) -> Result<Image, Error> {
    warn!("JPEG support is disabled. Enable the raster-images feature.");
    Err(Error::UnknownImageFormat)
}
