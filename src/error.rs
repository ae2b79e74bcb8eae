// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// List of all errors.
#[derive(Debug)]
pub enum Error {
    /// A filter rejected its input.
    Filter(pixfilters::Error),

    /// A displacement map has a different size than the image.
    MapSizeMismatch {
        /// The image size.
        expected: (u32, u32),
        /// The map size.
        actual: (u32, u32),
    },

    /// The file is neither PNG nor JPEG.
    UnknownImageFormat,

    /// The file uses a pixel format we cannot represent.
    ///
    /// For example, CMYK JPEG.
    UnsupportedPixelFormat,

    /// Failed to read or write a file.
    Io(std::io::Error),

    /// Failed to decode a PNG image.
    PngDecoding(png::DecodingError),

    /// Failed to encode a PNG image.
    PngEncoding(png::EncodingError),

    /// Failed to decode a JPEG image.
    #[cfg(feature = "raster-images")]
    JpegDecoding(jpeg_decoder::Error),
}

impl From<pixfilters::Error> for Error {
    fn from(e: pixfilters::Error) -> Self {
        Error::Filter(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<png::DecodingError> for Error {
    fn from(e: png::DecodingError) -> Self {
        Error::PngDecoding(e)
    }
}

impl From<png::EncodingError> for Error {
    fn from(e: png::EncodingError) -> Self {
        Error::PngEncoding(e)
    }
}

#[cfg(feature = "raster-images")]
impl From<jpeg_decoder::Error> for Error {
    fn from(e: jpeg_decoder::Error) -> Self {
        Error::JpegDecoding(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Filter(ref e) => {
                write!(f, "filtering failed cause {}", e)
            }
            Error::MapSizeMismatch { expected, actual } => {
                write!(f, "displacement map is {}x{}, but the image is {}x{}",
                       actual.0, actual.1, expected.0, expected.1)
            }
            Error::UnknownImageFormat => {
                write!(f, "unknown image format")
            }
            Error::UnsupportedPixelFormat => {
                write!(f, "unsupported pixel format")
            }
            Error::Io(ref e) => {
                write!(f, "{}", e)
            }
            Error::PngDecoding(ref e) => {
                write!(f, "PNG decoding failed cause {}", e)
            }
            Error::PngEncoding(ref e) => {
                write!(f, "PNG encoding failed cause {}", e)
            }
            #[cfg(feature = "raster-images")]
            Error::JpegDecoding(ref e) => {
                write!(f, "JPEG decoding failed cause {}", e)
            }
        }
    }
}

impl std::error::Error for Error {}
