//! Header logo: PNG or JPEG
//!
//! Grey and RGB JPEGs are copied into the file unchanged (DCTDecode). Every
//! other image is decoded to 8-bit RGB samples, with its alpha channel kept
//! as a soft mask.

use std::io::Cursor;

use budgetdoc_core::RenderError;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, ImageReader};
use lopdf::{dictionary, Document, Object, Stream};

/// A decoded logo, ready to embed as an image XObject
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Logo {
    pub width: u32,
    pub height: u32,
    pixels: Pixels,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Pixels {
    /// Original JPEG file
    Jpeg {
        data: Vec<u8>,
        color_space: &'static str,
    },
    /// RGB samples, plus one alpha sample per pixel when the image has one
    Rgb { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

impl Logo {
    /// Decode a PNG or JPEG file's bytes
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RenderError> {
        let reader = ImageReader::new(Cursor::new(data.as_slice())).with_guessed_format()?;
        let format = reader.format();
        if !matches!(format, Some(ImageFormat::Png | ImageFormat::Jpeg)) {
            return Err(RenderError::InvalidData(
                "logo must be a PNG or JPEG image".into(),
            ));
        }

        let decoder = reader.into_decoder().map_err(unreadable)?;
        let original = decoder.original_color_type();
        let image = DynamicImage::from_decoder(decoder).map_err(unreadable)?;
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidData("logo has no pixels".into()));
        }

        let jpeg_space = match original {
            ExtendedColorType::L8 => Some("DeviceGray"),
            ExtendedColorType::Rgb8 => Some("DeviceRGB"),
            _ => None,
        };
        let pixels = match (format, jpeg_space) {
            (Some(ImageFormat::Jpeg), Some(color_space)) => Pixels::Jpeg { data, color_space },
            _ => Pixels::Rgb {
                rgb: image.to_rgb8().into_raw(),
                alpha: image
                    .color()
                    .has_alpha()
                    .then(|| image.to_rgba8().pixels().map(|p| p[3]).collect()),
            },
        };

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width over height
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Whether the file is embedded without re-encoding
    pub fn is_passthrough(&self) -> bool {
        matches!(self.pixels, Pixels::Jpeg { .. })
    }

    /// Add the image (and its soft mask, if any) to the document
    pub(crate) fn add_to(&self, doc: &mut Document) -> Object {
        let width = i64::from(self.width);
        let height = i64::from(self.height);

        let stream = match &self.pixels {
            Pixels::Jpeg { data, color_space } => {
                let mut stream = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => width,
                        "Height" => height,
                        "ColorSpace" => *color_space,
                        "BitsPerComponent" => 8i64,
                        "Filter" => "DCTDecode",
                    },
                    data.clone(),
                );
                stream.allows_compression = false;
                stream
            }
            Pixels::Rgb { rgb, alpha } => {
                let mut dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8i64,
                };
                if let Some(alpha) = alpha {
                    let mask = doc.add_object(Stream::new(
                        dictionary! {
                            "Type" => "XObject",
                            "Subtype" => "Image",
                            "Width" => width,
                            "Height" => height,
                            "ColorSpace" => "DeviceGray",
                            "BitsPerComponent" => 8i64,
                        },
                        alpha.clone(),
                    ));
                    dict.set("SMask", mask);
                }
                Stream::new(dict, rgb.clone())
            }
        };
        doc.add_object(stream).into()
    }
}

fn unreadable(err: image::ImageError) -> RenderError {
    RenderError::InvalidData(format!("unreadable logo: {err}"))
}
