//! Background color estimation for a single image.
//!
//! Boundary pixels are sampled from an RGB-normalized copy of the image, the
//! alpha check looks at the image as decoded, and the average color is an
//! exact mean over every pixel.

use anyhow::{Context, Result};
use image::{io::Reader as ImageReader, DynamicImage, GenericImageView, Rgb, RgbImage};
use std::fmt;
use std::io::Write;
use std::path::Path;

/// One boundary pixel read from the normalized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSample {
    /// 1-based position in the sample order
    pub label: usize,
    pub x: u32,
    pub y: u32,
    pub color: Rgb<u8>,
}

/// Whether the decoded image carries an alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transparency {
    Absent,
    /// `corner_alpha` is the top-left pixel's alpha in 8-bit range.
    Present { corner_alpha: u8 },
}

/// Per-channel floor mean over all pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AverageColor(pub [u8; 3]);

impl fmt::Display for AverageColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "({r}, {g}, {b})")
    }
}

/// Everything `check-bg-color` reports about an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<PixelSample>,
    pub transparency: Transparency,
    pub average: AverageColor,
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Image size: {} x {}", self.width, self.height)?;
        writeln!(f, "Sample colors:")?;
        for sample in &self.samples {
            let [r, g, b] = sample.color.0;
            writeln!(f, "  Point {}: ({r}, {g}, {b})", sample.label)?;
        }

        match self.transparency {
            Transparency::Present { corner_alpha } => {
                writeln!(f, "\nImage has an alpha channel")?;
                writeln!(f, "Top-left alpha: {corner_alpha}")?;
            }
            Transparency::Absent => writeln!(f, "\nImage has no alpha channel")?,
        }

        writeln!(f, "\nAverage color: {}", self.average)
    }
}

/// Load `path`, print the report to `out` and return the average color.
pub fn inspect<W: Write>(path: &Path, out: &mut W) -> Result<AverageColor> {
    let img = load_image(path)?;
    let inspection = analyze(&img).with_context(|| format!("Can't inspect {}", path.display()))?;

    write!(out, "{inspection}")?;
    Ok(inspection.average)
}

fn load_image(path: &Path) -> Result<DynamicImage> {
    let img = ImageReader::open(path)
        .with_context(|| format!("Can't open image {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("Can't read image {}", path.display()))?
        .decode()
        .with_context(|| format!("Can't decode image {}", path.display()))?;

    tracing::debug!(path = %path.display(), color = ?img.color(), "decoded image");
    Ok(img)
}

/// Sample, check alpha and average an already decoded image.
pub fn analyze(img: &DynamicImage) -> Result<Inspection> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        anyhow::bail!("Image has no pixels ({width}x{height})");
    }

    let rgb = img.to_rgb8();

    let samples = sample_points(width, height)
        .into_iter()
        .enumerate()
        .map(|(i, (x, y))| PixelSample {
            label: i + 1,
            x,
            y,
            color: *rgb.get_pixel(x, y),
        })
        .collect();

    let transparency = if img.color().has_alpha() {
        Transparency::Present {
            corner_alpha: img.get_pixel(0, 0)[3],
        }
    } else {
        Transparency::Absent
    };

    Ok(Inspection {
        width,
        height,
        samples,
        transparency,
        average: average_color(&rgb),
    })
}

/// Corners first, then the left, right, top and bottom edge midpoints.
fn sample_points(width: u32, height: u32) -> [(u32, u32); 8] {
    let (right, bottom) = (width - 1, height - 1);
    let (mid_x, mid_y) = (width / 2, height / 2);
    [
        (0, 0),
        (0, bottom),
        (right, 0),
        (right, bottom),
        (0, mid_y),
        (right, mid_y),
        (mid_x, 0),
        (mid_x, bottom),
    ]
}

fn average_color(rgb: &RgbImage) -> AverageColor {
    let mut sums = [0u128; 3];
    for pixel in rgb.pixels() {
        for (sum, &channel) in sums.iter_mut().zip(pixel.0.iter()) {
            *sum += u128::from(channel);
        }
    }

    let count = u128::from(rgb.width()) * u128::from(rgb.height());
    AverageColor(sums.map(|sum| (sum / count) as u8))
}
