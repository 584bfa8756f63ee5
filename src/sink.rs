//! Destinations for finished images.
use crate::error::Result;
use crate::image::io::{save_png_preview, write_text_matrix};
use crate::types::{Image, ManifestEntry};

/// Receives each image exactly once, after rasterization has finished.
pub trait ImageSink {
    fn write(&mut self, image: &Image) -> Result<()>;
}

/// Writes the text matrix (and optionally a PNG preview) next to `image.fname`
/// and records a manifest entry per image.
#[derive(Debug, Default)]
pub struct FileSink {
    png_preview: bool,
    entries: Vec<ManifestEntry>,
}

impl FileSink {
    pub fn new(png_preview: bool) -> Self {
        Self {
            png_preview,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }
}

impl ImageSink for FileSink {
    fn write(&mut self, image: &Image) -> Result<()> {
        write_text_matrix(image.index, &image.intensity, &image.fname)?;
        if self.png_preview {
            let png = image.fname.with_extension("png");
            save_png_preview(image.index, &image.intensity, &png)?;
        }
        self.entries.push(ManifestEntry::from_image(image));
        Ok(())
    }
}

/// Keeps every image in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub images: Vec<Image>,
}

impl ImageSink for MemorySink {
    fn write(&mut self, image: &Image) -> Result<()> {
        self.images.push(image.clone());
        Ok(())
    }
}
