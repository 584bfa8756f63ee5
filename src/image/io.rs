//! I/O helpers for projection images and JSON documents.
//!
//! - `write_text_matrix`: the plain-text matrix artifact, one row per line.
//! - `save_png_preview`: min–max normalized 8-bit grayscale PNG.
//! - `load_atoms`: read an `AtomSet` JSON document.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ImageView, IntensityImage};
use crate::error::{ImageGenError, Result};
use crate::types::AtomSet;
use image::{GrayImage, Luma};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Format `v` in sign-always scientific notation with six fractional digits
/// and an exponent of at least two digits (`+1.234560e-03`).
pub fn format_scientific(v: f64) -> String {
    let sign = if v.is_sign_negative() { '-' } else { '+' };
    if v.is_nan() {
        return format!("{sign}nan");
    }
    if v.is_infinite() {
        return format!("{sign}inf");
    }
    let body = format!("{:.6e}", v.abs());
    let (mantissa, exp) = body.split_once('e').unwrap_or((body.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let exp_sign = if exp < 0 { '-' } else { '+' };
    format!("{sign}{mantissa}e{exp_sign}{:02}", exp.abs())
}

/// Write the matrix to any sink: each value followed by a space, then a
/// space between columns or a newline after the last column.
pub fn write_matrix<W: Write>(out: &mut W, image: &IntensityImage) -> std::io::Result<()> {
    for row in image.rows() {
        let last = row.len().saturating_sub(1);
        for (j, &v) in row.iter().enumerate() {
            let sep = if j == last { '\n' } else { ' ' };
            write!(out, "{} {sep}", format_scientific(v))?;
        }
    }
    Ok(())
}

/// Write the text matrix for image `index` to `path`, creating parent dirs.
pub fn write_text_matrix(index: usize, image: &IntensityImage, path: &Path) -> Result<()> {
    let io_err = |source| ImageGenError::Io {
        index,
        path: path.to_path_buf(),
        source,
    };
    ensure_parent_dir(path).map_err(io_err)?;
    let file = fs::File::create(path).map_err(io_err)?;
    let mut out = BufWriter::new(file);
    write_matrix(&mut out, image).map_err(io_err)?;
    out.flush().map_err(io_err)
}

/// Parse a text matrix back into an image. Accepts any whitespace layout as
/// long as every line holds the same number of values.
pub fn read_text_matrix(path: &Path) -> Result<IntensityImage> {
    let parse_err = |message: String| ImageGenError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let text = fs::read_to_string(path).map_err(|e| parse_err(e.to_string()))?;
    let mut data = Vec::new();
    let mut rows = 0usize;
    let mut cols = None;
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let before = data.len();
        for tok in line.split_whitespace() {
            let v: f64 = tok
                .parse()
                .map_err(|_| parse_err(format!("invalid value {tok:?} on row {rows}")))?;
            data.push(v);
        }
        let width = data.len() - before;
        if *cols.get_or_insert(width) != width {
            return Err(parse_err(format!("row {rows} has {width} columns")));
        }
        rows += 1;
    }
    IntensityImage::from_vec(rows, data)
        .ok_or_else(|| parse_err(format!("matrix with {rows} rows is not square")))
}

/// Save a min–max normalized grayscale PNG. Non-finite pixels map to black;
/// a constant image maps to black as well.
pub fn save_png_preview(index: usize, image: &IntensityImage, path: &Path) -> Result<()> {
    let io_err = |source| ImageGenError::Io {
        index,
        path: path.to_path_buf(),
        source,
    };
    ensure_parent_dir(path).map_err(io_err)?;
    let (lo, hi) = image
        .as_slice()
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = hi - lo;
    let mut out = GrayImage::new(image.width() as u32, image.height() as u32);
    for (y, row) in image.rows().enumerate() {
        for (x, &v) in row.iter().enumerate() {
            let level = if v.is_finite() && span > 0.0 {
                ((v - lo) / span * 255.0).clamp(0.0, 255.0)
            } else {
                0.0
            };
            out.put_pixel(x as u32, y as u32, Luma([level as u8]));
        }
    }
    out.save(path).map_err(|e| io_err(std::io::Error::other(e)))
}

/// Load an atom set from its JSON document.
pub fn load_atoms(path: &Path) -> Result<AtomSet> {
    let parse_err = |message: String| ImageGenError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let data = fs::read_to_string(path).map_err(|e| parse_err(e.to_string()))?;
    serde_json::from_str(&data).map_err(|e| parse_err(e.to_string()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> std::result::Result<(), String> {
    ensure_parent_dir(path)
        .map_err(|e| format!("Failed to create parent of {}: {e}", path.display()))?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scientific_format_matches_showpos_layout() {
        assert_eq!(format_scientific(0.00123456), "+1.234560e-03");
        assert_eq!(format_scientific(-42.0), "-4.200000e+01");
        assert_eq!(format_scientific(0.0), "+0.000000e+00");
        assert_eq!(format_scientific(1.5e-120), "+1.500000e-120");
        assert_eq!(format_scientific(f64::NAN), "+nan");
        assert_eq!(format_scientific(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn matrix_rows_end_with_space_newline() {
        let img = IntensityImage::from_vec(2, vec![1.0, -2.0, 0.5, 0.0]).unwrap();
        let mut buf = Vec::new();
        write_matrix(&mut buf, &img).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "+1.000000e+00  -2.000000e+00 \n+5.000000e-01  +0.000000e+00 \n"
        );
    }

    #[test]
    fn text_matrix_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("img_3.txt");
        let img = IntensityImage::from_vec(3, (0..9).map(|i| i as f64 * 0.25 - 1.0).collect())
            .unwrap();
        write_text_matrix(3, &img, &path).unwrap();
        let back = read_text_matrix(&path).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn write_failure_names_the_image_index() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should go makes `File::create` fail.
        let path = dir.path().join("img_7.txt");
        fs::create_dir_all(&path).unwrap();
        let err = write_text_matrix(7, &IntensityImage::new(2), &path).unwrap_err();
        match err {
            ImageGenError::Io { index, .. } => assert_eq!(index, 7),
            other => panic!("unexpected error: {other}"),
        }
    }
}
