use crate::error::{ImageGenError, Result};
use crate::image::IntensityImage;
use nalgebra::{Quaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ordered atom positions with their parallel name labels.
///
/// The set is immutable once built; rotating it yields a new set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AtomSetDoc", into = "AtomSetDoc")]
pub struct AtomSet {
    positions: Vec<Vector3<f64>>,
    names: Vec<String>,
}

impl AtomSet {
    /// Build a set from parallel position/name sequences of equal length.
    pub fn new(positions: Vec<Vector3<f64>>, names: Vec<String>) -> Result<Self> {
        if positions.len() != names.len() {
            return Err(ImageGenError::config(format!(
                "atom set has {} positions but {} names",
                positions.len(),
                names.len()
            )));
        }
        Ok(Self { positions, names })
    }

    /// Convenience constructor labelling every atom `CA`.
    pub fn from_positions(positions: Vec<Vector3<f64>>) -> Self {
        let names = vec!["CA".to_string(); positions.len()];
        Self { positions, names }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Produce a new set with each position mapped through `f`, keeping labels.
    pub(crate) fn map_positions<F>(&self, f: F) -> Self
    where
        F: FnMut(&Vector3<f64>) -> Vector3<f64>,
    {
        Self {
            positions: self.positions.iter().map(f).collect(),
            names: self.names.clone(),
        }
    }
}

/// On-disk layout: `{ "names": [...], "positions": [[x, y, z], ...] }`.
#[derive(Serialize, Deserialize)]
struct AtomSetDoc {
    #[serde(default)]
    names: Option<Vec<String>>,
    positions: Vec<[f64; 3]>,
}

impl TryFrom<AtomSetDoc> for AtomSet {
    type Error = ImageGenError;

    fn try_from(doc: AtomSetDoc) -> Result<Self> {
        let positions: Vec<Vector3<f64>> =
            doc.positions.iter().map(|p| Vector3::from(*p)).collect();
        match doc.names {
            Some(names) => AtomSet::new(positions, names),
            None => Ok(AtomSet::from_positions(positions)),
        }
    }
}

impl From<AtomSet> for AtomSetDoc {
    fn from(set: AtomSet) -> Self {
        AtomSetDoc {
            names: Some(set.names),
            positions: set.positions.iter().map(|p| [p.x, p.y, p.z]).collect(),
        }
    }
}

/// One synthesized view: intensities, the orientation that produced them and
/// where the artifact goes.
#[derive(Clone, Debug)]
pub struct Image {
    /// Global image index across all workers.
    pub index: usize,
    /// Output file for the text matrix.
    pub fname: PathBuf,
    /// Orientation used for this view (identity when rotation is disabled).
    pub quat: Quaternion<f64>,
    pub intensity: IntensityImage,
}

/// Entry of the JSON run manifest.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub index: usize,
    pub path: PathBuf,
    /// Quaternion as `[w, x, y, z]`.
    pub quaternion: [f64; 4],
}

impl ManifestEntry {
    pub fn from_image(img: &Image) -> Self {
        Self {
            index: img.index,
            path: img.fname.clone(),
            quaternion: [img.quat.w, img.quat.i, img.quat.j, img.quat.k],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_names_are_rejected() {
        let err = AtomSet::new(vec![Vector3::zeros(); 3], vec!["C".into(); 2]).unwrap_err();
        assert!(
            matches!(err, ImageGenError::Configuration(_)),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn json_document_without_names_defaults_labels() {
        let set: AtomSet =
            serde_json::from_str(r#"{ "positions": [[1.0, 2.0, 3.0], [0.0, 0.0, -1.5]] }"#)
                .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.names(), &["CA".to_string(), "CA".to_string()]);
        assert_eq!(set.positions()[1], Vector3::new(0.0, 0.0, -1.5));
    }

    #[test]
    fn json_document_with_short_name_list_fails() {
        let res: std::result::Result<AtomSet, _> = serde_json::from_str(
            r#"{ "names": ["N"], "positions": [[1.0, 2.0, 3.0], [0.0, 0.0, 0.0]] }"#,
        );
        assert!(res.is_err());
    }
}
