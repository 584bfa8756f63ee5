//! Rigid rotation of atom sets by a quaternion sandwich `q · v · q⁻¹`.
use crate::error::{ImageGenError, Result};
use crate::types::AtomSet;
use nalgebra::Quaternion;

/// Allowed deviation of `|q|` from one before a rotation is refused.
pub const UNIT_NORM_TOL: f64 = 1e-6;

/// Rotate every position of `atoms`, returning a new set with the same labels.
///
/// Fails with [`ImageGenError::NonUnitQuaternion`] instead of renormalizing
/// when `q` is not unit length.
pub fn rotate(q: &Quaternion<f64>, atoms: &AtomSet) -> Result<AtomSet> {
    let norm = q.norm();
    if !((norm - 1.0).abs() <= UNIT_NORM_TOL) {
        return Err(ImageGenError::NonUnitQuaternion { norm });
    }
    let q = *q;
    let q_inv = q.conjugate() / q.norm_squared();
    Ok(atoms.map_positions(|p| (q * Quaternion::from_imag(*p) * q_inv).imag()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{UnitQuaternion, Vector3};

    #[test]
    fn identity_keeps_positions() {
        let atoms = AtomSet::from_positions(vec![Vector3::new(1.0, -2.0, 3.5)]);
        let out = rotate(&Quaternion::identity(), &atoms).unwrap();
        assert_eq!(out, atoms);
    }

    #[test]
    fn quarter_turn_about_z() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let atoms = AtomSet::from_positions(vec![Vector3::new(1.0, 0.0, 0.0)]);
        let out = rotate(q.quaternion(), &atoms).unwrap();
        let p = out.positions()[0];
        assert!((p - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12, "p={p:?}");
    }

    #[test]
    fn agrees_with_rotation_matrix() {
        let q = UnitQuaternion::from_euler_angles(0.3, -1.1, 2.4);
        let v = Vector3::new(0.7, -3.2, 1.9);
        let out = rotate(q.quaternion(), &AtomSet::from_positions(vec![v])).unwrap();
        let expected = q.to_rotation_matrix() * v;
        assert!((out.positions()[0] - expected).norm() < 1e-12);
    }

    #[test]
    fn non_unit_quaternion_is_refused() {
        let q = Quaternion::new(1.0, 1.0, 0.0, 0.0);
        let atoms = AtomSet::from_positions(vec![Vector3::zeros()]);
        match rotate(&q, &atoms) {
            Err(ImageGenError::NonUnitQuaternion { norm }) => {
                assert!((norm - 2f64.sqrt()).abs() < 1e-12)
            }
            other => panic!("expected NonUnitQuaternion, got {other:?}"),
        }
    }
}
