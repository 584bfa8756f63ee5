mod common;

use common::synthetic_atoms::{cloud, helix};
use em_image_gen::{rotate, AtomSet, OrientationSampler};

fn pairwise(atoms: &AtomSet) -> Vec<f64> {
    let p = atoms.positions();
    let mut d = Vec::with_capacity(p.len() * p.len() / 2);
    for i in 0..p.len() {
        for j in i + 1..p.len() {
            d.push((p[i] - p[j]).norm());
        }
    }
    d
}

#[test]
fn sampled_rotations_preserve_pairwise_distances() {
    let atoms = cloud(60, 25.0, 11);
    let before = pairwise(&atoms);
    let mut sampler = OrientationSampler::new(Some(17));
    for q in sampler.generate(50) {
        let rotated = rotate(&q, &atoms).expect("unit quaternion");
        let after = pairwise(&rotated);
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() <= 1e-9 * a.max(1.0), "{a} vs {b} for q={q:?}");
        }
    }
}

#[test]
fn rotation_keeps_labels_and_input_untouched() {
    let atoms = helix(12);
    let snapshot = atoms.clone();
    let q = OrientationSampler::new(Some(4)).sample();
    let rotated = rotate(&q, &atoms).unwrap();
    assert_eq!(atoms, snapshot);
    assert_eq!(rotated.names(), atoms.names());
    assert_ne!(rotated.positions(), atoms.positions());
}

#[test]
fn opposite_quaternions_give_the_same_rotation() {
    let atoms = helix(8);
    let q = OrientationSampler::new(Some(8)).sample();
    let a = rotate(&q, &atoms).unwrap();
    let b = rotate(&(-q), &atoms).unwrap();
    for (pa, pb) in a.positions().iter().zip(b.positions()) {
        assert!((pa - pb).norm() < 1e-12);
    }
}
