use em_image_gen::AtomSet;
use nalgebra::Vector3;

/// Alpha-helix-like coil: `count` atoms, 3.6 per turn, 1.5 Å rise, radius
/// 2.3 Å, centered on the origin.
pub fn helix(count: usize) -> AtomSet {
    assert!(count > 0, "helix needs at least one atom");
    let rise = 1.5;
    let z0 = -0.5 * rise * (count - 1) as f64;
    let positions = (0..count)
        .map(|i| {
            let t = i as f64 * 2.0 * std::f64::consts::PI / 3.6;
            Vector3::new(2.3 * t.cos(), 2.3 * t.sin(), z0 + rise * i as f64)
        })
        .collect();
    let names = (0..count).map(|i| format!("CA{i}")).collect();
    AtomSet::new(positions, names).expect("matching lengths")
}

/// Deterministic pseudo-random cloud inside a cube of half-edge `half`.
pub fn cloud(count: usize, half: f64, seed: u64) -> AtomSet {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 * half - half
    };
    let positions = (0..count)
        .map(|_| Vector3::new(next(), next(), next()))
        .collect();
    AtomSet::from_positions(positions)
}

/// Largest relative deviation between two buffers, measured against the
/// per-pixel magnitude plus a floor tied to the peak.
pub fn max_rel_diff(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    let peak = b.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let floor = peak * 1e-12;
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs() / (y.abs() + floor).max(f64::MIN_POSITIVE))
        .fold(0.0, f64::max)
}
