//! Firefly point cloud.
//!
//! The field is generated once and never mutated; a new scatter means a new
//! `ParticleField`. Positions cover a square footprint of side 4 centred on
//! the origin and a height band of [0, 1.5).

use rand::Rng;

pub const DEFAULT_FIREFLY_COUNT: usize = 30;

const FOOTPRINT: f32 = 4.0;
const HEIGHT: f32 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    positions: Vec<f32>,
    scales: Vec<f32>,
}

impl ParticleField {
    /// Scatter `count` points using the thread-local RNG. Every call yields a
    /// different field.
    pub fn generate(count: usize) -> Self {
        Self::generate_with(count, &mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let mut positions = Vec::with_capacity(count * 3);
        let mut scales = Vec::with_capacity(count);

        for _ in 0..count {
            positions.push((rng.gen::<f32>() - 0.5) * FOOTPRINT);
            positions.push(rng.gen::<f32>() * HEIGHT);
            positions.push((rng.gen::<f32>() - 0.5) * FOOTPRINT);
            scales.push(rng.gen::<f32>());
        }

        Self { positions, scales }
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    /// Flat `[x, y, z, x, y, z, ...]` buffer, the `position` attribute.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// One scale per point, the `aScale` attribute.
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    pub fn point(&self, index: usize) -> Option<([f32; 3], f32)> {
        let scale = *self.scales.get(index)?;
        let base = index * 3;
        Some((
            [
                self.positions[base],
                self.positions[base + 1],
                self.positions[base + 2],
            ],
            scale,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{ParticleField, DEFAULT_FIREFLY_COUNT};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_in_bounds(field: &ParticleField) {
        for index in 0..field.len() {
            let ([x, y, z], scale) = field.point(index).unwrap();
            assert!((-2.0..2.0).contains(&x), "x out of range: {x}");
            assert!((0.0..1.5).contains(&y), "y out of range: {y}");
            assert!((-2.0..2.0).contains(&z), "z out of range: {z}");
            assert!((0.0..1.0).contains(&scale), "scale out of range: {scale}");
        }
    }

    #[test]
    fn buffer_lengths_match_count() {
        for count in [0, 1, DEFAULT_FIREFLY_COUNT, 1000] {
            let field = ParticleField::generate(count);
            assert_eq!(field.positions().len(), count * 3);
            assert_eq!(field.scales().len(), count);
            assert_eq!(field.len(), count);
        }
    }

    #[test]
    fn samples_stay_inside_the_footprint() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let field = ParticleField::generate_with(500, &mut rng);
            assert_in_bounds(&field);
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = ParticleField::generate_with(DEFAULT_FIREFLY_COUNT, &mut StdRng::seed_from_u64(42));
        let b = ParticleField::generate_with(DEFAULT_FIREFLY_COUNT, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn unseeded_fields_differ_between_calls() {
        let a = ParticleField::generate(DEFAULT_FIREFLY_COUNT);
        let b = ParticleField::generate(DEFAULT_FIREFLY_COUNT);
        assert_ne!(a.positions(), b.positions());
    }

    #[test]
    fn empty_field_has_no_points() {
        let field = ParticleField::generate(0);
        assert!(field.is_empty());
        assert!(field.point(0).is_none());
    }
}
