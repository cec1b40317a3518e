use rand::Rng;

/// Continuous box-shaped space with per-component bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpace {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

impl BoxSpace {
    pub fn uniform(dim: usize, low: f32, high: f32) -> Self {
        Self {
            low: vec![low; dim],
            high: vec![high; dim],
        }
    }

    pub fn unbounded(dim: usize) -> Self {
        Self::uniform(dim, f32::NEG_INFINITY, f32::INFINITY)
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn contains(&self, values: &[f32]) -> bool {
        values.len() == self.dim()
            && values
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(v, (lo, hi))| *v >= *lo && *v <= *hi)
    }

    /// Uniform sample. Unbounded components fall back to a standard range of [-1, 1].
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f32> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(&lo, &hi)| {
                let lo = if lo.is_finite() { lo } else { -1.0 };
                let hi = if hi.is_finite() { hi } else { 1.0 };
                if hi > lo {
                    rng.gen_range(lo..=hi)
                } else {
                    lo
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn samples_stay_inside_bounds() {
        let space = BoxSpace::uniform(2, -1.0, 1.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let s = space.sample(&mut rng);
            assert!(space.contains(&s), "{s:?}");
        }
    }

    #[test]
    fn contains_checks_dimension_and_bounds() {
        let space = BoxSpace::uniform(2, -1.0, 1.0);
        assert!(space.contains(&[1.0, -1.0]));
        assert!(!space.contains(&[1.5, 0.0]));
        assert!(!space.contains(&[0.0]));
        assert!(BoxSpace::unbounded(3).contains(&[1e9, -1e9, 0.0]));
    }
}
