//! Token samplers for autoregressive decoding

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks the next token from a vocabulary distribution.
pub trait Sampler {
    fn sample(&mut self, probs: &[f32]) -> u32;
}

/// Most probable token; ties go to the lowest id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgmaxSampler;

impl Sampler for ArgmaxSampler {
    fn sample(&mut self, probs: &[f32]) -> u32 {
        let mut best = 0;
        for (i, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = i;
            }
        }
        best as u32
    }
}

/// Draws from `p^(1/temperature)`, renormalised, with a seeded generator.
pub struct TemperatureSampler {
    temperature: f32,
    rng: StdRng,
}

impl TemperatureSampler {
    pub fn new(temperature: f32, seed: u64) -> Self {
        Self { temperature, rng: StdRng::seed_from_u64(seed) }
    }
}

impl Sampler for TemperatureSampler {
    fn sample(&mut self, probs: &[f32]) -> u32 {
        let weights: Vec<f32> = probs
            .iter()
            .map(|&p| p.max(0.0).powf(1.0 / self.temperature))
            .collect();
        let total: f32 = weights.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return ArgmaxSampler.sample(probs);
        }

        let mut remaining = self.rng.random::<f32>() * total;
        for (i, &w) in weights.iter().enumerate() {
            if remaining < w {
                return i as u32;
            }
            remaining -= w;
        }
        // rounding left a sliver past the last bucket
        weights.iter().rposition(|&w| w > 0.0).unwrap_or(0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_highest_and_lowest_on_tie() {
        assert_eq!(ArgmaxSampler.sample(&[0.1, 0.7, 0.2]), 1);
        assert_eq!(ArgmaxSampler.sample(&[0.4, 0.4, 0.2]), 0);
    }

    #[test]
    fn test_temperature_sampler_is_reproducible() {
        let probs = [0.1, 0.2, 0.3, 0.4];
        let mut a = TemperatureSampler::new(1.0, 9);
        let mut b = TemperatureSampler::new(1.0, 9);
        let xs: Vec<u32> = (0..20).map(|_| a.sample(&probs)).collect();
        let ys: Vec<u32> = (0..20).map(|_| b.sample(&probs)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_temperature_sampler_never_picks_zero_mass() {
        let mut s = TemperatureSampler::new(0.7, 1);
        for _ in 0..200 {
            assert_ne!(s.sample(&[0.5, 0.0, 0.5]), 1);
        }
    }

    #[test]
    fn test_low_temperature_approaches_argmax() {
        let mut s = TemperatureSampler::new(0.01, 3);
        for _ in 0..50 {
            assert_eq!(s.sample(&[0.2, 0.5, 0.3]), 1);
        }
    }
}
