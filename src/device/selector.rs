use crate::error::precondition;
use crate::{EnvironmentMap, HaarLayout, ImportancePolicy, MeanResponse, Result, CHANNELS};

/// One lighting term: the basis index and the environment's weight on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficient {
    pub index: usize,
    pub value: f32,
}

/// Lighting coefficients of each channel, most important first.
pub type RankedCoefficients = [Vec<Coefficient>; CHANNELS];

impl ImportancePolicy {
    /// Importance of a coefficient under this policy, larger is better.
    pub fn importance(self, coefficient: Coefficient, mean_response: &[f32]) -> f32 {
        match self {
            // signed on purpose: large negative terms rank last
            Self::Naive => coefficient.value,
            Self::Weighted => coefficient.value * mean_response[coefficient.index],
        }
    }

    /// Stable sort by decreasing importance.
    pub fn sort(self, coefficients: &mut [Coefficient], mean_response: &[f32]) {
        coefficients.sort_by(|a, b| {
            let a = self.importance(*a, mean_response);
            let b = self.importance(*b, mean_response);
            b.total_cmp(&a)
        });
    }
}

/// Projects the environment onto the transport basis and ranks every term.
///
/// With a wavelet `layout` each channel of the environment is transformed
/// exactly like the transport vectors were, so that index `i` refers to the
/// same basis function on both sides. Lists are returned untruncated.
pub fn rank(
    environment: &EnvironmentMap,
    mean_response: &MeanResponse,
    policy: ImportancePolicy,
    layout: Option<HaarLayout>,
) -> Result<RankedCoefficients> {
    if mean_response.basis_count() != environment.len() {
        return precondition(format!(
            "environment has {} texels but the scene has {} basis terms",
            environment.len(),
            mean_response.basis_count()
        ));
    }

    let rank_channel = |channel: usize| -> Result<Vec<Coefficient>> {
        let mut field = environment.channel(channel).to_vec();

        if let Some(layout) = layout {
            layout.forward(&mut field)?;
        }

        let mut coefficients: Vec<Coefficient> = field
            .into_iter()
            .enumerate()
            .map(|(index, value)| Coefficient { index, value })
            .collect();

        policy.sort(&mut coefficients, mean_response.channel(channel));

        Ok(coefficients)
    };

    Ok([rank_channel(0)?, rank_channel(1)?, rank_channel(2)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn uniform(values: &[f32]) -> [Vec<f32>; CHANNELS] {
        [values.to_vec(), values.to_vec(), values.to_vec()]
    }

    #[test]
    fn naive_policy_ranks_by_signed_value() {
        let environment = EnvironmentMap::new(2, 1, uniform(&[0.5, -3.0, 1.0, 0.25])).unwrap();
        let mean = MeanResponse::from_channels(uniform(&[1.0; 4])).unwrap();

        let ranked = rank(&environment, &mean, ImportancePolicy::Naive, None).unwrap();
        let order: Vec<usize> = ranked[0].iter().map(|c| c.index).collect();

        assert_eq!(order, vec![2, 0, 3, 1]);
    }

    #[test]
    fn weighted_policy_uses_mean_response() {
        let environment = EnvironmentMap::new(2, 1, uniform(&[1.0, 0.5, 0.25, 2.0])).unwrap();
        let mean = MeanResponse::from_channels(uniform(&[0.1, 1.0, 4.0, 0.0])).unwrap();

        let ranked = rank(&environment, &mean, ImportancePolicy::Weighted, None).unwrap();
        let order: Vec<usize> = ranked[1].iter().map(|c| c.index).collect();

        assert_eq!(order, vec![2, 1, 0, 3]);
        assert_eq!(ranked[1][0].value, 0.25);
    }

    #[test]
    fn haar_layout_ranks_wavelet_coefficients() {
        let environment =
            EnvironmentMap::new(2, 1, uniform(&[0.875, 0.125, 0.625, 0.375])).unwrap();
        let mean = MeanResponse::from_channels(uniform(&[1.0; 4])).unwrap();

        let ranked = rank(
            &environment,
            &mean,
            ImportancePolicy::Naive,
            Some(HaarLayout::Square(2)),
        )
        .unwrap();

        let order: Vec<usize> = ranked[2].iter().map(|c| c.index).collect();
        assert_eq!(&order[..3], &[0, 1, 3]);
        assert!((ranked[2][0].value - 1.0).abs() < 1e-5);
        assert!((ranked[2][1].value - 0.5).abs() < 1e-5);
    }

    #[test]
    fn ranked_lists_are_monotonic() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut random = |len: usize| -> Vec<f32> {
            (0..len).map(|_| rng.gen_range(-1.0, 1.0)).collect()
        };

        let environment =
            EnvironmentMap::new(4, 4, [random(64), random(64), random(64)]).unwrap();
        let mean = MeanResponse::from_channels([random(64), random(64), random(64)]).unwrap();

        for &policy in &[ImportancePolicy::Naive, ImportancePolicy::Weighted] {
            let ranked = rank(&environment, &mean, policy, HaarLayout::for_len(64).ok()).unwrap();

            for (channel, list) in ranked.iter().enumerate() {
                assert_eq!(list.len(), 64);

                let importance: Vec<f32> = list
                    .iter()
                    .map(|&c| policy.importance(c, mean.channel(channel)))
                    .collect();

                assert!(importance.windows(2).all(|w| w[0] >= w[1]));

                let mut indices: Vec<usize> = list.iter().map(|c| c.index).collect();
                indices.sort_unstable();
                assert!(indices.into_iter().eq(0..64));
            }
        }
    }

    #[test]
    fn rejects_mismatched_mean_response() {
        let environment = EnvironmentMap::new(2, 1, uniform(&[0.0; 4])).unwrap();
        let mean = MeanResponse::from_channels(uniform(&[0.0; 8])).unwrap();

        assert!(rank(&environment, &mean, ImportancePolicy::Naive, None).is_err());
    }
}
