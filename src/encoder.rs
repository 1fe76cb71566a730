//! Discretization of boolean feature readings into dense state indices.
//!
//! Bit `i` of a state index holds feature `i` of the configured order, so the
//! mapping is a fixed bijection between `k`-tuples of booleans and `[0, 2^k)`.

use crate::{
    Result,
    error::Error,
    types::{Feature, Perception},
};

/// Maps a fixed, ordered tuple of boolean features to a state index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEncoder {
    features: Vec<Feature>,
}

impl StateEncoder {
    /// Create an encoder for the given feature order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the list is empty or names a
    /// feature twice.
    pub fn new(features: Vec<Feature>) -> Result<Self> {
        if features.is_empty() {
            return Err(Error::config("state encoder needs at least one feature"));
        }
        for (i, feature) in features.iter().enumerate() {
            if features[..i].contains(feature) {
                return Err(Error::config(format!("feature '{feature}' declared twice")));
            }
        }
        Ok(Self { features })
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Number of features `k`.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Size of the state space, `2^k`.
    pub fn state_count(&self) -> usize {
        1 << self.features.len()
    }

    /// Encode readings given in the configured feature order.
    pub fn encode(&self, readings: &[bool]) -> Result<usize> {
        if readings.len() != self.features.len() {
            return Err(Error::FeatureCount {
                expected: self.features.len(),
                got: readings.len(),
            });
        }
        Ok(readings
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .fold(0, |state, (bit, _)| state | (1 << bit)))
    }

    /// Encode a perception by reading its fields in the configured order.
    pub fn encode_perception(&self, perception: &Perception) -> usize {
        self.features
            .iter()
            .enumerate()
            .filter(|(_, feature)| perception.get(**feature))
            .fold(0, |state, (bit, _)| state | (1 << bit))
    }

    /// Recover the readings that produced `state`.
    pub fn decode(&self, state: usize) -> Result<Vec<bool>> {
        if state >= self.state_count() {
            return Err(Error::StateOutOfRange {
                state,
                state_count: self.state_count(),
            });
        }
        Ok((0..self.features.len())
            .map(|bit| state & (1 << bit) != 0)
            .collect())
    }

    /// Human-readable description of a state, e.g. `target-visible,!holds-resource`.
    pub fn describe(&self, state: usize) -> Result<String> {
        let readings = self.decode(state)?;
        let parts: Vec<String> = self
            .features
            .iter()
            .zip(readings)
            .map(|(feature, set)| {
                if set {
                    feature.label().to_string()
                } else {
                    format!("!{}", feature.label())
                }
            })
            .collect();
        Ok(parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> StateEncoder {
        StateEncoder::new(vec![Feature::TargetVisible, Feature::HoldsResource]).unwrap()
    }

    #[test]
    fn test_encode_matches_bit_order() {
        let encoder = basic();
        assert_eq!(encoder.encode(&[false, false]).unwrap(), 0);
        assert_eq!(encoder.encode(&[true, false]).unwrap(), 1);
        assert_eq!(encoder.encode(&[false, true]).unwrap(), 2);
        assert_eq!(encoder.encode(&[true, true]).unwrap(), 3);
    }

    #[test]
    fn test_encode_is_bijective() {
        let encoder = StateEncoder::new(Feature::ALL.to_vec()).unwrap();
        let mut seen = vec![false; encoder.state_count()];
        for state in 0..encoder.state_count() {
            let readings = encoder.decode(state).unwrap();
            let encoded = encoder.encode(&readings).unwrap();
            assert_eq!(encoded, state);
            assert!(!seen[encoded]);
            seen[encoded] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let encoder = basic();
        assert!(matches!(
            encoder.encode(&[true, false, true]),
            Err(Error::FeatureCount {
                expected: 2,
                got: 3
            })
        ));
    }

    #[test]
    fn test_perception_follows_declared_order() {
        let encoder = StateEncoder::new(vec![
            Feature::MessagePending,
            Feature::TargetVisible,
        ])
        .unwrap();
        let perception = Perception {
            target_visible: true,
            holds_resource: true,
            message_pending: false,
        };
        assert_eq!(encoder.encode_perception(&perception), 2);
    }

    #[test]
    fn test_duplicate_and_empty_features_rejected() {
        assert!(StateEncoder::new(vec![]).is_err());
        assert!(
            StateEncoder::new(vec![Feature::HoldsResource, Feature::HoldsResource]).is_err()
        );
    }

    #[test]
    fn test_decode_out_of_range() {
        assert!(matches!(
            basic().decode(4),
            Err(Error::StateOutOfRange { state: 4, .. })
        ));
        assert_eq!(basic().describe(2).unwrap(), "!target-visible,holds-resource");
    }
}
