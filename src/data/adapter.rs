//! Start/stop framing of raw sequences into (input, target) pairs

use super::SequenceGroup;
use crate::error::{Error, Result};

/// Id written into padded positions.
pub const PAD_TOKEN: u32 = 0;

/// Row-major `[batch, time_steps]` inputs and targets with effective lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBatch {
    pub inputs: Vec<u32>,
    pub targets: Vec<u32>,
    pub lengths: Vec<usize>,
    pub time_steps: usize,
}

impl TokenBatch {
    pub fn batch_size(&self) -> usize {
        self.lengths.len()
    }

    /// Stack batches sharing `time_steps`.
    pub fn concat(batches: &[TokenBatch]) -> Result<TokenBatch> {
        let time_steps = batches.first().map_or(0, |b| b.time_steps);
        let mut out = TokenBatch {
            inputs: Vec::new(),
            targets: Vec::new(),
            lengths: Vec::new(),
            time_steps,
        };
        for batch in batches {
            if batch.time_steps != time_steps {
                return Err(Error::shape(
                    "batch concatenation",
                    vec![time_steps],
                    vec![batch.time_steps],
                ));
            }
            out.inputs.extend_from_slice(&batch.inputs);
            out.targets.extend_from_slice(&batch.targets);
            out.lengths.extend_from_slice(&batch.lengths);
        }
        Ok(out)
    }

    /// Row `b` of the inputs.
    pub fn input_row(&self, b: usize) -> &[u32] {
        &self.inputs[b * self.time_steps..(b + 1) * self.time_steps]
    }

    /// Row `b` of the targets.
    pub fn target_row(&self, b: usize) -> &[u32] {
        &self.targets[b * self.time_steps..(b + 1) * self.time_steps]
    }
}

/// Frame every sequence of `groups` as
/// input `[start, s_0 .. s_{L-1}, pad ..]` and target `[s_0 .. s_{L-1}, stop, pad ..]`.
///
/// The effective length is `L + 1` and must fit in `time_steps`.
pub fn convert_tokens_to_input_and_target(
    groups: &[SequenceGroup],
    start: u32,
    stop: u32,
    time_steps: usize,
) -> Result<TokenBatch> {
    let mut batch = TokenBatch {
        inputs: Vec::new(),
        targets: Vec::new(),
        lengths: Vec::new(),
        time_steps,
    };

    let mut index = 0;
    for group in groups {
        if group.sequences.len() != group.lengths.len() {
            return Err(Error::shape(
                "sequence group lengths",
                vec![group.sequences.len()],
                vec![group.lengths.len()],
            ));
        }
        for (sequence, &length) in group.sequences.iter().zip(&group.lengths) {
            if length > sequence.len() {
                return Err(Error::InvalidLength { index, length, max: sequence.len() });
            }
            if length + 1 > time_steps {
                return Err(Error::InvalidLength { index, length: length + 1, max: time_steps });
            }

            let mut input = vec![PAD_TOKEN; time_steps];
            let mut target = vec![PAD_TOKEN; time_steps];
            input[0] = start;
            input[1..=length].copy_from_slice(&sequence[..length]);
            target[..length].copy_from_slice(&sequence[..length]);
            target[length] = stop;

            batch.inputs.extend(input);
            batch.targets.extend(target);
            batch.lengths.push(length + 1);
            index += 1;
        }
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_with_start_and_stop() {
        let group = SequenceGroup { sequences: vec![vec![5, 6, 9]], lengths: vec![2] };
        let batch = convert_tokens_to_input_and_target(&[group], 1, 2, 5).unwrap();

        assert_eq!(batch.inputs, vec![1, 5, 6, 0, 0]);
        assert_eq!(batch.targets, vec![5, 6, 2, 0, 0]);
        assert_eq!(batch.lengths, vec![3]);
    }

    #[test]
    fn test_groups_are_flattened_in_order() {
        let a = SequenceGroup::from_sequences(vec![vec![3]]);
        let b = SequenceGroup::from_sequences(vec![vec![4, 4], vec![7]]);
        let batch = convert_tokens_to_input_and_target(&[a, b], 1, 2, 4).unwrap();

        assert_eq!(batch.batch_size(), 3);
        assert_eq!(batch.input_row(1), &[1, 4, 4, 0]);
        assert_eq!(batch.target_row(2), &[7, 2, 0, 0]);
        assert_eq!(batch.lengths, vec![2, 3, 2]);
    }

    #[test]
    fn test_sequence_that_fills_window_is_rejected() {
        let group = SequenceGroup::from_sequences(vec![vec![3, 3, 3]]);
        let err = convert_tokens_to_input_and_target(&[group], 1, 2, 3).unwrap_err();
        assert!(matches!(err, Error::InvalidLength { length: 4, max: 3, .. }));
    }

    #[test]
    fn test_length_beyond_row_is_rejected() {
        let group = SequenceGroup { sequences: vec![vec![3]], lengths: vec![2] };
        assert!(convert_tokens_to_input_and_target(&[group], 1, 2, 8).is_err());
    }

    #[test]
    fn test_concat_requires_same_window() {
        let a = SequenceGroup::from_sequences(vec![vec![3]]);
        let x = convert_tokens_to_input_and_target(&[a.clone()], 1, 2, 4).unwrap();
        let y = convert_tokens_to_input_and_target(&[a.clone()], 1, 2, 4).unwrap();
        let joined = TokenBatch::concat(&[x.clone(), y]).unwrap();
        assert_eq!(joined.batch_size(), 2);
        assert_eq!(joined.inputs.len(), 8);

        let z = convert_tokens_to_input_and_target(&[a], 1, 2, 5).unwrap();
        assert!(TokenBatch::concat(&[x, z]).is_err());
    }
}
