//! Seeded stratified train/test split.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::error::DatasetError;

/// Row indices on each side of a split, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split rows so each label keeps its proportion on both sides.
///
/// Per label, `round(n * test_fraction)` rows go to the test side, kept in
/// `1..n` when the label has at least two rows. The same seed always yields
/// the same split.
pub fn stratified_split(
    labels: &[u8],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitIndices, DatasetError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DatasetError::InvalidSplit(format!(
            "test fraction {test_fraction} is not in (0, 1)"
        )));
    }
    let mut by_label: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        by_label.entry(label).or_default().push(idx);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();
    for (_label, mut indices) in by_label {
        indices.shuffle(&mut rng);
        let n = indices.len();
        let mut test_n = ((n as f64) * test_fraction).round() as usize;
        if n >= 2 {
            test_n = test_n.clamp(1, n - 1);
        } else {
            test_n = 0;
        }
        test.extend_from_slice(&indices[..test_n]);
        train.extend_from_slice(&indices[test_n..]);
    }
    if train.is_empty() || test.is_empty() {
        return Err(DatasetError::InvalidSplit(format!(
            "{} rows cannot fill both train and test sides",
            labels.len()
        )));
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<u8> {
        (0..100).map(|i| if i % 4 == 0 { 1 } else { 0 }).collect()
    }

    #[test]
    fn keeps_class_proportions() {
        let labels = labels();
        let split = stratified_split(&labels, 0.3, 42).unwrap();
        assert_eq!(split.train.len() + split.test.len(), 100);
        let test_pos = split.test.iter().filter(|&&i| labels[i] == 1).count();
        let test_neg = split.test.len() - test_pos;
        assert_eq!(test_pos, 8);
        assert_eq!(test_neg, 23);
    }

    #[test]
    fn sides_are_disjoint_and_reproducible() {
        let labels = labels();
        let a = stratified_split(&labels, 0.3, 7).unwrap();
        let b = stratified_split(&labels, 0.3, 7).unwrap();
        assert_eq!(a, b);
        assert!(a.test.iter().all(|idx| !a.train.contains(idx)));
        let c = stratified_split(&labels, 0.3, 8).unwrap();
        assert_ne!(a.test, c.test);
    }

    #[test]
    fn rejects_degenerate_inputs() {
        assert!(stratified_split(&[0, 1], 0.0, 1).is_err());
        assert!(stratified_split(&[0, 1], 1.0, 1).is_err());
        assert!(stratified_split(&[1], 0.3, 1).is_err());
        assert!(stratified_split(&[], 0.3, 1).is_err());
    }
}
