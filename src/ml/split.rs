use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so each class keeps its share in both partitions.
///
/// Each class contributes `round(n_class * test_fraction)` rows to `test`,
/// but never all of its rows; a class with one row stays in `train`. Both
/// partitions come back in ascending row order.
pub fn stratified_split(
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit, String> {
    if !(0.0..1.0).contains(&test_fraction) {
        return Err(format!("Invalid test fraction {test_fraction}"));
    }
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(idx);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();
    for (_class, mut rows) in by_class {
        rows.shuffle(&mut rng);
        let n = rows.len();
        let mut test_n = ((n as f64) * test_fraction).round() as usize;
        if test_n >= n {
            test_n = n.saturating_sub(1);
        }
        test.extend_from_slice(&rows[..test_n]);
        train.extend_from_slice(&rows[test_n..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok(TrainTestSplit { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_class_proportions() {
        let labels: Vec<usize> = (0..1000).map(|i| usize::from(i % 4 == 0)).collect();
        let split = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 200);
        assert_eq!(split.train.len(), 800);
        let test_pos = split.test.iter().filter(|&&i| labels[i] == 1).count();
        assert_eq!(test_pos, 50);
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let labels: Vec<usize> = (0..97).map(|i| usize::from(i % 3 == 0)).collect();
        let split = stratified_split(&labels, 0.2, 7).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..97).collect::<Vec<_>>());
    }

    #[test]
    fn deterministic_for_seed() {
        let labels: Vec<usize> = (0..50).map(|i| i % 2).collect();
        assert_eq!(
            stratified_split(&labels, 0.2, 1).unwrap(),
            stratified_split(&labels, 0.2, 1).unwrap()
        );
        assert_ne!(
            stratified_split(&labels, 0.2, 1).unwrap(),
            stratified_split(&labels, 0.2, 2).unwrap()
        );
    }

    #[test]
    fn singleton_class_stays_in_train() {
        let split = stratified_split(&[0, 0, 0, 0, 0, 1], 0.2, 3).unwrap();
        assert!(split.train.contains(&5));
        assert_eq!(split.test.len(), 1);
    }

    #[test]
    fn rejects_invalid_fraction() {
        assert!(stratified_split(&[0, 1], 1.0, 0).is_err());
        assert!(stratified_split(&[0, 1], -0.1, 0).is_err());
    }
}
