use ahash::AHashMap;

/// Map raw district labels to dense ids `0..k`. Labels are ordered numerically when
/// every label parses as an integer, lexicographically otherwise.
pub(crate) fn dense_labels(raw: &[String]) -> (Vec<u32>, Vec<String>) {
    let mut labels = raw.to_vec();
    labels.sort_unstable();
    labels.dedup();

    let numeric = labels.iter().map(|label| label.trim().parse::<i64>()).collect::<Result<Vec<_>, _>>();
    if let Ok(values) = numeric {
        let mut paired = values.into_iter().zip(labels).collect::<Vec<_>>();
        paired.sort_unstable_by_key(|&(value, _)| value);
        labels = paired.into_iter().map(|(_, label)| label).collect();
    }

    let index = labels.iter().enumerate()
        .map(|(i, label)| (label.as_str(), i as u32))
        .collect::<AHashMap<_, _>>();
    let ids = raw.iter().map(|label| index[label.as_str()]).collect();

    (ids, labels)
}
