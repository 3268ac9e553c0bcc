/// Split an ordered collection into `buckets` ordered buckets, round robin.
///
/// Item `i` lands in bucket `i % buckets`, keeping its relative order inside
/// that bucket. Buckets may be empty when there are fewer items than buckets.
/// Zero buckets yields an empty partition.
pub fn partition_round_robin<T>(items: Vec<T>, buckets: usize) -> Vec<Vec<T>> {
    if buckets == 0 {
        return Vec::new();
    }

    let per_bucket = items.len().div_ceil(buckets);
    let mut split: Vec<Vec<T>> = (0..buckets)
        .map(|_| Vec::with_capacity(per_bucket))
        .collect();
    for (index, item) in items.into_iter().enumerate() {
        split[index % buckets].push(item);
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_assignment() {
        let buckets = partition_round_robin((0..10).collect(), 3);
        assert_eq!(
            buckets,
            vec![vec![0, 3, 6, 9], vec![1, 4, 7], vec![2, 5, 8]]
        );
    }

    #[test]
    fn test_every_item_lands_once_at_index_mod_n() {
        for n in 1..=7 {
            let items: Vec<usize> = (0..23).collect();
            let buckets = partition_round_robin(items.clone(), n);
            assert_eq!(buckets.len(), n);

            for (bucket_id, bucket) in buckets.iter().enumerate() {
                for (pos, item) in bucket.iter().enumerate() {
                    assert_eq!(item % n, bucket_id);
                    assert_eq!(*item, bucket_id + pos * n);
                }
            }

            // Inverse of the round robin rebuilds the original sequence
            let rebuilt: Vec<usize> = (0..items.len())
                .map(|i| buckets[i % n][i / n])
                .collect();
            assert_eq!(rebuilt, items);
            assert_eq!(buckets.iter().map(Vec::len).sum::<usize>(), items.len());
        }
    }

    #[test]
    fn test_more_buckets_than_items() {
        let buckets = partition_round_robin(vec!["a", "b"], 4);
        assert_eq!(buckets, vec![vec!["a"], vec!["b"], vec![], vec![]]);
    }

    #[test]
    fn test_zero_buckets() {
        assert!(partition_round_robin(vec![1, 2, 3], 0).is_empty());
    }
}
