use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Running sum and count of generated values.
///
/// Written only through [`InputTally::record`], which may be called from any
/// task. Reads are exact once the writing task has been joined.
#[derive(Debug, Default)]
pub struct InputTally {
    sum: AtomicI64,
    count: AtomicU64,
}

impl InputTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, value: i64) {
        self.sum.fetch_add(value, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sum(&self) -> i64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn counts_items_not_values() {
        let tally = InputTally::new();
        for v in [5, 7, 11] {
            tally.record(v);
        }
        assert_eq!(tally.sum(), 23);
        assert_eq!(tally.count(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_records_are_not_lost() {
        let tally = Arc::new(InputTally::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let tally = Arc::clone(&tally);
            handles.push(tokio::spawn(async move {
                for v in 1..=1000 {
                    tally.record(v);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(tally.count(), 8000);
        assert_eq!(tally.sum(), 8 * 500_500);
    }
}
