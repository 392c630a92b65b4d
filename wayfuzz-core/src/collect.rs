use std::collections::HashSet;

/// Owns the result set. Only the collecting task ever touches it.
#[derive(Debug, Default)]
pub struct Collector {
    seen: HashSet<String>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every non-blank item of a batch. Duplicates are no-ops.
    /// Returns how many items were new.
    pub fn absorb<I, S>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for item in batch {
            let cleaned = item.as_ref().trim();
            if cleaned.is_empty() {
                continue;
            }
            if !self.seen.contains(cleaned) {
                self.seen.insert(cleaned.to_string());
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Distinct entries in byte-wise ascending order.
    pub fn into_sorted(self) -> Vec<String> {
        let mut entries: Vec<String> = self.seen.into_iter().collect();
        entries.sort_unstable();
        entries
    }
}
