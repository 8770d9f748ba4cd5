use crate::hash::TruncatedHash;

/// Validator position inside the trusted list.
///
/// `seeking`: still looking for the first of our blocks in the list.
/// Once one matches, every later query must be the next forward hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCursor {
    /// Next unexamined position in the cache.
    pub index: usize,
    /// True until the first match after a replace.
    pub seeking: bool,
}

impl Default for SyncCursor {
    fn default() -> Self {
        Self {
            index: 0,
            seeking: true,
        }
    }
}

impl SyncCursor {
    /// Back to `{0, seeking}`; called whenever the cache is replaced.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Two-phase match of `cmp` against `hashes`, starting at `index`.
    pub fn scan(&mut self, hashes: &[TruncatedHash], cmp: &TruncatedHash) -> bool {
        let mut i = self.index;
        while i < hashes.len() {
            if &hashes[i] == cmp {
                self.index = i + 1;
                self.seeking = false;
                return true;
            }
            if !self.seeking {
                // Aligned: the next expected entry disagreed.
                return false;
            }
            i += 1;
        }
        // Misses while seeking leave the cursor where it was.
        false
    }
}
