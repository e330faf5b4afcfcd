//! Per-pass bookkeeping metrics.

/// Counts and timing collected during one [`StarPass`](crate::pass::StarPass) call.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassMetrics {
    /// Stars in the population after the pass.
    pub stars: usize,
    /// Of those, stars mirrored on another process.
    pub ghosts: usize,
    /// Stars created from newly materialized particles.
    pub embedded: usize,
    /// Merges performed.
    pub merges: usize,
    /// Mirror copies overwritten.
    pub synced: usize,
    /// Radiation sources linked.
    pub sources_emitted: usize,
    /// Radiating stars left out of the source list.
    pub sources_skipped: usize,
    /// Wall-clock time for the whole pass.
    pub total_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = PassMetrics::default();
        assert_eq!(m.stars, 0);
        assert_eq!(m.ghosts, 0);
        assert_eq!(m.merges, 0);
        assert_eq!(m.synced, 0);
        assert_eq!(m.sources_emitted, 0);
        assert_eq!(m.total_us, 0);
    }
}
