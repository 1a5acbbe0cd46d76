/// Tunables resolved once in `main`, before attach.
///
/// These are not exposed as CLI flags: the four-positional-argument
/// contract is fixed, so `Config` only carries implementation defaults
/// that a future version could expose without changing that contract.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Page-sized chunk the streaming matcher reads per iteration.
    pub page_size: usize,
    /// Longest stdin line `filter`/`write` will attempt to parse as an
    /// address before treating it as malformed.
    pub max_candidate_line: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 4096,
            max_candidate_line: 64,
        }
    }
}
