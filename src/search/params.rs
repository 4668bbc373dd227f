/// Search feature switches and margins. Every field maps 1:1 to a UCI
/// option; the front end mutates a copy and hands it to each search.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    pub use_lmr: bool,
    pub use_null_move: bool,
    pub use_futility: bool,
    pub use_rfp: bool,
    pub use_delta_pruning: bool,
    pub use_aspiration: bool,

    /// Moves searched at full depth before reductions kick in.
    pub lmr_full_depth_moves: i32,
    /// Minimum remaining depth for any reduction.
    pub lmr_reduction_limit: i32,
    pub null_move_reduction: i32,
    pub null_move_min_depth: i32,
    /// Futility margins by remaining depth 1 / 2 / 3.
    pub futility_margin: i32,
    pub futility_margin_d2: i32,
    pub futility_margin_d3: i32,
    pub rfp_margin: i32,
    pub rfp_max_depth: i32,
    pub delta_margin: i32,
    pub aspiration_window: i32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            use_lmr: true,
            use_null_move: true,
            use_futility: true,
            use_rfp: true,
            use_delta_pruning: true,
            use_aspiration: true,

            lmr_full_depth_moves: 4,
            lmr_reduction_limit: 3,
            null_move_reduction: 2,
            null_move_min_depth: 3,
            futility_margin: 150,
            futility_margin_d2: 300,
            futility_margin_d3: 500,
            rfp_margin: 100,
            rfp_max_depth: 6,
            delta_margin: 200,
            aspiration_window: 50,
        }
    }
}

impl SearchParams {
    #[inline]
    pub fn futility_margin_for(&self, depth: i32) -> i32 {
        match depth {
            ..=1 => self.futility_margin,
            2 => self.futility_margin_d2,
            _ => self.futility_margin_d3,
        }
    }
}
