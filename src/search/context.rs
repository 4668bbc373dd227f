use crate::board::{Board, Color};
use crate::moves::types::Move;
use crate::nnue::{NnueNetwork, NnueStack};

pub const MAX_PLY: usize = 128;

const HISTORY_MAX: i32 = 16_384;

/// Per-search mutable state: quiet-move ordering heuristics, the selective
/// depth high-water mark, and the NNUE accumulator stack when a network is
/// loaded.
pub struct SearchContext<'a> {
    /// Two killer slots per ply, newest first.
    pub killers: Vec<[Option<Move>; 2]>,
    /// Gravity history, indexed [side to move][from][to].
    pub history: [[[i32; 64]; 64]; 2],
    pub seldepth: usize,
    pub nnue: Option<NnueStack<'a>>,
}

impl<'a> SearchContext<'a> {
    pub fn new(net: Option<&'a NnueNetwork>, board: &Board) -> Self {
        Self {
            killers: vec![[None; 2]; MAX_PLY],
            history: [[[0; 64]; 64]; 2],
            seldepth: 0,
            nnue: net.map(|n| NnueStack::new(n, board)),
        }
    }

    pub fn update_killer(&mut self, ply: usize, mv: Move) {
        if self.killers[ply][0] != Some(mv) {
            self.killers[ply][1] = self.killers[ply][0];
            self.killers[ply][0] = Some(mv);
        }
    }

    #[inline]
    pub fn history_score(&self, stm: Color, mv: Move) -> i32 {
        self.history[stm as usize][mv.from().index() as usize][mv.to().index() as usize]
    }

    /// Gravity update: the closer the entry sits to its bound, the smaller
    /// the step, so values stay inside [-HISTORY_MAX, HISTORY_MAX].
    fn history_update(&mut self, stm: Color, mv: Move, bonus: i32) {
        let entry = &mut self.history[stm as usize][mv.from().index() as usize]
            [mv.to().index() as usize];
        *entry += bonus - *entry * bonus.abs() / HISTORY_MAX;
    }

    pub fn history_bonus(&mut self, stm: Color, mv: Move, depth: i32) {
        self.history_update(stm, mv, (depth * depth).min(HISTORY_MAX));
    }

    pub fn history_penalty(&mut self, stm: Color, mv: Move, depth: i32) {
        self.history_update(stm, mv, -(depth * depth).min(HISTORY_MAX));
    }
}
