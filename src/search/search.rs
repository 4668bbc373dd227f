use crate::board::Board;
use crate::moves::execute::{make_move, make_null_move, undo_move, undo_null_move};
use crate::moves::magic::MagicTables;
use crate::moves::movegen::{generate_pseudo_legal, generate_pseudo_legal_captures};
use crate::moves::square_control::in_check;
use crate::moves::types::{Move, MoveList};
use crate::nnue::NnueNetwork;
use crate::search::context::{MAX_PLY, SearchContext};
use crate::search::eval::static_eval;
use crate::search::limits::{MAX_SEARCH_DEPTH, SearchClock, SearchLimits};
use crate::search::ordering::{order_moves, order_qsearch_moves};
use crate::search::params::SearchParams;
use crate::search::tt::{
    Bound, MATE_SCORE, MATE_THRESHOLD, TranspositionTable, score_from_tt, score_to_tt,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub const INF: i32 = 32_000;
pub const DRAW_SCORE: i32 = 0;

/// Result of one `search` call. `best_move` is None only when the position
/// has no legal move at all.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: i32,
    pub seldepth: usize,
    pub nodes: u64,
    pub time_ms: u64,
    pub pv: Vec<Move>,
}

#[inline]
fn near_mate_window(alpha: i32, beta: i32) -> bool {
    alpha.abs() >= MATE_THRESHOLD || beta.abs() >= MATE_THRESHOLD
}

fn format_score(score: i32) -> String {
    if score.abs() >= MATE_THRESHOLD {
        let moves = (MATE_SCORE - score.abs() + 1) / 2;
        if score > 0 {
            format!("mate {}", moves)
        } else {
            format!("mate -{}", moves)
        }
    } else {
        format!("cp {}", score)
    }
}

/// Iterative deepening driver. Each completed iteration reports a UCI info
/// line and replaces the previous best move; an aborted iteration's partial
/// result is discarded.
pub fn search(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    params: &SearchParams,
    net: Option<&NnueNetwork>,
    limits: SearchLimits,
    stop: Arc<AtomicBool>,
) -> SearchReport {
    tt.new_search();
    let mut ctx = SearchContext::new(net, board);
    let mut clock = SearchClock::new(limits, stop);

    // The search must return a move whenever one exists, even if the very
    // first iteration is cut short.
    let mut root_moves = Vec::with_capacity(64);
    let mut scratch = Vec::with_capacity(256);
    crate::moves::execute::generate_legal(board, tables, &mut root_moves, &mut scratch);
    if root_moves.is_empty() {
        return SearchReport {
            best_move: None,
            score: 0,
            depth: 0,
            seldepth: 0,
            nodes: 0,
            time_ms: 0,
            pv: Vec::new(),
        };
    }

    let mut best_move = root_moves[0];
    let mut best_score = 0;
    let mut best_pv = vec![best_move];
    let mut completed_depth = 0;
    let mut last_iter_ms = 0u64;
    let max_depth = limits.depth.clamp(1, MAX_SEARCH_DEPTH);

    for depth in 1..=max_depth {
        if depth > 1 && !clock.should_start_iteration(last_iter_ms) {
            break;
        }
        let iter_start_ms = clock.elapsed_ms();

        let mut alpha = -INF;
        let mut beta = INF;
        if params.use_aspiration && depth >= 5 {
            alpha = best_score - params.aspiration_window;
            beta = best_score + params.aspiration_window;
        }

        let mut pv = Vec::new();
        let score = loop {
            let s = alpha_beta(
                board, tables, &mut ctx, tt, params, &mut clock, depth, 0, alpha, beta, &mut pv,
                true,
            );
            if clock.stop_search {
                break s;
            }
            // Fail low: open the bottom of the window. Fail high: the top.
            if s <= alpha {
                alpha = -INF;
                continue;
            }
            if s >= beta {
                beta = INF;
                continue;
            }
            break s;
        };

        if clock.stop_search {
            break;
        }

        completed_depth = depth;
        best_score = score;
        if let Some(&mv) = pv.first() {
            best_move = mv;
            best_pv = pv.clone();
        }

        let time_ms = clock.elapsed_ms();
        last_iter_ms = time_ms.saturating_sub(iter_start_ms);
        let nps = clock.nodes * 1000 / time_ms.max(1);
        let pv_text = best_pv
            .iter()
            .map(|m| m.to_uci())
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "info depth {} seldepth {} score {} nodes {} nps {} time {} hashfull {} pv {}",
            depth,
            ctx.seldepth,
            format_score(best_score),
            clock.nodes,
            nps,
            time_ms,
            tt.hashfull(),
            pv_text
        );

        // A proven mate cannot improve with depth.
        if best_score.abs() >= MATE_THRESHOLD {
            break;
        }
    }

    SearchReport {
        best_move: Some(best_move),
        score: best_score,
        depth: completed_depth,
        seldepth: ctx.seldepth,
        nodes: clock.nodes,
        time_ms: clock.elapsed_ms(),
        pv: best_pv,
    }
}

/// Negamax with alpha-beta in PVS form. Returns a score from the side to
/// move's perspective and fills `pv` when the node improves alpha.
#[allow(clippy::too_many_arguments)]
fn alpha_beta(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext<'_>,
    tt: &mut TranspositionTable,
    params: &SearchParams,
    clock: &mut SearchClock,
    depth: i32,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    pv: &mut Vec<Move>,
    allow_null: bool,
) -> i32 {
    clock.visit_node();
    if clock.stop_search {
        return 0;
    }
    pv.clear();

    let root = ply == 0;
    let pv_node = beta - alpha > 1;

    if !root && (board.is_repetition() || board.halfmove_clock >= 100) {
        return DRAW_SCORE;
    }
    if ply >= MAX_PLY {
        return static_eval(board, &mut ctx.nnue);
    }
    ctx.seldepth = ctx.seldepth.max(ply);

    let in_check_now = in_check(board, board.side_to_move, tables);
    // Check extension: never drop a checked position straight into
    // quiescence, forced lines must resolve.
    let depth = if in_check_now { depth + 1 } else { depth };

    if depth <= 0 {
        return quiescence(board, tables, ctx, tt, params, clock, ply, alpha, beta);
    }

    let hash = board.zobrist;
    let mut tt_move = None;
    if let Some(entry) = tt.probe(hash) {
        tt_move = entry.best_move();
        if !pv_node && !root && entry.depth as i32 >= depth {
            let score = score_from_tt(entry.score as i32, ply as i32);
            match entry.bound() {
                Bound::Exact => return score,
                Bound::Lower if score >= beta => return score,
                Bound::Upper if score <= alpha => return score,
                _ => {}
            }
        }
    }

    let static_eval_val = if in_check_now {
        0
    } else {
        static_eval(board, &mut ctx.nnue)
    };
    let near_mate = near_mate_window(alpha, beta);

    // Reverse futility: a static margin over beta at low depth fails high.
    if params.use_rfp
        && !pv_node
        && !in_check_now
        && !near_mate
        && depth <= params.rfp_max_depth
        && static_eval_val - params.rfp_margin * depth >= beta
    {
        return static_eval_val - params.rfp_margin * depth;
    }

    // Verified null-move pruning: hand the opponent a free tempo; if the
    // reduced search still fails high, confirm without the null move.
    if params.use_null_move
        && allow_null
        && !pv_node
        && !in_check_now
        && !near_mate
        && depth >= params.null_move_min_depth
        && board.has_non_pawn_material(board.side_to_move)
        && static_eval_val >= beta
    {
        let r = params.null_move_reduction;
        let mut null_pv = Vec::new();

        let undo = make_null_move(board);
        let null_score = -alpha_beta(
            board,
            tables,
            ctx,
            tt,
            params,
            clock,
            depth - 1 - r,
            ply + 1,
            -beta,
            -beta + 1,
            &mut null_pv,
            false,
        );
        undo_null_move(board, undo);

        if clock.stop_search {
            return 0;
        }
        if null_score >= beta {
            let verified = alpha_beta(
                board,
                tables,
                ctx,
                tt,
                params,
                clock,
                depth - r - 1,
                ply,
                beta - 1,
                beta,
                &mut null_pv,
                false,
            );
            if clock.stop_search {
                return 0;
            }
            if verified >= beta {
                return beta;
            }
        }
    }

    let futility_eligible = params.use_futility
        && !pv_node
        && !in_check_now
        && !near_mate
        && depth <= 3
        && static_eval_val + params.futility_margin_for(depth) <= alpha;

    let mut moves = MoveList::new();
    generate_pseudo_legal(board, tables, &mut moves);
    let stm = board.side_to_move;
    let killers = ctx.killers[ply];
    order_moves(
        &mut moves,
        board,
        tables,
        tt_move,
        &killers,
        &ctx.history[stm as usize],
    );

    let original_alpha = alpha;
    let mut best_score = -INF;
    let mut best_move = None;
    let mut moves_tried = 0usize;
    let mut quiets_tried: Vec<Move> = Vec::new();
    let mut child_pv: Vec<Move> = Vec::new();

    for &mv in moves.iter() {
        let is_quiet = !mv.is_capture() && !mv.is_promotion();

        if futility_eligible && is_quiet && moves_tried > 0 {
            continue;
        }

        let mover = board.side_to_move;
        if let Some(nnue) = &mut ctx.nnue {
            nnue.push(board, mv);
        }
        let undo = make_move(board, mv);

        // Pseudo-legal feed: discard moves that leave the own king hanging.
        if in_check(board, mover, tables) {
            undo_move(board, undo);
            if let Some(nnue) = &mut ctx.nnue {
                nnue.pop();
            }
            continue;
        }
        tt.prefetch(board.zobrist);

        let mut score;
        if moves_tried == 0 {
            score = -alpha_beta(
                board,
                tables,
                ctx,
                tt,
                params,
                clock,
                depth - 1,
                ply + 1,
                -beta,
                -alpha,
                &mut child_pv,
                true,
            );
        } else {
            // Late move reductions for quiet non-checking moves ordered
            // deep in the list.
            let mut reduction = 0;
            if params.use_lmr
                && is_quiet
                && !in_check_now
                && depth >= params.lmr_reduction_limit
                && moves_tried >= params.lmr_full_depth_moves as usize
                && !in_check(board, board.side_to_move, tables)
            {
                let hist = ctx.history_score(mover, mv);
                let is_killer = killers.contains(&Some(mv));

                reduction = 1;
                if depth >= 6 {
                    reduction += 1;
                }
                if depth >= 10 {
                    reduction += 1;
                }
                if moves_tried >= 8 {
                    reduction += 1;
                }
                if moves_tried >= 16 {
                    reduction += 1;
                }
                if moves_tried >= 32 {
                    reduction += 1;
                }
                if pv_node {
                    reduction -= 1;
                }
                if is_killer {
                    reduction -= 1;
                }
                if hist > 5000 {
                    reduction -= 1;
                }
                if hist < 0 {
                    reduction += 1;
                }
                reduction = reduction.clamp(0, (depth - 2).max(0));
            }

            score = -alpha_beta(
                board,
                tables,
                ctx,
                tt,
                params,
                clock,
                depth - 1 - reduction,
                ply + 1,
                -alpha - 1,
                -alpha,
                &mut child_pv,
                true,
            );

            // The reduced null-window probe failed high: retry unreduced.
            if score > alpha && reduction > 0 {
                score = -alpha_beta(
                    board,
                    tables,
                    ctx,
                    tt,
                    params,
                    clock,
                    depth - 1,
                    ply + 1,
                    -alpha - 1,
                    -alpha,
                    &mut child_pv,
                    true,
                );
            }
            // Still inside the window: this is a new PV candidate.
            if score > alpha && score < beta {
                score = -alpha_beta(
                    board,
                    tables,
                    ctx,
                    tt,
                    params,
                    clock,
                    depth - 1,
                    ply + 1,
                    -beta,
                    -alpha,
                    &mut child_pv,
                    true,
                );
            }
        }

        undo_move(board, undo);
        if let Some(nnue) = &mut ctx.nnue {
            nnue.pop();
        }
        moves_tried += 1;
        if is_quiet {
            quiets_tried.push(mv);
        }

        if clock.stop_search {
            return 0;
        }

        if score > best_score {
            best_score = score;
            if score > alpha {
                alpha = score;
                best_move = Some(mv);
                pv.clear();
                pv.push(mv);
                pv.extend_from_slice(&child_pv);
            }
            if alpha >= beta {
                if is_quiet {
                    ctx.update_killer(ply, mv);
                    ctx.history_bonus(mover, mv, depth);
                    for &q in quiets_tried.iter().filter(|&&q| q != mv) {
                        ctx.history_penalty(mover, q, depth);
                    }
                }
                break;
            }
        }
    }

    if moves_tried == 0 {
        // No legal move: mate if checked, stalemate otherwise.
        return if in_check_now {
            -MATE_SCORE + ply as i32
        } else {
            DRAW_SCORE
        };
    }

    if clock.stop_search {
        return 0;
    }

    let bound = if best_score >= beta {
        Bound::Lower
    } else if best_score > original_alpha {
        Bound::Exact
    } else {
        Bound::Upper
    };
    tt.store(
        hash,
        depth as i8,
        score_to_tt(best_score, ply as i32) as i16,
        bound,
        best_move,
    );

    best_score
}

/// Quiescence: stand pat, then captures and promotions only, until the
/// position is tactically quiet. In check, every evasion is searched.
#[allow(clippy::too_many_arguments)]
fn quiescence(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext<'_>,
    tt: &mut TranspositionTable,
    params: &SearchParams,
    clock: &mut SearchClock,
    ply: usize,
    mut alpha: i32,
    beta: i32,
) -> i32 {
    clock.visit_node();
    if clock.stop_search {
        return 0;
    }
    ctx.seldepth = ctx.seldepth.max(ply);
    if ply >= MAX_PLY {
        return static_eval(board, &mut ctx.nnue);
    }

    let pv_node = beta - alpha > 1;
    let hash = board.zobrist;
    let mut tt_move = None;
    if let Some(entry) = tt.probe(hash) {
        tt_move = entry.best_move();
        if !pv_node {
            let score = score_from_tt(entry.score as i32, ply as i32);
            match entry.bound() {
                Bound::Exact => return score,
                Bound::Lower if score >= beta => return score,
                Bound::Upper if score <= alpha => return score,
                _ => {}
            }
        }
    }

    let in_check_now = in_check(board, board.side_to_move, tables);
    let original_alpha = alpha;
    let mut stand_pat = None;
    let mut best_score;
    let mut moves = MoveList::new();

    if in_check_now {
        // Evasions: full move set, mates must be visible here.
        best_score = -INF;
        generate_pseudo_legal(board, tables, &mut moves);
        let stm = board.side_to_move;
        let killers = ctx.killers[ply.min(MAX_PLY - 1)];
        order_moves(
            &mut moves,
            board,
            tables,
            tt_move,
            &killers,
            &ctx.history[stm as usize],
        );
    } else {
        let eval = static_eval(board, &mut ctx.nnue);
        if eval >= beta {
            tt.store(
                hash,
                0,
                score_to_tt(eval, ply as i32) as i16,
                Bound::Lower,
                None,
            );
            return beta;
        }
        if eval > alpha {
            alpha = eval;
        }
        stand_pat = Some(eval);
        best_score = eval;
        generate_pseudo_legal_captures(board, tables, &mut moves);
        order_qsearch_moves(&mut moves, board, tables, tt_move);
    }

    let near_mate = near_mate_window(alpha, beta);
    let mut best_move = None;
    let mut legal_moves = 0usize;

    for &mv in moves.iter() {
        // Delta pruning: even the best-case material swing cannot lift
        // this capture above alpha.
        if let Some(stand) = stand_pat
            && params.use_delta_pruning
            && !near_mate
            && !mv.is_promotion()
        {
            let captured_value = if mv.is_en_passant() {
                crate::board::Piece::Pawn.value()
            } else {
                board.piece_type_at(mv.to()).map_or(0, |p| p.value())
            };
            if stand + captured_value + params.delta_margin <= alpha {
                continue;
            }
        }

        let mover = board.side_to_move;
        if let Some(nnue) = &mut ctx.nnue {
            nnue.push(board, mv);
        }
        let undo = make_move(board, mv);
        if in_check(board, mover, tables) {
            undo_move(board, undo);
            if let Some(nnue) = &mut ctx.nnue {
                nnue.pop();
            }
            continue;
        }
        legal_moves += 1;

        let score = -quiescence(board, tables, ctx, tt, params, clock, ply + 1, -beta, -alpha);

        undo_move(board, undo);
        if let Some(nnue) = &mut ctx.nnue {
            nnue.pop();
        }

        if clock.stop_search {
            return 0;
        }

        if score > best_score {
            best_score = score;
            if score > alpha {
                alpha = score;
                best_move = Some(mv);
            }
            if alpha >= beta {
                break;
            }
        }
    }

    if in_check_now && legal_moves == 0 {
        return -MATE_SCORE + ply as i32;
    }

    let bound = if best_score >= beta {
        Bound::Lower
    } else if best_score > original_alpha {
        Bound::Exact
    } else {
        Bound::Upper
    };
    tt.store(
        hash,
        0,
        score_to_tt(best_score, ply as i32) as i16,
        bound,
        best_move,
    );

    best_score
}
