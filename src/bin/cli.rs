//! UCI front end. Searches run on a worker thread so `stop` can flip the
//! shared stop flag mid-search; the worker prints `bestmove` as it unwinds
//! and hands the transposition table back on join.

use ember::board::{Board, Color};
use ember::moves::execute::{make_move, parse_uci_move};
use ember::moves::magic::MagicTables;
use ember::moves::magic::loader::load_magic_tables;
use ember::moves::perft::{perft, perft_divide};
use ember::nnue::NnueNetwork;
use ember::search::limits::{MAX_SEARCH_DEPTH, SearchLimits};
use ember::search::params::SearchParams;
use ember::search::search::search;
use ember::search::tt::TranspositionTable;
use std::io::{self, BufRead};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Instant;

const ENGINE_NAME: &str = "Ember";
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
const ENGINE_AUTHOR: &str = "the Ember authors";

const DEFAULT_HASH_MB: usize = 128;
const DEFAULT_EVAL_FILE: &str = "nnue.bin";

struct Engine {
    board: Board,
    tables: Arc<MagicTables>,
    params: SearchParams,
    /// None while a worker thread owns it.
    tt: Option<TranspositionTable>,
    nnue: Option<Arc<NnueNetwork>>,
    hash_mb: usize,
    eval_file: String,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<TranspositionTable>>,
}

impl Engine {
    fn new() -> Self {
        let tables = Arc::new(load_magic_tables());
        let eval_file = DEFAULT_EVAL_FILE.to_string();
        let nnue = load_network(&eval_file);
        Engine {
            board: Board::new(),
            tables,
            params: SearchParams::default(),
            tt: Some(TranspositionTable::new(DEFAULT_HASH_MB)),
            nnue,
            hash_mb: DEFAULT_HASH_MB,
            eval_file,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Abort any running search and recover the table.
    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.stop.store(true, Ordering::Release);
            match handle.join() {
                Ok(tt) => self.tt = Some(tt),
                Err(_) => {
                    eprintln!("info string search thread panicked, rebuilding hash table");
                    self.tt = Some(TranspositionTable::new(self.hash_mb));
                }
            }
            self.stop.store(false, Ordering::Release);
        }
    }

    fn start_search(&mut self, limits: SearchLimits) {
        self.join_worker();
        let mut board = self.board.clone();
        let tables = Arc::clone(&self.tables);
        let params = self.params;
        let mut tt = self.tt.take().expect("hash table present when idle");
        let nnue = self.nnue.clone();
        let stop = Arc::clone(&self.stop);
        stop.store(false, Ordering::Release);

        self.worker = Some(std::thread::spawn(move || {
            let report = search(
                &mut board,
                &tables,
                &mut tt,
                &params,
                nnue.as_deref(),
                limits,
                stop,
            );
            match report.best_move {
                Some(mv) => println!("bestmove {}", mv.to_uci()),
                None => println!("bestmove 0000"),
            }
            tt
        }));
    }
}

fn load_network(path: &str) -> Option<Arc<NnueNetwork>> {
    match NnueNetwork::load(path) {
        Ok(net) => {
            println!("info string NNUE network loaded from {}", path);
            Some(Arc::new(net))
        }
        Err(e) => {
            println!(
                "info string NNUE file {} unavailable ({}), using classical evaluation",
                path, e
            );
            None
        }
    }
}

fn main() {
    if std::env::var_os("EMBER_LOG").is_some() {
        ember::logger::init_logging("logs/uci.log", "info");
    }

    let mut engine = Engine::new();
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "uci" => handle_uci(),
            "isready" => println!("readyok"),
            "setoption" => handle_setoption(&mut engine, &parts),
            "ucinewgame" => {
                engine.join_worker();
                engine.board = Board::new();
                if let Some(tt) = engine.tt.as_mut() {
                    tt.clear();
                }
            }
            "position" => {
                engine.join_worker();
                if let Some(board) = handle_position(&parts, &engine.tables) {
                    engine.board = board;
                }
            }
            "go" => {
                let side = engine.board.side_to_move;
                let limits = parse_go(&parts, side);
                engine.start_search(limits);
            }
            "stop" => engine.join_worker(),
            "perft" => {
                engine.join_worker();
                handle_perft(&mut engine, &parts);
            }
            "fen" | "d" | "display" => println!("{}", engine.board),
            "quit" => break,
            _ => println!("info string unknown command: {}", parts[0]),
        }
    }

    engine.join_worker();
}

fn handle_uci() {
    println!("id name {} {}", ENGINE_NAME, ENGINE_VERSION);
    println!("id author {}", ENGINE_AUTHOR);
    println!(
        "option name Hash type spin default {} min 1 max 4096",
        DEFAULT_HASH_MB
    );
    println!("option name EvalFile type string default {}", DEFAULT_EVAL_FILE);
    for name in [
        "Use_LMR",
        "Use_NullMove",
        "Use_Futility",
        "Use_RFP",
        "Use_DeltaPruning",
        "Use_Aspiration",
    ] {
        println!("option name {} type check default true", name);
    }
    let defaults = SearchParams::default();
    let spins: [(&str, i32, i32, i32); 11] = [
        ("LMR_FullDepthMoves", defaults.lmr_full_depth_moves, 1, 20),
        ("LMR_ReductionLimit", defaults.lmr_reduction_limit, 1, 10),
        ("NullMove_Reduction", defaults.null_move_reduction, 1, 5),
        ("NullMove_MinDepth", defaults.null_move_min_depth, 1, 10),
        ("Futility_Margin", defaults.futility_margin, 0, 1000),
        ("Futility_MarginD2", defaults.futility_margin_d2, 0, 1500),
        ("Futility_MarginD3", defaults.futility_margin_d3, 0, 2000),
        ("RFP_Margin", defaults.rfp_margin, 0, 500),
        ("RFP_MaxDepth", defaults.rfp_max_depth, 1, 12),
        ("Delta_Margin", defaults.delta_margin, 0, 1000),
        ("Aspiration_Window", defaults.aspiration_window, 10, 500),
    ];
    for (name, default, min, max) in spins {
        println!(
            "option name {} type spin default {} min {} max {}",
            name, default, min, max
        );
    }
    println!("uciok");
}

fn handle_setoption(engine: &mut Engine, parts: &[&str]) {
    // setoption name <Name> [value <V>]
    let name_idx = parts.iter().position(|&p| p == "name");
    let value_idx = parts.iter().position(|&p| p == "value");
    let Some(ni) = name_idx else {
        println!("info string malformed setoption");
        return;
    };
    let name_end = value_idx.unwrap_or(parts.len());
    if ni + 1 > name_end {
        println!("info string malformed setoption");
        return;
    }
    let name = parts[ni + 1..name_end].join(" ");
    let value = value_idx
        .map(|vi| parts[vi + 1..].join(" "))
        .unwrap_or_default();

    let flag = matches!(value.as_str(), "true" | "1" | "on");
    let spin = value.parse::<i32>().ok();

    match name.as_str() {
        "Hash" => {
            if let Some(mb) = spin.filter(|&mb| mb >= 1) {
                engine.join_worker();
                engine.hash_mb = mb as usize;
                if let Some(tt) = engine.tt.as_mut() {
                    tt.resize(mb as usize);
                }
            }
        }
        "EvalFile" => {
            if !value.is_empty() {
                engine.eval_file = value.clone();
            }
            engine.nnue = load_network(&engine.eval_file);
        }
        "Use_LMR" => engine.params.use_lmr = flag,
        "Use_NullMove" => engine.params.use_null_move = flag,
        "Use_Futility" => engine.params.use_futility = flag,
        "Use_RFP" => engine.params.use_rfp = flag,
        "Use_DeltaPruning" => engine.params.use_delta_pruning = flag,
        "Use_Aspiration" => engine.params.use_aspiration = flag,
        "LMR_FullDepthMoves" => {
            if let Some(v) = spin {
                engine.params.lmr_full_depth_moves = v.max(1);
            }
        }
        "LMR_ReductionLimit" => {
            if let Some(v) = spin {
                engine.params.lmr_reduction_limit = v.max(1);
            }
        }
        "NullMove_Reduction" => {
            if let Some(v) = spin {
                engine.params.null_move_reduction = v.max(1);
            }
        }
        "NullMove_MinDepth" => {
            if let Some(v) = spin {
                engine.params.null_move_min_depth = v.max(1);
            }
        }
        "Futility_Margin" => {
            if let Some(v) = spin {
                engine.params.futility_margin = v.max(0);
            }
        }
        "Futility_MarginD2" => {
            if let Some(v) = spin {
                engine.params.futility_margin_d2 = v.max(0);
            }
        }
        "Futility_MarginD3" => {
            if let Some(v) = spin {
                engine.params.futility_margin_d3 = v.max(0);
            }
        }
        "RFP_Margin" => {
            if let Some(v) = spin {
                engine.params.rfp_margin = v.max(0);
            }
        }
        "RFP_MaxDepth" => {
            if let Some(v) = spin {
                engine.params.rfp_max_depth = v.max(1);
            }
        }
        "Delta_Margin" => {
            if let Some(v) = spin {
                engine.params.delta_margin = v.max(0);
            }
        }
        "Aspiration_Window" => {
            if let Some(v) = spin {
                engine.params.aspiration_window = v.max(10);
            }
        }
        _ => println!("info string unknown option: {}", name),
    }
}

fn handle_position(parts: &[&str], tables: &MagicTables) -> Option<Board> {
    let mut board = if parts.len() > 1 && parts[1] == "startpos" {
        Board::new()
    } else if parts.len() > 1 && parts[1] == "fen" {
        let fen_start = 2;
        let fen_end = parts
            .iter()
            .position(|&p| p == "moves")
            .unwrap_or(parts.len());
        let fen_string = parts[fen_start..fen_end].join(" ");
        match Board::from_str(&fen_string) {
            Ok(b) => b,
            Err(e) => {
                println!("info string bad FEN: {}", e);
                return None;
            }
        }
    } else {
        println!("info string malformed position command");
        return None;
    };

    if let Some(moves_idx) = parts.iter().position(|&p| p == "moves") {
        for move_text in &parts[moves_idx + 1..] {
            match parse_uci_move(&board, move_text, tables) {
                Some(mv) => {
                    make_move(&mut board, mv);
                }
                None => {
                    // A rejected move means the GUI and engine no longer
                    // agree on the position; continuing would be worse
                    // than dying loudly.
                    eprintln!("fatal: illegal move {:?} in position command", move_text);
                    std::process::exit(1);
                }
            }
        }
    }

    Some(board)
}

/// Clock-to-budget policy. Returns (soft, hard) in milliseconds.
fn allocate_time(total: u64, inc: u64, movestogo: Option<u64>) -> (u64, u64) {
    // Reserve a slice for I/O and GUI lag the search never sees.
    let safety = (total * 15 / 100).min(500);
    let usable = total.saturating_sub(safety);

    let mut alloc = if let Some(mtg) = movestogo {
        usable / mtg.max(2) + inc * 3 / 4
    } else if usable > 5000 {
        usable / 40 + inc * 9 / 10
    } else if usable > 2000 {
        usable / 30 + inc * 3 / 4
    } else if usable > 500 {
        usable / 20 + inc / 2
    } else {
        inc / 2 + 20
    };

    // Never sink more than a fifth of the remaining clock into one move.
    alloc = alloc.min((usable / 5).max(1)).min(usable.max(1)).max(1);

    let hard = (alloc * 3).min(usable.max(1)).max(alloc);
    (alloc, hard)
}

fn parse_go(parts: &[&str], side: Color) -> SearchLimits {
    let mut limits = SearchLimits::default();
    let mut wtime: Option<u64> = None;
    let mut btime: Option<u64> = None;
    let mut winc: u64 = 0;
    let mut binc: u64 = 0;
    let mut movestogo: Option<u64> = None;
    let mut movetime: Option<u64> = None;
    let mut infinite = false;

    let mut i = 1;
    while i < parts.len() {
        let arg = |j: usize| parts.get(j).and_then(|s| s.parse::<u64>().ok());
        match parts[i] {
            "depth" => {
                if let Some(d) = arg(i + 1) {
                    limits.depth = (d as i32).clamp(1, MAX_SEARCH_DEPTH);
                }
                i += 2;
            }
            "nodes" => {
                limits.nodes = arg(i + 1);
                i += 2;
            }
            "movetime" => {
                movetime = arg(i + 1);
                i += 2;
            }
            "wtime" => {
                wtime = arg(i + 1);
                i += 2;
            }
            "btime" => {
                btime = arg(i + 1);
                i += 2;
            }
            "winc" => {
                winc = arg(i + 1).unwrap_or(0);
                i += 2;
            }
            "binc" => {
                binc = arg(i + 1).unwrap_or(0);
                i += 2;
            }
            "movestogo" => {
                movestogo = arg(i + 1);
                i += 2;
            }
            "infinite" => {
                infinite = true;
                i += 1;
            }
            _ => i += 1,
        }
    }

    if infinite {
        return limits;
    }
    if let Some(ms) = movetime {
        limits.soft_ms = Some(ms);
        limits.hard_ms = Some(ms);
        return limits;
    }

    let (my_time, my_inc) = match side {
        Color::White => (wtime, winc),
        Color::Black => (btime, binc),
    };
    if let Some(total) = my_time {
        let (soft, hard) = allocate_time(total, my_inc, movestogo);
        println!("info string target time {}ms (hard {}ms)", soft, hard);
        limits.soft_ms = Some(soft);
        limits.hard_ms = Some(hard);
    }

    limits
}

fn handle_perft(engine: &mut Engine, parts: &[&str]) {
    let (divide, depth_arg) = match parts.get(1) {
        Some(&"divide") => (true, parts.get(2)),
        other => (false, other),
    };
    let Some(depth) = depth_arg.and_then(|s| s.parse::<u32>().ok()) else {
        println!("info string usage: perft [divide] <depth>");
        return;
    };

    let start = Instant::now();
    let nodes = if divide {
        perft_divide(&mut engine.board, &engine.tables, depth)
    } else {
        perft(&mut engine.board, &engine.tables, depth)
    };
    let secs = start.elapsed().as_secs_f64().max(1e-9);
    println!(
        "info string perft({}) = {} nodes in {:.3}s ({:.0} nps)",
        depth,
        nodes,
        secs,
        nodes as f64 / secs
    );
}
