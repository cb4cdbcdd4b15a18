use std::str::FromStr;

use log::{debug, warn};
use rand::Rng;

use crate::board::{Board, Color, GameState, Piece};
use crate::error::ChessError;
use crate::evaluation::Evaluator;
use crate::movegen::{Move, MoveGenerator};

/// Bound larger than any score the evaluator produces.
const INFINITY: i32 = 1_000_000;

/// Score of a stalemated leaf.
pub const DRAW_SCORE: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ChessError::InvalidDifficulty(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub easy_depth: u32,
    pub medium_depth: u32,
    pub hard_depth: u32,
    /// Chance that the easy tier plays its best move.
    pub easy_best_chance: f64,
    /// Chance that the easy tier picks uniformly among its three best moves.
    /// Whatever probability is left goes to a uniformly random legal move.
    pub easy_top_three_chance: f64,
}

impl SearchConfig {
    pub fn depth(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy_depth,
            Difficulty::Medium => self.medium_depth,
            Difficulty::Hard => self.hard_depth,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            easy_depth: 1,
            medium_depth: 2,
            hard_depth: 4,
            easy_best_chance: 0.5,
            easy_top_three_chance: 0.3,
        }
    }
}

/// A move chosen by the search together with the score it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredMove {
    pub mv: Move,
    pub piece: Piece,
    pub score: i32,
}

pub struct Search {
    evaluator: Evaluator,
    move_generator: MoveGenerator,
    config: SearchConfig,
    nodes_searched: u64,
}

impl Search {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        Self {
            evaluator: Evaluator::new(),
            move_generator: MoveGenerator::new(),
            config,
            nodes_searched: 0,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn set_depth(&mut self, difficulty: Difficulty, depth: u32) {
        match difficulty {
            Difficulty::Easy => self.config.easy_depth = depth,
            Difficulty::Medium => self.config.medium_depth = depth,
            Difficulty::Hard => self.config.hard_depth = depth,
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Nodes visited by the most recent search call.
    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    pub fn find_best_move(
        &mut self,
        board: &Board,
        state: &GameState,
        color: Color,
        difficulty: Difficulty,
    ) -> Option<ScoredMove> {
        self.find_best_move_with_rng(board, state, color, difficulty, &mut rand::thread_rng())
    }

    /// Picks a move for `color`, or `None` when it has no legal move (or no king).
    ///
    /// Medium and hard always return the highest-scoring move, the first one
    /// found on ties. Easy draws from `rng` to sometimes play a weaker move.
    pub fn find_best_move_with_rng<R: Rng>(
        &mut self,
        board: &Board,
        state: &GameState,
        color: Color,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Option<ScoredMove> {
        if board.find_king(color).is_none() {
            warn!("no {:?} king on the board, nothing to search", color);
            return None;
        }

        let depth = self.config.depth(difficulty).max(1);
        let chosen = match difficulty {
            Difficulty::Easy => {
                let mut scored = self.score_moves(board, state, color, depth);
                scored.sort_by(|a, b| b.score.cmp(&a.score));
                self.pick_easy_move(&scored, rng)
            }
            Difficulty::Medium | Difficulty::Hard => self.best_move(board, state, color, depth),
        };

        match &chosen {
            Some(best) => debug!(
                "{:?} search at depth {} for {:?}: {}{} scored {} after {} nodes",
                difficulty, depth, color, best.mv.from, best.mv.to, best.score, self.nodes_searched
            ),
            None => debug!("{:?} has no legal move", color),
        }
        chosen
    }

    /// Every legal root move of `color` with its exact score at `depth` plies,
    /// in generation order.
    pub fn score_moves(
        &mut self,
        board: &Board,
        state: &GameState,
        color: Color,
        depth: u32,
    ) -> Vec<ScoredMove> {
        self.nodes_searched = 0;
        let moves = self.move_generator.legal_moves_for(board, color, Some(state));

        let mut scored = Vec::with_capacity(moves.len());
        for mv in moves {
            let Some((piece, _)) = board.piece_at(mv.from) else {
                continue;
            };
            let (child, child_state) = board.make_move(state, mv);
            let score = self.alpha_beta(
                &child,
                &child_state,
                depth.saturating_sub(1),
                -INFINITY,
                INFINITY,
                false,
                color,
            );
            scored.push(ScoredMove { mv, piece, score });
        }
        scored
    }

    fn best_move(
        &mut self,
        board: &Board,
        state: &GameState,
        color: Color,
        depth: u32,
    ) -> Option<ScoredMove> {
        self.nodes_searched = 0;
        let moves = self.move_generator.legal_moves_for(board, color, Some(state));

        let mut best: Option<ScoredMove> = None;
        let mut alpha = -INFINITY;
        for mv in moves {
            let Some((piece, _)) = board.piece_at(mv.from) else {
                continue;
            };
            let (child, child_state) = board.make_move(state, mv);
            let score = self.alpha_beta(
                &child,
                &child_state,
                depth.saturating_sub(1),
                alpha,
                INFINITY,
                false,
                color,
            );
            if best.map_or(true, |b| score > b.score) {
                best = Some(ScoredMove { mv, piece, score });
                alpha = alpha.max(score);
            }
        }
        best
    }

    /// `scored` must be sorted best first.
    fn pick_easy_move<R: Rng>(&self, scored: &[ScoredMove], rng: &mut R) -> Option<ScoredMove> {
        if scored.is_empty() {
            return None;
        }
        let roll: f64 = rng.gen();
        let index = if roll < self.config.easy_best_chance {
            0
        } else if roll < self.config.easy_best_chance + self.config.easy_top_three_chance
            && scored.len() >= 3
        {
            rng.gen_range(0..3)
        } else {
            rng.gen_range(0..scored.len())
        };
        scored.get(index).copied()
    }

    /// Minimax with alpha-beta pruning. Scores are from `color`'s point of view;
    /// `maximizing` says whether `color` is the side to move at this node.
    #[allow(clippy::too_many_arguments)]
    pub fn alpha_beta(
        &mut self,
        board: &Board,
        state: &GameState,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
        color: Color,
    ) -> i32 {
        self.nodes_searched += 1;

        if depth == 0 {
            return self.evaluator.evaluate(board, color);
        }

        let mover = if maximizing { color } else { color.opposite() };
        let moves = self.move_generator.legal_moves_for(board, mover, Some(state));
        if moves.is_empty() {
            return self.terminal_score(board, mover, color);
        }

        if maximizing {
            let mut max_eval = -INFINITY;
            for mv in moves {
                let (child, child_state) = board.make_move(state, mv);
                let score = self.alpha_beta(&child, &child_state, depth - 1, alpha, beta, false, color);
                max_eval = max_eval.max(score);
                alpha = alpha.max(score);
                if beta <= alpha {
                    break;
                }
            }
            max_eval
        } else {
            let mut min_eval = INFINITY;
            for mv in moves {
                let (child, child_state) = board.make_move(state, mv);
                let score = self.alpha_beta(&child, &child_state, depth - 1, alpha, beta, true, color);
                min_eval = min_eval.min(score);
                beta = beta.min(score);
                if beta <= alpha {
                    break;
                }
            }
            min_eval
        }
    }

    /// Plain minimax over the same tree as [`Search::alpha_beta`], without pruning.
    pub fn minimax(
        &mut self,
        board: &Board,
        state: &GameState,
        depth: u32,
        maximizing: bool,
        color: Color,
    ) -> i32 {
        self.nodes_searched += 1;

        if depth == 0 {
            return self.evaluator.evaluate(board, color);
        }

        let mover = if maximizing { color } else { color.opposite() };
        let moves = self.move_generator.legal_moves_for(board, mover, Some(state));
        if moves.is_empty() {
            return self.terminal_score(board, mover, color);
        }

        let scores = moves.into_iter().map(|mv| {
            let (child, child_state) = board.make_move(state, mv);
            self.minimax(&child, &child_state, depth - 1, !maximizing, color)
        });
        let best = if maximizing { scores.max() } else { scores.min() };
        best.unwrap_or(DRAW_SCORE)
    }

    pub fn reset_nodes(&mut self) {
        self.nodes_searched = 0;
    }

    /// Score of a node where `mover` has no legal move.
    fn terminal_score(&self, board: &Board, mover: Color, color: Color) -> i32 {
        if self.move_generator.is_king_in_check(board, mover) {
            self.evaluator.evaluate(board, color)
        } else {
            DRAW_SCORE
        }
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}
