pub mod board;
pub mod interaction;

use std::io::{self, BufRead, Write};
use tracing::{info, warn};

use board::{Board, BoardError, MoveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Lost)
    }
}

/// One session: a board plus where the player stands on it.
pub struct Game {
    board: Board,
    status: GameStatus,
}

impl Game {
    pub fn new(size: usize) -> Result<Game, BoardError> {
        Ok(Game::from_board(Board::new(size)?))
    }

    /// Prompts for a size until a board can be built from it.
    pub fn setup<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Game> {
        loop {
            let size = interaction::read_board_size(input, output)?;
            match Game::new(size) {
                Ok(game) => return Ok(game),
                Err(err) => {
                    warn!(size, error = %err, "rejected board size");
                    writeln!(output, "Cannot build that board: {}.", err)?;
                }
            }
        }
    }

    /// A fixed layout counts as started only once a cell has been opened.
    pub fn from_board(board: Board) -> Game {
        let status = if board.revealed_count() == 0 {
            GameStatus::NotStarted
        } else if board.check_win() {
            GameStatus::Won
        } else {
            GameStatus::InProgress
        };
        Game { board, status }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Plays a move at 1-based `(x, y)`. Returns `None` once the game is over.
    pub fn apply(&mut self, x: i64, y: i64) -> Option<MoveOutcome> {
        if self.status.is_over() {
            return None
        }
        let outcome = self.board.apply_move(x, y);
        match outcome {
            MoveOutcome::OutOfBounds => {}
            MoveOutcome::HitMine => self.status = GameStatus::Lost,
            MoveOutcome::Revealed { .. } => {
                self.status = if self.board.check_win() {
                    GameStatus::Won
                } else {
                    GameStatus::InProgress
                };
            }
        }
        Some(outcome)
    }

    /// Runs the prompt/move/render cycle until the game is won or lost,
    /// then prints the board with every mine shown.
    pub fn play<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> io::Result<GameStatus> {
        info!(size = self.board.size(), mines = self.board.mine_count(), "game started");
        writeln!(output, "Welcome to Minesweeper!")?;
        writeln!(output, "Enter coordinates as 'x y' (1-based indexing)")?;

        while !self.status.is_over() {
            write!(output, "{}", self.board)?;
            let (x, y) = interaction::read_coordinates(input, output)?;
            if let Some(MoveOutcome::OutOfBounds) = self.apply(x, y) {
                warn!(x, y, "move off the board");
                writeln!(output, "Coordinates out of range (1-{}).", self.board.size())?;
            }
        }

        match self.status {
            GameStatus::Lost => writeln!(output, "\nGame Over! You hit a mine!")?,
            GameStatus::Won => writeln!(output, "\nCongratulations! You won!")?,
            _ => {}
        }
        write!(output, "{}", self.board.reveal_all())?;
        info!(status = ?self.status, revealed = self.board.revealed_count(), "game over");
        Ok(self.status)
    }
}
