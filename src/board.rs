use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use itertools::iproduct;
use tracing::{debug, trace};

/// Smallest side length a board may have.
pub const MIN_SIZE: usize = 9;

/// Mine density used by `Board::new`: one mine per six cells, rounded down.
pub fn default_mine_count(size: usize) -> usize {
    size.saturating_mul(size) / 6
}

// Largest cell count a grid can hold without overflowing its allocation.
fn max_cells() -> usize {
    isize::MAX as usize / std::mem::size_of::<Cell>()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    SizeTooSmall { size: usize, min: usize },
    SizeTooLarge { size: usize },
    TooManyMines { mines: usize, cells: usize },
    MineOutOfBounds { point: Point },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::SizeTooSmall { size, min } => {
                write!(f, "board size must be at least {}, got {}", min, size)
            }
            BoardError::SizeTooLarge { size } => {
                write!(f, "a board of size {} is too large to allocate", size)
            }
            BoardError::TooManyMines { mines, cells } => {
                write!(f, "{} mines leave no safe cell on a board of {} cells", mines, cells)
            }
            BoardError::MineOutOfBounds { point } => {
                write!(f, "mine at {} lies outside the board", point)
            }
        }
    }
}

impl Error for BoardError {}

/// Zero-based grid address: column then row.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub struct Point(pub usize, pub usize);

impl Point {
    /// Converts 1-based player coordinates. Anything below 1 has no address.
    pub fn from_one_based(x: i64, y: i64) -> Option<Point> {
        if x < 1 || y < 1 {
            return None
        }
        let column = usize::try_from(x - 1).ok()?;
        let row = usize::try_from(y - 1).ok()?;
        Some(Point(column, row))
    }

    pub fn one_based(&self) -> (usize, usize) {
        (self.0 + 1, self.1 + 1)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.one_based();
        write!(f, "({}, {})", x, y)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    has_mine: bool,
    revealed: bool,
    adjacent_mines: u8,
}

impl Cell {
    pub fn has_mine(&self) -> bool {
        self.has_mine
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Number of mined neighbours. Only meaningful for cells without a mine.
    pub fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }

    fn count_str(&self) -> String {
        if self.adjacent_mines == 0 {
            String::from(" ")
        } else {
            self.adjacent_mines.to_string()
        }
    }

    fn to_str(&self, show_mines: bool) -> String {
        match (show_mines, self.has_mine, self.revealed) {
            (true, true, _) => String::from("*"),
            (true, false, _) => self.count_str(),
            (false, _, true) => self.count_str(),
            (false, _, false) => String::from("|"),
        }
    }
}

/// What a single move did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The coordinates are not on the board. Nothing changed.
    OutOfBounds,
    /// The target holds a mine. Nothing was revealed.
    HitMine,
    /// The target was safe; `cells` newly revealed cells, zero when it was already open.
    Revealed { cells: usize },
}

impl MoveOutcome {
    pub fn is_safe(&self) -> bool {
        matches!(self, MoveOutcome::Revealed { .. })
    }
}

fn sample_mines<R: Rng + ?Sized>(size: usize, n: usize, excluded: &Point, rng: &mut R) -> Vec<Point> {
    let mut mines = Vec::with_capacity(n);
    let mut taken = HashSet::with_capacity(n);
    let mut rejected = 0usize;
    while mines.len() < n {
        let point = Point(rng.gen_range(0..size), rng.gen_range(0..size));
        if point == *excluded || !taken.insert(point) {
            rejected += 1;
            continue;
        }
        mines.push(point);
    }
    debug!(mines = n, excluded = %excluded, rejected, "placed mines");
    mines
}

#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    field: Vec<Vec<Cell>>,
    mine_count: usize,
    first_move_taken: bool,
    rng: StdRng,
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(false))
    }
}

impl Board {
    /// A `size`x`size` board with the default mine density and an entropy-seeded generator.
    pub fn new(size: usize) -> Result<Board, BoardError> {
        Board::with_rng(size, default_mine_count(size), StdRng::from_entropy())
    }

    pub fn with_seed(size: usize, seed: u64) -> Result<Board, BoardError> {
        Board::with_rng(size, default_mine_count(size), StdRng::seed_from_u64(seed))
    }

    /// Custom density with a fixed seed.
    pub fn with_mines(size: usize, mine_count: usize, seed: u64) -> Result<Board, BoardError> {
        Board::with_rng(size, mine_count, StdRng::seed_from_u64(seed))
    }

    /// Mines are not laid until the first move; `rng` is kept for that placement.
    pub fn with_rng(size: usize, mine_count: usize, rng: StdRng) -> Result<Board, BoardError> {
        Board::check_dimensions(size, mine_count)?;
        let field = vec![vec![Cell::default(); size]; size];
        Ok(Board { size, field, mine_count, first_move_taken: false, rng })
    }

    /// A board whose mines are already laid at `mines`. Duplicates collapse.
    /// The first move gets no safety guarantee on such a board.
    pub fn from_mines(size: usize, mines: &[Point]) -> Result<Board, BoardError> {
        Board::check_dimensions(size, 0)?;
        if let Some(point) = mines.iter().find(|point| point.0 >= size || point.1 >= size) {
            return Err(BoardError::MineOutOfBounds { point: *point })
        }
        let distinct: Vec<Point> = mines.iter().copied()
            .collect::<HashSet<Point>>()
            .into_iter()
            .collect();
        let mut board = Board::with_rng(size, distinct.len(), StdRng::seed_from_u64(0))?;
        board.lay_mines(&distinct);
        Ok(board)
    }

    fn check_dimensions(size: usize, mine_count: usize) -> Result<(), BoardError> {
        if size < MIN_SIZE {
            return Err(BoardError::SizeTooSmall { size, min: MIN_SIZE })
        }
        let cells = size.checked_mul(size)
            .filter(|&cells| cells <= max_cells())
            .ok_or(BoardError::SizeTooLarge { size })?;
        // the first click must always have somewhere safe to land
        if mine_count >= cells {
            return Err(BoardError::TooManyMines { mines: mine_count, cells })
        }
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn first_move_taken(&self) -> bool {
        self.first_move_taken
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.0 < self.size && point.1 < self.size
    }

    /// Resolves 1-based player coordinates, `None` when they fall off the board.
    pub fn point_from_coords(&self, x: i64, y: i64) -> Option<Point> {
        Point::from_one_based(x, y).filter(|point| self.contains(point))
    }

    pub fn cell(&self, point: &Point) -> Option<&Cell> {
        self.field.get(point.1).and_then(|row| row.get(point.0))
    }

    fn cell_mut(&mut self, point: &Point) -> &mut Cell {
        &mut self.field[point.1][point.0]
    }

    /// Every address, row by row.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        iproduct!(0..self.size, 0..self.size).map(|(row, column)| Point(column, row))
    }

    pub fn neighbor_points(&self, point: &Point) -> Vec<Point> {
        let size = self.size as i64;
        iproduct!(-1i64..=1, -1i64..=1)
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(|(dx, dy)| (point.0 as i64 + dx, point.1 as i64 + dy))
            .filter(|&(x, y)| x >= 0 && x < size && y >= 0 && y < size)
            .map(|(x, y)| Point(x as usize, y as usize))
            .collect()
    }

    pub fn revealed_count(&self) -> usize {
        self.field.iter().flatten().filter(|cell| cell.revealed).count()
    }

    fn lay_mines(&mut self, mines: &[Point]) {
        for point in mines {
            self.cell_mut(point).has_mine = true;
        }
        self.calculate_adjacent_mines();
        self.first_move_taken = true;
    }

    fn calculate_adjacent_mines(&mut self) {
        let points: Vec<Point> = self.points().collect();
        for point in points {
            if self.field[point.1][point.0].has_mine {
                continue;
            }
            let count = self.neighbor_points(&point).iter()
                .filter(|neighbor| self.field[neighbor.1][neighbor.0].has_mine)
                .count();
            self.cell_mut(&point).adjacent_mines = count as u8;
        }
    }

    /// Applies a move at 1-based `(x, y)`. The first move on the board lays the
    /// mines around it, so that move can never hit one.
    pub fn apply_move(&mut self, x: i64, y: i64) -> MoveOutcome {
        let point = match self.point_from_coords(x, y) {
            Some(point) => point,
            None => return MoveOutcome::OutOfBounds,
        };

        if !self.first_move_taken {
            let mines = sample_mines(self.size, self.mine_count, &point, &mut self.rng);
            self.lay_mines(&mines);
        }

        if self.field[point.1][point.0].has_mine {
            return MoveOutcome::HitMine
        }

        MoveOutcome::Revealed { cells: self.reveal(&point) }
    }

    /// `true` only when the move revealed a safe cell; off-board moves and mines both give `false`.
    pub fn make_move(&mut self, x: i64, y: i64) -> bool {
        self.apply_move(x, y).is_safe()
    }

    /// Flood-fills from `start`, opening every connected zero cell and its
    /// numbered border. Returns how many cells were newly revealed.
    /// Off-board, already open and mined starts reveal nothing, and so does
    /// any start before the mines are laid.
    pub fn reveal(&mut self, start: &Point) -> usize {
        if !self.first_move_taken {
            return 0
        }
        match self.cell(start) {
            Some(cell) if !cell.has_mine => {}
            _ => return 0,
        }

        let mut pending = vec![*start];
        let mut revealed = 0;
        while let Some(point) = pending.pop() {
            let cell = self.cell_mut(&point);
            if cell.revealed {
                continue;
            }
            cell.revealed = true;
            revealed += 1;
            if cell.adjacent_mines == 0 {
                let field = &self.field;
                pending.extend(self.neighbor_points(&point).into_iter()
                    .filter(|neighbor| !field[neighbor.1][neighbor.0].revealed));
            }
        }
        trace!(start = %start, revealed, "flood fill");
        revealed
    }

    pub fn check_win(&self) -> bool {
        self.field.iter().flatten().all(|cell| cell.has_mine || cell.revealed)
    }

    /// The finished board: mines as `*`, every other cell with its count.
    pub fn reveal_all(&self) -> String {
        self.render(true)
    }

    fn render(&self, show_mines: bool) -> String {
        let width = self.size.to_string().len();
        let mut result = " ".repeat(width + 1);
        for x in 1..=self.size {
            result += &format!("{:>width$} ", x, width = width);
        }
        result += "\n";
        for (y, row) in self.field.iter().enumerate() {
            result += &format!("{:>width$} ", y + 1, width = width);
            for cell in row {
                result += &format!("{:>width$} ", cell.to_str(show_mines), width = width);
            }
            result += "\n";
        }
        result
    }
}

#[cfg(test)]
use proptest::prelude::*;

#[cfg(test)]
mod cell_tests {
    use super::*;

    #[test]
    fn hidden_cells_never_show_their_mine() {
        let cell = Cell { has_mine: true, revealed: false, adjacent_mines: 0 };
        assert_eq!(cell.to_str(false), "|");
        assert_eq!(cell.to_str(true), "*");
    }

    #[test]
    fn zero_count_renders_blank() {
        let open = Cell { has_mine: false, revealed: true, adjacent_mines: 0 };
        let numbered = Cell { has_mine: false, revealed: true, adjacent_mines: 3 };
        assert_eq!(open.to_str(false), " ");
        assert_eq!(numbered.to_str(false), "3");
        assert_eq!(numbered.to_str(true), "3");
    }

    #[test]
    fn one_based_conversion() {
        assert_eq!(Point::from_one_based(1, 1), Some(Point(0, 0)));
        assert_eq!(Point::from_one_based(3, 7), Some(Point(2, 6)));
        assert_eq!(Point::from_one_based(0, 4), None);
        assert_eq!(Point::from_one_based(4, -2), None);
        assert_eq!(Point(2, 6).to_string(), "(3, 7)");
    }
}
