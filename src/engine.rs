use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(name)
    }
}

/// Side length of the board.
pub const SIZE: usize = 4;

/// Largest tile accepted from outside the game (2^32).
///
/// Merges may grow tiles past this; the board sum only rises by 2 or 4 per
/// move, so a `u64` tile value cannot overflow in any playable game.
pub const MAX_PLACED_TILE: Tile = 1 << 32;

// Lines whose exponents all fit in a nibble go through the lookup table.
const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 nibble-packed lines
const TABLE_MAX_EXPONENT: Exponent = 0xf;

/// A tile value (2, 4, 8, ...), 0 meaning empty.
pub type Tile = u64;

type BoardRaw = u128;
type Line = u32;
type Exponent = u8;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("tile value {0} is not a power of two between 2 and 2^32")]
    InvalidTile(Tile),
}

/// Packed 4x4 2048 board as 16 one-byte exponents in a `u128`.
///
/// Cell (0, 0) lives in the most significant byte; cells run row-major.
/// A zero byte is an empty cell, any other byte `e` is a tile of value `2^e`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board(BoardRaw);

/// Result of sliding a board in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    pub board: Board,
    /// Sum of the values of all tiles created by merges.
    pub gained: u64,
    pub changed: bool,
}

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self { Board(raw) }

    /// Borrow the raw packed `u128` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw { self.0 }

    /// Build a board from tile values, `0` meaning an empty cell.
    ///
    /// ```
    /// use badge_2048::engine::Board;
    /// let b = Board::from_rows([[0, 2, 0, 2], [0; 4], [0; 4], [0, 0, 0, 65536]]).unwrap();
    /// assert_eq!(b.cell(3, 3), Some(65536));
    /// assert!(Board::from_rows([[3, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_err());
    /// ```
    pub fn from_rows(rows: [[Tile; SIZE]; SIZE]) -> Result<Self, BoardError> {
        let mut board = Board::EMPTY;
        for (row, values) in rows.iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                if value == 0 {
                    continue;
                }
                let exp = exponent_of(value).ok_or(BoardError::InvalidTile(value))?;
                board = board.with_exponent(row * SIZE + col, exp);
            }
        }
        Ok(board)
    }

    /// Tile values by row, `0` meaning an empty cell.
    pub fn to_rows(self) -> [[Tile; SIZE]; SIZE] {
        let mut rows = [[0; SIZE]; SIZE];
        for (idx, cell) in rows.iter_mut().flatten().enumerate() {
            *cell = value_of(self.exponent_at(idx));
        }
        rows
    }

    /// Value of the tile at `(row, col)`, `None` if empty or out of bounds.
    pub fn cell(self, row: usize, col: usize) -> Option<Tile> {
        if row >= SIZE || col >= SIZE {
            return None;
        }
        match self.exponent_at(row * SIZE + col) {
            0 => None,
            exp => Some(value_of(exp)),
        }
    }

    /// Slide/merge tiles in `dir` (no random insert).
    ///
    /// ```
    /// use badge_2048::engine::{Board, Move};
    /// let b = Board::from_rows([[0, 2, 0, 2], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// let s = b.slide(Move::Left);
    /// assert!(s.changed);
    /// assert_eq!(s.gained, 4);
    /// assert_eq!(s.board.to_rows()[0], [4, 0, 0, 0]);
    /// ```
    #[inline]
    pub fn slide(self, dir: Move) -> Slide { slide(self, dir) }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot, using the provided RNG.
    ///
    /// A full board is returned unchanged.
    ///
    /// ```
    /// use badge_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = self.count_empty();
        if empty == 0 {
            return self;
        }
        let mut index = rng.gen_range(0..empty);
        let exp = generate_random_exponent(rng);
        for idx in 0..SIZE * SIZE {
            if self.exponent_at(idx) != 0 {
                continue;
            }
            if index == 0 {
                return self.with_exponent(idx, exp);
            }
            index -= 1;
        }
        self
    }

    /// Convenience: like `with_random_tile` but uses thread-local RNG.
    ///
    /// ```
    /// use badge_2048::engine::Board;
    /// let b = Board::EMPTY.with_random_tile_thread();
    /// assert_eq!(b.count_empty(), 15);
    /// assert!(matches!(b.highest_tile(), 2 | 4));
    /// ```
    #[inline]
    pub fn with_random_tile_thread(self) -> Self {
        let mut rng = rand::thread_rng();
        self.with_random_tile(&mut rng)
    }

    /// Place a tile of `value` at `(row, col)`.
    ///
    /// Returns `None` when the coordinate is out of bounds, the cell is occupied
    /// or `value` is not a power of two between 2 and [`MAX_PLACED_TILE`].
    pub fn with_tile(self, row: usize, col: usize, value: Tile) -> Option<Self> {
        if row >= SIZE || col >= SIZE {
            return None;
        }
        let idx = row * SIZE + col;
        if self.exponent_at(idx) != 0 {
            return None;
        }
        exponent_of(value).map(|exp| self.with_exponent(idx, exp))
    }

    /// Return true if the board is full and no two neighbours are equal.
    ///
    /// ```
    /// use badge_2048::engine::Board;
    /// // An empty board still has room for tiles.
    /// assert!(!Board::EMPTY.is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(self) -> bool { is_game_over(self) }

    /// Return the highest tile value present on the board (0 when empty).
    pub fn highest_tile(self) -> Tile {
        let max = (0..SIZE * SIZE).map(|idx| self.exponent_at(idx)).max().unwrap_or(0);
        value_of(max)
    }

    /// Sum of all tile values.
    pub fn tile_sum(self) -> u64 {
        (0..SIZE * SIZE).map(|idx| value_of(self.exponent_at(idx))).sum()
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u32 { count_empty(self) }

    #[inline]
    fn exponent_at(self, idx: usize) -> Exponent {
        (self.0 >> (120 - 8 * idx)) as Exponent
    }

    #[inline]
    fn with_exponent(self, idx: usize, exp: Exponent) -> Self {
        let shift = 120 - 8 * idx;
        Board((self.0 & !(0xffu128 << shift)) | ((exp as u128) << shift))
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#034x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.to_rows();
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                writeln!(f, "-------------------------------")?;
            }
            let cells: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

/// Initialize the line lookup table ahead of the first move. Safe to call multiple times.
pub fn init() {
    tables();
}

/// Slide/merge tiles in the given direction. No randomness.
pub fn slide(board: Board, direction: Move) -> Slide {
    let (raw, gained) = match direction {
        Move::Left => slide_rows(board.0, false),
        Move::Right => slide_rows(board.0, true),
        Move::Up => {
            let (raw, gained) = slide_rows(transpose(board.0), false);
            (transpose(raw), gained)
        }
        Move::Down => {
            let (raw, gained) = slide_rows(transpose(board.0), true);
            (transpose(raw), gained)
        }
    };
    Slide { board: Board(raw), gained, changed: raw != board.0 }
}

/// True iff there are no empty cells and no horizontally or vertically
/// adjacent pair of equal tiles.
pub fn is_game_over(board: Board) -> bool {
    count_empty(board) == 0
        && !has_equal_neighbours(board.0)
        && !has_equal_neighbours(transpose(board.0))
}

/// Count the number of zero tiles.
pub fn count_empty(board: Board) -> u32 {
    16 - count_non_empty(board)
}

#[derive(Clone, Copy, Default)]
struct LineShift {
    cells: [Exponent; SIZE],
    gained: u32,
}

struct Tables {
    left: Box<[LineShift]>,
    right: Box<[LineShift]>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

#[inline(always)]
fn tables() -> &'static Tables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> Tables {
    // Allocate on the heap to avoid large stack frames
    let mut left = vec![LineShift::default(); LINE_TABLE_SIZE];
    let mut right = vec![LineShift::default(); LINE_TABLE_SIZE];
    for val in 0..LINE_TABLE_SIZE {
        let cells = nibbles_to_cells(val as u16);

        let (shifted, gained) = slide_cells_left(cells);
        left[val] = LineShift { cells: shifted, gained: gained as u32 };

        let (shifted, gained) = slide_cells_right(cells);
        right[val] = LineShift { cells: shifted, gained: gained as u32 };
    }
    tracing::trace!(entries = LINE_TABLE_SIZE, "built line lookup tables");
    Tables { left: left.into_boxed_slice(), right: right.into_boxed_slice() }
}

/// Compact the non-empty cells toward index 0, merging equal neighbours once.
fn slide_cells_left(cells: [Exponent; SIZE]) -> ([Exponent; SIZE], u64) {
    let mut tiles = [0; SIZE];
    let mut len = 0;
    for &exp in cells.iter().filter(|&&e| e != 0) {
        tiles[len] = exp;
        len += 1;
    }

    let mut out = [0; SIZE];
    let mut gained = 0;
    let (mut i, mut n) = (0, 0);
    while i < len {
        let exp = tiles[i];
        if i + 1 < len && tiles[i + 1] == exp {
            out[n] = exp + 1;
            gained += value_of(exp + 1);
            i += 2;
        } else {
            out[n] = exp;
            i += 1;
        }
        n += 1;
    }
    (out, gained)
}

fn slide_cells_right(mut cells: [Exponent; SIZE]) -> ([Exponent; SIZE], u64) {
    cells.reverse();
    let (mut shifted, gained) = slide_cells_left(cells);
    shifted.reverse();
    (shifted, gained)
}

/// Slide one line, via the table when every exponent fits in a nibble.
fn slide_line(line: Line, right: bool) -> (Line, u64) {
    let cells = line.to_be_bytes();
    let (shifted, gained) = match cells_to_nibbles(cells) {
        Some(idx) => {
            let t = tables();
            let entry = if right { t.right[idx as usize] } else { t.left[idx as usize] };
            (entry.cells, entry.gained as u64)
        }
        None if right => slide_cells_right(cells),
        None => slide_cells_left(cells),
    };
    (Line::from_be_bytes(shifted), gained)
}

fn slide_rows(raw: BoardRaw, right: bool) -> (BoardRaw, u64) {
    (0..4).fold((0, 0), |(board, gained), row_idx| {
        let (line, line_gained) = slide_line(extract_line(raw, row_idx), right);
        (board | ((line as u128) << (96 - 32 * row_idx)), gained + line_gained)
    })
}

fn has_equal_neighbours(raw: BoardRaw) -> bool {
    (0..4).any(|row_idx| {
        extract_line(raw, row_idx)
            .to_be_bytes()
            .windows(2)
            .any(|pair| pair[0] != 0 && pair[0] == pair[1])
    })
}

pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let mut out = 0;
    for row in 0..SIZE {
        for col in 0..SIZE {
            let byte = (x >> (120 - 8 * (row * SIZE + col))) & 0xff;
            out |= byte << (120 - 8 * (col * SIZE + row));
        }
    }
    out
}

fn extract_line(board: BoardRaw, line_idx: u32) -> Line {
    (board >> ((3 - line_idx) * 32)) as Line
}

fn nibbles_to_cells(line: u16) -> [Exponent; SIZE] {
    [
        (line >> 12 & 0xf) as Exponent,
        (line >> 8 & 0xf) as Exponent,
        (line >> 4 & 0xf) as Exponent,
        (line & 0xf) as Exponent,
    ]
}

fn cells_to_nibbles(cells: [Exponent; SIZE]) -> Option<u16> {
    if cells.iter().any(|&e| e > TABLE_MAX_EXPONENT) {
        return None;
    }
    Some(cells.iter().fold(0u16, |acc, &e| acc << 4 | e as u16))
}

fn count_non_empty(board: Board) -> u32 {
    // Fold every byte onto its lowest bit, then count.
    let mut board_copy = board.0;
    board_copy |= board_copy >> 4;
    board_copy |= board_copy >> 2;
    board_copy |= board_copy >> 1;
    board_copy &= 0x0101_0101_0101_0101_0101_0101_0101_0101;
    board_copy.count_ones()
}

fn generate_random_exponent<R: Rng + ?Sized>(rng: &mut R) -> Exponent {
    if rng.gen_range(0..10) < 9 { 1 } else { 2 }
}

fn exponent_of(value: Tile) -> Option<Exponent> {
    ((2..=MAX_PLACED_TILE).contains(&value) && value.is_power_of_two()).then(|| value.trailing_zeros() as Exponent)
}

#[inline]
fn value_of(exp: Exponent) -> Tile {
    if exp == 0 { 0 } else { 1 << exp }
}

fn format_val(val: Tile) -> String {
    if val == 0 {
        " ".repeat(7)
    } else {
        format!("{:^7}", val)
    }
}
