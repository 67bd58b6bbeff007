// grid.rs — Fixed-size 2D container with checked access.
//
// Row-major, contiguous, no stride padding:
//
//   data index:  0  1  2 | 3  4  5 | 6  7  8
//   cell:        (0,0)…  | (1,0)…  | (2,0)…
//   row:         |- r0 -|  |- r1 -|  |- r2 -|
//
// Unlike a bare `[[T; S]; S]`, every accessor that takes coordinates returns
// `Option` (or `bool` for writes): an out-of-range cell is a value the caller
// must handle, never a write into a neighbouring row or past the buffer.
// Signed coordinates are accepted by `index_of_signed` so callers can pass
// the result of truncating a float directly, negatives included.

/// A `rows × cols` grid of `T`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T: Copy> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Copy> Grid<T> {
    /// A grid with every cell set to `fill`.
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Grid { data: vec![fill; rows * cols], rows, cols }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Flat index of `(row, col)`, or `None` if outside the grid.
    #[inline]
    pub fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Same as [`index_of`](Self::index_of) for signed coordinates.
    #[inline]
    pub fn index_of_signed(&self, row: i64, col: i64) -> Option<usize> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        self.index_of(row, col)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.index_of(row, col).map(|i| self.data[i])
    }

    /// Write `value` at `(row, col)`. Returns `false` (and writes nothing)
    /// when the cell is out of range.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        match self.index_of(row, col) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    /// Value at a flat index obtained from `index_of*`.
    ///
    /// # Panics
    /// Panics if `index` is not a valid flat index.
    #[inline]
    pub fn at(&self, index: usize) -> T {
        self.data[index]
    }

    #[inline]
    pub fn at_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Borrow one row.
    ///
    /// # Panics
    /// Panics if `row >= rows`.
    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        assert!(row < self.rows, "row {row} out of bounds (rows {})", self.rows);
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over all cells as `(row, col, value)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let cols = self.cols;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i / cols, i % cols, v))
    }
}
