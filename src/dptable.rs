//! Dense DP lattice indexed by (time step, state slot).
#[derive(Debug, Clone)]
pub struct DPTable<T> {
    // Total memory, row-major.
    mem: Vec<T>,
    // Number of time steps.
    row: usize,
    // Number of state slots in each time step.
    column: usize,
    // Returned for out-of-range cells.
    fill: T,
}

impl<T: Copy> DPTable<T> {
    pub fn new(row: usize, column: usize, fill: T) -> Self {
        Self {
            mem: vec![fill; row * column],
            row,
            column,
            fill,
        }
    }
    pub fn row(&self) -> usize {
        self.row
    }
    pub fn column(&self) -> usize {
        self.column
    }
    // Set [t,j] to target. Out of range writes are ignored.
    pub fn set(&mut self, t: usize, j: usize, target: T) {
        if let Some(slot) = self.get_mut(t, j) {
            *slot = target;
        }
    }
    pub fn get(&self, t: usize, j: usize) -> T {
        match self.offset(t, j) {
            Some(pos) => self.mem[pos],
            None => self.fill,
        }
    }
    pub fn get_mut(&mut self, t: usize, j: usize) -> Option<&mut T> {
        let pos = self.offset(t, j)?;
        self.mem.get_mut(pos)
    }
    // Whole time step t. Empty if t is out of range.
    pub fn get_line(&self, t: usize) -> &[T] {
        if t < self.row {
            &self.mem[t * self.column..(t + 1) * self.column]
        } else {
            &self.mem[0..0]
        }
    }
    fn offset(&self, t: usize, j: usize) -> Option<usize> {
        if t < self.row && j < self.column {
            Some(t * self.column + j)
        } else {
            None
        }
    }
}
