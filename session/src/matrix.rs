use serde::Serialize;
use tracing::{debug, warn};

/// Which side of the session a [`SharedMatrixState`] lives on.
///
/// Resolved once at construction. Only the host may mutate the matrix; a
/// client copy is changed exclusively through [`SharedMatrixState::apply_snapshot`]
/// and [`SharedMatrixState::apply_delta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Host,
    Client,
}

impl Role {
    pub fn is_host(self) -> bool {
        matches!(self, Role::Host)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MatrixDimensions {
    pub rows: u32,
    pub columns: u32,
}

impl MatrixDimensions {
    pub fn new(rows: u32, columns: u32) -> MatrixDimensions {
        MatrixDimensions { rows, columns }
    }

    pub fn is_set(&self) -> bool {
        self.rows > 0 && self.columns > 0
    }

    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Row-major index of a cell, `None` outside the grid.
    pub fn index(&self, row: usize, column: usize) -> Option<usize> {
        if row < self.rows as usize && column < self.columns as usize {
            Some(row * self.columns as usize + column)
        } else {
            None
        }
    }
}

/// One incremental change to the replicated matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixDelta {
    Dimensions(MatrixDimensions),
    Coefficient { index: usize, value: f32 },
    Augmented(Vec<f32>),
}

/// Everything a participant needs to catch up with the host.
///
/// The solution vector is never part of a snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MatrixSnapshot {
    pub dimensions: MatrixDimensions,
    pub coefficients: Vec<f32>,
    pub augmented: Vec<f32>,
    /// The host has started the game.
    pub ready: bool,
    /// Host wide auto-guess preference, `None` until the host sets one.
    pub auto_guess: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct SharedMatrixState {
    role: Role,
    dimensions: MatrixDimensions,
    coefficients: Vec<f32>,
    solution: Option<Vec<f32>>,
    augmented: Vec<f32>,
}

impl SharedMatrixState {
    pub fn new(role: Role) -> SharedMatrixState {
        SharedMatrixState {
            role,
            dimensions: MatrixDimensions::default(),
            coefficients: Vec::new(),
            solution: None,
            augmented: Vec::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn dimensions(&self) -> MatrixDimensions {
        self.dimensions
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    pub fn augmented(&self) -> &[f32] {
        &self.augmented
    }

    /// Host only; a client copy never holds the solution.
    pub fn solution(&self) -> Option<&[f32]> {
        self.solution.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.dimensions.is_set() && self.coefficients.len() == self.dimensions.cell_count()
    }

    /// Coefficient at `(row, column)`, `0.0` for any cell outside the grid.
    pub fn coefficient(&self, row: usize, column: usize) -> f32 {
        self.dimensions
            .index(row, column)
            .and_then(|index| self.coefficients.get(index).copied())
            .unwrap_or(0.0)
    }

    /// Fixes the grid size and zero-fills the coefficients. Only the first
    /// call on the host has an effect.
    pub fn set_dimensions(&mut self, rows: u32, columns: u32) -> Option<MatrixDelta> {
        if !self.has_authority("set dimensions") {
            return None;
        }
        if self.dimensions.is_set() {
            warn!(rows, columns, "dimensions are already set, ignoring");
            return None;
        }
        let dimensions = MatrixDimensions::new(rows, columns);
        if !dimensions.is_set() {
            warn!(rows, columns, "dimensions must be positive, ignoring");
            return None;
        }
        self.dimensions = dimensions;
        self.coefficients = vec![0.0; dimensions.cell_count()];
        debug!(rows, columns, "matrix allocated");
        Some(MatrixDelta::Dimensions(dimensions))
    }

    /// Writes one coefficient. Cells outside the grid and writes after the
    /// solution is fixed are ignored.
    pub fn set_coefficient(&mut self, row: usize, column: usize, value: f32) -> Option<MatrixDelta> {
        if !self.has_authority("set coefficient") {
            return None;
        }
        if self.solution.is_some() {
            warn!(row, column, "matrix is read-only once the solution is set");
            return None;
        }
        let Some(index) = self.dimensions.index(row, column) else {
            warn!(row, column, "coefficient outside of the matrix, ignoring");
            return None;
        };
        self.coefficients[index] = value;
        Some(MatrixDelta::Coefficient { index, value })
    }

    /// Fixes the solution and derives the augmented vector `b = A·x`.
    ///
    /// `b` is computed exactly once; later calls are ignored.
    pub fn set_solution(&mut self, solution: Vec<f32>) -> Option<MatrixDelta> {
        if !self.has_authority("set solution") {
            return None;
        }
        if self.solution.is_some() {
            warn!("solution is already set, ignoring");
            return None;
        }
        if !self.is_complete() {
            warn!("solution set before the coefficients are complete, ignoring");
            return None;
        }
        if solution.len() != self.dimensions.columns as usize {
            warn!(
                len = solution.len(),
                columns = self.dimensions.columns,
                "solution length does not match the column count, ignoring"
            );
            return None;
        }
        let augmented = multiply(self.dimensions, &self.coefficients, &solution);
        self.solution = Some(solution);
        self.augmented = augmented.clone();
        Some(MatrixDelta::Augmented(augmented))
    }

    pub fn snapshot(&self) -> MatrixSnapshot {
        MatrixSnapshot {
            dimensions: self.dimensions,
            coefficients: self.coefficients.clone(),
            augmented: self.augmented.clone(),
            ready: false,
            auto_guess: None,
        }
    }

    /// Replaces a client copy with the host's snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &MatrixSnapshot) {
        if self.role.is_host() {
            warn!("host ignores replicated snapshot");
            return;
        }
        self.dimensions = snapshot.dimensions;
        self.coefficients = snapshot.coefficients.clone();
        self.coefficients.resize(self.dimensions.cell_count(), 0.0);
        self.augmented = snapshot.augmented.clone();
    }

    /// Applies one incremental host change to a client copy.
    pub fn apply_delta(&mut self, delta: &MatrixDelta) {
        if self.role.is_host() {
            warn!("host ignores replicated delta");
            return;
        }
        match delta {
            MatrixDelta::Dimensions(dimensions) => {
                if *dimensions != self.dimensions {
                    self.dimensions = *dimensions;
                    self.coefficients = vec![0.0; dimensions.cell_count()];
                }
            }
            MatrixDelta::Coefficient { index, value } => match self.coefficients.get_mut(*index) {
                Some(cell) => *cell = *value,
                None => warn!(index, "coefficient update outside of the replicated matrix"),
            },
            MatrixDelta::Augmented(augmented) => self.augmented = augmented.clone(),
        }
    }

    fn has_authority(&self, action: &str) -> bool {
        if !self.role.is_host() {
            debug!(action, "ignored without host authority");
        }
        self.role.is_host()
    }
}

fn multiply(dimensions: MatrixDimensions, coefficients: &[f32], solution: &[f32]) -> Vec<f32> {
    let columns = dimensions.columns as usize;
    coefficients
        .chunks(columns)
        .take(dimensions.rows as usize)
        .map(|row| row.iter().zip(solution).map(|(a, x)| a * x).sum::<f32>())
        .collect()
}
