//! Dense linear static solve shared by the bundled structural models.

use nalgebra::{DMatrix, DVector};

use crate::errors::EvaluationError;

/// Solve `K u = f` for the unconstrained degrees of freedom.
///
/// Restrained degrees of freedom keep a zero displacement.
pub(crate) fn solve_displacements(
    stiffness: &DMatrix<f64>,
    load: &DVector<f64>,
    free_dofs: &[usize],
) -> Result<DVector<f64>, EvaluationError> {
    let mut displacements = DVector::zeros(load.len());
    let free_len = free_dofs.len();
    if free_len == 0 {
        return Ok(displacements);
    }
    let mut k_ff = DMatrix::zeros(free_len, free_len);
    let mut f_f = DVector::zeros(free_len);
    for (row_idx, &row) in free_dofs.iter().enumerate() {
        f_f[row_idx] = load[row];
        for (col_idx, &col) in free_dofs.iter().enumerate() {
            k_ff[(row_idx, col_idx)] = stiffness[(row, col)];
        }
    }
    let solution = k_ff
        .lu()
        .solve(&f_f)
        .ok_or(EvaluationError::SingularStiffness)?;
    if solution.iter().any(|value| !value.is_finite()) {
        return Err(EvaluationError::SingularStiffness);
    }
    for (idx, &dof) in free_dofs.iter().enumerate() {
        displacements[dof] = solution[idx];
    }
    Ok(displacements)
}

/// Scatter-add an element matrix into the global matrix.
pub(crate) fn scatter<const N: usize>(
    global: &mut DMatrix<f64>,
    local: &nalgebra::SMatrix<f64, N, N>,
    dofs: &[usize; N],
    scale: f64,
) {
    for (row_local, &global_row) in dofs.iter().enumerate() {
        for (col_local, &global_col) in dofs.iter().enumerate() {
            global[(global_row, global_col)] += scale * local[(row_local, col_local)];
        }
    }
}
