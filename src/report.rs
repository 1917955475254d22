use crate::analysis::OptimizationSummary;
use simpx::Termination;
use std::fmt::Write;

/// Shade used for a density in the text map.
fn shade(density: f64) -> char {
    match density {
        d if d >= 0.75 => '█',
        d if d >= 0.5 => '▓',
        d if d >= 0.25 => '▒',
        d if d >= 0.05 => '░',
        _ => ' ',
    }
}

/// Draw the densities row by row, top row first.
#[must_use]
pub fn render_density_map(densities: &[f64], shape: (usize, usize)) -> String {
    let (nelx, nely) = shape;
    let mut output = String::with_capacity((nelx + 1) * nely * 3);
    for ey in (0..nely).rev() {
        for ex in 0..nelx {
            output.push(densities.get(ex * nely + ey).copied().map_or('?', shade));
        }
        output.push('\n');
    }
    output
}

/// Render a textual summary of the optimization run.
#[must_use]
pub fn render_summary(summary: &OptimizationSummary) -> String {
    let mut output = String::new();
    let result = &summary.result;

    let outcome = match &result.termination {
        Termination::Converged => "converged".to_string(),
        Termination::IterationLimit => "stopped at the iteration limit".to_string(),
        Termination::TimeBudget => "stopped at the time budget".to_string(),
        Termination::EvaluatorFailed(err) => format!("analysis failed: {err}"),
    };
    writeln!(
        &mut output,
        "Cantilever plate ({} x {} elements): {outcome} after {} iterations",
        summary.shape.0,
        summary.shape.1,
        result.iterations()
    )
    .expect("writing to string cannot fail");

    if let Some(last) = result.history.last() {
        writeln!(&mut output, "Final change in densities: {:.4e}", last.change)
            .expect("writing to string cannot fail");
    }
    writeln!(
        &mut output,
        "Volume fraction: {:.3}",
        result.volume_fraction()
    )
    .expect("writing to string cannot fail");
    writeln!(
        &mut output,
        "Compliance of the last analysed design: {:.4e}",
        summary.compliance
    )
    .expect("writing to string cannot fail");

    let fallbacks: usize = result
        .history
        .iter()
        .map(|record| record.fallback_elements.len())
        .sum();
    if fallbacks > 0 {
        writeln!(
            &mut output,
            "Strain energy fallbacks: {fallbacks} (affected elements tend toward void)"
        )
        .expect("writing to string cannot fail");
    }

    output.push('\n');
    output.push_str(&render_density_map(&result.densities, summary.shape));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use simpx::{ElementId, IterationRecord, OptimizationResult};

    fn summary(termination: Termination) -> OptimizationSummary {
        OptimizationSummary {
            shape: (3, 2),
            compliance: 12.5,
            result: OptimizationResult {
                elements: ElementId::sequence(6),
                densities: vec![1.0, 0.0, 0.6, 0.3, 0.1, 0.0],
                history: vec![IterationRecord {
                    iteration: 0,
                    change: 2.0e-5,
                    mean_density: 0.5,
                    bisection_iterations: 17,
                    bisection_converged: true,
                    fallback_elements: vec![ElementId(5)],
                    sed_scale: 3.0,
                }],
                termination,
            },
        }
    }

    #[test]
    fn density_map_puts_top_row_first() {
        let map = render_density_map(&[1.0, 0.0, 0.6, 0.3, 0.1, 0.0], (3, 2));
        assert_eq!(map, " ▒ \n█▓░\n");
    }

    #[test]
    fn formats_human_readable_report() {
        let report = render_summary(&summary(Termination::Converged));
        assert!(report.contains("Cantilever plate (3 x 2 elements): converged after 1 iterations"));
        assert!(report.contains("Final change in densities: 2.0000e-5"));
        assert!(report.contains("Volume fraction: 0.333"));
        assert!(report.contains("Strain energy fallbacks: 1"));
    }

    #[test]
    fn reports_analysis_failure() {
        let report = render_summary(&summary(Termination::EvaluatorFailed(
            simpx::EvaluationError::SingularStiffness,
        )));
        assert!(report.contains("analysis failed: stiffness matrix is singular"));
    }
}
