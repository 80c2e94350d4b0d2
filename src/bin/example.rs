//! Truss Solver Example - von Mises truss and a space pyramid

use anyhow::{Context, Result};
use log::info;
use truss_solver::prelude::*;

/// Shallow two-bar truss with a downward load at the crown
//
//            B
//          /   \
//        A       C
//        ^       ^
fn von_mises_truss() -> Result<TrussModel> {
    let mut model = TrussModel::planar();

    model.add_node("A", Node::planar(0.0, 0.0))?;
    model.add_node("B", Node::planar(1.0, 0.2))?;
    model.add_node("C", Node::planar(2.0, 0.0))?;

    model.add_bar("AB", Bar::new("A", "B", 1000.0, 1.0))?;
    model.add_bar("BC", Bar::new("B", "C", 1000.0, 1.0))?;

    model.add_support("A", Support::pinned())?;
    model.add_support("C", Support::pinned())?;
    model.add_node_load("B", NodeLoad::fy(-5.0))?;

    Ok(model)
}

/// Four-legged pyramid with a vertical apex load
fn pyramid() -> Result<TrussModel> {
    let mut model = TrussModel::space();

    model.add_node("B1", Node::new(-2.0, -2.0, 0.0))?;
    model.add_node("B2", Node::new(2.0, -2.0, 0.0))?;
    model.add_node("B3", Node::new(2.0, 2.0, 0.0))?;
    model.add_node("B4", Node::new(-2.0, 2.0, 0.0))?;
    model.add_node("Apex", Node::new(0.0, 0.0, 1.0))?;

    for base in ["B1", "B2", "B3", "B4"] {
        model.add_bar(&format!("{}-Apex", base), Bar::new(base, "Apex", 1000.0, 1.0))?;
        model.add_support(base, Support::pinned())?;
    }
    model.add_node_load("Apex", NodeLoad::fz(-40.0))?;

    Ok(model)
}

fn print_path(results: &AnalysisResults) {
    println!("{:>12} {:>12}", "u", "F");
    for (u, f) in results.step_path() {
        println!("{:>12.5} {:>12.5}", u, f);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Truss Solver Example: von Mises truss ===\n");

    let mut model = von_mises_truss()?;
    let crown = model.dof("B", Axis::Y)?;

    model.analyze_linear().context("linear analysis failed")?;
    let linear = model.node_displacement("B")?;
    println!("Linear crown deflection: {:.5}", linear.dy);

    // Force control stays below the limit load
    let options = AnalysisOptions::force_schedule(vec![0.1, 0.1, 0.1, 0.08]).with_tracked_dof(crown);
    let results = model.analyze(&options).context("force-controlled analysis failed")?;
    println!(
        "Force control: load factor {:.2} after {} steps, {} iterations",
        results.final_load_factor().unwrap_or(0.0),
        results.steps.len(),
        results.total_iterations()
    );
    println!("Crown deflection: {:.5}\n", model.node_displacement("B")?.dy);

    // Displacement control passes the limit point and snaps through
    let options = AnalysisOptions::displacement_controlled(0.01, ControlMode::Proportional);
    let results = model
        .analyze(&options)
        .context("displacement-controlled analysis failed")?;
    info!("Snap-through traced in {} steps", results.steps.len());
    print_path(results);

    for bar in model.bar_names() {
        let force = model.bar_force(bar)?;
        println!(
            "{}: N = {:.4} ({})",
            bar,
            force.axial,
            if force.is_tension() { "tension" } else { "compression" }
        );
    }

    println!("\n{}", serde_json::to_string_pretty(&model.summary()?)?);

    println!("\n=== Truss Solver Example: space pyramid ===\n");

    let mut model = pyramid()?;
    let apex = model.dof("Apex", Axis::Z)?;

    // Half the reference load keeps force control below the limit point
    let options = AnalysisOptions::force_schedule(vec![0.1; 5]).with_tracked_dof(apex);
    model.analyze(&options).context("pyramid force control failed")?;
    for (name, deformed) in model.node_names().iter().zip(model.deformed_shape(1.0)?) {
        println!(
            "{:>5}: ({:.4}, {:.4}, {:.4})",
            name, deformed[0], deformed[1], deformed[2]
        );
    }

    let options = AnalysisOptions::displacement_controlled(0.02, ControlMode::SingleDof(apex));
    let results = model.analyze(&options).context("pyramid displacement control failed")?;
    if !results.converged() {
        println!("Warning: {} steps did not converge", results.warnings.len());
    }
    print_path(results);

    println!("\n{}", serde_json::to_string_pretty(&model.summary()?)?);

    Ok(())
}
