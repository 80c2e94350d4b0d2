use approx::assert_relative_eq;
use truss_solver::prelude::*;

const EA: f64 = 1000.0;
const HEIGHT: f64 = 0.5;

/// Square pyramid: four pinned base nodes at (+-1, +-1, 0) and a loaded apex
fn pyramid(load_z: f64) -> TrussModel {
    let mut model = TrussModel::space();
    let base = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
    for (i, (x, y)) in base.iter().enumerate() {
        let name = format!("B{}", i + 1);
        model.add_node(&name, Node::new(*x, *y, 0.0)).unwrap();
        model.add_support(&name, Support::pinned()).unwrap();
    }
    model.add_node("Apex", Node::new(0.0, 0.0, HEIGHT)).unwrap();
    for i in 1..=4 {
        model
            .add_bar(&format!("L{i}"), Bar::new(&format!("B{i}"), "Apex", EA, 1.0))
            .unwrap();
    }
    model.add_node_load("Apex", NodeLoad::fz(load_z)).unwrap();
    model
}

/// Green-Lagrange axial force of a pyramid bar for apex settlement `w`
fn axial_force(w: f64) -> f64 {
    // L = 1.5, vertical direction cosine 1/3
    EA * (w / 4.5 + w * w / 4.5)
}

/// Vertical internal force at the apex for settlement `w`
fn apex_force(w: f64) -> f64 {
    4.0 * axial_force(w) * (1.0 / 3.0 + w / 1.5)
}

#[test]
fn force_controlled_pyramid_reaches_equilibrium() {
    let mut model = pyramid(-10.0);
    let results = model
        .analyze(&AnalysisOptions::force_controlled(4).with_logging())
        .unwrap()
        .clone();

    assert!(results.converged());
    assert_eq!(results.steps.len(), 4);

    let apex = model.node_displacement("Apex").unwrap();
    assert_relative_eq!(apex.dx, 0.0, epsilon = 1e-12);
    assert_relative_eq!(apex.dy, 0.0, epsilon = 1e-12);
    assert!(apex.dz < 0.0);
    assert_relative_eq!(apex_force(apex.dz), -10.0, epsilon = 1e-4);

    for name in model.bar_names() {
        let force = model.bar_force(name).unwrap();
        assert_relative_eq!(force.axial, axial_force(apex.dz), epsilon = 1e-9);
        assert_relative_eq!(force.stress, force.axial, epsilon = 1e-12);
    }

    // Larger than the linear estimate: the truss softens as it flattens
    let mut linear = pyramid(-10.0);
    linear.analyze_linear().unwrap();
    assert!(apex.dz < linear.node_displacement("Apex").unwrap().dz);
}

#[test]
fn displacement_controlled_pyramid_snaps_through() {
    let mut model = pyramid(-40.0);
    let apex_z = model.dof("Apex", Axis::Z).unwrap();
    let options = AnalysisOptions::displacement_controlled(0.02, ControlMode::Proportional);
    let results = model.analyze(&options).unwrap().clone();

    assert!(results.converged());
    assert_eq!(results.tracked_dof, Some(apex_z));

    let mut previous = 0.0;
    for step in &results.steps {
        assert!(step.displacements[apex_z] < previous);
        previous = step.displacements[apex_z];
    }

    // Passing the base plane inverts the pyramid into a hanging tension net
    let apex = model.deformed_position("Apex").unwrap();
    assert!(apex[2] < 0.0);
    assert!(results.steps.iter().any(|s| s.reactions[apex_z] > 0.0));
    assert!(results.reactions[apex_z] <= -40.0 * (1.0 - 1e-6));
    for name in model.bar_names() {
        assert!(model.bar_force(name).unwrap().is_tension());
    }

    let summary = model.summary().unwrap();
    assert_eq!(summary.num_steps, results.steps.len());
    assert_eq!(summary.non_converged_steps, 0);
    assert_eq!(summary.max_disp_node, "Apex");
}

#[test]
fn enforced_settlement_scales_with_load_steps() {
    // Settle one base node while the apex carries no load
    let mut model = pyramid(0.0);
    model
        .add_support("B1", Support::pinned().with_enforced_dz(-0.01))
        .unwrap();

    let mut settlements = Vec::new();
    let b1_z = model.dof("B1", Axis::Z).unwrap();
    model
        .analyze_observed(&AnalysisOptions::force_controlled(4), &mut |step: &StepRecord| {
            settlements.push(step.displacements[b1_z])
        })
        .unwrap();

    assert_eq!(settlements.len(), 4);
    for (i, w) in settlements.iter().enumerate() {
        assert_relative_eq!(*w, -0.0025 * (i + 1) as f64, epsilon = 1e-12);
    }
    assert_relative_eq!(model.node_displacement("B1").unwrap().dz, -0.01, epsilon = 1e-12);
}

#[test]
fn space_tables_diagonal_bar() {
    let tables = ElementTables {
        ex: vec![[0.0, 1.0]],
        ey: vec![[0.0, 0.0]],
        ez: Some(vec![[0.0, 1.0]]),
        ep: vec![[1.0, 1.0]],
        edof: vec![vec![1, 2, 3, 4, 5, 6]],
    };
    let structure =
        Structure::from_tables(Dimension::Three, &tables, &[1, 2, 3, 5, 6], &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0])
            .unwrap();
    assert_relative_eq!(structure.elements()[0].length(), 2f64.sqrt(), epsilon = 1e-12);

    let results = truss_solver::analysis::run(&structure, &AnalysisOptions::linear()).unwrap();
    // Only the X component of the load is resisted along the diagonal bar: u = P L / (EA cos^2)
    assert_relative_eq!(results.displacements[3], 2.0 * 2f64.sqrt(), epsilon = 1e-9);
}
