use approx::assert_relative_eq;
use truss_solver::analysis;
use truss_solver::math::{is_symmetric, stiffness};
use truss_solver::prelude::*;

/// Unit bar along X: node 1 pinned, node 2 free in X only
fn unit_bar(load_x: f64) -> Structure {
    let tables = ElementTables {
        ex: vec![[0.0, 1.0]],
        ey: vec![[0.0, 0.0]],
        ez: None,
        ep: vec![[1.0, 1.0]],
        edof: vec![vec![1, 2, 3, 4]],
    };
    Structure::from_tables(Dimension::Two, &tables, &[1, 2, 4], &[0.0, 0.0, load_x, 0.0]).unwrap()
}

/// Square pyramid: four pinned base nodes at (+-1, +-1, 0), apex at (0, 0, 0.5)
fn pyramid(load_z: f64) -> TrussModel {
    let mut model = TrussModel::space();
    let base = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
    for (i, (x, y)) in base.iter().enumerate() {
        let name = format!("B{}", i + 1);
        model.add_node(&name, Node::new(*x, *y, 0.0)).unwrap();
        model.add_support(&name, Support::pinned()).unwrap();
    }
    model.add_node("Apex", Node::new(0.0, 0.0, 0.5)).unwrap();
    for i in 1..=4 {
        model
            .add_bar(&format!("L{i}"), Bar::new(&format!("B{i}"), "Apex", 1000.0, 1.0))
            .unwrap();
    }
    model.add_node_load("Apex", NodeLoad::fz(load_z)).unwrap();
    model
}

#[test]
fn unit_bar_linear_displacement() {
    let structure = unit_bar(1.0);
    let results = analysis::run(&structure, &AnalysisOptions::linear()).unwrap();

    assert_relative_eq!(results.displacements[2], 1.0, epsilon = 1e-12);
    assert_relative_eq!(results.reactions[0], -1.0, epsilon = 1e-12);
    assert_relative_eq!(results.axial_forces[0], 1.0, epsilon = 1e-12);
    assert_relative_eq!(results.stresses[0], 1.0, epsilon = 1e-12);

    assert_eq!(results.steps.len(), 1);
    assert_eq!(results.steps[0].iterations, 0);
    assert!(results.converged());
    assert_eq!(results.final_load_factor(), Some(1.0));
}

#[test]
fn zero_load_gives_zero_response() {
    let structure = unit_bar(0.0);
    let results = analysis::run(&structure, &AnalysisOptions::linear()).unwrap();
    assert_eq!(results.displacements.norm(), 0.0);
    assert_eq!(results.reactions.norm(), 0.0);

    let results = analysis::run(&structure, &AnalysisOptions::force_controlled(3)).unwrap();
    assert_relative_eq!(results.displacements.norm(), 0.0, epsilon = 1e-14);
    assert_relative_eq!(results.reactions.norm(), 0.0, epsilon = 1e-14);
}

#[test]
fn global_stiffness_is_symmetric() {
    let structure = pyramid(-10.0).build().unwrap();
    let k0 = stiffness::global_linear_stiffness(&structure);
    assert!(is_symmetric(&k0, 1e-9));

    let results = analysis::run(&structure, &AnalysisOptions::force_controlled(2)).unwrap();
    let kt = stiffness::global_tangent_stiffness(
        &structure,
        &results.displacements,
        &results.axial_forces,
    );
    assert!(is_symmetric(&kt, 1e-9));
}

#[test]
fn pyramid_linear_matches_hand_calculation() {
    let mut model = pyramid(-10.0);
    model.analyze_linear().unwrap();

    // Bar length 1.5, vertical direction cosine 1/3: 4 N / 3 = -10
    for name in ["L1", "L2", "L3", "L4"] {
        assert_relative_eq!(model.bar_force(name).unwrap().axial, -7.5, epsilon = 1e-9);
    }
    let apex = model.node_displacement("Apex").unwrap();
    assert_relative_eq!(apex.dx, 0.0, epsilon = 1e-12);
    assert_relative_eq!(apex.dy, 0.0, epsilon = 1e-12);
    assert_relative_eq!(apex.dz, -0.03375, epsilon = 1e-12);

    let rxn = model.node_reactions("B1").unwrap();
    assert_relative_eq!(rxn.fx, -5.0, epsilon = 1e-9);
    assert_relative_eq!(rxn.fy, -5.0, epsilon = 1e-9);
    assert_relative_eq!(rxn.fz, 2.5, epsilon = 1e-9);

    let summary = model.summary().unwrap();
    assert_eq!(summary.max_disp_node, "Apex");
    assert_eq!(summary.total_dofs, 15);
    assert_eq!(summary.free_dofs, 3);
}

#[test]
fn mechanism_reports_singular_system_with_step_context() {
    // Roller-only support leaves rigid-body motion along Y
    let mut model = TrussModel::planar();
    model.add_node("N1", Node::planar(0.0, 0.0)).unwrap();
    model.add_node("N2", Node::planar(1.0, 0.0)).unwrap();
    model.add_bar("B1", Bar::new("N1", "N2", 1.0, 1.0)).unwrap();
    model.add_support("N1", Support::roller_x()).unwrap();
    model.add_node_load("N2", NodeLoad::fx(1.0)).unwrap();

    for options in [AnalysisOptions::linear(), AnalysisOptions::force_controlled(2)] {
        let err = model.analyze(&options).unwrap_err();
        match &err {
            TrussError::StepFailed { step, iteration, .. } => {
                assert_eq!(*step, 1);
                assert_eq!(*iteration, 0);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(err.root_cause(), TrussError::SingularSystem { .. }));
        assert!(!model.is_analyzed());
    }
}

#[test]
fn raw_tables_and_model_agree() {
    let structure = unit_bar(0.5);
    let from_tables = analysis::run(&structure, &AnalysisOptions::force_controlled(4)).unwrap();

    let mut model = TrussModel::planar();
    model.add_node("N1", Node::planar(0.0, 0.0)).unwrap();
    model.add_node("N2", Node::planar(1.0, 0.0)).unwrap();
    model.add_bar("B1", Bar::new("N1", "N2", 1.0, 1.0)).unwrap();
    model.add_support("N1", Support::pinned()).unwrap();
    model.add_support("N2", Support::roller_y()).unwrap();
    model.add_node_load("N2", NodeLoad::fx(0.5)).unwrap();
    let from_model = model.analyze(&AnalysisOptions::force_controlled(4)).unwrap();

    assert_relative_eq!(from_tables.displacements, from_model.displacements, epsilon = 1e-14);
    assert_relative_eq!(from_tables.axial_forces, from_model.axial_forces, epsilon = 1e-14);
}

#[test]
fn invalid_tracked_dof_rejected() {
    let structure = unit_bar(1.0);
    let err = analysis::run(&structure, &AnalysisOptions::linear().with_tracked_dof(4)).unwrap_err();
    assert!(matches!(err, TrussError::InvalidInput(_)));
}
