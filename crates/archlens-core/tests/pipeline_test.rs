use archlens_core::intent::NEUTRAL_SCORE;
use archlens_core::{
    parse_records, AnalysisError, AnalysisPipeline, AnalysisReport, CancellationToken,
    Classification, ComponentId, ComponentRecord, Config, DependencyReference, DiagnosticKind,
    IntentKind, JsonFileSource, RefactoringCategory, StyleKind, ViolationKind,
};

fn fixture_path() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    format!("{manifest_dir}/tests/fixtures/layered-project.json")
}

fn fixture_records() -> Vec<ComponentRecord> {
    let json = std::fs::read_to_string(fixture_path()).expect("failed to read fixture");
    parse_records(&json).expect("fixture should parse")
}

fn pipeline() -> AnalysisPipeline {
    AnalysisPipeline::new(Config::default()).expect("default config is valid")
}

fn analyze(records: &[ComponentRecord]) -> AnalysisReport {
    pipeline().analyze(records).expect("analysis should succeed")
}

fn make_record(id: &str, refs: &[&str]) -> ComponentRecord {
    ComponentRecord {
        component_id: ComponentId::from(id),
        display_name: id.to_string(),
        file_path: format!("src/{id}.rs"),
        loc: 100,
        exported_symbols: Default::default(),
        private_symbols: Default::default(),
        raw_dependency_references: refs
            .iter()
            .map(|r| DependencyReference::import(*r))
            .collect(),
        declares_abstraction: false,
        uses_dependency_injection: false,
    }
}

fn ids(names: &[&str]) -> Vec<ComponentId> {
    names.iter().map(|n| ComponentId::from(*n)).collect()
}

#[test]
fn test_analyze_layered_fixture() {
    let report = pipeline()
        .analyze_source(&JsonFileSource::new(fixture_path()), &CancellationToken::new())
        .expect("analysis should succeed");

    assert_eq!(report.graph.components.len(), 6);
    assert_eq!(report.graph.edges.len(), 5);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::DanglingReference);
    assert_eq!(report.diagnostics[0].reference, "serde::Serialize");

    let layered = report.style(StyleKind::Layered).expect("layered result");
    assert!(
        layered.confidence >= 0.8,
        "layered confidence was {}",
        layered.confidence
    );
    assert!(layered.violations.is_empty());
    assert_eq!(
        report.classification,
        Classification::Single {
            style: StyleKind::Layered
        }
    );
    assert!(report.violations.is_empty(), "{:?}", report.violations);

    let hiding = report
        .intent(IntentKind::InformationHiding)
        .expect("hiding result");
    assert!((hiding.metrics["boundary_clarity"] - 1.0).abs() < 1e-12);

    let inversion = report
        .intent(IntentKind::DependencyInversion)
        .expect("inversion result");
    assert!(!inversion.insufficient_data);
    assert!((inversion.score - 0.85).abs() < 1e-12);
}

#[test]
fn test_upward_dependency_lowers_layered_confidence() {
    let baseline = analyze(&fixture_records());

    let mut records = fixture_records();
    let repository = records
        .iter_mut()
        .find(|r| r.component_id.as_str() == "UserRepository")
        .expect("fixture has UserRepository");
    repository
        .raw_dependency_references
        .push(DependencyReference::import("UserController"));
    let report = analyze(&records);

    let before = baseline.style(StyleKind::Layered).expect("layered result");
    let after = report.style(StyleKind::Layered).expect("layered result");
    assert!(after.confidence < before.confidence);
    assert_eq!(after.violations.len(), 1);
    assert_eq!(
        after.violations[0].participants,
        ids(&["UserRepository", "UserController"])
    );

    assert_eq!(report.violations_of(ViolationKind::LayerViolation).count(), 1);
    assert_eq!(report.violations_of(ViolationKind::Erosion).count(), 1);
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.related_violations.contains(&after.violations[0].id)));
}

#[test]
fn test_zero_edge_graph() {
    let records = vec![make_record("alpha", &[]), make_record("beta", &[])];
    let report = analyze(&records);

    let inversion = report
        .intent(IntentKind::DependencyInversion)
        .expect("inversion result");
    assert_eq!(inversion.score, NEUTRAL_SCORE);
    assert!(inversion.insufficient_data);
    assert!(report.violations.is_empty());
    assert_eq!(report.classification, Classification::Undetermined);
}

#[test]
fn test_fully_exported_components_get_encapsulation_advice() {
    let records: Vec<ComponentRecord> = [("a", vec!["b"]), ("b", vec!["c"]), ("c", vec![])]
        .into_iter()
        .map(|(id, refs)| {
            let mut record = make_record(id, &refs);
            record.exported_symbols = [format!("{id}_read"), format!("{id}_write")]
                .into_iter()
                .collect();
            record
        })
        .collect();
    let report = analyze(&records);

    let hiding = report
        .intent(IntentKind::InformationHiding)
        .expect("hiding result");
    assert!(hiding.insufficient_data);
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.category == RefactoringCategory::Encapsulate));
}

#[test]
fn test_three_cycle_reported_once() {
    let records = vec![
        make_record("a", &["b"]),
        make_record("b", &["c"]),
        make_record("c", &["a"]),
    ];
    let report = analyze(&records);
    let cycles: Vec<_> = report.violations_of(ViolationKind::Cycle).collect();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].participants, ids(&["a", "b", "c"]));
}

#[test]
fn test_removing_any_cycle_edge_clears_it() {
    let edges = [("a", "b"), ("b", "c"), ("c", "a")];
    for skip in 0..edges.len() {
        let records: Vec<ComponentRecord> = ["a", "b", "c"]
            .into_iter()
            .map(|id| {
                let refs: Vec<&str> = edges
                    .iter()
                    .enumerate()
                    .filter(|&(i, &(from, _))| i != skip && from == id)
                    .map(|(_, &(_, to))| to)
                    .collect();
                make_record(id, &refs)
            })
            .collect();
        let report = analyze(&records);
        assert_eq!(
            report.violations_of(ViolationKind::Cycle).count(),
            0,
            "cycle still reported without edge {:?}",
            edges[skip]
        );
    }
}

#[test]
fn test_large_component_alone_is_not_god() {
    let mut big = make_record("big", &["small"]);
    big.loc = 50_000;
    let report = analyze(&[big, make_record("small", &[])]);
    assert_eq!(report.violations_of(ViolationKind::GodComponent).count(), 0);
}

#[test]
fn test_results_independent_of_input_order() {
    let forward = fixture_records();
    let mut reversed = forward.clone();
    reversed.reverse();
    assert_eq!(analyze(&forward), analyze(&reversed));
}

#[test]
fn test_report_json_round_trip() {
    let mut records = fixture_records();
    records[0]
        .raw_dependency_references
        .push(DependencyReference::import("UserController"));
    let report = analyze(&records);

    let json = report.to_json().expect("report serializes");
    let decoded = AnalysisReport::from_json(&json).expect("report deserializes");
    assert_eq!(decoded, report);
}

#[test]
fn test_cancelled_source_run() {
    let token = CancellationToken::new();
    token.cancel();
    let result = pipeline().analyze_source(&JsonFileSource::new(fixture_path()), &token);
    assert!(matches!(
        result,
        Err(AnalysisError::Cancelled { stage: "load" })
    ));
}

#[test]
fn test_duplicate_component_fails_run() {
    let records = vec![make_record("a", &[]), make_record("a", &[])];
    assert!(matches!(
        pipeline().analyze(&records),
        Err(AnalysisError::Input(_))
    ));
}
