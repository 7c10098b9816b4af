//! Plan ordering and manifest loading, through the public API only

use bytelink_artifact::{ArtifactDefinition, ArtifactStore, Bytecode, Interface, LinkReference};
use bytelink_plan::{ArgTemplate, DeploymentPlan, PlanError, PlanManifest, PlanStep};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::io::Write;

fn code(name: &str) -> ArtifactDefinition {
    ArtifactDefinition::new(name, Interface::empty(), Bytecode::from_bytes(&[0x60; 128]))
}

#[test]
fn independent_steps_follow_declaration_order() {
    let plan = DeploymentPlan::new()
        .with_step(PlanStep::new("x", code("X")))
        .unwrap()
        .with_step(PlanStep::new("y", code("Y")))
        .unwrap();
    assert_eq!(plan.validate().unwrap().order(), ["x", "y"]);
}

#[test]
fn library_at_offset_orders_before_user() {
    let user = PlanStep::new("user", code("User"))
        .with_link_references(vec![LinkReference::new("Lib", 100, 20)]);
    let plan = DeploymentPlan::new()
        .with_step(user)
        .unwrap()
        .with_step(PlanStep::new("lib", code("Lib")).as_library())
        .unwrap();
    let validated = plan.validate().unwrap();
    assert_eq!(validated.order(), ["lib", "user"]);
    assert_eq!(validated.levels(), vec![vec!["lib"], vec!["user"]]);
}

#[test]
fn three_step_cycle_names_all_members() {
    let plan = DeploymentPlan::new()
        .with_step(PlanStep::new("a", code("A")).after("c"))
        .unwrap()
        .with_step(PlanStep::new("b", code("B")).with_args([ArgTemplate::address_of("a")]))
        .unwrap()
        .with_step(PlanStep::new("c", code("C")).with_args([ArgTemplate::address_of("b")]))
        .unwrap();
    let err = plan.validate().unwrap_err();
    assert!(err.is_unresolved_dependency());
    let PlanError::CycleDetected { steps } = err else {
        panic!("expected a cycle, got {err:?}");
    };
    assert_eq!(steps, ["a", "b", "c"]);
}

#[test]
fn manifest_file_round_trip() {
    let store = ArtifactStore::new()
        .with(code("WETH9"))
        .unwrap()
        .with(code("UniswapV3Factory"))
        .unwrap()
        .with(code("SwapRouter"))
        .unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[[step]]
name = "router"
artifact = "SwapRouter"
args = [{{ address_of = "factory" }}, {{ address_of = "weth9" }}]

[[step]]
name = "weth9"
artifact = "WETH9"

[[step]]
name = "factory"
artifact = "UniswapV3Factory"
"#
    )
    .unwrap();

    let plan = PlanManifest::load(file.path()).unwrap().into_plan(&store).unwrap();
    assert_eq!(plan.validate().unwrap().order(), ["weth9", "factory", "router"]);
}

#[test]
fn missing_manifest_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PlanManifest::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, PlanError::Io { .. }));
}

proptest! {
    // Each step may depend on any earlier-declared step; the order must
    // respect every dependency and be identical across validations.
    #[test]
    fn prop_order_is_deterministic_and_respects_arguments(
        deps in proptest::collection::vec(proptest::collection::vec(any::<prop::sample::Index>(), 0..3), 1..12)
    ) {
        let mut plan = DeploymentPlan::new();
        let mut edges = Vec::new();
        for (i, picks) in deps.iter().enumerate() {
            let name = format!("s{i}");
            let mut args = Vec::new();
            if i > 0 {
                for pick in picks {
                    let dep = pick.index(i);
                    args.push(ArgTemplate::address_of(format!("s{dep}")));
                    edges.push((format!("s{dep}"), name.clone()));
                }
            }
            plan.add_step(PlanStep::new(name.clone(), code(&name)).with_args(args)).unwrap();
        }

        let first = plan.validate().unwrap().order().into_iter().map(String::from).collect::<Vec<_>>();
        let second = plan.validate().unwrap().order().into_iter().map(String::from).collect::<Vec<_>>();
        prop_assert_eq!(&first, &second);

        let position = |n: &str| first.iter().position(|x| x == n).unwrap();
        for (from, to) in edges {
            prop_assert!(position(&from) < position(&to));
        }
    }
}
