//! Deployment plans
//!
//! A [`DeploymentPlan`] is an ordered list of named [`PlanStep`]s. Its
//! dependency graph is derived from the steps themselves: an `AddressOf`
//! argument, a linked library, or an explicit `after` edge each make one
//! step depend on another.
//!
//! [`DeploymentPlan::validate`] checks the whole plan up front and produces
//! a [`ValidatedPlan`] carrying the execution order. Nothing is deployed
//! from a plan that does not validate.

use crate::error::PlanError;
use crate::graph::{cycle_error, DependencyGraph};
use crate::step::PlanStep;
use bytelink_artifact::{check_placeholder_coverage, validate_references};
use std::collections::HashMap;

/// Named steps in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentPlan {
    steps: Vec<PlanStep>,
}

impl DeploymentPlan {
    /// Create an empty plan
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    ///
    /// # Errors
    /// Returns [`PlanError::DuplicateStep`] if the name is taken
    pub fn add_step(&mut self, step: PlanStep) -> Result<&mut Self, PlanError> {
        if self.index_of(step.name()).is_some() {
            return Err(PlanError::DuplicateStep(step.name().to_string()));
        }
        self.steps.push(step);
        Ok(self)
    }

    /// Builder form of [`DeploymentPlan::add_step`]
    ///
    /// # Errors
    /// Returns [`PlanError::DuplicateStep`] if the name is taken
    pub fn with_step(mut self, step: PlanStep) -> Result<Self, PlanError> {
        self.add_step(step)?;
        Ok(self)
    }

    /// Steps in declaration order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Look up a step by name
    #[must_use]
    pub fn step(&self, name: &str) -> Option<&PlanStep> {
        self.index_of(name).map(|i| &self.steps[i])
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name() == name)
    }

    /// Library name to providing step index
    fn library_providers(&self) -> Result<HashMap<&str, usize>, PlanError> {
        let mut providers: HashMap<&str, usize> = HashMap::new();
        for (index, step) in self.steps.iter().enumerate() {
            let Some(library) = step.library() else {
                continue;
            };
            if let Some(&first) = providers.get(library) {
                return Err(PlanError::DuplicateLibrary {
                    library: library.to_string(),
                    first: self.steps[first].name().to_string(),
                    second: step.name().to_string(),
                });
            }
            providers.insert(library, index);
        }
        Ok(providers)
    }

    /// Build the dependency graph, resolving every name
    ///
    /// # Errors
    /// Returns error for unknown steps or libraries and for self-dependencies
    pub fn dependency_graph(&self) -> Result<DependencyGraph, PlanError> {
        let providers = self.library_providers()?;
        let mut graph = DependencyGraph::with_steps(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let named = step
                .argument_dependencies()
                .chain(step.ordered_after().iter().map(String::as_str));
            for dependency in named {
                if dependency == step.name() {
                    return Err(PlanError::SelfDependency(step.name().to_string()));
                }
                let from = self
                    .index_of(dependency)
                    .ok_or_else(|| PlanError::UnknownDependency {
                        step: step.name().to_string(),
                        dependency: dependency.to_string(),
                    })?;
                graph.add_dependency(from, index);
            }

            for library in step.linked_libraries() {
                let from = *providers
                    .get(library)
                    .ok_or_else(|| PlanError::UnknownLibrary {
                        step: step.name().to_string(),
                        library: library.to_string(),
                    })?;
                if from == index {
                    return Err(PlanError::SelfDependency(step.name().to_string()));
                }
                graph.add_dependency(from, index);
            }
        }

        Ok(graph)
    }

    fn ordered_graph(&self) -> Result<(DependencyGraph, Vec<usize>), PlanError> {
        let graph = self.dependency_graph()?;
        let order = graph.order().map_err(|cycle| {
            let names: Vec<&str> = self.steps.iter().map(PlanStep::name).collect();
            cycle_error(&names, &cycle)
        })?;
        Ok((graph, order))
    }

    /// Execution order without checking bytecode or link references
    ///
    /// Malformed link references then surface only when the step is linked.
    ///
    /// # Errors
    /// Same name resolution and cycle errors as [`DeploymentPlan::validate`]
    pub fn resolve_order(&self) -> Result<Vec<&PlanStep>, PlanError> {
        let (_, order) = self.ordered_graph()?;
        Ok(order.into_iter().map(|i| &self.steps[i]).collect())
    }

    /// Check the whole plan and compute the execution order
    ///
    /// # Errors
    /// - [`PlanError::EmptyBytecode`] for a step with nothing to deploy
    /// - [`PlanError::InvalidLinkReference`] for malformed link references or
    ///   placeholder text no reference covers
    /// - [`PlanError::DuplicateLibrary`], [`PlanError::UnknownDependency`],
    ///   [`PlanError::UnknownLibrary`], [`PlanError::SelfDependency`] for
    ///   unresolvable names
    /// - [`PlanError::CycleDetected`] if the dependencies are cyclic
    pub fn validate(&self) -> Result<ValidatedPlan<'_>, PlanError> {
        for step in &self.steps {
            if step.artifact().bytecode().is_empty() {
                return Err(PlanError::EmptyBytecode(step.name().to_string()));
            }
            let bytecode = step.artifact().bytecode();
            validate_references(bytecode, step.link_references())
                .and_then(|()| check_placeholder_coverage(bytecode, step.link_references()))
                .map_err(|source| PlanError::InvalidLinkReference {
                    step: step.name().to_string(),
                    source,
                })?;
        }

        let (graph, order) = self.ordered_graph()?;

        tracing::debug!(
            steps = self.steps.len(),
            dependencies = graph.edge_count(),
            "plan validated"
        );

        Ok(ValidatedPlan {
            plan: self,
            graph,
            order,
        })
    }
}

/// A plan that passed validation, with its execution order
#[derive(Debug, Clone)]
pub struct ValidatedPlan<'a> {
    plan: &'a DeploymentPlan,
    graph: DependencyGraph,
    order: Vec<usize>,
}

impl<'a> ValidatedPlan<'a> {
    /// The underlying plan
    #[inline]
    #[must_use]
    pub fn plan(&self) -> &'a DeploymentPlan {
        self.plan
    }

    /// Steps in execution order
    pub fn steps(&self) -> impl Iterator<Item = &'a PlanStep> + '_ {
        self.order.iter().map(|&i| &self.plan.steps[i])
    }

    /// Step names in execution order
    #[must_use]
    pub fn order(&self) -> Vec<&'a str> {
        self.steps().map(PlanStep::name).collect()
    }

    /// Names of the steps `name` depends on directly, in declaration order
    #[must_use]
    pub fn dependencies(&self, name: &str) -> Vec<&'a str> {
        self.plan.index_of(name).map_or_else(Vec::new, |i| {
            self.graph
                .dependencies(i)
                .into_iter()
                .map(|d| self.plan.steps[d].name())
                .collect()
        })
    }

    /// Groups of mutually independent steps, earliest first
    #[must_use]
    pub fn levels(&self) -> Vec<Vec<&'a str>> {
        self.graph
            .levels()
            .unwrap_or_default()
            .into_iter()
            .map(|level| level.into_iter().map(|i| self.plan.steps[i].name()).collect())
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{ArgTemplate, ArgValue};
    use bytelink_artifact::{ArtifactDefinition, Bytecode, Interface, LinkError, LinkReference};
    use pretty_assertions::assert_eq;

    fn artifact(name: &str) -> ArtifactDefinition {
        ArtifactDefinition::new(name, Interface::empty(), Bytecode::from_bytes(&[0u8; 64]))
    }

    fn step(name: &str) -> PlanStep {
        PlanStep::new(name, artifact(name))
    }

    #[test]
    fn empty_plan_validates() {
        let plan = DeploymentPlan::new();
        let validated = plan.validate().unwrap();
        assert!(validated.is_empty());
    }

    #[test]
    fn duplicate_step_rejected() {
        let err = DeploymentPlan::new()
            .with_step(step("a"))
            .unwrap()
            .with_step(step("a"))
            .unwrap_err();
        assert!(matches!(err, PlanError::DuplicateStep(n) if n == "a"));
    }

    #[test]
    fn arguments_reorder_steps() {
        let plan = DeploymentPlan::new()
            .with_step(step("router").with_args([
                ArgTemplate::address_of("factory"),
                ArgTemplate::address_of("weth9"),
            ]))
            .unwrap()
            .with_step(step("weth9"))
            .unwrap()
            .with_step(step("factory"))
            .unwrap();

        let validated = plan.validate().unwrap();
        assert_eq!(validated.order(), ["weth9", "factory", "router"]);
        assert_eq!(validated.dependencies("router"), ["weth9", "factory"]);
        assert_eq!(validated.levels(), vec![vec!["weth9", "factory"], vec!["router"]]);
    }

    #[test]
    fn library_link_creates_dependency() {
        let user = PlanStep::new(
            "user",
            artifact("User").with_link_references(vec![LinkReference::new("Math", 4, 20)]),
        );
        let plan = DeploymentPlan::new()
            .with_step(user)
            .unwrap()
            .with_step(step("math").as_library_named("Math"))
            .unwrap();

        assert_eq!(plan.validate().unwrap().order(), ["math", "user"]);
    }

    #[test]
    fn unknown_dependency_rejected() {
        let plan = DeploymentPlan::new()
            .with_step(step("router").with_args([ArgTemplate::address_of("factory")]))
            .unwrap();
        let err = plan.validate().unwrap_err();
        assert!(err.is_unresolved_dependency());
        assert!(matches!(
            err,
            PlanError::UnknownDependency { ref step, ref dependency }
                if step == "router" && dependency == "factory"
        ));
    }

    #[test]
    fn unknown_library_rejected() {
        let user = PlanStep::new(
            "user",
            artifact("User").with_link_references(vec![LinkReference::new("Math", 4, 20)]),
        );
        // `math` exists but is not published as a library.
        let plan = DeploymentPlan::new()
            .with_step(step("math"))
            .unwrap()
            .with_step(user)
            .unwrap();
        assert!(matches!(plan.validate(), Err(PlanError::UnknownLibrary { .. })));
    }

    #[test]
    fn self_dependency_rejected() {
        let plan = DeploymentPlan::new()
            .with_step(step("a").with_args([ArgTemplate::address_of("a")]))
            .unwrap();
        assert!(matches!(plan.validate(), Err(PlanError::SelfDependency(n)) if n == "a"));
    }

    #[test]
    fn self_linking_library_rejected() {
        let lib = PlanStep::new(
            "lib",
            artifact("Lib").with_link_references(vec![LinkReference::new("Lib", 0, 20)]),
        )
        .as_library();
        let plan = DeploymentPlan::new().with_step(lib).unwrap();
        assert!(matches!(plan.validate(), Err(PlanError::SelfDependency(_))));
    }

    #[test]
    fn cycle_rejected_with_members() {
        let plan = DeploymentPlan::new()
            .with_step(step("free"))
            .unwrap()
            .with_step(step("a").with_args([ArgTemplate::address_of("b")]))
            .unwrap()
            .with_step(step("b").after("a"))
            .unwrap();
        let err = plan.validate().unwrap_err();
        assert!(matches!(err, PlanError::CycleDetected { ref steps } if steps == &["a", "b"]));
    }

    #[test]
    fn duplicate_library_rejected() {
        let plan = DeploymentPlan::new()
            .with_step(step("one").as_library_named("Math"))
            .unwrap()
            .with_step(step("two").as_library_named("Math"))
            .unwrap();
        assert!(matches!(plan.validate(), Err(PlanError::DuplicateLibrary { .. })));
    }

    #[test]
    fn invalid_link_reference_rejected_before_ordering() {
        let bad = PlanStep::new("bad", artifact("Bad"))
            .with_link_references(vec![LinkReference::new("Math", 60, 20)]);
        let plan = DeploymentPlan::new().with_step(bad).unwrap();
        let err = plan.validate().unwrap_err();
        assert!(matches!(
            err,
            PlanError::InvalidLinkReference { source: LinkError::InvalidLinkReference { .. }, .. }
        ));
    }

    #[test]
    fn unreferenced_placeholder_rejected() {
        let text = format!("0x{}__$0123456789abcdef0123456789abcdef01$__", "60".repeat(10));
        let bad = ArtifactDefinition::new("Bad", Interface::empty(), Bytecode::parse(&text).unwrap());
        let plan = DeploymentPlan::new()
            .with_step(step("a"))
            .unwrap()
            .with_step(PlanStep::new("bad", bad))
            .unwrap();
        let err = plan.validate().unwrap_err();
        assert_eq!(err.step(), Some("bad"));
        assert!(matches!(
            err,
            PlanError::InvalidLinkReference {
                source: LinkError::UnreferencedPlaceholder { offset: 10 },
                ..
            }
        ));
    }

    #[test]
    fn resolve_order_skips_reference_checks() {
        let bad = PlanStep::new("bad", artifact("Bad"))
            .with_link_references(vec![LinkReference::new("Math", 60, 20)]);
        let plan = DeploymentPlan::new()
            .with_step(bad)
            .unwrap()
            .with_step(step("math").as_library_named("Math"))
            .unwrap();
        assert!(plan.validate().is_err());
        let order: Vec<&str> = plan.resolve_order().unwrap().into_iter().map(PlanStep::name).collect();
        assert_eq!(order, ["math", "bad"]);
    }

    #[test]
    fn empty_bytecode_rejected() {
        let empty = ArtifactDefinition::new("Empty", Interface::empty(), Bytecode::from_bytes(&[]));
        let plan = DeploymentPlan::new()
            .with_step(PlanStep::new("empty", empty).with_args([ArgValue::Bool(true).into()]))
            .unwrap();
        assert!(matches!(plan.validate(), Err(PlanError::EmptyBytecode(_))));
    }
}
