//! Subcommand implementations
//!
//! Each command writes its report to `out`; logs go to stderr.

use crate::cli::{LinkArgs, PlanArgs, PlanSource, Preset, SimulateArgs};
use anyhow::Context;
use bytelink_artifact::{AddressMap, ArtifactSource, ArtifactStore};
use bytelink_core::{DeployerConfig, Orchestrator, SimulatedClient};
use bytelink_plan::{presets, DeploymentPlan, PlanManifest, PlanStep, ValidatedPlan};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

fn load_store(dir: &std::path::Path) -> anyhow::Result<ArtifactStore> {
    let store = ArtifactStore::load_dir(dir)
        .with_context(|| format!("loading artifacts from {}", dir.display()))?;
    tracing::info!(artifacts = store.len(), dir = %dir.display(), "artifacts loaded");
    Ok(store)
}

/// Build the plan named by `source`
///
/// # Errors
/// Fails if artifacts or the manifest cannot be loaded
pub fn load_plan(source: &PlanSource) -> anyhow::Result<DeploymentPlan> {
    let store = load_store(&source.artifacts)?;
    let plan = match (&source.manifest, source.preset) {
        (Some(path), _) => PlanManifest::load(path)
            .and_then(|manifest| manifest.into_plan(&store))
            .with_context(|| format!("building plan from {}", path.display()))?,
        (None, Some(Preset::UniswapV3)) => presets::uniswap_v3(&store)?,
        (None, None) => anyhow::bail!("either --manifest or --preset is required"),
    };
    Ok(plan)
}

#[derive(Debug, Serialize)]
struct StepReport<'a> {
    name: &'a str,
    artifact: &'a str,
    after: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    library: Option<&'a str>,
    links: &'a [bytelink_artifact::LinkReference],
}

#[derive(Debug, Serialize)]
struct PlanReport<'a> {
    order: Vec<StepReport<'a>>,
    levels: Vec<Vec<&'a str>>,
}

fn plan_report<'a>(validated: &ValidatedPlan<'a>) -> PlanReport<'a> {
    let order = validated
        .steps()
        .map(|step: &'a PlanStep| StepReport {
            name: step.name(),
            artifact: step.artifact().name(),
            after: validated.dependencies(step.name()),
            library: step.library(),
            links: step.link_references(),
        })
        .collect();
    PlanReport {
        order,
        levels: validated.levels(),
    }
}

/// `bytelink plan`
///
/// # Errors
/// Fails if the plan cannot be loaded or does not validate
pub fn plan(args: &PlanArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let plan = load_plan(&args.source)?;
    let validated = plan.validate()?;
    let report = plan_report(&validated);

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    for (i, step) in report.order.iter().enumerate() {
        writeln!(out, "{:>3}. {} ({})", i + 1, step.name, step.artifact)?;
        if !step.after.is_empty() {
            writeln!(out, "       after {}", step.after.join(", "))?;
        }
        if let Some(library) = step.library {
            writeln!(out, "       publishes library {library}")?;
        }
        for link in step.links {
            writeln!(
                out,
                "       links {} at byte {} ({} bytes)",
                link.library, link.start, link.length
            )?;
        }
    }
    Ok(())
}

/// `bytelink link`
///
/// # Errors
/// Fails if the artifact is unknown, a library is missing or a reference is
/// malformed
pub fn link(args: &LinkArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let store = load_store(&args.artifacts)?;
    let artifact = store.artifact(&args.artifact)?;
    let resolved = AddressMap::from_pairs(args.libraries.iter().cloned())?;

    let linked = artifact
        .link(&resolved)
        .with_context(|| format!("linking {}", artifact.name()))?;
    if let Some(offset) = linked.first_unlinked_offset() {
        tracing::warn!(offset, "placeholder text remains after linking");
    }
    writeln!(out, "{linked}")?;
    Ok(())
}

/// `bytelink simulate`
///
/// On failure the steps deployed before it are still printed.
///
/// # Errors
/// Fails if the plan cannot be loaded or the run aborts
pub async fn simulate(args: &SimulateArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let plan = load_plan(&args.source)?;
    let config = match args.step_timeout {
        Some(secs) => DeployerConfig::new().with_step_timeout(secs),
        None => DeployerConfig::new(),
    };
    let client = Arc::new(SimulatedClient::new(args.sender.clone()));
    let orchestrator = Orchestrator::new(client, config);

    match orchestrator.deploy(&plan).await {
        Ok(deployment) if args.json => {
            serde_json::to_writer_pretty(&mut *out, &deployment)?;
            writeln!(out)?;
            Ok(())
        }
        Ok(deployment) => {
            writeln!(out, "run {}", deployment.run_id())?;
            for (step, artifact) in deployment.artifacts() {
                writeln!(out, "{step:<28} {:<40} {}", artifact.name, artifact.address)?;
            }
            Ok(())
        }
        Err(err) => {
            for (step, artifact) in err.deployed() {
                writeln!(
                    out,
                    "deployed before failure: {step} {} {}",
                    artifact.name, artifact.address
                )?;
            }
            Err(err.into())
        }
    }
}
