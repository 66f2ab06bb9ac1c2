//! Command dispatch and implementations

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{default_script, load_script, replay, ActionRecorder};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings, LOCAL_CONFIG_FILE};
use crate::domain::display::render;
use crate::domain::{ParentSnapshot, ParentTree};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::{InfraError, InfraResult};

/// Commands that run without loading settings.
pub fn needs_settings(cli: &Cli) -> bool {
    !matches!(
        cli.command,
        Some(Commands::Completion { .. })
            | Some(Commands::Config {
                command: ConfigCommands::Path | ConfigCommands::Init { .. }
            })
    )
}

/// Execute a CLI command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if !needs_settings(cli) {
        return match &cli.command {
            Some(Commands::Completion { shell }) => cmd_completion(*shell),
            Some(Commands::Config {
                command: ConfigCommands::Path,
            }) => cmd_config_path(cli.config.as_deref()),
            Some(Commands::Config {
                command: ConfigCommands::Init { force },
            }) => cmd_config_init(cli.config.as_deref(), *force),
            _ => Ok(()),
        };
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let container = ServiceContainer::new(settings);
    execute_with(cli, &container)
}

/// Execute a settings-dependent command against `container`.
pub fn execute_with(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Create { count }) => cmd_create(container, cli.seed, *count),
        Some(Commands::Show { limit }) => cmd_show(container, cli.seed, *limit),
        Some(Commands::Snapshot { compact }) => cmd_snapshot(container, cli.seed, *compact),
        Some(Commands::Observe { script, record }) => {
            cmd_observe(container, cli.seed, script.as_deref(), record.as_deref())
        }
        Some(Commands::Config {
            command: ConfigCommands::Show,
        }) => cmd_config_show(container),
        Some(Commands::Config { .. }) | Some(Commands::Completion { .. }) => Err(
            CliError::Usage("command does not take loaded settings".to_string()),
        ),
        None => {
            output::info("no command given, see --help");
            Ok(())
        }
    }
}

// ============================================================
// Tree commands
// ============================================================

#[instrument(level = "debug", skip(container))]
fn cmd_create(container: &ServiceContainer, seed: Option<u64>, count: Option<usize>) -> CliResult<()> {
    let factory = container.factory()?;
    let mut rng = container.random(seed);
    let count = count.unwrap_or(container.settings.count);

    let parents = factory.create_parents(count, &mut rng);
    output::success(&format!("created {} parents", parents.len()));

    let Some(first) = parents.first() else {
        return Ok(());
    };
    let stats = first.stats();
    output::header(&format!("{} ({})", first.name(), first.id()));
    output::detail(&format!(
        "shape: {} children, {} grandchildren, depth {}",
        stats.children, stats.grandchildren, stats.depth
    ));
    output::detail(&format!("child types: {}", type_distribution(first)));
    output::detail(&format!("sum: {}", first.sum()));
    output::detail(&format!("collect_sum: {:.3}", first.collect_sum()));
    output::detail(&format!("collect_deep_sum: {:.3}", first.collect_deep_sum()));
    Ok(())
}

/// `A=31 B=35 C=34`, sorted by type.
fn type_distribution(tree: &ParentTree) -> String {
    tree.children()
        .map(|c| c.kind())
        .counts()
        .into_iter()
        .sorted()
        .map(|(kind, n)| format!("{kind}={n}"))
        .join(" ")
}

#[instrument(level = "debug", skip(container))]
fn cmd_show(container: &ServiceContainer, seed: Option<u64>, limit: usize) -> CliResult<()> {
    let factory = container.factory()?;
    let tree = factory.create_one_parent(&mut container.random(seed));
    output::info(&render(&tree, limit));
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_snapshot(container: &ServiceContainer, seed: Option<u64>, compact: bool) -> CliResult<()> {
    let factory = container.factory()?;
    let tree = factory.create_one_parent(&mut container.random(seed));
    let snapshot = tree.snapshot();
    let json = if compact {
        snapshot.to_json()
    } else {
        snapshot.to_json_pretty()
    }
    .map_err(ApplicationError::from)?;
    output::info(&json);
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_observe(
    container: &ServiceContainer,
    seed: Option<u64>,
    script: Option<&Path>,
    record: Option<&Path>,
) -> CliResult<()> {
    let factory = container.factory()?;
    let mut tree = factory.create_one_parent(&mut container.random(seed));

    let actions = match script {
        Some(path) => load_script(container.fs.as_ref(), path)?,
        None => default_script(),
    };
    debug!("observe: {} actions", actions.len());

    tree.on_action(|event| output::action("action", event));
    tree.reaction(ParentTree::sum, |sum| {
        output::action("reaction", &format!("sum -> {sum}"))
    });
    tree.on_snapshot(|snapshot| {
        output::action(
            "snapshot",
            &format!(
                "num1={} num2={} deep_sum={:.3}",
                snapshot.num1,
                snapshot.num2,
                snapshot_deep_sum(snapshot)
            ),
        )
    });
    let (recorder, _) = ActionRecorder::attach(&mut tree);

    let applied = replay(&mut tree, &actions)?;
    output::success(&format!(
        "applied {applied} actions, collect_deep_sum {:.3}",
        tree.collect_deep_sum()
    ));

    if let Some(path) = record {
        let json = recorder.to_json()?;
        write_output(container.fs.as_ref(), path, &json)?;
        output::detail(&format!("recorded {} actions to {}", recorder.len(), path.display()));
    }
    Ok(())
}

/// Write `content` to `path`, creating missing parent directories.
fn write_output(fs: &dyn FileSystem, path: &Path, content: &str) -> InfraResult<()> {
    fs.ensure_parent(path)
        .map_err(|e| InfraError::io("create parent directory of", path, e))?;
    fs.write(path, content)
        .map_err(|e| InfraError::io("write", path, e))
}

fn snapshot_deep_sum(snapshot: &ParentSnapshot) -> f64 {
    snapshot
        .children
        .iter()
        .flat_map(|c| c.children.iter())
        .filter_map(|g| g.num)
        .sum()
}

// ============================================================
// Config commands
// ============================================================

fn cmd_config_show(container: &ServiceContainer) -> CliResult<()> {
    output::info(&container.settings.to_toml()?);
    Ok(())
}

fn cmd_config_path(local: Option<&Path>) -> CliResult<()> {
    match global_config_path() {
        Some(path) => output::detail(&format!("global: {}", describe(&path))),
        None => output::detail("global: (no home directory)"),
    }
    let local = local_config_target(local);
    output::detail(&format!("local:  {}", describe(&local)));
    Ok(())
}

fn describe(path: &Path) -> String {
    let state = if path.exists() { "exists" } else { "missing" };
    format!("{} ({state})", path.display())
}

fn local_config_target(local: Option<&Path>) -> PathBuf {
    local
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
}

#[instrument(level = "debug")]
fn cmd_config_init(local: Option<&Path>, force: bool) -> CliResult<()> {
    let target = local_config_target(local);
    if target.exists() && !force {
        return Err(ApplicationError::Config {
            message: format!(
                "{} already exists (use --force to overwrite)",
                target.display()
            ),
        }
        .into());
    }
    write_output(&RealFileSystem, &target, &Settings::template())?;
    output::success(&format!("wrote {}", target.display()));
    Ok(())
}

// ============================================================
// Completion
// ============================================================

fn cmd_completion(shell: clap_complete::Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
