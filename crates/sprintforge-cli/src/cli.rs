//! Argument definitions and configuration layering

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sprintforge_baseline::SortKey;
use sprintforge_client::ClientConfig;
use sprintforge_model::{BaselineId, ForgeError, ProjectId};
use std::path::PathBuf;

/// Environment variable naming the configuration file
pub const ENV_CONFIG: &str = "SPRINTFORGE_CONFIG";

fn project_arg() -> Arg {
    Arg::new("project")
        .long("project")
        .short('p')
        .required(true)
        .value_parser(value_parser!(ProjectId))
        .help("Project id")
}

fn baseline_arg() -> Arg {
    Arg::new("baseline")
        .required(true)
        .value_parser(value_parser!(BaselineId))
        .help("Baseline id")
}

fn comparison_args(cmd: Command) -> Command {
    cmd.arg(project_arg())
        .arg(baseline_arg())
        .arg(
            Arg::new("include-unchanged")
                .long("include-unchanged")
                .action(ArgAction::SetTrue)
                .help("Show tasks that are on track"),
        )
        .arg(
            Arg::new("sort")
                .long("sort")
                .default_value("variance")
                .value_parser(value_parser!(SortKey))
                .help("Row order: variance or name"),
        )
}

/// Build the `sprintforge` command
#[must_use]
pub fn command() -> Command {
    Command::new("sprintforge")
        .version(sprintforge_model::VERSION)
        .about("SprintForge baseline management")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .env(ENV_CONFIG)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .global(true)
                .help("API root, overrides configuration and environment"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .global(true)
                .help("Bearer token, overrides configuration and environment"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("baselines")
                .about("Manage project baselines")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list")
                        .about("List a project's baselines")
                        .arg(project_arg())
                        .arg(
                            Arg::new("page")
                                .long("page")
                                .default_value("1")
                                .value_parser(value_parser!(u32).range(1..))
                                .help("Page number, starting at 1"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(u32).range(1..))
                                .help("Page size (defaults to page_limit from configuration)"),
                        ),
                )
                .subcommand(
                    Command::new("show")
                        .about("Show a baseline and its snapshot")
                        .arg(project_arg())
                        .arg(baseline_arg()),
                )
                .subcommand(
                    Command::new("create")
                        .about("Capture the project's current schedule as a baseline")
                        .arg(project_arg())
                        .arg(
                            Arg::new("name")
                                .long("name")
                                .short('n')
                                .required(true)
                                .help("Baseline name (1-255 characters)"),
                        )
                        .arg(
                            Arg::new("description")
                                .long("description")
                                .short('d')
                                .help("Optional description"),
                        ),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a baseline")
                        .arg(project_arg())
                        .arg(baseline_arg())
                        .arg(
                            Arg::new("yes")
                                .long("yes")
                                .short('y')
                                .action(ArgAction::SetTrue)
                                .help("Skip the confirmation prompt"),
                        ),
                )
                .subcommand(
                    Command::new("activate")
                        .about("Make a baseline the project's comparison reference")
                        .arg(project_arg())
                        .arg(baseline_arg()),
                )
                .subcommand(
                    comparison_args(Command::new("compare"))
                        .about("Compare the current schedule against a baseline")
                        .arg(
                            Arg::new("json")
                                .long("json")
                                .action(ArgAction::SetTrue)
                                .help("Output as JSON"),
                        ),
                )
                .subcommand(
                    comparison_args(Command::new("watch"))
                        .about("Compare and refresh until interrupted")
                        .arg(
                            Arg::new("interval")
                                .long("interval")
                                .value_parser(value_parser!(u64).range(1..))
                                .help("Refresh interval in seconds (defaults to poll_interval_secs)"),
                        ),
                ),
        )
}

/// Resolve the client configuration
///
/// Defaults, then the `--config` file, then `SPRINTFORGE_API_URL` and
/// `SPRINTFORGE_TOKEN`, then `--api-url` and `--token`.
///
/// # Errors
/// `ForgeError::Config` if the file is unreadable or the result is invalid.
pub fn load_config(matches: &ArgMatches) -> Result<ClientConfig, ForgeError> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    }
    .with_env_overrides()
    .with_overrides(
        matches.get_one::<String>("api-url").cloned(),
        matches.get_one::<String>("token").cloned(),
    );
    config.validate()?;
    tracing::debug!(base_url = %config.base_url, "configuration resolved");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> ArgMatches {
        command().try_get_matches_from(args).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn compare_defaults_to_variance_order_without_unchanged() {
        let project = ProjectId::new();
        let baseline = BaselineId::new();
        let matches = parse(&[
            "sprintforge",
            "baselines",
            "compare",
            "--project",
            &project.to_string(),
            &baseline.to_string(),
        ]);
        let (_, baselines) = matches.subcommand().unwrap();
        let (name, compare) = baselines.subcommand().unwrap();

        assert_eq!(name, "compare");
        assert_eq!(compare.get_one::<ProjectId>("project"), Some(&project));
        assert_eq!(compare.get_one::<BaselineId>("baseline"), Some(&baseline));
        assert_eq!(compare.get_one::<SortKey>("sort"), Some(&SortKey::Variance));
        assert!(!compare.get_flag("include-unchanged"));
    }

    #[test]
    fn rejects_unknown_sort_key_and_bad_ids() {
        let project = ProjectId::new().to_string();
        let baseline = BaselineId::new().to_string();
        let bad_sort = command().try_get_matches_from([
            "sprintforge", "baselines", "compare", "-p", &project, &baseline, "--sort", "date",
        ]);
        assert!(bad_sort.is_err());

        let bad_id = command().try_get_matches_from([
            "sprintforge", "baselines", "show", "-p", "not-a-uuid", &baseline,
        ]);
        assert!(bad_id.is_err());
    }

    #[test]
    fn list_rejects_page_zero() {
        let project = ProjectId::new().to_string();
        let result = command().try_get_matches_from([
            "sprintforge", "baselines", "list", "-p", &project, "--page", "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url = \"https://file.example/api/v1\"\npage_limit = 50\ntoken = \"from-file\""
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let matches = parse(&[
            "sprintforge",
            "--config",
            &path,
            "--api-url",
            "https://flag.example/api/v1",
            "--token",
            "from-flag",
            "baselines",
            "list",
            "-p",
            &ProjectId::new().to_string(),
        ]);
        let config = load_config(&matches).unwrap();

        assert_eq!(config.base_url, "https://flag.example/api/v1");
        assert_eq!(config.token.as_deref(), Some("from-flag"));
        assert_eq!(config.page_limit, 50);
    }

    #[test]
    fn invalid_config_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_limit = \"many\"").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let matches = parse(&[
            "sprintforge",
            "-c",
            &path,
            "baselines",
            "list",
            "-p",
            &ProjectId::new().to_string(),
        ]);

        assert!(matches!(load_config(&matches), Err(ForgeError::Config(_))));
    }
}
