//! `cdp` - command-line front end for the CDP sandbox
//!
//! Every invocation opens the JSON store, applies one command and exits.
//! Journey playback runs in the foreground until it completes or Ctrl-C
//! stops it.

use anyhow::{bail, Context};
use cdp_core::prelude::*;
use cdp_core::views::{
    journey_table, profile_label, profile_table, schema_table, segment_table,
};
use cdp_core::{coerce_count, field_summary, PlaybackStatus, SaveOutcome};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

type Sandbox = Platform<FileStore>;

/// How often a foreground journey checks for new lines
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn build_cli() -> Command {
    Command::new("cdp")
        .version(cdp_core::VERSION)
        .about("Customer-data sandbox: schemas, synthetic profiles, segments and journeys")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON file holding the sandbox state"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .global(true)
                .value_parser(value_parser!(u64))
                .help("Random seed for reproducible profile generation"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level"),
        )
        .subcommand(
            Command::new("schema")
                .about("Manage schemas")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List schemas and their fields"))
                .subcommand(
                    Command::new("show")
                        .about("Show one schema as JSON")
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(
                    Command::new("save")
                        .about("Create a schema or replace its fields")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("fields")
                                .required(true)
                                .num_args(1..)
                                .help("Fields as name[:type][:identity]; type is string, number or id, and a trailing :identity marks the key"),
                        ),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a schema; its profiles are kept")
                        .arg(Arg::new("name").required(true))
                        .arg(yes_arg()),
                ),
        )
        .subcommand(
            Command::new("profiles")
                .about("Generate and browse profiles")
                .subcommand_required(true)
                .subcommand(
                    Command::new("generate")
                        .about("Generate synthetic profiles from a schema")
                        .arg(Arg::new("schema").required(true))
                        .arg(
                            Arg::new("count")
                                .long("count")
                                .short('n')
                                .default_value("10")
                                .help("Number of profiles (at least one)"),
                        ),
                )
                .subcommand(
                    Command::new("list")
                        .about("List profiles as a table")
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize))
                                .help("Show at most this many rows"),
                        ),
                )
                .subcommand(
                    Command::new("json")
                        .about("Print one profile as JSON")
                        .arg(
                            Arg::new("index")
                                .required(true)
                                .value_parser(value_parser!(usize)),
                        ),
                )
                .subcommand(
                    Command::new("search")
                        .about("Profiles with a value containing the query, ignoring case")
                        .arg(Arg::new("query").required(true))
                        .arg(
                            Arg::new("table")
                                .long("table")
                                .action(ArgAction::SetTrue)
                                .help("Show matches as a table instead of JSON"),
                        ),
                )
                .subcommand(
                    Command::new("clear")
                        .about("Remove every profile")
                        .arg(yes_arg()),
                ),
        )
        .subcommand(
            Command::new("segment")
                .about("Manage segment rules")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List segments"))
                .subcommand(Command::new("fields").about("Field names a segment can use"))
                .subcommand(
                    Command::new("create")
                        .about("Create a field = value segment")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("field").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete the segment at an index")
                        .arg(
                            Arg::new("index")
                                .required(true)
                                .value_parser(value_parser!(usize)),
                        ),
                ),
        )
        .subcommand(
            Command::new("journey")
                .about("Play and review journeys")
                .subcommand_required(true)
                .subcommand(
                    Command::new("start")
                        .about("Play the journey for a profile")
                        .arg(
                            Arg::new("profile")
                                .required(true)
                                .value_parser(value_parser!(usize))
                                .help("Profile index"),
                        )
                        .arg(
                            Arg::new("segment")
                                .long("segment")
                                .value_parser(value_parser!(usize))
                                .help("Segment index to check membership against"),
                        ),
                )
                .subcommand(Command::new("list").about("List recorded journey starts"))
                .subcommand(Command::new("clear").about("Clear the journey log")),
        )
        .subcommand(Command::new("stats").about("Schema, profile and segment counts"))
        .subcommand(
            Command::new("export")
                .about("Write schemas, profiles and segments as one JSON document")
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Target file (defaults to the configured export file name)"),
                ),
        )
}

fn yes_arg() -> Arg {
    Arg::new("yes")
        .long("yes")
        .short('y')
        .action(ArgAction::SetTrue)
        .help("Confirm the destructive action")
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<PlatformConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => PlatformConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => PlatformConfig::new(),
    };
    if let Some(path) = matches.get_one::<PathBuf>("store") {
        config = config.with_store_path(path);
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config = config.with_rng_seed(*seed);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let config = load_config(&matches)?;
    let store = FileStore::open(&config.store_path)
        .with_context(|| format!("opening store {}", config.store_path.display()))?;
    let mut sandbox = Platform::open(store, config)?;

    match matches.subcommand() {
        Some(("schema", args)) => run_schema(&mut sandbox, args),
        Some(("profiles", args)) => run_profiles(&mut sandbox, args),
        Some(("segment", args)) => run_segment(&mut sandbox, args),
        Some(("journey", args)) => run_journey(&mut sandbox, args).await,
        Some(("stats", _)) => {
            println!("{}", sandbox.stats());
            Ok(())
        }
        Some(("export", args)) => {
            let path = sandbox.export_to(args.get_one::<PathBuf>("output").map(PathBuf::as_path))?;
            println!("Exported to {}", path.display());
            Ok(())
        }
        _ => Ok(()),
    }
}

fn run_schema(sandbox: &mut Sandbox, matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => {
            println!("{}", schema_table(sandbox.state()).render("No schemas yet."));
        }
        Some(("show", args)) => {
            let name = required(args, "name")?;
            let schema = sandbox
                .state()
                .schemas
                .get(name)
                .ok_or_else(|| PlatformError::SchemaNotFound(name.to_string()))?;
            println!("{}", serde_json::to_string_pretty(schema)?);
        }
        Some(("save", args)) => {
            let name = required(args, "name")?;
            let fields = args
                .get_many::<String>("fields")
                .into_iter()
                .flatten()
                .map(|spec| parse_field(spec))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let outcome = sandbox.save_schema(Schema::new(name, fields))?;

            let verb = match outcome {
                SaveOutcome::Created => "Created",
                SaveOutcome::Updated => "Updated",
            };
            if let Some(saved) = sandbox.state().schemas.get(name.trim()) {
                let summary: Vec<String> = saved.fields.iter().map(field_summary).collect();
                println!("{verb} schema {}: {}", saved.name, summary.join(", "));
            }
        }
        Some(("delete", args)) => {
            let name = required(args, "name")?;
            confirm(args, &format!("delete schema {name}"))?;
            let removed = sandbox.delete_schema(name)?;
            println!("Deleted schema {}", removed.name);
        }
        _ => {}
    }
    Ok(())
}

fn run_profiles(sandbox: &mut Sandbox, matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("generate", args)) => {
            let schema = required(args, "schema")?;
            let count = coerce_count(required(args, "count")?);
            let added = sandbox.generate_profiles(schema, count)?;
            println!("Generated {added} profiles for {schema}");
        }
        Some(("list", args)) => {
            let profiles = &sandbox.state().profiles;
            let shown = args
                .get_one::<usize>("limit")
                .map_or(profiles.len(), |limit| (*limit).min(profiles.len()));
            println!("{}", profile_table(&profiles[..shown]).render("No profiles yet."));
        }
        Some(("json", args)) => {
            let index = *args.get_one::<usize>("index").context("index is required")?;
            println!("{}", serde_json::to_string_pretty(sandbox.profile(index)?)?);
        }
        Some(("search", args)) => {
            let query = required(args, "query")?;
            let found = sandbox.search_profiles(query);
            println!("{}", render_search(&found, args.get_flag("table"))?);
        }
        Some(("clear", args)) => {
            confirm(args, "clear all profiles")?;
            let removed = sandbox.clear_profiles()?;
            println!("Removed {removed} profiles");
        }
        _ => {}
    }
    Ok(())
}

fn run_segment(sandbox: &mut Sandbox, matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => {
            println!("{}", segment_table(sandbox.state()).render("No segments yet."));
        }
        Some(("fields", _)) => {
            for field in sandbox.segment_fields() {
                println!("{field}");
            }
        }
        Some(("create", args)) => {
            let created = sandbox.create_segment(
                required(args, "name")?,
                required(args, "field")?,
                required(args, "value")?,
            )?;
            println!("Created segment {}: {} = {}", created.name, created.field, created.value);
        }
        Some(("delete", args)) => {
            let index = *args.get_one::<usize>("index").context("index is required")?;
            let removed = sandbox.delete_segment(index)?;
            println!("Deleted segment {}", removed.name);
        }
        _ => {}
    }
    Ok(())
}

async fn run_journey(sandbox: &mut Sandbox, matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("start", args)) => {
            let index = *args.get_one::<usize>("profile").context("profile is required")?;
            let segment = args.get_one::<usize>("segment").copied();
            let label = profile_label(index, sandbox.profile(index)?);
            println!("Journey for {label}");

            play_journey(sandbox, index, segment).await?;
        }
        Some(("list", _)) => {
            println!("{}", journey_table(sandbox.journeys()).render("No journeys yet."));
        }
        Some(("clear", _)) => {
            let removed = sandbox.clear_journeys()?;
            println!("Cleared {removed} journey records");
        }
        _ => {}
    }
    Ok(())
}

/// Print playback lines as they appear until completion or Ctrl-C
async fn play_journey(
    sandbox: &mut Sandbox,
    profile: usize,
    segment: Option<usize>,
) -> anyhow::Result<()> {
    let observer = sandbox.start_journey(profile, segment)?;
    tracing::debug!(
        interval_ms = sandbox.config().journey_step_interval_ms,
        "playing journey"
    );
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut printed = 0;
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                if let Some(playback) = sandbox.stop_journey() {
                    playback.wait().await;
                }
                for line in observer.log_since(printed) {
                    println!("{line}");
                }
                println!("Journey stopped");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        for line in observer.log_since(printed) {
            println!("{line}");
            printed += 1;
        }
        if observer.is_finished() {
            break;
        }
    }

    if let Some(playback) = sandbox.take_journey() {
        if playback.wait().await == PlaybackStatus::Cancelled {
            println!("Journey stopped");
        }
    }
    Ok(())
}

fn required<'a>(args: &'a ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("{id} is required"))
}

fn confirm(args: &ArgMatches, action: &str) -> anyhow::Result<()> {
    if !args.get_flag("yes") {
        bail!("refusing to {action} without --yes");
    }
    Ok(())
}

/// Search matches as a JSON array, or as a table keyed by the first match
fn render_search(found: &[&Profile], table: bool) -> anyhow::Result<String> {
    if table {
        let rows: Vec<Profile> = found.iter().map(|p| (*p).clone()).collect();
        return Ok(profile_table(&rows).render("No matching profiles."));
    }
    Ok(serde_json::to_string_pretty(found)?)
}

/// Parse `name[:type][:identity]`
///
/// The type defaults to `string`. Only a trailing `identity` marks the
/// identity field.
fn parse_field(spec: &str) -> anyhow::Result<Field> {
    let mut parts = spec.split(':');
    let name = parts.next().unwrap_or_default();
    let field_type = match parts.next() {
        Some(t) if !t.trim().is_empty() => t.parse::<FieldType>().map_err(anyhow::Error::msg)?,
        _ => FieldType::String,
    };
    let identity = match parts.next() {
        None => false,
        Some(flag) if flag.trim().eq_ignore_ascii_case("identity") => true,
        Some(other) => bail!("unexpected '{other}' in field '{spec}' (expected 'identity')"),
    };
    if let Some(extra) = parts.next() {
        bail!("unexpected '{extra}' in field '{spec}'");
    }

    let field = Field::new(name, field_type);
    Ok(if identity { field.as_identity() } else { field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_field_defaults_to_string() {
        let field = parse_field("email").unwrap();
        assert_eq!(field, Field::new("email", FieldType::String));
    }

    #[test]
    fn parse_field_type_and_identity() {
        assert_eq!(
            parse_field("total:number").unwrap(),
            Field::new("total", FieldType::Number)
        );
        assert_eq!(
            parse_field("customerRef:id").unwrap(),
            Field::new("customerRef", FieldType::Id)
        );
        assert!(parse_field("CustomerID:id:identity").unwrap().identity);
        assert!(parse_field("code:string:identity").unwrap().identity);
    }

    #[test]
    fn plain_id_field_keeps_its_type_next_to_identity() {
        let fields = ["orderId:id:identity", "customerRef:id"]
            .iter()
            .map(|spec| parse_field(spec))
            .collect::<anyhow::Result<Vec<_>>>()
            .unwrap();

        let mut registry = cdp_core::SchemaRegistry::new();
        registry.save(Schema::new("Order", fields)).unwrap();
        let saved = registry.get("Order").unwrap();

        assert_eq!(saved.fields[0], Field::identity("orderId"));
        assert_eq!(saved.fields[1], Field::new("customerRef", FieldType::Id));
        let summary: Vec<String> = saved.fields.iter().map(field_summary).collect();
        assert_eq!(summary, vec!["orderId (id)", "customerRef (id)"]);
    }

    #[test]
    fn search_renders_json_by_default() {
        let customer = Profile::new().with("CustomerID", "1001").with("firstName", "Peter");
        let order = Profile::new().with("orderId", "o-1").with("total", 12);
        let found = vec![&customer, &order];

        let json: serde_json::Value =
            serde_json::from_str(&render_search(&found, false).unwrap()).unwrap();
        assert_eq!(json[0]["firstName"], "Peter");
        assert_eq!(json[1]["total"], 12);

        assert_eq!(render_search(&[], false).unwrap(), "[]");
        assert_eq!(render_search(&[], true).unwrap(), "No matching profiles.");
    }

    #[test]
    fn parse_field_rejects_unknown_parts() {
        assert!(parse_field("x:date").is_err());
        assert!(parse_field("x:string:primary").is_err());
        assert!(parse_field("x:string:identity:more").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn destructive_commands_need_yes() {
        let matches = build_cli()
            .try_get_matches_from(["cdp", "profiles", "clear"])
            .unwrap();
        let (_, profiles) = matches.subcommand().unwrap();
        let (_, clear) = profiles.subcommand().unwrap();
        assert!(confirm(clear, "clear all profiles").is_err());

        let matches = build_cli()
            .try_get_matches_from(["cdp", "schema", "delete", "Customer", "--yes"])
            .unwrap();
        let (_, schema) = matches.subcommand().unwrap();
        let (_, delete) = schema.subcommand().unwrap();
        assert!(confirm(delete, "delete schema Customer").is_ok());
    }

    #[test]
    fn global_flags_override_config() {
        let matches = build_cli()
            .try_get_matches_from(["cdp", "stats", "--store", "other.json", "--seed", "7"])
            .unwrap();
        let config = load_config(&matches).unwrap();
        assert_eq!(config.store_path, PathBuf::from("other.json"));
        assert_eq!(config.rng_seed, Some(7));
    }
}
