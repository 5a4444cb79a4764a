use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use picklist_engine::{
    ControlDocument, ControlSession, HostBinding, RecordFetcher, StaticFetcher, WebApiFetcher, decode_event, parse_control_file,
    records_from_json,
};
use picklist_types::{BoundValue, SelectionEvent};
use tracing::debug;
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("query", sub)) => run_query_cmd(sub),
        Some(("resolve", sub)) => run_resolve_cmd(sub).await,
        Some(("select", sub)) => run_select_cmd(sub),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

fn init_tracing() {
    let _ = log_subscriber(std::env::var("RUST_LOG").ok()).try_init();
}

/// Stderr subscriber filtered by `directives`, falling back to `info` when unset or invalid.
fn log_subscriber(directives: Option<String>) -> impl tracing::Subscriber + Send + Sync + 'static {
    let filter = directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

fn build_cli() -> Command {
    let file_arg = || {
        Arg::new("file")
            .required(true)
            .action(ArgAction::Set)
            .help("Path to a control document (YAML, or JSON by .json extension)")
    };

    Command::new("picklist")
        .about("Resolve and reconcile dynamic drop-down controls")
        .subcommand(Command::new("query").about("Print the materialized fetch query").arg(file_arg()))
        .subcommand(
            Command::new("resolve")
                .about("Run one cycle and print the render state")
                .arg(file_arg())
                .arg(
                    Arg::new("records")
                        .long("records")
                        .short('r')
                        .action(ArgAction::Set)
                        .conflicts_with("base-url")
                        .help("JSON file with the records to serve (array or {\"value\": [...]})"),
                )
                .arg(
                    Arg::new("base-url")
                        .long("base-url")
                        .action(ArgAction::Set)
                        .help("Organization URL of the Web API to fetch from"),
                )
                .arg(
                    Arg::new("token-env")
                        .long("token-env")
                        .action(ArgAction::Set)
                        .default_value("PICKLIST_TOKEN")
                        .help("Environment variable holding the bearer token"),
                ),
        )
        .subcommand(
            Command::new("select")
                .about("Print the bound value a selection would write")
                .arg(file_arg())
                .arg(Arg::new("key").long("key").short('k').action(ArgAction::Set).help("Selected option key"))
                .arg(Arg::new("text").long("text").short('t').action(ArgAction::Set).help("Selected option label"))
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .action(ArgAction::SetTrue)
                        .conflicts_with_all(["key", "text"])
                        .help("Clear the selection"),
                ),
        )
}

/// Host binding backed by the loaded document.
#[derive(Debug)]
struct DocumentHost {
    bound_value: BoundValue,
    changed: bool,
}

impl HostBinding for DocumentHost {
    fn bound_value(&self) -> BoundValue {
        self.bound_value.clone()
    }

    fn set_bound_value(&mut self, value: BoundValue) {
        self.bound_value = value;
    }

    fn notify_changed(&mut self) {
        self.changed = true;
    }
}

fn load_document(matches: &ArgMatches) -> Result<ControlDocument> {
    let file = matches.get_one::<String>("file").context("missing control document path")?;
    parse_control_file(file)
}

fn run_query_cmd(matches: &ArgMatches) -> Result<()> {
    let document = load_document(matches)?;
    let pending = ControlSession::new(&document.control).start_cycle(&document.view_input());
    let query = pending.query().map_err(|error| anyhow::anyhow!("{error}"))?;
    println!("{query}");
    Ok(())
}

async fn run_resolve_cmd(matches: &ArgMatches) -> Result<()> {
    let document = load_document(matches)?;
    let fetcher = build_fetcher(&document, matches)?;

    let mut session = ControlSession::new(&document.control);
    let mut host = DocumentHost {
        bound_value: document.bound_value.clone(),
        changed: false,
    };

    let pending = session.start_cycle(&document.view_input());
    let query = pending.query().ok().map(str::to_string);
    let completed = pending.fetch(fetcher.as_ref()).await;
    let render = session
        .complete_cycle(completed, &mut host)
        .context("cycle result was superseded")?;
    debug!(state = ?session.cycle_state(), "cycle applied");

    let output = serde_json::json!({
        "query": query,
        "render": render,
        "bound_value": host.bound_value,
        "changed": host.changed,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn build_fetcher(document: &ControlDocument, matches: &ArgMatches) -> Result<Box<dyn RecordFetcher>> {
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        let mut fetcher = WebApiFetcher::new(base_url)?;
        if let Some(variable) = matches.get_one::<String>("token-env")
            && let Ok(token) = std::env::var(variable)
        {
            fetcher = fetcher.with_bearer_token(token);
        }
        return Ok(Box::new(fetcher));
    }

    let records = match matches.get_one::<String>("records") {
        Some(path) => load_records(Path::new(path))?,
        None => Vec::new(),
    };
    Ok(Box::new(StaticFetcher::new().with_records(document.control.entity_type.trim(), records)))
}

fn load_records(path: &Path) -> Result<Vec<picklist_types::Record>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read records file: {}", path.display()))?;
    let payload: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON records file: {}", path.display()))?;
    Ok(records_from_json(payload)?)
}

fn run_select_cmd(matches: &ArgMatches) -> Result<()> {
    let document = load_document(matches)?;
    let event = if matches.get_flag("clear") {
        SelectionEvent::Cleared
    } else {
        SelectionEvent::from_pair(matches.get_one::<String>("key").cloned(), matches.get_one::<String>("text").cloned())
    };
    let value = decode_event(&event, &document.control.binding);
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_directives_control_verbosity() {
        tracing::subscriber::with_default(log_subscriber(Some("debug".into())), || {
            assert!(tracing::enabled!(tracing::Level::DEBUG));
        });
        tracing::subscriber::with_default(log_subscriber(None), || {
            assert!(tracing::enabled!(tracing::Level::INFO));
            assert!(!tracing::enabled!(tracing::Level::DEBUG));
        });
        tracing::subscriber::with_default(log_subscriber(Some("picklist_engine=debug".into())), || {
            assert!(!tracing::enabled!(tracing::Level::DEBUG));
        });
    }

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn select_requires_no_key_when_clearing() {
        let matches = build_cli()
            .try_get_matches_from(["picklist", "select", "control.yaml", "--clear"])
            .expect("parse");
        let (_, sub) = matches.subcommand().expect("subcommand");
        assert!(sub.get_flag("clear"));
        assert!(
            build_cli()
                .try_get_matches_from(["picklist", "select", "control.yaml", "--clear", "--key", "1"])
                .is_err()
        );
    }

    #[test]
    fn records_file_accepts_collection_envelope() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("records.json");
        fs::write(&path, r#"{"value":[{"accountid":"a-1","name":"Contoso"}]}"#).unwrap();
        let records = load_records(&path).expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("name").as_deref(), Some("Contoso"));
    }

    #[test]
    fn document_host_records_change_notification() {
        let mut host = DocumentHost {
            bound_value: BoundValue::Scalar(serde_json::json!("a-1")),
            changed: false,
        };
        host.set_bound_value(BoundValue::Empty);
        host.notify_changed();
        assert!(host.changed);
        assert!(host.bound_value().is_empty());
    }
}
