//! CLI command implementations
//!
//! Each invocation:
//! 1. Loads the configuration (defaults when the file is absent)
//! 2. Loads the store file and the universe source
//! 3. Builds an engine over the hackathon registry
//! 4. Runs one operation as the requested identity
//! 5. Saves the store after a successful write

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::engine::{CreateOp, DeleteOp, Engine, Operation, ReadOp, UpdateOp};
use crate::hackathon;
use crate::observability;
use crate::schema::SchemaRegistry;
use crate::store::{InMemoryStore, SortSpec};
use crate::universe::{JsonFileSource, StaticUniverse, UniverseCache, UniverseState, UniverseStateProvider};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{parse_json_arg, read_request, write_error, write_response};

/// Parse arguments, then run the command on a tokio runtime
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = EngineConfig::load_or_default(&cli.config)?;
    observability::init_tracing(&config.log_filter);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run_command(cli, config))
}

/// Run one parsed command
pub async fn run_command(cli: Cli, config: EngineConfig) -> CliResult<()> {
    let registry = Arc::new(hackathon::registry()?);

    if let Command::Layout { object_type } = &cli.command {
        return write_response(layout(&registry, object_type)?);
    }

    let requester = cli.identity.requester();
    let operation = to_operation(cli.command)?;

    let store = Arc::new(InMemoryStore::load(&config.store_path).await?);
    let universe = universe_provider(&config);
    let engine = Engine::new(registry, store.clone(), universe).with_config(config.clone());

    let mutates = !matches!(operation, Operation::Read(_) | Operation::FetchOne(_));
    let name = operation.name();

    match operation.execute(&engine, &requester).await {
        Ok(data) => {
            if mutates {
                store.save(&config.store_path).await?;
                info!(operation = name, path = %config.store_path.display(), "store saved");
            }
            write_response(data)
        }
        Err(err) => {
            write_error(err.code(), &engine.public_message(&err, &requester))?;
            Err(CliError::RequestFailed(err.code()))
        }
    }
}

/// Persisted dot paths of an object type
pub fn layout(registry: &SchemaRegistry, object_type: &str) -> CliResult<Value> {
    let schema = registry
        .get(object_type)
        .ok_or_else(|| CliError::invalid_argument(format!("unknown object type '{}'", object_type)))?;
    Ok(json!(schema.persisted_paths()))
}

/// Translate a subcommand into the equivalent serialized operation
pub fn to_operation(command: Command) -> CliResult<Operation> {
    let operation = match command {
        Command::Read {
            object_type,
            filter,
            page,
            size,
            sort,
            desc,
        } => Operation::Read(ReadOp {
            object_type,
            filter: Some(parse_json_arg("filter", &filter)?),
            sort: sort.map(|field| if desc { SortSpec::desc(field) } else { SortSpec::asc(field) }),
            page,
            size,
        }),
        Command::Create {
            object_type,
            submission,
        } => Operation::Create(CreateOp {
            object_type,
            submission: parse_json_arg("submission", &submission)?,
        }),
        Command::Update {
            object_type,
            filter,
            submission,
            submit,
            returning,
        } => Operation::Update(UpdateOp {
            object_type,
            filter: parse_json_arg("filter", &filter)?,
            submission: parse_json_arg("submission", &submission)?,
            submit,
            returning,
        }),
        Command::Delete { object_type, filter } => Operation::Delete(DeleteOp {
            object_type,
            filter: parse_json_arg("filter", &filter)?,
        }),
        Command::Exec => serde_json::from_value(read_request()?)?,
        Command::Layout { .. } => {
            return Err(CliError::invalid_argument("layout is not an engine operation"));
        }
    };
    Ok(operation)
}

/// Cached file-backed universe, or the current instant with no deadlines
/// when the file is absent
fn universe_provider(config: &EngineConfig) -> Arc<dyn UniverseStateProvider> {
    if config.universe_path.exists() {
        Arc::new(UniverseCache::new(
            JsonFileSource::new(&config.universe_path),
            config.universe_ttl(),
        ))
    } else {
        warn!(
            path = %config.universe_path.display(),
            "universe file not found; using an empty universe"
        );
        Arc::new(StaticUniverse::new(UniverseState::default()))
    }
}
