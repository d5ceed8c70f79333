//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::connectors::list_builtin_info;
use crate::error::{Error, Result, ResultExt};
use crate::loader::{load_connector, ConnectorDefinition};
use crate::source::{DeclarativeSource, Message, ReadSettings, Source};
use crate::state::{StateManager, StreamState};
use futures::StreamExt;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

/// Options of the `read` subcommand
#[derive(Debug, Clone, Default)]
struct ReadArgs {
    streams: Option<String>,
    config_json: Option<String>,
    settings: ReadSettings,
    state_out: Option<PathBuf>,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
    out: Mutex<Box<dyn Write + Send>>,
}

impl Runner {
    /// Create a runner writing messages to stdout
    pub fn new(cli: Cli) -> Self {
        Self::with_writer(cli, Box::new(io::stdout()))
    }

    /// Create a runner writing messages to `out`
    pub fn with_writer(cli: Cli, out: Box<dyn Write + Send>) -> Self {
        Self {
            cli,
            out: Mutex::new(out),
        }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(),
            Commands::Check { config_json } => self.check(config_json.as_deref()).await,
            Commands::Discover => self.discover(),
            Commands::Read {
                streams,
                config_json,
                max_records,
                checkpoint_every,
                fail_fast,
                state_out,
            } => {
                let mut settings = ReadSettings::default().with_checkpoint_every(*checkpoint_every);
                if let Some(max) = max_records {
                    settings = settings.with_max_records(*max);
                }
                if *fail_fast {
                    settings = settings.fail_fast();
                }
                self.read(ReadArgs {
                    streams: streams.clone(),
                    config_json: config_json.clone(),
                    settings,
                    state_out: state_out.clone(),
                })
                .await
            }
            Commands::Validate => self.validate(),
            Commands::List => self.list_connectors(),
        }
    }

    /// Load connector definition
    fn load_connector(&self) -> Result<ConnectorDefinition> {
        let path = self
            .cli
            .connector
            .as_ref()
            .ok_or_else(|| Error::config("Connector not specified (use -c flag)"))?;
        load_connector(path)
    }

    /// Load configuration
    fn load_config(&self, inline: Option<&str>) -> Result<Value> {
        // Inline config takes precedence
        if let Some(json_str) = inline {
            return serde_json::from_str(json_str)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
        }

        if let Some(path) = &self.cli.config {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;
            return serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
        }

        Ok(json!({}))
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Show spec
    fn spec(&self) -> Result<()> {
        let connector = self.load_connector()?;
        let spec = DeclarativeSource::new(connector).spec();

        let mut properties = Map::new();
        for field in &spec.config {
            let mut property = json!({ "type": field.field_type });
            if let Some(description) = &field.description {
                property["description"] = json!(description);
            }
            if field.secret {
                property["secret"] = json!(true);
            }
            if let Some(default) = &field.default {
                property["default"] = default.clone();
            }
            properties.insert(field.name.clone(), property);
        }
        let required: Vec<&str> = spec
            .config
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        self.output_message(&json!({
            "type": "SPEC",
            "spec": {
                "name": spec.name,
                "title": spec.title,
                "version": spec.version,
                "description": spec.description,
                "connectionSpecification": {
                    "type": "object",
                    "title": spec.title,
                    "properties": properties,
                    "required": required
                }
            }
        }))
    }

    /// Check connection
    async fn check(&self, config_json: Option<&str>) -> Result<()> {
        let connector = self.load_connector()?;
        let config = self.load_config(config_json)?;

        self.output_message(&json!({
            "type": "LOG",
            "level": "INFO",
            "message": format!("Checking connection to {}", connector.name)
        }))?;

        let result = DeclarativeSource::new(connector)
            .check_connection(&config)
            .await;

        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": {
                "status": if result.success { "SUCCEEDED" } else { "FAILED" },
                "message": result.message.unwrap_or_else(|| "Connection successful".to_string())
            }
        }))
    }

    /// Discover streams
    fn discover(&self) -> Result<()> {
        let connector = self.load_connector()?;
        let catalog = DeclarativeSource::new(connector).discover();

        self.output_message(&json!({
            "type": "CATALOG",
            "catalog": catalog
        }))
    }

    /// Read streams, printing each message and persisting checkpoints
    async fn read(&self, args: ReadArgs) -> Result<()> {
        let sync_start = Instant::now();
        let connector = self.load_connector()?;
        let config = self.load_config(args.config_json.as_deref())?;
        let state = self.load_state()?;

        let selection: Option<Vec<String>> = args.streams.as_deref().map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        });
        let selection = selection.filter(|s| !s.is_empty());

        let connector_name = connector.name.clone();
        let source = DeclarativeSource::new(connector).with_settings(args.settings);
        let initial = state.snapshot().await;

        info!(
            connector = %connector_name,
            streams = ?selection,
            "Starting sync"
        );

        let mut messages = source
            .read(&config, selection.as_deref(), Some(&initial))
            .await?;

        let mut records: BTreeMap<String, usize> = BTreeMap::new();
        let mut failed: Vec<String> = Vec::new();

        while let Some(msg) = messages.next().await {
            let msg = msg?;
            match &msg {
                Message::Record { stream, .. } => {
                    *records.entry(stream.clone()).or_default() += 1;
                }
                Message::State { stream, data } => {
                    let checkpoint: StreamState = serde_json::from_value(data.clone())?;
                    state.set_stream_state(stream, checkpoint).await?;
                }
                Message::Log { message, .. } => {
                    if let Some(stream) = failed_stream(message) {
                        failed.push(stream);
                    }
                }
            }
            self.output_message(&serde_json::to_value(&msg)?)?;
        }

        if let Some(path) = &args.state_out {
            state
                .save_to_file(path)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!(path = %path.display(), "Wrote final state");
        }

        let total_records: usize = records.values().sum();
        let duration_ms = sync_start.elapsed().as_millis() as u64;
        info!(
            connector = %connector_name,
            records = total_records,
            failed = failed.len(),
            duration_ms,
            "Sync finished"
        );

        self.output_message(&json!({
            "type": "SYNC_SUMMARY",
            "summary": {
                "status": if failed.is_empty() { "SUCCEEDED" } else { "PARTIAL" },
                "connector": connector_name,
                "total_records": total_records,
                "records": records,
                "failed_streams": failed,
                "duration_ms": duration_ms,
                "state": state.snapshot().await
            }
        }))
    }

    /// Validate connector definition
    fn validate(&self) -> Result<()> {
        let connector = self.load_connector()?;

        self.output_message(&json!({
            "type": "LOG",
            "level": "INFO",
            "message": format!(
                "Connector '{}' v{} is valid with {} streams",
                connector.name,
                connector.version,
                connector.streams.len()
            )
        }))
    }

    /// List built-in connectors
    fn list_connectors(&self) -> Result<()> {
        self.output_message(&json!({
            "type": "CONNECTORS",
            "connectors": list_builtin_info()
        }))
    }

    /// Write one message
    fn output_message(&self, msg: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        let mut out = self
            .out
            .lock()
            .map_err(|_| Error::Other("Output writer poisoned".to_string()))?;
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

/// Stream name of a "Stream 'x' failed: ..." log line
fn failed_stream(message: &str) -> Option<String> {
    let rest = message.strip_prefix("Stream '")?;
    let (name, tail) = rest.split_once('\'')?;
    tail.starts_with(" failed").then(|| name.to_string())
}
