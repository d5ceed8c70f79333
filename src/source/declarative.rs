//! `Source` backed by a declarative connector definition

use super::types::{
    Catalog, CatalogStream, CheckResult, ConnectorSpec, Message, MessageStream, ReadSettings,
    Source,
};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::loader::{build_client, build_streams, ConnectorDefinition};
use crate::request::HttpRequest;
use crate::state::State;
use crate::stream::{HttpStream, ReadLoop, ReadOptions};
use crate::template::{self, TemplateContext};
use crate::types::SyncMode;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{error, info, warn};

/// A source driven entirely by a `ConnectorDefinition`
#[derive(Debug, Clone)]
pub struct DeclarativeSource {
    definition: ConnectorDefinition,
    settings: ReadSettings,
}

impl DeclarativeSource {
    pub fn new(definition: ConnectorDefinition) -> Self {
        Self {
            definition,
            settings: ReadSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ReadSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn definition(&self) -> &ConnectorDefinition {
        &self.definition
    }

    pub fn settings(&self) -> ReadSettings {
        self.settings
    }

    /// Validated config with declared defaults filled in
    fn prepare_config(&self, config: &Value) -> Result<Value> {
        let config = self.definition.config_with_defaults(config);
        self.definition.validate_config(&config)?;
        Ok(config)
    }

    fn build(&self, config: &Value) -> Result<(Arc<HttpClient>, Vec<Arc<HttpStream>>)> {
        let config = self.prepare_config(config)?;
        let client = build_client(&self.definition, &config)?;
        let streams = build_streams(&self.definition, &config, &client)?;
        Ok((client, streams))
    }

    async fn run_check(&self, config: &Value) -> Result<()> {
        let (client, streams) = self.build(config)?;
        let check = self.definition.check.clone().unwrap_or_default();

        if let Some(path) = &check.path {
            let ctx = TemplateContext::with_config(self.prepare_config(config)?);
            let mut request = HttpRequest::get(template::render(path, &ctx)?);
            for (key, value) in &check.params {
                request = request.param(key.clone(), template::render_value(value, &ctx)?);
            }
            client.send(&request).await?;
            return Ok(());
        }

        // Without an explicit target, the first top-level stream stands in
        let stream = match &check.stream {
            Some(name) => streams.iter().find(|s| s.name() == name),
            None => streams.iter().find(|s| s.descriptor().parent.is_none()),
        }
        .ok_or_else(|| Error::ConnectionCheck {
            message: "No stream available to check the connection with".to_string(),
        })?;

        info!(stream = stream.name(), "Checking connection");
        let mut read = stream.read(None, ReadOptions::new().with_max_records(1));
        read.next_record().await?;
        Ok(())
    }
}

#[async_trait]
impl Source for DeclarativeSource {
    fn spec(&self) -> ConnectorSpec {
        let def = &self.definition;
        ConnectorSpec {
            name: def.name.clone(),
            title: def.title.clone().unwrap_or_else(|| def.name.clone()),
            version: def.version.clone(),
            description: def.description.clone(),
            config: def.config.clone(),
        }
    }

    fn discover(&self) -> Catalog {
        let streams = self
            .definition
            .streams
            .iter()
            .map(|s| CatalogStream {
                name: s.name.clone(),
                json_schema: json!({"type": "object"}),
                supported_sync_modes: if s.incremental.is_some() {
                    vec![SyncMode::FullRefresh, SyncMode::Incremental]
                } else {
                    vec![SyncMode::FullRefresh]
                },
                default_cursor_field: s
                    .incremental
                    .as_ref()
                    .map(|inc| vec![inc.cursor_field.clone()]),
                source_defined_primary_key: s
                    .primary_key
                    .as_ref()
                    .map(|keys| keys.iter().map(|k| vec![k.clone()]).collect()),
                parent: s.parent().map(str::to_string),
            })
            .collect();

        Catalog { streams }
    }

    async fn check_connection(&self, config: &Value) -> CheckResult {
        match self.run_check(config).await {
            Ok(()) => {
                info!(connector = %self.definition.name, "Connection check succeeded");
                CheckResult::success()
            }
            Err(e) => {
                warn!(connector = %self.definition.name, error = %e, "Connection check failed");
                CheckResult::failure(e.to_string())
            }
        }
    }

    fn streams(&self, config: &Value) -> Result<Vec<Arc<HttpStream>>> {
        self.build(config).map(|(_, streams)| streams)
    }

    async fn read(
        &self,
        config: &Value,
        selection: Option<&[String]>,
        state: Option<&State>,
    ) -> Result<MessageStream> {
        let streams = self.streams(config)?;

        let queue: VecDeque<Arc<HttpStream>> = match selection {
            None => streams.into_iter().collect(),
            Some(names) => {
                if let Some(unknown) = names.iter().find(|n| self.definition.stream(n).is_none()) {
                    return Err(Error::StreamNotFound {
                        stream: unknown.clone(),
                    });
                }
                // Declaration order wins over selection order
                streams
                    .into_iter()
                    .filter(|s| names.iter().any(|n| n == s.name()))
                    .collect()
            }
        };

        info!(
            connector = %self.definition.name,
            streams = queue.len(),
            "Starting read"
        );

        let run = ReadRun {
            queue,
            current: None,
            pending: VecDeque::new(),
            state: state.cloned().unwrap_or_default(),
            settings: self.settings,
            since_checkpoint: 0,
            halted: false,
        };

        Ok(stream::unfold(run, |mut run| async move {
            run.next_message().await.map(|msg| (msg, run))
        })
        .boxed())
    }
}

// ============================================================================
// Read Run
// ============================================================================

/// Streams read one after another, each to completion
struct ReadRun {
    queue: VecDeque<Arc<HttpStream>>,
    current: Option<ReadLoop>,
    pending: VecDeque<Message>,
    state: State,
    settings: ReadSettings,
    since_checkpoint: usize,
    halted: bool,
}

impl ReadRun {
    fn read_options(&self) -> ReadOptions {
        match self.settings.max_records {
            Some(max) => ReadOptions::new().with_max_records(max),
            None => ReadOptions::new(),
        }
    }

    async fn next_message(&mut self) -> Option<Result<Message>> {
        loop {
            if let Some(msg) = self.pending.pop_front() {
                return Some(Ok(msg));
            }
            if self.halted {
                return None;
            }

            let Some(read) = self.current.as_mut() else {
                let stream = self.queue.pop_front()?;
                info!(stream = stream.name(), "Reading stream");
                let start = self.state.get_stream(stream.name()).cloned();
                self.current = Some(stream.read(start, self.read_options()));
                self.since_checkpoint = 0;
                continue;
            };

            match read.next_record().await {
                Ok(Some(record)) => {
                    let name = read.stream_name().to_string();
                    self.since_checkpoint += 1;
                    self.pending.push_back(Message::record(&name, record));

                    let every = self.settings.checkpoint_every;
                    if every > 0 && self.since_checkpoint >= every {
                        self.since_checkpoint = 0;
                        if let Some(checkpoint) = read.checkpoint() {
                            self.pending.push_back(Message::state(&name, checkpoint));
                        }
                    }
                }
                Ok(None) => {
                    let name = read.stream_name().to_string();
                    let stats = read.stats();
                    info!(
                        stream = %name,
                        records = stats.records,
                        pages = stats.pages,
                        slices = stats.slices,
                        "Finished stream"
                    );
                    if let Some(checkpoint) = read.checkpoint().cloned() {
                        self.pending.push_back(Message::state(&name, &checkpoint));
                        self.state.set_stream(&name, checkpoint);
                    }
                    self.current = None;
                }
                Err(e) => {
                    let name = read.stream_name().to_string();
                    self.current = None;
                    error!(stream = %name, error = %e, "Stream failed");
                    if self.settings.fail_fast {
                        self.halted = true;
                        return Some(Err(e));
                    }
                    self.pending
                        .push_back(Message::error(format!("Stream '{name}' failed: {e}")));
                }
            }
        }
    }
}
