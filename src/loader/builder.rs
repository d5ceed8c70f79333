//! Runtime construction from connector definitions
//!
//! Turns a validated `ConnectorDefinition` plus user config into a shared
//! `HttpClient` and the `HttpStream`s it serves.

use crate::error::{Error, Result};
use crate::extract::JsonExtractor;
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::loader::types::{ConnectorDefinition, StreamDefinition};
use crate::request::RequestTemplate;
use crate::slice::{ListSlices, ParentSlices, SliceConfig, SliceProvider};
use crate::stream::{ErrorPolicy, HttpStream, StreamDescriptor};
use crate::template::{self, TemplateContext};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Build the HTTP client shared by every stream of a run
pub fn build_client(def: &ConnectorDefinition, config: &Value) -> Result<Arc<HttpClient>> {
    let ctx = TemplateContext::with_config(config.clone());
    let base_url = template::render(&def.base_url, &ctx)?;

    let mut builder = HttpClientConfig::builder()
        .base_url(base_url.clone())
        .timeout(Duration::from_secs(def.http.timeout_secs))
        .max_retries(def.http.max_retries)
        .backoff(
            def.http.backoff,
            Duration::from_millis(def.http.backoff_initial_ms),
            Duration::from_secs(def.http.backoff_max_secs),
        );

    builder = match def.http.rate_limit_rps {
        Some(rps) if rps > 0 => builder.rate_limit(RateLimiterConfig::new(rps, rps)),
        _ => builder.no_rate_limit(),
    };

    if let Some(agent) = &def.http.user_agent {
        builder = builder.user_agent(agent.clone());
    }

    for (key, value) in &def.headers {
        builder = builder.header(key.clone(), template::render(value, &ctx)?);
    }

    let auth = def.auth.resolve(&ctx, &base_url)?;
    debug!(connector = %def.name, auth = auth.kind(), base_url = %base_url, "Built HTTP client");

    Ok(Arc::new(HttpClient::with_auth(builder.build(), auth)?))
}

/// Build every stream in declaration order.
///
/// Parents are always built first, so a child's slicer holds the very
/// `Arc` the source hands out for the parent.
pub fn build_streams(
    def: &ConnectorDefinition,
    config: &Value,
    client: &Arc<HttpClient>,
) -> Result<Vec<Arc<HttpStream>>> {
    let mut built: Vec<Arc<HttpStream>> = Vec::with_capacity(def.streams.len());
    let mut by_name: HashMap<String, Arc<HttpStream>> = HashMap::new();

    for stream_def in &def.streams {
        let stream = Arc::new(build_stream(stream_def, config, client, &by_name)?);
        by_name.insert(stream_def.name.clone(), Arc::clone(&stream));
        built.push(stream);
    }

    Ok(built)
}

fn build_stream(
    def: &StreamDefinition,
    config: &Value,
    client: &Arc<HttpClient>,
    built: &HashMap<String, Arc<HttpStream>>,
) -> Result<HttpStream> {
    let paginator = def.pagination.build();

    let requester = RequestTemplate {
        method: def.request.method,
        path: def.request.path.clone(),
        default_params: paginator.initial_params(),
        params: def.request.params.clone(),
        slice_params: def.request.slice_params.clone(),
        state_param: def.request.state_param.clone(),
        headers: def.request.headers.clone(),
        body: def.request.body.clone(),
        config: config.clone(),
    };

    let extractor =
        JsonExtractor::new(def.response.clone()).with_transforms(def.transforms.clone());

    let mut descriptor = StreamDescriptor::new(def.name.clone(), def.request.path.clone());
    if let Some(key) = &def.primary_key {
        descriptor = descriptor.with_primary_key(key.clone());
    }
    if let Some(parent) = def.parent() {
        descriptor = descriptor.with_parent(parent);
    }

    let mut stream = HttpStream::new(
        descriptor,
        Arc::clone(client),
        Arc::new(requester),
        Arc::new(extractor),
    )
    .with_paginator(paginator)
    .with_error_policy(ErrorPolicy::suppress(def.suppress_http_errors.iter().copied()));

    if let Some(slicing) = &def.slicing {
        stream = stream.with_slicer(build_slicer(&def.name, slicing, built)?);
    }

    if let Some(incremental) = &def.incremental {
        stream = stream.with_incremental(incremental.clone());
    }

    Ok(stream)
}

fn build_slicer(
    stream: &str,
    slicing: &SliceConfig,
    built: &HashMap<String, Arc<HttpStream>>,
) -> Result<Arc<dyn SliceProvider>> {
    Ok(match slicing {
        SliceConfig::Parent {
            stream: parent,
            fields,
            exclude,
        } => {
            let parent = built.get(parent).ok_or_else(|| {
                Error::slice(stream, format!("parent stream '{parent}' is not built yet"))
            })?;
            let mut provider = ParentSlices::new(Arc::clone(parent), fields.clone());
            if let Some(exclude) = exclude {
                provider = provider.with_exclusion(exclude.clone());
            }
            Arc::new(provider)
        }
        SliceConfig::List { key, values } => Arc::new(ListSlices::new(key.clone(), values.clone())),
    })
}
