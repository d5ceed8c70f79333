//! Request builder trait and the template-driven implementation

use super::types::HttpRequest;
use crate::error::{Error, Result};
use crate::pagination::PageCursor;
use crate::slice::Slice;
use crate::state::StreamState;
use crate::template::{self, TemplateContext};
use crate::types::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Turns (checkpoint, slice, page cursor) into the next outbound request
pub trait RequestBuilder: Send + Sync + std::fmt::Debug {
    fn build_request(
        &self,
        state: Option<&StreamState>,
        slice: &Slice,
        cursor: Option<&PageCursor>,
    ) -> Result<HttpRequest>;
}

/// Send the stream's checkpoint as a request parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateParam {
    /// Query parameter name, e.g. `updated_since`
    pub param: String,
    /// Checkpoint key to read
    pub cursor_field: String,
}

/// Request built from templated parts.
///
/// Parameters merge in this order, later entries winning: page defaults,
/// static params, slice params, the state param, then page cursor params.
#[derive(Debug, Clone, Default)]
pub struct RequestTemplate {
    pub method: Method,
    pub path: String,
    /// Parameters sent with every page, typically the page size
    pub default_params: BTreeMap<String, Value>,
    /// Templated parameters (filters, locale and the like)
    pub params: BTreeMap<String, Value>,
    /// Request parameter name to slice key
    pub slice_params: BTreeMap<String, String>,
    pub state_param: Option<StateParam>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    /// User configuration available to templates as `config.*`
    pub config: Value,
}

impl RequestTemplate {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_default_params(mut self, params: BTreeMap<String, Value>) -> Self {
        self.default_params.extend(params);
        self
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn slice_param(mut self, param: impl Into<String>, slice_key: impl Into<String>) -> Self {
        self.slice_params.insert(param.into(), slice_key.into());
        self
    }

    #[must_use]
    pub fn with_state_param(
        mut self,
        param: impl Into<String>,
        cursor_field: impl Into<String>,
    ) -> Self {
        self.state_param = Some(StateParam {
            param: param.into(),
            cursor_field: cursor_field.into(),
        });
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn context(&self, state: Option<&StreamState>, slice: &Slice) -> TemplateContext {
        TemplateContext::with_config(self.config.clone())
            .slice(slice.to_value())
            .state(state.map_or(Value::Null, StreamState::to_value))
            .with_clock()
    }
}

impl RequestBuilder for RequestTemplate {
    fn build_request(
        &self,
        state: Option<&StreamState>,
        slice: &Slice,
        cursor: Option<&PageCursor>,
    ) -> Result<HttpRequest> {
        let ctx = self.context(state, slice);

        let mut headers = BTreeMap::new();
        for (key, value) in &self.headers {
            headers.insert(key.clone(), template::render(value, &ctx)?);
        }
        let body = self
            .body
            .as_ref()
            .map(|b| template::render_value(b, &ctx))
            .transpose()?;

        // A next-page URL already carries every parameter of the first request
        if let Some(url) = cursor.and_then(|c| c.url.as_ref()) {
            return Ok(HttpRequest {
                method: self.method,
                path: url.clone(),
                params: cursor.map(|c| c.params.clone()).unwrap_or_default(),
                headers,
                body,
            });
        }

        let mut params = self.default_params.clone();
        for (key, value) in &self.params {
            params.insert(key.clone(), template::render_value(value, &ctx)?);
        }

        for (param, slice_key) in &self.slice_params {
            let value = slice
                .get(slice_key)
                .filter(|v| !v.is_null())
                .ok_or_else(|| Error::undefined_var(format!("slice.{slice_key}")))?;
            params.insert(param.clone(), value.clone());
        }

        if let Some(sp) = &self.state_param {
            if let Some(value) = state.and_then(|s| s.get(&sp.cursor_field)) {
                params.insert(sp.param.clone(), value.clone());
            }
        }

        if let Some(cursor) = cursor {
            params.extend(cursor.params.clone());
        }

        Ok(HttpRequest {
            method: self.method,
            path: template::render_path(&self.path, &ctx)?,
            params,
            headers,
            body,
        })
    }
}
