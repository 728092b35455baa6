use std::sync::Arc;

use astral_chat::responder::DecodeSnafu;
use astral_chat::{
    AdminService, BoxFuture, ChatReply, ChatRequest, ChatResponder, ModelInfo, ResponderError,
    ResponderResult, UrlCheckRequest, UrlChecker, UrlVerdict,
};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use snafu::ResultExt;

use crate::settings::AppSettings;

/// Absolute URLs of every backend endpoint the widget calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub chat: String,
    pub url_check: String,
    pub model_info: String,
    pub reload_model: String,
}

impl Endpoints {
    pub fn from_settings(settings: &AppSettings) -> Self {
        let base = settings.server_url.trim_end_matches('/');
        Self {
            chat: format!("{base}{}", settings.chat_path),
            url_check: format!("{base}{}", settings.url_check_path),
            model_info: format!("{base}{}", settings.model_info_path),
            reload_model: format!("{base}{}", settings.reload_model_path),
        }
    }

    /// Default endpoint paths below `server_url`.
    pub fn with_server_url(server_url: impl Into<String>) -> Self {
        Self::from_settings(
            &AppSettings {
                server_url: server_url.into(),
                ..AppSettings::default()
            }
            .normalized(),
        )
    }
}

/// JSON-over-HTTP implementation of every responder seam.
pub struct HttpResponder {
    client: Client,
    endpoints: Endpoints,
}

impl HttpResponder {
    /// Calls carry no request timeout: a reply that never comes keeps its send pending.
    pub fn new(endpoints: Endpoints) -> ResponderResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(transport("build-http-client"))?;

        Ok(Self { client, endpoints })
    }

    pub fn from_settings(settings: &AppSettings) -> ResponderResult<Self> {
        Self::new(Endpoints::from_settings(settings))
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Reads the body as JSON whatever the status code; only a non-JSON body is an error.
    async fn send_json(&self, request: RequestBuilder, stage: &'static str) -> ResponderResult<Value> {
        let response = request.send().await.map_err(transport(stage))?;
        let status = response.status();
        let body = response.text().await.map_err(transport(stage))?;

        if !status.is_success() {
            tracing::warn!(stage, status = status.as_u16(), "responder answered with error status");
        }

        serde_json::from_str(&body)
            .inspect_err(|error| {
                tracing::warn!(stage, %error, body_len = body.len(), "responder body is not json");
            })
            .context(DecodeSnafu { stage })
    }
}

impl ChatResponder for HttpResponder {
    fn respond<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, ResponderResult<ChatReply>> {
        Box::pin(async move {
            tracing::debug!(endpoint = %self.endpoints.chat, "sending chat request");
            let builder = self.client.post(&self.endpoints.chat).json(&request);
            let payload = self.send_json(builder, "chat-request").await?;
            Ok(ChatReply::from_json(&payload))
        })
    }
}

impl UrlChecker for HttpResponder {
    fn check<'a>(&'a self, request: UrlCheckRequest) -> BoxFuture<'a, ResponderResult<UrlVerdict>> {
        Box::pin(async move {
            tracing::debug!(endpoint = %self.endpoints.url_check, "sending url check");
            let builder = self.client.post(&self.endpoints.url_check).json(&request);
            let payload = self.send_json(builder, "url-check-request").await?;
            Ok(UrlVerdict::from_json(&payload))
        })
    }
}

impl AdminService for HttpResponder {
    fn model_info<'a>(&'a self) -> BoxFuture<'a, ResponderResult<ModelInfo>> {
        Box::pin(async move {
            let builder = self.client.get(&self.endpoints.model_info);
            let payload = self.send_json(builder, "model-info-request").await?;
            Ok(ModelInfo::new(payload))
        })
    }

    fn reload_model<'a>(&'a self, token: String) -> BoxFuture<'a, ResponderResult<Value>> {
        Box::pin(async move {
            tracing::info!(endpoint = %self.endpoints.reload_model, "requesting model reload");
            let builder = self
                .client
                .post(&self.endpoints.reload_model)
                .bearer_auth(token);
            self.send_json(builder, "reload-model-request").await
        })
    }
}

/// The three responder seams the widget needs, each shared with in-flight requests.
#[derive(Clone)]
pub struct Responders {
    pub chat: Arc<dyn ChatResponder>,
    pub url_check: Arc<dyn UrlChecker>,
    pub admin: Arc<dyn AdminService>,
}

impl Responders {
    /// HTTP responders for `settings`. If the client cannot be built, every call fails with
    /// the build error instead.
    pub fn from_settings(settings: &AppSettings) -> Self {
        match HttpResponder::from_settings(settings) {
            Ok(http) => {
                let http = Arc::new(http);
                Self {
                    chat: http.clone(),
                    url_check: http.clone(),
                    admin: http,
                }
            }
            Err(error) => {
                tracing::error!(%error, "http responder unavailable");
                let unavailable = Arc::new(Unavailable {
                    reason: error.to_string(),
                });
                Self {
                    chat: unavailable.clone(),
                    url_check: unavailable.clone(),
                    admin: unavailable,
                }
            }
        }
    }
}

struct Unavailable {
    reason: String,
}

impl Unavailable {
    fn fail<T>(&self, stage: &'static str) -> ResponderResult<T> {
        Err(ResponderError::Transport {
            stage,
            source: self.reason.clone().into(),
        })
    }
}

impl ChatResponder for Unavailable {
    fn respond<'a>(&'a self, _request: ChatRequest) -> BoxFuture<'a, ResponderResult<ChatReply>> {
        Box::pin(async move { self.fail("chat-request") })
    }
}

impl UrlChecker for Unavailable {
    fn check<'a>(&'a self, _request: UrlCheckRequest) -> BoxFuture<'a, ResponderResult<UrlVerdict>> {
        Box::pin(async move { self.fail("url-check-request") })
    }
}

impl AdminService for Unavailable {
    fn model_info<'a>(&'a self) -> BoxFuture<'a, ResponderResult<ModelInfo>> {
        Box::pin(async move { self.fail("model-info-request") })
    }

    fn reload_model<'a>(&'a self, _token: String) -> BoxFuture<'a, ResponderResult<Value>> {
        Box::pin(async move { self.fail("reload-model-request") })
    }
}

fn transport(stage: &'static str) -> impl FnOnce(reqwest::Error) -> ResponderError {
    move |source| ResponderError::Transport {
        stage,
        source: Box::new(source),
    }
}
