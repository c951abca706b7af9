use futures::future::BoxFuture;
use parlor_protocol::{Request, Response};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientCoreError, TransportError};

/// Carries one request to the server and returns its reply.
pub trait Transport: Send + Sync {
	fn request(&self, request: Request) -> BoxFuture<'static, Result<Response, TransportError>>;
}

/// JSON-over-HTTP POST transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	http: reqwest::Client,
	base_url: String,
}

impl HttpTransport {
	pub fn new(config: &ClientConfig) -> Result<Self, ClientCoreError> {
		let http = reqwest::Client::builder()
			.user_agent(config.user_agent.clone())
			.timeout(config.request_timeout)
			.build()
			.map_err(|e| ClientCoreError::Other(format!("build http client: {e}")))?;
		Ok(Self {
			http,
			base_url: config.base_url.clone(),
		})
	}

	fn url_for(&self, path: &str) -> String {
		format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
	}
}

impl Transport for HttpTransport {
	fn request(&self, request: Request) -> BoxFuture<'static, Result<Response, TransportError>> {
		let path = request.endpoint.path();
		let url = self.url_for(&path);
		let http = self.http.clone();
		Box::pin(async move {
			debug!(%path, "POST");
			let resp = http.post(&url).json(&request.body).send().await.map_err(|e| {
				if e.is_timeout() {
					TransportError::Timeout { path: path.clone() }
				} else {
					TransportError::Request {
						path: path.clone(),
						message: e.to_string(),
					}
				}
			})?;

			let http_status = resp.status().as_u16();
			let bytes = resp.bytes().await.map_err(|e| TransportError::Body {
				path: path.clone(),
				message: e.to_string(),
			})?;
			let payload = parse_body(&bytes).map_err(|message| TransportError::Body {
				path: path.clone(),
				message,
			})?;
			let status = status_of(&payload, http_status);
			debug!(%path, status, "reply");
			Ok(Response::new(status, payload))
		})
	}
}

fn parse_body(bytes: &[u8]) -> Result<Value, String> {
	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Ok(Value::Object(Default::default()));
	}
	serde_json::from_slice(bytes).map_err(|e| e.to_string())
}

/// The service reports its status inside the body; fall back to the HTTP code.
fn status_of(payload: &Value, http_status: u16) -> u16 {
	payload
		.get("status")
		.and_then(Value::as_u64)
		.and_then(|s| u16::try_from(s).ok())
		.unwrap_or(http_status)
}
