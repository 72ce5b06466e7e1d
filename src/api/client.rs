//! Blocking JSON-over-HTTP client for the map backend.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{ApiError, MapApi};
use crate::model::{Annotation, AnnotationDraft, AnnotationPatch, MapData, MapSummary};

/// JSON error body the backend attaches to non-2xx responses. The `error`
/// field is a plain message for most failures and a structured list for
/// validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: serde_json::Value,
}

fn render_error(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Map a ureq failure onto the API error taxonomy, decoding the JSON error
/// body when the server sent one.
fn request_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_json::<ErrorBody>()
                .map(|body| render_error(&body.error))
                .unwrap_or_else(|_| format!("HTTP {status}"));
            ApiError::Status { status, message }
        }
        ureq::Error::Transport(transport) => ApiError::Transport(transport.to_string()),
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ApiError> {
    Ok(response.into_json()?)
}

/// HTTP implementation of [`MapApi`].
///
/// Calls block the calling thread; the editor core is single-threaded and
/// callers are expected to disable the save control while a save runs.
pub struct HttpMapApi {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpMapApi {
    /// Create a client against a base URL such as
    /// `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            agent: ureq::agent(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl MapApi for HttpMapApi {
    fn list_maps(&self) -> Result<Vec<MapSummary>, ApiError> {
        let response = self
            .agent
            .get(&self.url("/maps"))
            .call()
            .map_err(request_error)?;
        decode(response)
    }

    fn get_map(&self, id: &str) -> Result<MapData, ApiError> {
        let response = self
            .agent
            .get(&self.url(&format!("/maps/{id}")))
            .call()
            .map_err(request_error)?;
        decode(response)
    }

    fn create_map(&self, name: &str, image_path: &str) -> Result<MapData, ApiError> {
        let response = self
            .agent
            .post(&self.url("/maps"))
            .send_json(serde_json::json!({
                "name": name,
                "image_path": image_path,
            }))
            .map_err(request_error)?;
        decode(response)
    }

    fn update_map(
        &self,
        id: &str,
        name: Option<&str>,
        image_path: Option<&str>,
    ) -> Result<MapData, ApiError> {
        let mut body = serde_json::Map::new();
        if let Some(name) = name {
            body.insert("name".to_string(), name.into());
        }
        if let Some(image_path) = image_path {
            body.insert("image_path".to_string(), image_path.into());
        }
        let response = self
            .agent
            .put(&self.url(&format!("/maps/{id}")))
            .send_json(serde_json::Value::Object(body))
            .map_err(request_error)?;
        decode(response)
    }

    fn delete_map(&self, id: &str) -> Result<(), ApiError> {
        self.agent
            .delete(&self.url(&format!("/maps/{id}")))
            .call()
            .map_err(request_error)?;
        // 204, no body
        Ok(())
    }

    fn list_annotations(&self, map_id: &str) -> Result<Vec<Annotation>, ApiError> {
        let response = self
            .agent
            .get(&self.url(&format!("/maps/{map_id}/annotations")))
            .call()
            .map_err(request_error)?;
        decode(response)
    }

    fn create_annotation(
        &self,
        map_id: &str,
        draft: &AnnotationDraft,
    ) -> Result<Annotation, ApiError> {
        let response = self
            .agent
            .post(&self.url(&format!("/maps/{map_id}/annotations")))
            .send_json(draft)
            .map_err(request_error)?;
        decode(response)
    }

    fn update_annotation(
        &self,
        map_id: &str,
        id: &str,
        patch: &AnnotationPatch,
    ) -> Result<Annotation, ApiError> {
        let response = self
            .agent
            .put(&self.url(&format!("/maps/{map_id}/annotations/{id}")))
            .send_json(patch)
            .map_err(request_error)?;
        decode(response)
    }

    fn delete_annotation(&self, map_id: &str, id: &str) -> Result<(), ApiError> {
        self.agent
            .delete(&self.url(&format!("/maps/{map_id}/annotations/{id}")))
            .call()
            .map_err(request_error)?;
        Ok(())
    }
}
