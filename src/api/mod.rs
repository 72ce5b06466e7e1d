//! Backend CRUD contract and its HTTP implementation.

mod client;

pub use client::HttpMapApi;

use thiserror::Error;

use crate::model::{Annotation, AnnotationDraft, AnnotationPatch, MapData, MapSummary};

/// Errors from backend calls.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Server answered with a non-2xx status; the message comes from the
    /// JSON error body when one was sent
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never completed (connection, DNS, timeout)
    #[error("network error: {0}")]
    Transport(String),

    /// 2xx response whose body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(#[from] std::io::Error),
}

/// CRUD contract the backend exposes for maps and their annotations.
///
/// The store and the reconciliation engine only ever see this trait, so
/// tests can substitute an in-memory backend for the HTTP client.
pub trait MapApi {
    /// List all maps with summary info.
    fn list_maps(&self) -> Result<Vec<MapSummary>, ApiError>;

    /// Fetch a single map with its annotations.
    fn get_map(&self, id: &str) -> Result<MapData, ApiError>;

    /// Create a new, empty map.
    fn create_map(&self, name: &str, image_path: &str) -> Result<MapData, ApiError>;

    /// Update a map's metadata.
    fn update_map(
        &self,
        id: &str,
        name: Option<&str>,
        image_path: Option<&str>,
    ) -> Result<MapData, ApiError>;

    /// Delete a map.
    fn delete_map(&self, id: &str) -> Result<(), ApiError>;

    /// List the persisted annotations of a map.
    fn list_annotations(&self, map_id: &str) -> Result<Vec<Annotation>, ApiError>;

    /// Create an annotation; the server assigns the id in the returned
    /// record.
    fn create_annotation(
        &self,
        map_id: &str,
        draft: &AnnotationDraft,
    ) -> Result<Annotation, ApiError>;

    /// Update an annotation's fields.
    fn update_annotation(
        &self,
        map_id: &str,
        id: &str,
        patch: &AnnotationPatch,
    ) -> Result<Annotation, ApiError>;

    /// Delete an annotation.
    fn delete_annotation(&self, map_id: &str, id: &str) -> Result<(), ApiError>;
}
