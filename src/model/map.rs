//! Map records as served by the backend.

use serde::{Deserialize, Serialize};

use super::annotation::Annotation;

/// Summary row for the map list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSummary {
    pub id: String,
    pub name: String,
    pub image_path: String,
    pub annotation_count: usize,
}

/// A full map record with its persisted annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    pub id: String,
    pub name: String,
    pub image_path: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_deserializes_without_annotations() {
        let json = r#"{"id":"m1","name":"Westeros","image_path":"/uploads/w.png"}"#;
        let map: MapData = serde_json::from_str(json).expect("deserialize");
        assert!(map.annotations.is_empty());
    }
}
