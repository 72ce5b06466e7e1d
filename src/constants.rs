//! Global constants for the mapmark session core.

/// Maximum length of an annotation title, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of an annotation description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Maximum length of an annotation type name, in characters.
pub const MAX_TYPE_NAME_LEN: usize = 50;

/// Maximum number of undo snapshots retained for a session.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Type id that annotations are reassigned to when their type is deleted.
pub const FALLBACK_TYPE_ID: &str = "event";

/// Marker icon shown for annotations whose type id has no catalog entry.
pub const FALLBACK_TYPE_ICON: &str = "📍";

/// Base URL of the backend API when none is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
