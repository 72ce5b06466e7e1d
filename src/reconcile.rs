//! Synchronisation between the working collection and the backend.
//!
//! The backend keeps no change log, so saving diffs the in-memory
//! collection against the server's current set and replays the difference
//! as plain CRUD calls: deletes first, then creates and updates. Updates
//! are emitted for every surviving annotation rather than tracking
//! dirtiness; maps hold modest annotation counts and redundant rewrites
//! keep the engine simple.

use std::collections::HashSet;

use thiserror::Error;

use crate::api::{ApiError, MapApi};
use crate::model::{Annotation, AnnotationDraft, AnnotationPatch};
use crate::store::AnnotationStore;

/// A save cycle that failed part-way. The server's true state is unknown
/// after a partial failure, so nothing is rolled back; the caller
/// surfaces the failure and the user retries the whole save.
#[derive(Error, Debug)]
pub enum SaveError {
    /// Saving requires an open map
    #[error("no map is open")]
    NoOpenMap,

    /// Fetching the server's annotation set failed
    #[error("failed to fetch annotations for map {map_id}: {source}")]
    Fetch { map_id: String, source: ApiError },

    /// A delete call failed
    #[error("failed to delete annotation {id}: {source}")]
    Delete { id: String, source: ApiError },

    /// A create call failed
    #[error("failed to create annotation '{title}': {source}")]
    Create { title: String, source: ApiError },

    /// An update call failed
    #[error("failed to update annotation {id}: {source}")]
    Update { id: String, source: ApiError },
}

/// One save cycle's worth of CRUD calls, computed before anything runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavePlan {
    /// Server ids with no counterpart in the working collection.
    pub deletes: Vec<String>,
    /// Working annotations the server has never seen.
    pub creates: Vec<Annotation>,
    /// Working annotations the server already holds, rewritten wholesale.
    pub updates: Vec<Annotation>,
}

impl SavePlan {
    /// Whether the plan issues no calls at all.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.creates.is_empty() && self.updates.is_empty()
    }

    /// Total number of CRUD calls the plan will issue.
    pub fn call_count(&self) -> usize {
        self.deletes.len() + self.creates.len() + self.updates.len()
    }
}

/// Counts of calls that ran during a successful save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub deleted: usize,
    pub created: usize,
    pub updated: usize,
}

/// Diff the server's persisted set against the working collection.
///
/// Every server annotation missing from the collection becomes a delete.
/// Every collection entry the server has never seen becomes a create, and
/// every remaining entry becomes an update, changed or not.
pub fn plan_save(server: &[Annotation], client: &[Annotation]) -> SavePlan {
    let client_ids: HashSet<&str> = client.iter().map(|a| a.id.as_str()).collect();
    let server_ids: HashSet<&str> = server.iter().map(|a| a.id.as_str()).collect();

    let deletes = server
        .iter()
        .filter(|a| !client_ids.contains(a.id.as_str()))
        .map(|a| a.id.clone())
        .collect();

    let mut creates = Vec::new();
    let mut updates = Vec::new();
    for annotation in client {
        if server_ids.contains(annotation.id.as_str()) {
            updates.push(annotation.clone());
        } else {
            creates.push(annotation.clone());
        }
    }

    SavePlan {
        deletes,
        creates,
        updates,
    }
}

/// Fetch a map and open it in the store, replacing any previous session.
pub fn open_map(
    api: &dyn MapApi,
    store: &mut AnnotationStore,
    map_id: &str,
) -> Result<(), ApiError> {
    let map = api.get_map(map_id)?;
    store.load_map(map);
    Ok(())
}

/// Converge the server's annotation set for the open map to the working
/// collection.
///
/// Deletes run before writes so a recycled id can never collide. The first
/// failed call aborts the cycle: the in-memory collection is left exactly
/// as it was and one aggregate error names the call that failed. Newly
/// created annotations keep their provisional client ids until the whole
/// cycle succeeds, then adopt the server-assigned ids.
pub fn save_map(api: &dyn MapApi, store: &mut AnnotationStore) -> Result<SaveReport, SaveError> {
    let Some(map_id) = store.open_map().map(|m| m.id.clone()) else {
        return Err(SaveError::NoOpenMap);
    };

    let server = api
        .list_annotations(&map_id)
        .map_err(|source| SaveError::Fetch {
            map_id: map_id.clone(),
            source,
        })?;
    let plan = plan_save(&server, store.annotations());
    log::info!(
        "Saving map {map_id}: {} deletes, {} creates, {} updates",
        plan.deletes.len(),
        plan.creates.len(),
        plan.updates.len()
    );

    for id in &plan.deletes {
        api.delete_annotation(&map_id, id)
            .map_err(|source| SaveError::Delete {
                id: id.clone(),
                source,
            })?;
    }

    let mut remaps: Vec<(String, String)> = Vec::new();
    for annotation in &plan.creates {
        let created = api
            .create_annotation(&map_id, &AnnotationDraft::from(annotation))
            .map_err(|source| SaveError::Create {
                title: annotation.title.clone(),
                source,
            })?;
        if created.id != annotation.id {
            remaps.push((annotation.id.clone(), created.id));
        }
    }

    for annotation in &plan.updates {
        api.update_annotation(&map_id, &annotation.id, &AnnotationPatch::from(annotation))
            .map_err(|source| SaveError::Update {
                id: annotation.id.clone(),
                source,
            })?;
    }

    store.adopt_server_ids(&remaps);
    Ok(SaveReport {
        deleted: plan.deletes.len(),
        created: plan.creates.len(),
        updated: plan.updates.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::model::{MapData, MapSummary};

    fn ann(id: &str, type_id: &str, title: &str) -> Annotation {
        Annotation {
            id: id.to_string(),
            type_id: type_id.to_string(),
            x: 1.0,
            y: 2.0,
            title: title.to_string(),
            description: String::new(),
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        List,
        Delete(String),
        Create(String),
        Update(String),
    }

    /// In-memory stand-in for the backend, recording the calls it serves.
    #[derive(Default)]
    struct FakeApi {
        annotations: RefCell<Vec<Annotation>>,
        calls: RefCell<Vec<Call>>,
        next_id: RefCell<u32>,
        fail_deletes: bool,
        fail_updates: bool,
    }

    impl FakeApi {
        fn with_annotations(annotations: Vec<Annotation>) -> Self {
            Self {
                annotations: RefCell::new(annotations),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn server_state(&self) -> Vec<Annotation> {
            self.annotations.borrow().clone()
        }

        fn refused(&self) -> ApiError {
            ApiError::Status {
                status: 500,
                message: "refused".to_string(),
            }
        }
    }

    impl MapApi for FakeApi {
        fn list_maps(&self) -> Result<Vec<MapSummary>, ApiError> {
            unimplemented!("not exercised")
        }

        fn get_map(&self, id: &str) -> Result<MapData, ApiError> {
            Ok(MapData {
                id: id.to_string(),
                name: "Westeros".to_string(),
                image_path: "/uploads/w.png".to_string(),
                annotations: self.annotations.borrow().clone(),
            })
        }

        fn create_map(&self, _name: &str, _image_path: &str) -> Result<MapData, ApiError> {
            unimplemented!("not exercised")
        }

        fn update_map(
            &self,
            _id: &str,
            _name: Option<&str>,
            _image_path: Option<&str>,
        ) -> Result<MapData, ApiError> {
            unimplemented!("not exercised")
        }

        fn delete_map(&self, _id: &str) -> Result<(), ApiError> {
            unimplemented!("not exercised")
        }

        fn list_annotations(&self, _map_id: &str) -> Result<Vec<Annotation>, ApiError> {
            self.calls.borrow_mut().push(Call::List);
            Ok(self.annotations.borrow().clone())
        }

        fn create_annotation(
            &self,
            _map_id: &str,
            draft: &AnnotationDraft,
        ) -> Result<Annotation, ApiError> {
            self.calls.borrow_mut().push(Call::Create(draft.title.clone()));
            let mut next_id = self.next_id.borrow_mut();
            *next_id += 1;
            let created = Annotation {
                id: format!("srv-{}", *next_id),
                type_id: draft.type_id.clone(),
                x: draft.x,
                y: draft.y,
                title: draft.title.clone(),
                description: draft.description.clone(),
            };
            self.annotations.borrow_mut().push(created.clone());
            Ok(created)
        }

        fn update_annotation(
            &self,
            _map_id: &str,
            id: &str,
            patch: &AnnotationPatch,
        ) -> Result<Annotation, ApiError> {
            self.calls.borrow_mut().push(Call::Update(id.to_string()));
            if self.fail_updates {
                return Err(self.refused());
            }
            let mut annotations = self.annotations.borrow_mut();
            let annotation = annotations
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| ApiError::Status {
                    status: 404,
                    message: "Annotation not found".to_string(),
                })?;
            patch.apply(annotation);
            Ok(annotation.clone())
        }

        fn delete_annotation(&self, _map_id: &str, id: &str) -> Result<(), ApiError> {
            self.calls.borrow_mut().push(Call::Delete(id.to_string()));
            if self.fail_deletes {
                return Err(self.refused());
            }
            self.annotations.borrow_mut().retain(|a| a.id != id);
            Ok(())
        }
    }

    fn open_store(api: &FakeApi) -> AnnotationStore {
        let mut store = AnnotationStore::new();
        open_map(api, &mut store, "m1").expect("open map");
        store
    }

    // Server {a1,a2,a3}, client {a1',a3,a4}: one delete, one create, and an
    // update for every surviving annotation whether it changed or not.
    #[test]
    fn test_plan_covers_modified_removed_new_and_untouched() {
        let server = vec![
            ann("a1", "city", "Rome"),
            ann("a2", "note", "Reminder"),
            ann("a3", "event", "Battle"),
        ];
        let mut client = vec![
            ann("a1", "city", "Roma"),
            ann("a3", "event", "Battle"),
            ann("a4", "person", "Guide"),
        ];
        client[0].x = 9.0;

        let plan = plan_save(&server, &client);
        assert_eq!(plan.deletes, vec!["a2".to_string()]);
        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.creates[0].id, "a4");
        let update_ids: Vec<&str> = plan.updates.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(update_ids, vec!["a1", "a3"]);
        assert_eq!(plan.call_count(), 4);
    }

    #[test]
    fn test_plan_is_empty_when_both_sides_are_empty() {
        assert!(plan_save(&[], &[]).is_empty());
    }

    #[test]
    fn test_save_executes_deletes_before_writes() {
        let api = FakeApi::with_annotations(vec![ann("a1", "city", "Rome")]);
        let mut store = open_store(&api);
        store.remove("a1");
        store.add(ann("local-1", "note", "Reminder")).expect("add");

        let report = save_map(&api, &mut store).expect("save");
        assert_eq!(
            report,
            SaveReport {
                deleted: 1,
                created: 1,
                updated: 0
            }
        );
        assert_eq!(
            api.calls(),
            vec![
                Call::List,
                Call::Delete("a1".to_string()),
                Call::Create("Reminder".to_string()),
            ]
        );
    }

    #[test]
    fn test_save_adopts_server_assigned_ids() {
        let api = FakeApi::default();
        let mut store = open_store(&api);
        store.add(ann("local-1", "city", "Rome")).expect("add");

        save_map(&api, &mut store).expect("save");
        assert!(store.annotation("local-1").is_none());
        assert_eq!(store.annotation("srv-1").expect("present").title, "Rome");
    }

    #[test]
    fn test_save_converges_server_to_client() {
        let api = FakeApi::with_annotations(vec![
            ann("a1", "city", "Rome"),
            ann("a2", "note", "Reminder"),
        ]);
        let mut store = open_store(&api);
        store.remove("a2");
        store
            .update("a1", AnnotationPatch::new().title("Roma"))
            .expect("update");
        store.add(ann("local-1", "person", "Guide")).expect("add");

        save_map(&api, &mut store).expect("save");

        let mut server_titles: Vec<String> = api
            .server_state()
            .iter()
            .map(|a| a.title.clone())
            .collect();
        server_titles.sort();
        assert_eq!(server_titles, vec!["Guide", "Roma"]);
    }

    // Saving twice with no intervening edits leaves the server unchanged;
    // the second cycle still issues its redundant updates.
    #[test]
    fn test_resave_is_idempotent() {
        let api = FakeApi::with_annotations(vec![ann("a1", "city", "Rome")]);
        let mut store = open_store(&api);
        store.add(ann("local-1", "note", "Reminder")).expect("add");

        save_map(&api, &mut store).expect("first save");
        let after_first = api.server_state();

        let report = save_map(&api, &mut store).expect("second save");
        assert_eq!(api.server_state(), after_first);
        assert_eq!(
            report,
            SaveReport {
                deleted: 0,
                created: 0,
                updated: 2
            }
        );
    }

    #[test]
    fn test_failed_delete_aborts_cycle_and_preserves_store() {
        let api = FakeApi {
            fail_deletes: true,
            ..FakeApi::with_annotations(vec![ann("a1", "city", "Rome")])
        };
        let mut store = open_store(&api);
        store.remove("a1");
        store.add(ann("local-1", "note", "Reminder")).expect("add");
        let before: Vec<Annotation> = store.annotations().to_vec();

        let err = save_map(&api, &mut store).unwrap_err();
        assert!(matches!(err, SaveError::Delete { id, .. } if id == "a1"));
        assert_eq!(store.annotations(), before.as_slice());
        // Nothing after the failed delete ran
        assert_eq!(
            api.calls(),
            vec![Call::List, Call::Delete("a1".to_string())]
        );
    }

    #[test]
    fn test_failed_update_surfaces_one_aggregate_error() {
        let api = FakeApi {
            fail_updates: true,
            ..FakeApi::with_annotations(vec![ann("a1", "city", "Rome")])
        };
        let mut store = open_store(&api);

        let err = save_map(&api, &mut store).unwrap_err();
        assert!(matches!(err, SaveError::Update { id, .. } if id == "a1"));
    }

    #[test]
    fn test_save_without_open_map_is_an_error() {
        let api = FakeApi::default();
        let mut store = AnnotationStore::new();
        assert!(matches!(
            save_map(&api, &mut store),
            Err(SaveError::NoOpenMap)
        ));
    }

    #[test]
    fn test_open_map_loads_server_annotations() {
        let api = FakeApi::with_annotations(vec![ann("a1", "city", "Rome")]);
        let mut store = AnnotationStore::new();
        open_map(&api, &mut store, "m1").expect("open");

        assert_eq!(store.len(), 1);
        assert_eq!(store.open_map().expect("open").id, "m1");
    }
}
