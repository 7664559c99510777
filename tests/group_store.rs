use reach_sim::store::{AudienceGroupDraft, AudienceGroupPatch, AudienceGroupStore};
use reach_sim::DemographicSelection;

fn draft(name: Option<&str>, personas: &[&str]) -> AudienceGroupDraft {
    AudienceGroupDraft {
        name: name.map(str::to_string),
        personas: personas.iter().map(|p| p.to_string()).collect(),
        demographics: DemographicSelection::default(),
        total_audience: 1_000_000,
        unduplicated: 800_000,
        overlap_factor: 0.2,
    }
}

async fn store_in(dir: &tempfile::TempDir) -> AudienceGroupStore {
    AudienceGroupStore::load(dir.path().join("audience_groups.json"))
        .await
        .unwrap()
}

#[tokio::test]
async fn create_assigns_id_and_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    let group = store
        .create("1", draft(Some("Launch Wave"), &["Foodies"]))
        .await
        .unwrap();

    assert!(group.id.starts_with("grp_"));
    assert_eq!(group.name, "Launch Wave");
    assert_eq!(group.user_id, "1");
    assert_eq!(group.total_audience, 1_000_000);
    assert!(group.created_at_ms > 0);
    assert_eq!(group.created_at_ms, group.updated_at_ms);
}

#[tokio::test]
async fn omitted_names_get_sequential_labels() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    let first = store.create("1", draft(None, &["Foodies"])).await.unwrap();
    let second = store.create("1", draft(None, &["Sports"])).await.unwrap();

    assert_eq!(first.name, "Audience Group #1");
    assert_eq!(second.name, "Audience Group #2");
}

#[tokio::test]
async fn default_labels_stay_unique_after_deletions() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    let first = store.create("1", draft(None, &["Foodies"])).await.unwrap();
    let second = store.create("1", draft(None, &["Sports"])).await.unwrap();
    assert_eq!(second.name, "Audience Group #2");

    assert!(store.delete("1", &first.id).await.unwrap());
    let third = store.create("1", draft(None, &["Malay"])).await.unwrap();

    assert_eq!(third.name, "Audience Group #3");
    assert_ne!(third.name, second.name);
}

#[tokio::test]
async fn groups_are_scoped_per_user() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    let mine = store.create("1", draft(None, &["Foodies"])).await.unwrap();
    store.create("2", draft(None, &["Sports"])).await.unwrap();

    let user_one = store.list("1").await;
    assert_eq!(user_one.len(), 1);
    assert_eq!(user_one[0].id, mine.id);

    assert!(store.get("2", &mine.id).await.is_none());
    assert!(!store.delete("2", &mine.id).await.unwrap());
}

#[tokio::test]
async fn update_applies_patch_and_bumps_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    let group = store.create("1", draft(None, &["Foodies"])).await.unwrap();

    let patch = AudienceGroupPatch {
        name: Some("Renamed".to_string()),
        unduplicated: Some(750_000),
        ..Default::default()
    };
    let updated = store.update("1", &group.id, patch).await.unwrap().unwrap();

    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.unduplicated, 750_000);
    assert_eq!(updated.personas, vec!["Foodies".to_string()]);
    assert!(updated.updated_at_ms >= group.updated_at_ms);
}

#[tokio::test]
async fn update_of_missing_group_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    let result = store
        .update("1", "grp_missing", AudienceGroupPatch::default())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn delete_is_idempotent_per_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    let group = store.create("1", draft(None, &["Foodies"])).await.unwrap();

    assert!(store.delete("1", &group.id).await.unwrap());
    assert!(!store.delete("1", &group.id).await.unwrap());
    assert!(store.list("1").await.is_empty());
}

#[tokio::test]
async fn clear_reports_how_many_were_removed() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir).await;

    store.create("1", draft(None, &["Foodies"])).await.unwrap();
    store.create("1", draft(None, &["Sports"])).await.unwrap();
    store.create("2", draft(None, &["Malay"])).await.unwrap();

    assert_eq!(store.clear("1").await.unwrap(), 2);
    assert_eq!(store.clear("1").await.unwrap(), 0);
    assert_eq!(store.list("2").await.len(), 1);
}

#[tokio::test]
async fn store_survives_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audience_groups.json");

    let created = {
        let store = AudienceGroupStore::load(path.clone()).await.unwrap();
        store
            .create("1", draft(Some("Persistent"), &["Foodies", "Sports"]))
            .await
            .unwrap()
    };

    let reloaded = AudienceGroupStore::load(path).await.unwrap();
    let groups = reloaded.list("1").await;

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, created.id);
    assert_eq!(groups[0].name, "Persistent");
    assert_eq!(groups[0].personas, vec!["Foodies", "Sports"]);
}
