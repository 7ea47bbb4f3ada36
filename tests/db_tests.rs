//! Subject store behavior on a local database file.

use std::sync::Arc;
use syllabus::db::DatabaseProvider;
use syllabus::types::{AppError, ClassScope, NewSubject};
use syllabus::{SubjectStore, TursoClient};
use tempfile::TempDir;

fn new_subject(subject_id: &str, teacher_id: &str, standard: &str, division: &str) -> NewSubject {
    NewSubject {
        subject_id: subject_id.to_string(),
        name: format!("Subject {}", subject_id),
        standard: standard.to_string(),
        division: division.to_string(),
        teacher_id: teacher_id.to_string(),
        content: "Light travels in straight lines.".to_string(),
        vectors: r#"[{"text":"Light travels in straight lines.","embedding":[0.6,0.8]}]"#
            .to_string(),
    }
}

#[tokio::test]
async fn test_subjects_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("syllabus.db");
    let path = path.to_str().unwrap();

    {
        let store = TursoClient::new_local(path).await.unwrap();
        store
            .create_subject(new_subject("s-1", "t-1", "7", "C"))
            .await
            .unwrap();
    }

    let reopened = TursoClient::new_local(path).await.unwrap();
    let record = reopened
        .get_subject("s-1")
        .await
        .unwrap()
        .expect("subject should persist on disk");

    assert_eq!(record.teacher_id, "t-1");
    assert_eq!(record.scope(), ClassScope::new("7", "C"));
    assert!(record.vectors.contains("0.8"));
}

#[tokio::test]
async fn test_provider_opens_local_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let provider = DatabaseProvider::from_url(path.to_str().unwrap(), None).unwrap();
    assert_eq!(provider.name(), "sqlite");

    let store = provider.create_store().await.unwrap();
    store
        .create_subject(new_subject("s-1", "t-1", "7", "C"))
        .await
        .unwrap();

    assert!(path.exists());
    assert_eq!(store.list_teacher_subjects("t-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_public_id_leaves_first_row() {
    let store = TursoClient::new_memory().await.unwrap();
    store
        .create_subject(new_subject("s-1", "t-1", "7", "C"))
        .await
        .unwrap();

    let err = store
        .create_subject(new_subject("s-1", "t-2", "8", "D"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)));

    let record = store.get_subject("s-1").await.unwrap().unwrap();
    assert_eq!(record.teacher_id, "t-1");
    assert!(store.list_teacher_subjects("t-2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_class_listing_matches_both_fields() {
    let store = TursoClient::new_memory().await.unwrap();
    for (id, standard, division) in [("a", "7", "C"), ("b", "7", "D"), ("c", "8", "C")] {
        store
            .create_subject(new_subject(id, "t-1", standard, division))
            .await
            .unwrap();
    }

    let listed = store
        .list_class_subjects(&ClassScope::new("7", "C"))
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].subject_id, "a");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_creates_return_their_own_row_id() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("concurrent.db");
    let store = Arc::new(TursoClient::new_local(path.to_str().unwrap()).await.unwrap());

    let handles: Vec<_> = (0..200)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let subject_id = format!("s-{}", i);
                let created = store
                    .create_subject(new_subject(&subject_id, &format!("t-{}", i % 7), "7", "C"))
                    .await
                    .unwrap();
                (subject_id, created.id)
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let (subject_id, returned_id) = handle.await.unwrap();
        let stored = store.get_subject(&subject_id).await.unwrap().unwrap();
        assert_eq!(
            returned_id, stored.id,
            "create_subject returned the id of another row for {}",
            subject_id
        );
        ids.push(returned_id);
    }

    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 200);
}
