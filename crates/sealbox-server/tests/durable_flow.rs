//! End-to-end flows over the durable store with the production environment.

use sealbox_core::{
    Config, Lifecycle, ReadBudget, RetrievalService, SecretError, SecretPolicy,
    SubmissionService,
};
use sealbox_proto::{FileEntry, Payload};
use sealbox_server::{RedbStore, SystemEnv};
use tempfile::tempdir;

fn bundle() -> Payload {
    Payload {
        message: "rotate this by friday".to_string(),
        files: vec![FileEntry::new("api_token.txt", b"tok_live_1234".to_vec())],
    }
}

#[test]
fn submit_and_retrieve_through_redb() {
    let dir = tempdir().unwrap();
    let store = RedbStore::open(dir.path().join("vault.redb")).unwrap();
    let lifecycle = Lifecycle::new(store, SystemEnv::new());

    let submission = SubmissionService::new(lifecycle.clone(), Config::default());
    let retrieval = RetrievalService::new(lifecycle);

    let reference = submission
        .submit(&bundle(), Some("out of band"), SecretPolicy::default())
        .expect("submit failed");

    let recovered =
        retrieval.retrieve(&reference, Some("out of band")).expect("retrieve failed");
    assert_eq!(recovered, bundle());

    // Burned after the single read.
    assert_eq!(
        retrieval.retrieve(&reference, Some("out of band")),
        Err(SecretError::SecretNotFound)
    );
}

#[test]
fn reference_survives_process_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vault.redb");

    let reference = {
        let store = RedbStore::open(&path).unwrap();
        let lifecycle = Lifecycle::new(store, SystemEnv::new());
        let submission = SubmissionService::new(lifecycle, Config::default());

        submission
            .submit(
                &bundle(),
                None,
                SecretPolicy { reads: ReadBudget::Limited(2), ..SecretPolicy::default() },
            )
            .expect("submit failed")
    };

    // Text form is all a recipient carries between sessions.
    let text = reference.to_string();
    drop(reference);

    let store = RedbStore::open(&path).unwrap();
    let retrieval = RetrievalService::new(Lifecycle::new(store, SystemEnv::new()));

    let parsed = text.parse().expect("reference parse failed");
    let recovered = retrieval.retrieve(&parsed, None).expect("retrieve failed");
    assert_eq!(recovered, bundle());
}

#[test]
fn wrong_password_burns_durable_eager_read() {
    let dir = tempdir().unwrap();
    let store = RedbStore::open(dir.path().join("vault.redb")).unwrap();
    let lifecycle = Lifecycle::new(store, SystemEnv::new());

    let submission = SubmissionService::new(lifecycle.clone(), Config::default());
    let retrieval = RetrievalService::new(lifecycle);

    let reference = submission
        .submit(&bundle(), Some("right"), SecretPolicy::default())
        .expect("submit failed");

    assert_eq!(
        retrieval.retrieve(&reference, Some("wrong")),
        Err(SecretError::DecryptionFailed)
    );
    assert_eq!(
        retrieval.retrieve(&reference, Some("right")),
        Err(SecretError::SecretNotFound)
    );
}
