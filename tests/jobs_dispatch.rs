//! End-to-end job-queue behavior against the real migrated schema: a job
//! that exhausts its `max_attempts` stops being claimable.

mod common;

use auth_backend::database::jobs::NewJob;
use auth_backend::errors::InsertJobError;

#[tokio::test]
async fn exhausted_job_is_no_longer_claimed() {
    let (state, _dir) = common::build_state().await;
    let jobs = state.db.jobs();

    let id = jobs
        .insert(NewJob {
            job_type: "email_verification",
            payload: b"exhaust@example.com:0",
            payload_extra: b"",
            max_attempts: 2,
            scheduled_for: chrono::Utc::now(),
        })
        .await
        .expect("insert");

    for _ in 0..2 {
        let claimed = jobs.claim(10).await.expect("claim");
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, id);
        jobs.mark_failed(id, "handler exploded").await.expect("mark failed");
    }

    let claimed = jobs.claim(10).await.expect("final claim");
    assert!(claimed.is_empty());
}

#[tokio::test]
async fn duplicate_payload_within_cooldown_bucket_is_rejected() {
    let (state, _dir) = common::build_state().await;
    let jobs = state.db.jobs();

    let first = jobs
        .insert(NewJob {
            job_type: "password_reset",
            payload: b"dedup@example.com:0",
            payload_extra: b"",
            max_attempts: 3,
            scheduled_for: chrono::Utc::now(),
        })
        .await;
    assert!(first.is_ok());

    let second = jobs
        .insert(NewJob {
            job_type: "password_reset",
            payload: b"dedup@example.com:0",
            payload_extra: b"",
            max_attempts: 3,
            scheduled_for: chrono::Utc::now(),
        })
        .await;
    assert_eq!(second, Err(InsertJobError::ConstraintUnique));
}
