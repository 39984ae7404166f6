//! Integration tests for the claim protocol under concurrent claimers.

use std::collections::HashSet;

use dah_core::JobStatus;
use dah_db::Database;

/// Spawn `claimers` concurrent claim calls against `jobs` queued jobs and
/// return every job id handed out.
async fn race(claimers: usize, jobs: usize) -> Vec<uuid::Uuid> {
    let tmp = tempfile::tempdir().unwrap();
    let db = Database::new(&tmp.path().join("race.db")).await.unwrap();

    for i in 0..jobs {
        db.create_job(None, &[], &format!("job {i}")).await.unwrap();
    }

    let handles: Vec<_> = (0..claimers)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move {
                db.claim_next_job(JobStatus::Queued, JobStatus::Running)
                    .await
                    .expect("claim should not error")
            })
        })
        .collect();

    let results = futures_util::future::join_all(handles).await;
    let claimed: Vec<_> = results
        .into_iter()
        .map(|r| r.expect("task panicked"))
        .flatten()
        .map(|job| {
            assert_eq!(job.status, JobStatus::Running);
            job.id
        })
        .collect();

    db.close().await;
    claimed
}

fn assert_unique(ids: &[uuid::Uuid]) {
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len(), "a job was handed out twice: {ids:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_more_claimers_than_jobs() {
    let ids = race(12, 3).await;
    assert_unique(&ids);
    assert_eq!(ids.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_more_jobs_than_claimers() {
    let ids = race(4, 10).await;
    assert_unique(&ids);
    assert_eq!(ids.len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_equal_claimers_and_jobs() {
    let ids = race(6, 6).await;
    assert_unique(&ids);
    assert_eq!(ids.len(), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_claimer_single_job() {
    let ids = race(1, 1).await;
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn test_remaining_jobs_stay_queued_after_race() {
    let tmp = tempfile::tempdir().unwrap();
    let db = Database::new(&tmp.path().join("rest.db")).await.unwrap();
    for i in 0..5 {
        db.create_job(None, &[], &format!("job {i}")).await.unwrap();
    }

    let (a, b) = tokio::join!(
        db.claim_next_job(JobStatus::Queued, JobStatus::Running),
        db.claim_next_job(JobStatus::Queued, JobStatus::Running),
    );
    let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());
    assert_ne!(a.id, b.id);

    let counts = db.count_jobs_by_status().await.unwrap();
    assert_eq!(counts.running, 2);
    assert_eq!(counts.queued, 3);
}
