// crates/server/src/jobs/worker.rs
//! The queue consumer: claim, process, record, repeat.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use dah_core::llm::create_provider;
use dah_core::{
    build_messages, ChatProvider, ContentError, ContentResolver, DocmostFetcher, Job, JobId,
    JobStatus, LlmError,
};
use dah_db::{Database, DbResult};
use thiserror::Error;

use crate::config::{WorkerConfig, MIN_POLL_INTERVAL};

/// Why a claimed job could not be answered. Recorded as the job's
/// `error_text`, never propagated out of the loop.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("space_id is required")]
    MissingSpace,

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Chat(#[from] LlmError),

    #[error("processing panicked: {0}")]
    Panicked(String),
}

/// Result of one claimed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Done(JobId),
    Failed { job_id: JobId, error_text: String },
}

/// Sequential consumer of the job queue.
pub struct Worker {
    db: Database,
    resolver: Arc<dyn ContentResolver>,
    chat: Arc<dyn ChatProvider>,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(
        db: Database,
        resolver: Arc<dyn ContentResolver>,
        chat: Arc<dyn ChatProvider>,
    ) -> Self {
        Self {
            db,
            resolver,
            chat,
            poll_interval: Duration::from_millis(500),
        }
    }

    /// Worker wired to the docmost fetcher and the Ollama chat service.
    pub fn from_config(db: Database, config: &WorkerConfig) -> Self {
        Self::new(
            db,
            Arc::new(DocmostFetcher::new(&config.content_base_url).with_timeout(config.content_timeout)),
            create_provider(&config.llm),
        )
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Claim and process at most one job. Never sleeps.
    ///
    /// Returns `None` when nothing was queued. Only store errors are
    /// returned as `Err`; a job that fails to process is marked `failed`.
    /// A job is `running` only between claim and record here: if the process
    /// dies in between, nothing reclaims it.
    pub async fn run_once(&self) -> DbResult<Option<JobOutcome>> {
        let Some(job) = self
            .db
            .claim_next_job(JobStatus::Queued, JobStatus::Running)
            .await?
        else {
            return Ok(None);
        };

        let job_id = job.id;
        tracing::info!(%job_id, pages = job.selected_page_ids.len(), "claimed job");

        // Run on its own task so a panic inside a collaborator fails the job
        // instead of leaving it `running`.
        let resolver = Arc::clone(&self.resolver);
        let chat = Arc::clone(&self.chat);
        let result =
            match tokio::spawn(async move { process(&job, resolver.as_ref(), chat.as_ref()).await })
                .await
            {
                Ok(result) => result,
                Err(e) => Err(ProcessError::Panicked(e.to_string())),
            };

        match result {
            Ok(final_text) => {
                self.db.set_job_done(job_id, &final_text).await?;
                tracing::info!(%job_id, chars = final_text.len(), "job done");
                Ok(Some(JobOutcome::Done(job_id)))
            }
            Err(e) => {
                let error_text = e.to_string();
                tracing::warn!(%job_id, error = %error_text, "job failed");
                self.db.set_job_failed(job_id, &error_text).await?;
                Ok(Some(JobOutcome::Failed { job_id, error_text }))
            }
        }
    }

    /// Process jobs until the store fails. Sleeps only after an empty claim.
    pub async fn run_forever(&self) -> DbResult<Infallible> {
        tracing::info!(
            chat = self.chat.name(),
            model = self.chat.model(),
            poll_ms = self.poll_interval.as_millis() as u64,
            "worker started"
        );
        loop {
            if self.run_once().await?.is_none() {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }
}

/// Resolve every selected page in order, then ask for one completion.
async fn process(
    job: &Job,
    resolver: &dyn ContentResolver,
    chat: &dyn ChatProvider,
) -> Result<String, ProcessError> {
    let space_id = job.space_id.ok_or(ProcessError::MissingSpace)?;

    let mut pages = Vec::with_capacity(job.selected_page_ids.len());
    for page_id in &job.selected_page_ids {
        pages.push(resolver.fetch_page(space_id, *page_id).await?);
    }

    let messages = build_messages(&job.message, &pages);
    tracing::debug!(job_id = %job.id, messages = messages.len(), "requesting completion");
    Ok(chat.chat(&messages).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dah_core::{ChatMessage, ChatRole, PageContent};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Resolver backed by a fixed page map; unknown pages are `NotFound`.
    #[derive(Default)]
    struct FakeResolver {
        pages: HashMap<Uuid, PageContent>,
        calls: Mutex<Vec<(Uuid, Uuid)>>,
    }

    impl FakeResolver {
        fn with_page(mut self, id: Uuid, title: &str, text: &str) -> Self {
            self.pages.insert(
                id,
                PageContent {
                    title: Some(title.into()),
                    text_content: text.into(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl ContentResolver for FakeResolver {
        async fn fetch_page(&self, space_id: Uuid, page_id: Uuid) -> Result<PageContent, ContentError> {
            self.calls.lock().unwrap().push((space_id, page_id));
            self.pages
                .get(&page_id)
                .cloned()
                .ok_or(ContentError::NotFound { page_id })
        }
    }

    /// Chat provider that records the transcript and returns a canned reply.
    enum Reply {
        Text(&'static str),
        Fail,
        Panic,
    }

    struct FakeChat {
        reply: Reply,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl FakeChat {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for FakeChat {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            match self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(LlmError::Status {
                    status: 503,
                    body: "overloaded".into(),
                }),
                Reply::Panic => panic!("chat exploded"),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-model"
        }
    }

    async fn setup(
        resolver: FakeResolver,
        reply: Reply,
    ) -> (Database, Worker, Arc<FakeResolver>, Arc<FakeChat>) {
        let db = Database::new_in_memory().await.unwrap();
        let resolver = Arc::new(resolver);
        let chat = Arc::new(FakeChat::new(reply));
        let worker = Worker::new(db.clone(), resolver.clone(), chat.clone());
        (db, worker, resolver, chat)
    }

    #[tokio::test]
    async fn test_empty_queue_returns_none() {
        let (_db, worker, _, _) = setup(FakeResolver::default(), Reply::Text("x")).await;
        assert_eq!(worker.run_once().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_job_done_with_pages_in_order() {
        let space = Uuid::new_v4();
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let resolver = FakeResolver::default()
            .with_page(p1, "Intro", "hello")
            .with_page(p2, "", "world");
        let (db, worker, resolver, chat) = setup(resolver, Reply::Text("Summary of X")).await;

        let id = db.create_job(Some(space), &[p1, p2], "Summarize").await.unwrap();
        assert_eq!(worker.run_once().await.unwrap(), Some(JobOutcome::Done(id)));

        let job = db.get_job(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.final_text.as_deref(), Some("Summary of X"));
        assert!(job.error_text.is_none());

        assert_eq!(*resolver.calls.lock().unwrap(), vec![(space, p1), (space, p2)]);
        let seen = chat.seen.lock().unwrap();
        let roles: Vec<_> = seen[0].iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::System, ChatRole::System, ChatRole::User]);
        assert_eq!(seen[0][0].content, "Intro:\nhello");
        assert_eq!(seen[0][1].content, "(untitled):\nworld");
        assert_eq!(seen[0][2].content, "Summarize");
    }

    #[tokio::test]
    async fn test_missing_space_fails_job() {
        let (db, worker, _, chat) = setup(FakeResolver::default(), Reply::Text("x")).await;
        let id = db.create_job(None, &[], "q").await.unwrap();

        let outcome = worker.run_once().await.unwrap().unwrap();
        assert_eq!(
            outcome,
            JobOutcome::Failed {
                job_id: id,
                error_text: "space_id is required".into()
            }
        );
        assert!(chat.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_page_fails_job_and_loop_continues() {
        let (db, worker, _, _) = setup(FakeResolver::default(), Reply::Text("ok")).await;
        let bad = db
            .create_job(Some(Uuid::new_v4()), &[Uuid::new_v4()], "q")
            .await
            .unwrap();
        let good = db.create_job(Some(Uuid::new_v4()), &[], "q").await.unwrap();

        let first = worker.run_once().await.unwrap().unwrap();
        assert!(matches!(first, JobOutcome::Failed { job_id, .. } if job_id == bad));
        let job = db.get_job(bad).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error_text.unwrap().contains("not found"));
        assert!(job.final_text.is_none());

        assert_eq!(worker.run_once().await.unwrap(), Some(JobOutcome::Done(good)));
    }

    #[tokio::test]
    async fn test_chat_error_fails_job() {
        let (db, worker, _, _) = setup(FakeResolver::default(), Reply::Fail).await;
        let id = db.create_job(Some(Uuid::new_v4()), &[], "q").await.unwrap();

        worker.run_once().await.unwrap();
        let job = db.get_job(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error_text.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_panic_fails_job() {
        let (db, worker, _, _) = setup(FakeResolver::default(), Reply::Panic).await;
        let id = db.create_job(Some(Uuid::new_v4()), &[], "q").await.unwrap();

        worker.run_once().await.unwrap();
        let job = db.get_job(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error_text.unwrap().starts_with("processing panicked"));
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let (db, worker, _, _) = setup(FakeResolver::default(), Reply::Text("x")).await;
        db.close().await;
        assert!(worker.run_once().await.is_err());
        assert!(worker.run_forever().await.is_err());
    }

    #[tokio::test]
    async fn test_run_forever_drains_queue() {
        let (db, worker, _, _) = setup(FakeResolver::default(), Reply::Text("ok")).await;
        let worker = worker.with_poll_interval(Duration::from_millis(50));
        let ids = [
            db.create_job(Some(Uuid::new_v4()), &[], "a").await.unwrap(),
            db.create_job(Some(Uuid::new_v4()), &[], "b").await.unwrap(),
        ];

        let handle = tokio::spawn(async move { worker.run_forever().await });
        for _ in 0..100 {
            if db.count_jobs_by_status().await.unwrap().done == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        for id in ids {
            assert_eq!(db.get_job(id).await.unwrap().unwrap().status, JobStatus::Done);
        }
    }
}
