use std::sync::Arc;

use async_trait::async_trait;
use sdg_core::model::{
    GoalId, ModuleId, ProgressRecord, ProgressStatus, SectionData, UserId,
};
use sdg_core::player::{Advance, SectionState};
use sdg_core::time::fixed_now;
use services::{AppServices, Clock, PlaySession, PlayerService, PlayerServiceError, seed_demo};
use storage::repository::{InMemoryRepository, ProgressRepository, StorageError};

async fn sqlite_services(name: &str) -> AppServices {
    AppServices::new_sqlite(
        &format!("sqlite:file:{name}?mode=memory&cache=shared"),
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("sqlite services")
}

/// Plays the current section to its terminal state, answering quizzes wrong
/// once before answering them right.
async fn finish_current(player: &PlayerService, session: &mut PlaySession) {
    let section = session.player().current().cloned().expect("current section");
    match section.data() {
        SectionData::Quiz(quiz) => {
            let wrong = quiz
                .options()
                .iter()
                .find(|o| !quiz.is_correct_option(o))
                .cloned();
            if let Some(wrong) = wrong {
                session.select(&wrong).unwrap();
                assert!(!player.submit(session).await.unwrap());
                let state = player.acknowledge(session).unwrap();
                assert_eq!(state, SectionState::RetryAvailable);
            }
            let key: Vec<String> = quiz
                .correct_answer()
                .key()
                .into_iter()
                .map(str::to_owned)
                .collect();
            for option in &key {
                session.select(option).unwrap();
            }
            assert!(player.submit(session).await.unwrap());
            assert_eq!(session.player().current_state(), Some(SectionState::LockedCorrect));
        }
        _ => player.view(session).await.unwrap(),
    }
}

#[tokio::test]
async fn demo_playthrough_marks_modules_done() {
    let app = sqlite_services("memdb_playthrough").await;
    let (goal, _) = seed_demo(&app.builder()).await.unwrap();
    let user = UserId::new("user123");
    let player = app.player();
    let progress = app.progress();

    let overview = progress.goal_overview(&user, goal.id()).await.unwrap();
    assert_eq!(overview.status, ProgressStatus::Todo);
    let first = overview.modules[0].module_id;

    let mut session = player.start(user.clone(), first).await.unwrap();
    assert!(matches!(player.advance(&mut session).await.unwrap(), Advance::Blocked));

    let mut completions = 0;
    loop {
        finish_current(&player, &mut session).await;
        match player.advance(&mut session).await.unwrap() {
            Advance::Moved { .. } => {}
            Advance::Completed(event) => {
                completions += 1;
                assert_eq!(event.module_id, first);
                assert_eq!(event.sections_played, 3);
                break;
            }
            other => panic!("unexpected advance: {other:?}"),
        }
    }
    assert_eq!(completions, 1);
    assert!(matches!(
        player.advance(&mut session).await.unwrap(),
        Advance::AlreadyComplete
    ));

    let overview = progress.goal_overview(&user, goal.id()).await.unwrap();
    assert_eq!(overview.modules[0].status, ProgressStatus::Done);
    assert_eq!(overview.status, ProgressStatus::Doing);
    assert_eq!(overview.featured, Some(overview.modules[1].module_id));
    assert!(overview.modules[1].unlocked);
    assert!(!overview.modules[2].unlocked);

    let next = progress.next_module(first).await.unwrap().unwrap();
    assert_eq!(next.id(), overview.modules[1].module_id);
}

#[tokio::test]
async fn replaying_a_done_module_keeps_it_done() {
    let app = AppServices::in_memory(Clock::fixed(fixed_now()));
    let (goal, _) = seed_demo(&app.builder()).await.unwrap();
    let user = UserId::new("user123");
    let player = app.player();
    let last = app.progress().goal_overview(&user, goal.id()).await.unwrap().modules[2].module_id;

    for _ in 0..2 {
        let mut session = player.start(user.clone(), last).await.unwrap();
        finish_current(&player, &mut session).await;
        assert!(matches!(
            player.advance(&mut session).await.unwrap(),
            Advance::Completed(_)
        ));
    }
    assert_eq!(
        app.progress().module_status(&user, last).await.unwrap(),
        ProgressStatus::Done
    );
}

#[tokio::test]
async fn unknown_goal_overview_is_reported() {
    let app = AppServices::in_memory(Clock::System);
    let err = app
        .progress()
        .goal_overview(&UserId::new("user123"), GoalId::new(404))
        .await
        .unwrap_err();
    assert!(matches!(err, services::ProgressServiceError::GoalNotFound(_)));
}

#[derive(Clone, Default)]
struct FlakyProgress {
    inner: InMemoryRepository,
    down: Arc<std::sync::atomic::AtomicBool>,
}

#[async_trait]
impl ProgressRepository for FlakyProgress {
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        if self.down.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StorageError::Connection("database is locked".into()));
        }
        self.inner.upsert_progress(record).await
    }

    async fn get_progress(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        self.inner.get_progress(user_id, module_id).await
    }

    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<ProgressRecord>, StorageError> {
        self.inner.list_progress(user_id).await
    }
}

#[tokio::test]
async fn failed_completion_write_is_retried_by_flush() {
    let content = InMemoryRepository::new();
    let builder = services::BuilderService::new(Arc::new(content.clone()), Arc::new(content.clone()));
    let (goal, _) = seed_demo(&builder).await.unwrap();
    let tree = builder.load_tree(goal.id()).await.unwrap();
    let module = tree.modules[2].module.id();

    let progress = FlakyProgress::default();
    let player = PlayerService::new(
        Clock::fixed(fixed_now()),
        Arc::new(content),
        Arc::new(progress.clone()),
    );
    let user = UserId::new("user123");
    let mut session = player.start(user.clone(), module).await.unwrap();
    finish_current(&player, &mut session).await;

    progress.down.store(true, std::sync::atomic::Ordering::SeqCst);
    let err = player.advance(&mut session).await.unwrap_err();
    assert!(matches!(err, PlayerServiceError::PersistenceUnavailable(_)));
    assert!(session.player().is_complete());
    assert!(session.has_unsaved_progress());
    assert_eq!(
        progress.get_progress(&user, module).await.unwrap().unwrap().status,
        ProgressStatus::Doing
    );

    progress.down.store(false, std::sync::atomic::Ordering::SeqCst);
    player.flush(&mut session).await.unwrap();
    assert!(!session.has_unsaved_progress());
    assert_eq!(
        progress.get_progress(&user, module).await.unwrap().unwrap().status,
        ProgressStatus::Done
    );
}
