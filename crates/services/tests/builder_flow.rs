use sdg_core::builder::{Placement, SectionPatch};
use sdg_core::model::{QuizData, SectionData, SectionKind};
use sdg_core::time::fixed_now;
use services::{AppServices, BuilderServiceError, Clock};

#[tokio::test]
async fn builder_edits_survive_sqlite_reload() {
    let app = AppServices::new_sqlite(
        "sqlite:file:memdb_builder_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("sqlite services");
    let builder = app.builder();

    let goal = builder
        .create_goal(6, "Clean Water and Sanitation".into(), None)
        .await
        .unwrap();
    let mut tree = builder.open(goal.id()).await.unwrap();
    let intro = tree.add_module(Placement::End).unwrap();
    let practice = tree.add_module(Placement::End).unwrap();
    let text = tree
        .add_section(intro, SectionKind::Text, Placement::End)
        .unwrap();
    let quiz = tree
        .add_section(practice, SectionKind::Quiz, Placement::End)
        .unwrap();
    let data = QuizData::single(
        "We must manage our water resources ______ to ensure sustainability.",
        ["efficiently", "sustainably", "responsibly"],
        "sustainably",
    )
    .unwrap();
    tree.update_section(practice, &quiz, SectionPatch::data(SectionData::Quiz(data)))
        .unwrap();
    builder.save(&mut tree).await.unwrap();

    tree.reorder_module(practice, 0).unwrap();
    tree.remove_section(intro, &text).unwrap();
    builder.save(&mut tree).await.unwrap();

    let reopened = builder.open(goal.id()).await.unwrap();
    let order: Vec<_> = reopened.modules().map(|m| m.id()).collect();
    assert_eq!(order, vec![practice, intro]);
    assert!(reopened.sections(intro).unwrap().is_empty());
    assert_eq!(reopened.snapshot().unwrap(), tree.snapshot().unwrap());
    assert!(!reopened.is_dirty());
}

#[tokio::test]
async fn empty_answer_key_cannot_be_authored() {
    let err = QuizData::multiple("Pick", ["a", "b"], &[]).unwrap_err();
    let wrapped: BuilderServiceError = err.into();
    assert!(matches!(wrapped, BuilderServiceError::Quiz(_)));
}
