//! Demo content: SDG 6 "Clean Water and Sanitation".

use sdg_core::builder::{GoalBuilder, Placement};
use sdg_core::model::{
    CardPair, CardPairId, FlashcardsData, Goal, ModuleId, ModulePatch, QuizData, Section,
    SectionData, SectionId, TextData,
};
use tracing::info;

use crate::builder_service::BuilderService;
use crate::error::BuilderServiceError;

pub const DEMO_DISPLAY_ID: u32 = 6;

/// Creates the demo goal and its modules.
///
/// A goal with the demo's display number that already has modules is left
/// alone. One without modules, such as a goal whose first seeding failed to
/// save, gets the demo content. Returns the goal and whether content was
/// written by this call.
///
/// # Errors
///
/// Returns `BuilderServiceError` if the content cannot be built or saved.
pub async fn seed_demo(builder: &BuilderService) -> Result<(Goal, bool), BuilderServiceError> {
    let existing = builder
        .list_goals()
        .await?
        .into_iter()
        .find(|g| g.display_id() == DEMO_DISPLAY_ID);

    let mut tree = match existing {
        Some(goal) => match builder.open(goal.id()).await {
            Ok(tree) if tree.modules().next().is_none() => tree,
            Ok(_) | Err(BuilderServiceError::MalformedSection(_)) => return Ok((goal, false)),
            Err(err) => return Err(err),
        },
        None => GoalBuilder::new(
            builder
                .create_goal(
                    DEMO_DISPLAY_ID,
                    "Clean Water and Sanitation".into(),
                    Some("Ensure availability and sustainable management of water and sanitation for all".into()),
                )
                .await?,
        ),
    };
    add_demo_modules(&mut tree)?;

    builder.save(&mut tree).await?;
    let goal = tree.goal().clone();
    info!(goal_id = %goal.id(), "demo content seeded");
    Ok((goal, true))
}

fn add_demo_modules(tree: &mut GoalBuilder) -> Result<(), BuilderServiceError> {
    let basics = module(tree, "Water for All", "Why clean water matters")?;
    section(
        tree,
        basics,
        "Introduction",
        SectionData::Text(TextData::new(
            "Billions of people still live without safely managed drinking water. \
             This module introduces the ideas behind keeping water clean and available.",
        )),
    )?;
    section(
        tree,
        basics,
        "Key Terms",
        SectionData::Flashcards(FlashcardsData::new(
            "Water vocabulary",
            vec![
                CardPair::new(
                    CardPairId::new(1),
                    "Conservation",
                    "Using less water and protecting the sources we have.",
                ),
                CardPair::new(
                    CardPairId::new(2),
                    "Rainwater harvesting",
                    "Collecting and storing rainwater for later use.",
                ),
                CardPair::new(
                    CardPairId::new(3),
                    "Wastewater treatment",
                    "Cleaning used water so it can be returned or reused.",
                ),
            ],
        )?),
    )?;
    section(
        tree,
        basics,
        "Check your understanding",
        SectionData::Quiz(QuizData::single(
            "Ensuring access to clean water requires effective ______ strategies.",
            ["conservation", "pollution", "scarcity", "recycling"],
            "conservation",
        )?),
    )?;

    let managing = module(tree, "Managing Water Resources", "Using water wisely")?;
    section(
        tree,
        managing,
        "Harvesting",
        SectionData::Quiz(QuizData::single(
            "One approach is ______ harvesting, which collects and stores rainwater for various uses.",
            ["rainwater", "groundwater", "wastewater", "treatment"],
            "rainwater",
        )?),
    )?;
    section(
        tree,
        managing,
        "Efficiency",
        SectionData::Quiz(QuizData::multiple(
            "Select all that apply: Managing water resources efficiently can address growing water scarcity concerns.",
            ["efficiently", "scarcity", "wastewater", "recycling"],
            &["efficiently", "scarcity"],
        )?),
    )?;
    section(
        tree,
        managing,
        "Sustainability",
        SectionData::Quiz(QuizData::single(
            "We must manage our water resources ______ to ensure sustainability.",
            ["efficiently", "sustainably", "responsibly", "treatment"],
            "sustainably",
        )?),
    )?;

    let security = module(tree, "Water Security", "Putting it together")?;
    section(
        tree,
        security,
        "Global water security",
        SectionData::Quiz(QuizData::multiple(
            "Which of the following are important for global water security?",
            ["conservation", "treatment", "pollution", "scarcity", "recycling"],
            &["conservation", "treatment", "recycling"],
        )?),
    )?;
    Ok(())
}

fn module(
    tree: &mut GoalBuilder,
    title: &str,
    subtitle: &str,
) -> Result<ModuleId, BuilderServiceError> {
    let id = tree.add_module(Placement::End)?;
    tree.update_module(
        id,
        ModulePatch {
            title: Some(title.to_owned()),
            subtitle: Some(subtitle.to_owned()),
        },
    )?;
    Ok(id)
}

fn section(
    tree: &mut GoalBuilder,
    module_id: ModuleId,
    title: &str,
    data: SectionData,
) -> Result<SectionId, BuilderServiceError> {
    let section = Section::new(SectionId::generate(), title, data);
    Ok(tree.insert_section(module_id, section, Placement::End)?)
}
