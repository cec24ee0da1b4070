//! Goal listing, export and demo seeding.

use anyhow::Result;
use clap::Args;
use sdg_core::model::{GoalId, UserId};
use services::{AppServices, GoalOverview, seed_demo};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Goal to export
    pub goal_id: GoalId,
}

pub async fn seed(app: &AppServices) -> Result<()> {
    let (goal, created) = seed_demo(&app.builder()).await?;
    if created {
        println!("Seeded SDG {}: {} (id {})", goal.display_id(), goal.title(), goal.id());
    } else {
        println!("SDG {} already present (id {})", goal.display_id(), goal.id());
    }
    Ok(())
}

pub async fn goals(app: &AppServices, user: &UserId) -> Result<()> {
    let overviews = app.progress().list_overviews(user).await?;
    if overviews.is_empty() {
        println!("No goals yet. Run `sdg seed` to add the demo goal.");
        return Ok(());
    }
    for overview in &overviews {
        print!("{}", render_overview(overview));
    }
    Ok(())
}

pub async fn export(app: &AppServices, args: ExportArgs) -> Result<()> {
    let tree = app.builder().load_tree(args.goal_id).await?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

fn render_overview(overview: &GoalOverview) -> String {
    let mut out = format!(
        "SDG {} {} [{}] (id {})\n",
        overview.display_id, overview.title, overview.status, overview.goal_id
    );
    for module in &overview.modules {
        let marker = if overview.featured == Some(module.module_id) {
            ">"
        } else if module.unlocked {
            " "
        } else {
            "x"
        };
        out.push_str(&format!(
            "  {marker} {:<28} {:<5} {}\n",
            module.title,
            module.status.as_str(),
            module.module_id
        ));
    }
    out
}
