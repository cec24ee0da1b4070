//! Terminal module player.
//!
//! Reads one line per action from stdin. `q` at any prompt saves and quits.

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::Result;
use clap::Args;
use sdg_core::model::{FlashcardsData, ModuleId, QuizData, SectionData, UserId};
use sdg_core::player::Advance;
use services::{AppServices, PlaySession, PlayerService};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Module to play
    pub module_id: ModuleId,
}

pub async fn run(app: &AppServices, user: UserId, args: PlayArgs) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    play(app, user, args.module_id, &mut lines, &mut stdout).await
}

async fn play<R, W>(
    app: &AppServices,
    user: UserId,
    module_id: ModuleId,
    lines: &mut Lines<R>,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let player = app.player();
    let mut session = player.start(user, module_id).await?;
    if session.player().is_complete() {
        writeln!(out, "This module has no sections to play.")?;
        return Ok(());
    }

    loop {
        let Some(section) = session.player().current().cloned() else {
            break;
        };
        let progress = session.player().progress();
        writeln!(out)?;
        writeln!(
            out,
            "[{}/{}] {} ({}% done)",
            session.player().current_index() + 1,
            progress.total,
            section.title(),
            progress.percent
        )?;

        let finished = match section.data() {
            SectionData::Text(text) => {
                writeln!(out, "{}", text.content())?;
                view(&player, &mut session, lines, out).await?
            }
            SectionData::Flashcards(cards) => {
                write_cards(cards, out)?;
                view(&player, &mut session, lines, out).await?
            }
            SectionData::Quiz(quiz) => answer(&player, &mut session, quiz, lines, out).await?,
        };
        if !finished {
            player.flush(&mut session).await?;
            writeln!(out, "Progress saved.")?;
            return Ok(());
        }

        match player.advance(&mut session).await? {
            Advance::Moved { .. } => {}
            Advance::Completed(event) => {
                writeln!(out)?;
                writeln!(out, "Module complete! {} sections played.", event.sections_played)?;
                break;
            }
            Advance::Blocked | Advance::AlreadyComplete => break,
        }
    }

    if let Some(next) = app.progress().next_module(module_id).await? {
        writeln!(out, "Up next: {} ({})", next.title(), next.id())?;
    }
    Ok(())
}

/// Prints `label` and reads a trimmed line. `None` means quit.
async fn prompt<R, W>(lines: &mut Lines<R>, out: &mut W, label: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{label} ")?;
    out.flush()?;
    let Some(line) = lines.next_line().await? else {
        return Ok(None);
    };
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    Ok(Some(line.to_owned()))
}

async fn view<R, W>(
    player: &PlayerService,
    session: &mut PlaySession,
    lines: &mut Lines<R>,
    out: &mut W,
) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if prompt(lines, out, "Press enter to continue (q to quit):")
        .await?
        .is_none()
    {
        return Ok(false);
    }
    player.view(session).await?;
    Ok(true)
}

async fn answer<R, W>(
    player: &PlayerService,
    session: &mut PlaySession,
    quiz: &QuizData,
    lines: &mut Lines<R>,
    out: &mut W,
) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let options = quiz.options();
    loop {
        writeln!(out, "{}", quiz.question())?;
        for (i, option) in options.iter().enumerate() {
            writeln!(out, "  {}. {option}", i + 1)?;
        }
        let label = if quiz.is_multi_answer() {
            "Choose all that apply, e.g. `1 3`:"
        } else {
            "Choose one:"
        };
        let Some(line) = prompt(lines, out, label).await? else {
            return Ok(false);
        };
        let picks = match parse_picks(&line, options.len()) {
            Some(picks) if quiz.is_multi_answer() || picks.len() == 1 => picks,
            _ => {
                writeln!(out, "Enter option numbers between 1 and {}.", options.len())?;
                continue;
            }
        };

        for index in picks {
            session.select(&options[index])?;
        }
        if player.submit(session).await? {
            writeln!(out, "Correct!")?;
            return Ok(true);
        }
        writeln!(out, "Not quite. Try again.")?;
        player.acknowledge(session)?;
    }
}

fn write_cards<W: Write>(cards: &FlashcardsData, out: &mut W) -> Result<()> {
    writeln!(out, "{}", cards.title())?;
    for pair in cards.card_pairs() {
        writeln!(out, "  - {}: {}", pair.concept, pair.details)?;
    }
    Ok(())
}

/// Zero-based option indexes from a line like `1, 3`. `None` on anything
/// out of range or unparsable.
fn parse_picks(line: &str, len: usize) -> Option<BTreeSet<usize>> {
    let mut picks = BTreeSet::new();
    for token in line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let n: usize = token.parse().ok()?;
        if n == 0 || n > len {
            return None;
        }
        picks.insert(n - 1);
    }
    (!picks.is_empty()).then_some(picks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdg_core::model::ProgressStatus;
    use sdg_core::time::fixed_clock;
    use services::seed_demo;

    async fn first_module(app: &AppServices) -> ModuleId {
        let (goal, _) = seed_demo(&app.builder()).await.unwrap();
        app.builder().load_tree(goal.id()).await.unwrap().modules[0]
            .module
            .id()
    }

    async fn run_script(app: &AppServices, module: ModuleId, script: &str) -> String {
        let mut lines = script.as_bytes().lines();
        let mut out = Vec::new();
        play(app, UserId::new("user123"), module, &mut lines, &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn picks_parse_commas_and_spaces() {
        assert_eq!(parse_picks("1, 3", 4), Some(BTreeSet::from([0, 2])));
        assert_eq!(parse_picks("2 2", 4), Some(BTreeSet::from([1])));
        assert_eq!(parse_picks("0", 4), None);
        assert_eq!(parse_picks("5", 4), None);
        assert_eq!(parse_picks("two", 4), None);
        assert_eq!(parse_picks("  ", 4), None);
    }

    #[tokio::test]
    async fn scripted_playthrough_completes_module() {
        let app = AppServices::in_memory(fixed_clock());
        let module = first_module(&app).await;

        // text, flashcards, wrong answer, out of range, right answer
        let output = run_script(&app, module, "\n\n2\n9\n1\n").await;

        assert!(output.contains("[1/3] Introduction (0% done)"));
        assert!(output.contains("  - Conservation: Using less water"));
        assert!(output.contains("Not quite. Try again."));
        assert!(output.contains("Enter option numbers between 1 and 4."));
        assert!(output.contains("Correct!"));
        assert!(output.contains("Module complete! 3 sections played."));
        assert!(output.contains("Up next: Managing Water Resources"));
        assert_eq!(
            app.progress()
                .module_status(&UserId::new("user123"), module)
                .await
                .unwrap(),
            ProgressStatus::Done
        );
    }

    #[tokio::test]
    async fn quitting_keeps_partial_progress() {
        let app = AppServices::in_memory(fixed_clock());
        let module = first_module(&app).await;
        let user = UserId::new("user123");

        let output = run_script(&app, module, "q\n").await;
        assert!(output.contains("Progress saved."));
        assert_eq!(
            app.progress().module_status(&user, module).await.unwrap(),
            ProgressStatus::Todo
        );

        run_script(&app, module, "\nq\n").await;
        assert_eq!(
            app.progress().module_status(&user, module).await.unwrap(),
            ProgressStatus::Doing
        );
    }
}
