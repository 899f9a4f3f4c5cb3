//! Plain-text rendering of command results.

use std::fmt::Write;

use tally_commands::{Profile, STORY_CATEGORIES};
use tally_ranks::{NextRank, RankEngine};
use tally_view::ViewPages;

pub(crate) fn profile(profile: &Profile, engine: &RankEngine) -> String {
    let card = match profile {
        Profile::NoStory { name, .. } => {
            return format!("{name} has not yet woven their story into this place.");
        }
        Profile::Card(card) => card,
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", card.name);
    for category in STORY_CATEGORIES {
        let _ = writeln!(out, "  {:<16} {}", category.label(), card.points(category));
    }
    let _ = writeln!(out, "  {:<16} {}", "Rank", card.rank_name.as_deref().unwrap_or("Unranked"));
    if let Some(label) = &card.tier_label {
        let _ = writeln!(out, "  {:<16} {label}", "Level-Tier");
    }

    if let Some(notice) = &card.retired {
        let _ = writeln!(out, "{notice}");
    }
    match &card.next {
        Some(NextRank::Requirement { rank, requirement }) => {
            let name = engine.rank_name(*rank).unwrap_or("?");
            let _ = writeln!(out, "Next rank: {name}");
            for (category, minimum) in &requirement.minimums {
                let _ = writeln!(out, "  · {minimum} {}", category.label().to_lowercase());
            }
            if let Some(tier) = &requirement.tier {
                let _ = writeln!(out, "  · {} level", engine.tier_label(tier));
            }
        }
        Some(NextRank::Notice { text, .. }) => {
            let _ = writeln!(out, "{text}");
        }
        None => {}
    }
    out.trim_end().to_owned()
}

/// Page `page` (1-based, clamped) of a leaderboard.
pub(crate) fn leaderboard(pages: Option<&ViewPages>, page: usize) -> String {
    let Some(pages) = pages else {
        return "No members with a tier.".to_owned();
    };
    let count = pages.page_count();
    let index = page.clamp(1, count.max(1)) - 1;
    format!("{}\n\nPage {}/{count}", pages.content(index), index + 1)
}
