//! Member mentions in free-text command arguments.

use once_cell::sync::Lazy;
use regex::Regex;
use tally_primitives::EntityId;

#[allow(clippy::expect_used)]
static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@!?(\d+)>").expect("mention pattern is valid"));

/// Every `<@id>` / `<@!id>` in `text`, in order, repeats included.
pub fn parse_mentions(text: &str) -> Vec<EntityId> {
    MENTION
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .map(EntityId)
        .collect()
}

/// Roll-call links must point at the community's message host.
pub fn is_valid_rollcall(link: &str) -> bool {
    link.trim().starts_with("https://discord.com")
}
