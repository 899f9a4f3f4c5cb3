use std::fmt;

use strum::{Display, EnumString};
use tally_leaderboard::Leaderboard;
use tally_primitives::Member;
use tally_ranks::{RankEngine, TierLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Navigation request, parsed from button ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ViewAction {
    First,
    Prev,
    Next,
    Last,
    #[strum(serialize = "owner", serialize = "jump_to_owner")]
    JumpToOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Active { page: usize },
    /// Terminal.
    Expired,
}

/// Why a transition was refused. Shown to the user; state is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Rejection {
    #[strum(to_string = "You have no Tier position.")]
    NoPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Rendered { page: usize },
    /// Target content equals what is already shown; nothing was drawn.
    Unchanged { page: usize },
    Rejected(Rejection),
    /// The view is expired or unknown; nothing happened.
    Expired,
}

/// Everything a view needs to paginate: pre-rendered pages and the invoker's place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewPages {
    pub pages: Vec<String>,
    pub page_size: usize,
    /// 1-based.
    pub invoker_position: Option<usize>,
    pub filter: Option<TierLevel>,
}

impl ViewPages {
    pub fn from_leaderboard<M: Member>(board: &Leaderboard<M>, engine: &RankEngine) -> Self {
        Self {
            pages: board.render(engine),
            page_size: board.page_size(),
            invoker_position: board.invoker_position(),
            filter: board.filter(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn last_page(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    /// Page holding the invoker, if they have a position on the board.
    pub fn owner_page(&self) -> Option<usize> {
        let position = self.invoker_position?;
        let page = position.checked_sub(1)? / self.page_size.max(1);
        (page < self.pages.len()).then_some(page)
    }

    pub(crate) fn footer(&self) -> String {
        match self.invoker_position {
            Some(position) => format!("Your position is: {position}"),
            None => Rejection::NoPosition.to_string(),
        }
    }

    /// Full content drawn for `page`.
    pub fn content(&self, page: usize) -> String {
        let body = self.pages.get(page).map_or("", String::as_str);
        format!("{body}\n\n{}", self.footer())
    }
}
