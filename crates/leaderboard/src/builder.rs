use std::cmp::Reverse;

use tally_primitives::{EntityId, Member, ScopeId};
use tally_ranks::{RankEngine, TierLevel};
use tracing::debug;

use crate::board::{Entry, Leaderboard};

pub const DEFAULT_PAGE_SIZE: usize = 15;

/// Orders a scope's members into a leaderboard.
#[derive(Debug, Clone, Copy)]
pub struct LeaderboardBuilder<'a> {
    engine: &'a RankEngine,
    page_size: usize,
}

impl<'a> LeaderboardBuilder<'a> {
    pub fn new(engine: &'a RankEngine) -> Self {
        Self {
            engine,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Page size, at least one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Build the leaderboard for `scope`.
    ///
    /// Members without a base tier are left out, as are members whose base tier differs
    /// from `filter`. Order is base tier, then stars, then rank seniority, all descending,
    /// with unranked members after ranked ones and input order breaking remaining ties.
    /// Returns `None` when nothing is left.
    pub fn build<M, I>(
        &self,
        scope: ScopeId,
        members: I,
        filter: Option<TierLevel>,
        invoker: EntityId,
    ) -> Option<Leaderboard<M>>
    where
        M: Member,
        I: IntoIterator<Item = M>,
    {
        let mut rows: Vec<Entry<M>> = members
            .into_iter()
            .filter_map(|member| {
                let standing = self.engine.resolve_tier(&member)?;
                if filter.is_some_and(|level| standing.base() != level) {
                    return None;
                }
                let rank = self.engine.current_rank(&member);
                Some(Entry {
                    member,
                    standing,
                    rank,
                })
            })
            .collect();

        if rows.is_empty() {
            debug!(%scope, ?filter, "leaderboard has no entries");
            return None;
        }

        rows.sort_by_key(|e| (Reverse(e.standing), Reverse(e.rank)));

        let invoker_position = rows
            .iter()
            .position(|e| e.member.id() == invoker)
            .map(|i| i + 1);

        let board = Leaderboard {
            scope,
            rows,
            page_size: self.page_size,
            filter,
            invoker_position,
        };
        debug!(
            %scope,
            rows = board.len(),
            pages = board.page_count(),
            ?invoker_position,
            "leaderboard built"
        );
        Some(board)
    }
}
