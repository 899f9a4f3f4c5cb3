use tally_primitives::{EntityId, Member, ScopeId};
use tally_ranks::{RankEngine, RankId, Standing, TierLevel};

/// One ranked row.
#[derive(Debug, Clone)]
pub struct Entry<M> {
    pub member: M,
    pub standing: Standing,
    /// `None` when the member holds no rank marker.
    pub rank: Option<RankId>,
}

/// Filtered, totally ordered leaderboard split into fixed-size pages.
///
/// Never empty: an empty result is reported by the builder as `None`.
#[derive(Debug, Clone)]
pub struct Leaderboard<M> {
    pub(crate) scope: ScopeId,
    pub(crate) rows: Vec<Entry<M>>,
    pub(crate) page_size: usize,
    pub(crate) filter: Option<TierLevel>,
    pub(crate) invoker_position: Option<usize>,
}

impl<M: Member> Leaderboard<M> {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn rows(&self) -> &[Entry<M>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filter(&self) -> Option<TierLevel> {
        self.filter
    }

    /// `ceil(len / page_size)`.
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size)
    }

    pub fn page(&self, index: usize) -> Option<&[Entry<M>]> {
        self.rows.chunks(self.page_size).nth(index)
    }

    pub fn pages(&self) -> impl Iterator<Item = &[Entry<M>]> + '_ {
        self.rows.chunks(self.page_size)
    }

    /// 1-based position of the invoker, if they made it into the board.
    pub fn invoker_position(&self) -> Option<usize> {
        self.invoker_position
    }

    /// Page holding the 1-based `position`.
    pub fn page_of(&self, position: usize) -> Option<usize> {
        (1..=self.rows.len())
            .contains(&position)
            .then(|| (position - 1) / self.page_size)
    }

    pub fn position_of(&self, entity: EntityId) -> Option<usize> {
        self.rows
            .iter()
            .position(|e| e.member.id() == entity)
            .map(|i| i + 1)
    }

    /// Plain-text lines for one page: position, name and tier label.
    pub fn render_page(&self, index: usize, engine: &RankEngine) -> Option<Vec<String>> {
        let page = self.page(index)?;
        let first = index * self.page_size + 1;
        Some(
            page.iter()
                .enumerate()
                .map(|(offset, entry)| {
                    format!(
                        "{:>2}. {} | {}",
                        first + offset,
                        entry.member.display_name(),
                        engine.tier_label(&entry.standing)
                    )
                })
                .collect(),
        )
    }

    /// Every page rendered, in order.
    pub fn render(&self, engine: &RankEngine) -> Vec<String> {
        (0..self.page_count())
            .filter_map(|i| self.render_page(i, engine))
            .map(|lines| lines.join("\n"))
            .collect()
    }
}
