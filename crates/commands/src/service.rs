use std::sync::Arc;

use tally_leaderboard::{DEFAULT_PAGE_SIZE, LeaderboardBuilder};
use tally_ledger::{ItemOutcome, LedgerError, LedgerStore, PointsLedger};
use tally_primitives::{Category, Directory, EntityId, Member, ScopeId};
use tally_ranks::{RankEngine, RankError, TierAssignment};
use tally_throttle::{GuildThrottle, ScopeGuard};
use tally_view::{Transition, ViewAction, ViewId, ViewPages, ViewRegistry, ViewSink};
use tracing::{debug, info, warn};

use crate::error::CommandError;
use crate::mention::{is_valid_rollcall, parse_mentions};
use crate::permissions::{Access, Permissions};
use crate::profile::{Profile, ProfileCard, STORY_CATEGORIES};
use crate::report::{Award, CommandReport, EntityOutcome};

pub const MVP_POINTS: i64 = 3;
pub const PROMO_POINTS: i64 = 2;
pub const ATTENDED_POINTS: i64 = 1;
/// Training point the caller earns for hosting a session.
pub const HOST_BONUS: i64 = 1;
pub const MAX_MISSION_POINTS: u8 = 4;

const RAID: &[(Category, i64)] = &[(Category::Raid, 1), (Category::Mission, 2)];
const RAID_EXTRA: &[(Category, i64)] = &[(Category::Mission, 1)];
const WAR: &[(Category, i64)] = &[(Category::War, 1)];
const EVENT: &[(Category, i64)] = &[(Category::Event, 1), (Category::Mission, 1)];

/// Mention lists of a training session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Training<'a> {
    pub mvp: &'a str,
    pub promo: &'a str,
    pub attended: &'a str,
    /// Optional for training; validated when present and non-blank.
    pub rollcall: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardOutcome {
    /// Nobody in the scope (or the filtered tier) has a tier.
    Empty,
    Opened {
        view: ViewId,
        pages: usize,
        /// 1-based position of the invoker.
        position: Option<usize>,
    },
}

#[derive(Debug, Default)]
struct Merged {
    awards: Vec<Award>,
    error: Option<LedgerError>,
    found: bool,
}

impl Merged {
    fn finish(self) -> EntityOutcome {
        match self.error {
            Some(error) => EntityOutcome::Failed {
                awards: self.awards,
                error,
            },
            None if !self.found => EntityOutcome::NotFound,
            None => EntityOutcome::Awarded(self.awards),
        }
    }
}

/// Command semantics over the ledger, the rank tables and the view registry.
///
/// Every mutating command holds the scope's throttle for its whole run, so two
/// commands in one scope never interleave their writes.
#[derive(Debug)]
pub struct CommandService<S, D, V> {
    ledger: Arc<PointsLedger<S>>,
    directory: Arc<D>,
    engine: Arc<RankEngine>,
    throttle: Arc<GuildThrottle>,
    views: Arc<ViewRegistry<V>>,
    permissions: Permissions,
    page_size: usize,
}

impl<S, D, V> CommandService<S, D, V>
where
    S: LedgerStore,
    D: Directory,
    V: ViewSink,
{
    pub fn new(
        ledger: Arc<PointsLedger<S>>,
        directory: Arc<D>,
        engine: Arc<RankEngine>,
        throttle: Arc<GuildThrottle>,
        views: Arc<ViewRegistry<V>>,
    ) -> Self {
        Self {
            ledger,
            directory,
            engine,
            throttle,
            views,
            permissions: Permissions::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn ledger(&self) -> &PointsLedger<S> {
        &self.ledger
    }

    pub fn engine(&self) -> &RankEngine {
        &self.engine
    }

    pub fn views(&self) -> &ViewRegistry<V> {
        &self.views
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn throttle(&self) -> &GuildThrottle {
        &self.throttle
    }

    async fn authorize(
        &self,
        scope: ScopeId,
        caller: EntityId,
        access: Access,
    ) -> Result<D::Member, CommandError> {
        match self.directory.lookup(scope, caller).await {
            Some(member) if self.permissions.allows(&member, access) => Ok(member),
            _ => {
                debug!(%scope, %caller, %access, "permission denied");
                Err(CommandError::PermissionDenied)
            }
        }
    }

    async fn member(&self, scope: ScopeId, entity: EntityId) -> Result<D::Member, CommandError> {
        self.directory
            .lookup(scope, entity)
            .await
            .ok_or(CommandError::UnknownMember(entity))
    }

    /// Apply every grant to every id, chunk by chunk, and fold the results per entity.
    async fn apply_grants(
        &self,
        guard: &ScopeGuard,
        ids: &[EntityId],
        grants: &[(Category, i64)],
    ) -> Vec<(EntityId, EntityOutcome)> {
        let scope = guard.scope();
        let chunks = guard
            .apply_chunked(ids, |chunk| async move {
                let mut merged: Vec<Merged> = chunk.iter().map(|_| Merged::default()).collect();
                for &(category, delta) in grants {
                    let batch = self
                        .ledger
                        .batch_add(&*self.directory, scope, chunk, category, delta)
                        .await;
                    for (acc, (_, item)) in merged.iter_mut().zip(batch.items) {
                        match item {
                            ItemOutcome::Applied { total } => {
                                acc.found = true;
                                acc.awards.push(Award {
                                    category,
                                    delta,
                                    total,
                                });
                            }
                            ItemOutcome::Failed(error) => {
                                acc.found = true;
                                if acc.error.is_none() {
                                    acc.error = Some(error);
                                }
                            }
                            ItemOutcome::NotFound => {}
                        }
                    }
                }
                chunk
                    .iter()
                    .copied()
                    .zip(merged.into_iter().map(Merged::finish))
                    .collect::<Vec<_>>()
            })
            .await;
        chunks.into_iter().flatten().collect()
    }

    /// Award every roster under one hold of the scope. `host` earns [`HOST_BONUS`] in the
    /// same hold once any roster member changed.
    async fn award_rosters(
        &self,
        scope: ScopeId,
        rosters: &[(Vec<EntityId>, &[(Category, i64)])],
        rollcall: Option<&str>,
        host: Option<EntityId>,
    ) -> CommandReport {
        let guard = self.throttle.acquire(scope).await;
        let mut report = CommandReport::with_rollcall(rollcall);
        for (ids, grants) in rosters {
            report
                .entries
                .extend(self.apply_grants(&guard, ids, grants).await);
        }

        if let Some(host) = host
            && report.changed() > 0
        {
            let outcome = match self.ledger.add(scope, host, Category::Training, HOST_BONUS) {
                Ok(total) => EntityOutcome::Awarded(vec![Award {
                    category: Category::Training,
                    delta: HOST_BONUS,
                    total,
                }]),
                Err(error) => {
                    warn!(%scope, %host, %error, "host bonus failed");
                    EntityOutcome::Failed {
                        awards: Vec::new(),
                        error,
                    }
                }
            };
            report.caller_bonus = Some((host, outcome));
        }
        drop(guard);
        report
    }

    /// Weighted training points for a session's MVP, promo and attendance lists.
    ///
    /// The caller earns [`HOST_BONUS`] once at least one listed member was awarded.
    /// When no mention resolves to a member nothing is written.
    pub async fn training(
        &self,
        scope: ScopeId,
        caller: EntityId,
        request: &Training<'_>,
    ) -> Result<CommandReport, CommandError> {
        self.authorize(scope, caller, Access::Basic).await?;
        let rollcall = request.rollcall.filter(|link| !link.trim().is_empty());
        check_rollcall(rollcall)?;

        let rosters = [
            (parse_mentions(request.mvp), MVP_POINTS),
            (parse_mentions(request.promo), PROMO_POINTS),
            (parse_mentions(request.attended), ATTENDED_POINTS),
        ];
        if rosters.iter().all(|(ids, _)| ids.is_empty()) {
            return Err(CommandError::NoValidMentions);
        }

        let grants = rosters.map(|(ids, points)| (ids, [(Category::Training, points)]));
        let rosters: Vec<_> = grants
            .iter()
            .map(|(ids, grant)| (ids.clone(), grant.as_slice()))
            .collect();
        let report = self
            .award_rosters(scope, &rosters, rollcall, Some(caller))
            .await;
        if report.resolved() == 0 {
            debug!(%scope, %caller, "training listed nobody in the scope");
            return Err(CommandError::NoValidMentions);
        }

        info!(%scope, %caller, command = "training", changed = report.changed(), "command applied");
        Ok(report)
    }

    /// Mission points for one member, between 1 and [`MAX_MISSION_POINTS`].
    pub async fn mission(
        &self,
        scope: ScopeId,
        caller: EntityId,
        member: EntityId,
        points: u8,
        rollcall: &str,
    ) -> Result<CommandReport, CommandError> {
        self.authorize(scope, caller, Access::Basic).await?;
        if !(1..=MAX_MISSION_POINTS).contains(&points) {
            return Err(CommandError::InvalidAmount(
                "mission points must be between 1 and 4",
            ));
        }
        check_rollcall(Some(rollcall))?;

        let grant = [(Category::Mission, i64::from(points))];
        let report = self
            .award_rosters(
                scope,
                &[(vec![member], grant.as_slice())],
                Some(rollcall),
                None,
            )
            .await;
        if report.not_found().next().is_some() {
            return Err(CommandError::UnknownMember(member));
        }

        info!(%scope, %caller, command = "mission", %member, points, "command applied");
        Ok(report)
    }

    /// One raid point and two mission points each; one mission point for each extra.
    pub async fn raid(
        &self,
        scope: ScopeId,
        caller: EntityId,
        members: &str,
        extra: &str,
        rollcall: &str,
    ) -> Result<CommandReport, CommandError> {
        self.authorize(scope, caller, Access::Basic).await?;
        check_rollcall(Some(rollcall))?;
        let ids = mentions(members)?;

        let report = self
            .award_rosters(
                scope,
                &[(ids, RAID), (parse_mentions(extra), RAID_EXTRA)],
                Some(rollcall),
                None,
            )
            .await;
        info!(%scope, %caller, command = "raid", changed = report.changed(), "command applied");
        Ok(report)
    }

    pub async fn war(
        &self,
        scope: ScopeId,
        caller: EntityId,
        members: &str,
        rollcall: &str,
    ) -> Result<CommandReport, CommandError> {
        self.authorize(scope, caller, Access::Basic).await?;
        check_rollcall(Some(rollcall))?;
        let ids = mentions(members)?;

        let report = self
            .award_rosters(scope, &[(ids, WAR)], Some(rollcall), None)
            .await;
        info!(%scope, %caller, command = "war", changed = report.changed(), "command applied");
        Ok(report)
    }

    pub async fn event(
        &self,
        scope: ScopeId,
        caller: EntityId,
        members: &str,
        rollcall: &str,
    ) -> Result<CommandReport, CommandError> {
        self.authorize(scope, caller, Access::Basic).await?;
        check_rollcall(Some(rollcall))?;
        let ids = mentions(members)?;

        let report = self
            .award_rosters(scope, &[(ids, EVENT)], Some(rollcall), None)
            .await;
        info!(%scope, %caller, command = "event", changed = report.changed(), "command applied");
        Ok(report)
    }

    /// Remove up to `amount` training or mission points from each mentioned member.
    pub async fn deduct(
        &self,
        scope: ScopeId,
        caller: EntityId,
        members: &str,
        category: Category,
        amount: u64,
    ) -> Result<CommandReport, CommandError> {
        self.authorize(scope, caller, Access::Full).await?;
        if !matches!(category, Category::Training | Category::Mission) {
            return Err(CommandError::InvalidCategory(category));
        }
        if amount == 0 {
            return Err(CommandError::InvalidAmount("amount must be positive"));
        }
        let ids = mentions(members)?;

        let guard = self.throttle.acquire(scope).await;
        let chunks = guard
            .apply_chunked(&ids, |chunk| async move {
                let mut outcomes = Vec::with_capacity(chunk.len());
                for &entity in chunk {
                    let outcome = if self.directory.lookup(scope, entity).await.is_none() {
                        EntityOutcome::NotFound
                    } else {
                        match self.ledger.remove(scope, entity, category, amount) {
                            Ok(removal) => EntityOutcome::Removed {
                                category,
                                removed: removal.removed,
                                total: removal.total,
                            },
                            Err(error) => {
                                warn!(%scope, %entity, %category, %error, "deduction failed");
                                EntityOutcome::Failed {
                                    awards: Vec::new(),
                                    error,
                                }
                            }
                        }
                    };
                    outcomes.push((entity, outcome));
                }
                outcomes
            })
            .await;
        drop(guard);

        let report = CommandReport {
            entries: chunks.into_iter().flatten().collect(),
            ..Default::default()
        };
        info!(%scope, %caller, command = "deduct", %category, amount, changed = report.changed(), "command applied");
        Ok(report)
    }

    /// Add training and/or mission points to one member. At least one must be non-zero.
    pub async fn grant(
        &self,
        scope: ScopeId,
        caller: EntityId,
        member: EntityId,
        training: u64,
        mission: u64,
    ) -> Result<CommandReport, CommandError> {
        self.authorize(scope, caller, Access::Full).await?;
        if training == 0 && mission == 0 {
            return Err(CommandError::InvalidAmount(
                "at least one of training or mission points is required",
            ));
        }
        let mut grants = Vec::with_capacity(2);
        for (category, amount) in [(Category::Training, training), (Category::Mission, mission)] {
            if amount > 0 {
                let delta = i64::try_from(amount)
                    .map_err(|_| CommandError::InvalidAmount("amount is too large"))?;
                grants.push((category, delta));
            }
        }

        let report = self
            .award_rosters(scope, &[(vec![member], grants.as_slice())], None, None)
            .await;
        if report.not_found().next().is_some() {
            return Err(CommandError::UnknownMember(member));
        }

        info!(%scope, %caller, command = "grant", %member, training, mission, "command applied");
        Ok(report)
    }

    /// Plan a tier change for `member`. The markers are not touched here; the caller
    /// applies the returned revoke and grant lists to the directory.
    pub async fn assign_tier(
        &self,
        scope: ScopeId,
        caller: EntityId,
        member: EntityId,
        tier: &str,
        stars: Option<u8>,
        rollcall: &str,
    ) -> Result<TierAssignment, CommandError> {
        self.authorize(scope, caller, Access::Basic).await?;
        check_rollcall(Some(rollcall))?;

        let _guard = self.throttle.acquire(scope).await;
        let target = self.member(scope, member).await?;
        let assignment = self.engine.tiers().assign(&target, tier, stars)?;

        info!(%scope, %caller, command = "assign_tier", %member, tier, ?stars, revoke = assignment.revoke.len(), "command applied");
        Ok(assignment)
    }

    /// Points, rank, tier and next-rank requirement of `entity`. Read-only.
    pub async fn profile(&self, scope: ScopeId, entity: EntityId) -> Result<Profile, CommandError> {
        let member = self.member(scope, entity).await?;
        let name = member.display_name().to_owned();

        let account = self.ledger.get(scope, entity)?;
        let Some(account) = account.filter(|a| !a.is_blank(&STORY_CATEGORIES)) else {
            return Ok(Profile::NoStory { entity, name });
        };

        let rank = self.engine.current_rank(&member);
        let standing = self.engine.resolve_tier(&member);
        let retired = self.engine.retirement(&member);
        let rank_name = match retired {
            Some(retired) => Some(retired.name.clone()),
            None => rank
                .and_then(|id| self.engine.rank_name(id))
                .map(str::to_owned),
        };
        Ok(Profile::Card(ProfileCard {
            entity,
            name,
            points: account.points,
            rank,
            rank_name,
            standing,
            tier_label: standing.map(|s| self.engine.tier_label(&s)),
            next: retired
                .is_none()
                .then(|| self.engine.next_rank_requirement(rank))
                .flatten(),
            retired: retired.map(|r| r.notice.clone()),
        }))
    }

    /// Rendered leaderboard pages for `scope`, or `None` when nobody qualifies.
    pub async fn leaderboard_pages(
        &self,
        scope: ScopeId,
        invoker: EntityId,
        tier: Option<&str>,
    ) -> Result<Option<ViewPages>, CommandError> {
        let filter = tier
            .map(|name| {
                self.engine
                    .tiers()
                    .level(name)
                    .ok_or_else(|| RankError::UnknownTier(name.to_owned()))
            })
            .transpose()?;

        let members = self.directory.members(scope).await;
        let board = LeaderboardBuilder::new(&self.engine)
            .with_page_size(self.page_size)
            .build(scope, members, filter, invoker);
        Ok(board.map(|board| ViewPages::from_leaderboard(&board, &self.engine)))
    }

    /// Build the leaderboard and open an interactive view on it.
    pub async fn leaderboard(
        &self,
        scope: ScopeId,
        invoker: EntityId,
        tier: Option<&str>,
    ) -> Result<LeaderboardOutcome, CommandError> {
        let Some(pages) = self.leaderboard_pages(scope, invoker, tier).await? else {
            return Ok(LeaderboardOutcome::Empty);
        };
        let page_count = pages.page_count();
        let position = pages.invoker_position;
        let view = self.views.create(pages).await?;
        Ok(LeaderboardOutcome::Opened {
            view,
            pages: page_count,
            position,
        })
    }

    pub async fn navigate(&self, view: ViewId, action: ViewAction) -> Result<Transition, CommandError> {
        Ok(self.views.transition(view, action).await?)
    }

    pub async fn close(&self, view: ViewId) -> Result<(), CommandError> {
        Ok(self.views.expire(view).await?)
    }

    /// Drop idle throttle slots and timed-out views. Returns evicted throttle slots.
    pub async fn maintain(&self) -> usize {
        self.views.purge_expired().await;
        self.throttle.evict_idle()
    }
}

fn check_rollcall(link: Option<&str>) -> Result<(), CommandError> {
    match link {
        Some(link) if !is_valid_rollcall(link) => Err(CommandError::InvalidRollCall),
        _ => Ok(()),
    }
}

fn mentions(text: &str) -> Result<Vec<EntityId>, CommandError> {
    let ids = parse_mentions(text);
    if ids.is_empty() {
        return Err(CommandError::NoValidMentions);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tally_ledger::MemoryLedgerStore;
    use tally_primitives::{MemberRecord, StaticDirectory};
    use tally_ranks::presets::{self, tier_marker};
    use tally_throttle::ThrottleConfig;
    use tally_view::NullSink;

    use super::*;

    const SCOPE: ScopeId = ScopeId(7);
    const STAFF: EntityId = EntityId(10);
    const ADMIN: EntityId = EntityId(11);
    const ALICE: EntityId = EntityId(1);
    const BOB: EntityId = EntityId(2);
    const CAROL: EntityId = EntityId(3);

    type Service = CommandService<MemoryLedgerStore, StaticDirectory, NullSink>;

    fn service() -> Service {
        let directory = StaticDirectory::new();
        directory.insert(
            SCOPE,
            MemberRecord::new(STAFF, "staff").with_marker(1381244026790871111),
        );
        directory.insert(
            SCOPE,
            MemberRecord::new(ADMIN, "admin").with_marker(1381235438563491841),
        );
        for (id, name) in [(ALICE, "alice"), (BOB, "bob"), (CAROL, "carol")] {
            directory.insert(SCOPE, MemberRecord::new(id, name));
        }
        service_with(directory)
    }

    fn service_with(directory: StaticDirectory) -> Service {
        let throttle = GuildThrottle::new(ThrottleConfig {
            min_delay_ms: 0,
            chunk_pause_ms: 0,
            ..Default::default()
        });
        CommandService::new(
            Arc::new(PointsLedger::new(MemoryLedgerStore::new())),
            Arc::new(directory),
            Arc::new(RankEngine::new(presets::gray_order()).unwrap()),
            Arc::new(throttle),
            Arc::new(ViewRegistry::new(Arc::new(NullSink))),
        )
    }

    fn points(service: &Service, entity: EntityId, category: Category) -> u64 {
        service
            .ledger()
            .get(SCOPE, entity)
            .unwrap()
            .map_or(0, |a| a.points(category))
    }

    const LINK: &str = "https://discord.com/channels/1/2/3";

    #[tokio::test]
    async fn test_training_weights() {
        let service = service();
        let request = Training {
            mvp: "<@1>",
            promo: "<@2> <@99>",
            attended: "<@3> <@!1>",
            rollcall: Some(LINK),
        };
        let report = service.training(SCOPE, STAFF, &request).await.unwrap();

        assert_eq!(points(&service, ALICE, Category::Training), 4);
        assert_eq!(points(&service, BOB, Category::Training), 2);
        assert_eq!(points(&service, CAROL, Category::Training), 1);
        assert_eq!(points(&service, STAFF, Category::Training), 1);
        assert_eq!(report.not_found().collect::<Vec<_>>(), vec![EntityId(99)]);
        assert_eq!(report.entries.len(), 5);
        assert_matches!(
            &report.caller_bonus,
            Some((STAFF, EntityOutcome::Awarded(awards))) if awards == &[Award {
                category: Category::Training,
                delta: HOST_BONUS,
                total: 1,
            }]
        );
        assert_eq!(report.rollcall.as_deref(), Some(LINK));
    }

    #[tokio::test]
    async fn test_training_without_members_writes_nothing() {
        let service = service();
        let request = Training {
            attended: "<@98> <@99>",
            ..Default::default()
        };
        assert_matches!(
            service.training(SCOPE, STAFF, &request).await,
            Err(CommandError::NoValidMentions)
        );
        assert!(service.ledger().get(SCOPE, STAFF).unwrap().is_none());

        assert_matches!(
            service.training(SCOPE, STAFF, &Training::default()).await,
            Err(CommandError::NoValidMentions)
        );
    }

    #[tokio::test]
    async fn test_host_bonus_waits_for_scope() {
        let service = service();
        let request = Training {
            attended: "<@1>",
            ..Default::default()
        };

        let held = service.throttle().acquire(SCOPE).await;
        let training = service.training(SCOPE, ADMIN, &request);
        tokio::pin!(training);
        for _ in 0..10 {
            tokio::select! {
                biased;
                _ = &mut training => panic!("training ran while the scope was held"),
                _ = tokio::task::yield_now() => {}
            }
        }
        assert_eq!(points(&service, ADMIN, Category::Training), 0);
        assert_eq!(points(&service, ALICE, Category::Training), 0);

        drop(held);
        let report = training.await.unwrap();
        assert_matches!(report.caller_bonus, Some((ADMIN, EntityOutcome::Awarded(_))));
        assert_eq!(points(&service, ADMIN, Category::Training), 1);

        // a deduction queued behind training sees the bonus already applied
        let (training, deduct) = tokio::join!(
            service.training(SCOPE, ADMIN, &request),
            service.deduct(SCOPE, ADMIN, "<@11>", Category::Training, 5),
        );
        training.unwrap();
        assert_matches!(
            deduct.unwrap().outcome(ADMIN),
            Some(EntityOutcome::Removed { removed: 2, total: 0, .. })
        );
        assert_eq!(points(&service, ADMIN, Category::Training), 0);
        assert_eq!(points(&service, ALICE, Category::Training), 2);
    }

    #[tokio::test]
    async fn test_training_blank_rollcall_allowed() {
        let service = service();
        let request = Training {
            promo: "<@1>",
            rollcall: Some("  "),
            ..Default::default()
        };
        let report = service.training(SCOPE, STAFF, &request).await.unwrap();
        assert!(report.rollcall.is_none());

        let request = Training {
            promo: "<@1>",
            rollcall: Some("https://example.com"),
            ..Default::default()
        };
        assert_matches!(
            service.training(SCOPE, STAFF, &request).await,
            Err(CommandError::InvalidRollCall)
        );
    }

    #[tokio::test]
    async fn test_permission_and_rollcall_checks() {
        let service = service();
        assert_matches!(
            service.war(SCOPE, ALICE, "<@2>", LINK).await,
            Err(CommandError::PermissionDenied)
        );
        assert_matches!(
            service.war(SCOPE, EntityId(404), "<@2>", LINK).await,
            Err(CommandError::PermissionDenied)
        );
        assert_matches!(
            service.war(SCOPE, STAFF, "<@2>", "not a link").await,
            Err(CommandError::InvalidRollCall)
        );
        assert_matches!(
            service.war(SCOPE, STAFF, "nobody", LINK).await,
            Err(CommandError::NoValidMentions)
        );
        assert!(service.ledger().accounts(SCOPE).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mission_bounds() {
        let service = service();
        for points in [0, 5] {
            assert_matches!(
                service.mission(SCOPE, STAFF, ALICE, points, LINK).await,
                Err(CommandError::InvalidAmount(_))
            );
        }
        assert_matches!(
            service.mission(SCOPE, STAFF, EntityId(99), 2, LINK).await,
            Err(CommandError::UnknownMember(EntityId(99)))
        );

        service.mission(SCOPE, STAFF, ALICE, 4, LINK).await.unwrap();
        assert_eq!(points(&service, ALICE, Category::Mission), 4);
    }

    #[tokio::test]
    async fn test_raid_and_extras() {
        let service = service();
        let report = service
            .raid(SCOPE, STAFF, "<@1> <@99>", "<@2>", LINK)
            .await
            .unwrap();

        assert_eq!(points(&service, ALICE, Category::Raid), 1);
        assert_eq!(points(&service, ALICE, Category::Mission), 2);
        assert_eq!(points(&service, BOB, Category::Mission), 1);
        assert_eq!(points(&service, BOB, Category::Raid), 0);

        assert_matches!(report.outcome(ALICE), Some(EntityOutcome::Awarded(awards)) if awards.len() == 2);
        assert_matches!(report.outcome(EntityId(99)), Some(EntityOutcome::NotFound));
        assert_eq!(report.changed(), 2);
    }

    #[tokio::test]
    async fn test_event_awards_mission_point() {
        let service = service();
        service.event(SCOPE, STAFF, "<@1> <@1>", LINK).await.unwrap();
        assert_eq!(points(&service, ALICE, Category::Event), 2);
        assert_eq!(points(&service, ALICE, Category::Mission), 2);
    }

    #[tokio::test]
    async fn test_war_across_chunks() {
        let directory = StaticDirectory::new();
        directory.insert(
            SCOPE,
            MemberRecord::new(STAFF, "staff").with_marker(1381244026790871111),
        );
        let mut text = String::new();
        for id in 100..112 {
            directory.insert(SCOPE, MemberRecord::new(EntityId(id), format!("m{id}")));
            text.push_str(&format!("<@{id}> "));
        }
        let service = service_with(directory);

        let report = service.war(SCOPE, STAFF, &text, LINK).await.unwrap();
        assert_eq!(report.entries.len(), 12);
        assert_eq!(report.changed(), 12);
        let ids: Vec<_> = report.entries.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, (100..112).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_deduct_clamps() {
        let service = service();
        service.ledger().add(SCOPE, ALICE, Category::Training, 3).unwrap();

        assert_matches!(
            service.deduct(SCOPE, STAFF, "<@1>", Category::Training, 1).await,
            Err(CommandError::PermissionDenied)
        );
        assert_matches!(
            service.deduct(SCOPE, ADMIN, "<@1>", Category::Raid, 1).await,
            Err(CommandError::InvalidCategory(Category::Raid))
        );
        assert_matches!(
            service.deduct(SCOPE, ADMIN, "<@1>", Category::Training, 0).await,
            Err(CommandError::InvalidAmount(_))
        );

        let report = service
            .deduct(SCOPE, ADMIN, "<@1> <@2> <@99>", Category::Training, 100)
            .await
            .unwrap();
        assert_matches!(
            report.outcome(ALICE),
            Some(EntityOutcome::Removed { removed: 3, total: 0, .. })
        );
        assert_matches!(
            report.outcome(BOB),
            Some(EntityOutcome::Removed { removed: 0, total: 0, .. })
        );
        assert_matches!(report.outcome(EntityId(99)), Some(EntityOutcome::NotFound));
        assert_eq!(report.changed(), 1);
        assert_eq!(points(&service, ALICE, Category::Training), 0);
    }

    #[tokio::test]
    async fn test_grant() {
        let service = service();
        assert_matches!(
            service.grant(SCOPE, ADMIN, ALICE, 0, 0).await,
            Err(CommandError::InvalidAmount(_))
        );
        assert_matches!(
            service.grant(SCOPE, ADMIN, EntityId(99), 1, 0).await,
            Err(CommandError::UnknownMember(_))
        );

        let report = service.grant(SCOPE, ADMIN, ALICE, 5, 2).await.unwrap();
        assert_eq!(report.outcome(ALICE).unwrap().awards().len(), 2);
        assert_eq!(points(&service, ALICE, Category::Training), 5);
        assert_eq!(points(&service, ALICE, Category::Mission), 2);

        service.grant(SCOPE, ADMIN, ALICE, 0, 1).await.unwrap();
        assert_eq!(points(&service, ALICE, Category::Training), 5);
        assert_eq!(points(&service, ALICE, Category::Mission), 3);
    }

    #[tokio::test]
    async fn test_profile() {
        let directory = StaticDirectory::new();
        directory.insert(
            SCOPE,
            MemberRecord::new(ALICE, "alice")
                .with_marker("Acolyte")
                .with_marker(tier_marker("Low-Tier").unwrap()),
        );
        directory.insert(SCOPE, MemberRecord::new(BOB, "bob"));
        let service = service_with(directory);

        assert_matches!(
            service.profile(SCOPE, ALICE).await.unwrap(),
            Profile::NoStory { entity: ALICE, .. }
        );
        service.ledger().add(SCOPE, BOB, Category::Event, 3).unwrap();
        assert_matches!(
            service.profile(SCOPE, BOB).await.unwrap(),
            Profile::NoStory { .. }
        );
        assert_matches!(
            service.profile(SCOPE, EntityId(99)).await,
            Err(CommandError::UnknownMember(_))
        );

        service.ledger().add(SCOPE, ALICE, Category::Training, 2).unwrap();
        let profile = service.profile(SCOPE, ALICE).await.unwrap();
        let card = profile.card().unwrap();
        assert_eq!(card.points(Category::Training), 2);
        assert_eq!(card.rank_name.as_deref(), Some("Acolyte"));
        assert_eq!(card.tier_label.as_deref(), Some("Low-Tier"));
        assert_matches!(
            &card.next,
            Some(tally_ranks::NextRank::Requirement { requirement, .. })
                if requirement.minimum(Category::Training) == 5
        );
    }

    #[tokio::test]
    async fn test_profile_of_retired_member() {
        let retired = retired_marker();
        let directory = StaticDirectory::new();
        directory.insert(
            SCOPE,
            MemberRecord::new(ALICE, "alice")
                .with_marker("Knight")
                .with_marker(retired),
        );
        let service = service_with(directory);
        service.ledger().add(SCOPE, ALICE, Category::Mission, 40).unwrap();

        let profile = service.profile(SCOPE, ALICE).await.unwrap();
        let card = profile.card().unwrap();
        assert_eq!(card.rank_name.as_deref(), Some("Retired"));
        assert_eq!(card.rank, service.engine().ranks().id("Knight"));
        assert_eq!(card.next, None);
        assert_eq!(
            card.retired.as_deref(),
            Some("The legends will always be remembered")
        );
    }

    fn retired_marker() -> tally_primitives::Marker {
        presets::gray_order()
            .ranks
            .retired
            .map(|r| r.marker)
            .unwrap()
    }

    #[tokio::test]
    async fn test_leaderboard_opens_view() {
        let directory = StaticDirectory::new();
        directory.insert(
            SCOPE,
            MemberRecord::new(ALICE, "alice").with_marker(tier_marker("High-Tier").unwrap()),
        );
        directory.insert(
            SCOPE,
            MemberRecord::new(BOB, "bob").with_marker(tier_marker("Low-Tier").unwrap()),
        );
        let service = service_with(directory);

        let outcome = service.leaderboard(SCOPE, BOB, None).await.unwrap();
        let LeaderboardOutcome::Opened { view, pages, position } = outcome else {
            panic!("expected a view, got {outcome:?}");
        };
        assert_eq!(pages, 1);
        assert_eq!(position, Some(2));
        assert_eq!(service.views().len(), 1);
        assert_eq!(
            service.navigate(view, ViewAction::Next).await.unwrap(),
            Transition::Unchanged { page: 0 }
        );
        service.close(view).await.unwrap();
        assert!(service.views().is_empty());

        assert_eq!(
            service.leaderboard(SCOPE, BOB, Some("Elite-Tier")).await.unwrap(),
            LeaderboardOutcome::Empty
        );
        assert_matches!(
            service.leaderboard(SCOPE, BOB, Some("Mythic")).await,
            Err(CommandError::Rank(RankError::UnknownTier(_)))
        );
    }

    #[tokio::test]
    async fn test_assign_tier() {
        let directory = StaticDirectory::new();
        directory.insert(
            SCOPE,
            MemberRecord::new(STAFF, "staff").with_marker(1381244026790871111),
        );
        directory.insert(
            SCOPE,
            MemberRecord::new(ALICE, "alice").with_marker(tier_marker("Low-Tier").unwrap()),
        );
        let service = service_with(directory);

        let assignment = service
            .assign_tier(SCOPE, STAFF, ALICE, "High-Tier", Some(2), LINK)
            .await
            .unwrap();
        assert_eq!(
            assignment.grant,
            vec![
                tier_marker("High-Tier").unwrap(),
                tier_marker("[ ⁑ ]").unwrap()
            ]
        );
        assert_eq!(assignment.revoke, vec![tier_marker("Low-Tier").unwrap()]);

        assert_matches!(
            service
                .assign_tier(SCOPE, STAFF, ALICE, "★ Ashenlight-Tier", Some(3), LINK)
                .await,
            Err(CommandError::Rank(RankError::InvalidStars { .. }))
        );
        assert_matches!(
            service.assign_tier(SCOPE, STAFF, EntityId(99), "Low-Tier", None, LINK).await,
            Err(CommandError::UnknownMember(_))
        );
    }
}
