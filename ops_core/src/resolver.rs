//! Success chance, estimate interval and duration of an action attempt.
//!
//! The resolver is a pure function of an [`ActionDefinition`], the desk
//! context and the acting agent. The one exception is [`ActionResolver::attempt`],
//! which draws a single random number from the caller's generator.

use std::sync::Arc;

use rand::Rng;
use thiserror::Error;

use crate::action::{ActionDefinition, ActionKind};
use crate::config::ResolverConstants;
use crate::context::{OperationsContext, Operative};
use crate::stats::{intelligence_bonus, weighted_competence, Stat};

/// Name of the action gated on the city's communications network.
const RAID_ACTION: &str = "Raid";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("difficulty of action '{action}' is NaN")]
    NanDifficulty { action: String },
    #[error("competence for action '{action}' is NaN")]
    NanCompetence { action: String },
    #[error("success chance for action '{action}' is NaN")]
    NanChance { action: String },
}

/// Whether population figures come from the real count or the desk's
/// estimate of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChanceMode {
    #[default]
    Real,
    Estimate,
}

/// Result of [`ActionResolver::resolve_attempt`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptOutcome {
    pub success: bool,
    /// Real success chance the attempt was rolled against.
    pub chance: f64,
    /// Whether `max_level` rose as a result.
    pub leveled_up: bool,
}

#[derive(Debug, Clone)]
pub struct ActionResolver {
    constants: Arc<ResolverConstants>,
}

impl Default for ActionResolver {
    fn default() -> Self {
        Self::new(ResolverConstants::builtin())
    }
}

impl ActionResolver {
    pub fn new(constants: Arc<ResolverConstants>) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &ResolverConstants {
        &self.constants
    }

    /// Weighted sum of the agent's stats before any bonus or penalty.
    pub fn base_competence<C, A>(&self, action: &ActionDefinition, ctx: &C, agent: &A) -> f64
    where
        C: OperationsContext + ?Sized,
        A: Operative + ?Sized,
    {
        weighted_competence(
            &action.weights,
            &action.decays,
            |stat| self.efficiency(ctx, stat),
            |stat| agent.stat_level(stat),
        )
    }

    pub fn success_chance<C, A>(
        &self,
        action: &ActionDefinition,
        ctx: &C,
        agent: &A,
        mode: ChanceMode,
    ) -> Result<f64, ResolveError>
    where
        C: OperationsContext + ?Sized,
        A: Operative + ?Sized,
    {
        let mut difficulty = action.difficulty()?;
        let multipliers = ctx.multipliers();
        let city = ctx.current_city();

        let mut competence = self.base_competence(action, ctx, agent);
        competence *= intelligence_bonus(
            agent.intelligence(),
            self.constants.intelligence_bonus_weight,
        );
        competence *= ctx.stamina_penalty();
        competence *= self.team_success_bonus(action, ctx);

        competence *= self.population_penalty(action, ctx, mode);
        difficulty *= self.chaos_difficulty_bonus(action, ctx);

        if action.name == RAID_ACTION && city.comms <= 0.0 {
            return Ok(0.0);
        }

        competence *= multipliers.success_chance_all;
        competence *= self.skill_success_bonus(action, ctx);
        if action.is_stealth() {
            competence *= multipliers.success_chance_stealth;
        }
        if action.is_kill() {
            competence *= multipliers.success_chance_kill;
        }
        competence *= agent.success_chance_mult();

        if competence.is_nan() {
            return Err(ResolveError::NanCompetence {
                action: action.name.clone(),
            });
        }

        let chance = competence / difficulty;
        if chance.is_nan() {
            return Err(ResolveError::NanChance {
                action: action.name.clone(),
            });
        }
        Ok(chance.min(1.0))
    }

    /// Interval around the real chance whose width reflects how far the
    /// estimated chance is from it, skewed by how wrong the population
    /// estimate is. An underestimate widens the upper bound, an overestimate
    /// the lower one. Both ends are clamped to `[0, 1]`.
    pub fn est_success_chance<C, A>(
        &self,
        action: &ActionDefinition,
        ctx: &C,
        agent: &A,
    ) -> Result<(f64, f64), ResolveError>
    where
        C: OperationsContext + ?Sized,
        A: Operative + ?Sized,
    {
        let est = self.success_chance(action, ctx, agent, ChanceMode::Estimate)?;
        let real = self.success_chance(action, ctx, agent, ChanceMode::Real)?;
        let diff = (real - est).abs();
        let mut low = real - diff;
        let mut high = real + diff;

        let city = ctx.current_city();
        let ratio = city.pop / city.pop_est;
        if ratio < 1.0 {
            low *= ratio;
        } else {
            high *= ratio;
        }

        Ok((clamp_unit(low), clamp_unit(high)))
    }

    /// Roll one attempt. Draws exactly one `f64` from `rng`.
    pub fn attempt<C, A, R>(
        &self,
        action: &ActionDefinition,
        ctx: &C,
        agent: &A,
        rng: &mut R,
    ) -> Result<bool, ResolveError>
    where
        C: OperationsContext + ?Sized,
        A: Operative + ?Sized,
        R: Rng + ?Sized,
    {
        self.roll(action, ctx, agent, rng).map(|(_, success)| success)
    }

    /// Duration of one attempt in whole ticks, never less than 1.
    pub fn action_time<C, A>(
        &self,
        action: &ActionDefinition,
        ctx: &C,
        agent: &A,
    ) -> Result<u64, ResolveError>
    where
        C: OperationsContext + ?Sized,
        A: Operative + ?Sized,
    {
        let constants = &self.constants;
        let base_time = action.difficulty()? / constants.difficulty_to_time_factor;

        let eff_agility = agent.stat_level(Stat::Agility) * self.efficiency(ctx, Stat::Agility);
        let eff_dexterity =
            agent.stat_level(Stat::Dexterity) * self.efficiency(ctx, Stat::Dexterity);
        let stat_fac = 0.5
            * (eff_agility.powf(constants.eff_agi_exponential_factor)
                + eff_dexterity.powf(constants.eff_dex_exponential_factor)
                + eff_agility / constants.eff_agi_linear_factor
                + eff_dexterity / constants.eff_dex_linear_factor);

        let time = (base_time * ctx.multipliers().action_time / stat_fac).max(1.0);
        Ok((time * self.time_penalty(action)).ceil() as u64)
    }

    /// Roll an attempt and apply it to `action`: record the outcome and, on
    /// success, advance the level for kinds that level up.
    pub fn resolve_attempt<C, A, R>(
        &self,
        action: &mut ActionDefinition,
        ctx: &C,
        agent: &A,
        rng: &mut R,
    ) -> Result<AttemptOutcome, ResolveError>
    where
        C: OperationsContext + ?Sized,
        A: Operative + ?Sized,
        R: Rng + ?Sized,
    {
        let (chance, success) = self.roll(action, ctx, agent, rng)?;
        action.record_outcome(success);

        let mut leveled_up = false;
        if success {
            if let Some(per_level) = self.successes_per_level(action.kind) {
                leveled_up = action.set_max_level(per_level);
                if action.auto_level {
                    action.level = action.max_level;
                }
            }
        }

        tracing::debug!(
            target: "ops::resolver",
            action = %action.name,
            kind = %action.kind,
            chance,
            success,
            leveled_up,
            "attempt.resolved"
        );

        Ok(AttemptOutcome {
            success,
            chance,
            leveled_up,
        })
    }

    /// The real chance and the outcome of a single draw against it.
    fn roll<C, A, R>(
        &self,
        action: &ActionDefinition,
        ctx: &C,
        agent: &A,
        rng: &mut R,
    ) -> Result<(f64, bool), ResolveError>
    where
        C: OperationsContext + ?Sized,
        A: Operative + ?Sized,
        R: Rng + ?Sized,
    {
        let chance = self.success_chance(action, ctx, agent, ChanceMode::Real)?;
        Ok((chance, rng.gen::<f64>() < chance))
    }

    /// Successes needed per level, or `None` for kinds that do not level.
    pub fn successes_per_level(&self, kind: ActionKind) -> Option<f64> {
        match kind {
            ActionKind::Contract => Some(self.constants.contract_successes_per_level),
            ActionKind::Operation => Some(self.constants.operation_successes_per_level),
            ActionKind::General | ActionKind::BlackOp => None,
        }
    }

    fn efficiency<C>(&self, ctx: &C, stat: Stat) -> f64
    where
        C: OperationsContext + ?Sized,
    {
        match ctx.multipliers().efficiency.get(stat) {
            Some(value) => value,
            None => {
                tracing::warn!(
                    target: "ops::resolver",
                    stat = %stat,
                    "efficiency_multiplier.missing"
                );
                1.0
            }
        }
    }

    fn team_success_bonus<C>(&self, action: &ActionDefinition, ctx: &C) -> f64
    where
        C: OperationsContext + ?Sized,
    {
        if !action.kind.uses_team() || action.team_count == 0 {
            return 1.0;
        }
        let members = action.team_count.min(ctx.team_size());
        (members as f64).powf(self.constants.team_bonus_exponent)
    }

    fn skill_success_bonus<C>(&self, action: &ActionDefinition, ctx: &C) -> f64
    where
        C: OperationsContext + ?Sized,
    {
        let multipliers = ctx.multipliers();
        match action.kind {
            ActionKind::Contract => multipliers.success_chance_contract,
            ActionKind::Operation => multipliers.success_chance_operation,
            ActionKind::General | ActionKind::BlackOp => 1.0,
        }
    }

    fn population_penalty<C>(&self, action: &ActionDefinition, ctx: &C, mode: ChanceMode) -> f64
    where
        C: OperationsContext + ?Sized,
    {
        if action.kind == ActionKind::BlackOp {
            return 1.0;
        }
        let city = ctx.current_city();
        let pop = match mode {
            ChanceMode::Real => city.pop,
            ChanceMode::Estimate => city.pop_est,
        };
        (pop / self.constants.population_threshold).powf(self.constants.population_exponent)
    }

    fn chaos_difficulty_bonus<C>(&self, action: &ActionDefinition, ctx: &C) -> f64
    where
        C: OperationsContext + ?Sized,
    {
        if action.kind == ActionKind::BlackOp {
            return 1.0;
        }
        let chaos = ctx.current_city().chaos;
        let threshold = self.constants.chaos_threshold;
        if chaos > threshold {
            (1.0 + (chaos - threshold)).sqrt()
        } else {
            1.0
        }
    }

    fn time_penalty(&self, action: &ActionDefinition) -> f64 {
        match action.kind {
            ActionKind::BlackOp => self.constants.black_op_time_penalty,
            _ => 1.0,
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    value.min(1.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionParams;
    use crate::context::{AgentProfile, CityState, DeskSnapshot, SkillMultipliers};
    use crate::stats::StatTable;
    use rand::rngs::mock::StepRng;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn resolver() -> ActionResolver {
        ActionResolver::default()
    }

    fn desk() -> DeskSnapshot {
        DeskSnapshot {
            team_size: 10,
            ..DeskSnapshot::default()
        }
    }

    fn hacking_and_strength() -> StatTable<f64> {
        [(Stat::Hacking, 0.5), (Stat::Strength, 0.5)]
            .into_iter()
            .collect()
    }

    fn action(kind: ActionKind, name: &str) -> ActionDefinition {
        let mut action = ActionDefinition::blank(kind);
        action.name = name.to_string();
        action.weights = hacking_and_strength();
        action
    }

    fn agent(level: f64) -> AgentProfile {
        AgentProfile::with_stats(Stat::ALL.into_iter().map(|stat| (stat, level)))
    }

    fn hack_str_agent() -> AgentProfile {
        AgentProfile::with_stats([(Stat::Hacking, 100.0), (Stat::Strength, 50.0)])
    }

    #[test]
    fn competence_matches_weighted_decay_sum() {
        let resolver = resolver();
        let action = action(ActionKind::General, "Tracking");
        let agent = hack_str_agent();
        let expected = 0.5 * 100f64.powf(0.9) + 0.5 * 50f64.powf(0.9);

        assert_eq!(resolver.base_competence(&action, &desk(), &agent), expected);

        let chance = resolver
            .success_chance(&action, &desk(), &agent, ChanceMode::Real)
            .unwrap();
        assert_eq!(chance, expected / 100.0);
    }

    #[test]
    fn chance_is_non_decreasing_in_each_stat() {
        let resolver = resolver();
        let mut action = action(ActionKind::General, "Tracking");
        action.weights = StatTable::uniform(1.0 / 7.0);
        action.base_difficulty = 5_000.0;

        for stat in Stat::ALL {
            let mut previous = 0.0;
            for level in [0.0, 1.0, 10.0, 100.0, 1_000.0, 10_000.0] {
                let mut agent = agent(50.0);
                agent.stats.insert(stat, level);
                let chance = resolver
                    .success_chance(&action, &desk(), &agent, ChanceMode::Real)
                    .unwrap();
                assert!(chance >= previous, "{stat} at {level}: {chance} < {previous}");
                assert!(chance <= 1.0);
                previous = chance;
            }
        }
    }

    #[test]
    fn chance_is_capped_at_one() {
        let resolver = resolver();
        let action = action(ActionKind::General, "Tracking");
        let chance = resolver
            .success_chance(&action, &desk(), &agent(1e12), ChanceMode::Real)
            .unwrap();
        assert_eq!(chance, 1.0);
    }

    #[test]
    fn raid_without_comms_never_succeeds() {
        let resolver = resolver();
        let raid = action(ActionKind::Operation, "Raid");
        let mut desk = desk();
        desk.city.comms = 0.0;

        let chance = resolver
            .success_chance(&raid, &desk, &agent(1e12), ChanceMode::Real)
            .unwrap();
        assert_eq!(chance, 0.0);

        desk.city.comms = 1.0;
        let chance = resolver
            .success_chance(&raid, &desk, &agent(1e12), ChanceMode::Real)
            .unwrap();
        assert_eq!(chance, 1.0);
    }

    #[test]
    fn chaos_above_threshold_raises_difficulty() {
        let resolver = resolver();
        let action = action(ActionKind::Contract, "Tracking");
        let agent = hack_str_agent();
        let calm = resolver
            .success_chance(&action, &desk(), &agent, ChanceMode::Real)
            .unwrap();

        let mut chaotic = desk();
        chaotic.city.chaos = 53.0;
        let stressed = resolver
            .success_chance(&action, &chaotic, &agent, ChanceMode::Real)
            .unwrap();
        assert!((stressed - calm / 2.0).abs() < 1e-12);
    }

    #[test]
    fn black_ops_ignore_population_and_chaos() {
        let resolver = resolver();
        let op = action(ActionKind::BlackOp, "Operation Typhoon");
        let agent = hack_str_agent();
        let baseline = resolver
            .success_chance(&op, &desk(), &agent, ChanceMode::Real)
            .unwrap();

        let mut hostile = desk();
        hostile.city.chaos = 500.0;
        hostile.city.pop = 1e7;
        let chance = resolver
            .success_chance(&op, &hostile, &agent, ChanceMode::Real)
            .unwrap();
        assert_eq!(chance, baseline);
    }

    #[test]
    fn team_bonus_uses_smaller_of_team_and_desk() {
        let resolver = resolver();
        let agent = hack_str_agent();
        let solo = action(ActionKind::Operation, "Investigation");
        let mut teamed = solo.clone();
        teamed.team_count = 32;

        let base = resolver
            .success_chance(&solo, &desk(), &agent, ChanceMode::Real)
            .unwrap();
        let with_team = resolver
            .success_chance(&teamed, &desk(), &agent, ChanceMode::Real)
            .unwrap();
        let expected = base * 10f64.powf(0.05);
        assert!((with_team - expected).abs() < 1e-12);

        let mut contract = action(ActionKind::Contract, "Tracking");
        contract.team_count = 32;
        let contract_chance = resolver
            .success_chance(&contract, &desk(), &agent, ChanceMode::Real)
            .unwrap();
        assert_eq!(contract_chance, base);
    }

    #[test]
    fn category_multipliers_stack() {
        let resolver = resolver();
        let agent = hack_str_agent();
        let mut action = action(ActionKind::Contract, "Retirement");
        action.base_difficulty = 1_000.0;
        let base = resolver
            .success_chance(&action, &desk(), &agent, ChanceMode::Real)
            .unwrap();

        action.flags = crate::action::ActionFlags::STEALTH | crate::action::ActionFlags::KILL;
        let desk = DeskSnapshot {
            multipliers: SkillMultipliers {
                success_chance_stealth: 1.5,
                success_chance_kill: 2.0,
                success_chance_contract: 1.25,
                ..SkillMultipliers::default()
            },
            ..desk()
        };
        let boosted = resolver
            .success_chance(&action, &desk, &agent, ChanceMode::Real)
            .unwrap();
        assert!((boosted - base * 1.5 * 2.0 * 1.25).abs() < 1e-12);
    }

    #[test]
    fn missing_efficiency_counts_as_one() {
        let resolver = resolver();
        let action = action(ActionKind::General, "Tracking");
        let agent = hack_str_agent();
        let sparse = DeskSnapshot {
            multipliers: SkillMultipliers {
                efficiency: StatTable::default(),
                ..SkillMultipliers::default()
            },
            ..desk()
        };
        assert_eq!(
            resolver.base_competence(&action, &sparse, &agent),
            resolver.base_competence(&action, &desk(), &agent)
        );
    }

    #[test]
    fn nan_competence_is_an_error() {
        let resolver = resolver();
        let action = action(ActionKind::General, "Tracking");
        let agent = AgentProfile::with_stats([(Stat::Hacking, f64::NAN)]);
        let err = resolver
            .success_chance(&action, &desk(), &agent, ChanceMode::Real)
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::NanCompetence {
                action: "Tracking".to_string()
            }
        );
    }

    #[test]
    fn nan_difficulty_is_an_error() {
        let resolver = resolver();
        let mut action = action(ActionKind::General, "Tracking");
        action.level = 3;
        action.difficulty_fac = f64::NAN;
        let err = resolver
            .action_time(&action, &desk(), &hack_str_agent())
            .unwrap_err();
        assert!(matches!(err, ResolveError::NanDifficulty { .. }));
    }

    #[test]
    fn estimate_interval_is_ordered_and_bounded() {
        let resolver = resolver();
        let action = action(ActionKind::Contract, "Tracking");
        let agent = hack_str_agent();
        for (pop, pop_est) in [
            (1e9, 1e9),
            (1e9, 2e9),
            (2e9, 1e9),
            (5e8, 3e9),
            (1e6, 1e10),
            (3e10, 1e6),
        ] {
            let desk = DeskSnapshot {
                city: CityState {
                    pop,
                    pop_est,
                    ..CityState::default()
                },
                ..desk()
            };
            let (low, high) = resolver.est_success_chance(&action, &desk, &agent).unwrap();
            assert!((0.0..=1.0).contains(&low), "low {low}");
            assert!((0.0..=1.0).contains(&high), "high {high}");
            assert!(low <= high, "{low} > {high}");
        }
    }

    #[test]
    fn overestimated_population_skews_low_bound() {
        let resolver = resolver();
        let action = action(ActionKind::Contract, "Tracking");
        let agent = hack_str_agent();
        let desk = DeskSnapshot {
            city: CityState {
                pop: 1e9,
                pop_est: 2e9,
                ..CityState::default()
            },
            ..desk()
        };
        let real = resolver
            .success_chance(&action, &desk, &agent, ChanceMode::Real)
            .unwrap();
        let est = resolver
            .success_chance(&action, &desk, &agent, ChanceMode::Estimate)
            .unwrap();
        let diff = (real - est).abs();

        let (low, high) = resolver.est_success_chance(&action, &desk, &agent).unwrap();
        assert_eq!(high, real + diff);
        assert_eq!(low, (real - diff) * 0.5);
    }

    #[test]
    fn attempt_draws_once_against_real_chance() {
        let resolver = resolver();
        let action = action(ActionKind::General, "Tracking");
        let agent = hack_str_agent();
        let chance = resolver
            .success_chance(&action, &desk(), &agent, ChanceMode::Real)
            .unwrap();
        assert!(chance < 0.5);

        // StepRng with this state yields 0.5 for every f64 draw.
        let mut rng = StepRng::new(1 << 63, 0);
        assert!(!resolver.attempt(&action, &desk(), &agent, &mut rng).unwrap());

        let mut rng = StepRng::new(0, 0);
        assert!(resolver.attempt(&action, &desk(), &agent, &mut rng).unwrap());
    }

    #[test]
    fn resolve_attempt_agrees_with_attempt() {
        let resolver = resolver();
        let mut action = action(ActionKind::Contract, "Tracking");
        action.base_difficulty = 20.0;
        let agent = hack_str_agent();

        let mut preview_rng = SmallRng::seed_from_u64(17);
        let mut live_rng = SmallRng::seed_from_u64(17);
        for _ in 0..64 {
            let expected = resolver
                .attempt(&action, &desk(), &agent, &mut preview_rng)
                .unwrap();
            let outcome = resolver
                .resolve_attempt(&mut action.clone(), &desk(), &agent, &mut live_rng)
                .unwrap();
            assert_eq!(outcome.success, expected);
        }
    }

    #[test]
    fn zero_over_zero_chance_is_an_error() {
        let resolver = resolver();
        let mut action = action(ActionKind::General, "Tracking");
        action.base_difficulty = 0.0;
        let err = resolver
            .success_chance(&action, &desk(), &AgentProfile::default(), ChanceMode::Real)
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::NanChance {
                action: "Tracking".to_string()
            }
        );

        let mut rng = StepRng::new(0, 0);
        assert!(resolver
            .attempt(&action, &desk(), &AgentProfile::default(), &mut rng)
            .is_err());
    }

    #[test]
    fn action_time_applies_floor_and_black_op_penalty() {
        let resolver = resolver();
        let agent = agent(100.0);
        let general = action(ActionKind::General, "Training");
        let mut black_op = action(ActionKind::BlackOp, "Operation Daedalus");
        black_op.base_difficulty = 100.0;

        let eff = 100f64;
        let stat_fac = 0.5
            * (eff.powf(0.04) + eff.powf(0.035) + eff / 5_000.0 + eff / 5_000.0);
        let expected = (10.0 / stat_fac).max(1.0);

        assert_eq!(
            resolver.action_time(&general, &desk(), &agent).unwrap(),
            expected.ceil() as u64
        );
        assert_eq!(
            resolver.action_time(&black_op, &desk(), &agent).unwrap(),
            (expected * 1.5).ceil() as u64
        );

        let mut trivial = general.clone();
        trivial.base_difficulty = 0.5;
        assert_eq!(resolver.action_time(&trivial, &desk(), &agent).unwrap(), 1);
    }

    #[test]
    fn resolve_attempt_levels_contracts_only() {
        let resolver = resolver();
        let agent = agent(1e9);
        let mut rng = SmallRng::seed_from_u64(7);

        let mut contract = ActionDefinition::new(
            ActionKind::Contract,
            ActionParams {
                count: Some(100),
                ..ActionParams::named("Tracking")
            },
            &mut rng,
        )
        .unwrap();
        let mut black_op = ActionDefinition::new(
            ActionKind::BlackOp,
            ActionParams {
                count: Some(1),
                ..ActionParams::named("Operation Centurion")
            },
            &mut rng,
        )
        .unwrap();

        let mut leveled = 0;
        for _ in 0..3 {
            let outcome = resolver
                .resolve_attempt(&mut contract, &desk(), &agent, &mut rng)
                .unwrap();
            assert!(outcome.success);
            assert_eq!(outcome.chance, 1.0);
            if outcome.leveled_up {
                leveled += 1;
            }
            resolver
                .resolve_attempt(&mut black_op, &desk(), &agent, &mut rng)
                .unwrap();
        }

        assert_eq!(leveled, 1);
        assert_eq!(contract.successes, 3);
        assert_eq!(contract.max_level, 2);
        assert_eq!(contract.level, 2);
        assert_eq!(black_op.successes, 3);
        assert_eq!(black_op.max_level, 1);
        assert_eq!(black_op.level, 1);
    }

    #[test]
    fn failed_attempt_counts_failure_without_leveling() {
        let resolver = resolver();
        let mut operation = action(ActionKind::Operation, "Sting Operation");
        operation.successes = 100;
        let agent = AgentProfile::default();
        let mut rng = StepRng::new(1 << 63, 0);

        let outcome = resolver
            .resolve_attempt(&mut operation, &desk(), &agent, &mut rng)
            .unwrap();
        assert!(!outcome.success);
        assert!(!outcome.leveled_up);
        assert_eq!(operation.failures, 1);
        assert_eq!(operation.max_level, 1);
    }
}
