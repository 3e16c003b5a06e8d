//! Evolutionary tuning of per-persona coaching strategies.
//!
//! Each persona owns a small population of [`EvolutionStrategy`] values.
//! Interaction feedback reinforces the current fittest strategy, and every
//! `min_interactions` interactions a generation runs: elites survive, the
//! rest of the population is refilled by crossover between elites or by
//! mutating one of them.
//!
//! Generations run inline on the caller's thread. Given a seeded RNG the
//! whole run is reproducible.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::coach::effectiveness_score;
use crate::error::Result;
use crate::interaction::{DismissalReason, Interaction, NudgeRecord, Outcome};
use crate::persona::{Persona, PersonaBook};
use crate::scoring::Dimension;
use crate::storage::EvolutionConfig;

/// Mutation strength used when seeding variations of the base strategies.
const SEED_MUTATION_STRENGTH: f64 = 0.1;

/// Content approach of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Consultative,
    Directive,
    Supportive,
    Technical,
    Efficiency,
    ToolsFocused,
    FlowAware,
    Productivity,
    Workspace,
    Creative,
    Visual,
    Empathetic,
}

/// When a strategy may interrupt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingRules {
    pub interval_minutes: u32,
    #[serde(default)]
    pub avoid_hours: Vec<u8>,
    #[serde(default)]
    pub quiet_hours: Vec<u8>,
}

impl TimingRules {
    fn new(interval_minutes: u32, avoid_hours: &[u8], quiet_hours: &[u8]) -> Self {
        Self {
            interval_minutes,
            avoid_hours: avoid_hours.to_vec(),
            quiet_hours: quiet_hours.to_vec(),
        }
    }

    /// Averaged interval (truncated), union of both hour lists.
    pub fn merge(&self, other: &TimingRules) -> TimingRules {
        let union = |a: &[u8], b: &[u8]| -> Vec<u8> {
            a.iter().chain(b).copied().collect::<BTreeSet<u8>>().into_iter().collect()
        };
        TimingRules {
            interval_minutes: (self.interval_minutes + other.interval_minutes) / 2,
            avoid_hours: union(&self.avoid_hours, &other.avoid_hours),
            quiet_hours: union(&self.quiet_hours, &other.quiet_hours),
        }
    }
}

/// One candidate coaching strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionStrategy {
    pub strategy_id: String,
    pub persona: Persona,
    pub template_type: TemplateType,
    pub language_style: String,
    pub confidence_threshold: f64,
    pub timing_rules: TimingRules,
    #[serde(default)]
    pub acceptance_rate: f64,
    #[serde(default)]
    pub effectiveness_score: f64,
    #[serde(default)]
    pub fitness_score: f64,
    #[serde(default)]
    pub generation: u32,
    #[serde(default)]
    pub mutations: Vec<String>,
}

impl EvolutionStrategy {
    /// Recompute and store `0.7 * acceptance + 0.3 * effectiveness`.
    pub fn calculate_fitness(&mut self) -> f64 {
        self.fitness_score = self.acceptance_rate * 0.7 + self.effectiveness_score * 0.3;
        self.fitness_score
    }
}

struct BaseStrategy {
    template_type: TemplateType,
    language_style: &'static str,
    confidence_threshold: f64,
    interval_minutes: u32,
    avoid_hours: &'static [u8],
    quiet_hours: &'static [u8],
}

const fn base(
    template_type: TemplateType,
    language_style: &'static str,
    confidence_threshold: f64,
    interval_minutes: u32,
    avoid_hours: &'static [u8],
    quiet_hours: &'static [u8],
) -> BaseStrategy {
    BaseStrategy {
        template_type,
        language_style,
        confidence_threshold,
        interval_minutes,
        avoid_hours,
        quiet_hours,
    }
}

static MANAGER_BASE: [BaseStrategy; 3] = [
    base(TemplateType::Consultative, "professional", 0.8, 60, &[8, 17, 18], &[]),
    base(TemplateType::Directive, "direct", 0.75, 45, &[12, 13], &[]),
    base(TemplateType::Supportive, "encouraging", 0.7, 90, &[8, 9], &[]),
];
static ANALYST_BASE: [BaseStrategy; 3] = [
    base(TemplateType::Technical, "detailed", 0.6, 30, &[12, 13], &[]),
    base(TemplateType::Efficiency, "data_driven", 0.65, 35, &[], &[]),
    base(TemplateType::ToolsFocused, "specific", 0.55, 25, &[], &[]),
];
static DEVELOPER_BASE: [BaseStrategy; 3] = [
    base(TemplateType::FlowAware, "technical", 0.7, 45, &[], &[9, 10, 11, 14, 15, 16]),
    base(TemplateType::Productivity, "direct", 0.75, 30, &[], &[10, 11, 15, 16]),
    base(TemplateType::Workspace, "practical", 0.65, 60, &[], &[9, 10, 14, 15]),
];
static DESIGNER_BASE: [BaseStrategy; 2] = [
    base(TemplateType::Creative, "inspiring", 0.7, 40, &[], &[]),
    base(TemplateType::Visual, "aesthetic", 0.65, 50, &[12, 13], &[]),
];
static SUPPORT_BASE: [BaseStrategy; 2] = [
    base(TemplateType::Empathetic, "empathetic", 0.5, 25, &[], &[]),
    base(TemplateType::Efficiency, "friendly", 0.55, 30, &[12], &[]),
];

fn base_strategies(persona: Persona) -> &'static [BaseStrategy] {
    match persona {
        Persona::Manager => &MANAGER_BASE,
        Persona::Analyst => &ANALYST_BASE,
        Persona::Developer => &DEVELOPER_BASE,
        Persona::Designer => &DESIGNER_BASE,
        Persona::CustomerSupport => &SUPPORT_BASE,
    }
}

/// Language styles a mutation may switch to.
pub fn language_palette(persona: Persona) -> &'static [&'static str] {
    match persona {
        Persona::Manager => &["professional", "consultative", "supportive", "direct"],
        Persona::Analyst => &["detailed", "data_driven", "specific", "technical"],
        Persona::Developer => &["technical", "direct", "practical", "concise"],
        Persona::Designer => &["inspiring", "aesthetic", "creative", "visual"],
        Persona::CustomerSupport => &["empathetic", "friendly", "reassuring", "concise"],
    }
}

fn prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Mutate in place. Each gene changes with probability `strength`; the
/// language style at half that rate.
pub fn mutate<R: Rng>(strategy: &mut EvolutionStrategy, strength: f64, rng: &mut R) {
    let mut applied = Vec::new();

    if rng.gen::<f64>() < strength {
        let delta: f64 = rng.gen_range(-0.1..=0.1);
        strategy.confidence_threshold = (strategy.confidence_threshold + delta).clamp(0.4, 0.9);
        applied.push(format!("confidence_delta_{delta:.2}"));
    }

    if rng.gen::<f64>() < strength {
        let delta: i32 = rng.gen_range(-15..=15);
        let interval = strategy.timing_rules.interval_minutes as i32 + delta;
        strategy.timing_rules.interval_minutes = interval.clamp(15, 120) as u32;
        applied.push(format!("interval_delta_{delta}"));
    }

    if rng.gen::<f64>() < strength * 0.5 {
        if let Some(style) = language_palette(strategy.persona).choose(rng) {
            if *style != strategy.language_style {
                strategy.language_style = style.to_string();
                applied.push(format!("language_to_{style}"));
            }
        }
    }

    strategy.generation += 1;
    strategy.mutations.extend(applied);
    strategy.strategy_id = format!("mut_{}_{}", prefix(&strategy.strategy_id, 12), strategy.generation);
}

/// Child of two parents. Scores start at zero.
pub fn crossover<R: Rng>(a: &EvolutionStrategy, b: &EvolutionStrategy, rng: &mut R) -> EvolutionStrategy {
    EvolutionStrategy {
        strategy_id: format!("cross_{}_{}", prefix(&a.strategy_id, 8), prefix(&b.strategy_id, 8)),
        persona: a.persona,
        template_type: if rng.gen_bool(0.5) { a.template_type } else { b.template_type },
        language_style: if rng.gen_bool(0.5) {
            a.language_style.clone()
        } else {
            b.language_style.clone()
        },
        confidence_threshold: (a.confidence_threshold + b.confidence_threshold) / 2.0,
        timing_rules: a.timing_rules.merge(&b.timing_rules),
        acceptance_rate: 0.0,
        effectiveness_score: 0.0,
        fitness_score: 0.0,
        generation: a.generation.max(b.generation) + 1,
        mutations: vec![format!("crossover_from_{}_{}", a.strategy_id, b.strategy_id)],
    }
}

fn seed_population<R: Rng>(persona: Persona, size: usize, rng: &mut R) -> Vec<EvolutionStrategy> {
    let bases = base_strategies(persona);
    let variations = size / bases.len() + 1;
    let mut population = Vec::with_capacity(size);

    'outer: for (i, b) in bases.iter().enumerate() {
        for variation in 0..variations {
            if population.len() >= size {
                break 'outer;
            }
            let mut strategy = EvolutionStrategy {
                strategy_id: format!("{}_{i}_{variation}", persona.as_str()),
                persona,
                template_type: b.template_type,
                language_style: b.language_style.to_string(),
                confidence_threshold: b.confidence_threshold,
                timing_rules: TimingRules::new(b.interval_minutes, b.avoid_hours, b.quiet_hours),
                acceptance_rate: 0.0,
                effectiveness_score: 0.0,
                fitness_score: 0.0,
                generation: 0,
                mutations: Vec::new(),
            };
            if variation > 0 {
                mutate(&mut strategy, SEED_MUTATION_STRENGTH, rng);
            }
            population.push(strategy);
        }
    }
    population
}

/// First strategy with the highest fitness.
fn fittest_index(population: &[EvolutionStrategy]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, s) in population.iter().enumerate() {
        match best {
            Some(b) if population[b].fitness_score >= s.fitness_score => {}
            _ => best = Some(idx),
        }
    }
    best
}

/// Running totals across the engine's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionMetrics {
    pub total_interactions: u64,
    /// Acceptance over the recent window (0.0-1.0)
    pub acceptance_rate: f64,
    pub generations: u64,
    pub best_fitness: f64,
}

/// Per-persona outcome of one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaGeneration {
    pub best_fitness: f64,
    pub elite_count: usize,
    pub population_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u64,
    pub personas: BTreeMap<Persona, PersonaGeneration>,
    pub best_fitness: f64,
}

/// Persisted engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionState {
    pub saved_at: DateTime<Utc>,
    pub metrics: EvolutionMetrics,
    #[serde(default)]
    pub history: Vec<Interaction>,
    pub populations: BTreeMap<Persona, Vec<EvolutionStrategy>>,
}

impl EvolutionState {
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!("Evolution state saved to {}", path.display());
        Ok(())
    }

    /// Missing or corrupt files yield `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Could not read evolution state {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!("Ignoring corrupt evolution state {}: {e}", path.display());
                None
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionMetadata {
    pub total_generations: u64,
    pub total_interactions: u64,
    pub best_fitness_score: f64,
    pub export_timestamp: DateTime<Utc>,
}

/// Best strategy per persona, in the exported file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolvedIntelligence {
    pub evolution_metadata: EvolutionMetadata,
    pub persona_strategies: BTreeMap<Persona, EvolutionStrategy>,
}

pub struct EvolutionEngine<R: Rng> {
    config: EvolutionConfig,
    populations: BTreeMap<Persona, Vec<EvolutionStrategy>>,
    metrics: EvolutionMetrics,
    history: Vec<Interaction>,
    rng: R,
}

impl<R: Rng> EvolutionEngine<R> {
    pub fn new(config: EvolutionConfig, mut rng: R) -> Self {
        let populations = Persona::all()
            .into_iter()
            .map(|p| (p, seed_population(p, config.population_size, &mut rng)))
            .collect();
        Self {
            config,
            populations,
            metrics: EvolutionMetrics::default(),
            history: Vec::new(),
            rng,
        }
    }

    pub fn populations(&self) -> &BTreeMap<Persona, Vec<EvolutionStrategy>> {
        &self.populations
    }

    pub fn metrics(&self) -> &EvolutionMetrics {
        &self.metrics
    }

    pub fn history(&self) -> &[Interaction] {
        &self.history
    }

    /// Feed one interaction back. Returns a report when it completed a
    /// generation.
    pub fn process_feedback(&mut self, interaction: &Interaction) -> Option<GenerationReport> {
        self.history.push(interaction.clone());
        let keep = self.config.history_cap.max(self.config.acceptance_window);
        if self.history.len() > keep {
            let excess = self.history.len() - keep;
            self.history.drain(..excess);
        }

        self.metrics.total_interactions += 1;
        let window = self.config.acceptance_window.max(1);
        let recent = &self.history[self.history.len().saturating_sub(window)..];
        let accepted = recent.iter().filter(|i| i.outcome.accepted).count();
        self.metrics.acceptance_rate = accepted as f64 / recent.len() as f64;

        if let Some(population) = self.populations.get_mut(&interaction.persona) {
            if let Some(idx) = fittest_index(population) {
                let best = &mut population[idx];
                let outcome = &interaction.outcome;
                if outcome.accepted {
                    best.acceptance_rate = (best.acceptance_rate + 0.1).min(1.0);
                    best.effectiveness_score =
                        (best.effectiveness_score + outcome.productivity_impact).clamp(0.0, 1.0);
                } else {
                    best.acceptance_rate = (best.acceptance_rate - 0.05).max(0.0);
                }
                best.calculate_fitness();
            }
        }

        let every = self.config.min_interactions;
        if every > 0 && self.metrics.total_interactions % every == 0 {
            Some(self.evolve_generation())
        } else {
            None
        }
    }

    /// Run one generation over every population with at least two members.
    pub fn evolve_generation(&mut self) -> GenerationReport {
        let mut personas = BTreeMap::new();
        let target = self.config.population_size;

        for (persona, population) in self.populations.iter_mut() {
            if population.len() < 2 {
                continue;
            }
            for s in population.iter_mut() {
                s.calculate_fitness();
            }
            population.sort_by(|a, b| b.fitness_score.total_cmp(&a.fitness_score));

            let elite_count = ((population.len() as f64 * self.config.elite_ratio) as usize).max(1);
            let elites: Vec<EvolutionStrategy> = population[..elite_count.min(population.len())].to_vec();
            let mut next = elites.clone();

            while next.len() < target {
                if elites.len() >= 2 && self.rng.gen::<f64>() < self.config.crossover_rate {
                    let parents: Vec<&EvolutionStrategy> = elites.choose_multiple(&mut self.rng, 2).collect();
                    next.push(crossover(parents[0], parents[1], &mut self.rng));
                } else if let Some(parent) = elites.choose(&mut self.rng) {
                    let mut child = parent.clone();
                    mutate(&mut child, self.config.mutation_rate, &mut self.rng);
                    next.push(child);
                }
            }
            next.truncate(target);

            let best_fitness = next.iter().map(|s| s.fitness_score).fold(0.0, f64::max);
            personas.insert(
                *persona,
                PersonaGeneration {
                    best_fitness,
                    elite_count,
                    population_size: next.len(),
                },
            );
            *population = next;
        }

        self.metrics.generations += 1;
        self.metrics.best_fitness = self
            .populations
            .values()
            .flatten()
            .map(|s| s.fitness_score)
            .fold(0.0, f64::max);

        tracing::info!(
            "Generation {} complete, best fitness {:.3}",
            self.metrics.generations,
            self.metrics.best_fitness
        );
        tracing::debug!("Generation detail: {:?}", personas);

        GenerationReport {
            generation: self.metrics.generations,
            personas,
            best_fitness: self.metrics.best_fitness,
        }
    }

    /// Fittest strategy per persona (first one on ties).
    pub fn best_strategies(&self) -> BTreeMap<Persona, &EvolutionStrategy> {
        self.populations
            .iter()
            .filter_map(|(p, pop)| fittest_index(pop).map(|idx| (*p, &pop[idx])))
            .collect()
    }

    pub fn intelligence(&self, now: DateTime<Utc>) -> EvolvedIntelligence {
        EvolvedIntelligence {
            evolution_metadata: EvolutionMetadata {
                total_generations: self.metrics.generations,
                total_interactions: self.metrics.total_interactions,
                best_fitness_score: self.metrics.best_fitness,
                export_timestamp: now,
            },
            persona_strategies: self
                .best_strategies()
                .into_iter()
                .map(|(p, s)| (p, s.clone()))
                .collect(),
        }
    }

    /// Write the best strategies as pretty JSON.
    pub fn export_intelligence(&self, path: &Path, now: DateTime<Utc>) -> Result<EvolvedIntelligence> {
        let intelligence = self.intelligence(now);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&intelligence)?)?;
        tracing::info!("Exported evolved intelligence to {}", path.display());
        Ok(intelligence)
    }

    pub fn state(&self, now: DateTime<Utc>) -> EvolutionState {
        let start = self.history.len().saturating_sub(self.config.history_cap);
        EvolutionState {
            saved_at: now,
            metrics: self.metrics.clone(),
            history: self.history[start..].to_vec(),
            populations: self.populations.clone(),
        }
    }

    /// Replace metrics, history and any persona populations present in `state`.
    pub fn restore(&mut self, state: EvolutionState) {
        self.metrics = state.metrics;
        self.history = state.history;
        for (persona, population) in state.populations {
            if !population.is_empty() {
                self.populations.insert(persona, population);
            }
        }
    }

    pub fn save_state(&self, path: &Path, now: DateTime<Utc>) -> Result<()> {
        self.state(now).save(path)
    }

    /// Restore from `path` if a readable state exists there.
    pub fn load_state(&mut self, path: &Path) -> bool {
        match EvolutionState::load(path) {
            Some(state) => {
                self.restore(state);
                true
            }
            None => false,
        }
    }

    /// Push each persona's best threshold, interval and avoid hours into
    /// the coach profiles. Returns the personas updated.
    pub fn apply_to(&self, book: &mut PersonaBook) -> Vec<Persona> {
        let mut updated = Vec::new();
        for (persona, best) in self.best_strategies() {
            let profile = book.get_mut(persona);
            profile.confidence_override = Some(best.confidence_threshold);
            profile.nudge_interval_minutes = best.timing_rules.interval_minutes;
            let hours: BTreeSet<u8> = profile
                .avoid_hours
                .iter()
                .chain(&best.timing_rules.avoid_hours)
                .copied()
                .collect();
            profile.avoid_hours = hours.into_iter().collect();
            updated.push(persona);
        }
        tracing::info!("Applied evolved strategies to {} personas", updated.len());
        updated
    }
}

fn synthetic_acceptance(persona: Persona) -> f64 {
    match persona {
        Persona::Manager => 0.57,
        Persona::Analyst => 0.875,
        Persona::Developer => 0.78,
        Persona::Designer => 1.0,
        Persona::CustomerSupport => 0.8,
    }
}

/// Random interactions for evolution runs without a real log, one minute
/// apart from `start`.
pub fn synthetic_interactions<R: Rng>(count: usize, start: DateTime<Utc>, rng: &mut R) -> Vec<Interaction> {
    const DIMENSIONS: [Dimension; 4] = [
        Dimension::Focus,
        Dimension::Productivity,
        Dimension::Wellbeing,
        Dimension::ValueCreation,
    ];
    const REASONS: [DismissalReason; 3] = [
        DismissalReason::Busy,
        DismissalReason::NotRelevant,
        DismissalReason::TooFrequent,
    ];
    let personas = Persona::all();

    (0..count)
        .map(|i| {
            let persona = personas[rng.gen_range(0..personas.len())];
            let dimension = DIMENSIONS[rng.gen_range(0..DIMENSIONS.len())];
            let confidence: f64 = rng.gen_range(0.5..=0.9);
            let accepted = rng.gen::<f64>() < synthetic_acceptance(persona);

            let outcome = if accepted {
                Outcome::accepted(rng.gen_range(0.08..=0.20), rng.gen_range(0.05..=0.15))
            } else {
                Outcome::dismissed(REASONS[rng.gen_range(0..REASONS.len())])
            };
            let outcome = outcome.with_response_time(rng.gen_range(2.0..=30.0));

            Interaction {
                timestamp: start + Duration::minutes(i as i64),
                user_id: rng.gen_range(1..=100),
                persona,
                nudge: NudgeRecord {
                    id: None,
                    nudge_type: dimension.nudge_type(),
                    nudge_text: format!("Synthetic nudge for {persona}"),
                    confidence,
                    strategy: None,
                    trigger_dimension: Some(dimension),
                    urgency_score: None,
                },
                effectiveness_score: effectiveness_score(confidence, &outcome),
                outcome,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    fn engine(seed: u64) -> EvolutionEngine<Mcg128Xsl64> {
        EvolutionEngine::new(EvolutionConfig::default(), Mcg128Xsl64::seed_from_u64(seed))
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    fn feedback(persona: Persona, accepted: bool) -> Interaction {
        let mut rng = Mcg128Xsl64::seed_from_u64(1);
        let mut i = synthetic_interactions(1, start(), &mut rng).remove(0);
        i.persona = persona;
        i.outcome = if accepted {
            Outcome::accepted(0.15, 0.1)
        } else {
            Outcome::dismissed(DismissalReason::Busy)
        };
        i
    }

    #[test]
    fn seeds_full_population_per_persona() {
        let e = engine(7);
        assert_eq!(e.populations().len(), 5);
        for pop in e.populations().values() {
            assert_eq!(pop.len(), 8);
        }
        let manager = &e.populations()[&Persona::Manager];
        assert_eq!(manager[0].strategy_id, "manager_0_0");
        assert_eq!(manager[0].generation, 0);
        // variations are mutated, which bumps the generation
        assert_eq!(manager[1].generation, 1);
        assert!(manager[1].strategy_id.starts_with("mut_manager_0_1"));
    }

    #[test]
    fn fitness_formula() {
        let mut s = engine(1).populations()[&Persona::Analyst][0].clone();
        s.acceptance_rate = 0.8;
        s.effectiveness_score = 0.5;
        assert!((s.calculate_fitness() - 0.71).abs() < 1e-9);
    }

    #[test]
    fn feedback_reinforces_fittest_and_triggers_generation() {
        let mut e = engine(3);
        assert!(e.process_feedback(&feedback(Persona::Designer, true)).is_none());
        let best = e.best_strategies()[&Persona::Designer].clone();
        assert!((best.acceptance_rate - 0.1).abs() < 1e-9);
        assert!((best.effectiveness_score - 0.15).abs() < 1e-9);

        for _ in 0..3 {
            assert!(e.process_feedback(&feedback(Persona::Designer, false)).is_none());
        }
        let report = e.process_feedback(&feedback(Persona::Designer, true));
        let report = report.expect("fifth interaction runs a generation");
        assert_eq!(report.generation, 1);
        assert_eq!(report.personas.len(), 5);
        assert!((e.metrics().acceptance_rate - 0.4).abs() < 1e-9);
    }

    #[test]
    fn rejection_floors_at_zero() {
        let mut e = engine(3);
        e.process_feedback(&feedback(Persona::Analyst, false));
        let best = &e.best_strategies()[&Persona::Analyst];
        assert_eq!(best.acceptance_rate, 0.0);
    }

    #[test]
    fn generation_keeps_size_and_elites() {
        let mut e = engine(11);
        let pop = e.populations.get_mut(&Persona::Developer).unwrap();
        pop[5].acceptance_rate = 0.9;
        pop[5].effectiveness_score = 0.6;
        pop[6].acceptance_rate = 0.7;
        let top = pop[5].clone();
        let second_id = pop[6].strategy_id.clone();

        e.evolve_generation();
        let pop = &e.populations()[&Persona::Developer];
        assert_eq!(pop.len(), 8);
        // elite_count = floor(8 * 0.25) = 2, sorted to the front
        assert_eq!(pop[0].strategy_id, top.strategy_id);
        assert!((pop[0].fitness_score - 0.81).abs() < 1e-9);
        assert_eq!(pop[1].strategy_id, second_id);
        assert!(e.metrics().best_fitness >= 0.81);
    }

    #[test]
    fn mutation_stays_in_bounds() {
        let mut rng = Mcg128Xsl64::seed_from_u64(5);
        let mut s = engine(5).populations()[&Persona::Manager][0].clone();
        for _ in 0..200 {
            mutate(&mut s, 1.0, &mut rng);
            assert!((0.4..=0.9).contains(&s.confidence_threshold));
            assert!((15..=120).contains(&s.timing_rules.interval_minutes));
            assert!(language_palette(Persona::Manager).contains(&s.language_style.as_str()));
        }
        assert_eq!(s.generation, 200);
        assert!(s.strategy_id.starts_with("mut_"));
    }

    #[test]
    fn crossover_averages_and_unions() {
        let e = engine(9);
        let pop = &e.populations()[&Persona::Manager];
        let (a, b) = (&pop[0], &pop[3]);
        let mut rng = Mcg128Xsl64::seed_from_u64(2);
        let child = crossover(a, b, &mut rng);
        assert_eq!(child.strategy_id, format!("cross_{}_{}", prefix(&a.strategy_id, 8), prefix(&b.strategy_id, 8)));
        assert!((child.confidence_threshold - (a.confidence_threshold + b.confidence_threshold) / 2.0).abs() < 1e-9);
        assert_eq!(
            child.timing_rules.interval_minutes,
            (a.timing_rules.interval_minutes + b.timing_rules.interval_minutes) / 2
        );
        for h in a.timing_rules.avoid_hours.iter().chain(&b.timing_rules.avoid_hours) {
            assert!(child.timing_rules.avoid_hours.contains(h));
        }
        assert!(child.timing_rules.avoid_hours.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(child.generation, a.generation.max(b.generation) + 1);
        assert_eq!(child.fitness_score, 0.0);
    }

    #[test]
    fn state_roundtrip_caps_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evolution_state.json");
        let mut e = engine(4);
        let mut rng = Mcg128Xsl64::seed_from_u64(4);
        for i in synthetic_interactions(120, start(), &mut rng) {
            e.process_feedback(&i);
        }
        e.save_state(&path, start()).unwrap();

        let mut restored = engine(99);
        assert!(restored.load_state(&path));
        assert_eq!(restored.history().len(), 100);
        assert_eq!(restored.metrics().generations, e.metrics().generations);
        assert_eq!(restored.metrics().total_interactions, 120);
        for (persona, pop) in e.populations() {
            let ids: Vec<&str> = pop.iter().map(|s| s.strategy_id.as_str()).collect();
            let restored_ids: Vec<&str> = restored.populations()[persona]
                .iter()
                .map(|s| s.strategy_id.as_str())
                .collect();
            assert_eq!(ids, restored_ids);
        }

        assert!(!engine(1).load_state(&dir.path().join("missing.json")));
    }

    #[test]
    fn export_lists_best_per_persona() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evolved_intelligence.json");
        let e = engine(8);
        let exported = e.export_intelligence(&path, start()).unwrap();
        assert_eq!(exported.persona_strategies.len(), 5);

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(json["evolution_metadata"]["total_generations"].is_u64());
        assert!(json["persona_strategies"]["developer"]["confidence_threshold"].is_f64());
    }

    #[test]
    fn apply_updates_persona_profiles() {
        let mut e = engine(2);
        let pop = e.populations.get_mut(&Persona::Manager).unwrap();
        pop[2].acceptance_rate = 1.0;
        pop[2].calculate_fitness();
        let best = pop[2].clone();

        let mut book = PersonaBook::default();
        let updated = e.apply_to(&mut book);
        assert_eq!(updated.len(), 5);
        let profile = book.get(Persona::Manager);
        assert_eq!(profile.confidence_override, Some(best.confidence_threshold));
        assert_eq!(profile.nudge_interval_minutes, best.timing_rules.interval_minutes);
        for h in &best.timing_rules.avoid_hours {
            assert!(profile.avoid_hours.contains(h));
        }
    }

    #[test]
    fn synthetic_interactions_are_valid() {
        let mut rng = Mcg128Xsl64::seed_from_u64(12);
        let rows = synthetic_interactions(50, start(), &mut rng);
        assert_eq!(rows.len(), 50);
        for row in &rows {
            assert!(row.validate().is_ok());
            assert!((1..=100).contains(&row.user_id));
            if !row.outcome.accepted {
                assert_eq!(row.effectiveness_score, 0.0);
            }
        }
        assert!(rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}
