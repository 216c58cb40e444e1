//! Prometheus metrics for the quest engine.
//!
//! [`EngineMetrics`] owns a dedicated [`Registry`] so an embedding service
//! can encode it into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts,
    Registry,
};

pub struct EngineMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Completion attempts submitted.
    pub attempts: IntCounter,
    /// Attempts that ended `completed`.
    pub completions: IntCounter,
    /// Attempts that ended `failed`, by failure code.
    pub failures: IntCounterVec,
    /// Failures caused by configuration or unreachable collaborators.
    pub infrastructure_failures: IntCounter,
    /// Submissions rejected by the anti-spoofing gate.
    pub spoofing_rejections: IntCounter,
    /// Calls that reached (or tried to reach) the image classifier.
    pub ai_calls: IntCounter,
    /// AI layers passed by the unverified stand-in.
    pub unverified_passes: IntCounter,
    /// Chapter unlock attempts, by outcome.
    pub unlocks: IntCounterVec,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Orchestrator run time in milliseconds.
    pub verification_latency_ms: Histogram,
}

impl EngineMetrics {
    /// Create a fresh set of metrics under a new [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let attempts = register_int_counter_with_registry!(
            Opts::new("quest_attempts_total", "Completion attempts submitted"),
            registry
        )?;

        let completions = register_int_counter_with_registry!(
            Opts::new("quest_completions_total", "Attempts completed and claimed"),
            registry
        )?;

        let failures = register_int_counter_vec_with_registry!(
            Opts::new("quest_failures_total", "Failed attempts by failure code"),
            &["code"],
            registry
        )?;

        let infrastructure_failures = register_int_counter_with_registry!(
            Opts::new(
                "quest_infrastructure_failures_total",
                "Failures caused by configuration or unreachable collaborators"
            ),
            registry
        )?;

        let spoofing_rejections = register_int_counter_with_registry!(
            Opts::new(
                "quest_spoofing_rejections_total",
                "Submissions rejected by the anti-spoofing gate"
            ),
            registry
        )?;

        let ai_calls = register_int_counter_with_registry!(
            Opts::new("quest_ai_calls_total", "Image classifier calls"),
            registry
        )?;

        let unverified_passes = register_int_counter_with_registry!(
            Opts::new(
                "quest_ai_unverified_passes_total",
                "AI layers passed without a configured classifier"
            ),
            registry
        )?;

        let unlocks = register_int_counter_vec_with_registry!(
            Opts::new("quest_chapter_unlocks_total", "Chapter unlock attempts by outcome"),
            &["outcome"],
            registry
        )?;

        // 1 ms → ~32 s; the classifier timeout dominates the tail.
        let verification_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "quest_verification_latency_ms",
                "Verification run time in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 16)?),
            registry
        )?;

        Ok(Self {
            registry,
            attempts,
            completions,
            failures,
            infrastructure_failures,
            spoofing_rejections,
            ai_calls,
            unverified_passes,
            unlocks,
            verification_latency_ms,
        })
    }

    /// Encode every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let mut buf = Vec::new();
        prometheus::TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
