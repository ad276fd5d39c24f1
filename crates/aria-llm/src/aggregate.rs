//! Response aggregation: fan a prompt out to a provider set and reduce the
//! partial-failure map to one answer.
//!
//! Fan-out is sequential in provider-table order, which is exactly what makes
//! `first_valid` deterministic: it is the first provider in iteration order
//! that answered, not the fastest one.

use crate::gateway::ProviderGateway;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Confidence attached to answers learned from collaboration; external
/// knowledge never ranks above locally ingested facts.
const COLLABORATION_CONFIDENCE: f64 = 0.8;

/// Reduction rule for a multi-provider response set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// First non-null result in provider-iteration order.
    FirstValid,
    /// Longest response wins; iteration order breaks ties.
    Longest,
    /// Return the raw map unfiltered.
    All,
    /// Unrecognized strategy text; falls back to an arbitrary valid answer.
    Other(String),
}

impl Strategy {
    pub fn parse(s: &str) -> Self {
        match s {
            "first_valid" => Self::FirstValid,
            "longest" => Self::Longest,
            "all" => Self::All,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Outcome of a selection: one answer, the full map, or nothing valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Text(String),
    All(BTreeMap<String, Option<String>>),
    None,
}

impl Selection {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Queries a set of providers through the gateway and reconciles the results.
pub struct Aggregator {
    gateway: Arc<ProviderGateway>,
}

impl Aggregator {
    pub fn new(gateway: Arc<ProviderGateway>) -> Self {
        Self { gateway }
    }

    /// Query each target provider in order. A failing provider maps to
    /// `None` instead of aborting the batch; every answer is persisted as
    /// knowledge for later retrieval.
    pub async fn collaborate(
        &self,
        prompt: &str,
        providers: Option<&[String]>,
    ) -> BTreeMap<String, Option<String>> {
        let targets: Vec<String> = match providers {
            Some(list) => list.to_vec(),
            None => self.gateway.default_targets(),
        };
        debug!(targets = targets.len(), "collaboration fan-out");

        let mut results = BTreeMap::new();
        for name in targets {
            let outcome = match self.gateway.query(&name, prompt, None).await {
                Ok(text) => Some(text),
                Err(e) => {
                    debug!(provider = %name, error = %e, "provider dropped from batch");
                    None
                }
            };
            results.insert(name, outcome);
        }

        for (name, text) in &results {
            if let Some(text) = text {
                let topic = format!("collaboration_{name}");
                if let Err(e) = self.gateway.store().add_knowledge(
                    &topic,
                    text,
                    name,
                    COLLABORATION_CONFIDENCE,
                ) {
                    warn!(provider = %name, error = %e, "failed to persist collaboration result");
                }
            }
        }

        results
    }

    /// Reduce a fan-out to a single answer per the strategy. Returns
    /// `Selection::None` when no provider produced anything.
    pub async fn select_best(
        &self,
        prompt: &str,
        providers: Option<&[String]>,
        strategy: Strategy,
    ) -> Selection {
        let responses = self.collaborate(prompt, providers).await;

        if strategy == Strategy::All {
            return Selection::All(responses);
        }

        let valid: Vec<(&String, &String)> = responses
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|t| (k, t)))
            .collect();
        if valid.is_empty() {
            warn!("no valid response from any provider");
            return Selection::None;
        }

        match strategy {
            Strategy::FirstValid => Selection::Text(valid[0].1.clone()),
            Strategy::Longest => {
                // Strictly-greater comparison keeps the earliest provider on ties.
                let mut best = valid[0];
                for candidate in &valid[1..] {
                    if candidate.1.len() > best.1.len() {
                        best = *candidate;
                    }
                }
                Selection::Text(best.1.clone())
            }
            Strategy::Other(name) => {
                warn!(strategy = %name, "unknown strategy, returning arbitrary valid response");
                Selection::Text(valid[0].1.clone())
            }
            Strategy::All => unreachable!("handled above"),
        }
    }
}
