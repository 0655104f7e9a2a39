use thiserror::Error;
use tracing::{debug, warn};

use super::fallback::{fallback_narrative, headline, Narrative, NarrativeSource};
use super::payload::NarrativePayload;
use crate::valuation::decision::investment_verdict;
use crate::CapexRiskResult;

/// Ways the external generator can decline a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrativeFailure {
    #[error("rate limited")]
    RateLimited,
    #[error("service unavailable")]
    Unavailable,
    #[error("network error: {0}")]
    Network(String),
}

/// Remote commentary generator, supplied by the caller.
pub trait NarrativeService {
    fn generate(&mut self, payload: &NarrativePayload) -> Result<String, NarrativeFailure>;
}

/// Commentary cache keyed by [`NarrativePayload::canonical_key`], owned by
/// the caller.
pub trait NarrativeCache {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&mut self, key: String, value: String);
}

fn from_text(payload: &NarrativePayload, text: String, source: NarrativeSource) -> Narrative {
    let verdict = investment_verdict(payload.npv, payload.irr, payload.discount_rate);
    Narrative {
        verdict,
        headline: headline(verdict).to_string(),
        commentary: text,
        source,
    }
}

/// Cache first, then the service, then the local fallback.
///
/// Only service successes are cached; a fallback is recomputed each time
/// so a later call can still reach the service.
pub fn narrate<S, C>(
    service: &mut S,
    cache: &mut C,
    payload: &NarrativePayload,
) -> CapexRiskResult<Narrative>
where
    S: NarrativeService + ?Sized,
    C: NarrativeCache + ?Sized,
{
    let key = payload.canonical_key()?;

    if let Some(text) = cache.get(&key) {
        debug!("narrative cache hit");
        return Ok(from_text(payload, text, NarrativeSource::Cache));
    }

    match service.generate(payload) {
        Ok(text) => {
            cache.put(key, text.clone());
            Ok(from_text(payload, text, NarrativeSource::Service))
        }
        Err(failure) => {
            warn!(%failure, "narrative service failed, using local fallback");
            Ok(fallback_narrative(payload))
        }
    }
}
