use std::collections::HashSet;

use tracing::debug;

use crate::domain::{ArticleIndex, CandidateItem};

/// Filters candidate items against a feed's existing articles.
///
/// Three tiers, checked in order of signal reliability: link, then guid,
/// then exact title. The title tier is deliberately loose, a concession to
/// feeds that rewrite links and regenerate guids on every publish. Accepted
/// candidates immediately join the lookup sets, so duplicates inside a
/// single incoming batch are caught too.
pub struct DuplicateDetector;

impl DuplicateDetector {
    pub fn filter(candidates: Vec<CandidateItem>, existing: &ArticleIndex) -> Vec<CandidateItem> {
        let mut links: HashSet<String> = existing
            .links
            .iter()
            .filter(|l| !l.is_empty())
            .cloned()
            .collect();
        let mut guids: HashSet<String> = existing
            .guids
            .iter()
            .filter(|g| !g.is_empty())
            .cloned()
            .collect();
        let mut titles: HashSet<String> = existing
            .titles
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect();

        let mut accepted = Vec::new();

        for candidate in candidates {
            if links.contains(&candidate.link) {
                debug!(link = %candidate.link, "skipping candidate: duplicate link");
                continue;
            }
            if let Some(guid) = candidate.guid.as_deref() {
                if guids.contains(guid) {
                    debug!(guid, "skipping candidate: duplicate guid");
                    continue;
                }
            }
            if titles.contains(&candidate.title) {
                debug!(title = %candidate.title, "skipping candidate: duplicate title");
                continue;
            }

            links.insert(candidate.link.clone());
            if let Some(guid) = candidate.guid.clone() {
                if !guid.is_empty() {
                    guids.insert(guid);
                }
            }
            titles.insert(candidate.title.clone());
            accepted.push(candidate);
        }

        accepted
    }
}
