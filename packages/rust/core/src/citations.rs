//! Bibliography built from harvested evidence.

use std::collections::HashSet;

use url::Url;

use researchdesk_shared::{Citation, EvidenceItem};

/// One citation per distinct URL, in evidence order.
///
/// Ids are `C{n}` where `n` is the 1-based position of the first evidence
/// item from that URL, so they line up with the `[n]` markers in evidence
/// bullets. Missing titles and publishers fall back to the URL host.
pub fn build_citations(evidence: &[EvidenceItem]) -> Vec<Citation> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut citations = Vec::new();

    for (i, item) in evidence.iter().enumerate() {
        let url = item.url.trim();
        if url.is_empty() || !seen.insert(url) {
            continue;
        }

        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        let title = Some(item.title.trim())
            .filter(|t| !t.is_empty())
            .map_or_else(|| host.clone(), str::to_string);
        let publisher = item
            .publisher
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map_or_else(|| host.clone(), str::to_string);

        citations.push(Citation {
            id: format!("C{}", i + 1),
            url: url.to_string(),
            title,
            publisher,
        });
    }

    citations
}
