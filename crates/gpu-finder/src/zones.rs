//! Zone catalog resolution.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::FinderResult;
use crate::providers::{ComputeApi, ZoneStatus};

/// A zone and the region it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneInfo {
    /// Zone name (e.g., "us-central1-a").
    pub zone: String,
    /// Region name (e.g., "us-central1").
    pub region: String,
}

impl ZoneInfo {
    /// Build a zone entry, deriving its region from the name.
    #[must_use]
    pub fn new(zone: impl Into<String>) -> Self {
        let zone = zone.into();
        let region = region_of(&zone);
        Self { zone, region }
    }
}

/// Region of a zone: the zone name without its `-<letter>` suffix.
#[must_use]
pub fn region_of(zone: &str) -> String {
    let mut chars = zone.chars();
    chars.next_back();
    chars.next_back();
    chars.as_str().to_string()
}

/// List every UP zone of a project, following pagination to the end.
///
/// # Errors
/// Propagates provider listing errors.
pub async fn list_zones(api: &dyn ComputeApi, project: &str) -> FinderResult<Vec<ZoneInfo>> {
    let mut zones = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = api.list_zones(project, page_token.as_deref()).await?;

        for zone in page.items {
            if zone.status == ZoneStatus::Up {
                zones.push(ZoneInfo::new(zone.name));
            } else {
                debug!(zone = %zone.name, status = %zone.status, "Skipping zone");
            }
        }

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    info!(project = %project, count = zones.len(), "Resolved UP zones");
    Ok(zones)
}

/// Keep only the zones named in `allow`; an empty allow-list keeps all.
#[must_use]
pub fn restrict_to(zones: Vec<ZoneInfo>, allow: &[String]) -> Vec<ZoneInfo> {
    if allow.is_empty() {
        return zones;
    }
    zones
        .into_iter()
        .filter(|z| allow.iter().any(|a| a == &z.zone))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_of() {
        assert_eq!(region_of("us-central1-a"), "us-central1");
        assert_eq!(region_of("europe-west4-b"), "europe-west4");
        assert_eq!(region_of("asia-northeast1-c"), "asia-northeast1");
        assert_eq!(region_of("a"), "");
    }

    #[test]
    fn test_restrict_to() {
        let zones = vec![
            ZoneInfo::new("us-central1-a"),
            ZoneInfo::new("us-central1-b"),
            ZoneInfo::new("europe-west4-a"),
        ];

        let all = restrict_to(zones.clone(), &[]);
        assert_eq!(all.len(), 3);

        let some = restrict_to(zones, &["europe-west4-a".to_string(), "nowhere-1-z".to_string()]);
        assert_eq!(some, vec![ZoneInfo::new("europe-west4-a")]);
        assert_eq!(some[0].region, "europe-west4");
    }
}
