use fleet_config::GenieSettings;
use fleet_core::{GenieTarget, HealthReport};
use tracing::warn;

const SPACE_ID_PREVIEW: usize = 8;
const HOST_PREVIEW: usize = 30;

/// Reports whether the relay is configured, without touching the network.
///
/// Resolution problems (an unreadable env file, say) are reported as a
/// degraded status rather than returned. Credential variables are read through `lookup`, normally the process
/// environment.
pub fn health_check(
    settings: &GenieSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> HealthReport {
    match settings.resolved_with(lookup) {
        Ok(resolved) => configuration_report(&resolved),
        Err(e) => {
            warn!("Health check could not resolve Genie settings: {}", e);
            HealthReport::degraded(e.to_string())
        }
    }
}

/// Builds the report for already-resolved settings. Identifiers are cut
/// to a short preview and the token is never included.
pub fn configuration_report(settings: &GenieSettings) -> HealthReport {
    let configured = settings.is_configured();

    let target = GenieTarget {
        space_id: settings
            .space_id
            .as_deref()
            .filter(|_| configured)
            .map(|space_id| preview(space_id, SPACE_ID_PREVIEW)),
        host: settings
            .normalized_host()
            .map(|host| preview(&host, HOST_PREVIEW)),
    };

    HealthReport::healthy(configured, target)
}

fn preview(value: &str, len: usize) -> String {
    let head: String = value.chars().take(len).collect();
    format!("{}...", head)
}
