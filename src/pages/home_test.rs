use super::*;

#[test]
fn drug_path_trims_and_encodes_keyword() {
    assert_eq!(drug_path("  aspirin "), Some("/drugs/aspirin".to_owned()));
    assert_eq!(drug_path("vitamin c"), Some("/drugs/vitamin%20c".to_owned()));
    assert_eq!(drug_path("   "), None);
}

#[test]
fn service_status_prefers_backend_outcome() {
    assert_eq!(ServiceStatus::from_probes(true, true), ServiceStatus::Up);
    assert_eq!(ServiceStatus::from_probes(true, false), ServiceStatus::Degraded);
    assert_eq!(ServiceStatus::from_probes(false, true), ServiceStatus::Down);
    assert_eq!(ServiceStatus::Checking.label(), "Checking services...");
}
