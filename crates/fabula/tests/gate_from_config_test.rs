//! Tests for building a gate from configuration.

use fabula::{Allowance, Feature, QuotaConfig, Tier, UserId, gate_from_config};
use std::io::Write;
use tempfile::Builder;

#[test]
fn test_gate_uses_configured_allowances() {
    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        temp_file,
        r#"
[tiers.amador]
story_generation = 2
"#
    )
    .unwrap();

    let config = QuotaConfig::from_file(temp_file.path()).unwrap();
    let gate = gate_from_config(&config).unwrap();
    let user = UserId::from("ana");

    assert_eq!(
        gate.policy().allowance_for(Tier::Amador, Feature::StoryGeneration),
        Allowance::Limited(2)
    );

    gate.try_acquire(&user, Feature::StoryGeneration, Tier::Amador).unwrap();
    gate.try_acquire(&user, Feature::StoryGeneration, Tier::Amador).unwrap();
    assert!(!gate.check_limit(&user, Feature::StoryGeneration, Tier::Amador));
}

#[test]
fn test_gate_rejects_invalid_configuration() {
    let config = QuotaConfig::from_toml_str("[tiers.enterprise]\nchat = 1\n").unwrap();
    assert!(gate_from_config(&config).is_err());
}
