//! Tests for usage gate permission decisions.

use chrono::{TimeZone, Utc};
use fabula_error::QuotaErrorKind;
use fabula_quota::{
    Allowance, Feature, ManualClock, QuotaStore, Tier, TierPolicy, UsageGate, UserId,
};
use std::sync::Arc;
use strum::IntoEnumIterator;

fn gate_at(year: i32, month: u32, day: u32) -> (UsageGate, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(year, month, day, 9, 30, 0).unwrap());
    let store = QuotaStore::new(Arc::new(clock.clone()));
    (UsageGate::new(TierPolicy::default(), store), clock)
}

#[test]
fn test_no_access_denies_regardless_of_history() {
    let (gate, clock) = gate_at(2026, 10, 17);
    let policy = TierPolicy::default();
    let user = UserId::from("u");

    for (tier, feature, allowance) in policy.rows() {
        if allowance != Allowance::NoAccess {
            continue;
        }
        assert!(!gate.check_limit(&user, feature, tier), "{tier}/{feature}");
        gate.track_usage(&user, feature);
        assert!(!gate.check_limit(&user, feature, tier), "{tier}/{feature}");
    }

    // A fresh month does not grant access either.
    clock.advance_months(1);
    assert!(!gate.check_limit(&user, Feature::CoverGeneration, Tier::Free));
}

#[test]
fn test_unlimited_always_allows() {
    let (gate, _clock) = gate_at(2026, 10, 17);
    let user = UserId::from("u");

    for _ in 0..10_000 {
        gate.track_usage(&user, Feature::ChapterGeneration);
    }
    assert_eq!(gate.store().current_count(&user, Feature::ChapterGeneration), 10_000);
    assert!(gate.check_limit(&user, Feature::ChapterGeneration, Tier::Profissional));
}

#[test]
fn test_finite_allowance_boundary() {
    let policy = TierPolicy::default();

    for (tier, feature, allowance) in policy.rows() {
        let Allowance::Limited(cap) = allowance else {
            continue;
        };
        let (gate, _clock) = gate_at(2026, 10, 17);
        let user = UserId::from("boundary");

        for _ in 0..cap - 1 {
            gate.track_usage(&user, feature);
        }
        assert!(gate.check_limit(&user, feature, tier), "{tier}/{feature} at N-1");

        gate.track_usage(&user, feature);
        assert!(!gate.check_limit(&user, feature, tier), "{tier}/{feature} at N");
    }
}

#[test]
fn test_amador_story_generation_scenario() {
    let (gate, _clock) = gate_at(2026, 10, 17);
    let user = UserId::from("U");

    for _ in 0..9 {
        gate.track_usage(&user, Feature::StoryGeneration);
    }
    assert!(gate.check_limit(&user, Feature::StoryGeneration, Tier::Amador));

    gate.track_usage(&user, Feature::StoryGeneration);
    assert_eq!(gate.store().current_count(&user, Feature::StoryGeneration), 10);
    assert!(!gate.check_limit(&user, Feature::StoryGeneration, Tier::Amador));
}

#[test]
fn test_check_limit_has_no_side_effects() {
    let (gate, _clock) = gate_at(2026, 10, 17);
    let user = UserId::from("u");
    gate.track_usage(&user, Feature::Chat);

    for _ in 0..10 {
        assert!(gate.check_limit(&user, Feature::Chat, Tier::Free));
    }
    assert_eq!(gate.store().current_count(&user, Feature::Chat), 1);

    // Checking an untouched pair does not create a counter.
    assert!(gate.check_limit(&user, Feature::Export, Tier::Amador));
    assert!(gate.store().counter(&user, Feature::Export).is_none());
}

#[test]
fn test_unknown_tier_uses_free_allowances() {
    let (gate, _clock) = gate_at(2026, 10, 17);
    let user = UserId::from("u");
    let tier = Tier::from_name_or_default("Platinum");
    assert_eq!(tier, Tier::Free);

    for feature in Feature::iter() {
        assert_eq!(
            gate.policy().allowance_for_name("Platinum", feature),
            gate.policy().allowance_for(Tier::Free, feature)
        );
    }

    for _ in 0..3 {
        gate.track_usage(&user, Feature::StoryGeneration);
    }
    assert!(!gate.check_limit(&user, Feature::StoryGeneration, tier));
}

#[test]
fn test_month_rollover_restores_access() {
    let (gate, clock) = gate_at(2026, 10, 31);
    let user = UserId::from("u");

    for _ in 0..10 {
        gate.track_usage(&user, Feature::StoryGeneration);
    }
    assert!(!gate.check_limit(&user, Feature::StoryGeneration, Tier::Amador));

    clock.advance_months(1);
    assert!(gate.check_limit(&user, Feature::StoryGeneration, Tier::Amador));
    assert_eq!(gate.store().current_count(&user, Feature::StoryGeneration), 0);
}

#[test]
fn test_try_acquire_stops_at_allowance() {
    let (gate, _clock) = gate_at(2026, 10, 17);
    let user = UserId::from("u");

    for expected in 1..=3 {
        assert_eq!(
            gate.try_acquire(&user, Feature::StoryGeneration, Tier::Free).unwrap(),
            expected
        );
    }

    let err = gate
        .try_acquire(&user, Feature::StoryGeneration, Tier::Free)
        .unwrap_err();
    assert_eq!(
        err.kind(),
        &QuotaErrorKind::LimitReached {
            feature: "story_generation".to_string(),
            used: 3,
            allowance: 3,
        }
    );
    assert!(err.kind().is_denial());
    assert_eq!(gate.store().current_count(&user, Feature::StoryGeneration), 3);
}

#[test]
fn test_try_acquire_no_access() {
    let (gate, _clock) = gate_at(2026, 10, 17);
    let user = UserId::from("u");

    let err = gate
        .try_acquire(&user, Feature::AudioNarration, Tier::Free)
        .unwrap_err();
    assert!(matches!(err.kind(), QuotaErrorKind::NoAccess { .. }));
    assert_eq!(gate.store().current_count(&user, Feature::AudioNarration), 0);
}

#[test]
fn test_try_acquire_is_atomic_across_threads() {
    let (gate, _clock) = gate_at(2026, 10, 17);
    let user = UserId::from("racer");

    let granted: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                scope.spawn(|| {
                    (0..25)
                        .filter(|_| {
                            gate.try_acquire(&user, Feature::ChapterGeneration, Tier::Amador)
                                .is_ok()
                        })
                        .count()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(granted, 50);
    assert_eq!(gate.store().current_count(&user, Feature::ChapterGeneration), 50);
}

#[test]
fn test_refund_gives_back_one_use() {
    let (gate, _clock) = gate_at(2026, 10, 17);
    let user = UserId::from("u");

    for _ in 0..3 {
        gate.try_acquire(&user, Feature::StoryGeneration, Tier::Free).unwrap();
    }
    assert!(gate.try_acquire(&user, Feature::StoryGeneration, Tier::Free).is_err());

    assert_eq!(gate.refund(&user, Feature::StoryGeneration), 2);
    assert!(gate.try_acquire(&user, Feature::StoryGeneration, Tier::Free).is_ok());
}

#[test]
fn test_refund_never_goes_negative() {
    let (gate, _clock) = gate_at(2026, 10, 17);
    let user = UserId::from("u");

    assert_eq!(gate.refund(&user, Feature::Chat), 0);
    gate.track_usage(&user, Feature::Chat);
    assert_eq!(gate.refund(&user, Feature::Chat), 0);
    assert_eq!(gate.refund(&user, Feature::Chat), 0);
}

#[test]
fn test_usage_report() {
    let (gate, _clock) = gate_at(2026, 10, 17);
    let user = UserId::from("ana");

    for _ in 0..4 {
        gate.track_usage(&user, Feature::Chat);
    }
    gate.track_usage(&user, Feature::StoryGeneration);

    let report = gate.usage_report(&user, Tier::Profissional);
    assert_eq!(report.window.to_string(), "2026-10");
    assert_eq!(report.features.len(), Feature::iter().count());

    let chat = report.feature(Feature::Chat).unwrap();
    assert_eq!(chat.used, 4);
    assert_eq!(chat.allowance, Allowance::Unlimited);
    assert_eq!(chat.remaining, None);

    let covers = report.feature(Feature::CoverGeneration).unwrap();
    assert_eq!(covers.used, 0);
    assert_eq!(covers.remaining, Some(50));
}

#[test]
fn test_usage_report_serializes_raw_allowances() {
    let (gate, _clock) = gate_at(2026, 10, 17);
    let report = gate.usage_report(&UserId::from("ana"), Tier::Free);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["tier"], "Free");
    assert_eq!(json["window"]["month"], 10);
    assert_eq!(json["features"][0]["feature"], "story_generation");
    assert_eq!(json["features"][0]["allowance"], 3);
    assert_eq!(json["features"][3]["allowance"], 0);
}
