//! Properties that hold for every manifest.

use serde_json::{json, Value};

use abom_core::classify::{risk_score, UartTier};
use abom_core::scaffolding::scaffolding_modifier;
use abom_core::{assess, ScaffoldingSignals};

const TOOL_SETS: [&str; 4] = ["none", "read", "write", "execute"];
const MODES: [&str; 3] = ["HITL", "HOTL", "HOOTL"];
const MEMORIES: [&str; 3] = ["none", "session", "long-term"];

fn tools_for(level: &str) -> Value {
    match level {
        "none" => json!([]),
        permission => json!([{ "name": "tool", "permission": permission }]),
    }
}

fn all_manifests() -> Vec<Value> {
    let mut out = Vec::new();
    for tools in TOOL_SETS {
        for mode in MODES {
            for memory in MEMORIES {
                for bits in 0..8u8 {
                    out.push(json!({
                        "agency_profile": { "tools": tools_for(tools) },
                        "autonomy_leash": mode,
                        "persistence_layer": memory,
                        "scaffolding_inventory": {
                            "mcp": bits & 1 != 0,
                            "sandbox": bits & 2 != 0,
                            "kill_switch": bits & 4 != 0
                        }
                    }));
                }
            }
        }
    }
    out
}

#[test]
fn factors_stay_in_their_domains() {
    for m in all_manifests() {
        let r = assess(&m).unwrap();
        assert!([1, 2, 4, 6].contains(&r.agency));
        assert!((1..=3).contains(&r.autonomy));
        assert!((0..=2).contains(&r.persistence));
        assert!((0.70..=1.0).contains(&r.scaffolding_modifier));
        assert!(r.score >= 0.0);
    }
}

#[test]
fn no_tools_means_agency_one() {
    for m in all_manifests()
        .into_iter()
        .filter(|m| m["agency_profile"]["tools"] == json!([]))
    {
        assert_eq!(assess(&m).unwrap().agency, 1);
    }
}

#[test]
fn write_tool_without_dangerous_flag_means_agency_four() {
    for m in all_manifests()
        .into_iter()
        .filter(|m| m["agency_profile"]["tools"][0]["permission"] == json!("write"))
    {
        assert_eq!(assess(&m).unwrap().agency, 4);
    }
}

#[test]
fn assessing_twice_is_byte_identical() {
    for m in all_manifests() {
        let first = serde_json::to_string(&assess(&m).unwrap()).unwrap();
        let second = serde_json::to_string(&assess(&m).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn overrides_always_mean_tier_four() {
    let flagged = [
        json!({ "model_core": { "training_flops": 1e25 } }),
        json!({ "model_core": { "capability_flags": ["cbrn"] } }),
        json!({ "agency_profile": { "capabilities": { "autonomous_weapons": true } } }),
    ];
    for m in all_manifests().into_iter().chain(flagged) {
        let r = assess(&m).unwrap();
        if !r.tier_4_overrides.is_empty() {
            assert_eq!(r.tier, UartTier::Tier4, "manifest {m}");
        }
    }
}

#[test]
fn tier_matches_baseline_without_overrides() {
    for m in all_manifests() {
        let r = assess(&m).unwrap();
        assert!(r.tier_4_overrides.is_empty());
        let unrounded = risk_score(r.agency, r.autonomy, r.persistence, r.scaffolding_modifier);
        assert_eq!(r.tier, UartTier::from_score(unrounded));
    }
}

#[test]
fn score_is_monotone_in_each_factor() {
    let agencies = [1u8, 2, 4, 6];
    for modifier in [0.7, 0.85, 1.0] {
        for u in 1..=3u8 {
            for p in 0..=2u8 {
                for pair in agencies.windows(2) {
                    assert!(risk_score(pair[0], u, p, modifier) <= risk_score(pair[1], u, p, modifier));
                }
            }
        }
        for a in agencies {
            for p in 0..=2u8 {
                for u in 1..3u8 {
                    assert!(risk_score(a, u, p, modifier) <= risk_score(a, u + 1, p, modifier));
                }
            }
            for u in 1..=3u8 {
                for p in 0..2u8 {
                    assert!(risk_score(a, u, p, modifier) <= risk_score(a, u, p + 1, modifier));
                }
            }
        }
    }
}

#[test]
fn stronger_discount_never_raises_score() {
    let weak = ScaffoldingSignals {
        mcp: true,
        ..ScaffoldingSignals::default()
    };
    let strong = ScaffoldingSignals {
        mcp: true,
        sandbox: true,
        ..ScaffoldingSignals::default()
    };
    let none = ScaffoldingSignals::default();
    let s = |signals: &ScaffoldingSignals| risk_score(4, 3, 2, scaffolding_modifier(signals));
    assert!(s(&strong) <= s(&weak));
    assert!(s(&weak) <= s(&none));
}

// HOOTL is documented as a possible future minimum of tier 3. That floor is
// not part of the current contract; this test pins the present behaviour so
// enabling it is a deliberate change.
#[test]
fn hootl_does_not_force_minimum_tier_three() {
    let r = assess(&json!({
        "autonomy_leash": "HOOTL",
        "scaffolding_inventory": { "mcp": true, "sandbox": true, "kill_switch": true }
    }))
    .unwrap();
    assert_eq!(r.autonomy, 3);
    // 1 × 3 × e⁰ × 0.70 = 2.1
    assert_eq!(r.score, 2.1);
    assert_eq!(r.tier, UartTier::Tier1);
}

#[test]
fn concurrent_callers_agree() {
    let manifests = all_manifests();
    let expected: Vec<_> = manifests.iter().map(|m| assess(m).unwrap()).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| manifests.iter().map(|m| assess(m).unwrap()).collect::<Vec<_>>()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
