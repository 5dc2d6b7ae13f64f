//! Property-based tests for dwell accounting, severity bands and fines.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use dwelltrack_rs::fine::round_half_up;
use dwelltrack_rs::impact::BandTable;
use dwelltrack_rs::{
    DetectionBuilder, Engine, FineCalculator, FrameBatch, SeverityBand, StreamId, TrackId,
    VehicleClass, ViolationPipeline,
};

fn pipeline() -> ViolationPipeline {
    let json = r#"{ "zones": [ { "id": "z", "polygon": [[0, 0], [100, 0], [100, 100], [0, 100]] } ] }"#;
    ViolationPipeline::new(StreamId::new("prop"), Arc::new(Engine::from_json(json).unwrap()))
}

fn contained(t: f64) -> FrameBatch {
    let det = DetectionBuilder::new(1)
        .tlbr(40.0, 40.0, 60.0, 60.0)
        .confidence(0.9)
        .build();
    FrameBatch::new(t, [det])
}

fn arb_class() -> impl Strategy<Value = VehicleClass> {
    proptest::sample::select(VehicleClass::ALL.to_vec())
}

proptest! {
    /// Dwell equals contained elapsed time however irregular the frame spacing.
    #[test]
    fn dwell_is_frame_rate_independent(deltas in prop::collection::vec(0.04f64..2.0, 1..60)) {
        let mut p = pipeline();
        let mut t = 0.0;
        let mut violation_at = None;
        p.process_frame(contained(t)).unwrap();
        for delta in &deltas {
            t += delta;
            let outcome = p.process_frame(contained(t)).unwrap();
            if !outcome.violations.is_empty() {
                prop_assert!(violation_at.is_none());
                violation_at = Some(outcome.violations[0].dwell_seconds());
            }
        }

        let track = p.ledger().get(TrackId(1)).unwrap();
        prop_assert!((track.dwell_seconds - t).abs() < 1e-9);
        match violation_at {
            Some(dwell) => prop_assert!(dwell >= 15.0 && dwell < 15.0 + 2.0),
            None => prop_assert!(t < 15.0),
        }
    }

    /// A gap within tolerance pauses dwell; a longer one resets it.
    #[test]
    fn gap_tolerance_decides_reset(
        contained_secs in 1u32..12,
        gap in prop_oneof![0.1f64..5.0, 5.01f64..29.0],
    ) {
        let mut p = pipeline();
        for step in 0..=contained_secs {
            p.process_frame(contained(step as f64)).unwrap();
        }
        let last = contained_secs as f64;
        p.process_frame(FrameBatch::new(last + gap / 2.0, [])).unwrap();
        p.process_frame(contained(last + gap)).unwrap();

        let track = p.ledger().get(TrackId(1)).unwrap();
        if gap <= 5.0 {
            prop_assert_eq!(track.dwell_seconds, last);
            prop_assert_eq!(track.entered_at, Some(0.0));
        } else {
            prop_assert_eq!(track.dwell_seconds, 0.0);
            prop_assert_eq!(track.entered_at, Some(last + gap));
        }
    }

    /// Every score in [0, 100] lands in the band whose half-open range contains it.
    #[test]
    fn band_assignment_is_total(score in 0.0f64..=100.0) {
        let bands = BandTable::default();
        let expected = if score >= 75.0 {
            SeverityBand::Severe
        } else if score >= 50.0 {
            SeverityBand::High
        } else if score >= 25.0 {
            SeverityBand::Medium
        } else {
            SeverityBand::Low
        };
        prop_assert_eq!(bands.classify(score), expected);
    }

    #[test]
    fn band_assignment_never_panics(score in any::<f64>()) {
        let band = BandTable::default().classify(score);
        prop_assert!(SeverityBand::Low <= band && band <= SeverityBand::Severe);
    }

    /// Fines depend only on their inputs and reconstruct from their own fields.
    #[test]
    fn fine_is_pure(class in arb_class(), hundredths in 1i64..=500) {
        let calculator = FineCalculator::default();
        let multiplier = Decimal::new(hundredths, 2);
        let a = calculator.compute(class, multiplier).unwrap();
        let b = calculator.compute(class, multiplier).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(a.total, round_half_up(a.base * a.multiplier));
        prop_assert_eq!(a.recomputed_total(), a.total);
        prop_assert_eq!(a.total.fract(), Decimal::ZERO);
    }
}

#[test]
fn band_boundaries_belong_to_upper_band() {
    let bands = BandTable::default();
    assert_eq!(bands.classify(25.0), SeverityBand::Medium);
    assert_eq!(bands.classify(50.0), SeverityBand::High);
    assert_eq!(bands.classify(75.0), SeverityBand::Severe);
    assert_eq!(bands.classify(100.0), SeverityBand::Severe);
    assert_eq!(bands.classify(0.0), SeverityBand::Low);
}
