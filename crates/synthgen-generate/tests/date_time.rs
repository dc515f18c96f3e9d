use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use synthgen_generate::{EvalContext, GeneratedValue, GenerationReport, GeneratorState, evaluate};

fn eval_text(
    state: &GeneratorState,
    rng: &mut ChaCha8Rng,
    report: &mut GenerationReport,
    expression: &str,
) -> String {
    let mut ctx = EvalContext::new(state, rng, 0, report);
    match evaluate(&json!(expression), &mut ctx) {
        GeneratedValue::Text(text) => text,
        other => panic!("expected text from {expression}, got {other:?}"),
    }
}

#[test]
fn date_samples_stay_within_inclusive_bounds() {
    let state = GeneratorState::new();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut report = GenerationReport::default();
    let min = NaiveDate::from_ymd_opt(2018, 2, 1).expect("min");
    let max = NaiveDate::from_ymd_opt(2018, 3, 15).expect("max");

    let mut hit_min = false;
    let mut hit_max = false;
    for _ in 0..1000 {
        let text = eval_text(&state, &mut rng, &mut report, "date(2018-02-01, 2018-03-15)");
        let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d").expect("yyyy-MM-dd");
        assert!(date >= min && date <= max, "{date}");
        hit_min |= date == min;
        hit_max |= date == max;
    }
    assert!(hit_min && hit_max, "both bounds are reachable");
    assert_eq!(report.fallback_count, 0);
}

#[test]
fn leap_day_is_a_valid_bound() {
    let state = GeneratorState::new();
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut report = GenerationReport::default();
    let text = eval_text(&state, &mut rng, &mut report, "date(2024-02-29, 2024-02-29)");
    assert_eq!(text, "2024-02-29");

    for _ in 0..500 {
        let text = eval_text(&state, &mut rng, &mut report, "date(2023-02-27, 2024-03-01)");
        let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d").expect("valid calendar date");
        if date.month() == 2 && date.year() == 2023 {
            assert!(date.day() <= 28);
        }
    }
}

#[test]
fn simple_datetime_crosses_year_boundary() {
    let state = GeneratorState::new();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut report = GenerationReport::default();
    let min = NaiveDateTime::parse_from_str("2020-12-31 23:59:58", "%Y-%m-%d %H:%M:%S")
        .expect("min");
    let max = NaiveDateTime::parse_from_str("2021-01-01 00:00:01", "%Y-%m-%d %H:%M:%S")
        .expect("max");

    for _ in 0..300 {
        let text = eval_text(
            &state,
            &mut rng,
            &mut report,
            "datetime:simple(2020-12-31 23:59:58, 2021-01-01 00:00:01)",
        );
        let value = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S").expect("parse");
        assert!(value >= min && value <= max, "{value}");
    }
}

#[test]
fn keywords_use_default_ranges() {
    let state = GeneratorState::new();
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut report = GenerationReport::default();

    for _ in 0..200 {
        let text = eval_text(&state, &mut rng, &mut report, "date");
        let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d").expect("date");
        assert!(date >= NaiveDate::from_ymd_opt(2018, 5, 1).expect("min"));
        assert!(date <= NaiveDate::from_ymd_opt(2018, 12, 31).expect("max"));

        let text = eval_text(&state, &mut rng, &mut report, "datetime");
        assert!(text.ends_with(".000Z"), "{text}");
        let value =
            NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.fZ").expect("iso");
        assert!((1970..=2018).contains(&value.year()));
    }
}

#[test]
fn inverted_range_falls_back() {
    let state = GeneratorState::new();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut report = GenerationReport::default();
    let text = eval_text(&state, &mut rng, &mut report, "date(2019-01-01, 2018-01-01)");
    assert_eq!(text, "date(2019-01-01, 2018-01-01)");
    assert_eq!(report.fallback_count, 1);
}

#[test]
fn datetime_seq_advances_from_absolute_start() {
    let state = GeneratorState::new();
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let mut report = GenerationReport::default();
    let values: Vec<String> = (0..3)
        .map(|_| {
            eval_text(
                &state,
                &mut rng,
                &mut report,
                "datetime_seq(2020-01-01, now, yyyy-MM-dd, UTC, day)",
            )
        })
        .collect();
    assert_eq!(values, vec!["2020-01-02", "2020-01-03", "2020-01-04"]);
}

#[test]
fn datetime_seq_is_strictly_increasing() {
    let state = GeneratorState::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut report = GenerationReport::default();

    let mut previous: Option<NaiveDateTime> = None;
    for _ in 0..20 {
        let text = eval_text(
            &state,
            &mut rng,
            &mut report,
            "datetime_seq(now-10, now, yyyy-MM-dd HH:mm:ss, Europe/Paris, second)",
        );
        let value = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S").expect("parse");
        if let Some(previous) = previous {
            assert!(value > previous, "{value} after {previous}");
        }
        previous = Some(value);
    }
    assert!(state.cursor().is_initialized());

    state.reset();
    assert!(!state.cursor().is_initialized());
}

#[test]
fn datetime_seq_steps_over_dst_gap() {
    let state = GeneratorState::new();
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut report = GenerationReport::default();
    let values: Vec<String> = (0..3)
        .map(|_| {
            eval_text(
                &state,
                &mut rng,
                &mut report,
                "datetime_seq(2024-03-30 02:30:00, now, yyyy-MM-dd HH:mm:ss, Europe/Paris, day)",
            )
        })
        .collect();

    assert_eq!(
        values,
        vec![
            "2024-03-31 03:30:00",
            "2024-04-01 03:30:00",
            "2024-04-02 03:30:00"
        ]
    );
    assert_eq!(report.fallback_count, 0);
}

#[test]
fn single_bound_date_runs_up_to_today() {
    let state = GeneratorState::new();
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let mut report = GenerationReport::default();
    let min = NaiveDate::from_ymd_opt(2020, 1, 1).expect("min");

    for _ in 0..500 {
        let text = eval_text(&state, &mut rng, &mut report, "date(2020-01-01)");
        let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d").expect("yyyy-MM-dd");
        let today = chrono::Utc::now().date_naive();
        assert!(date >= min && date <= today, "{date}");
    }
    assert_eq!(report.fallback_count, 0);
}

#[test]
fn single_bound_after_now_falls_back() {
    let state = GeneratorState::new();
    let mut rng = ChaCha8Rng::seed_from_u64(10);
    let mut report = GenerationReport::default();
    let text = eval_text(&state, &mut rng, &mut report, "date(2999-01-01)");
    assert_eq!(text, "date(2999-01-01)");
    assert_eq!(report.fallback_count, 1);
}
