use birth_chance::PipelineError;
use birth_chance::models::IndicatorRecord;
use birth_chance::transform::{estimate, join, join_outcomes};
use std::collections::BTreeSet;

fn rec(c: &str, y: i32, v: Option<f64>) -> IndicatorRecord {
    IndicatorRecord {
        country_code: c.into(),
        year: y,
        value: v,
    }
}

#[test]
fn output_keys_are_the_valid_intersection() {
    let rates = vec![
        rec("CAN", 2019, Some(10.1)),
        rec("CAN", 2020, Some(9.8)),
        rec("CAN", 2021, Some(9.6)), // population missing this year
        rec("USA", 2020, None),      // rate absent
        rec("MEX", 2020, Some(15.0)),
    ];
    let pops = vec![
        rec("CAN", 2018, Some(37_000_000.0)), // rate missing this year
        rec("CAN", 2019, Some(37_600_000.0)),
        rec("CAN", 2020, Some(38_000_000.0)),
        rec("USA", 2020, Some(331_000_000.0)),
        rec("MEX", 2020, None), // population absent
    ];

    let joined = join(&rates, &pops).unwrap();
    let got: BTreeSet<(String, i32)> = joined
        .iter()
        .map(|j| (j.country_code.clone(), j.year))
        .collect();
    let want: BTreeSet<(String, i32)> =
        [("CAN".to_string(), 2019), ("CAN".to_string(), 2020)].into_iter().collect();
    assert_eq!(got, want);

    // Every surviving key exists in both inputs.
    for (c, y) in &got {
        assert!(rates.iter().any(|r| &r.country_code == c && r.year == *y));
        assert!(pops.iter().any(|r| &r.country_code == c && r.year == *y));
    }
}

#[test]
fn year_only_in_one_table_never_reaches_estimates() {
    let rates = vec![rec("CAN", 2022, Some(9.0)), rec("CAN", 2023, Some(8.9))];
    let pops = vec![rec("CAN", 2022, Some(39_000_000.0))];
    let est = estimate(&join(&rates, &pops).unwrap());
    assert_eq!(est.len(), 1);
    assert!(est.iter().all(|e| e.year == 2022));
}

#[test]
fn births_follow_rate_per_thousand_times_population() {
    let rates = vec![
        rec("CAN", 2020, Some(10.5)),
        rec("IND", 2020, Some(16.4)),
        rec("JPN", 2020, Some(6.8)),
    ];
    let pops = vec![
        rec("CAN", 2020, Some(38_000_000.0)),
        rec("IND", 2020, Some(1_396_387_127.0)),
        rec("JPN", 2020, Some(126_261_000.0)),
    ];
    let est = estimate(&join(&rates, &pops).unwrap());
    for e in &est {
        let expected = (e.birth_rate / 1000.0) * e.population;
        assert!((e.number_of_births - expected).abs() <= expected.abs() * 1e-12);
        assert!(e.number_of_births >= 0.0);
    }
    let can = est.iter().find(|e| e.country_code == "CAN").unwrap();
    assert!((can.number_of_births - 399_000.0).abs() < 1e-6);
}

#[test]
fn negative_rates_propagate_arithmetically() {
    let est = estimate(
        &join(&[rec("XXX", 2000, Some(-1.0))], &[rec("XXX", 2000, Some(1000.0))]).unwrap(),
    );
    assert_eq!(est[0].number_of_births, -1.0);
}

#[test]
fn duplicate_population_key_is_rejected() {
    let err = join(
        &[rec("CAN", 2020, Some(10.0))],
        &[rec("CAN", 2020, Some(1.0)), rec("CAN", 2020, Some(2.0))],
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Data(_)));
    assert!(err.to_string().contains("population"));
}

#[test]
fn failed_fetch_blocks_the_join() {
    let err = join_outcomes(
        Ok(vec![rec("CAN", 2020, Some(10.0))]),
        Err(PipelineError::Transport("GET failed with HTTP 502".into())),
    )
    .unwrap_err();
    match err {
        PipelineError::UpstreamFetch { failures } => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].contains("population"));
            assert!(failures[0].contains("502"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
