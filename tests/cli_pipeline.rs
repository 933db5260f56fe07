// End-to-end: TSV table in, apportioned TSV table out

use apportion::{run, ApportionError, MeanMode, Registry, Report, RunConfig, TableFormat};

const TABLE: &str = "\
State\tPopulation
Ohio\t11799448
Iowa\t3190369
Texas\t29145505
Vermont\t643077
Utah\t3271616
";

fn apportion(table: &str, config: RunConfig) -> apportion::Result<String> {
    let format = TableFormat::default();
    let mut registry = Registry::load(table.as_bytes(), &format)?;
    run(&mut registry, &config)?;

    let mut out = Vec::new();
    Report::from_registry(&registry).write_delimited(&mut out, &format)?;
    Ok(String::from_utf8(out).expect("report is utf-8"))
}

fn seats_column(report: &str) -> Vec<(String, u32)> {
    report
        .lines()
        .skip(1)
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            (fields[0].to_string(), fields[2].parse().unwrap())
        })
        .collect()
}

#[test]
fn test_full_pipeline_hits_target() {
    let report = apportion(TABLE, RunConfig::new(50, MeanMode::Geometric)).unwrap();
    let rows = seats_column(&report);

    assert!(report.starts_with("State\tPopulation\tReps\n"));
    assert_eq!(rows.len(), 5);
    assert_eq!(rows.iter().map(|(_, s)| s).sum::<u32>(), 50);
    assert_eq!(rows[0].0, "Texas");
    assert!(rows.windows(2).all(|w| w[0].1 >= w[1].1));
}

#[test]
fn test_pipeline_is_reproducible_per_mode() {
    for mode in [MeanMode::Geometric, MeanMode::Arithmetic] {
        let first = apportion(TABLE, RunConfig::new(120, mode)).unwrap();
        let second = apportion(TABLE, RunConfig::new(120, mode)).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_baseline_only() {
    let report = apportion(TABLE, RunConfig::new(5, MeanMode::Geometric)).unwrap();
    assert!(seats_column(&report).iter().all(|(_, s)| *s == 1));
}

#[test]
fn test_errors_produce_no_report() {
    let too_few = apportion(TABLE, RunConfig::new(4, MeanMode::Geometric));
    assert!(matches!(too_few, Err(ApportionError::InvalidTarget { .. })));

    let duplicated = format!("{}Ohio\t1\n", TABLE);
    let dup = apportion(&duplicated, RunConfig::default());
    assert!(matches!(dup, Err(ApportionError::DuplicateEntity(_))));

    let bad = apportion("State\tPopulation\nOhio\tmany\n", RunConfig::default());
    assert!(matches!(bad, Err(ApportionError::MalformedInput { line: 2, .. })));
}
