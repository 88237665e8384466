use crate::*;

use chrono::{DateTime, TimeZone, Utc};
use indoc::indoc;
use tracing_test::traced_test;

use crate::health::{health_level, HealthLevel, MetricThreshold};
use crate::lexer::{LineToken, MetricKind};

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(0).unwrap()
}

fn sample_count(snapshot: &parser::ParsedMetrics) -> usize {
    snapshot.families.values().map(|f| f.samples.len()).sum()
}

#[test]
fn lexer_classifies_lines() {
    assert!(matches!(
        lexer::line("# HELP foo Total number of foos"),
        LineToken::Help { name: "foo", help: "Total number of foos" }
    ));
    assert!(matches!(
        lexer::line("# TYPE foo counter"),
        LineToken::Type { name: "foo", kind: MetricKind::Counter }
    ));
    assert!(matches!(lexer::line(""), LineToken::Empty));
    assert!(matches!(lexer::line("   "), LineToken::Empty));
    assert!(matches!(lexer::line("## scribbled out"), LineToken::Empty));
    assert!(matches!(lexer::line("# a stray comment"), LineToken::Unknown(_)));
    assert!(matches!(lexer::line("foo=2"), LineToken::Unknown(_)));

    match lexer::line("foo 2") {
        LineToken::Sample(sample) => {
            assert_eq!(sample.name, "foo");
            assert!(sample.labels.is_empty());
            assert_eq!(sample.value, 2.);
            assert_eq!(sample.timestamp, None);
        }
        other => panic!("expected a sample, got {:?}", other),
    }

    match lexer::line(r#"foo{bar="baz",quux="{nonce}"} 2.5e3 -3982045"#) {
        LineToken::Sample(sample) => {
            assert_eq!(sample.labels.len(), 2);
            assert_eq!(sample.labels[1].value, Some("{nonce}"));
            assert_eq!(sample.value, 2500.);
            assert_eq!(sample.timestamp, Some(-3982045));
        }
        other => panic!("expected a sample, got {:?}", other),
    }
}

#[test]
fn lexer_decodes_numeric_literals() {
    let value = |line: &str| match lexer::line(line) {
        LineToken::Sample(sample) => sample.value,
        other => panic!("expected a sample, got {:?}", other),
    };

    assert_eq!(value("foo +Inf"), f64::INFINITY);
    assert_eq!(value("foo Inf"), f64::INFINITY);
    assert_eq!(value("foo -Inf"), f64::NEG_INFINITY);
    assert!(value("foo NaN").is_nan());
    assert_eq!(value("foo 1.458255915e9"), 1.458255915e9);
    assert_eq!(value("foo -7"), -7.);
}

#[test]
#[traced_test]
fn parse_is_idempotent() {
    let scrape = indoc! {r#"
        # HELP connections_open Currently open connections
        # TYPE connections_open gauge
        connections_open 17
        sessions_total{region="eu"} 40 1623456789000
        not a metric line at all
    "#};

    let first = serde_json::to_value(parser::parse_at(scrape, epoch())).unwrap();
    let second = serde_json::to_value(parser::parse_at(scrape, epoch())).unwrap();

    assert_eq!(first, second);
}

#[test]
#[traced_test]
fn garbage_lines_become_diagnostics_not_failures() {
    let scrape = indoc! {r#"
        good_one 1
        <<<%%% garbage
        good_two{x="y"} 2
        # a comment that is neither HELP nor TYPE
        good_three 3

        {no_name} 4
    "#};

    let snapshot = parser::parse_at(scrape, epoch());

    assert_eq!(sample_count(&snapshot), 3);
    assert_eq!(snapshot.parse_errors.len(), 3);
    assert!(snapshot.parse_errors[0].starts_with("unrecognized line: «"));
}

#[test]
fn diagnostics_are_truncated() {
    let long_line = format!("?{}", "x".repeat(400));
    let snapshot = parser::parse_at(&long_line, epoch());

    assert_eq!(snapshot.parse_errors.len(), 1);
    // 100 chars of payload plus the prefix and guillemets.
    assert!(snapshot.parse_errors[0].chars().count() < 130);
}

#[test]
fn empty_input_is_an_empty_snapshot() {
    let snapshot = parser::parse_at("", epoch());

    assert!(snapshot.families.is_empty());
    assert!(snapshot.parse_errors.is_empty());
    assert_eq!(snapshot.timestamp, "1970-01-01T00:00:00.000Z");
}

#[test]
#[traced_test]
fn end_to_end_counter_scenario() {
    let scrape = indoc! {r#"
        # HELP http_requests_total Total requests
        # TYPE http_requests_total counter
        http_requests_total{method="GET",status="200"} 1027 1623456789000
    "#};

    let snapshot = parser::parse_at(scrape, epoch());

    assert_eq!(snapshot.families.len(), 1);
    assert!(snapshot.parse_errors.is_empty());

    let family = &snapshot.families["http_requests_total"];
    assert_eq!(family.name, "http_requests_total");
    assert_eq!(family.help, "Total requests");
    assert_eq!(family.kind, MetricKind::Counter);
    assert_eq!(family.samples.len(), 1);

    let sample = &family.samples[0];
    assert_eq!(sample.name, "http_requests_total");
    assert_eq!(sample.labels["method"], "GET");
    assert_eq!(sample.labels["status"], "200");
    assert_eq!(sample.value, 1027.);
    assert_eq!(sample.timestamp, Some(1623456789000));
}

#[test]
fn composite_suffixes_share_a_family() {
    let scrape = indoc! {r#"
        # TYPE request_seconds histogram
        request_seconds_bucket{le="1"} 3
        request_seconds_bucket{le="+Inf"} 4
        request_seconds_sum 2.2
        request_seconds_count 4
    "#};

    let snapshot = parser::parse_at(scrape, epoch());

    assert_eq!(snapshot.families.len(), 1);
    let family = &snapshot.families["request_seconds"];
    assert_eq!(family.samples.len(), 4);
    // Roles stay readable off the original names.
    assert_eq!(family.samples[0].name, "request_seconds_bucket");
    assert_eq!(family.samples[2].name, "request_seconds_sum");
}

#[test]
fn total_suffix_is_not_stripped() {
    let snapshot = parser::parse_at("http_requests_total 5", epoch());

    assert!(snapshot.families.contains_key("http_requests_total"));
    assert!(!snapshot.families.contains_key("http_requests"));
}

#[test]
fn count_suffixed_gauge_is_knowingly_misfiled() {
    // A gauge legitimately named `my_count` cannot be told apart from a
    // composite sample; it lands under the stripped base name.
    let scrape = indoc! {r#"
        # TYPE my_count gauge
        my_count 9
    "#};

    let snapshot = parser::parse_at(scrape, epoch());

    assert_eq!(snapshot.families["my_count"].kind, MetricKind::Gauge);
    assert!(snapshot.families["my_count"].samples.is_empty());
    assert_eq!(snapshot.families["my"].samples.len(), 1);
}

#[test]
fn type_line_may_arrive_after_samples() {
    let scrape = indoc! {r#"
        queue_depth 42
        # TYPE queue_depth gauge
        # HELP queue_depth Messages waiting
    "#};

    let snapshot = parser::parse_at(scrape, epoch());
    let family = &snapshot.families["queue_depth"];

    assert_eq!(family.kind, MetricKind::Gauge);
    assert_eq!(family.help, "Messages waiting");
    assert_eq!(family.samples.len(), 1);
}

#[test]
fn unrecognized_type_word_widens_to_unknown() {
    let scrape = indoc! {r#"
        # TYPE foo untyped
        # TYPE bar wibble
    "#};

    let snapshot = parser::parse_at(scrape, epoch());

    assert!(snapshot.parse_errors.is_empty());
    assert_eq!(snapshot.families["foo"].kind, MetricKind::Unknown);
    assert_eq!(snapshot.families["bar"].kind, MetricKind::Unknown);
}

#[test]
fn label_values_are_unescaped() {
    let scrape = r#"msdos_file{path="C:\\DIR",error="Cannot find:\n\"FILE.TXT\""} 1"#;

    let snapshot = parser::parse_at(scrape, epoch());
    let sample = &snapshot.families["msdos_file"].samples[0];

    assert_eq!(sample.labels["path"], r"C:\DIR");
    assert_eq!(sample.labels["error"], "Cannot find:\n\"FILE.TXT\"");
}

#[test]
#[traced_test]
fn histogram_percentiles_interpolate() {
    let scrape = indoc! {r#"
        # TYPE request_seconds histogram
        request_seconds_bucket{le="0.1"} 24
        request_seconds_bucket{le="0.5"} 88
        request_seconds_bucket{le="1"} 100
        request_seconds_bucket{le="+Inf"} 100
        request_seconds_sum 31.7
        request_seconds_count 100
    "#};

    let snapshot = parser::parse_at(scrape, epoch());
    let metrics = histogram::analyze(&snapshot.families["request_seconds"]).unwrap();

    assert_eq!(metrics.len(), 1);
    let metric = &metrics[0];

    assert_eq!(metric.count, 100.);
    assert_eq!(metric.sum, 31.7);
    assert_eq!(metric.buckets.len(), 4);
    assert_eq!(metric.buckets.last().unwrap().le, "+Inf");

    // target 50 falls between cumulative 24 (le 0.1) and 88 (le 0.5):
    // 0.1 + (50-24)/(88-24) * (0.5-0.1)
    let p50 = metric.p50.unwrap();
    assert!(p50 > 0.1 && p50 < 0.5);
    assert!((p50 - 0.2625).abs() < 1e-9);

    let p90 = metric.p90.unwrap();
    assert!((p90 - (0.5 + 2. / 12. * 0.5)).abs() < 1e-9);
}

#[test]
fn histogram_groups_split_per_label_set() {
    let scrape = indoc! {r#"
        # TYPE request_seconds histogram
        request_seconds_bucket{route="/a",le="1"} 10
        request_seconds_bucket{route="/a",le="+Inf"} 10
        request_seconds_sum{route="/a"} 4.2
        request_seconds_count{route="/a"} 10
        request_seconds_bucket{route="/b",le="1"} 0
        request_seconds_bucket{route="/b",le="+Inf"} 0
        request_seconds_sum{route="/b"} 0
        request_seconds_count{route="/b"} 0
    "#};

    let snapshot = parser::parse_at(scrape, epoch());
    let metrics = histogram::analyze(&snapshot.families["request_seconds"]).unwrap();

    assert_eq!(metrics.len(), 2);

    let a = metrics.iter().find(|m| m.labels["route"] == "/a").unwrap();
    let b = metrics.iter().find(|m| m.labels["route"] == "/b").unwrap();

    assert!(a.p50.is_some());
    // Zero observations: buckets are reported, percentiles are not.
    assert_eq!(b.buckets.len(), 2);
    assert!(b.p50.is_none() && b.p99.is_none());
}

#[test]
fn histogram_percentile_falls_back_to_last_finite_boundary() {
    // Cumulative counts top out below the count line; the target is never
    // reached and the largest finite boundary is the honest answer.
    let scrape = indoc! {r#"
        # TYPE broken histogram
        broken_bucket{le="0.5"} 10
        broken_bucket{le="2"} 30
        broken_count 1000
    "#};

    let snapshot = parser::parse_at(scrape, epoch());
    let metrics = histogram::analyze(&snapshot.families["broken"]).unwrap();

    assert_eq!(metrics[0].p99, Some(2.));
}

#[test]
fn analyze_rejects_non_histograms() {
    let snapshot = parser::parse_at("# TYPE foo gauge", epoch());

    let result = histogram::analyze(&snapshot.families["foo"]);
    assert!(matches!(result, Err(SnapError::NotAHistogram { .. })));
}

#[test]
fn queries_filter_group_and_sum() {
    let scrape = indoc! {r#"
        # TYPE jobs_active gauge
        jobs_active{queue="mail",shard="0"} 4
        jobs_active{queue="mail",shard="1"} 6
        jobs_active{queue="index"} 1
        jobs_active 11
    "#};

    let snapshot = parser::parse_at(scrape, epoch());
    let family = &snapshot.families["jobs_active"];

    let mail = query::filter_samples_by_labels(family, &[("queue", "mail")]);
    assert_eq!(mail.len(), 2);

    let shard0 = query::filter_samples_by_labels(family, &[("queue", "mail"), ("shard", "0")]);
    assert_eq!(shard0.len(), 1);
    assert_eq!(shard0[0].value, 4.);

    assert!(query::filter_samples_by_labels(family, &[("queue", "spool")]).is_empty());

    let by_queue = query::group_samples_by_label(family, "queue");
    assert_eq!(by_queue["mail"].len(), 2);
    assert_eq!(by_queue["index"].len(), 1);
    assert_eq!(by_queue[query::UNLABELED].len(), 1);

    assert_eq!(query::sum_metric_values(family, None), 22.);
    assert_eq!(query::gauge_value(family), 11.);

    let queues = query::unique_label_values(family, "queue");
    assert_eq!(queues.len(), 2);
    assert!(queues.contains("mail") && queues.contains("index"));
}

#[test]
fn sum_can_be_restricted_by_suffix() {
    let scrape = indoc! {r#"
        # TYPE request_seconds histogram
        request_seconds_bucket{le="+Inf"} 7
        request_seconds_sum 1.5
        request_seconds_count 7
    "#};

    let snapshot = parser::parse_at(scrape, epoch());
    let family = &snapshot.families["request_seconds"];

    assert_eq!(query::sum_metric_values(family, Some("_count")), 7.);
    assert_eq!(query::sum_metric_values(family, Some("_sum")), 1.5);
}

#[test]
fn gauge_value_defaults_to_zero() {
    let scrape = r#"jobs_active{queue="mail"} 4"#;
    let snapshot = parser::parse_at(scrape, epoch());

    assert_eq!(query::gauge_value(&snapshot.families["jobs_active"]), 0.);
}

#[test]
fn unique_label_values_skip_empty() {
    let scrape = indoc! {r#"
        foo{region=""} 1
        foo{region="eu"} 2
    "#};

    let snapshot = parser::parse_at(scrape, epoch());
    let regions = query::unique_label_values(&snapshot.families["foo"], "region");

    assert_eq!(regions.len(), 1);
    assert!(regions.contains("eu"));
}

#[test]
#[traced_test]
fn non_finite_values_are_tolerated() {
    let scrape = indoc! {r#"
        something_weird{problem="division by zero"} +Inf
        something_weird{problem="none"} 10
    "#};

    let snapshot = parser::parse_at(scrape, epoch());
    let family = &snapshot.families["something_weird"];

    assert!(snapshot.parse_errors.is_empty());
    assert_eq!(family.samples.len(), 2);
    assert!(family.samples[0].value.is_infinite());

    // Infinity is preserved on the sample but contributes nothing to sums.
    assert_eq!(query::sum_metric_values(family, None), 10.);
}

#[test]
fn non_finite_values_serialize_as_literals() {
    let snapshot = parser::parse_at("foo NaN\nbar -Inf", epoch());
    let json = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(json["families"]["foo"]["samples"][0]["value"], "NaN");
    assert_eq!(json["families"]["bar"]["samples"][0]["value"], "-Inf");
}

#[test]
fn thresholds_resolve_boundaries_toward_worse() {
    let limits = MetricThreshold {
        warning: 1.,
        critical: 5.,
        unit: "s".to_string(),
        inverse: false,
    };

    assert_eq!(health_level(0.5, &limits), HealthLevel::Healthy);
    assert_eq!(health_level(1., &limits), HealthLevel::Warning);
    assert_eq!(health_level(5., &limits), HealthLevel::Critical);
    assert_eq!(health_level(6., &limits), HealthLevel::Critical);
}

#[test]
fn inverse_thresholds_flip_the_direction() {
    let limits = MetricThreshold {
        warning: 1.,
        critical: 0.,
        unit: "workers".to_string(),
        inverse: true,
    };

    assert_eq!(health_level(0., &limits), HealthLevel::Critical);
    assert_eq!(health_level(1., &limits), HealthLevel::Warning);
    assert_eq!(health_level(2., &limits), HealthLevel::Healthy);
}

#[test]
fn worst_level_wins_the_rollup() {
    let levels = [HealthLevel::Healthy, HealthLevel::Critical, HealthLevel::Warning];

    assert_eq!(HealthLevel::worst(levels), HealthLevel::Critical);
    assert_eq!(HealthLevel::worst([]), HealthLevel::Healthy);
    assert_eq!(HealthLevel::Critical.to_string(), "critical");
}
