use collector_engine::{build_variants, ParamError, ParamSpec, Window};

fn spec(period_param: Option<&str>) -> ParamSpec {
    ParamSpec {
        fixed: vec![("serviceKey".to_string(), "demo".to_string())],
        period_param: period_param.map(str::to_string),
    }
}

fn window(start: &str, end: &str) -> Window {
    Window {
        start: start.to_string(),
        end: end.to_string(),
    }
}

#[test]
fn yearly_window_yields_one_variant_per_year() {
    let variants = build_variants(&spec(Some("year")), &window("2019", "2021")).unwrap();
    let years: Vec<_> = variants
        .iter()
        .map(|v| v.params().last().unwrap().1.clone())
        .collect();
    assert_eq!(years, vec!["2019", "2020", "2021"]);
    assert!(variants.iter().all(|v| !v.is_reducible()));
    // Fixed params ride along on every variant.
    assert!(variants
        .iter()
        .all(|v| v.params()[0] == ("serviceKey".to_string(), "demo".to_string())));
}

#[test]
fn single_year_window_is_reducible() {
    let mut variants = build_variants(&spec(Some("year")), &window("2023", "2023")).unwrap();
    assert_eq!(variants.len(), 1);
    assert!(variants[0].is_reducible());

    variants[0].reduce();
    assert_eq!(variants[0].params().last().unwrap().1, "2022");
    variants[0].reduce();
    assert_eq!(variants[0].params().last().unwrap().1, "2021");
}

#[test]
fn monthly_window_rolls_over_year_boundaries() {
    let variants = build_variants(&spec(Some("month")), &window("202311", "202402")).unwrap();
    let months: Vec<_> = variants
        .iter()
        .map(|v| v.params().last().unwrap().1.clone())
        .collect();
    assert_eq!(months, vec!["202311", "202312", "202401", "202402"]);
}

#[test]
fn single_month_window_is_not_reducible() {
    let variants = build_variants(&spec(Some("month")), &window("202311", "202311")).unwrap();
    assert_eq!(variants.len(), 1);
    assert!(!variants[0].is_reducible());
}

#[test]
fn missing_period_param_collapses_to_one_opaque_variant() {
    let variants = build_variants(&spec(None), &window("2019", "2021")).unwrap();
    assert_eq!(variants.len(), 1);
    assert_eq!(
        variants[0].params(),
        &[("serviceKey".to_string(), "demo".to_string())]
    );
    assert!(!variants[0].is_reducible());
}

#[test]
fn window_validation_rejects_bad_bounds() {
    assert_eq!(
        build_variants(&spec(Some("year")), &window("2023", "2021")).unwrap_err(),
        ParamError::InvertedWindow {
            start: "2023".to_string(),
            end: "2021".to_string(),
        }
    );
    assert_eq!(
        build_variants(&spec(Some("year")), &window("2023", "202311")).unwrap_err(),
        ParamError::MixedGranularity {
            start: "2023".to_string(),
            end: "202311".to_string(),
        }
    );
    assert!(matches!(
        build_variants(&spec(Some("year")), &window("23", "24")).unwrap_err(),
        ParamError::BadStamp(_)
    ));
    assert!(matches!(
        build_variants(&spec(Some("month")), &window("202313", "202401")).unwrap_err(),
        ParamError::BadStamp(_)
    ));
}

#[test]
fn window_labels_collapse_point_windows() {
    assert_eq!(window("2023", "2023").label(), "2023");
    assert_eq!(window("2019", "2021").label(), "2019-2021");
}
