//! Target population: full campaign × visitor cross product.

use funnel_sim_core::{config::GeneratorConfig, engine::SimEngine};
use std::collections::HashSet;

#[test]
fn one_row_per_campaign_visitor_pair() {
    let config = GeneratorConfig {
        visitor_count: 17,
        product_count: 2,
        channel_list: vec!["web".into(), "mobile".into()],
        ..GeneratorConfig::default()
    };
    let dataset = SimEngine::new(config).unwrap().generate().unwrap();

    assert_eq!(dataset.target_population.len(), 4 * 17);
    let keys: HashSet<(&str, &str)> = dataset
        .target_population
        .iter()
        .map(|t| (t.campaign_id.as_str(), t.visitor_id.as_str()))
        .collect();
    assert_eq!(keys.len(), dataset.target_population.len(), "duplicate pairing");
}

#[test]
fn response_outranks_conversion_ranges() {
    let dataset = SimEngine::new(GeneratorConfig::default_test())
        .unwrap()
        .generate()
        .unwrap();
    let n = dataset.target_population.len() as f64;
    let mean_resp: f64 = dataset.target_population.iter().map(|t| t.resp_prob).sum::<f64>() / n;
    let mean_conv: f64 = dataset.target_population.iter().map(|t| t.conv_prob).sum::<f64>() / n;
    assert!(
        mean_resp > mean_conv,
        "funnel should narrow: resp {mean_resp:.4} vs conv {mean_conv:.4}"
    );
    assert!(dataset.target_population.iter().all(|t| t.eligibility_flag));
}

#[test]
fn offers_are_optional_and_unique() {
    let dataset = SimEngine::new(GeneratorConfig::default_test())
        .unwrap()
        .generate()
        .unwrap();
    let offers: Vec<&str> = dataset
        .target_population
        .iter()
        .filter_map(|t| t.offer_id.as_deref())
        .collect();
    let unique: HashSet<&str> = offers.iter().copied().collect();

    assert!(!offers.is_empty(), "some rows should carry an offer");
    assert!(offers.len() < dataset.target_population.len(), "some rows should not");
    assert_eq!(unique.len(), offers.len());
}

#[test]
fn validity_window_matches_campaign_window() {
    let config = GeneratorConfig::default();
    let dataset = SimEngine::new(config.clone()).unwrap().generate().unwrap();
    for t in &dataset.target_population {
        assert_eq!(t.valid_from, Some(config.campaign_window_start));
        assert_eq!(t.valid_to, Some(config.campaign_window_end));
    }
}
