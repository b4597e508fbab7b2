//! Funnel output: legality, ordering and conversion exits.

use funnel_sim_core::{
    catalog::ApplicationStatus,
    config::GeneratorConfig,
    engine::{Dataset, SimEngine},
    funnel::is_legal_story,
    types::Timestamp,
};
use std::collections::{BTreeMap, HashMap, HashSet};

fn busy_dataset(seed: u64) -> Dataset {
    let config = GeneratorConfig {
        random_seed: seed,
        submission_probability: 0.4,
        ..GeneratorConfig::default_test()
    };
    SimEngine::new(config).unwrap().generate().unwrap()
}

type PairKey<'a> = (&'a str, &'a str);

#[test]
fn every_story_is_a_legal_status_sequence() {
    let dataset = busy_dataset(42);
    let mut stories: BTreeMap<&str, Vec<ApplicationStatus>> = BTreeMap::new();
    for app in &dataset.applications {
        stories.entry(app.story_id.as_str()).or_default().push(app.status);
    }
    assert!(!stories.is_empty(), "expected some application stories");
    assert_eq!(stories.len(), dataset.tally.stories);

    for (id, statuses) in &stories {
        assert!(is_legal_story(statuses), "story {id} is illegal: {statuses:?}");
        let decisions = statuses
            .iter()
            .filter(|s| matches!(s, ApplicationStatus::Approved | ApplicationStatus::Rejected))
            .count();
        assert!(decisions <= 1, "story {id} decided twice: {statuses:?}");
    }
}

#[test]
fn application_ids_are_unique_per_row() {
    let dataset = busy_dataset(7);
    let ids: HashSet<&str> = dataset
        .applications
        .iter()
        .map(|a| a.application_id.as_str())
        .collect();
    assert_eq!(ids.len(), dataset.applications.len());
}

#[test]
fn timestamps_strictly_increase_within_each_pairing() {
    let dataset = busy_dataset(11);
    let start = GeneratorConfig::default_test().campaign_window_start;

    let mut clicks: HashMap<PairKey, Vec<Timestamp>> = HashMap::new();
    for a in &dataset.activities {
        clicks
            .entry((a.visitor_id.as_str(), a.clicked_campaign.as_str()))
            .or_default()
            .push(a.clicked_dt);
    }
    let mut statuses: HashMap<PairKey, Vec<Timestamp>> = HashMap::new();
    for a in &dataset.applications {
        statuses
            .entry((a.visitor_id.as_str(), a.campaign_id.as_str()))
            .or_default()
            .push(a.status_dt);
    }

    for (pair, stamps) in &clicks {
        assert!(stamps[0] > start, "{pair:?} clicked at window start");
        assert!(stamps.windows(2).all(|w| w[0] < w[1]), "{pair:?} clicks out of order");
    }
    for (pair, stamps) in &statuses {
        assert!(stamps.windows(2).all(|w| w[0] < w[1]), "{pair:?} statuses out of order");
        // No application event may share a timestamp with a click.
        let pair_clicks = &clicks[pair];
        assert!(stamps.iter().all(|t| !pair_clicks.contains(t)), "{pair:?} has a tie");
    }
}

#[test]
fn applications_only_follow_clicks() {
    let dataset = busy_dataset(3);
    let clicked: HashSet<PairKey> = dataset
        .activities
        .iter()
        .map(|a| (a.visitor_id.as_str(), a.clicked_campaign.as_str()))
        .collect();
    for app in &dataset.applications {
        assert!(
            clicked.contains(&(app.visitor_id.as_str(), app.campaign_id.as_str())),
            "{app} has no preceding click"
        );
    }
}

#[test]
fn conversion_ends_clicks_for_the_pairing() {
    let dataset = busy_dataset(21);
    let conversions: Vec<_> = dataset
        .applications
        .iter()
        .filter(|a| a.status == ApplicationStatus::Converted)
        .collect();

    for conv in &conversions {
        assert!(conv.conversion_flag, "{conv} converted without flag");
        let later_clicks = dataset
            .activities
            .iter()
            .filter(|a| a.visitor_id == conv.visitor_id && a.clicked_campaign == conv.campaign_id)
            .filter(|a| a.clicked_dt > conv.status_dt)
            .count();
        assert_eq!(later_clicks, 0, "{conv} is followed by more clicks");
    }
    assert!(dataset
        .applications
        .iter()
        .filter(|a| a.conversion_flag)
        .all(|a| a.status == ApplicationStatus::Converted));
}

#[test]
fn certain_cancellation_yields_two_row_stories() {
    let config = GeneratorConfig {
        submission_probability: 1.0,
        cancel_probability: 1.0,
        ..GeneratorConfig::default()
    };
    let dataset = SimEngine::new(config).unwrap().generate().unwrap();

    let mut stories: BTreeMap<&str, Vec<ApplicationStatus>> = BTreeMap::new();
    for app in &dataset.applications {
        stories.entry(app.story_id.as_str()).or_default().push(app.status);
    }
    assert_eq!(stories.len(), dataset.activities.len(), "one story per click");
    for statuses in stories.values() {
        assert_eq!(statuses, &vec![ApplicationStatus::Applied, ApplicationStatus::Cancelled]);
    }
    assert_eq!(dataset.tally.cancelled, dataset.tally.stories);
}

#[test]
fn no_submissions_means_no_applications() {
    let config = GeneratorConfig {
        submission_probability: 0.0,
        ..GeneratorConfig::default_test()
    };
    let dataset = SimEngine::new(config).unwrap().generate().unwrap();
    assert!(!dataset.activities.is_empty());
    assert!(dataset.applications.is_empty());
    assert_eq!(dataset.tally.stories, 0);
}
