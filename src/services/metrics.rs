use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Upstream fetches by outcome (ok, network, status, decode)
    pub static ref UPSTREAM_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "upstream_requests_total",
        "Upstream record fetches by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Items dropped during extraction (no_url, broken_link, bad_episode)
    pub static ref EXTRACTION_SKIPPED: IntCounterVec = register_int_counter_vec!(
        "extraction_skipped_total",
        "Lines, links or blocks silently dropped while normalizing",
        &["kind"]
    )
    .unwrap();
}

pub fn record_upstream(outcome: &str) {
    UPSTREAM_REQUESTS.with_label_values(&[outcome]).inc();
}

pub fn record_skipped(kind: &str) {
    EXTRACTION_SKIPPED.with_label_values(&[kind]).inc();
}
