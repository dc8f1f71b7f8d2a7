use chrono::Utc;

use crate::config::SeasonProbe;
use crate::models::{MediaBody, MediaRecord, NormalizedMedia};
use crate::services::extractor::{extract_all_seasons, parse_movie_links, parse_season_zip};

/// Copy the shared record fields around a type-specific body
fn assemble(record: MediaRecord, body: MediaBody) -> NormalizedMedia {
    NormalizedMedia {
        id: record.id,
        record_id: record.record_id,
        title: record.title,
        url_slug: record.url_slug,
        featured_image: record.featured_image,
        poster: record.poster,
        categories: record.categories,
        status: record.status,
        body,
        created_at: record.date,
        updated_at: record.modified_date,
        generated_at: Utc::now(),
    }
}

pub fn format_movie(record: MediaRecord) -> NormalizedMedia {
    let streams = parse_movie_links(record.links.as_deref());
    assemble(record, MediaBody::Movie { streams })
}

pub fn format_series(record: MediaRecord, probe: SeasonProbe) -> NormalizedMedia {
    let seasons = extract_all_seasons(&record.extra, probe);
    if seasons.is_empty() {
        tracing::debug!("Series record {:?} has no seasons", record.id);
    }
    let zip = parse_season_zip(record.season_zip.as_deref());
    assemble(record, MediaBody::Series { seasons, zip })
}
