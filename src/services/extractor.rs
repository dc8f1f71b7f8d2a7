//! Free-text stream extraction
//!
//! Upstream records carry their links as human-authored text, e.g.
//!
//! ```text
//! 720p, https://host/a, 208.27 MB, BluRay
//! Episode 1 : 480p : https://host/b
//! Episode 2 : https://host/c, 1.2GB, 720p
//! Season 1 : https://host/s1.zip, 4.5 GB, 720p
//! ```
//!
//! Everything here is pure: unmatched lines, blocks and broken links are
//! dropped (and counted), never reported as errors.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::SeasonProbe;
use crate::models::{Episode, Quality, Season, SeasonZips, Seasons, Source, Stream};
use crate::services::metrics::record_skipped;

/// Dangling query key left behind when the upstream lost the link id
const BROKEN_LINK_SENTINEL: &str = "vcloud=";

lazy_static! {
    /// Scheme-prefixed token up to the next whitespace or comma
    static ref URL_REGEX: Regex = Regex::new(r"https?://[^\s,]+").unwrap();

    // Tokens are delimited by any non-alphanumeric, so "Movie_1080p_BluRay"
    // and "/Movie.2160p.WEB-DL.mkv" both yield their tags
    static ref QUALITY_REGEX: Regex =
        Regex::new(r"(?i)(?:^|[^a-z0-9])(480p|720p|1080p|2160p|4k)(?:$|[^a-z0-9])").unwrap();
    static ref SIZE_REGEX: Regex =
        Regex::new(r"(?i)(?:^|[^a-z0-9.])(\d+(?:\.\d+)?\s*(?:MB|GB))(?:$|[^a-z0-9])").unwrap();
    static ref SOURCE_REGEX: Regex =
        Regex::new(r"(?i)(?:^|[^a-z0-9])(BluRay|WEB-DL|HDRip|DVDRip)(?:$|[^a-z0-9])").unwrap();
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();

    /// "Episode 3 :" (case-sensitive)
    static ref EPISODE_MARKER: Regex = Regex::new(r"\bEpisode\s+(\d+)\s*:\s*").unwrap();
    /// "Season 2 :" (case-sensitive)
    static ref SEASON_MARKER: Regex = Regex::new(r"\bSeason\s+(\d+)\s*:\s*").unwrap();

    /// Episode stream layouts, leftmost match wins:
    /// (a) `<quality> : <url>[, <size>]`
    /// (b) `<url> , <size>[, <quality>]`
    static ref EPISODE_STREAM: Regex = Regex::new(
        r"(?ix)
        (?:
            (?P<q1>480p|720p|1080p|2160p|4k) \s*:\s*
            (?P<u1>https?://[^\s,]+)
            (?: \s*,\s* (?P<s1>\d+(?:\.\d+)?\s*(?:MB|GB)) )?
        )
        |
        (?:
            (?P<u2>https?://[^\s,]+)
            \s*,\s* (?P<s2>\d+(?:\.\d+)?\s*(?:MB|GB))
            (?: \s*,\s* (?P<q2>480p|720p|1080p|2160p|4k) )?
        )"
    )
    .unwrap();
}

// ============================================================================
// Size normalization
// ============================================================================

/// Canonicalize a human-written size ("1.2 gb" -> "1.2GB")
///
/// 1080p entries upstream frequently lose their decimal point ("15GB" for
/// 1.5GB), so for that quality only an all-digit GB value of two or more
/// digits gets a point inserted before its last digit.
pub fn normalize_size(raw: Option<&str>, quality: Quality) -> Option<String> {
    let cleaned = WHITESPACE_REGEX.replace_all(raw?, "").to_uppercase();
    if cleaned.is_empty() {
        return None;
    }

    if quality == Quality::P1080 {
        if let Some(num) = cleaned.strip_suffix("GB") {
            if num.len() >= 2 && num.bytes().all(|b| b.is_ascii_digit()) {
                let (whole, last) = num.split_at(num.len() - 1);
                return Some(format!("{}.{}GB", whole, last));
            }
        }
    }

    Some(cleaned)
}

fn is_broken_link(url: &str) -> bool {
    url.to_ascii_lowercase().ends_with(BROKEN_LINK_SENTINEL)
}

fn find_quality(text: &str) -> Option<Quality> {
    QUALITY_REGEX
        .captures(text)
        .and_then(|caps| Quality::from_token(&caps[1]))
}

fn find_size(text: &str, quality: Quality) -> Option<String> {
    SIZE_REGEX
        .captures(text)
        .and_then(|caps| normalize_size(Some(&caps[1]), quality))
}

fn find_source(text: &str) -> Option<Source> {
    SOURCE_REGEX
        .captures(text)
        .and_then(|caps| Source::from_token(&caps[1]))
}

/// Split `text` on numbered markers.
///
/// Returns the text before the first marker and the `(number, block)`
/// pairs that follow it. Markers whose number does not fit a `u32` are
/// returned as `None`.
fn split_on_markers<'a>(marker: &Regex, text: &'a str) -> (&'a str, Vec<(Option<u32>, &'a str)>) {
    let mut preamble_end = text.len();
    let mut heads: Vec<(Option<u32>, usize, usize)> = Vec::new();

    for caps in marker.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if heads.is_empty() {
            preamble_end = whole.start();
        }
        heads.push((caps[1].parse().ok(), whole.start(), whole.end()));
    }

    let blocks = heads
        .iter()
        .enumerate()
        .map(|(i, &(number, _, body_start))| {
            let body_end = heads.get(i + 1).map(|h| h.1).unwrap_or(text.len());
            (number, &text[body_start..body_end])
        })
        .collect();

    (&text[..preamble_end], blocks)
}

// ============================================================================
// Movies
// ============================================================================

/// Parse a movie's `links` text, one candidate stream per line
pub fn parse_movie_links(text: Option<&str>) -> Vec<Stream> {
    let Some(text) = text else {
        return Vec::new();
    };

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_movie_line)
        .collect()
}

fn parse_movie_line(line: &str) -> Option<Stream> {
    let Some(url) = URL_REGEX.find(line) else {
        debug!("Skipping movie line without a link: {}", line);
        record_skipped("no_url");
        return None;
    };

    let quality = find_quality(line).unwrap_or_default();

    Some(Stream {
        quality,
        size: find_size(line, quality),
        source: find_source(line),
        url: url.as_str().to_string(),
    })
}

// ============================================================================
// Series
// ============================================================================

/// Parse one season's text into episodes keyed by episode number
pub fn parse_season(text: &str) -> BTreeMap<u32, Episode> {
    let (_, blocks) = split_on_markers(&EPISODE_MARKER, text);
    let mut episodes: BTreeMap<u32, Episode> = BTreeMap::new();

    for (number, block) in blocks {
        let number = match number {
            Some(n) if n > 0 => n,
            _ => {
                debug!("Skipping episode block with invalid number");
                record_skipped("bad_episode");
                continue;
            }
        };

        let streams = parse_episode_block(block);
        episodes
            .entry(number)
            .or_insert_with(|| Episode {
                number,
                streams: Vec::new(),
            })
            .streams
            .extend(streams);
    }

    episodes
}

fn parse_episode_block(block: &str) -> Vec<Stream> {
    let mut streams = Vec::new();

    for caps in EPISODE_STREAM.captures_iter(block) {
        let (url, size, quality) = if let Some(url) = caps.name("u1") {
            (url, caps.name("s1"), caps.name("q1"))
        } else if let Some(url) = caps.name("u2") {
            (url, caps.name("s2"), caps.name("q2"))
        } else {
            continue;
        };

        let url = url.as_str();
        if is_broken_link(url) {
            debug!("Dropping broken episode link: {}", url);
            record_skipped("broken_link");
            continue;
        }

        let quality = quality
            .and_then(|q| Quality::from_token(q.as_str()))
            .unwrap_or_default();

        streams.push(Stream {
            quality,
            size: normalize_size(size.map(|s| s.as_str()), quality),
            source: None,
            url: url.to_string(),
        });
    }

    streams
}

/// Free text ahead of the first episode marker, if any
pub fn season_title(text: &str) -> Option<String> {
    let (preamble, _) = split_on_markers(&EPISODE_MARKER, text);
    let title = preamble.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Collect `season_1`, `season_2`, ... from a record's loose keys
///
/// With [`SeasonProbe::Contiguous`] enumeration ends at the first key that
/// is missing, null or not a string, so a gap hides every later season.
pub fn extract_all_seasons(fields: &Map<String, Value>, probe: SeasonProbe) -> Seasons {
    let mut seasons = Vec::new();
    let max = match probe {
        SeasonProbe::Contiguous => u32::MAX,
        SeasonProbe::Tolerant { max } => max,
    };

    for index in 1..=max {
        let text = match fields.get(&format!("season_{}", index)) {
            Some(Value::String(text)) => text,
            _ if probe == SeasonProbe::Contiguous => break,
            _ => continue,
        };

        seasons.push(Season {
            index,
            title: season_title(text),
            episodes: parse_season(text),
        });
    }

    Seasons(seasons)
}

/// Parse the `season_zip` text: per-season archive links
pub fn parse_season_zip(text: Option<&str>) -> SeasonZips {
    let mut zips: BTreeMap<u32, Vec<Stream>> = BTreeMap::new();
    let Some(text) = text else {
        return SeasonZips(zips);
    };

    let (_, blocks) = split_on_markers(&SEASON_MARKER, text);
    for (number, block) in blocks {
        let Some(number) = number.filter(|n| *n > 0) else {
            record_skipped("bad_season");
            continue;
        };

        let urls: Vec<_> = URL_REGEX.find_iter(block).collect();
        for (i, url) in urls.iter().enumerate() {
            if is_broken_link(url.as_str()) {
                debug!("Dropping broken zip link: {}", url.as_str());
                record_skipped("broken_link");
                continue;
            }

            // Metadata for this link sits between it and the next link
            let tail_end = urls.get(i + 1).map(|next| next.start()).unwrap_or(block.len());
            let tail = &block[url.end()..tail_end];
            let tail = tail.split('\n').next().unwrap_or_default();

            let quality = find_quality(tail).unwrap_or_default();

            zips.entry(number).or_default().push(Stream {
                quality,
                size: find_size(tail, quality),
                source: find_source(tail),
                url: url.as_str().to_string(),
            });
        }
    }

    SeasonZips(zips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_size_1080p_heuristic() {
        assert_eq!(normalize_size(Some("15GB"), Quality::P1080), Some("1.5GB".to_string()));
        assert_eq!(normalize_size(Some("150GB"), Quality::P1080), Some("15.0GB".to_string()));
        assert_eq!(normalize_size(Some("15 gb"), Quality::P1080), Some("1.5GB".to_string()));
        // Already has a decimal point, or a single digit
        assert_eq!(normalize_size(Some("1.5GB"), Quality::P1080), Some("1.5GB".to_string()));
        assert_eq!(normalize_size(Some("2GB"), Quality::P1080), Some("2GB".to_string()));
        assert_eq!(normalize_size(Some("850MB"), Quality::P1080), Some("850MB".to_string()));
    }

    #[test]
    fn test_normalize_size_other_qualities() {
        assert_eq!(normalize_size(Some("15GB"), Quality::P720), Some("15GB".to_string()));
        assert_eq!(normalize_size(Some(" 15 GB "), Quality::P720), Some("15GB".to_string()));
        assert_eq!(normalize_size(Some("208.27 mb"), Quality::Unknown), Some("208.27MB".to_string()));
        assert_eq!(normalize_size(None, Quality::P1080), None);
        assert_eq!(normalize_size(Some("   "), Quality::P480), None);
    }

    #[test]
    fn test_parse_movie_links_empty() {
        assert!(parse_movie_links(None).is_empty());
        assert!(parse_movie_links(Some("")).is_empty());
        assert!(parse_movie_links(Some("no link here")).is_empty());
    }

    #[test]
    fn test_parse_movie_line_full() {
        let streams = parse_movie_links(Some("720p, https://x.test/a, 208.27 MB, BluRay"));
        assert_eq!(streams.len(), 1);
        assert_eq!(
            streams[0],
            Stream {
                quality: Quality::P720,
                size: Some("208.27MB".to_string()),
                source: Some(Source::BluRay),
                url: "https://x.test/a".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_movie_links_order_and_defaults() {
        let text = "Download links\n\
                    https://x.test/one\n\
                    4k : https://x.test/two, 15 GB, web-dl\n\
                    1080p https://x.test/three 15GB";
        let streams = parse_movie_links(Some(text));
        assert_eq!(streams.len(), 3);

        assert_eq!(streams[0].url, "https://x.test/one");
        assert_eq!(streams[0].quality, Quality::Unknown);
        assert_eq!(streams[0].size, None);
        assert_eq!(streams[0].source, None);

        assert_eq!(streams[1].quality, Quality::Uhd4k);
        assert_eq!(streams[1].size.as_deref(), Some("15GB"));
        assert_eq!(streams[1].source, Some(Source::WebDl));

        assert_eq!(streams[2].quality, Quality::P1080);
        assert_eq!(streams[2].size.as_deref(), Some("1.5GB"));
    }

    #[test]
    fn test_parse_movie_line_reads_tags_from_file_name() {
        let streams = parse_movie_links(Some("https://x.test/Movie.2160p.WEB-DL.mkv, 4.1 GB"));
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].quality, Quality::P2160);
        assert_eq!(streams[0].source, Some(Source::WebDl));
        assert_eq!(streams[0].size.as_deref(), Some("4.1GB"));
    }

    #[test]
    fn test_parse_movie_line_first_quality_wins() {
        let streams = parse_movie_links(Some("https://x.test/720p/file.mkv 1080p"));
        assert_eq!(streams[0].quality, Quality::P720);
    }

    #[test]
    fn test_parse_movie_line_underscore_joined_tags() {
        let streams = parse_movie_links(Some("Movie_1080p_BluRay, https://x.test/a, 2GB"));
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].quality, Quality::P1080);
        assert_eq!(streams[0].source, Some(Source::BluRay));
        assert_eq!(streams[0].size.as_deref(), Some("2GB"));
    }

    #[test]
    fn test_quality_token_not_embedded_in_word() {
        let streams = parse_movie_links(Some("https://x.test/4kids/show"));
        assert_eq!(streams[0].quality, Quality::Unknown);
    }

    #[test]
    fn test_parse_season_both_layouts() {
        let text = "Season One\nEpisode 1 : 480p : https://x.test/b\nEpisode 2 : https://x.test/c, 1.2GB, 720p";
        let episodes = parse_season(text);
        assert_eq!(episodes.len(), 2);

        let first = &episodes[&1];
        assert_eq!(first.number, 1);
        assert_eq!(first.streams.len(), 1);
        assert_eq!(first.streams[0].quality, Quality::P480);
        assert_eq!(first.streams[0].url, "https://x.test/b");
        assert_eq!(first.streams[0].size, None);

        let second = &episodes[&2];
        assert_eq!(second.streams.len(), 1);
        assert_eq!(second.streams[0].quality, Quality::P720);
        assert_eq!(second.streams[0].url, "https://x.test/c");
        assert_eq!(second.streams[0].size.as_deref(), Some("1.2GB"));
    }

    #[test]
    fn test_parse_season_mixed_layouts_keep_text_order() {
        let text = "Episode 1 : https://x.test/a, 15GB, 1080p 720p : https://x.test/b https://x.test/c, 300 MB";
        let streams = &parse_season(text)[&1].streams;
        let urls: Vec<_> = streams.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.test/a", "https://x.test/b", "https://x.test/c"]);
        assert_eq!(streams[0].size.as_deref(), Some("1.5GB"));
        assert_eq!(streams[2].quality, Quality::Unknown);
        assert_eq!(streams[2].size.as_deref(), Some("300MB"));
    }

    #[test]
    fn test_parse_season_drops_broken_links() {
        let text = "Episode 1 : 720p : https://x.test/watch?vcloud= 1080p : https://x.test/good";
        let streams = &parse_season(text)[&1].streams;
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].url, "https://x.test/good");
        assert_eq!(streams[0].quality, Quality::P1080);
    }

    #[test]
    fn test_parse_season_marker_is_case_sensitive() {
        let episodes = parse_season("episode 1 : 720p : https://x.test/a");
        assert!(episodes.is_empty());
    }

    #[test]
    fn test_parse_season_merges_repeated_episode() {
        let text = "Episode 1 : 480p : https://x.test/a Episode 1 : 720p : https://x.test/b";
        let episodes = parse_season(text);
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[&1].streams.len(), 2);
    }

    #[test]
    fn test_season_title() {
        assert_eq!(
            season_title("  Season 1 (2019)\nEpisode 1 : 720p : https://x.test/a"),
            Some("Season 1 (2019)".to_string())
        );
        assert_eq!(season_title("Episode 1 : 720p : https://x.test/a"), None);
    }

    #[test]
    fn test_extract_all_seasons_stops_at_gap() {
        let fields = json!({
            "season_1": "Episode 1 : 720p : https://x.test/a",
            "season_3": "Episode 1 : 720p : https://x.test/c",
        });
        let seasons = extract_all_seasons(fields.as_object().unwrap(), SeasonProbe::Contiguous);
        assert_eq!(seasons.len(), 1);
        assert!(seasons.get(1).is_some());
        assert!(seasons.get(3).is_none());
    }

    #[test]
    fn test_extract_all_seasons_stops_at_null() {
        let fields = json!({
            "season_1": "Episode 1 : 720p : https://x.test/a",
            "season_2": null,
            "season_3": "Episode 1 : 720p : https://x.test/c",
        });
        let seasons = extract_all_seasons(fields.as_object().unwrap(), SeasonProbe::Contiguous);
        assert_eq!(seasons.len(), 1);
    }

    #[test]
    fn test_extract_all_seasons_tolerant() {
        let fields = json!({
            "season_1": "Episode 1 : 720p : https://x.test/a",
            "season_3": "Episode 1 : 720p : https://x.test/c",
        });
        let seasons =
            extract_all_seasons(fields.as_object().unwrap(), SeasonProbe::Tolerant { max: 10 });
        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons.get(3).unwrap().episodes[&1].streams[0].url, "https://x.test/c");
    }

    #[test]
    fn test_parse_season_zip() {
        let text = "Season 1 : https://x.test/s1-720.zip, 4.5 GB, 720p\n\
                    https://x.test/s1-1080.zip, 95GB, 1080p\n\
                    Season 2 : https://x.test/s2.zip 480p https://x.test/broken?vcloud=";
        let zips = parse_season_zip(Some(text)).0;
        assert_eq!(zips.len(), 2);

        let first = &zips[&1];
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].quality, Quality::P720);
        assert_eq!(first[0].size.as_deref(), Some("4.5GB"));
        assert_eq!(first[1].quality, Quality::P1080);
        assert_eq!(first[1].size.as_deref(), Some("9.5GB"));

        let second = &zips[&2];
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].url, "https://x.test/s2.zip");
        assert_eq!(second[0].quality, Quality::P480);
    }

    #[test]
    fn test_parse_season_zip_empty() {
        assert!(parse_season_zip(None).0.is_empty());
        assert!(parse_season_zip(Some("nothing here")).0.is_empty());
    }
}
