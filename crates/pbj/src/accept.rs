//! Quality-weighted Accept-header matching.
//!
//! Kept as its own module because the algorithm is fiddly out of proportion
//! to its size: wildcard ranges, q-value parsing, specificity tie-breaks,
//! and a deterministic fallback to configuration order all interact.
//! Reference: RFC 7231 §5.3.2.

/// One media range from an Accept header.
#[derive(Debug, Clone, PartialEq)]
struct MediaRange {
    type_: String,
    subtype: String,
    quality: f32,
}

/// How precisely a range names a type: exact beats `type/*` beats `*/*`.
const SPECIFICITY_EXACT: u8 = 3;
const SPECIFICITY_SUBTYPE_WILDCARD: u8 = 2;
const SPECIFICITY_FULL_WILDCARD: u8 = 1;

fn parse(header: &str) -> Vec<MediaRange> {
    let mut ranges = Vec::new();
    for segment in header.split(',') {
        let mut parts = segment.split(';');
        let Some(mime) = parts.next() else {
            continue;
        };
        let mime = mime.trim().to_ascii_lowercase();
        // A bare "*" is shorthand some clients send for "*/*".
        let (type_, subtype) = if mime == "*" {
            ("*".to_string(), "*".to_string())
        } else {
            match mime.split_once('/') {
                Some((t, s)) if !t.is_empty() && !s.is_empty() => {
                    (t.to_string(), s.to_string())
                }
                _ => continue,
            }
        };
        let mut quality = 1.0f32;
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if key.trim().eq_ignore_ascii_case("q") {
                if let Ok(q) = value.trim().parse::<f32>() {
                    quality = q.clamp(0.0, 1.0);
                }
            }
        }
        ranges.push(MediaRange {
            type_,
            subtype,
            quality,
        });
    }
    ranges
}

fn match_specificity(range: &MediaRange, type_: &str, subtype: &str) -> Option<u8> {
    match (range.type_.as_str(), range.subtype.as_str()) {
        ("*", "*") => Some(SPECIFICITY_FULL_WILDCARD),
        (t, "*") if t == type_ => Some(SPECIFICITY_SUBTYPE_WILDCARD),
        (t, s) if t == type_ && s == subtype => Some(SPECIFICITY_EXACT),
        _ => None,
    }
}

/// The quality the header assigns to one concrete mimetype: the q-value of
/// the most specific range that matches it, or 0.0 when nothing matches.
fn quality_for(ranges: &[MediaRange], mimetype: &str) -> f32 {
    let lowered = mimetype.to_ascii_lowercase();
    let (type_, subtype) = match lowered.split_once('/') {
        Some(pair) => pair,
        None => return 0.0,
    };
    let mut best: Option<(u8, f32)> = None;
    for range in ranges {
        let Some(specificity) = match_specificity(range, type_, subtype) else {
            continue;
        };
        let better = match best {
            None => true,
            Some((s, q)) => {
                specificity > s || (specificity == s && range.quality > q)
            }
        };
        if better {
            best = Some((specificity, range.quality));
        }
    }
    best.map(|(_, q)| q).unwrap_or(0.0)
}

/// Picks the candidate the client prefers most.
///
/// Candidates are tried in the given order; a later candidate replaces an
/// earlier one only with strictly higher quality, so configuration order is
/// the tie-break. A missing header counts as `*/*`. Returns the index into
/// `candidates`, or `None` when nothing is acceptable.
pub fn best_match(header: Option<&str>, candidates: &[String]) -> Option<usize> {
    let header = header.unwrap_or("*/*");
    let ranges = parse(header);
    let mut best: Option<(usize, f32)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let q = quality_for(&ranges, candidate);
        if q <= 0.0 {
            continue;
        }
        if best.map(|(_, bq)| q > bq).unwrap_or(true) {
            best = Some((i, q));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mimetypes(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_wins_over_wildcard() {
        let configured = mimetypes(&["application/json", "application/x-protobuf"]);
        let chosen = best_match(
            Some("application/x-protobuf;q=0.9, */*;q=0.1"),
            &configured,
        );
        assert_eq!(chosen, Some(1));
    }

    #[test]
    fn no_acceptable_match() {
        let configured = mimetypes(&["application/json", "application/x-protobuf"]);
        assert_eq!(best_match(Some("application/x-plist"), &configured), None);
    }

    #[test]
    fn wildcard_ties_break_by_configuration_order() {
        let configured = mimetypes(&["application/json", "application/x-protobuf"]);
        assert_eq!(best_match(Some("*/*"), &configured), Some(0));

        let flipped = mimetypes(&["application/x-protobuf", "application/json"]);
        assert_eq!(best_match(Some("*/*"), &flipped), Some(0));
    }

    #[test]
    fn missing_header_accepts_anything() {
        let configured = mimetypes(&["application/json"]);
        assert_eq!(best_match(None, &configured), Some(0));
    }

    #[test]
    fn subtype_wildcard_matches_type() {
        let configured = mimetypes(&["text/plain", "application/json"]);
        assert_eq!(best_match(Some("application/*"), &configured), Some(1));
    }

    #[test]
    fn quality_zero_excludes() {
        let configured = mimetypes(&["application/json"]);
        assert_eq!(best_match(Some("application/json;q=0"), &configured), None);
        assert_eq!(
            best_match(Some("application/json;q=0, */*;q=0"), &configured),
            None
        );
    }

    #[test]
    fn more_specific_range_overrides_wildcard_quality() {
        // */* says 1.0 but the exact range says 0.2; exact wins for json.
        let configured = mimetypes(&["application/json", "application/x-protobuf"]);
        let chosen = best_match(Some("application/json;q=0.2, */*;q=1.0"), &configured);
        assert_eq!(chosen, Some(1));
    }

    #[test]
    fn malformed_segments_are_skipped() {
        let configured = mimetypes(&["application/json"]);
        assert_eq!(
            best_match(Some("garbage, ;;q=x, application/json"), &configured),
            Some(0)
        );
        assert_eq!(best_match(Some(""), &configured), None);
    }

    #[test]
    fn bare_star_is_full_wildcard() {
        let configured = mimetypes(&["application/json"]);
        assert_eq!(best_match(Some("*"), &configured), Some(0));
    }

    #[test]
    fn case_insensitive_matching() {
        let configured = mimetypes(&["application/json"]);
        assert_eq!(best_match(Some("Application/JSON"), &configured), Some(0));
    }
}
