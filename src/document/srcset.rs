//! `srcset` attribute parsing
//!
//! A candidate is a URL followed by an optional descriptor (`2x`, `640w`).
//! URLs may themselves contain commas (`/img/w_100,h_100/a.png`), so a comma
//! only ends a candidate when it follows the descriptor or trails the URL.

/// One image candidate of a `srcset`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetCandidate {
    pub url: String,
    /// Descriptor text as written, empty when absent
    pub descriptor: String,
}

/// Split a `srcset` value into its candidates, in order
#[must_use]
pub fn parse_srcset(value: &str) -> Vec<SrcsetCandidate> {
    let mut candidates = Vec::new();
    let mut rest = value;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let url_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let raw_url = &rest[..url_end];
        rest = &rest[url_end..];

        // A trailing comma on the URL ends the candidate with no descriptor
        let url = raw_url.trim_end_matches(',');
        if url.len() != raw_url.len() {
            candidates.push(SrcsetCandidate {
                url: url.to_string(),
                descriptor: String::new(),
            });
            continue;
        }

        let mut depth = 0usize;
        let descriptor_end = rest
            .char_indices()
            .find(|&(_, c)| match c {
                '(' => {
                    depth += 1;
                    false
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    false
                }
                ',' => depth == 0,
                _ => false,
            })
            .map_or(rest.len(), |(i, _)| i);

        candidates.push(SrcsetCandidate {
            url: url.to_string(),
            descriptor: rest[..descriptor_end].trim().to_string(),
        });
        rest = &rest[descriptor_end..];
    }

    candidates
}

/// Join candidates back into a `srcset` value
#[must_use]
pub fn serialize_srcset(candidates: &[SrcsetCandidate]) -> String {
    candidates
        .iter()
        .map(|c| {
            if c.descriptor.is_empty() {
                c.url.clone()
            } else {
                format!("{} {}", c.url, c.descriptor)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(value: &str) -> Vec<(String, String)> {
        parse_srcset(value)
            .into_iter()
            .map(|c| (c.url, c.descriptor))
            .collect()
    }

    #[test]
    fn parses_density_and_width_descriptors() {
        assert_eq!(
            pairs("/a.png 1x, /a@2x.png 2x"),
            vec![
                ("/a.png".into(), "1x".into()),
                ("/a@2x.png".into(), "2x".into())
            ]
        );
        assert_eq!(
            pairs("small.jpg 480w,large.jpg 1080w"),
            vec![
                ("small.jpg".into(), "480w".into()),
                ("large.jpg".into(), "1080w".into())
            ]
        );
    }

    #[test]
    fn candidate_without_descriptor() {
        assert_eq!(
            pairs("/a.png, /b.png 2x"),
            vec![("/a.png".into(), String::new()), ("/b.png".into(), "2x".into())]
        );
        assert_eq!(pairs("/only.png"), vec![("/only.png".into(), String::new())]);
    }

    #[test]
    fn commas_inside_urls_are_kept() {
        assert_eq!(
            pairs("/img/w_100,h_100/a.png 1x, /img/w_200,h_200/a.png 2x"),
            vec![
                ("/img/w_100,h_100/a.png".into(), "1x".into()),
                ("/img/w_200,h_200/a.png".into(), "2x".into())
            ]
        );
    }

    #[test]
    fn empty_and_whitespace_values() {
        assert!(parse_srcset("").is_empty());
        assert!(parse_srcset("  ,  ").is_empty());
    }

    #[test]
    fn serialize_preserves_order_and_descriptors() {
        let candidates = parse_srcset("/a.png 1x,   /b.png   2x, /c.png");
        assert_eq!(serialize_srcset(&candidates), "/a.png 1x, /b.png 2x, /c.png");
    }
}
