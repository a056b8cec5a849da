//! Detail-page link classification and derivation.
//!
//! Every fixture has a family of sibling pages that differ only in one path
//! segment (`yazhi-{fid}.shtml`, `ouzhi-{fid}.shtml`, `shuju-{fid}.shtml`).
//! Whatever the base row links to, the missing siblings are derived by
//! substitution. This is a heuristic: a site redesign that renames the
//! segments breaks it silently.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static DETAIL_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(yazhi|ouzhi|shuju)-(\d+)\.shtml").expect("detail page regex")
});

/// The kinds of per-fixture page the site exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKind {
    /// Asian handicap comparison.
    Asian,
    /// European odds / Kelly comparison.
    European,
    /// Head-to-head analysis.
    Analysis,
}

impl DetailKind {
    /// Path segment stem for this kind, also used by the raw data endpoint.
    pub fn stem(self) -> &'static str {
        match self {
            Self::Asian => "yazhi",
            Self::European => "ouzhi",
            Self::Analysis => "shuju",
        }
    }

    fn from_stem(stem: &str) -> Option<Self> {
        match stem {
            "yazhi" => Some(Self::Asian),
            "ouzhi" => Some(Self::European),
            "shuju" => Some(Self::Analysis),
            _ => None,
        }
    }
}

/// Which detail page `url` points at, if any.
pub fn classify(url: &str) -> Option<DetailKind> {
    let caps = DETAIL_PAGE.captures(url)?;
    DetailKind::from_stem(caps.get(1)?.as_str())
}

/// Whether `href` points at any detail page.
pub fn is_detail_link(href: &str) -> bool {
    DETAIL_PAGE.is_match(href)
}

/// The numeric fixture id embedded in a detail URL.
pub fn fixture_id(url: &str) -> Option<&str> {
    DETAIL_PAGE
        .captures(url)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
}

/// Rewrite a detail URL to point at the sibling page of kind `to`.
pub fn substitute(url: &str, to: DetailKind) -> Option<String> {
    let caps = DETAIL_PAGE.captures(url)?;
    let stem = caps.get(1)?;
    let mut out = String::with_capacity(url.len());
    out.push_str(&url[..stem.start()]);
    out.push_str(to.stem());
    out.push_str(&url[stem.end()..]);
    Some(out)
}

/// Raw structured-data endpoint for a detail page:
/// `{origin}/fenxi1/{kind}_json.php?fid={fid}`.
pub fn raw_data_url(detail_url: &str, kind: DetailKind) -> Option<String> {
    let parsed = Url::parse(detail_url).ok()?;
    let fid = fixture_id(detail_url)?;
    let origin = parsed.origin().ascii_serialization();
    Some(format!("{origin}/fenxi1/{}_json.php?fid={fid}", kind.stem()))
}

/// Detail links resolved for one base row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailLinks {
    pub asian: Option<String>,
    pub european: Option<String>,
    pub analysis: Option<String>,
}

impl DetailLinks {
    /// Classify `hrefs` (resolved against `base` when relative) and fill in
    /// missing Asian/European pages from any sibling that was found.
    pub fn from_hrefs(hrefs: &[String], base: Option<&Url>) -> Self {
        let mut links = Self::default();

        for href in hrefs {
            let Some(kind) = classify(href) else {
                continue;
            };
            let Some(resolved) = resolve(href, base) else {
                continue;
            };
            let slot = match kind {
                DetailKind::Asian => &mut links.asian,
                DetailKind::European => &mut links.european,
                DetailKind::Analysis => &mut links.analysis,
            };
            if slot.is_none() {
                *slot = Some(resolved);
            }
        }

        let sibling = links
            .asian
            .clone()
            .or_else(|| links.european.clone())
            .or_else(|| links.analysis.clone());

        if let Some(sibling) = sibling {
            if links.asian.is_none() {
                links.asian = substitute(&sibling, DetailKind::Asian);
            }
            if links.european.is_none() {
                links.european = substitute(&sibling, DetailKind::European);
            }
        }

        links
    }
}

fn resolve(href: &str, base: Option<&Url>) -> Option<String> {
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.and_then(|b| b.join(href).ok()).map(|u| u.to_string())
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_segment() {
        assert_eq!(
            classify("https://odds.500.com/fenxi/yazhi-1120001.shtml"),
            Some(DetailKind::Asian)
        );
        assert_eq!(
            classify("https://odds.500.com/fenxi/ouzhi-1120001.shtml"),
            Some(DetailKind::European)
        );
        assert_eq!(classify("https://live.500.com/"), None);
    }

    #[test]
    fn substitute_swaps_only_the_stem() {
        let asian = "https://odds.500.com/fenxi/yazhi-1120001.shtml";
        assert_eq!(
            substitute(asian, DetailKind::European).as_deref(),
            Some("https://odds.500.com/fenxi/ouzhi-1120001.shtml")
        );
        assert_eq!(substitute("https://odds.500.com/", DetailKind::Asian), None);
    }

    #[test]
    fn raw_url_uses_origin_and_fid() {
        let url = raw_data_url(
            "https://odds.500.com/fenxi/ouzhi-1120001.shtml",
            DetailKind::European,
        );
        assert_eq!(
            url.as_deref(),
            Some("https://odds.500.com/fenxi1/ouzhi_json.php?fid=1120001")
        );
    }

    #[test]
    fn from_hrefs_synthesizes_missing_siblings() {
        let base = Url::parse("https://live.500.com/").unwrap();
        let links = DetailLinks::from_hrefs(
            &["/fenxi/shuju-1120002.shtml".to_string()],
            Some(&base),
        );

        assert_eq!(
            links.analysis.as_deref(),
            Some("https://live.500.com/fenxi/shuju-1120002.shtml")
        );
        assert_eq!(
            links.asian.as_deref(),
            Some("https://live.500.com/fenxi/yazhi-1120002.shtml")
        );
        assert_eq!(
            links.european.as_deref(),
            Some("https://live.500.com/fenxi/ouzhi-1120002.shtml")
        );
    }

    #[test]
    fn from_hrefs_ignores_unrelated_links() {
        let links = DetailLinks::from_hrefs(
            &["https://www.500.com/".to_string(), "javascript:void(0)".to_string()],
            None,
        );
        assert_eq!(links, DetailLinks::default());
    }
}
