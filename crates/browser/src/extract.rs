//! Pure helpers for digging the authorization code out of whatever the
//! callback page happens to render.
//!
//! The page's exact markup is outside our control, so extraction is an
//! ordered cascade over independent evidence sources; these are the
//! page-independent pieces of it.

use {once_cell::sync::Lazy, regex::Regex, url::Url};

/// `code#state` as rendered on the callback page.
#[allow(clippy::unwrap_used)]
static CODE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_-]{20,}#[A-Za-z0-9_-]{20,}").unwrap());

/// Shortest string worth treating as a code candidate.
pub const MIN_CANDIDATE_LEN: usize = 10;

/// Find a `code#state` token anywhere in rendered body text.
pub fn find_code_token(body: &str) -> Option<String> {
    CODE_TOKEN.find(body).map(|m| m.as_str().to_string())
}

/// Reconstruct the raw code from the redirect location itself.
///
/// The substring before any `#` is the base URL and its query is
/// authoritative for `code`. A query-provided `state` wins over the
/// URL fragment when both are present; the two are assumed (not
/// provider-confirmed) to be mutually exclusive.
pub fn code_from_location(href: &str) -> Option<String> {
    let (base, fragment) = match href.split_once('#') {
        Some((b, f)) => (b, Some(f)),
        None => (href, None),
    };
    let url = Url::parse(base).ok()?;

    let mut code = None;
    let mut query_state = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "code" => code = Some(v.into_owned()),
            "state" => query_state = Some(v.into_owned()),
            _ => {},
        }
    }

    let code = code?;
    match (query_state, fragment) {
        (Some(state), _) => Some(format!("{code}#{state}")),
        (None, Some(frag)) if !frag.is_empty() => Some(format!("{code}#{frag}")),
        _ => Some(code),
    }
}
