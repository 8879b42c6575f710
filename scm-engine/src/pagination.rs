//! Normalizes provider pagination and rate limit conventions into [`Page`] / [`Rate`].
//!
//! Conventions handled:
//!   * GitHub: RFC 5988 `Link` header with `page=` query params
//!   * GitLab: `X-Page`, `X-Next-Page`, `X-Prev-Page`, `X-Total-Pages`
//!   * Bitbucket Cloud: JSON envelope `{ page, next, previous, values }`
//!   * Rate limits: `X-RateLimit-*` (GitHub) and `RateLimit-*` (GitLab)

use reqwest::header::HeaderMap;
use url::Url;

use crate::git_providers::types::{Page, Rate};

/// Parses a GitHub style `Link` header.
pub fn page_from_link_header(headers: &HeaderMap) -> Page {
    let mut page = Page::default();
    let Some(link) = header_str(headers, "link") else {
        return page;
    };

    for part in link.split(',') {
        let mut segments = part.split(';');
        let Some(target) = segments.next() else {
            continue;
        };
        let target = target.trim().trim_start_matches('<').trim_end_matches('>');
        let Some(rel) = segments.find_map(|s| {
            s.trim()
                .strip_prefix("rel=")
                .map(|r| r.trim_matches('"').to_string())
        }) else {
            continue;
        };

        let number = page_param(target);
        match rel.as_str() {
            "next" => {
                page.next = number;
                page.next_url = Some(target.to_string());
            }
            "prev" => page.prev = number,
            "first" => page.first = number,
            "last" => page.last = number,
            _ => {}
        }
    }
    page
}

/// Parses GitLab's `X-*-Page` headers. Empty header values mean "none".
pub fn page_from_gitlab_headers(headers: &HeaderMap) -> Page {
    let number = |name: &str| header_str(headers, name).and_then(|v| v.trim().parse().ok());
    let last = number("x-total-pages");
    Page {
        first: last.map(|_| 1),
        last,
        next: number("x-next-page"),
        prev: number("x-prev-page"),
        next_url: None,
    }
}

/// Builds a page from a Bitbucket Cloud envelope's `next`/`previous` links.
pub fn page_from_envelope(next: Option<&str>, previous: Option<&str>) -> Page {
    Page {
        first: None,
        last: None,
        next: next.and_then(page_param),
        prev: previous.and_then(page_param),
        next_url: next.map(str::to_string),
    }
}

/// Reads rate limit headers, accepting both the `X-` prefixed and bare forms.
pub fn rate_from_headers(headers: &HeaderMap) -> Rate {
    let value = |suffix: &str| {
        header_str(headers, &format!("x-ratelimit-{suffix}"))
            .or_else(|| header_str(headers, &format!("ratelimit-{suffix}")))
            .map(str::trim)
    };
    Rate {
        limit: value("limit").and_then(|v| v.parse().ok()).unwrap_or(0),
        remaining: value("remaining").and_then(|v| v.parse().ok()).unwrap_or(0),
        reset: value("reset").and_then(|v| v.parse().ok()).unwrap_or(0),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn page_param(target: &str) -> Option<u32> {
    let url = Url::parse(target).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_str(v).expect("header value"));
        }
        map
    }

    #[test]
    fn parses_github_link_header() {
        let h = headers(&[(
            "link",
            "<https://api.github.com/user/repository_invitations?page=3>; rel=\"next\", \
             <https://api.github.com/user/repository_invitations?page=5>; rel=\"last\", \
             <https://api.github.com/user/repository_invitations?page=1>; rel=\"first\", \
             <https://api.github.com/user/repository_invitations?page=1>; rel=\"prev\"",
        )]);

        let page = page_from_link_header(&h);
        assert_eq!(page.next, Some(3));
        assert_eq!(page.last, Some(5));
        assert_eq!(page.first, Some(1));
        assert_eq!(page.prev, Some(1));
        assert_eq!(
            page.next_url.as_deref(),
            Some("https://api.github.com/user/repository_invitations?page=3")
        );
        assert!(page.has_next());
    }

    #[test]
    fn missing_link_header_is_a_single_page() {
        let page = page_from_link_header(&HeaderMap::new());
        assert_eq!(page, Page::default());
        assert!(!page.has_next());
    }

    #[test]
    fn parses_gitlab_page_headers() {
        let h = headers(&[
            ("x-page", "2"),
            ("x-next-page", "3"),
            ("x-prev-page", "1"),
            ("x-total-pages", "4"),
        ]);
        let page = page_from_gitlab_headers(&h);
        assert_eq!(page.first, Some(1));
        assert_eq!(page.last, Some(4));
        assert_eq!(page.next, Some(3));
        assert_eq!(page.prev, Some(1));
    }

    #[test]
    fn gitlab_last_page_has_empty_next() {
        let h = headers(&[("x-next-page", ""), ("x-prev-page", "3")]);
        let page = page_from_gitlab_headers(&h);
        assert_eq!(page.next, None);
        assert_eq!(page.prev, Some(3));
        assert_eq!(page.last, None);
    }

    #[test]
    fn envelope_links_keep_url_and_number() {
        let page = page_from_envelope(
            Some("https://api.bitbucket.org/2.0/user/emails?page=2"),
            None,
        );
        assert_eq!(page.next, Some(2));
        assert_eq!(page.prev, None);
        assert!(page.has_next());
    }

    #[test]
    fn reads_both_rate_limit_header_styles() {
        let github = headers(&[
            ("x-ratelimit-limit", "5000"),
            ("x-ratelimit-remaining", "4987"),
            ("x-ratelimit-reset", "1372700873"),
        ]);
        assert_eq!(
            rate_from_headers(&github),
            Rate {
                limit: 5000,
                remaining: 4987,
                reset: 1_372_700_873
            }
        );

        let gitlab = headers(&[("ratelimit-limit", "600"), ("ratelimit-remaining", "599")]);
        let rate = rate_from_headers(&gitlab);
        assert_eq!(rate.limit, 600);
        assert_eq!(rate.remaining, 599);
        assert_eq!(rate.reset, 0);
    }
}
