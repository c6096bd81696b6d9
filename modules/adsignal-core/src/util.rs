//! URL and domain normalization shared by the resolver and the probes.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Hosts that are never a business's own website. Outbound links to these
/// are skipped when recovering a domain from a social page.
pub const SOCIAL_HOSTS: &[&str] = &[
    "facebook.com",
    "fb.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "youtube.com",
    "tiktok.com",
    "snapchat.com",
    "pinterest.com",
    "whatsapp.com",
    "telegram.org",
    "discord.com",
    "discord.gg",
    "bit.ly",
    "linktr.ee",
];

/// First path segments that mark a facebook URL as a utility route rather
/// than a page profile.
pub const NON_PROFILE_SEGMENTS: &[&str] = &[
    "login",
    "register",
    "privacy",
    "terms",
    "help",
    "support",
    "sharer",
    "share",
    "dialog",
    "tr",
    "plugins",
    "photo",
    "photos",
    "events",
    "groups",
    "watch",
    "marketplace",
    "ads",
];

static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).unwrap());

/// Upper bound on links taken from one page.
const MAX_LINKS: usize = 200;

/// Reduce a raw host or URL to a bare lower-cased domain: scheme, path,
/// port, and a leading `www.` stripped.
pub fn clean_domain(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let host = if trimmed.contains("://") {
        Url::parse(trimmed).ok()?.host_str()?.to_string()
    } else {
        trimmed.split('/').next()?.split(':').next()?.to_string()
    };

    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if host.is_empty() || !host.contains('.') {
        return None;
    }
    Some(host.to_string())
}

/// Whether a host belongs to a known social/media or utility platform,
/// including its subdomains.
pub fn is_social_host(host: &str) -> bool {
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    SOCIAL_HOSTS
        .iter()
        .any(|social| host == *social || host.ends_with(&format!(".{social}")))
}

/// Leading label of a domain: `acme-tools.co.uk` → `acme-tools`.
pub fn leading_label(domain: &str) -> Option<String> {
    clean_domain(domain)
        .and_then(|d| d.split('.').next().map(str::to_string))
        .filter(|label| !label.is_empty())
}

/// Extract all href targets from raw HTML, resolving relative URLs against
/// `base_url` and deduplicating. Order follows document order.
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    let base = Url::parse(base_url).ok();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for cap in HREF_RE.captures_iter(html) {
        let raw = &cap[1];

        let resolved = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else if let Some(ref b) = base {
            match b.join(raw) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            }
        } else {
            continue;
        };

        if seen.insert(resolved.clone()) {
            links.push(resolved);
            if links.len() >= MAX_LINKS {
                break;
            }
        }
    }

    links
}

/// Normalize a candidate facebook page URL to its canonical profile form.
/// `None` when the URL is not a page profile: wrong host, utility route,
/// or a malformed handle. Query and fragment are dropped except for the
/// `profile.php?id=` shape, where the id is the whole point.
pub fn normalize_facebook_page(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if trimmed.starts_with("facebook.com")
        || trimmed.starts_with("www.facebook.com")
        || trimmed.starts_with("m.facebook.com")
        || trimmed.starts_with("fb.com")
    {
        format!("https://{trimmed}")
    } else {
        return None;
    };

    let url = Url::parse(&candidate).ok()?;
    let host = url.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_prefix("m.").unwrap_or(host);
    if host != "facebook.com" && host != "fb.com" {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let first = *segments.first()?;

    if first == "profile.php" {
        let id = url
            .query_pairs()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.into_owned())?;
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        return Some(format!("https://www.facebook.com/profile.php?id={id}"));
    }

    if NON_PROFILE_SEGMENTS.contains(&first) {
        return None;
    }

    if first == "pages" {
        if segments.len() < 2 {
            return None;
        }
        let path = segments
            .iter()
            .take(3)
            .copied()
            .collect::<Vec<_>>()
            .join("/");
        return Some(format!("https://www.facebook.com/{path}"));
    }

    if !first
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return None;
    }
    Some(format!("https://www.facebook.com/{first}"))
}

/// Page handle (username) from a facebook page URL. `None` for numeric
/// profile routes and `/pages/` paths, which carry an id instead of a
/// directory handle.
pub fn facebook_handle(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let first = segments.next()?;
    match first {
        "profile.php" | "pages" | "people" => None,
        handle => Some(handle.to_string()),
    }
}

/// Minimal percent-decoding for URL parameters pulled out of markup.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_domain_strips_scheme_path_and_www() {
        assert_eq!(
            clean_domain("https://www.Example.org/shop?x=1"),
            Some("example.org".to_string())
        );
        assert_eq!(clean_domain("example.org"), Some("example.org".to_string()));
        assert_eq!(
            clean_domain("www.example.org:8080/x"),
            Some("example.org".to_string())
        );
        assert_eq!(clean_domain("   "), None);
        assert_eq!(clean_domain("localhost"), None);
    }

    #[test]
    fn test_is_social_host_covers_subdomains() {
        assert!(is_social_host("facebook.com"));
        assert!(is_social_host("www.facebook.com"));
        assert!(is_social_host("l.facebook.com"));
        assert!(is_social_host("m.youtube.com"));
        assert!(!is_social_host("example.org"));
        assert!(!is_social_host("myfacebook-fanclub.org"));
    }

    #[test]
    fn test_leading_label() {
        assert_eq!(
            leading_label("acme-tools.co.uk"),
            Some("acme-tools".to_string())
        );
        assert_eq!(
            leading_label("https://www.example.org"),
            Some("example".to_string())
        );
        assert_eq!(leading_label(""), None);
    }

    #[test]
    fn test_extract_links_resolves_and_dedupes() {
        let html = r#"
            <a href="/about">About</a>
            <a href="https://other.example/x">Other</a>
            <a href="/about">About again</a>
        "#;
        let links = extract_links(html, "https://example.org");
        assert_eq!(
            links,
            vec![
                "https://example.org/about".to_string(),
                "https://other.example/x".to_string(),
            ]
        );
    }

    #[test]
    fn test_normalize_facebook_page_simple_handle() {
        assert_eq!(
            normalize_facebook_page("https://www.facebook.com/AcmeTools?ref=hl"),
            Some("https://www.facebook.com/AcmeTools".to_string())
        );
        assert_eq!(
            normalize_facebook_page("facebook.com/acme.tools"),
            Some("https://www.facebook.com/acme.tools".to_string())
        );
        assert_eq!(
            normalize_facebook_page("https://m.facebook.com/acme/about"),
            Some("https://www.facebook.com/acme".to_string())
        );
    }

    #[test]
    fn test_normalize_facebook_page_numeric_routes() {
        assert_eq!(
            normalize_facebook_page("https://www.facebook.com/pages/Acme-Tools/123456789012"),
            Some("https://www.facebook.com/pages/Acme-Tools/123456789012".to_string())
        );
        assert_eq!(
            normalize_facebook_page("https://www.facebook.com/profile.php?id=123456789012"),
            Some("https://www.facebook.com/profile.php?id=123456789012".to_string())
        );
        assert_eq!(
            normalize_facebook_page("https://www.facebook.com/profile.php?ref=x"),
            None
        );
    }

    #[test]
    fn test_normalize_facebook_page_rejects_utility_routes() {
        for url in [
            "https://www.facebook.com/login/?next=x",
            "https://www.facebook.com/sharer/sharer.php?u=y",
            "https://www.facebook.com/plugins/like.php",
            "https://www.facebook.com/tr?id=123",
            "https://www.facebook.com/events/987",
        ] {
            assert_eq!(normalize_facebook_page(url), None, "{url}");
        }
    }

    #[test]
    fn test_normalize_facebook_page_rejects_foreign_hosts() {
        assert_eq!(normalize_facebook_page("https://example.org/facebook.com"), None);
        assert_eq!(normalize_facebook_page("https://notfacebook.com/acme"), None);
    }

    #[test]
    fn test_facebook_handle() {
        assert_eq!(
            facebook_handle("https://www.facebook.com/AcmeTools"),
            Some("AcmeTools".to_string())
        );
        assert_eq!(
            facebook_handle("https://www.facebook.com/profile.php?id=1234"),
            None
        );
        assert_eq!(
            facebook_handle("https://www.facebook.com/pages/Acme/123"),
            None
        );
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(
            percent_decode("https%3A%2F%2Fwww.facebook.com%2Facme"),
            "https://www.facebook.com/acme"
        );
        assert_eq!(percent_decode("plain"), "plain");
        assert_eq!(percent_decode("bad%2"), "bad%2");
    }
}
