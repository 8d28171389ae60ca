use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use time::format_description::well_known::Rfc3339;

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Article, ListQuery, MAX_PAGE_SIZE};

/// Pages every locale serves, relative to `/{locale}`.
const STATIC_ROUTES: &[&str] = &["", "/about", "/blogs"];

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn push_url(xml: &mut String, loc: &str, lastmod: Option<&str>) {
    xml.push_str("  <url>\n    <loc>");
    xml.push_str(&escape_xml(loc));
    xml.push_str("</loc>\n");
    if let Some(lastmod) = lastmod {
        xml.push_str("    <lastmod>");
        xml.push_str(lastmod);
        xml.push_str("</lastmod>\n");
    }
    xml.push_str("  </url>\n");
}

/// Render the sitemap: every static route in every locale, then every
/// published article under its own locale.
pub fn render_sitemap(base_url: &str, locales: &[String], articles: &[Article]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for route in STATIC_ROUTES {
        for locale in locales {
            push_url(&mut xml, &format!("{base_url}/{locale}{route}"), None);
        }
    }
    for article in articles.iter().filter(|a| a.is_published()) {
        let lastmod = article.updated_at.format(&Rfc3339).ok();
        push_url(
            &mut xml,
            &format!("{base_url}/{}/blog/{}", article.locale, article.slug),
            lastmod.as_deref(),
        );
    }
    xml.push_str("</urlset>\n");
    xml
}

pub async fn sitemap_xml(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let mut articles = Vec::new();
    let mut query = ListQuery {
        locale: None,
        published_only: true,
        page: 1,
        per_page: MAX_PAGE_SIZE,
    };
    loop {
        let page = state.articles.list(&query).await?;
        articles.extend(page.items);
        if query.page >= page.total_pages {
            break;
        }
        query.page += 1;
    }

    let locales: Vec<String> = state.registry.all().iter().map(|l| l.code.clone()).collect();
    let body = render_sitemap(&state.site_url, &locales, &articles);
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn article(slug: &str, published: bool) -> Article {
        let now = OffsetDateTime::UNIX_EPOCH;
        Article {
            id: Uuid::new_v4(),
            title: slug.to_string(),
            slug: slug.to_string(),
            excerpt: String::new(),
            content: "x".to_string(),
            cover_image: None,
            locale: "fr".to_string(),
            published_at: published.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_every_route_in_every_locale() {
        let locales = vec!["en".to_string(), "zh-TW".to_string()];
        let xml = render_sitemap("https://blog.example", &locales, &[]);
        for url in [
            "https://blog.example/en",
            "https://blog.example/zh-TW",
            "https://blog.example/en/about",
            "https://blog.example/zh-TW/about",
            "https://blog.example/en/blogs",
        ] {
            assert!(xml.contains(&format!("<loc>{url}</loc>")), "missing {url}");
        }
        assert_eq!(xml.matches("<url>").count(), STATIC_ROUTES.len() * 2);
    }

    #[test]
    fn test_published_articles_only() {
        let xml = render_sitemap(
            "https://blog.example",
            &[],
            &[article("live", true), article("draft", false)],
        );
        assert!(xml.contains("<loc>https://blog.example/fr/blog/live</loc>"));
        assert!(xml.contains("<lastmod>1970-01-01T00:00:00Z</lastmod>"));
        assert!(!xml.contains("draft"));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_xml("a&b<c>"), "a&amp;b&lt;c&gt;");
    }
}
