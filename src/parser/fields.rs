use std::sync::LazyLock;

use chrono::NaiveDate;
use reqwest::Url;
use scraper::{ElementRef, Selector};

use super::dates::parse_date;
use crate::db::LookupKey;

static BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://www.linkedin.com/").unwrap());

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static DATE_RANGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".date-range").unwrap());
static TIME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("time").unwrap());
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".description").unwrap());

pub static ITEM_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".item-title").unwrap());
pub static ITEM_SUBTITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".item-subtitle").unwrap());

/// All text under `el`, whitespace collapsed to single spaces.
pub fn element_text(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match under `scope`, or `None` if absent or blank.
pub fn text_of(scope: ElementRef, selector: &Selector) -> Option<String> {
    let el = scope.select(selector).next()?;
    Some(element_text(el)).filter(|t| !t.is_empty())
}

/// Name and URL path for a lookup entity. A nested `<a>` wins over plain text.
pub fn link_key(el: ElementRef) -> Option<LookupKey> {
    let (name, url) = match el.select(&ANCHOR).next() {
        Some(a) => (
            element_text(a),
            a.value().attr("href").and_then(url_path),
        ),
        None => (element_text(el), None),
    };
    if name.is_empty() {
        return None;
    }
    Some(LookupKey { name, url })
}

/// `link_key` of the first `selector` match inside `li`.
pub fn subitem(li: ElementRef, selector: &Selector) -> Option<LookupKey> {
    li.select(selector).next().and_then(link_key)
}

fn url_path(href: &str) -> Option<String> {
    BASE_URL.join(href.trim()).ok().map(|u| u.path().to_string())
}

/// `.description` text, one line per text run.
pub fn description(li: ElementRef) -> Option<String> {
    let p = li.select(&DESCRIPTION).next()?;
    let text = p
        .text()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Some(text).filter(|t| !t.is_empty())
}

/// First two `<time>` tags under `.date-range`: (start, end).
pub fn date_range(li: ElementRef) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let Some(range) = li.select(&DATE_RANGE).next() else {
        return (None, None);
    };
    let mut times = range.select(&TIME).map(element_text);
    let start = times.next().and_then(|t| parse_date(&t));
    let end = times.next().and_then(|t| parse_date(&t));
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        doc.select(&Selector::parse(css).unwrap()).next().unwrap()
    }

    #[test]
    fn link_key_prefers_anchor_path() {
        let doc = Html::parse_fragment(
            r#"<h5 class="item-subtitle"><a href="https://www.linkedin.com/company/acme?trk=x">
               Acme  Corp</a></h5>"#,
        );
        let key = link_key(first(&doc, "h5")).unwrap();
        assert_eq!(key.name, "Acme Corp");
        assert_eq!(key.url.as_deref(), Some("/company/acme"));
    }

    #[test]
    fn link_key_handles_relative_and_plain() {
        let doc = Html::parse_fragment(
            r#"<div><h4 id="a"><a href="/title/engineer">Engineer</a></h4><h4 id="b"> Freelance </h4><h4 id="c"> </h4></div>"#,
        );
        let rel = link_key(first(&doc, "#a")).unwrap();
        assert_eq!(rel.url.as_deref(), Some("/title/engineer"));
        let plain = link_key(first(&doc, "#b")).unwrap();
        assert_eq!(plain, LookupKey { name: "Freelance".into(), url: None });
        assert!(link_key(first(&doc, "#c")).is_none());
    }

    #[test]
    fn date_range_with_open_end() {
        let doc = Html::parse_fragment(
            r#"<li><span class="date-range"><time>June 2012</time> – <time>Present</time></span></li>"#,
        );
        let (start, end) = date_range(first(&doc, "li"));
        assert_eq!(start, NaiveDate::from_ymd_opt(2012, 6, 1));
        assert_eq!(end, None);
    }

    #[test]
    fn missing_fields_are_none() {
        let doc = Html::parse_fragment("<li><p>nothing here</p></li>");
        let li = first(&doc, "li");
        assert_eq!(date_range(li), (None, None));
        assert_eq!(description(li), None);
        assert_eq!(text_of(li, &ITEM_TITLE), None);
        assert_eq!(subitem(li, &ITEM_SUBTITLE), None);
    }

    #[test]
    fn description_keeps_line_breaks() {
        let doc = Html::parse_fragment(
            r#"<li><p class="description">Led the   team.<br>Shipped v2.</p></li>"#,
        );
        assert_eq!(
            description(first(&doc, "li")).as_deref(),
            Some("Led the team.\nShipped v2.")
        );
    }
}
