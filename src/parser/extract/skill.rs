use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::db::LookupKey;
use crate::parser::fields::link_key;

static SECTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#skills").unwrap());
static SKILL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li.skill").unwrap());

/// Skills carry no dates; the `li` itself names the skill.
pub fn extract(doc: &Html) -> Vec<LookupKey> {
    let Some(section) = doc.select(&SECTION).next() else {
        return Vec::new();
    };
    section.select(&SKILL).filter_map(link_key).collect()
}
