use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::db::CertificationRow;
use crate::parser::fields::{date_range, description, subitem, ITEM_SUBTITLE, ITEM_TITLE};

static SECTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#certifications").unwrap());
static ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.certification").unwrap());

pub fn extract(doc: &Html) -> Vec<CertificationRow> {
    let Some(section) = doc.select(&SECTION).next() else {
        return Vec::new();
    };
    section
        .select(&ITEM)
        .map(|li| {
            let (start_date, end_date) = date_range(li);
            CertificationRow {
                certification: subitem(li, &ITEM_TITLE),
                // Issuing authority
                company: subitem(li, &ITEM_SUBTITLE),
                start_date,
                end_date,
                description: description(li),
            }
        })
        .collect()
}
