use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::db::ExperienceRow;
use crate::parser::fields::{date_range, description, subitem, ITEM_SUBTITLE, ITEM_TITLE};

static SECTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#experience").unwrap());
static POSITION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li.position").unwrap());

pub fn extract(doc: &Html) -> Vec<ExperienceRow> {
    let Some(section) = doc.select(&SECTION).next() else {
        return Vec::new();
    };
    section
        .select(&POSITION)
        .map(|li| {
            let (start_date, end_date) = date_range(li);
            ExperienceRow {
                title: subitem(li, &ITEM_TITLE),
                company: subitem(li, &ITEM_SUBTITLE),
                start_date,
                end_date,
                description: description(li),
            }
        })
        .collect()
}
