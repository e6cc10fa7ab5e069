use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::db::EducationRow;
use crate::parser::fields::{date_range, description, subitem, text_of, ITEM_SUBTITLE, ITEM_TITLE};

static SECTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#education").unwrap());
static SCHOOL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li.school").unwrap());

pub fn extract(doc: &Html) -> Vec<EducationRow> {
    let Some(section) = doc.select(&SECTION).next() else {
        return Vec::new();
    };
    section
        .select(&SCHOOL)
        .map(|li| {
            let (start_date, end_date) = date_range(li);
            EducationRow {
                school: subitem(li, &ITEM_TITLE),
                degree: text_of(li, &ITEM_SUBTITLE),
                start_date,
                end_date,
                description: description(li),
            }
        })
        .collect()
}
