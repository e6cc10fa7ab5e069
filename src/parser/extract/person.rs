use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::warn;

use crate::db::PersonRow;
use crate::parser::fields::text_of;

static TOPCARD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#topcard").unwrap());
static NAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#name").unwrap());
static HEADLINE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".headline").unwrap());
static LOCALITY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#demographics .locality").unwrap());

pub fn extract(doc: &Html) -> PersonRow {
    let Some(card) = doc.select(&TOPCARD).next() else {
        warn!("No #topcard section; person fields left empty");
        return PersonRow::default();
    };
    PersonRow {
        name: text_of(card, &NAME),
        headline: text_of(card, &HEADLINE),
        locality: text_of(card, &LOCALITY),
    }
}
