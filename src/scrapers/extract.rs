//! Text and HTML extraction for listing pages.
//!
//! Everything here is pure: a page goes in, listings and €/m² figures come
//! out. Patterns follow the markup the sites served when they were written and
//! will need touching whenever that markup moves.

use crate::models::{Listing, ListingSource, PropertyType};
use chrono::Utc;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::ops::RangeInclusive;
use std::sync::LazyLock;

/// €/m² values outside this band are parsing noise (fees, rents, typos)
pub const PLAUSIBLE_PRICE_PER_M2: RangeInclusive<f64> = 500.0..=30_000.0;

static PRICE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#".price, .price-label, [data-test*="price"]"#).unwrap()
});
static AREA_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#".area, .surface-label, [data-test*="surface"]"#).unwrap()
});
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".listing-title, .title, h2, h3").unwrap());
static LISTING_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.listing-link[href]").unwrap());
static ANY_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").unwrap());

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());
static EURO_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3}(?:[ \u{a0}\u{202f}.]\d{3})+|\d+)(?:,\d{1,2})?\s*€(\s*/\s*(?:m²|m2|mois))?")
        .unwrap()
});
static PER_M2_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3}(?:[ \u{a0}\u{202f}.]\d{3})+|\d+)(?:,\d{1,2})?\s*€\s*/\s*(?:m²|m2)")
        .unwrap()
});
static SURFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3}(?:[ \u{a0}\u{202f}]\d{3})+|\d+)(?:[.,](\d+))?\s*(?:m²|m2)").unwrap()
});
static MD_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static MD_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)").unwrap());
static MD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+(.+)$").unwrap());

/// Fields every listing from one page shares
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub location: &'a str,
    pub property_type: PropertyType,
    pub source: ListingSource,
}

impl ExtractContext<'_> {
    fn listing(&self, price: u64, area: u32, url: String, title: String) -> Listing {
        Listing {
            price,
            area,
            location: self.location.to_string(),
            property_type: self.property_type,
            url,
            title,
            source: self.source,
            scraped_at: Utc::now(),
        }
    }
}

/// Price in whole euros; prices never carry decimals so every digit counts
pub fn parse_price(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<u64>().ok().filter(|price| *price > 0)
}

/// Surface in whole m²: the number before `m²`, else the first number in the text
pub fn parse_area(text: &str) -> Option<u32> {
    surface_in(text).or_else(|| {
        let raw = NUMBER.find(text)?.as_str().replace(',', ".");
        whole_m2(raw.parse().ok()?)
    })
}

/// Surface written as `N m²`, with space thousand separators and decimal comma
fn surface_in(text: &str) -> Option<u32> {
    let caps = SURFACE.captures(text)?;
    let whole: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
    let raw = match caps.get(2) {
        Some(fraction) => format!("{whole}.{}", fraction.as_str()),
        None => whole,
    };
    whole_m2(raw.parse().ok()?)
}

fn whole_m2(area: f64) -> Option<u32> {
    let area = area.round();
    (area >= 1.0 && area <= u32::MAX as f64).then_some(area as u32)
}

/// Selector-based scrape of listing cards
pub fn listings_from_html(html: &str, base_url: &str, ctx: &ExtractContext<'_>) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for price_el in document.select(&PRICE_SELECTOR).filter(|el| is_innermost_price(*el)) {
        let Some(card) = enclosing_card(price_el) else {
            continue;
        };

        let Some(price) = parse_price(&element_text(price_el)) else {
            continue;
        };
        let Some(area) = card
            .select(&AREA_SELECTOR)
            .next()
            .and_then(|el| parse_area(&element_text(el)))
        else {
            continue;
        };

        let title = card
            .select(&TITLE_SELECTOR)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let url = card
            .select(&LISTING_LINK_SELECTOR)
            .next()
            .or_else(|| card.select(&ANY_LINK_SELECTOR).next())
            .and_then(|link| link.value().attr("href"))
            .map(|href| resolve_url(base_url, href))
            .unwrap_or_default();

        listings.push(ctx.listing(price, area, url, title));
    }

    listings
}

/// Regex scrape of the markdown rendering of a results page
pub fn listings_from_markdown(markdown: &str, ctx: &ExtractContext<'_>) -> Vec<Listing> {
    let cleaned = MD_IMAGE.replace_all(markdown, "");
    let mut listings = Vec::new();

    for block in cleaned.split("\n\n") {
        let prices = EURO_AMOUNT
            .captures_iter(block)
            .filter(|caps| caps.get(2).is_none())
            .count();
        match prices {
            0 => {}
            1 => listings.extend(listing_from_block(block, ctx)),
            // several cards squeezed into one block, go line by line
            _ => listings.extend(block.lines().filter_map(|line| listing_from_block(line, ctx))),
        }
    }

    listings
}

fn listing_from_block(block: &str, ctx: &ExtractContext<'_>) -> Option<Listing> {
    let price = EURO_AMOUNT
        .captures_iter(block)
        .find(|caps| caps.get(2).is_none())
        .and_then(|caps| parse_price(caps.get(1)?.as_str()))?;
    let area = surface_in(block)?;

    let (title, url) = match MD_LINK.captures(block) {
        Some(caps) => (collapse_whitespace(&caps[1]), caps[2].to_string()),
        None => {
            let title = MD_HEADING
                .captures(block)
                .map(|caps| collapse_whitespace(&caps[1]))
                .unwrap_or_default();
            (title, String::new())
        }
    };

    Some(ctx.listing(price, area, url, title))
}

/// Every plausible `N €/m²` figure quoted in the text
pub fn price_per_m2_figures(text: &str) -> Vec<f64> {
    PER_M2_AMOUNT
        .captures_iter(text)
        .filter_map(|caps| parse_price(caps.get(1)?.as_str()))
        .map(|value| value as f64)
        .filter(|value| PLAUSIBLE_PRICE_PER_M2.contains(value))
        .collect()
}

/// Widest ancestor of the price holding no other price; it must carry an area
fn enclosing_card(price_el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut card = None;
    for ancestor in price_el.ancestors().filter_map(ElementRef::wrap) {
        let prices = ancestor
            .select(&PRICE_SELECTOR)
            .filter(|el| is_innermost_price(*el))
            .count();
        if prices > 1 {
            break;
        }
        card = Some(ancestor);
    }
    card.filter(|card| card.select(&AREA_SELECTOR).next().is_some())
}

/// Price markup is sometimes nested (`.price` around `[data-test=price]`); count it once
fn is_innermost_price(el: ElementRef<'_>) -> bool {
    el.select(&PRICE_SELECTOR).all(|inner| inner.id() == el.id())
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn resolve_url(base_url: &str, href: &str) -> String {
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}
