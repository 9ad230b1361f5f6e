use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::str::FromStr;

use crate::models::common::{money_in_range, round_money};

lazy_static! {
    // /{state}/{suburb}-{postcode}/{street}/{number}-pid-{id}/
    static ref NEW_FORMAT_REGEX: Regex =
        Regex::new(r"/([a-z]{2,3})/([a-z-]+)-(\d{4})/([a-z-]+)/(\d+[a-z]?)-pid-").unwrap();

    // /property/{slug}/
    static ref OLD_FORMAT_REGEX: Regex = Regex::new(r"/property/([^/]+)").unwrap();

    // Trailing {suburb}-{state}-{postcode}
    static ref LOCATION_SUFFIX_REGEX: Regex = Regex::new(r"(\w+)-(\w{2,3})-(\d{4})$").unwrap();

    static ref DOLLAR_VALUE_REGEX: Regex = Regex::new(r"\$[\d,]+(?:\.\d{2})?").unwrap();
    static ref MILLION_VALUE_REGEX: Regex =
        Regex::new(r"(?i)[\d,]+(?:\.\d+)?\s*(?:million|m)\b").unwrap();
}

/// Anything below this is not a plausible property estimate
const MIN_PLAUSIBLE_VALUE: i64 = 100_000;

/// Location data recoverable from the listing URL alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlAddress {
    pub address: Option<String>,
    pub suburb: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
}

/// Parse address fields out of a property.com.au style URL
pub fn parse_address_from_url(url: &str) -> UrlAddress {
    let lower = url.to_lowercase();

    if let Some(cap) = NEW_FORMAT_REGEX.captures(&lower) {
        let state = cap[1].to_uppercase();
        let suburb = title_case(&cap[2].replace('-', " "));
        let postcode = cap[3].to_string();
        let street = title_case(&cap[4].replace('-', " "));
        let number = &cap[5];

        return UrlAddress {
            address: Some(format!(
                "{} {}, {} {} {}",
                number, street, suburb, state, postcode
            )),
            suburb: Some(suburb),
            state: Some(state),
            postcode: Some(postcode),
        };
    }

    let mut data = UrlAddress::default();
    if let Some(cap) = OLD_FORMAT_REGEX.captures(url) {
        data.address = Some(title_case(&cap[1].replace('-', " ")));

        if let Some(location) = LOCATION_SUFFIX_REGEX.captures(url.trim_end_matches('/')) {
            data.suburb = Some(title_case(&location[1]));
            data.state = Some(location[2].to_uppercase());
            data.postcode = Some(location[3].to_string());
        }
    }
    data
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse "$1,250,000", "1.2m" or "1.25 million" into an amount
pub fn parse_property_value(text: &str) -> Option<Decimal> {
    let clean: String = text
        .to_lowercase()
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if clean.is_empty() {
        return None;
    }

    let amount = if clean.contains('m') {
        let digits: String = clean.chars().filter(|c| !c.is_ascii_alphabetic()).collect();
        Decimal::from_str(&digits)
            .ok()?
            .checked_mul(Decimal::from(1_000_000))?
    } else {
        Decimal::from_str(&clean).ok()?
    };

    let amount = round_money(amount);
    money_in_range(amount).then_some(amount)
}

/// Details found in a listing page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDetails {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub value: Option<Decimal>,
}

/// Extract the og:title, og:image and the first plausible value estimate
/// embedded in a script body.
pub fn extract_listing_details(html: &str) -> ListingDetails {
    let document = Html::parse_document(html);
    let mut details = ListingDetails::default();

    if let Ok(selector) = Selector::parse("meta[property='og:title']") {
        details.title = document
            .select(&selector)
            .find_map(|el| el.value().attr("content"))
            .and_then(|content| content.split('|').next())
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string);
    }

    if let Ok(selector) = Selector::parse("meta[property='og:image']") {
        details.image_url = document
            .select(&selector)
            .find_map(|el| el.value().attr("content"))
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
    }

    if let Ok(selector) = Selector::parse("script") {
        let threshold = Decimal::from(MIN_PLAUSIBLE_VALUE);
        details.value = document.select(&selector).find_map(|script| {
            let text: String = script.text().collect();
            [&*DOLLAR_VALUE_REGEX, &*MILLION_VALUE_REGEX]
                .iter()
                .filter_map(|pattern| pattern.find(&text))
                .filter_map(|m| parse_property_value(m.as_str()))
                .find(|value| *value > threshold)
        });
    }

    details
}
