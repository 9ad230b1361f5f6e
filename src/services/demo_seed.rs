//! Demo portfolio
//!
//! Two investment properties and one PPOR, each with 30 days of daily
//! history. Variance is derived from the day offset so repeated seeds give
//! the same series shape.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::history::HistoryEntry;
use crate::models::property::{Property, PropertyStatus, PropertyType, RentFrequency};

const HISTORY_DAYS: i64 = 30;

struct DemoProperty {
    url: &'static str,
    address: &'static str,
    nickname: &'static str,
    property_type: PropertyType,
    dwelling_type: &'static str,
    image_url: &'static str,
    rooms: (i32, i32, i32),
    suburb: &'static str,
    state: &'static str,
    postcode: &'static str,
    current_value: Decimal,
    previous_value: Decimal,
    outstanding_loan: Decimal,
    monthly_loan_repayment: Decimal,
    rent: Option<(Decimal, RentFrequency)>,
    yearly_expenses: Option<Decimal>,
}

fn demo_properties() -> [DemoProperty; 3] {
    [
        DemoProperty {
            url: "https://www.property.com.au/property/123-george-street-sydney-nsw-2000/",
            address: "123 George Street, Sydney NSW 2000",
            nickname: "Sydney CBD Unit",
            property_type: PropertyType::Ppor,
            dwelling_type: "Apartment",
            image_url: "https://images.unsplash.com/photo-1758548157747-285c7012db5b?crop=entropy&cs=srgb&fm=jpg&q=85",
            rooms: (2, 2, 1),
            suburb: "Sydney",
            state: "NSW",
            postcode: "2000",
            current_value: dec!(1250000),
            previous_value: dec!(1240000),
            outstanding_loan: dec!(820000),
            monthly_loan_repayment: dec!(5200),
            rent: None,
            yearly_expenses: None,
        },
        DemoProperty {
            url: "https://www.property.com.au/property/45-chapel-street-melbourne-vic-3141/",
            address: "45 Chapel Street, South Yarra VIC 3141",
            nickname: "Melbourne Investment",
            property_type: PropertyType::Investment,
            dwelling_type: "Townhouse",
            image_url: "https://images.unsplash.com/photo-1757439402190-99b73ac8e807?crop=entropy&cs=srgb&fm=jpg&q=85",
            rooms: (3, 1, 2),
            suburb: "South Yarra",
            state: "VIC",
            postcode: "3141",
            current_value: dec!(980000),
            previous_value: dec!(985000),
            outstanding_loan: dec!(640000),
            monthly_loan_repayment: dec!(4100),
            rent: Some((dec!(780), RentFrequency::Weekly)),
            yearly_expenses: Some(dec!(9500)),
        },
        DemoProperty {
            url: "https://www.property.com.au/property/78-james-street-brisbane-qld-4000/",
            address: "78 James Street, Fortitude Valley QLD 4006",
            nickname: "Brisbane Rental",
            property_type: PropertyType::Investment,
            dwelling_type: "Apartment",
            image_url: "https://images.unsplash.com/photo-1758548157275-d939cf0f0e32?crop=entropy&cs=srgb&fm=jpg&q=85",
            rooms: (2, 1, 1),
            suburb: "Fortitude Valley",
            state: "QLD",
            postcode: "4006",
            current_value: dec!(720000),
            previous_value: dec!(715000),
            outstanding_loan: dec!(500000),
            monthly_loan_repayment: dec!(3000),
            rent: Some((dec!(2600), RentFrequency::Monthly)),
            yearly_expenses: Some(dec!(8000)),
        },
    ]
}

/// Offset in the range -5000..=4900, stable for a given (property, day)
fn variance(property_index: usize, days_ago: i64) -> Decimal {
    let seed = (days_ago * 37 + property_index as i64 * 53) % 100;
    Decimal::from((seed - 50) * 100)
}

/// Build the demo properties and their history as of `now`.
pub fn demo_portfolio(now: DateTime<Utc>) -> (Vec<Property>, Vec<HistoryEntry>) {
    let mut properties = Vec::new();
    let mut history = Vec::new();

    for (index, demo) in demo_properties().into_iter().enumerate() {
        // Newest first in listings matches the declaration order
        let created_at = now - Duration::seconds(index as i64);
        let mut property = Property::new(demo.address.to_string(), demo.property_type, created_at);
        property.url = Some(demo.url.to_string());
        property.nickname = Some(demo.nickname.to_string());
        property.dwelling_type = Some(demo.dwelling_type.to_string());
        property.image_url = Some(demo.image_url.to_string());
        let (bedrooms, bathrooms, parking) = demo.rooms;
        property.bedrooms = Some(bedrooms);
        property.bathrooms = Some(bathrooms);
        property.parking = Some(parking);
        property.suburb = Some(demo.suburb.to_string());
        property.state = Some(demo.state.to_string());
        property.postcode = Some(demo.postcode.to_string());
        property.current_value = Some(demo.current_value);
        property.previous_value = Some(demo.previous_value);
        property.outstanding_loan = Some(demo.outstanding_loan);
        property.monthly_loan_repayment = Some(demo.monthly_loan_repayment);
        if let Some((amount, frequency)) = demo.rent {
            property.rent_amount = Some(amount);
            property.rent_frequency = frequency;
        }
        property.yearly_expenses = demo.yearly_expenses;
        property.status = PropertyStatus::Active;

        for days_ago in (1..=HISTORY_DAYS).rev() {
            // Slight upward trend towards today
            let value = demo.current_value + variance(index, days_ago)
                - Decimal::from(days_ago * 200);
            history.push(HistoryEntry::new(
                &property.id,
                now - Duration::days(days_ago),
                value,
                Some(demo.outstanding_loan),
            ));
        }

        properties.push(property);
    }

    (properties, history)
}
