use crate::models::PropertyType;
use crate::scrapers::sites::location_slug;

/// Average asking prices in €/m² (apartment, house) for the large French cities
const CITY_PRICES: &[(&str, f64, f64)] = &[
    ("paris", 10_450.0, 9_800.0),
    ("marseille", 3_650.0, 4_300.0),
    ("lyon", 5_050.0, 5_600.0),
    ("toulouse", 3_750.0, 3_900.0),
    ("nice", 5_250.0, 6_100.0),
    ("nantes", 3_900.0, 4_200.0),
    ("montpellier", 3_850.0, 4_300.0),
    ("strasbourg", 3_650.0, 3_600.0),
    ("bordeaux", 4_700.0, 4_900.0),
    ("lille", 3_500.0, 3_050.0),
    ("rennes", 3_950.0, 4_200.0),
];

/// National averages, used for towns missing from the table
const NATIONAL_AVERAGE: (f64, f64) = (3_200.0, 2_500.0);

/// Reference €/m² for a city, falling back to the national average
pub fn reference_price_per_m2(city: &str, property_type: PropertyType) -> f64 {
    let (apartment, house) = lookup(city).unwrap_or(NATIONAL_AVERAGE);
    match property_type {
        PropertyType::Apartment => apartment,
        PropertyType::House => house,
    }
}

/// Whether the city has its own entry in the table
pub fn is_known_city(city: &str) -> bool {
    lookup(city).is_some()
}

fn lookup(city: &str) -> Option<(f64, f64)> {
    let slug = location_slug(city);
    // "Paris 15e", "lyon-3eme" and friends share their city's entry
    CITY_PRICES
        .iter()
        .find(|(name, _, _)| slug == *name || slug.starts_with(&format!("{name}-")))
        .map(|(_, apartment, house)| (*apartment, *house))
}
