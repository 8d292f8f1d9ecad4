use crate::models::{ListingSource, PropertyType};
use crate::scrapers::types::SearchParams;

/// Real-estate sites the market scraper knows how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSite {
    SeLoger,
    Leboncoin,
    MeilleursAgents,
}

impl MarketSite {
    pub const ALL: [MarketSite; 3] = [
        MarketSite::SeLoger,
        MarketSite::Leboncoin,
        MarketSite::MeilleursAgents,
    ];

    pub fn source(&self) -> ListingSource {
        match self {
            MarketSite::SeLoger => ListingSource::SeLoger,
            MarketSite::Leboncoin => ListingSource::Leboncoin,
            MarketSite::MeilleursAgents => ListingSource::MeilleursAgents,
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            MarketSite::SeLoger => "https://www.seloger.com",
            MarketSite::Leboncoin => "https://www.leboncoin.fr",
            MarketSite::MeilleursAgents => "https://www.meilleursagents.com",
        }
    }

    pub fn search_url(&self, params: &SearchParams) -> String {
        let slug = location_slug(&params.location);
        match self {
            MarketSite::SeLoger => format!(
                "{}/immobilier/achat/{}/{}/",
                self.base_url(),
                params.property_type.label_fr(),
                slug
            ),
            MarketSite::Leboncoin => {
                // leboncoin encodes the type as a number
                let kind = match params.property_type {
                    PropertyType::House => 1,
                    PropertyType::Apartment => 2,
                };
                format!(
                    "{}/recherche?category=9&locations={}&real_estate_type={}",
                    self.base_url(),
                    query_component(params.location.trim()),
                    kind
                )
            }
            MarketSite::MeilleursAgents => {
                format!("{}/prix-immobilier/{}/", self.base_url(), slug)
            }
        }
    }
}

/// Lowercase, accent-free, dash-joined form of a town name
pub fn location_slug(location: &str) -> String {
    fold_accents(location)
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Replace French accented letters with their plain counterpart
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'À' | 'Â' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'î' | 'ï' => 'i',
            'Î' | 'Ï' => 'I',
            'ô' | 'ö' => 'o',
            'Ô' | 'Ö' => 'O',
            'ù' | 'û' | 'ü' => 'u',
            'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            'ÿ' => 'y',
            other => other,
        })
        .collect()
}

fn query_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_accents_and_spaces() {
        assert_eq!(location_slug("Saint-Étienne"), "saint-etienne");
        assert_eq!(location_slug("  Aix en Provence "), "aix-en-provence");
    }

    #[test]
    fn seloger_url_uses_french_type() {
        let params = SearchParams::new("Lyon", PropertyType::House, 90.0);
        assert_eq!(
            MarketSite::SeLoger.search_url(&params),
            "https://www.seloger.com/immobilier/achat/maison/lyon/"
        );
    }

    #[test]
    fn leboncoin_url_encodes_location() {
        let params = SearchParams::new("Le Mans", PropertyType::Apartment, 40.0);
        assert_eq!(
            MarketSite::Leboncoin.search_url(&params),
            "https://www.leboncoin.fr/recherche?category=9&locations=Le%20Mans&real_estate_type=2"
        );
    }

    #[test]
    fn meilleursagents_url_is_price_page() {
        let params = SearchParams::new("Nîmes", PropertyType::Apartment, 40.0);
        assert_eq!(
            MarketSite::MeilleursAgents.search_url(&params),
            "https://www.meilleursagents.com/prix-immobilier/nimes/"
        );
    }
}
