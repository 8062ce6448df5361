//! The US cities the assistant can forecast for.
//!
//! Lookup is by substring: the first city in declaration order whose name
//! appears in the text wins, so the order of [`CITIES`] matters.

use serde::Serialize;

/// A point on the map, serialized as `{"latitude": .., "longitude": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// A supported city.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    /// Lower-case name, as matched against input.
    pub name: &'static str,
    pub coordinate: Coordinate,
}

impl City {
    /// The name with each word capitalized ("new york" becomes "New York").
    pub fn display_name(&self) -> String {
        self.name
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

const fn city(name: &'static str, latitude: f64, longitude: f64) -> City {
    City {
        name,
        coordinate: Coordinate {
            latitude,
            longitude,
        },
    }
}

/// Every supported city, in match order.
pub static CITIES: [City; 41] = [
    city("new york", 40.7128, -74.0060),
    city("los angeles", 34.0522, -118.2437),
    city("chicago", 41.8781, -87.6298),
    city("houston", 29.7604, -95.3698),
    city("phoenix", 33.4484, -112.0740),
    city("philadelphia", 39.9526, -75.1652),
    city("san antonio", 29.4241, -98.4936),
    city("san diego", 32.7157, -117.1611),
    city("dallas", 32.7767, -96.7970),
    city("san jose", 37.3382, -121.8863),
    city("austin", 30.2672, -97.7431),
    city("jacksonville", 30.3322, -81.6557),
    city("san francisco", 37.7749, -122.4194),
    city("columbus", 39.9612, -82.9988),
    city("charlotte", 35.2271, -80.8431),
    city("fort worth", 32.7555, -97.3308),
    city("detroit", 42.3314, -83.0458),
    city("el paso", 31.7619, -106.4850),
    city("memphis", 35.1495, -90.0490),
    city("seattle", 47.6062, -122.3321),
    city("denver", 39.7392, -104.9903),
    city("washington", 38.9072, -77.0369),
    city("boston", 42.3601, -71.0589),
    city("nashville", 36.1627, -86.7816),
    city("baltimore", 39.2904, -76.6122),
    city("oklahoma city", 35.4676, -97.5164),
    city("portland", 45.5152, -122.6784),
    city("las vegas", 36.1699, -115.1398),
    city("milwaukee", 43.0389, -87.9065),
    city("albuquerque", 35.0844, -106.6504),
    city("tucson", 32.2226, -110.9747),
    city("fresno", 36.7378, -119.7871),
    city("sacramento", 38.5816, -121.4944),
    city("miami", 25.7617, -80.1918),
    city("kansas city", 39.0997, -94.5786),
    city("mesa", 33.4152, -111.8315),
    city("atlanta", 33.7490, -84.3880),
    city("omaha", 41.2565, -95.9345),
    city("raleigh", 35.7796, -78.6382),
    city("colorado springs", 38.8339, -104.8214),
    city("virginia beach", 36.8529, -76.0927),
];

/// Find the first city whose name occurs in `text`.
///
/// `text` must already be lower-case.
pub fn find_in(text: &str) -> Option<&'static City> {
    CITIES.iter().find(|c| text.contains(c.name))
}

/// Look up a city by its exact lower-case name.
pub fn by_name(name: &str) -> Option<&'static City> {
    CITIES.iter().find(|c| c.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_shape() {
        assert_eq!(CITIES.len(), 41);
        assert_eq!(CITIES[0].name, "new york");
        assert_eq!(CITIES[40].name, "virginia beach");

        let names: HashSet<_> = CITIES.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), CITIES.len());
        for city in &CITIES {
            assert_eq!(city.name, city.name.to_lowercase());
        }
    }

    #[test]
    fn test_coordinates() {
        let seattle = by_name("seattle").unwrap();
        assert_eq!(seattle.coordinate.latitude, 47.6062);
        assert_eq!(seattle.coordinate.longitude, -122.3321);

        let json = serde_json::to_value(seattle.coordinate).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"latitude": 47.6062, "longitude": -122.3321})
        );
    }

    #[test]
    fn test_find_in() {
        assert_eq!(find_in("weather in boston today").unwrap().name, "boston");
        assert_eq!(find_in("kansas city please").unwrap().name, "kansas city");
        assert!(find_in("london").is_none());
        assert!(find_in("").is_none());
    }

    #[test]
    fn test_first_declared_city_wins() {
        // Both appear; "chicago" is declared before "miami".
        assert_eq!(find_in("miami or chicago?").unwrap().name, "chicago");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(by_name("new york").unwrap().display_name(), "New York");
        assert_eq!(
            by_name("colorado springs").unwrap().display_name(),
            "Colorado Springs"
        );
        assert_eq!(by_name("mesa").unwrap().display_name(), "Mesa");
    }
}
