//! Mock weather and clock widgets: random numbers dressed up as a forecast.

use chrono::Local;
use rand::Rng;

const LOCATIONS: &[&str] = &[
    "Moscow",
    "Saint Petersburg",
    "Novosibirsk",
    "Yekaterinburg",
    "Kazan",
];

const CONDITIONS: &[&str] = &["Sunny", "Cloudy", "Rainy", "Overcast", "Clear"];

/// A randomly generated forecast, one line per reading.
pub fn weather_report() -> String {
    let mut rng = rand::thread_rng();
    let location = LOCATIONS[rng.gen_range(0..LOCATIONS.len())];
    let condition = CONDITIONS[rng.gen_range(0..CONDITIONS.len())];
    let temperature = rng.gen_range(-10..=20);
    let humidity = rng.gen_range(30..=90);
    let wind = rng.gen_range(1..=20);

    format!(
        "{location}: {condition}, {temperature}°C\n  humidity {humidity}%  wind {wind} m/s"
    )
}

/// Current local time and date.
pub fn clock() -> String {
    Local::now().format("%H:%M:%S on %A, %d %B %Y").to_string()
}
