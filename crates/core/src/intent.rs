use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dataset::ReferenceData;
use crate::models::{HotelTier, Intent, TripRequest};
use crate::policy::PlanningPolicy;

static ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"from\s+([a-z\s]+?)\s+to\s+([a-z\s]+?)(?:\s+under|\s+within|\s+budget|\s+max|$)")
        .expect("valid route pattern")
});
static BUDGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:under|within|max|budget)\s*\$?\s*(\d+)").expect("valid budget pattern")
});
static DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:day|days)").expect("valid duration pattern"));
static DAY_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"day\s*(\d+)").expect("valid day pattern"));
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid number pattern"));

const EXIT_TOKENS: [&str; 3] = ["exit", "quit", "bye"];

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn is_exit_command(input: &str) -> bool {
    let lower = input.trim().to_lowercase();
    EXIT_TOKENS.contains(&lower.as_str())
}

/// Ordered slot filler: route, budget, duration, then the dataset scan for a destination.
/// Malformed text degrades to absent fields rather than failing.
pub fn parse_trip_request(
    text: &str,
    reference: &ReferenceData,
    policy: &PlanningPolicy,
) -> TripRequest {
    let lower = normalize_text(text).to_lowercase();

    let (source, mut destination) = match extract_route(&lower) {
        Some((source, destination)) => (Some(source), Some(destination)),
        None => (None, None),
    };

    let budget = BUDGET
        .captures(&lower)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse::<i64>().ok());

    let duration = DURATION
        .captures(&lower)
        .and_then(|captures| captures.get(1))
        .map(|digits| digits.as_str().parse::<u32>().unwrap_or(u32::MAX));

    if destination.is_none() {
        destination = find_known_city(&lower, reference);
    }

    TripRequest {
        source,
        destination,
        duration: policy.normalize_duration(duration),
        budget,
    }
}

fn extract_route(lower: &str) -> Option<(String, String)> {
    let captures = ROUTE.captures(lower)?;
    let source = captures.get(1)?.as_str().trim();
    let destination = captures.get(2)?.as_str().trim();

    if source.is_empty() || destination.is_empty() {
        return None;
    }

    Some((title_case(source), title_case(destination)))
}

fn find_known_city(lower: &str, reference: &ReferenceData) -> Option<String> {
    reference
        .cities()
        .iter()
        .find(|city| {
            let pattern = format!(r"\b{}\b", regex::escape(&city.city.to_lowercase()));
            Regex::new(&pattern)
                .map(|re| re.is_match(lower))
                .unwrap_or(false)
        })
        .map(|city| city.city.clone())
}

pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_is_letter = false;

    for ch in input.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttractionTheme {
    Shopping,
    Museum,
    Food,
    Sightseeing,
}

impl AttractionTheme {
    /// Detection order when a message names more than one theme.
    pub const ALL: [AttractionTheme; 4] = [
        AttractionTheme::Shopping,
        AttractionTheme::Museum,
        AttractionTheme::Food,
        AttractionTheme::Sightseeing,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Shopping => "shopping",
            Self::Museum => "museum",
            Self::Food => "food",
            Self::Sightseeing => "sightseeing",
        }
    }

    pub fn tags(self) -> &'static [&'static str] {
        match self {
            Self::Shopping => &["Shopping"],
            Self::Museum => &["Museum", "Cultural", "History"],
            Self::Food => &["Food", "Food & Culture"],
            Self::Sightseeing => &["Landmark", "Tour", "Nature", "Cultural"],
        }
    }

    fn detect(lower: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|theme| lower.contains(theme.keyword()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUpCommand {
    Recall,
    /// `None` when the message asks for hotels without naming a tier.
    ListHotels(Option<HotelTier>),
    /// 1-based option number from the last listing, if the message carried one.
    BookHotel(Option<usize>),
    ChangeTheme {
        theme: AttractionTheme,
        day: Option<usize>,
    },
    Unrecognized,
}

impl FollowUpCommand {
    pub fn requires_session(&self) -> bool {
        !matches!(self, Self::Recall)
    }

    pub fn intent(&self) -> Intent {
        match self {
            Self::Recall => Intent::Recall,
            Self::ListHotels(_) => Intent::HotelListing,
            Self::BookHotel(_) => Intent::HotelBooking,
            Self::ChangeTheme { .. } => Intent::AttractionChange,
            Self::Unrecognized => Intent::Unknown,
        }
    }
}

/// Flat dispatch over mutually exclusive follow-ups; the first matching rule wins.
pub fn classify_follow_up(text: &str) -> FollowUpCommand {
    let lower = text.to_lowercase();

    if contains_any(&lower, &["show last", "previous", "last trip"]) {
        return FollowUpCommand::Recall;
    }

    if lower.contains("show") && lower.contains("hotel") {
        let tier = if lower.contains("luxury") {
            Some(HotelTier::Luxury)
        } else if lower.contains("mid") {
            Some(HotelTier::MidRange)
        } else if lower.contains("budget") {
            Some(HotelTier::Budget)
        } else {
            None
        };
        return FollowUpCommand::ListHotels(tier);
    }

    if contains_any(&lower, &["choose", "book", "select"]) {
        // A number too large for usize can never be a valid option, so it saturates.
        let number = NUMBER
            .find_iter(&lower)
            .last()
            .map(|digits| digits.as_str().parse::<usize>().unwrap_or(usize::MAX));
        return FollowUpCommand::BookHotel(number);
    }

    if let Some(theme) = AttractionTheme::detect(&lower) {
        let day = DAY_NUMBER
            .captures(&lower)
            .and_then(|captures| captures.get(1))
            .map(|digits| digits.as_str().parse::<usize>().unwrap_or(usize::MAX));
        return FollowUpCommand::ChangeTheme { theme, day };
    }

    FollowUpCommand::Unrecognized
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceData {
        let raw = r#"{ "cities": [
            { "city": "Paris", "hotels": [
                { "name": "H", "type": "budget", "rating": 4.0, "price_per_night": 50, "location": "X" }
            ], "attractions": [] },
            { "city": "New York", "hotels": [
                { "name": "N", "type": "luxury", "rating": 4.5, "price_per_night": 400, "location": "Y" }
            ], "attractions": [] }
        ] }"#;
        ReferenceData::from_json_str(raw).unwrap()
    }

    #[test]
    fn parses_full_request() {
        let request = parse_trip_request(
            "Plan a 4 day trip from Mumbai to Paris under $5000",
            &reference(),
            &PlanningPolicy::default(),
        );
        assert_eq!(request.source.as_deref(), Some("Mumbai"));
        assert_eq!(request.destination.as_deref(), Some("Paris"));
        assert_eq!(request.duration, 4);
        assert_eq!(request.budget, Some(5000));
    }

    #[test]
    fn multi_word_route_is_title_cased() {
        let request = parse_trip_request(
            "from new delhi to new york within 9000",
            &reference(),
            &PlanningPolicy::default(),
        );
        assert_eq!(request.source.as_deref(), Some("New Delhi"));
        assert_eq!(request.destination.as_deref(), Some("New York"));
        assert_eq!(request.duration, 3);
        assert_eq!(request.budget, Some(9000));
    }

    #[test]
    fn destination_falls_back_to_dataset_scan() {
        let request = parse_trip_request(
            "something nice in new york, max $2000",
            &reference(),
            &PlanningPolicy::default(),
        );
        assert_eq!(request.source, None);
        assert_eq!(request.destination.as_deref(), Some("New York"));
        assert_eq!(request.budget, Some(2000));
    }

    #[test]
    fn dataset_scan_prefers_dataset_order() {
        // New York is mentioned first, but Paris comes first in the dataset.
        let request = parse_trip_request(
            "new york or paris, max $3000",
            &reference(),
            &PlanningPolicy::default(),
        );
        assert_eq!(request.destination.as_deref(), Some("Paris"));
    }

    #[test]
    fn long_durations_are_kept_and_oversized_ones_saturate() {
        let policy = PlanningPolicy::default();
        let request = parse_trip_request("from delhi to paris for 45 days", &reference(), &policy);
        assert_eq!(request.duration, 45);

        let request =
            parse_trip_request("paris for 99999999999 days", &reference(), &policy);
        assert_eq!(request.duration, u32::MAX);
    }

    #[test]
    fn dataset_scan_needs_whole_word() {
        let request = parse_trip_request("parisian cafes", &reference(), &PlanningPolicy::default());
        assert_eq!(request.destination, None);
    }

    #[test]
    fn follow_ups_are_not_trip_requests() {
        let request =
            parse_trip_request("show budget hotels", &reference(), &PlanningPolicy::default());
        assert_eq!(request.budget, None);
        assert!(request.into_parameters().is_none());
    }

    #[test]
    fn classifies_follow_ups_in_priority_order() {
        assert_eq!(classify_follow_up("Show last trip"), FollowUpCommand::Recall);
        assert_eq!(
            classify_follow_up("show mid range hotels"),
            FollowUpCommand::ListHotels(Some(HotelTier::MidRange))
        );
        assert_eq!(classify_follow_up("show hotels"), FollowUpCommand::ListHotels(None));
        assert_eq!(classify_follow_up("book hotel 2"), FollowUpCommand::BookHotel(Some(2)));
        assert_eq!(classify_follow_up("select one please"), FollowUpCommand::BookHotel(None));
        assert_eq!(
            classify_follow_up("change day 2 to museum and shopping"),
            FollowUpCommand::ChangeTheme {
                theme: AttractionTheme::Shopping,
                day: Some(2)
            }
        );
        assert_eq!(
            classify_follow_up("more food please"),
            FollowUpCommand::ChangeTheme {
                theme: AttractionTheme::Food,
                day: None
            }
        );
        assert_eq!(classify_follow_up("hello"), FollowUpCommand::Unrecognized);
    }

    #[test]
    fn oversized_option_number_saturates() {
        assert_eq!(
            classify_follow_up("choose hotel 99999999999999999999999"),
            FollowUpCommand::BookHotel(Some(usize::MAX))
        );
    }

    #[test]
    fn exit_tokens() {
        assert!(is_exit_command(" Bye "));
        assert!(!is_exit_command("goodbye"));
    }
}
