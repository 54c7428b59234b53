use std::fmt::{self, Write as _};
use std::sync::Arc;

use crate::models::{Hotel, HotelTier, TripRecord};
use crate::planner::{HotelChoice, Itinerary};

pub const GREETING: &str = "Hey! I'm your travel assistant.";
pub const EXAMPLE_REQUEST: &str = "Example: plan a 4 day trip from Mumbai to Paris under $5000";
pub const HOTEL_TIER_PROMPT: &str = "Specify hotel type: luxury / mid / budget";
pub const HOTEL_OPTION_PROMPT: &str = "Choose a valid hotel option number.";
pub const FAREWELL: &str = "Goodbye!";

pub fn render_itinerary(itinerary: &Itinerary, per_day: usize) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_itinerary(&mut out, itinerary, per_day);
    out
}

fn write_itinerary(out: &mut String, itinerary: &Itinerary, per_day: usize) -> fmt::Result {
    let route_from = itinerary.source.as_deref().unwrap_or("(unknown origin)");

    writeln!(out, "Trip Itinerary")?;
    writeln!(out, "Route: {} -> {}", route_from, itinerary.destination)?;
    writeln!(out, "Duration: {} days", itinerary.duration)?;
    writeln!(out, "Total Budget: ${}", itinerary.budget)?;
    writeln!(out)?;

    match itinerary.flight.distance_km {
        Some(distance) => writeln!(
            out,
            "Estimated Flight Cost: ${} ({} km)",
            itinerary.flight.cost, distance
        )?,
        None => writeln!(
            out,
            "Estimated Flight Cost: ${} (route distance unavailable, informational only)",
            itinerary.flight.cost
        )?,
    }
    writeln!(out, "Remaining After Flight: ${}", itinerary.remaining_after_flight)?;
    writeln!(out)?;

    let hotel = &itinerary.hotel;
    writeln!(
        out,
        "Hotel Selected: {} ({}) rating {}",
        hotel.name, hotel.hotel_type, hotel.rating
    )?;
    writeln!(out, "Location: {}", hotel.location)?;
    writeln!(out, "Cost/Night: ${}", hotel.price_per_night)?;
    match itinerary.hotel_choice {
        HotelChoice::Booked => writeln!(out, "(your booked hotel)")?,
        HotelChoice::Restored => writeln!(out, "(hotel from your previous trip)")?,
        HotelChoice::CheapestFallback => {
            writeln!(out, "(no hotel fits the budget; cheapest option shown)")?
        }
        HotelChoice::WithinCap => {}
    }
    writeln!(out, "---")?;

    for day in 1..=itinerary.duration {
        writeln!(out, "\nDay {day}")?;
        let slots = itinerary.day_slots(day, per_day);
        if slots.is_empty() {
            writeln!(out, "- Free time")?;
        }
        for slot in slots {
            match slot {
                Some(attraction) => writeln!(
                    out,
                    "- {} - ${} | {} hrs | Best time: {}",
                    attraction.name,
                    attraction.entry_fee,
                    attraction.duration_hours,
                    attraction.best_time_to_visit
                )?,
                None => writeln!(out, "- Free time")?,
            }
        }
        writeln!(out, "---")?;
    }

    let costs = &itinerary.costs;
    writeln!(out, "\nCost Breakdown")?;
    writeln!(out, "Flights: ${}", costs.flight)?;
    writeln!(out, "Hotel: ${}", costs.hotel)?;
    writeln!(out, "Attractions: ${}", costs.attractions)?;
    writeln!(out, "Food + Transport: ${}", costs.misc)?;
    writeln!(out)?;
    writeln!(out, "Total Estimated Spend = ${}", costs.total)?;
    write!(out, "Remaining Budget: ${}", itinerary.remaining_budget())
}

pub fn render_hotel_listing(tier: HotelTier, hotels: &[Arc<Hotel>]) -> String {
    if hotels.is_empty() {
        return format!("No {tier} hotels available for this destination.");
    }

    let lines = hotels
        .iter()
        .enumerate()
        .map(|(index, hotel)| {
            format!(
                "{}. {} - ${} | rating {}",
                index + 1,
                hotel.name,
                hotel.price_per_night,
                hotel.rating
            )
        })
        .collect::<Vec<_>>();

    format!("Available hotels:\n{}", lines.join("\n"))
}

pub fn render_history(records: &[TripRecord]) -> String {
    if records.is_empty() {
        return "No trips recorded yet.".to_string();
    }

    records
        .iter()
        .map(|record| {
            format!(
                "#{} {} | {} -> {} | {} days | budget ${} | total ${} | {}",
                record.id,
                record.timestamp,
                record.source.as_deref().unwrap_or("?"),
                record.destination,
                record.days,
                record.budget,
                record.total_cost,
                record.hotel
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
