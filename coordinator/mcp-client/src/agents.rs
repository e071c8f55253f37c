/// Domain agents the coordinator can hand a query to

use crate::prompts::{
    BOOKING_MANAGEMENT_INSTRUCTION, CAR_RENTAL_INSTRUCTION, FLIGHTS_INSTRUCTION,
    HOTELS_INSTRUCTION, RESTAURANTS_INSTRUCTION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainAgent {
    pub name: &'static str,
    pub description: &'static str,
    pub instruction: &'static str,
    /// Toolset loaded from the tool backend.
    pub toolset: &'static str,
    /// Tools the instruction refers to.
    pub tools: &'static [&'static str],
}

pub const HOTELS_AGENT: DomainAgent = DomainAgent {
    name: "hotels_agent",
    description: "You are a specialized hotel booking expert with comprehensive knowledge of accommodations worldwide.",
    instruction: HOTELS_INSTRUCTION,
    toolset: "hotels_toolset",
    tools: &[
        "search-hotels-by-name",
        "search-hotels-by-location",
        "search-hotels-by-price-tier",
        "get-hotel-amenities",
    ],
};

pub const FLIGHTS_AGENT: DomainAgent = DomainAgent {
    name: "flights_agent",
    description: "You are a specialized flight booking expert with extensive knowledge of airlines, routes, and flight availability.",
    instruction: FLIGHTS_INSTRUCTION,
    toolset: "flights_toolset",
    tools: &[
        "search-flights-by-route",
        "search-flights-by-airline",
        "get-available-flights",
    ],
};

pub const RESTAURANTS_AGENT: DomainAgent = DomainAgent {
    name: "restaurants_agent",
    description: "You are a specialized restaurant recommendation expert with extensive culinary knowledge and dining expertise.",
    instruction: RESTAURANTS_INSTRUCTION,
    toolset: "restaurants_toolset",
    tools: &[
        "search-restaurants-by-cuisine",
        "search-restaurants-by-location",
        "get-restaurant-menu",
    ],
};

pub const CAR_RENTAL_AGENT: DomainAgent = DomainAgent {
    name: "car_rental_agent",
    description: "You are a specialized car rental expert with comprehensive knowledge of vehicle types, locations, and rental services.",
    instruction: CAR_RENTAL_INSTRUCTION,
    toolset: "car_rental_toolset",
    tools: &["search-cars-by-location", "search-cars-by-type"],
};

pub const BOOKING_MANAGEMENT_AGENT: DomainAgent = DomainAgent {
    name: "booking_management_agent",
    description: "You are a specialized booking management expert responsible for handling all booking operations across travel services.",
    instruction: BOOKING_MANAGEMENT_INSTRUCTION,
    toolset: "booking_management_toolset",
    tools: &["create-booking", "get-customer-bookings", "cancel-booking"],
};

pub static ROSTER: [DomainAgent; 5] = [
    HOTELS_AGENT,
    FLIGHTS_AGENT,
    RESTAURANTS_AGENT,
    CAR_RENTAL_AGENT,
    BOOKING_MANAGEMENT_AGENT,
];

/// Looks an agent up by name, ignoring case and surrounding whitespace.
pub fn find_agent(name: &str) -> Option<&'static DomainAgent> {
    let name = name.trim();
    ROSTER.iter().find(|agent| agent.name.eq_ignore_ascii_case(name))
}
