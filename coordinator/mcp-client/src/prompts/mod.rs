/// Prompts module
/// Centralized management of the coordinator and domain agent prompts

pub mod agents;
pub mod coordinator;

pub use agents::{
    BOOKING_MANAGEMENT_INSTRUCTION, CAR_RENTAL_INSTRUCTION, FLIGHTS_INSTRUCTION,
    HOTELS_INSTRUCTION, RESTAURANTS_INSTRUCTION,
};
pub use coordinator::{agent_system_prompt, routing_system_prompt};
