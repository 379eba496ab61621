// src/intake/prompts.rs
// Outbound texts and choice keyboards

use serde::{Deserialize, Serialize};

pub const CALLBACK_SINGLE_PREDICTION: &str = "menu:single_prediction";
pub const CALLBACK_HELP: &str = "menu:help";
pub const CALLBACK_INFO: &str = "menu:info";
pub const PASSENGERS_CALLBACK_PREFIX: &str = "passengers:";

/// Passenger counts offered as buttons
pub const PASSENGER_CHOICES: std::ops::RangeInclusive<u32> = 1..=6;

/// A button the user can press instead of typing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub data: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// One message sent back to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choices(text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            text: text.into(),
            choices,
        }
    }
}

/// Which fixed message a transition asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Menu,
    Info,
    PickupPoint,
    DropoffPoint,
    PassengerCount,
    PickupDatetime,
    Finished,
}

const MENU_TEXT: &str = "Hi! This bot estimates the price of a taxi ride in New York City.

Press \"Single trip\" to get a fare estimate.

Buttons:
• \"Help\" shows how to use the bot
• \"About\" describes the data and the model behind the estimates";

const INFO_TEXT: &str = "Estimates come from a regression model trained on historical New York City taxi trips.

The model looks at the pickup and dropoff coordinates, the number of passengers, the pickup date, whether the date is a US public holiday or a weekend, and the straight-line distance of the trip.";

const PICKUP_TEXT: &str = "Enter the pickup point in New York.

Accepted formats:
1. A shared location
2. An address in English, for example: 127 Hudson St, New York, NY 10013, United States
3. Latitude and longitude separated by a space, for example: 40.720314 -74.008884";

const DROPOFF_TEXT: &str = "Enter the dropoff point in New York.

Accepted formats:
1. A shared location
2. An address in English, for example: 28 Avenue B, New York, NY 10009, United States
3. Latitude and longitude separated by a space, for example: 40.722350 -73.983280";

const PASSENGERS_TEXT: &str = "Choose the number of passengers, from 1 to 6:";

const DATETIME_TEXT: &str = "Enter the pickup date and time as YYYY-MM-DD hh:mm:ss";

const FINISHED_TEXT: &str = "This estimate is done. Press \"Single trip\" to price another ride.";

pub fn menu_choices() -> Vec<Choice> {
    vec![
        Choice::new("Single trip", CALLBACK_SINGLE_PREDICTION),
        Choice::new("Help", CALLBACK_HELP),
        Choice::new("About", CALLBACK_INFO),
    ]
}

pub fn passenger_choices() -> Vec<Choice> {
    PASSENGER_CHOICES
        .map(|n| Choice::new(n.to_string(), format!("{PASSENGERS_CALLBACK_PREFIX}{n}")))
        .collect()
}

impl Prompt {
    pub fn render(self) -> Reply {
        match self {
            Prompt::Menu => Reply::with_choices(MENU_TEXT, menu_choices()),
            Prompt::Info => Reply::with_choices(INFO_TEXT, menu_choices()),
            Prompt::PickupPoint => Reply::text(PICKUP_TEXT),
            Prompt::DropoffPoint => Reply::text(DROPOFF_TEXT),
            Prompt::PassengerCount => Reply::with_choices(PASSENGERS_TEXT, passenger_choices()),
            Prompt::PickupDatetime => Reply::text(DATETIME_TEXT),
            Prompt::Finished => Reply::with_choices(FINISHED_TEXT, menu_choices()),
        }
    }
}

pub fn fare_reply(amount: impl std::fmt::Display) -> Reply {
    Reply::with_choices(format!("Trip fare: {amount}"), menu_choices())
}

pub fn estimate_failed_reply() -> Reply {
    Reply::with_choices(
        "The fare could not be estimated right now. Please try again later.",
        menu_choices(),
    )
}
