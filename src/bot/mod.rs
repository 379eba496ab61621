// src/bot/mod.rs
// Command/menu dispatch and per-message intake driving

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::intake::prompts::{
    self, Prompt, Reply, CALLBACK_HELP, CALLBACK_INFO, CALLBACK_SINGLE_PREDICTION,
    PASSENGERS_CALLBACK_PREFIX,
};
use crate::intake::resolver::LocationResolver;
use crate::intake::session::{ConversationSession, SessionStore};
use crate::intake::validators::{parse_coordinates, validate_coordinates, validate_datetime};
use crate::intake::{transition, Effect, Stage, StageInput};
use crate::model::FarePredictor;
use crate::trip::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A message or button press delivered by the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub chat_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub callback_data: Option<String>,
}

impl InboundMessage {
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: Some(text.into()),
            location: None,
            callback_data: None,
        }
    }

    pub fn location(chat_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: None,
            location: Some(Location { latitude, longitude }),
            callback_data: None,
        }
    }

    pub fn callback(chat_id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: None,
            location: None,
            callback_data: Some(data.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Help,
    Info,
    StartTrip,
}

fn parse_command(message: &InboundMessage) -> Option<Command> {
    if let Some(data) = message.callback_data.as_deref() {
        return match data {
            CALLBACK_HELP => Some(Command::Help),
            CALLBACK_INFO => Some(Command::Info),
            CALLBACK_SINGLE_PREDICTION => Some(Command::StartTrip),
            _ => None,
        };
    }

    let text = message.text.as_deref()?.trim();
    // "/start@SomeBot" addresses the command to a specific bot in group chats
    let command = text.split_whitespace().next()?.split('@').next()?;
    match command {
        "/start" | "/help" => Some(Command::Help),
        "/info" => Some(Command::Info),
        "/single_prediction" => Some(Command::StartTrip),
        _ => None,
    }
}

/// Parse a passenger button press or a typed number.
pub fn parse_passenger_choice(message: &InboundMessage) -> Option<u32> {
    if let Some(data) = message.callback_data.as_deref() {
        return data.strip_prefix(PASSENGERS_CALLBACK_PREFIX)?.trim().parse().ok();
    }
    message.text.as_deref()?.trim().parse().ok()
}

pub struct Bot {
    sessions: SessionStore,
    resolver: LocationResolver,
    predictor: FarePredictor,
}

impl Bot {
    pub fn new(resolver: LocationResolver, predictor: FarePredictor) -> Self {
        Self {
            sessions: SessionStore::new(),
            resolver,
            predictor,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one inbound message and return what to send back.
    pub async fn handle(&self, message: &InboundMessage) -> Vec<Reply> {
        let command = parse_command(message);
        match command {
            Some(Command::Help) => return vec![Prompt::Menu.render()],
            Some(Command::Info) => return vec![Prompt::Info.render()],
            _ => {}
        }

        let handle = self.sessions.session(&message.chat_id).await;
        let mut session = handle.lock().await;
        session.mark_active();

        let input = match command {
            Some(Command::StartTrip) => {
                info!(chat_id = %message.chat_id, "Trip intake started");
                StageInput::Start
            }
            _ => self.read_input(session.stage, message).await,
        };

        vec![self.apply(&mut session, input)]
    }

    /// Validate the message for whatever field the current stage expects.
    async fn read_input(&self, stage: Stage, message: &InboundMessage) -> StageInput {
        match stage {
            Stage::AwaitingPickupPoint | Stage::AwaitingDropoffPoint => {
                StageInput::Point(self.read_point(message).await)
            }
            Stage::AwaitingPassengerCount => {
                StageInput::Passengers(parse_passenger_choice(message))
            }
            Stage::AwaitingPickupDatetime => {
                StageInput::Datetime(message.text.as_deref().and_then(validate_datetime))
            }
            Stage::Idle | Stage::Completed => StageInput::Other,
        }
    }

    async fn read_point(&self, message: &InboundMessage) -> Option<GeoPoint> {
        if let Some(location) = message.location {
            return validate_coordinates(location.latitude, location.longitude);
        }
        let text = message.text.as_deref()?;
        let raw = self.resolver.resolve(text).await?;
        parse_coordinates(&raw.latitude, &raw.longitude)
    }

    fn apply(&self, session: &mut ConversationSession, input: StageInput) -> Reply {
        let from = session.stage;
        let step = transition(from, session.trip, input);
        session.stage = step.stage;
        session.trip = step.trip;
        debug!(chat_id = %session.chat_id, %from, to = %step.stage, "Intake transition");

        match step.effect {
            Effect::Prompt(prompt) => prompt.render(),
            Effect::Rejected(errors) => {
                info!(
                    chat_id = %session.chat_id,
                    violations = errors.violations().len(),
                    "Trip rejected by schema check"
                );
                Reply::text(errors.to_string())
            }
            Effect::Estimate(request) => match self.predictor.estimate(&request) {
                Ok(fare) => {
                    info!(chat_id = %session.chat_id, fare = fare.amount(), "Fare estimated");
                    prompts::fare_reply(fare)
                }
                Err(e) => {
                    error!(chat_id = %session.chat_id, "Fare estimation failed: {}", e);
                    prompts::estimate_failed_reply()
                }
            },
        }
    }
}
