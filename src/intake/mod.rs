// src/intake/mod.rs
// Trip intake: a linear sequence of stages, each collecting one trip field

pub mod prompts;
pub mod resolver;
pub mod session;
pub mod validators;

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use crate::trip::{GeoPoint, PartialTripInput, SchemaErrors, ValidatedTripRequest};
use prompts::Prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    AwaitingPickupPoint,
    AwaitingDropoffPoint,
    AwaitingPassengerCount,
    AwaitingPickupDatetime,
    Completed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::AwaitingPickupPoint => "awaiting_pickup_point",
            Stage::AwaitingDropoffPoint => "awaiting_dropoff_point",
            Stage::AwaitingPassengerCount => "awaiting_passenger_count",
            Stage::AwaitingPickupDatetime => "awaiting_pickup_datetime",
            Stage::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// User input after validation. `None` payloads mean the input was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageInput {
    /// Explicit request to begin a new trip
    Start,
    Point(Option<GeoPoint>),
    Passengers(Option<u32>),
    Datetime(Option<NaiveDateTime>),
    /// Anything the current stage has no use for
    Other,
}

/// The single outbound action a transition produces
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Prompt(Prompt),
    Rejected(SchemaErrors),
    Estimate(ValidatedTripRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub stage: Stage,
    pub trip: PartialTripInput,
    pub effect: Effect,
}

impl Transition {
    fn to(stage: Stage, trip: PartialTripInput, prompt: Prompt) -> Self {
        Self {
            stage,
            trip,
            effect: Effect::Prompt(prompt),
        }
    }

    fn restart() -> Self {
        Self::to(Stage::AwaitingPickupPoint, PartialTripInput::default(), Prompt::PickupPoint)
    }
}

/// Compute the next stage, the updated trip and the outbound effect.
///
/// A rejected pickup point restarts the trip from scratch, while rejected input
/// at later stages only repeats the current prompt. A trip failing the schema
/// check stays at the datetime stage without storing the datetime.
pub fn transition(stage: Stage, trip: PartialTripInput, input: StageInput) -> Transition {
    use StageInput::*;

    if input == Start {
        return Transition::restart();
    }

    match (stage, input) {
        (Stage::Idle, _) => Transition::to(Stage::Idle, trip, Prompt::Menu),

        (Stage::AwaitingPickupPoint, Point(Some(point))) => Transition::to(
            Stage::AwaitingDropoffPoint,
            PartialTripInput::default().with_pickup(point),
            Prompt::DropoffPoint,
        ),
        (Stage::AwaitingPickupPoint, _) => Transition::restart(),

        (Stage::AwaitingDropoffPoint, Point(Some(point))) => Transition::to(
            Stage::AwaitingPassengerCount,
            trip.with_dropoff(point),
            Prompt::PassengerCount,
        ),
        (Stage::AwaitingDropoffPoint, _) => {
            Transition::to(Stage::AwaitingDropoffPoint, trip, Prompt::DropoffPoint)
        }

        (Stage::AwaitingPassengerCount, Passengers(Some(count))) => Transition::to(
            Stage::AwaitingPickupDatetime,
            trip.with_passengers(count),
            Prompt::PickupDatetime,
        ),
        (Stage::AwaitingPassengerCount, _) => {
            Transition::to(Stage::AwaitingPassengerCount, trip, Prompt::PassengerCount)
        }

        (Stage::AwaitingPickupDatetime, Datetime(Some(datetime))) => {
            let candidate = trip.with_pickup_datetime(datetime);
            match candidate.validate() {
                // Finished trips are not kept in the session
                Ok(request) => Transition {
                    stage: Stage::Completed,
                    trip: PartialTripInput::default(),
                    effect: Effect::Estimate(request),
                },
                Err(errors) => Transition {
                    stage: Stage::AwaitingPickupDatetime,
                    trip,
                    effect: Effect::Rejected(errors),
                },
            }
        }
        (Stage::AwaitingPickupDatetime, _) => {
            Transition::to(Stage::AwaitingPickupDatetime, trip, Prompt::PickupDatetime)
        }

        (Stage::Completed, _) => Transition::to(Stage::Completed, trip, Prompt::Finished),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::SchemaViolation;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint { latitude, longitude }
    }

    fn at(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn collected(passengers: u32, dropoff: GeoPoint) -> PartialTripInput {
        PartialTripInput::default()
            .with_pickup(point(40.712776, -74.005974))
            .with_dropoff(dropoff)
            .with_passengers(passengers)
    }

    #[test]
    fn test_happy_path() {
        let t = transition(Stage::Idle, PartialTripInput::default(), StageInput::Start);
        assert_eq!(t.stage, Stage::AwaitingPickupPoint);
        assert_eq!(t.effect, Effect::Prompt(Prompt::PickupPoint));

        let t = transition(t.stage, t.trip, StageInput::Point(Some(point(40.712776, -74.005974))));
        assert_eq!(t.stage, Stage::AwaitingDropoffPoint);
        assert_eq!(t.effect, Effect::Prompt(Prompt::DropoffPoint));

        let t = transition(t.stage, t.trip, StageInput::Point(Some(point(40.730610, -73.935242))));
        assert_eq!(t.stage, Stage::AwaitingPassengerCount);
        assert_eq!(t.effect, Effect::Prompt(Prompt::PassengerCount));

        let t = transition(t.stage, t.trip, StageInput::Passengers(Some(2)));
        assert_eq!(t.stage, Stage::AwaitingPickupDatetime);
        assert_eq!(t.trip.passenger_count, Some(2));

        let t = transition(t.stage, t.trip, StageInput::Datetime(Some(at("2023-06-15 14:30:00"))));
        assert_eq!(t.stage, Stage::Completed);
        assert_eq!(t.trip, PartialTripInput::default());
        match t.effect {
            Effect::Estimate(request) => assert_eq!(request.passenger_count(), 2),
            other => panic!("expected estimate, got {other:?}"),
        }
    }

    #[test]
    fn test_start_clears_previous_trip_from_any_stage() {
        let trip = collected(3, point(40.73, -73.93));
        for stage in [
            Stage::AwaitingPassengerCount,
            Stage::AwaitingPickupDatetime,
            Stage::Completed,
        ] {
            let t = transition(stage, trip, StageInput::Start);
            assert_eq!(t.stage, Stage::AwaitingPickupPoint);
            assert_eq!(t.trip, PartialTripInput::default());
        }
    }

    #[test]
    fn test_pickup_failure_restarts() {
        let stale = PartialTripInput::default().with_passengers(4);
        let t = transition(Stage::AwaitingPickupPoint, stale, StageInput::Point(None));
        assert_eq!(t.stage, Stage::AwaitingPickupPoint);
        assert_eq!(t.trip, PartialTripInput::default());
        assert_eq!(t.effect, Effect::Prompt(Prompt::PickupPoint));
    }

    #[test]
    fn test_dropoff_failure_keeps_pickup() {
        let trip = PartialTripInput::default().with_pickup(point(40.7, -74.0));
        let t = transition(Stage::AwaitingDropoffPoint, trip, StageInput::Point(None));
        assert_eq!(t.stage, Stage::AwaitingDropoffPoint);
        assert_eq!(t.trip, trip);
        assert_eq!(t.effect, Effect::Prompt(Prompt::DropoffPoint));

        let t = transition(Stage::AwaitingDropoffPoint, trip, StageInput::Other);
        assert_eq!(t.trip.pickup_latitude, Some(40.7));
    }

    #[test]
    fn test_bad_passengers_and_datetime_reprompt() {
        let trip = collected(1, point(40.73, -73.93));
        let t = transition(Stage::AwaitingPassengerCount, trip, StageInput::Passengers(None));
        assert_eq!(t.stage, Stage::AwaitingPassengerCount);
        assert_eq!(t.effect, Effect::Prompt(Prompt::PassengerCount));

        let t = transition(Stage::AwaitingPickupDatetime, trip, StageInput::Datetime(None));
        assert_eq!(t.stage, Stage::AwaitingPickupDatetime);
        assert_eq!(t.effect, Effect::Prompt(Prompt::PickupDatetime));
        assert_eq!(t.trip, trip);
    }

    #[test]
    fn test_schema_failure_stalls() {
        let trip = collected(9, point(40.73, -73.93));
        let t = transition(
            Stage::AwaitingPickupDatetime,
            trip,
            StageInput::Datetime(Some(at("2023-06-15 14:30:00"))),
        );

        assert_eq!(t.stage, Stage::AwaitingPickupDatetime);
        assert_eq!(t.trip.pickup_datetime, None);
        match t.effect {
            Effect::Rejected(errors) => {
                assert_eq!(errors.violations(), &[SchemaViolation::PassengerCountOutOfRange(9)])
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_same_point_rejected() {
        let trip = collected(2, point(40.712776, -74.005974));
        let t = transition(
            Stage::AwaitingPickupDatetime,
            trip,
            StageInput::Datetime(Some(at("2023-06-15 14:30:00"))),
        );
        assert!(matches!(
            t.effect,
            Effect::Rejected(ref e) if e.violations().contains(&SchemaViolation::SamePoint)
        ));
    }

    #[test]
    fn test_idle_and_completed_only_prompt() {
        let t = transition(Stage::Idle, PartialTripInput::default(), StageInput::Other);
        assert_eq!(t.stage, Stage::Idle);
        assert_eq!(t.effect, Effect::Prompt(Prompt::Menu));

        let t = transition(
            Stage::Completed,
            PartialTripInput::default(),
            StageInput::Point(Some(point(40.0, -74.0))),
        );
        assert_eq!(t.stage, Stage::Completed);
        assert_eq!(t.trip, PartialTripInput::default());
        assert_eq!(t.effect, Effect::Prompt(Prompt::Finished));
    }
}
