//! Tests for #[derive(Command)] and #[derive(DomainEvent)]

use flight_surety_core::command::Command;
use flight_surety_core::event::Event;
use flight_surety_macros::{Command, DomainEvent};

#[derive(Command, Clone, Debug)]
#[allow(dead_code)]
enum DeskCommand {
    #[ungated]
    SetOperatingStatus { operational: bool },

    OpenDesk(String),

    #[ungated]
    Ping,

    CloseDesk,
}

#[derive(DomainEvent, Clone, Debug)]
#[allow(dead_code)]
enum DeskEvent {
    DeskOpened { desk: String },
    Pong(u64),
    DeskClosed,
}

#[test]
fn test_command_names_are_variant_names() {
    assert_eq!(DeskCommand::OpenDesk("A1".to_string()).name(), "OpenDesk");
    assert_eq!(DeskCommand::CloseDesk.name(), "CloseDesk");
    assert_eq!(
        DeskCommand::SetOperatingStatus { operational: true }.name(),
        "SetOperatingStatus"
    );
}

#[test]
fn test_ungated_variants_skip_the_gate() {
    assert!(!DeskCommand::SetOperatingStatus { operational: false }.requires_operational());
    assert!(!DeskCommand::Ping.requires_operational());
    assert!(DeskCommand::OpenDesk("B2".to_string()).requires_operational());
    assert!(DeskCommand::CloseDesk.requires_operational());
}

#[test]
fn test_event_types_are_versioned() {
    assert_eq!(
        DeskEvent::DeskOpened {
            desk: "A1".to_string()
        }
        .event_type(),
        "DeskOpened.v1"
    );
    assert_eq!(DeskEvent::Pong(3).event_type(), "Pong.v1");
    assert_eq!(DeskEvent::DeskClosed.event_type(), "DeskClosed.v1");
}
