use std::fmt;

use super::step::{AudioClip, CallInput, InputSpec, Prompt, Step};
use crate::twiml::InputMode;

/// The nodes of the call-flow graph.
///
/// Each state is reached by the carrier posting to its endpoint; the state
/// handles the input collected by the gather that pointed there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    Welcome,
    MainMenu,
    SupportMenu,
    TicketLookup,
}

impl CallState {
    pub const ALL: [CallState; 4] = [
        CallState::Welcome,
        CallState::MainMenu,
        CallState::SupportMenu,
        CallState::TicketLookup,
    ];

    /// Webhook path the carrier posts to for this state.
    pub fn path(&self) -> &'static str {
        match self {
            CallState::Welcome => "/twilio_call_handler",
            CallState::MainMenu => "/handle_main_menu",
            CallState::SupportMenu => "/handle_support_menu",
            CallState::TicketLookup => "/handle_ticket_id",
        }
    }

    pub fn from_path(path: &str) -> Option<CallState> {
        Self::ALL.into_iter().find(|s| s.path() == path)
    }

    /// What a gather collecting input for this state listens for.
    ///
    /// `Welcome` is an entry point and never collects input.
    pub fn input_spec(&self) -> Option<InputSpec> {
        match self {
            CallState::Welcome => None,
            CallState::MainMenu | CallState::SupportMenu => Some(InputSpec {
                mode: InputMode::Dtmf,
                max_digits: 1,
                timeout_secs: None,
            }),
            CallState::TicketLookup => Some(InputSpec {
                mode: InputMode::SpeechDtmf,
                max_digits: 6,
                timeout_secs: Some(5),
            }),
        }
    }

    /// The prompt played inside the gather that collects input for this state.
    pub fn menu_prompt(&self) -> Option<Prompt> {
        match self {
            CallState::Welcome => None,
            CallState::MainMenu => Some(Prompt::Audio(AudioClip::MainMenu)),
            CallState::SupportMenu => Some(Prompt::Audio(AudioClip::SupportMenu)),
            CallState::TicketLookup => Some(Prompt::say(
                "Please enter or say your 6-digit ticket ID after the beep.",
            )),
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::Welcome => write!(f, "WELCOME"),
            CallState::MainMenu => write!(f, "MAIN_MENU"),
            CallState::SupportMenu => write!(f, "SUPPORT_MENU"),
            CallState::TicketLookup => write!(f, "TICKET_LOOKUP"),
        }
    }
}

/// How a step leaves the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Gather input for `state`; if the caller stays silent, redirect to `fallback`.
    Next { state: CallState, fallback: CallState },
    /// Redirect to `state`'s endpoint without collecting input.
    Repeat(CallState),
    /// End the call.
    Hangup,
}

/// What the flow needs before it can answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Respond(Step),
    /// The step depends on the status of this ticket.
    Lookup(String),
}

/// The call-flow transition table.
pub struct CallFlow;

impl CallFlow {
    /// Compute the response for `input` posted to `state`'s endpoint.
    ///
    /// Total over every state and input, including absent input.
    pub fn next(state: CallState, input: &CallInput) -> Decision {
        let step = match state {
            CallState::Welcome => Step::new(
                vec![Prompt::Audio(AudioClip::Welcome)],
                Transition::Next {
                    state: CallState::MainMenu,
                    fallback: CallState::Welcome,
                },
            ),
            CallState::MainMenu => Self::main_menu(input.digit_value()),
            CallState::SupportMenu => Self::support_menu(input.digit_value()),
            CallState::TicketLookup => match input.ticket_id() {
                Some(id) => return Decision::Lookup(id.to_string()),
                None => Step::new(
                    vec![Prompt::say(
                        "No input detected. Returning to the support menu.",
                    )],
                    Transition::Repeat(CallState::SupportMenu),
                ),
            },
        };
        Decision::Respond(step)
    }

    /// The closing step once the ticket lookup has finished.
    pub fn ticket_result(ticket_id: &str, status: Option<&str>) -> Step {
        let report = match status {
            Some(status) => Prompt::say(format!(
                "The status for your ticket number {ticket_id} is: {status}"
            )),
            None => Prompt::Audio(AudioClip::InvalidInput),
        };
        Step::new(
            vec![report, Prompt::say("Thank you for calling DIGI9. Goodbye!")],
            Transition::Hangup,
        )
    }

    fn main_menu(digit: Option<&str>) -> Step {
        match digit {
            Some("1") => Self::farewell(AudioClip::SalesTransfer, "Transferring to sales. Goodbye."),
            Some("2") => Step::new(
                Vec::new(),
                Transition::Next {
                    state: CallState::SupportMenu,
                    fallback: CallState::MainMenu,
                },
            ),
            Some("3") => Self::farewell(AudioClip::HrTransfer, "Transferring to HR. Goodbye."),
            Some("4") => Self::farewell(AudioClip::OfficeInfo, "Thank you for calling. Goodbye."),
            _ => Self::invalid(),
        }
    }

    fn support_menu(digit: Option<&str>) -> Step {
        match digit {
            Some("1") => Self::farewell(
                AudioClip::LogNewTicket,
                "A new support ticket has been logged. Goodbye.",
            ),
            Some("2") => Step::new(
                Vec::new(),
                Transition::Next {
                    state: CallState::TicketLookup,
                    fallback: CallState::SupportMenu,
                },
            ),
            // Reached by the ticket prompt's silence fallback: present the menu again.
            None => Step::new(
                Vec::new(),
                Transition::Next {
                    state: CallState::SupportMenu,
                    fallback: CallState::MainMenu,
                },
            ),
            Some(_) => Self::invalid(),
        }
    }

    fn farewell(clip: AudioClip, text: &str) -> Step {
        Step::new(
            vec![Prompt::Audio(clip), Prompt::say(text)],
            Transition::Hangup,
        )
    }

    fn invalid() -> Step {
        Step::new(
            vec![Prompt::Audio(AudioClip::InvalidInput)],
            Transition::Repeat(CallState::Welcome),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn respond(state: CallState, input: CallInput) -> Step {
        match CallFlow::next(state, &input) {
            Decision::Respond(step) => step,
            Decision::Lookup(id) => panic!("unexpected lookup of {id}"),
        }
    }

    fn sample_inputs() -> Vec<CallInput> {
        let mut inputs = vec![
            CallInput::default(),
            CallInput::digits(""),
            CallInput::digits("   "),
            CallInput::digits("*"),
            CallInput::digits("#"),
            CallInput::digits("12"),
            CallInput::digits("123456"),
            CallInput::speech("one two three"),
            CallInput::speech("123456."),
        ];
        for d in 0..=9 {
            inputs.push(CallInput::digits(d.to_string()));
        }
        inputs
    }

    #[test]
    fn every_state_and_input_yields_a_decision() {
        for state in CallState::ALL {
            for input in sample_inputs() {
                match CallFlow::next(state, &input) {
                    Decision::Respond(step) => {
                        if let Transition::Next { state: next, .. } = step.transition {
                            assert!(next.input_spec().is_some(), "{state} gathers for {next}");
                        }
                    }
                    Decision::Lookup(id) => {
                        assert_eq!(state, CallState::TicketLookup);
                        assert!(!id.trim().is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn welcome_presents_main_menu_and_loops_on_silence() {
        let step = respond(CallState::Welcome, CallInput::default());
        assert_eq!(step.prompts, vec![Prompt::Audio(AudioClip::Welcome)]);
        assert_eq!(
            step.transition,
            Transition::Next {
                state: CallState::MainMenu,
                fallback: CallState::Welcome,
            }
        );
    }

    #[test]
    fn welcome_ignores_input() {
        assert_eq!(
            respond(CallState::Welcome, CallInput::digits("9")),
            respond(CallState::Welcome, CallInput::default())
        );
    }

    #[test]
    fn main_menu_sales_transfers_and_hangs_up() {
        let step = respond(CallState::MainMenu, CallInput::digits("1"));
        assert_eq!(step.prompts[0], Prompt::Audio(AudioClip::SalesTransfer));
        assert_eq!(step.transition, Transition::Hangup);
    }

    #[test]
    fn main_menu_support_gathers_support_choice() {
        let step = respond(CallState::MainMenu, CallInput::digits("2"));
        assert!(step.prompts.is_empty());
        assert_eq!(
            step.transition,
            Transition::Next {
                state: CallState::SupportMenu,
                fallback: CallState::MainMenu,
            }
        );
    }

    #[test]
    fn main_menu_hr_and_office_hang_up() {
        let hr = respond(CallState::MainMenu, CallInput::digits("3"));
        assert_eq!(hr.prompts[0], Prompt::Audio(AudioClip::HrTransfer));
        assert_eq!(hr.transition, Transition::Hangup);

        let office = respond(CallState::MainMenu, CallInput::digits("4"));
        assert_eq!(office.prompts[0], Prompt::Audio(AudioClip::OfficeInfo));
        assert_eq!(office.transition, Transition::Hangup);
    }

    #[test]
    fn main_menu_invalid_or_missing_returns_to_welcome() {
        for input in [
            CallInput::default(),
            CallInput::digits("9"),
            CallInput::digits("0"),
            CallInput::speech("sales"),
        ] {
            let step = respond(CallState::MainMenu, input);
            assert_eq!(step.prompts, vec![Prompt::Audio(AudioClip::InvalidInput)]);
            assert_eq!(step.transition, Transition::Repeat(CallState::Welcome));
        }
    }

    #[test]
    fn support_menu_new_ticket_hangs_up() {
        let step = respond(CallState::SupportMenu, CallInput::digits("1"));
        assert_eq!(step.prompts[0], Prompt::Audio(AudioClip::LogNewTicket));
        assert_eq!(step.transition, Transition::Hangup);
    }

    #[test]
    fn support_menu_lookup_gathers_ticket_id() {
        let step = respond(CallState::SupportMenu, CallInput::digits("2"));
        assert_eq!(
            step.transition,
            Transition::Next {
                state: CallState::TicketLookup,
                fallback: CallState::SupportMenu,
            }
        );
        let spec = CallState::TicketLookup.input_spec().unwrap();
        assert_eq!(spec.mode, InputMode::SpeechDtmf);
        assert_eq!(spec.max_digits, 6);
        assert_eq!(spec.timeout_secs, Some(5));
    }

    #[test]
    fn support_menu_silence_represents_menu() {
        let step = respond(CallState::SupportMenu, CallInput::default());
        assert_eq!(
            step.transition,
            Transition::Next {
                state: CallState::SupportMenu,
                fallback: CallState::MainMenu,
            }
        );
    }

    #[test]
    fn support_menu_invalid_returns_to_welcome() {
        let step = respond(CallState::SupportMenu, CallInput::digits("7"));
        assert_eq!(step.prompts, vec![Prompt::Audio(AudioClip::InvalidInput)]);
        assert_eq!(step.transition, Transition::Repeat(CallState::Welcome));
    }

    #[test]
    fn ticket_lookup_without_input_returns_to_support_menu() {
        let step = respond(
            CallState::TicketLookup,
            CallInput {
                digits: Some(String::new()),
                speech: Some(String::new()),
            },
        );
        assert!(step.spoken_text().contains("No input detected"));
        assert_eq!(step.transition, Transition::Repeat(CallState::SupportMenu));
    }

    #[test]
    fn ticket_lookup_requests_lookup_preferring_speech() {
        let input = CallInput {
            digits: Some("000001".into()),
            speech: Some("123456".into()),
        };
        assert_eq!(
            CallFlow::next(CallState::TicketLookup, &input),
            Decision::Lookup("123456".into())
        );
    }

    #[test]
    fn ticket_result_found_speaks_status() {
        let step = CallFlow::ticket_result("123456", Some("Resolved"));
        let spoken = step.spoken_text();
        assert!(spoken.contains("123456"));
        assert!(spoken.contains("Resolved"));
        assert_eq!(step.transition, Transition::Hangup);
    }

    #[test]
    fn ticket_result_missing_plays_invalid_input() {
        let step = CallFlow::ticket_result("999999", None);
        assert_eq!(step.prompts[0], Prompt::Audio(AudioClip::InvalidInput));
        assert!(step.spoken_text().contains("Goodbye"));
        assert_eq!(step.transition, Transition::Hangup);
    }

    #[test]
    fn paths_round_trip() {
        for state in CallState::ALL {
            assert_eq!(CallState::from_path(state.path()), Some(state));
        }
        assert_eq!(CallState::from_path("/ticket_status"), None);
    }

    #[test]
    fn state_display() {
        assert_eq!(CallState::Welcome.to_string(), "WELCOME");
        assert_eq!(CallState::MainMenu.to_string(), "MAIN_MENU");
        assert_eq!(CallState::SupportMenu.to_string(), "SUPPORT_MENU");
        assert_eq!(CallState::TicketLookup.to_string(), "TICKET_LOOKUP");
    }
}
