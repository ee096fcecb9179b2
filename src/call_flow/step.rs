use serde::Deserialize;

use super::state::Transition;
use crate::twiml::InputMode;

/// A hosted audio asset played to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioClip {
    Welcome,
    MainMenu,
    InvalidInput,
    SalesTransfer,
    SupportMenu,
    HrTransfer,
    OfficeInfo,
    LogNewTicket,
}

impl AudioClip {
    pub const ALL: [AudioClip; 8] = [
        AudioClip::Welcome,
        AudioClip::MainMenu,
        AudioClip::InvalidInput,
        AudioClip::SalesTransfer,
        AudioClip::SupportMenu,
        AudioClip::HrTransfer,
        AudioClip::OfficeInfo,
        AudioClip::LogNewTicket,
    ];

    /// File name of the asset under the configured audio base URL.
    pub fn file_name(&self) -> &'static str {
        match self {
            AudioClip::Welcome => "01_welcome_v2.wav",
            AudioClip::MainMenu => "02_main_menu_v3.wav",
            AudioClip::InvalidInput => "03_invalid_input.wav",
            AudioClip::SalesTransfer => "04_sales_transfer.wav",
            AudioClip::SupportMenu => "05_support_menu.wav",
            AudioClip::HrTransfer => "06_hr_transfer.wav",
            AudioClip::OfficeInfo => "07_office_info.wav",
            AudioClip::LogNewTicket => "08_log_new_ticket.wav",
        }
    }
}

/// Something the caller hears before the step's transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Audio(AudioClip),
    Say(String),
}

impl Prompt {
    pub fn say(text: impl Into<String>) -> Self {
        Prompt::Say(text.into())
    }
}

/// The input shape a gather collects for a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
    pub mode: InputMode,
    pub max_digits: u32,
    pub timeout_secs: Option<u32>,
}

/// The output of one webhook: prompts in order, then exactly one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub prompts: Vec<Prompt>,
    pub transition: Transition,
}

impl Step {
    pub fn new(prompts: Vec<Prompt>, transition: Transition) -> Self {
        Self {
            prompts,
            transition,
        }
    }

    /// Concatenated text of every spoken prompt, for logs and assertions.
    pub fn spoken_text(&self) -> String {
        self.prompts
            .iter()
            .filter_map(|p| match p {
                Prompt::Say(text) => Some(text.as_str()),
                Prompt::Audio(_) => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Fields the carrier posts to a call-flow endpoint.
///
/// Only the fields the flow reads are captured; everything else the carrier
/// sends (CallSid, From, To, ...) is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallInput {
    #[serde(rename = "Digits", default)]
    pub digits: Option<String>,
    #[serde(rename = "SpeechResult", default)]
    pub speech: Option<String>,
}

impl CallInput {
    #[cfg(test)]
    pub fn digits(digits: impl Into<String>) -> Self {
        Self {
            digits: Some(digits.into()),
            speech: None,
        }
    }

    #[cfg(test)]
    pub fn speech(speech: impl Into<String>) -> Self {
        Self {
            digits: None,
            speech: Some(speech.into()),
        }
    }

    /// Pressed digits, trimmed; blank counts as absent.
    pub fn digit_value(&self) -> Option<&str> {
        non_blank(self.digits.as_deref())
    }

    /// The ticket identifier the caller gave, preferring speech over digits.
    pub fn ticket_id(&self) -> Option<&str> {
        non_blank(self.speech.as_deref()).or_else(|| self.digit_value())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_id_prefers_speech() {
        let input = CallInput {
            digits: Some("111111".into()),
            speech: Some("222222".into()),
        };
        assert_eq!(input.ticket_id(), Some("222222"));
    }

    #[test]
    fn ticket_id_falls_back_to_digits_when_speech_blank() {
        let input = CallInput {
            digits: Some(" 654321 ".into()),
            speech: Some("   ".into()),
        };
        assert_eq!(input.ticket_id(), Some("654321"));
    }

    #[test]
    fn blank_fields_are_absent() {
        let input = CallInput {
            digits: Some(String::new()),
            speech: Some(String::new()),
        };
        assert_eq!(input.digit_value(), None);
        assert_eq!(input.ticket_id(), None);
        assert_eq!(CallInput::default().ticket_id(), None);
    }

    #[test]
    fn audio_file_names_are_unique() {
        let mut names: Vec<_> = AudioClip::ALL.iter().map(AudioClip::file_name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), AudioClip::ALL.len());
    }

    #[test]
    fn spoken_text_skips_audio() {
        let step = Step::new(
            vec![
                Prompt::Audio(AudioClip::SalesTransfer),
                Prompt::say("Transferring to sales."),
                Prompt::say("Goodbye."),
            ],
            Transition::Hangup,
        );
        assert_eq!(step.spoken_text(), "Transferring to sales. Goodbye.");
    }
}
