use super::state::{CallState, Transition};
use super::step::{AudioClip, Prompt, Step};
use crate::error::IvrError;
use crate::twiml::{Gather, Say, VoiceResponse};

/// Turns flow steps into voice markup with absolute callback and audio URLs.
#[derive(Debug, Clone)]
pub struct Renderer {
    public_base_url: String,
    audio_base_url: String,
    voice: Option<String>,
    language: Option<String>,
}

impl Renderer {
    pub fn new(public_base_url: impl Into<String>, audio_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: trim_slash(public_base_url.into()),
            audio_base_url: trim_slash(audio_base_url.into()),
            voice: None,
            language: None,
        }
    }

    /// TTS voice and language applied to every spoken prompt.
    pub fn with_voice(mut self, voice: impl Into<String>, language: impl Into<String>) -> Self {
        self.voice = Some(voice.into()).filter(|v| !v.is_empty());
        self.language = Some(language.into()).filter(|l| !l.is_empty());
        self
    }

    pub fn url_for(&self, state: CallState) -> String {
        format!("{}{}", self.public_base_url, state.path())
    }

    pub fn audio_url(&self, clip: AudioClip) -> String {
        format!("{}/{}", self.audio_base_url, clip.file_name())
    }

    /// Prompts first, then exactly one of gather (plus silence fallback), redirect or hangup.
    pub fn render(&self, step: &Step) -> Result<VoiceResponse, IvrError> {
        let mut response = VoiceResponse::new();
        for prompt in &step.prompts {
            response = match prompt {
                Prompt::Audio(clip) => response.play(self.audio_url(*clip)),
                Prompt::Say(text) => response.say(self.say(text)),
            };
        }

        let response = match step.transition {
            Transition::Next { state, fallback } => response
                .gather(self.gather_for(state)?)
                .redirect(self.url_for(fallback)),
            Transition::Repeat(state) => response.redirect(self.url_for(state)),
            Transition::Hangup => response.hangup(),
        };
        Ok(response)
    }

    /// The safe answer when handling `state` failed: an apology, then hang up.
    pub fn apology(&self, state: Option<CallState>, err: &IvrError) -> VoiceResponse {
        let text = match (state, err) {
            (Some(CallState::TicketLookup), _) | (_, IvrError::StoreUnavailable(_)) => {
                "Sorry, an error occurred while checking your ticket. Goodbye."
            }
            (Some(CallState::MainMenu), _) => "An error occurred in the main menu. Goodbye.",
            (Some(CallState::SupportMenu), _) => {
                "An error occurred in the support menu. Goodbye."
            }
            _ => "Sorry, an error occurred. Goodbye.",
        };
        VoiceResponse::new().say(self.say(text)).hangup()
    }

    fn gather_for(&self, state: CallState) -> Result<Gather, IvrError> {
        let spec = state.input_spec().ok_or_else(|| {
            IvrError::InternalFault(format!("state {state} does not accept input"))
        })?;

        let mut gather = Gather::new(spec.mode, self.url_for(state)).num_digits(spec.max_digits);
        if let Some(secs) = spec.timeout_secs {
            gather = gather.timeout(secs);
        }
        gather = match state.menu_prompt() {
            Some(Prompt::Audio(clip)) => gather.play(self.audio_url(clip)),
            Some(Prompt::Say(text)) => gather.say(self.say(&text)),
            None => gather,
        };
        Ok(gather)
    }

    fn say(&self, text: &str) -> Say {
        let mut say = Say::new(text);
        if let Some(voice) = &self.voice {
            say = say.voice(voice.clone());
        }
        if let Some(language) = &self.language {
            say = say.language(language.clone());
        }
        say
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
