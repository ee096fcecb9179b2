use std::fmt;

/// What kind of caller input a `<Gather>` listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Dtmf,
    SpeechDtmf,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Dtmf => "dtmf",
            InputMode::SpeechDtmf => "speech dtmf",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text spoken by the carrier's TTS engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Say {
    pub text: String,
    pub voice: Option<String>,
    pub language: Option<String>,
}

impl Say {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
            language: None,
        }
    }

    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// A `<Gather>` block: prompts played while waiting, plus where to post the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    pub input: InputMode,
    pub num_digits: Option<u32>,
    pub timeout_secs: Option<u32>,
    /// Absolute URL the carrier posts the collected input to.
    pub action: String,
    prompts: Vec<Verb>,
}

impl Gather {
    pub fn new(input: InputMode, action: impl Into<String>) -> Self {
        Self {
            input,
            num_digits: None,
            timeout_secs: None,
            action: action.into(),
            prompts: Vec::new(),
        }
    }

    pub fn num_digits(mut self, digits: u32) -> Self {
        self.num_digits = Some(digits);
        self
    }

    pub fn timeout(mut self, secs: u32) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn play(mut self, url: impl Into<String>) -> Self {
        self.prompts.push(Verb::Play(url.into()));
        self
    }

    pub fn say(mut self, say: Say) -> Self {
        self.prompts.push(Verb::Say(say));
        self
    }

    /// Play/Say verbs nested inside the gather.
    pub fn prompts(&self) -> &[Verb] {
        &self.prompts
    }
}

/// One top-level voice instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Play(String),
    Say(Say),
    Gather(Gather),
    Redirect(String),
    Hangup,
}

impl Verb {
    /// Whether the carrier stops executing the document at this verb.
    ///
    /// A gather is not terminal: when the caller gives no input the carrier
    /// falls through to the next verb.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Verb::Redirect(_) | Verb::Hangup)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Verb::Play(_) => "Play",
            Verb::Say(_) => "Say",
            Verb::Gather(_) => "Gather",
            Verb::Redirect(_) => "Redirect",
            Verb::Hangup => "Hangup",
        }
    }
}
