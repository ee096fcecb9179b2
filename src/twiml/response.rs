use std::fmt::Write;

use super::verb::{Gather, Say, Verb};

/// Content type the carrier expects for voice markup.
pub const CONTENT_TYPE: &str = "text/xml";

/// An ordered voice-markup document.
///
/// Verbs pushed after a `Hangup` or `Redirect` would never execute, so they
/// are dropped instead of emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(self, url: impl Into<String>) -> Self {
        self.push(Verb::Play(url.into()))
    }

    pub fn say(self, say: Say) -> Self {
        self.push(Verb::Say(say))
    }

    pub fn gather(self, gather: Gather) -> Self {
        self.push(Verb::Gather(gather))
    }

    pub fn redirect(self, url: impl Into<String>) -> Self {
        self.push(Verb::Redirect(url.into()))
    }

    pub fn hangup(self) -> Self {
        self.push(Verb::Hangup)
    }

    pub fn push(mut self, verb: Verb) -> Self {
        if self.is_closed() {
            tracing::debug!(verb = verb.name(), "dropping unreachable verb");
        } else {
            self.verbs.push(verb);
        }
        self
    }

    /// True once a verb that ends execution has been pushed.
    pub fn is_closed(&self) -> bool {
        self.verbs.last().is_some_and(Verb::is_terminal)
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Serialize to the carrier's XML format.
    pub fn render(&self) -> String {
        let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for verb in &self.verbs {
            write_verb(&mut out, verb);
        }
        out.push_str("</Response>");
        out
    }
}

fn write_verb(out: &mut String, verb: &Verb) {
    match verb {
        Verb::Play(url) => {
            let _ = write!(out, "<Play>{}</Play>", escape(url));
        }
        Verb::Say(say) => {
            out.push_str("<Say");
            if let Some(voice) = &say.voice {
                let _ = write!(out, r#" voice="{}""#, escape(voice));
            }
            if let Some(language) = &say.language {
                let _ = write!(out, r#" language="{}""#, escape(language));
            }
            let _ = write!(out, ">{}</Say>", escape(&say.text));
        }
        Verb::Gather(gather) => {
            let _ = write!(
                out,
                r#"<Gather action="{}" method="POST" input="{}""#,
                escape(&gather.action),
                gather.input
            );
            if let Some(digits) = gather.num_digits {
                let _ = write!(out, r#" numDigits="{digits}""#);
            }
            if let Some(secs) = gather.timeout_secs {
                let _ = write!(out, r#" timeout="{secs}""#);
            }
            out.push('>');
            for prompt in gather.prompts() {
                write_verb(out, prompt);
            }
            out.push_str("</Gather>");
        }
        Verb::Redirect(url) => {
            let _ = write!(out, r#"<Redirect method="POST">{}</Redirect>"#, escape(url));
        }
        Verb::Hangup => out.push_str("<Hangup/>"),
    }
}

/// Escape text for use in XML content and attribute values.
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twiml::InputMode;

    #[test]
    fn empty_response_renders_document() {
        assert_eq!(
            VoiceResponse::new().render(),
            r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#
        );
    }

    #[test]
    fn verbs_after_hangup_are_dropped() {
        let response = VoiceResponse::new()
            .say(Say::new("Goodbye."))
            .hangup()
            .play("https://cdn.test/late.wav")
            .redirect("https://ivr.test/handle_main_menu");
        assert_eq!(response.verbs().len(), 2);
        assert_eq!(response.verbs().last(), Some(&Verb::Hangup));
        assert!(!response.render().contains("late.wav"));
    }

    #[test]
    fn verbs_after_redirect_are_dropped() {
        let response = VoiceResponse::new()
            .redirect("https://ivr.test/twilio_call_handler")
            .hangup();
        assert_eq!(response.verbs().len(), 1);
        assert!(response.is_closed());
    }

    #[test]
    fn gather_does_not_close_document() {
        let response = VoiceResponse::new()
            .gather(Gather::new(InputMode::Dtmf, "https://ivr.test/handle_main_menu").num_digits(1))
            .redirect("https://ivr.test/twilio_call_handler");
        assert_eq!(response.verbs().len(), 2);
    }

    #[test]
    fn gather_renders_attributes_and_nested_prompts() {
        let gather = Gather::new(InputMode::SpeechDtmf, "https://ivr.test/handle_ticket_id")
            .num_digits(6)
            .timeout(5)
            .say(Say::new("Enter your ticket ID.").voice("Polly.Amy").language("en-GB"));
        let xml = VoiceResponse::new().gather(gather).render();
        assert!(xml.contains(
            r#"<Gather action="https://ivr.test/handle_ticket_id" method="POST" input="speech dtmf" numDigits="6" timeout="5">"#
        ));
        assert!(xml.contains(
            r#"<Say voice="Polly.Amy" language="en-GB">Enter your ticket ID.</Say></Gather>"#
        ));
    }

    #[test]
    fn text_and_urls_are_escaped() {
        let xml = VoiceResponse::new()
            .say(Say::new("Tom & Jerry <3 \"quotes\""))
            .play("https://cdn.test/a.wav?x=1&y=2")
            .render();
        assert!(xml.contains("<Say>Tom &amp; Jerry &lt;3 &quot;quotes&quot;</Say>"));
        assert!(xml.contains("<Play>https://cdn.test/a.wav?x=1&amp;y=2</Play>"));
    }

    #[test]
    fn hangup_and_redirect_render() {
        assert!(VoiceResponse::new().hangup().render().ends_with("<Hangup/></Response>"));
        assert!(
            VoiceResponse::new()
                .redirect("https://ivr.test/handle_support_menu")
                .render()
                .contains(r#"<Redirect method="POST">https://ivr.test/handle_support_menu</Redirect>"#)
        );
    }
}
