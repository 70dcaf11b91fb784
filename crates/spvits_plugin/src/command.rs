/// A chat command addressed to the plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/say <text>`; the text may be empty, which gets a usage hint back.
    Say(String),
    /// `/voice_mode`
    ToggleVoiceMode,
    /// `/clear_temp`
    ClearTemp,
}

impl Command {
    /// Parse a raw message body. Non-commands return `None`.
    pub fn parse(body: &str) -> Option<Self> {
        let body = body.trim();
        let (name, rest) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };

        match name {
            "/say" => Some(Command::Say(rest.to_string())),
            "/voice_mode" => Some(Command::ToggleVoiceMode),
            "/clear_temp" => Some(Command::ClearTemp),
            _ => None,
        }
    }
}
