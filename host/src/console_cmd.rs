use anyhow::{bail, Context};
use session::ClientId;

pub const HELP: &str = "\
<number>       answer the current prompt
<empty line>   confirm
auto on|off    auto-guess every turn for all participants
kick <id>      close the connection of a participant
status         print phase, participants and matrix as json
help           show this text";

#[derive(Debug, Clone, PartialEq)]
pub enum HostCmd {
    /// Anything that is not a command goes to the setup wizard.
    Input(String),
    AutoGuess(bool),
    Kick(ClientId),
    Status,
    Help,
}

impl HostCmd {
    pub fn parse(input: &str) -> anyhow::Result<HostCmd> {
        let input = input.trim();
        let (message_type, rem) = match input.find(' ') {
            Some(i) => (&input[..i], input[i + 1..].trim()),
            None => (input, ""),
        };

        match message_type {
            "auto" => Ok(HostCmd::AutoGuess(parse_switch(rem)?)),
            "kick" => {
                let session_id = rem.parse::<ClientId>().with_context(|| format!("invalid session id: {rem:?}"))?;
                Ok(HostCmd::Kick(session_id))
            }
            "status" => Ok(HostCmd::Status),
            "help" => Ok(HostCmd::Help),
            _ => Ok(HostCmd::Input(input.to_owned())),
        }
    }
}

pub fn parse_switch(input: &str) -> anyhow::Result<bool> {
    match input {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => bail!("expected on or off, got {input:?}"),
    }
}
