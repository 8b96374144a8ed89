use anyhow::{bail, Context};

pub const HELP: &str = "\
confirm | <empty line>   open the guess form, or submit it
set <i> <value>          move slider i (1 based) to value
guess <v1> <v2> ...      set every slider and submit
auto on|off              resubmit the average every turn
apply-auto               fill the sliders with the last average
show                     print matrix and sliders
help                     show this text";

#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantCmd {
    Confirm,
    Set { slider: usize, value: f32 },
    Guess(Vec<f32>),
    AutoGuess(bool),
    ApplyAuto,
    Show,
    Help,
}

impl ParticipantCmd {
    pub fn parse(input: &str) -> anyhow::Result<ParticipantCmd> {
        let input = input.trim();
        let (message_type, rem) = match input.find(' ') {
            Some(i) => (&input[..i], input[i + 1..].trim()),
            None => (input, ""),
        };

        match message_type {
            "" | "confirm" => Ok(ParticipantCmd::Confirm),
            "set" => {
                let mut parts = rem.split_whitespace();
                let (Some(slider), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                    bail!("usage: set <i> <value>");
                };
                let slider = slider.parse::<usize>().with_context(|| format!("invalid slider: {slider:?}"))?;
                if slider == 0 {
                    bail!("sliders are numbered from 1");
                }
                Ok(ParticipantCmd::Set {
                    slider: slider - 1,
                    value: parse_value(value)?,
                })
            }
            "guess" => {
                let values = rem.split_whitespace().map(parse_value).collect::<anyhow::Result<Vec<_>>>()?;
                if values.is_empty() {
                    bail!("usage: guess <v1> <v2> ...");
                }
                Ok(ParticipantCmd::Guess(values))
            }
            "auto" => match rem {
                "on" => Ok(ParticipantCmd::AutoGuess(true)),
                "off" => Ok(ParticipantCmd::AutoGuess(false)),
                _ => bail!("expected on or off, got {rem:?}"),
            },
            "apply-auto" => Ok(ParticipantCmd::ApplyAuto),
            "show" => Ok(ParticipantCmd::Show),
            "help" => Ok(ParticipantCmd::Help),
            _ => bail!("cmd not recognized"),
        }
    }
}

fn parse_value(input: &str) -> anyhow::Result<f32> {
    let value = input.parse::<f32>().with_context(|| format!("invalid value: {input:?}"))?;
    if !value.is_finite() {
        bail!("value must be finite");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(ParticipantCmd::parse("\n").unwrap(), ParticipantCmd::Confirm);
        assert_eq!(
            ParticipantCmd::parse("set 2 -7.5").unwrap(),
            ParticipantCmd::Set { slider: 1, value: -7.5 }
        );
        assert_eq!(
            ParticipantCmd::parse("guess 1 2 3").unwrap(),
            ParticipantCmd::Guess(vec![1.0, 2.0, 3.0])
        );
        assert_eq!(ParticipantCmd::parse("auto off").unwrap(), ParticipantCmd::AutoGuess(false));
        assert_eq!(ParticipantCmd::parse("apply-auto").unwrap(), ParticipantCmd::ApplyAuto);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(ParticipantCmd::parse("set 0 1").is_err());
        assert!(ParticipantCmd::parse("set 1").is_err());
        assert!(ParticipantCmd::parse("guess 1 NaN").is_err());
        assert!(ParticipantCmd::parse("guess").is_err());
        assert!(ParticipantCmd::parse("dance").is_err());
    }
}
