use std::io::{self, Cursor, Write};

use anyhow::bail;

use crate::{
    dequeue::dequeue_msg,
    wire::{ensure_consumed, read_f32_vec, read_u32, write_f32_vec, write_frame},
};

/// Participant to host.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientHostMsg {
    Disconnect,
    SubmitGuess(Vec<f32>),
}

impl ClientHostMsg {
    /// Decodes the first complete frame of `input_buffer`, returning the
    /// number of bytes it occupied.
    pub fn dequeue_and_decode(input_buffer: &[u8]) -> anyhow::Result<Option<(usize, ClientHostMsg)>> {
        let Some((begin, end)) = dequeue_msg(input_buffer)? else {
            return Ok(None);
        };
        let msg = Self::decode(&input_buffer[begin..end])?;
        Ok(Some((end, msg)))
    }

    pub fn decode(input_buffer: &[u8]) -> anyhow::Result<ClientHostMsg> {
        let mut rdr = Cursor::new(input_buffer);
        let msg_type_index = read_u32(&mut rdr, "message type")?;

        let msg = match msg_type_index {
            0 => ClientHostMsg::Disconnect,
            1 => ClientHostMsg::SubmitGuess(read_f32_vec(&mut rdr, "guess")?),
            type_index => {
                bail!("unsupported msg type: {type_index}");
            }
        };
        ensure_consumed(&rdr, "client message")?;

        Ok(msg)
    }

    pub fn pack(&self, wtr: &mut impl Write) -> io::Result<()> {
        match self {
            ClientHostMsg::Disconnect => write_frame(wtr, 0, &[]),
            ClientHostMsg::SubmitGuess(guess) => {
                let mut payload = Vec::with_capacity(4 + guess.len() * 4);
                write_f32_vec(&mut payload, guess)?;
                write_frame(wtr, 1, &payload)
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut output_buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.pack(&mut output_buffer);
        output_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_frame_layout() {
        let bytes = ClientHostMsg::SubmitGuess(vec![1.5]).to_bytes();
        assert_eq!(
            bytes,
            [12, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]
                .into_iter()
                .chain(1.5f32.to_le_bytes())
                .collect::<Vec<u8>>()
        );
    }

    #[test]
    fn decodes_back_to_back_frames() {
        let mut input_buffer = ClientHostMsg::SubmitGuess(vec![-3.0, 4.25]).to_bytes();
        input_buffer.extend(ClientHostMsg::Disconnect.to_bytes());

        let (cursor, first) = ClientHostMsg::dequeue_and_decode(&input_buffer).unwrap().unwrap();
        assert_eq!(first, ClientHostMsg::SubmitGuess(vec![-3.0, 4.25]));
        input_buffer.drain(..cursor);
        let (cursor, second) = ClientHostMsg::dequeue_and_decode(&input_buffer).unwrap().unwrap();
        assert_eq!(second, ClientHostMsg::Disconnect);
        assert_eq!(cursor, input_buffer.len());
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(ClientHostMsg::decode(&[9, 0, 0, 0]).is_err());
        // Announces three floats, carries one.
        let mut truncated = vec![1, 0, 0, 0, 3, 0, 0, 0];
        truncated.extend(1.0f32.to_le_bytes());
        assert!(ClientHostMsg::decode(&truncated).is_err());
        assert!(ClientHostMsg::decode(&[0, 0, 0, 0, 1]).is_err());
        assert!(ClientHostMsg::decode(&[]).is_err());
    }
}
