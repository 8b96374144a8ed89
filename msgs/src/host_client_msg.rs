use std::io::{self, Cursor, Write};

use anyhow::{bail, Context};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use session::{ClientId, HostEvent, MatrixDelta, MatrixDimensions, MatrixSnapshot, RoundOutcome};

use crate::{
    dequeue::dequeue_msg,
    wire::{
        ensure_consumed, read_bool, read_classifications, read_f32, read_f32_vec, read_u32, write_bool,
        write_classifications, write_f32_vec, write_frame, Reader,
    },
};

const AUTO_GUESS_UNSET: u8 = 2;

/// Host to participant.
#[derive(Debug, Clone, PartialEq)]
pub enum HostClientMsg {
    /// First frame on every connection.
    Hello(ClientId),
    ClientConnected(ClientId),
    ClientDisconnected(ClientId),
    Event(HostEvent),
}

impl HostClientMsg {
    pub fn dequeue_and_decode(input_buffer: &[u8]) -> anyhow::Result<Option<(usize, HostClientMsg)>> {
        let Some((begin, end)) = dequeue_msg(input_buffer)? else {
            return Ok(None);
        };
        let msg = Self::decode(&input_buffer[begin..end])?;
        Ok(Some((end, msg)))
    }

    pub fn decode(input_buffer: &[u8]) -> anyhow::Result<HostClientMsg> {
        let mut rdr = Cursor::new(input_buffer);
        let msg_type_index = read_u32(&mut rdr, "message type")?;

        let msg = match msg_type_index {
            0 => HostClientMsg::Hello(read_u32(&mut rdr, "session id")?),
            1 => HostClientMsg::ClientConnected(read_u32(&mut rdr, "session id")?),
            2 => HostClientMsg::ClientDisconnected(read_u32(&mut rdr, "session id")?),
            3 => {
                let dimensions = read_dimensions(&mut rdr)?;
                let coefficients = read_f32_vec(&mut rdr, "coefficients")?;
                let augmented = read_f32_vec(&mut rdr, "augmented")?;
                let ready = read_bool(&mut rdr, "ready")?;
                let auto_guess = match rdr.read_u8().context("auto guess")? {
                    AUTO_GUESS_UNSET => None,
                    0 => Some(false),
                    1 => Some(true),
                    other => bail!("invalid auto guess flag: {other}"),
                };
                if coefficients.len() != dimensions.cell_count() {
                    bail!(
                        "snapshot carries {} coefficients for a {}x{} matrix",
                        coefficients.len(),
                        dimensions.rows,
                        dimensions.columns
                    );
                }
                HostClientMsg::Event(HostEvent::Snapshot(MatrixSnapshot {
                    dimensions,
                    coefficients,
                    augmented,
                    ready,
                    auto_guess,
                }))
            }
            4 => HostClientMsg::Event(HostEvent::Delta(MatrixDelta::Dimensions(read_dimensions(&mut rdr)?))),
            5 => {
                let index = read_u32(&mut rdr, "coefficient index")? as usize;
                let value = read_f32(&mut rdr, "coefficient value")?;
                HostClientMsg::Event(HostEvent::Delta(MatrixDelta::Coefficient { index, value }))
            }
            6 => HostClientMsg::Event(HostEvent::Delta(MatrixDelta::Augmented(read_f32_vec(
                &mut rdr,
                "augmented",
            )?))),
            7 => HostClientMsg::Event(HostEvent::MatrixReady),
            8 => {
                let round = rdr.read_u64::<LittleEndian>().context("round")?;
                let classification = read_classifications(&mut rdr)?;
                let average = read_f32_vec(&mut rdr, "average")?;
                if classification.len() != average.len() {
                    bail!(
                        "round outcome has {} classifications for {} averages",
                        classification.len(),
                        average.len()
                    );
                }
                HostClientMsg::Event(HostEvent::RoundResolved(RoundOutcome {
                    round,
                    classification,
                    average,
                }))
            }
            9 => HostClientMsg::Event(HostEvent::AutoGuessPreference(read_bool(&mut rdr, "auto guess")?)),
            type_index => {
                bail!("unsupported msg type: {type_index}");
            }
        };
        ensure_consumed(&rdr, "host message")?;

        Ok(msg)
    }

    pub fn pack(&self, wtr: &mut impl Write) -> io::Result<()> {
        let mut payload = Vec::new();
        let msg_type = match self {
            HostClientMsg::Hello(session_id) => {
                payload.write_u32::<LittleEndian>(*session_id)?;
                0
            }
            HostClientMsg::ClientConnected(session_id) => {
                payload.write_u32::<LittleEndian>(*session_id)?;
                1
            }
            HostClientMsg::ClientDisconnected(session_id) => {
                payload.write_u32::<LittleEndian>(*session_id)?;
                2
            }
            HostClientMsg::Event(HostEvent::Snapshot(snapshot)) => {
                write_dimensions(&mut payload, snapshot.dimensions)?;
                write_f32_vec(&mut payload, &snapshot.coefficients)?;
                write_f32_vec(&mut payload, &snapshot.augmented)?;
                write_bool(&mut payload, snapshot.ready)?;
                payload.write_u8(match snapshot.auto_guess {
                    None => AUTO_GUESS_UNSET,
                    Some(enabled) => enabled as u8,
                })?;
                3
            }
            HostClientMsg::Event(HostEvent::Delta(MatrixDelta::Dimensions(dimensions))) => {
                write_dimensions(&mut payload, *dimensions)?;
                4
            }
            HostClientMsg::Event(HostEvent::Delta(MatrixDelta::Coefficient { index, value })) => {
                payload.write_u32::<LittleEndian>(*index as u32)?;
                payload.write_f32::<LittleEndian>(*value)?;
                5
            }
            HostClientMsg::Event(HostEvent::Delta(MatrixDelta::Augmented(augmented))) => {
                write_f32_vec(&mut payload, augmented)?;
                6
            }
            HostClientMsg::Event(HostEvent::MatrixReady) => 7,
            HostClientMsg::Event(HostEvent::RoundResolved(outcome)) => {
                payload.write_u64::<LittleEndian>(outcome.round)?;
                write_classifications(&mut payload, &outcome.classification)?;
                write_f32_vec(&mut payload, &outcome.average)?;
                8
            }
            HostClientMsg::Event(HostEvent::AutoGuessPreference(enabled)) => {
                write_bool(&mut payload, *enabled)?;
                9
            }
        };
        write_frame(wtr, msg_type, &payload)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut output_buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.pack(&mut output_buffer);
        output_buffer
    }
}

fn write_dimensions(wtr: &mut impl Write, dimensions: MatrixDimensions) -> io::Result<()> {
    wtr.write_u32::<LittleEndian>(dimensions.rows)?;
    wtr.write_u32::<LittleEndian>(dimensions.columns)
}

fn read_dimensions(rdr: &mut Reader) -> anyhow::Result<MatrixDimensions> {
    let rows = read_u32(rdr, "rows")?;
    let columns = read_u32(rdr, "columns")?;
    if rows.checked_mul(columns).map_or(true, |cells| cells as usize > crate::dequeue::MAX_FRAME_LEN) {
        bail!("implausible matrix size {rows}x{columns}");
    }
    Ok(MatrixDimensions::new(rows, columns))
}
