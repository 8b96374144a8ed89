use std::io::Cursor;

use anyhow::bail;
use byteorder::{LittleEndian, ReadBytesExt};

/// Upper bound for the length field of a frame.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Finds the first complete frame in `input_buffer`.
///
/// Returns the payload range `(begin, end)`; `end` is also the number of
/// bytes to drain. `Ok(None)` means more bytes are needed.
pub fn dequeue_msg(input_buffer: &[u8]) -> anyhow::Result<Option<(usize, usize)>> {
    if input_buffer.len() < 4 {
        return Ok(None);
    }

    let mut rdr = Cursor::new(input_buffer);
    let msg_ln = rdr.read_u32::<LittleEndian>()? as usize;

    if msg_ln > MAX_FRAME_LEN {
        bail!("frame of {msg_ln} bytes exceeds the limit of {MAX_FRAME_LEN}");
    }
    if msg_ln < 4 {
        bail!("frame of {msg_ln} bytes has no room for a message type");
    }

    let end = msg_ln + 4;

    if input_buffer.len() < end {
        return Ok(None);
    }

    Ok(Some((4, end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_the_whole_frame() {
        assert_eq!(dequeue_msg(&[8, 0]).unwrap(), None);
        assert_eq!(dequeue_msg(&[8, 0, 0, 0, 1, 0, 0, 0]).unwrap(), None);
        let frame = [8, 0, 0, 0, 1, 0, 0, 0, 7, 0, 0, 0, 99];
        assert_eq!(dequeue_msg(&frame).unwrap(), Some((4, 12)));
    }

    #[test]
    fn rejects_oversized_and_empty_frames() {
        let too_long = ((MAX_FRAME_LEN + 1) as u32).to_le_bytes();
        assert!(dequeue_msg(&too_long).is_err());
        assert!(dequeue_msg(&[2, 0, 0, 0, 0, 0]).is_err());
    }
}
