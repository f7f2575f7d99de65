//! Wire format for notification intents and teleport requests.
//!
//! Field order is the contract; both ends must agree on the tag
//! enumeration. A notification frame is:
//!
//! `[origin uuid 16B][tag u8][sender string][creator string]
//!  [send_creator u8][send_sender u8][send_mass u8][body fields]`
//!
//! Strings are u16-length-prefixed UTF-8, integers big-endian.

use crate::NodeId;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use db::domain::{Assignment, Creator, InfoSender, Priority};
use uuid::Uuid;

/// Longest string a frame field can carry, bounded by the u16 prefix.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("String field of {0} bytes exceeds the u16 length prefix")]
    StringTooLong(usize),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Frame truncated")]
    Truncated,

    #[error("Unknown message tag: {0}")]
    UnknownTag(u8),

    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("Invalid field: {0}")]
    InvalidField(&'static str),
}

/// One fixed tag per verb. The u8 values are the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageTag {
    Assign = 0,
    CloseWithComment = 1,
    CloseWithoutComment = 2,
    MassClose = 3,
    Comment = 4,
    Create = 5,
    Reopen = 6,
    SetPriority = 7,
}

impl TryFrom<u8> for MessageTag {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageTag::Assign),
            1 => Ok(MessageTag::CloseWithComment),
            2 => Ok(MessageTag::CloseWithoutComment),
            3 => Ok(MessageTag::MassClose),
            4 => Ok(MessageTag::Comment),
            5 => Ok(MessageTag::Create),
            6 => Ok(MessageTag::Reopen),
            7 => Ok(MessageTag::SetPriority),
            other => Err(DecodeError::UnknownTag(other)),
        }
    }
}

/// Verb-specific payload of a notification intent.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationBody {
    Assign {
        ticket_id: i64,
        assignment: Assignment,
    },
    CloseWithComment {
        ticket_id: i64,
        message: String,
    },
    CloseWithoutComment {
        ticket_id: i64,
    },
    MassClose {
        lower: i64,
        upper: i64,
    },
    Comment {
        ticket_id: i64,
        message: String,
    },
    Create {
        ticket_id: i64,
        message: String,
    },
    Reopen {
        ticket_id: i64,
    },
    SetPriority {
        ticket_id: i64,
        priority: Priority,
    },
}

impl NotificationBody {
    pub fn tag(&self) -> MessageTag {
        match self {
            NotificationBody::Assign { .. } => MessageTag::Assign,
            NotificationBody::CloseWithComment { .. } => MessageTag::CloseWithComment,
            NotificationBody::CloseWithoutComment { .. } => MessageTag::CloseWithoutComment,
            NotificationBody::MassClose { .. } => MessageTag::MassClose,
            NotificationBody::Comment { .. } => MessageTag::Comment,
            NotificationBody::Create { .. } => MessageTag::Create,
            NotificationBody::Reopen { .. } => MessageTag::Reopen,
            NotificationBody::SetPriority { .. } => MessageTag::SetPriority,
        }
    }

    /// Ticket id for single-ticket bodies; mass-close spans a range.
    pub fn ticket_id(&self) -> Option<i64> {
        match self {
            NotificationBody::Assign { ticket_id, .. }
            | NotificationBody::CloseWithComment { ticket_id, .. }
            | NotificationBody::CloseWithoutComment { ticket_id }
            | NotificationBody::Comment { ticket_id, .. }
            | NotificationBody::Create { ticket_id, .. }
            | NotificationBody::Reopen { ticket_id }
            | NotificationBody::SetPriority { ticket_id, .. } => Some(*ticket_id),
            NotificationBody::MassClose { .. } => None,
        }
    }
}

/// Fully-resolved notification intent as it crosses node boundaries.
/// Live session handles degrade to `InfoSender`/`Creator` references.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub sender: InfoSender,
    pub creator: Creator,
    pub send_creator: bool,
    pub send_sender: bool,
    pub send_mass: bool,
    pub body: NotificationBody,
}

impl Notification {
    /// Fails rather than corrupt the frame when a string field exceeds
    /// the u16 length prefix.
    pub fn encode(&self, origin: NodeId) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_slice(origin.0.as_bytes());
        buf.put_u8(self.body.tag() as u8);
        put_string(&mut buf, &self.sender.encode())?;
        put_string(&mut buf, &self.creator.encode())?;
        buf.put_u8(self.send_creator as u8);
        buf.put_u8(self.send_sender as u8);
        buf.put_u8(self.send_mass as u8);

        match &self.body {
            NotificationBody::Assign {
                ticket_id,
                assignment,
            } => {
                buf.put_i64(*ticket_id);
                put_string(&mut buf, &assignment.encode())?;
            }
            NotificationBody::CloseWithComment { ticket_id, message }
            | NotificationBody::Comment { ticket_id, message }
            | NotificationBody::Create { ticket_id, message } => {
                buf.put_i64(*ticket_id);
                put_string(&mut buf, message)?;
            }
            NotificationBody::CloseWithoutComment { ticket_id }
            | NotificationBody::Reopen { ticket_id } => {
                buf.put_i64(*ticket_id);
            }
            NotificationBody::MassClose { lower, upper } => {
                buf.put_i64(*lower);
                buf.put_i64(*upper);
            }
            NotificationBody::SetPriority {
                ticket_id,
                priority,
            } => {
                buf.put_i64(*ticket_id);
                buf.put_u8(priority.level());
            }
        }

        Ok(buf.freeze())
    }

    /// Decodes a frame into its origin and intent. Dispatches on the tag to
    /// the matching body decoder.
    pub fn decode(frame: &[u8]) -> Result<(NodeId, Notification), DecodeError> {
        let mut buf = frame;
        let origin = NodeId(get_uuid(&mut buf)?);
        let tag = MessageTag::try_from(get_u8(&mut buf)?)?;

        let sender_raw = get_string(&mut buf)?;
        let sender =
            InfoSender::decode(&sender_raw).ok_or(DecodeError::InvalidField("sender"))?;
        let creator = Creator::decode(&get_string(&mut buf)?);
        let send_creator = get_u8(&mut buf)? != 0;
        let send_sender = get_u8(&mut buf)? != 0;
        let send_mass = get_u8(&mut buf)? != 0;

        let body = match tag {
            MessageTag::Assign => NotificationBody::Assign {
                ticket_id: get_i64(&mut buf)?,
                assignment: Assignment::decode(&get_string(&mut buf)?),
            },
            MessageTag::CloseWithComment => NotificationBody::CloseWithComment {
                ticket_id: get_i64(&mut buf)?,
                message: get_string(&mut buf)?,
            },
            MessageTag::CloseWithoutComment => NotificationBody::CloseWithoutComment {
                ticket_id: get_i64(&mut buf)?,
            },
            MessageTag::MassClose => NotificationBody::MassClose {
                lower: get_i64(&mut buf)?,
                upper: get_i64(&mut buf)?,
            },
            MessageTag::Comment => NotificationBody::Comment {
                ticket_id: get_i64(&mut buf)?,
                message: get_string(&mut buf)?,
            },
            MessageTag::Create => NotificationBody::Create {
                ticket_id: get_i64(&mut buf)?,
                message: get_string(&mut buf)?,
            },
            MessageTag::Reopen => NotificationBody::Reopen {
                ticket_id: get_i64(&mut buf)?,
            },
            MessageTag::SetPriority => NotificationBody::SetPriority {
                ticket_id: get_i64(&mut buf)?,
                priority: Priority::from_level(get_u8(&mut buf)?)
                    .ok_or(DecodeError::InvalidField("priority"))?,
            },
        };

        Ok((
            origin,
            Notification {
                sender,
                creator,
                send_creator,
                send_sender,
                send_mass,
                body,
            },
        ))
    }
}

/// Proxy-teleport request: completes a teleport requested on a different
/// node than the one the target player is connected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeleportRequest {
    pub target: Uuid,
    pub server: String,
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TeleportRequest {
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::with_capacity(48);
        buf.put_slice(self.target.as_bytes());
        put_string(&mut buf, &self.server)?;
        put_string(&mut buf, &self.world)?;
        buf.put_i32(self.x);
        buf.put_i32(self.y);
        buf.put_i32(self.z);
        Ok(buf.freeze())
    }

    pub fn decode(frame: &[u8]) -> Result<TeleportRequest, DecodeError> {
        let mut buf = frame;
        Ok(TeleportRequest {
            target: get_uuid(&mut buf)?,
            server: get_string(&mut buf)?,
            world: get_string(&mut buf)?,
            x: get_i32(&mut buf)?,
            y: get_i32(&mut buf)?,
            z: get_i32(&mut buf)?,
        })
    }
}

fn put_string(buf: &mut BytesMut, s: &str) -> Result<(), EncodeError> {
    if s.len() > MAX_STRING_LEN {
        return Err(EncodeError::StringTooLong(s.len()));
    }
    buf.put_u16(s.len() as u16);
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn get_u8(buf: &mut &[u8]) -> Result<u8, DecodeError> {
    if buf.remaining() < 1 {
        return Err(DecodeError::Truncated);
    }
    Ok(buf.get_u8())
}

fn get_i32(buf: &mut &[u8]) -> Result<i32, DecodeError> {
    if buf.remaining() < 4 {
        return Err(DecodeError::Truncated);
    }
    Ok(buf.get_i32())
}

fn get_i64(buf: &mut &[u8]) -> Result<i64, DecodeError> {
    if buf.remaining() < 8 {
        return Err(DecodeError::Truncated);
    }
    Ok(buf.get_i64())
}

fn get_uuid(buf: &mut &[u8]) -> Result<Uuid, DecodeError> {
    if buf.remaining() < 16 {
        return Err(DecodeError::Truncated);
    }
    let mut raw = [0u8; 16];
    buf.copy_to_slice(&mut raw);
    Ok(Uuid::from_bytes(raw))
}

fn get_string(buf: &mut &[u8]) -> Result<String, DecodeError> {
    if buf.remaining() < 2 {
        return Err(DecodeError::Truncated);
    }
    let len = buf.get_u16() as usize;
    if buf.remaining() < len {
        return Err(DecodeError::Truncated);
    }
    let raw = buf.copy_to_bytes(len);
    String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(body: NotificationBody) -> Notification {
        Notification {
            sender: InfoSender::Player {
                uuid: Uuid::new_v4(),
                name: "alex".into(),
            },
            creator: Creator::User(Uuid::new_v4()),
            send_creator: true,
            send_sender: false,
            send_mass: true,
            body,
        }
    }

    #[test]
    fn assign_round_trips_field_for_field() {
        let origin = NodeId::random();
        let msg = sample(NotificationBody::Assign {
            ticket_id: 42,
            assignment: Assignment::Group("moderators".into()),
        });

        let frame = msg.encode(origin).unwrap();
        let (decoded_origin, decoded) = Notification::decode(&frame).unwrap();

        assert_eq!(decoded_origin, origin);
        assert_eq!(decoded, msg);
    }

    #[test]
    fn set_priority_and_mass_close_round_trip() {
        let origin = NodeId::random();

        let priority = sample(NotificationBody::SetPriority {
            ticket_id: 7,
            priority: Priority::Highest,
        });
        let (_, decoded) = Notification::decode(&priority.encode(origin).unwrap()).unwrap();
        assert_eq!(decoded, priority);

        let mass = sample(NotificationBody::MassClose {
            lower: 10,
            upper: 99,
        });
        let (_, decoded) = Notification::decode(&mass.encode(origin).unwrap()).unwrap();
        assert_eq!(decoded, mass);
    }

    #[test]
    fn console_sender_survives_the_wire() {
        let mut msg = sample(NotificationBody::Reopen { ticket_id: 3 });
        msg.sender = InfoSender::Console;
        msg.creator = Creator::Console;

        let (_, decoded) = Notification::decode(&msg.encode(NodeId::random()).unwrap()).unwrap();
        assert_eq!(decoded.sender, InfoSender::Console);
        assert_eq!(decoded.creator, Creator::Console);
    }

    #[test]
    fn unknown_tag_is_an_error_not_a_panic() {
        let msg = sample(NotificationBody::Reopen { ticket_id: 1 });
        let mut frame = msg.encode(NodeId::random()).unwrap().to_vec();
        frame[16] = 200; // tag byte follows the 16-byte origin uuid

        assert_eq!(
            Notification::decode(&frame).unwrap_err(),
            DecodeError::UnknownTag(200)
        );
    }

    #[test]
    fn truncated_frames_are_errors() {
        let msg = sample(NotificationBody::Comment {
            ticket_id: 5,
            message: "hello".into(),
        });
        let frame = msg.encode(NodeId::random()).unwrap();

        for cut in [0, 10, 17, frame.len() - 1] {
            assert_eq!(
                Notification::decode(&frame[..cut]).unwrap_err(),
                DecodeError::Truncated
            );
        }
    }

    #[test]
    fn string_length_overrunning_frame_is_truncated() {
        let mut frame = BytesMut::new();
        frame.put_slice(Uuid::new_v4().as_bytes());
        frame.put_u8(MessageTag::Reopen as u8);
        frame.put_u16(500); // claims 500 bytes of sender string
        frame.put_slice(b"short");

        assert_eq!(
            Notification::decode(&frame).unwrap_err(),
            DecodeError::Truncated
        );
    }

    #[test]
    fn teleport_round_trips() {
        let req = TeleportRequest {
            target: Uuid::new_v4(),
            server: "survival-2".into(),
            world: "the_nether".into(),
            x: -120,
            y: 64,
            z: 903,
        };
        assert_eq!(TeleportRequest::decode(&req.encode().unwrap()).unwrap(), req);
    }

    #[test]
    fn longest_representable_message_round_trips() {
        let msg = sample(NotificationBody::Comment {
            ticket_id: 5,
            message: "x".repeat(MAX_STRING_LEN),
        });
        let frame = msg.encode(NodeId::random()).unwrap();
        let (_, decoded) = Notification::decode(&frame).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn over_long_message_is_an_encode_error_not_a_corrupt_frame() {
        let msg = sample(NotificationBody::Comment {
            ticket_id: 5,
            message: "x".repeat(70_000),
        });
        assert_eq!(
            msg.encode(NodeId::random()).unwrap_err(),
            EncodeError::StringTooLong(70_000)
        );
    }
}
