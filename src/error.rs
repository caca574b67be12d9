use std::error::Error;
use std::fmt;

use crate::network::feed_forward::ConsError;

/// Status codes reported through the C boundary. Every failure is negative,
/// so the construction calls can share the channel with valid handles.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok = 0,
    InvalidTopology = -1,
    InvalidHandle = -2,
    OutOfOrder = -3,
    ShapeMismatch = -4,
    Io = -5,
    ModelFile = -6,
    InvalidArgument = -7,
    HandlesExhausted = -8,
    Panic = -9,
}

impl Status {
    const ALL: [Status; 10] = [
        Status::Ok,
        Status::InvalidTopology,
        Status::InvalidHandle,
        Status::OutOfOrder,
        Status::ShapeMismatch,
        Status::Io,
        Status::ModelFile,
        Status::InvalidArgument,
        Status::HandlesExhausted,
        Status::Panic,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.code() == code)
    }

    /// Human readable description, NUL-terminated so it can be handed out as a C string.
    pub(crate) fn message_nul(self) -> &'static str {
        match self {
            Status::Ok => "ok\0",
            Status::InvalidTopology => "invalid topology\0",
            Status::InvalidHandle => "unknown or destroyed network handle\0",
            Status::OutOfOrder => "operation called out of order\0",
            Status::ShapeMismatch => "buffer length does not match layer width\0",
            Status::Io => "i/o error\0",
            Status::ModelFile => "malformed model file\0",
            Status::InvalidArgument => "invalid argument\0",
            Status::HandlesExhausted => "no network handles left\0",
            Status::Panic => "internal error\0",
        }
    }

    pub fn message(self) -> &'static str {
        let msg = self.message_nul();
        &msg[..msg.len() - 1]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Which step must happen before the rejected operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    FeedForward,
    BackProp,
    GetResults,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Op::FeedForward => "feed forward",
            Op::BackProp => "back propagation",
            Op::GetResults => "reading results",
        })
    }
}

/// Everything that can go wrong while driving a network.
#[derive(Debug)]
pub enum NetError {
    /// The layer sizes handed to the constructor can't describe a network.
    InvalidTopology(String),
    /// Engine parameters were malformed or out of range.
    InvalidConfig(String),
    /// No live network is registered under the handle.
    InvalidHandle(i32),
    /// `op` requires a feed forward pass that hasn't happened.
    OutOfOrder { op: Op },
    /// A buffer length did not match the width of the layer it feeds or reads.
    ShapeMismatch {
        op: Op,
        expected: usize,
        received: usize,
    },
    /// Reading or writing a model file failed at the file system level.
    Io(anyhow::Error),
    /// A model file was read but its contents are not a valid network.
    ModelFile(anyhow::Error),
    /// A raw argument from the C boundary was unusable (null pointer, negative length...).
    InvalidArgument(String),
    HandlesExhausted,
}

impl NetError {
    pub fn status(&self) -> Status {
        match self {
            NetError::InvalidTopology(_) => Status::InvalidTopology,
            NetError::InvalidConfig(_) | NetError::InvalidArgument(_) => Status::InvalidArgument,
            NetError::InvalidHandle(_) => Status::InvalidHandle,
            NetError::OutOfOrder { .. } => Status::OutOfOrder,
            NetError::ShapeMismatch { .. } => Status::ShapeMismatch,
            NetError::Io(_) => Status::Io,
            NetError::ModelFile(_) => Status::ModelFile,
            NetError::HandlesExhausted => Status::HandlesExhausted,
        }
    }
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::InvalidTopology(msg) => write!(f, "invalid topology: {}", msg),
            NetError::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
            NetError::InvalidHandle(h) => write!(f, "no live network with handle {}", h),
            NetError::OutOfOrder { op } => {
                write!(f, "{} requires a preceding feed forward pass", op)
            }
            NetError::ShapeMismatch {
                op,
                expected,
                received,
            } => write!(
                f,
                "{}: expected a buffer of length {} but received {}",
                op, expected, received
            ),
            NetError::Io(e) => write!(f, "i/o error: {:#}", e),
            NetError::ModelFile(e) => write!(f, "malformed model file: {:#}", e),
            NetError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            NetError::HandlesExhausted => f.write_str("ran out of network handles"),
        }
    }
}

impl Error for NetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NetError::Io(e) | NetError::ModelFile(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<ConsError> for NetError {
    fn from(e: ConsError) -> Self {
        NetError::ModelFile(e.into())
    }
}

pub type Result<T, E = NetError> = std::result::Result<T, E>;
