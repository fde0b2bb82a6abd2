//! Wire layer: binary codec, remote-call dispatch, world-stream compression, and the TCP link.

pub mod codec;
pub mod compression;
pub mod dispatch;
pub mod framing;
pub mod link;
pub mod transport;

pub use codec::{DecodeError, NO_ENTITY, WireReader, WireWriter};
pub use compression::{CompressionError, StreamLimits, pack_world_stream, unpack_world_stream};
pub use dispatch::{
    CallDirection, CallHandler, Dispatch, DispatchError, OutgoingCall, Priority, ProcedureId,
    ProcedureSpec, ProcedureTable, Reliability, RemoteCallDispatcher, SenderRole,
};
pub use framing::{Frame, FrameConfig, FrameError, FrameTag, read_frame, write_frame};
pub use link::{LinkConfig, TcpLink};
pub use transport::{TransportCommand, TransportEvent, endpoint_of, host_of};
