pub mod channels;
pub mod dispatcher;
pub mod templates;

pub use channels::{
    ChannelError, EmailChannel, HttpEmailChannel, HttpSmsChannel, NoopEmailChannel,
    NoopSmsChannel, OutboundMessage, RecordingEmailChannel, RecordingSmsChannel, SmsChannel,
};
pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use templates::Templates;
