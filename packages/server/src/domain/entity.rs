//! Entities: connections and the messages sent over them.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::{
    error::RegistryError,
    telemetry::{SensorReading, SystemStats},
    value_object::ConnectionId,
};

/// Outbound half of a connection's transport.
///
/// Frames pushed here are drained by the connection's writer task in order,
/// which is what gives per-connection send ordering.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Lifecycle of a single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// One live duplex channel.
///
/// After registration the registry owns the connection; the accepting handler
/// keeps only the `ConnectionId`.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    channel: PusherChannel,
    joined_at: DateTime<Utc>,
    state: ConnectionState,
}

impl Connection {
    pub fn new(id: ConnectionId, channel: PusherChannel, joined_at: DateTime<Utc>) -> Self {
        Self {
            id,
            channel,
            joined_at,
            state: ConnectionState::Connected,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Push one encoded frame to the peer.
    ///
    /// Fails when the writer side has gone away (peer closed or writer task
    /// ended). The connection stays registered either way.
    pub fn send(&self, frame: String) -> Result<(), RegistryError> {
        if self.state == ConnectionState::Disconnected {
            return Err(RegistryError::SendFailed(self.id));
        }
        self.channel
            .send(frame)
            .map_err(|_| RegistryError::SendFailed(self.id))
    }

    pub(crate) fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}

/// Discriminator of a [`Message`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Welcome,
    Echo,
    Chat,
    System,
    SensorData,
    SystemStats,
    RawText,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Welcome => "welcome",
            MessageKind::Echo => "echo",
            MessageKind::Chat => "chat",
            MessageKind::System => "system",
            MessageKind::SensorData => "sensor_data",
            MessageKind::SystemStats => "system_stats",
            MessageKind::RawText => "raw_text",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific content of a [`Message`]
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Welcome { message: String },
    /// Structured inbound data reflected back unchanged
    Echo { received: serde_json::Value },
    Chat { from: ConnectionId, message: String },
    System { message: String },
    SensorData(SensorReading),
    SystemStats(SystemStats),
    /// Fallback echo of data that did not parse
    RawText(String),
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Payload::Welcome { .. } => MessageKind::Welcome,
            Payload::Echo { .. } => MessageKind::Echo,
            Payload::Chat { .. } => MessageKind::Chat,
            Payload::System { .. } => MessageKind::System,
            Payload::SensorData(_) => MessageKind::SensorData,
            Payload::SystemStats(_) => MessageKind::SystemStats,
            Payload::RawText(_) => MessageKind::RawText,
        }
    }
}

/// Immutable unit of outbound data.
///
/// The kind is derived from the payload variant, so a message can never
/// claim one kind while carrying another kind's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    payload: Payload,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(payload: Payload, timestamp: DateTime<Utc>) -> Self {
        Self { payload, timestamp }
    }

    pub fn welcome(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            Payload::Welcome {
                message: message.into(),
            },
            timestamp,
        )
    }

    pub fn echo(received: serde_json::Value, timestamp: DateTime<Utc>) -> Self {
        Self::new(Payload::Echo { received }, timestamp)
    }

    pub fn chat(from: ConnectionId, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            Payload::Chat {
                from,
                message: message.into(),
            },
            timestamp,
        )
    }

    pub fn system(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            Payload::System {
                message: message.into(),
            },
            timestamp,
        )
    }

    pub fn raw_text(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(Payload::RawText(text.into()), timestamp)
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kairo_shared::time::{Clock, FixedClock};

    fn fixed_now() -> DateTime<Utc> {
        FixedClock::from_millis(1_704_067_200_000).now()
    }

    #[test]
    fn test_new_connection_is_connected() {
        // テスト項目: 新規作成された Connection は Connected 状態である
        // given (前提条件):
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let connection = Connection::new(ConnectionId::generate(), tx, fixed_now());

        // then (期待する結果):
        assert_eq!(connection.state(), ConnectionState::Connected);
        assert_eq!(connection.joined_at(), fixed_now());
    }

    #[test]
    fn test_send_delivers_frame_in_order() {
        // テスト項目: send したフレームが送信順に受信側へ届く
        // given (前提条件):
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection = Connection::new(ConnectionId::generate(), tx, fixed_now());

        // when (操作):
        connection.send("first".to_string()).unwrap();
        connection.send("second".to_string()).unwrap();

        // then (期待する結果):
        assert_eq!(rx.try_recv().unwrap(), "first");
        assert_eq!(rx.try_recv().unwrap(), "second");
    }

    #[test]
    fn test_send_fails_when_receiver_dropped() {
        // テスト項目: 受信側が破棄されていると send は SendFailed を返す
        // given (前提条件):
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId::generate();
        let connection = Connection::new(id, tx, fixed_now());
        drop(rx);

        // when (操作):
        let result = connection.send("hello".to_string());

        // then (期待する結果):
        assert!(matches!(result, Err(RegistryError::SendFailed(failed)) if failed == id));
    }

    #[test]
    fn test_send_fails_after_disconnect() {
        // テスト項目: Disconnected 状態の Connection には送信できない
        // given (前提条件):
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut connection = Connection::new(ConnectionId::generate(), tx, fixed_now());
        connection.mark_disconnected();

        // when (操作):
        let result = connection.send("hello".to_string());

        // then (期待する結果):
        assert!(result.is_err());
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_message_kind_follows_payload() {
        // テスト項目: Message の kind は payload のバリアントから決まる
        // given (前提条件):
        let now = fixed_now();
        let from = ConnectionId::generate();

        // when (操作):
        let kinds = [
            Message::welcome("hi", now).kind(),
            Message::echo(serde_json::json!({"a": 1}), now).kind(),
            Message::chat(from, "hello", now).kind(),
            Message::system("bye", now).kind(),
            Message::raw_text("Echo: x", now).kind(),
        ];

        // then (期待する結果):
        assert_eq!(
            kinds,
            [
                MessageKind::Welcome,
                MessageKind::Echo,
                MessageKind::Chat,
                MessageKind::System,
                MessageKind::RawText,
            ]
        );
    }

    #[test]
    fn test_message_kind_as_str() {
        // テスト項目: MessageKind の文字列表現がワイヤーフォーマットの type と一致する
        // given (前提条件):

        // when (操作):

        // then (期待する結果):
        assert_eq!(MessageKind::SensorData.as_str(), "sensor_data");
        assert_eq!(MessageKind::SystemStats.as_str(), "system_stats");
        assert_eq!(MessageKind::RawText.to_string(), "raw_text");
    }
}
