//! A [`NetClient`] wired to a real socket.
//!
//! [`Session`] executes the client's transport commands against a
//! [`TcpLink`] and feeds link events back in. Client events are written to
//! the log.
//!
//! Connect attempts run on their own task, so a slow or unreachable host
//! never holds up the tick loop and a disconnect can cancel the attempt.

use std::io;

use tokio::task::JoinHandle;

use outpost_client::chat::scan::strip_colors;
use outpost_client::{ClientEvent, NetClient, Notice};
use outpost_net::{LinkConfig, OutgoingCall, TcpLink, TransportCommand, TransportEvent};
use tracing::{debug, error, info, warn};

/// What the input loop should do after a line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct Session {
    client: NetClient,
    link: Option<TcpLink>,
    connecting: Option<JoinHandle<io::Result<TcpLink>>>,
    link_config: LinkConfig,
    client_loaded: bool,
}

impl Session {
    pub fn new(client: NetClient, link_config: LinkConfig) -> Self {
        Self {
            client,
            link: None,
            connecting: None,
            link_config,
            client_loaded: false,
        }
    }

    pub fn client(&self) -> &NetClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut NetClient {
        &mut self.client
    }

    /// Whether the client last reported the world as loaded.
    pub fn client_loaded(&self) -> bool {
        self.client_loaded
    }

    pub fn has_link(&self) -> bool {
        self.link.is_some()
    }

    /// Whether a connect attempt is still in flight.
    pub fn is_connecting(&self) -> bool {
        self.connecting.is_some()
    }

    /// Adopt a finished connect attempt, then hand every pending link event
    /// to the client.
    pub async fn pump_events(&mut self) {
        if self.connecting.as_ref().is_some_and(JoinHandle::is_finished)
            && let Some(task) = self.connecting.take()
        {
            match task.await {
                Ok(Ok(link)) => self.link = Some(link),
                Ok(Err(e)) => self.connect_failed(e.to_string()),
                Err(e) => self.connect_failed(e.to_string()),
            }
        }

        let Some(link) = self.link.as_mut() else {
            return;
        };
        for event in link.poll_events() {
            if matches!(event, TransportEvent::Disconnected { .. }) {
                self.link = None;
            }
            self.client.handle_transport_event(event);
        }
    }

    /// Execute queued commands until the client stops producing them.
    pub async fn execute_commands(&mut self) {
        loop {
            let commands = self.client.drain_commands();
            if commands.is_empty() {
                return;
            }
            for command in commands {
                match command {
                    TransportCommand::Connect { address, port } => self.open(&address, port),
                    TransportCommand::Send(call) => self.send(&call).await,
                    TransportCommand::Disconnect => self.close(),
                    TransportCommand::SetClientLoaded(loaded) => {
                        debug!("Client loaded: {loaded}");
                        self.client_loaded = loaded;
                    }
                }
            }
        }
    }

    fn open(&mut self, address: &str, port: u16) {
        // The client already moved on to the new endpoint.
        if let Some(task) = self.connecting.take() {
            task.abort();
        }
        if self.link.is_some() {
            self.close();
        }
        debug!("Connecting to {address}:{port}");
        let address = address.to_string();
        let config = self.link_config.clone();
        self.connecting = Some(tokio::spawn(async move {
            TcpLink::connect(&address, port, config).await
        }));
    }

    fn connect_failed(&mut self, reason: String) {
        warn!("Could not connect: {reason}");
        self.client
            .handle_transport_event(TransportEvent::Disconnected { reason: Some(reason) });
    }

    async fn send(&mut self, call: &OutgoingCall) {
        let Some(link) = self.link.as_ref() else {
            debug!("Dropping '{}': no link", call.procedure);
            return;
        };
        if let Err(e) = link.send(call).await {
            warn!("Failed to send '{}': {e}", call.procedure);
        }
    }

    /// Close the link or abandon the connect attempt, and report the
    /// disconnect right away so a following connect starts from a clean state.
    fn close(&mut self) {
        let mut closed = false;
        if let Some(task) = self.connecting.take() {
            debug!("Cancelling connect attempt");
            task.abort();
            closed = true;
        }
        if let Some(link) = self.link.take() {
            link.close();
            closed = true;
        }
        if closed {
            self.client
                .handle_transport_event(TransportEvent::Disconnected { reason: None });
        }
    }

    /// Log everything the client announced since the last call.
    pub fn report_events(&mut self) {
        for event in self.client.drain_events() {
            match event {
                ClientEvent::ChatReceived(line) => info!("[chat] {}", strip_colors(&line.text)),
                ClientEvent::ChatBubble { .. } => {}
                ClientEvent::PlayerJoined { id } => info!("Player {id} joined"),
                ClientEvent::PlayerLeft { id } => info!("Player {id} left"),
                ClientEvent::WaveChanged { wave } => info!("Wave {wave}"),
                ClientEvent::ServerJoined => info!("Joined server"),
                ClientEvent::ObjectivesReplaced => debug!("Objectives replaced"),
                ClientEvent::Notice(notice) => report_notice(&notice),
            }
        }
    }

    /// Act on one line of console input.
    ///
    /// `/quit`, `/disconnect` and `/reconnect` control the session; anything
    /// else is sent as chat.
    pub fn handle_input(&mut self, line: &str) -> Control {
        let line = line.trim();
        match line {
            "" => {}
            "/quit" => return Control::Quit,
            "/disconnect" => self.client.core_mut().disconnect_quietly(),
            "/reconnect" => {
                if !self.client.core_mut().reconnect() {
                    warn!("Nothing to reconnect to");
                }
            }
            text => {
                if !self.client.core_mut().send_chat(text) {
                    warn!("Not in game; message not sent");
                }
            }
        }
        Control::Continue
    }

    /// Leave quietly and release the link.
    pub async fn shutdown(&mut self) {
        self.client.core_mut().disconnect_quietly();
        self.execute_commands().await;
        self.report_events();
    }
}

fn report_notice(notice: &Notice) {
    match notice {
        Notice::LoadingWorld => info!("Loading world..."),
        Notice::LoadingDone => info!("World loaded"),
        Notice::Disconnected { title } => warn!("Disconnected ({})", title.key()),
        Notice::Kicked { reason } => warn!("Kicked ({})", reason.key()),
        Notice::KickedWithText { text } => warn!("Kicked: {}", strip_colors(text)),
        Notice::Error(e) => error!("Connection error ({})", e.key()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_client::memory::{EntityMap, ManualClock, ScriptedPlayer, StaticIdentity, TileGrid, standard_types};
    use outpost_client::{Collaborators, ConnectionState};
    use outpost_config::Config;
    use std::time::Duration;

    fn session() -> Session {
        let config = Config::default();
        let collab = Collaborators {
            entities: Box::new(EntityMap::new()),
            world: Box::new(TileGrid::new()),
            player: Box::new(ScriptedPlayer::default()),
            identity: Box::new(StaticIdentity::from_config(&config.identity, crate::GAME_VERSION)),
            clock: Box::new(ManualClock::new(0)),
        };
        let client = NetClient::new(&config, standard_types(), collab).unwrap();
        Session::new(client, LinkConfig::default())
    }

    async fn pump_until(session: &mut Session, done: impl Fn(&Session) -> bool) {
        for _ in 0..200 {
            if done(session) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.pump_events().await;
        }
    }

    #[tokio::test]
    async fn test_refused_connection_reports_disconnect() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut session = session();
        session.client_mut().connect("127.0.0.1", port);
        session.execute_commands().await;
        pump_until(&mut session, |s| !s.is_connecting()).await;

        assert!(!session.has_link());
        assert_eq!(session.client().core().state(), ConnectionState::Disconnected);
        let notices = session.client_mut().drain_events();
        assert!(notices
            .iter()
            .any(|e| matches!(e, ClientEvent::Notice(Notice::Disconnected { .. }))));
    }

    #[tokio::test]
    async fn test_handshake_sent_once_link_is_up() {
        use outpost_net::{FrameConfig, FrameTag, read_frame};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_frame(&mut stream, &FrameConfig::default()).await.unwrap()
        });

        let mut session = session();
        session.client_mut().connect("127.0.0.1", port);
        session.execute_commands().await;
        pump_until(&mut session, |s| {
            s.client().core().state() == ConnectionState::AwaitingWorld
        })
        .await;
        assert!(session.has_link());
        assert_eq!(session.client().core().state(), ConnectionState::AwaitingWorld);
        session.execute_commands().await;
        assert!(!session.client_loaded());

        let frame = server.await.unwrap();
        assert_eq!(frame.tag, FrameTag::Call);
        assert_eq!(&frame.body[..2], &[0, 0]);
    }

    #[tokio::test]
    async fn test_disconnect_cancels_pending_connect() {
        let mut session = session();
        session.link_config.connect_timeout = Duration::from_secs(30);
        session.client_mut().connect("10.255.255.1", 6567);

        // Issuing the connect must not wait on the socket.
        tokio::time::timeout(Duration::from_millis(500), session.execute_commands())
            .await
            .unwrap();
        assert!(session.is_connecting());

        assert_eq!(session.handle_input("/disconnect"), Control::Continue);
        session.execute_commands().await;
        assert!(!session.is_connecting());
        assert!(!session.has_link());
        assert_eq!(session.client().core().state(), ConnectionState::Disconnected);

        // A user-initiated leave is quiet.
        session.pump_events().await;
        let events = session.client_mut().drain_events();
        assert!(!events
            .iter()
            .any(|e| matches!(e, ClientEvent::Notice(Notice::Disconnected { .. }))));
    }

    #[test]
    fn test_input_commands() {
        let mut session = session();
        assert_eq!(session.handle_input("  "), Control::Continue);
        assert_eq!(session.handle_input("hello"), Control::Continue);
        assert!(session.client_mut().drain_commands().is_empty());
        assert_eq!(session.handle_input("/quit"), Control::Quit);
    }
}
