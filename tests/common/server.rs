//! Scripted fake IRC server.
//!
//! Listens on an ephemeral local port. Each accepted bot connection becomes
//! a [`Peer`] the test drives line by line.

use std::time::Duration;

use irc_proto::{Command, Message};
use slircbot::config::ServerBlock;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct FakeServer {
    listener: TcpListener,
}

impl FakeServer {
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    pub fn address(&self) -> String {
        match self.listener.local_addr() {
            Ok(addr) => addr.to_string(),
            Err(e) => panic!("listener has no address: {e}"),
        }
    }

    /// A server block pointing at this server under `label`.
    pub fn block(&self, label: &str) -> ServerBlock {
        let mut block = ServerBlock::from_address(&self.address()).expect("valid address");
        block.label = label.to_string();
        block
    }

    pub async fn accept(&self) -> anyhow::Result<Peer> {
        self.accept_timeout(RECV_TIMEOUT).await
    }

    pub async fn accept_timeout(&self, dur: Duration) -> anyhow::Result<Peer> {
        let (stream, _) = timeout(dur, self.listener.accept()).await??;
        let (read_half, write_half) = stream.into_split();
        Ok(Peer {
            reader: BufReader::new(read_half),
            writer: write_half,
            pings: 0,
        })
    }
}

/// The server's side of one bot connection.
pub struct Peer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    pings: u32,
}

impl Peer {
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        self.recv_timeout(RECV_TIMEOUT).await
    }

    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Message> {
        let line = self.recv_line(dur).await?;
        line.parse::<Message>()
            .map_err(|e| anyhow::anyhow!("parse error: {e}"))
    }

    async fn recv_line(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("connection closed");
        }
        Ok(line)
    }

    /// Skip lines until one whose verb is `verb` arrives, and return its command.
    pub async fn recv_command(&mut self, verb: &str) -> anyhow::Result<Command> {
        loop {
            let line = self.recv_line(RECV_TIMEOUT).await?;
            if line.split_whitespace().next() == Some(verb) {
                let msg = line
                    .parse::<Message>()
                    .map_err(|e| anyhow::anyhow!("parse error: {e}"))?;
                return Ok(msg.command);
            }
        }
    }

    /// Read the login lines and complete registration as `nick`.
    pub async fn register(&mut self, nick: &str) -> anyhow::Result<Vec<Message>> {
        let mut login = Vec::new();
        loop {
            let msg = self.recv().await?;
            let done = matches!(msg.command, Command::USER(..));
            login.push(msg);
            if done {
                break;
            }
        }
        self.send_raw(&format!(":irc.test.net 001 {nick} :Welcome to the test network"))
            .await?;
        Ok(login)
    }

    /// Round-trip a PING so every earlier line has been processed by the bot.
    ///
    /// PONG is written directly, so replies the bot queued earlier may still
    /// arrive after it; anything received before the PONG is returned.
    pub async fn sync(&mut self) -> anyhow::Result<Vec<Message>> {
        self.pings += 1;
        let token = format!("sync{}", self.pings);
        self.send_raw(&format!("PING :{token}")).await?;
        let mut before = Vec::new();
        loop {
            let msg = self.recv().await?;
            if matches!(&msg.command, Command::PONG(t, _) if *t == token) {
                return Ok(before);
            }
            before.push(msg);
        }
    }

    /// Wait for the bot to close the connection, discarding anything it sends.
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        loop {
            let mut line = String::new();
            if timeout(RECV_TIMEOUT, self.reader.read_line(&mut line)).await?? == 0 {
                return Ok(());
            }
        }
    }
}
