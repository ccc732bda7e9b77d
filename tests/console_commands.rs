//! Integration tests for the operator console.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeServer, recording_bot, test_config};
use irc_proto::Command;
use slircbot::Bot;
use slircbot::console::{self, CapturedOutput};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Console {
    tx: mpsc::Sender<String>,
    out: Arc<CapturedOutput>,
    task: JoinHandle<()>,
}

impl Console {
    fn start(bot: Arc<Bot>) -> Self {
        let (tx, rx) = mpsc::channel(16);
        let out = Arc::new(CapturedOutput::default());
        let task = tokio::spawn(console::run(bot, console::channel_lines(rx), out.clone()));
        Self { tx, out, task }
    }

    async fn send(&self, line: &str) {
        self.tx.send(line.to_string()).await.unwrap();
    }

    /// Poll until `f` holds for the captured output.
    async fn wait_for(&self, what: &str, f: impl Fn(&CapturedOutput) -> bool) {
        for _ in 0..100 {
            if f(&self.out) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!(
            "timed out waiting for {what}; printed {:?}, errors {:?}",
            self.out.printed(),
            self.out.errors()
        );
    }

    async fn finish(self) -> Arc<CapturedOutput> {
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("console did not stop")
            .unwrap();
        self.out
    }
}

#[tokio::test]
async fn test_operator_session() {
    let server = FakeServer::bind().await.unwrap();
    let address = server.address();
    let (bot, _hooks) = recording_bot(test_config());
    let console = Console::start(bot.clone());

    console.send(&format!("connect {address}")).await;
    let mut peer = server.accept().await.unwrap();
    peer.register("slircbot").await.unwrap();
    console
        .wait_for("connect output", |out| {
            out.printed()
                .contains(&format!("{address}: connected to {address}"))
        })
        .await;

    console.send("join 127 #rust").await;
    let join = peer.recv_command("JOIN").await.unwrap();
    assert_eq!(join, Command::JOIN("#rust".into(), None, None));
    peer.send_raw(":slircbot!b@h JOIN #rust").await.unwrap();
    peer.sync().await.unwrap();

    console.send("say 127 #rust hello   world").await;
    let privmsg = peer.recv_command("PRIVMSG").await.unwrap();
    assert_eq!(privmsg, Command::PRIVMSG("#rust".into(), "hello world".into()));

    // A target that would shift the trailing text is refused before sending.
    console.send("say 127 :x hi").await;
    console
        .wait_for("invalid target error", |out| !out.errors().is_empty())
        .await;
    assert_eq!(console.out.errors(), vec!["say: invalid parameter ':x'"]);

    console.send("list").await;
    console
        .wait_for("list output", |out| {
            out.printed()
                .iter()
                .any(|l| l.contains("as slircbot") && l.contains("#rust"))
        })
        .await;

    console.send("leave 127 #rust").await;
    let part = peer.recv_command("PART").await.unwrap();
    assert!(matches!(part, Command::PART(ref c, _) if c == "#rust"), "got {part:?}");

    console.send(&format!("disconnect {address} going away now")).await;
    let quit = peer.recv_command("QUIT").await.unwrap();
    assert_eq!(quit, Command::QUIT(Some("going away now".into())));
    assert!(bot.registry().is_empty());
    drop(peer);

    console.send("exit").await;
    let out = console.finish().await;
    assert!(out.printed().contains(&"stopping".to_string()));
    assert_eq!(out.errors().len(), 1, "errors: {:?}", out.errors());
    assert!(!bot.is_running());
}

#[tokio::test]
async fn test_errors_go_to_error_stream() {
    let (bot, _hooks) = recording_bot(test_config());
    let console = Console::start(bot.clone());

    console.send("bogus").await;
    console.send("").await;
    console.send("join").await;
    console.send("join nowhere #x").await;
    console.send("disconnect missing").await;
    console.send("connect :0").await;
    console.send("exit").await;

    let out = console.finish().await;
    assert_eq!(
        out.errors(),
        vec![
            "bogus: command not recognized",
            "join: invalid arguments (usage: join <server-mask> <room>)",
            "join: no connection matches 'nowhere'",
            "disconnect: no connection matches 'missing'",
            "connect: invalid address ':0'",
        ]
    );
}

#[tokio::test]
async fn test_ambiguous_mask_is_reported() {
    let alpha = FakeServer::bind().await.unwrap();
    let alphabet = FakeServer::bind().await.unwrap();
    let (bot, _hooks) = recording_bot(test_config());
    bot.connect(&alpha.block("alpha")).await.unwrap();
    bot.connect(&alphabet.block("alphabet")).await.unwrap();
    let _peers = (
        alpha.accept().await.unwrap(),
        alphabet.accept().await.unwrap(),
    );

    let console = Console::start(bot.clone());
    console.send("join alp #x").await;
    console.send("join ^alpha$ #x").await;
    console
        .wait_for("ambiguous error", |out| !out.errors().is_empty())
        .await;
    console
        .wait_for("join output", |out| !out.printed().is_empty())
        .await;
    assert_eq!(
        console.out.errors(),
        vec!["join: mask 'alp' matches more than one connection: alpha, alphabet"]
    );
    assert_eq!(console.out.printed(), vec!["alpha: joining #x"]);

    console.send("exit").await;
    console.finish().await;
}

#[tokio::test]
async fn test_end_of_input_stops_bot() {
    let (bot, _hooks) = recording_bot(test_config());
    let console = Console::start(bot.clone());
    console.send("help").await;
    console
        .wait_for("help output", |out| {
            out.printed().iter().any(|l| l.starts_with("disconnect <server-label>"))
        })
        .await;
    assert!(bot.is_running());

    let Console { tx, out, task } = console;
    drop(tx);
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("console did not stop")
        .unwrap();
    assert!(!bot.is_running());
    assert_eq!(out.printed().len(), 8);
}
