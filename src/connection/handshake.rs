//! Client registration state machine.
//!
//! Drives a connection from a fresh socket to RPL_WELCOME: optional `PASS`,
//! optional SASL PLAIN negotiated through `CAP REQ`, then `NICK`/`USER`,
//! falling back through alternative nicks on collision.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use irc_proto::{CapSubCommand, Command, Message, Response};

use crate::config::{BotConfig, SaslConfig, ServerBlock};
use crate::error::HandshakeError;

/// Maximum payload length of one `AUTHENTICATE` line.
const SASL_CHUNK: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Login lines sent, waiting for the welcome.
    Unregistered,
    /// SASL exchange in progress; registration is held by the server.
    Authenticating,
    /// RPL_WELCOME received.
    Registered,
}

/// Who the bot claims to be on one server.
#[derive(Debug, Clone)]
pub struct Identity {
    pub nick: String,
    pub alt_nicks: Vec<String>,
    pub username: String,
    pub realname: String,
    pub password: Option<String>,
    pub sasl: Option<SaslConfig>,
}

impl Identity {
    pub fn new(bot: &BotConfig, block: &ServerBlock) -> Self {
        Self {
            nick: bot.nick.clone(),
            alt_nicks: bot.alt_nicks.clone(),
            username: bot.username().to_string(),
            realname: bot.realname.clone(),
            password: block.password.clone(),
            sasl: block.sasl.clone(),
        }
    }
}

/// Result of feeding one message to the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Keep going, sending these commands first.
    Continue(Vec<Command>),
    /// Registration complete under the given nick.
    Registered { nick: String },
}

impl Step {
    fn none() -> Self {
        Step::Continue(Vec::new())
    }
}

fn cap_end() -> Command {
    Command::CAP(None, CapSubCommand::END, None, None)
}

pub struct HandshakeMachine {
    pub state: HandshakeState,
    identity: Identity,
    /// Index of the nick being attempted: 0 is the primary nick, then alternatives.
    attempt: usize,
}

impl HandshakeMachine {
    pub fn new(identity: Identity) -> Self {
        Self {
            state: HandshakeState::Unregistered,
            identity,
            attempt: 0,
        }
    }

    /// The nick currently being attempted.
    pub fn nick(&self) -> &str {
        if self.attempt == 0 {
            &self.identity.nick
        } else {
            &self.identity.alt_nicks[self.attempt - 1]
        }
    }

    /// Commands to write as soon as the socket is up.
    pub fn begin(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        if let Some(pass) = &self.identity.password {
            out.push(Command::PASS(pass.clone()));
        }
        if self.identity.sasl.is_some() {
            out.push(Command::CAP(
                None,
                CapSubCommand::REQ,
                None,
                Some("sasl".to_string()),
            ));
            self.state = HandshakeState::Authenticating;
        }
        out.push(Command::NICK(self.nick().to_string()));
        out.push(Command::USER(
            self.identity.username.clone(),
            "0".to_string(),
            self.identity.realname.clone(),
        ));
        out
    }

    /// Feed one inbound message. `PING` is answered by the caller.
    pub fn step(&mut self, msg: &Message) -> Result<Step, HandshakeError> {
        if self.state == HandshakeState::Registered {
            return Ok(Step::none());
        }

        match &msg.command {
            Command::ERROR(reason) => Err(HandshakeError::ServerError(reason.clone())),
            Command::CAP(_, sub, first, second) => {
                // The capability list is the last parameter present.
                let caps = second.as_deref().or(first.as_deref()).unwrap_or_default();
                Ok(self.handle_cap(sub, caps))
            }
            Command::AUTHENTICATE(param) => Ok(self.handle_authenticate(param)),
            Command::Response(response, args) => self.handle_numeric(response, args),
            _ => Ok(Step::none()),
        }
    }

    fn handle_numeric(
        &mut self,
        response: &Response,
        args: &[String],
    ) -> Result<Step, HandshakeError> {
        match response {
            Response::RPL_WELCOME => {
                self.state = HandshakeState::Registered;
                let nick = args.first().map(String::as_str).unwrap_or_else(|| self.nick());
                Ok(Step::Registered {
                    nick: nick.to_string(),
                })
            }
            Response::ERR_ERRONEOUSNICKNAME
            | Response::ERR_NICKNAMEINUSE
            | Response::ERR_UNAVAILRESOURCE => {
                if self.attempt >= self.identity.alt_nicks.len() {
                    return Err(HandshakeError::NicknamesExhausted);
                }
                self.attempt += 1;
                Ok(Step::Continue(vec![Command::NICK(self.nick().to_string())]))
            }
            Response::RPL_SASLSUCCESS | Response::ERR_SASLALREADY => {
                self.state = HandshakeState::Unregistered;
                Ok(Step::Continue(vec![cap_end()]))
            }
            Response::ERR_NICKLOCKED
            | Response::ERR_SASLFAIL
            | Response::ERR_SASLTOOLONG
            | Response::ERR_SASLABORT => {
                let text = args.last().map(String::as_str).unwrap_or_default();
                Err(HandshakeError::SaslFailed(format!("{response:?}: {text}")))
            }
            _ => Ok(Step::none()),
        }
    }

    fn handle_cap(&mut self, sub: &CapSubCommand, caps: &str) -> Step {
        let sasl_listed = caps
            .split_whitespace()
            .any(|c| c.eq_ignore_ascii_case("sasl"));
        match sub {
            CapSubCommand::ACK if sasl_listed && self.state == HandshakeState::Authenticating => {
                Step::Continue(vec![Command::AUTHENTICATE("PLAIN".to_string())])
            }
            CapSubCommand::NAK if self.state == HandshakeState::Authenticating => {
                tracing::warn!("Server refused SASL, continuing without it");
                self.state = HandshakeState::Unregistered;
                Step::Continue(vec![cap_end()])
            }
            _ => Step::none(),
        }
    }

    fn handle_authenticate(&self, param: &str) -> Step {
        let Some(sasl) = &self.identity.sasl else {
            return Step::none();
        };
        if self.state != HandshakeState::Authenticating || param != "+" {
            return Step::none();
        }
        Step::Continue(sasl_plain_lines(&sasl.account, &sasl.password))
    }
}

/// Encode SASL PLAIN credentials as `AUTHENTICATE` commands.
///
/// The payload is split into 400-byte chunks; a payload that ends exactly on
/// a chunk boundary is terminated with `AUTHENTICATE +`.
fn sasl_plain_lines(account: &str, password: &str) -> Vec<Command> {
    let payload = STANDARD.encode(format!("{account}\0{account}\0{password}"));
    let mut lines: Vec<Command> = payload
        .as_bytes()
        .chunks(SASL_CHUNK)
        .map(|chunk| Command::AUTHENTICATE(String::from_utf8_lossy(chunk).into_owned()))
        .collect();
    if payload.len() % SASL_CHUNK == 0 {
        lines.push(Command::AUTHENTICATE("+".to_string()));
    }
    lines
}
