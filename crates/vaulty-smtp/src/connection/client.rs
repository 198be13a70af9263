//! Type-state SMTP client.

use std::marker::PhantomData;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use super::{ServerInfo, SmtpStream};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::extension::{AuthMechanism, Extension};
use crate::message::{Address, encode_data};
use crate::reply::{Reply, ReplyCode, is_last_reply_line, parse_reply};

/// Type-state marker: greeting read, not authenticated.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker: authenticated.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker: MAIL FROM accepted.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker: at least one RCPT TO accepted.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker: DATA accepted, waiting for content.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or the server refuses service.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream)
            .await?
            .expect_code(ReplyCode::SERVICE_READY)?;

        let hostname = greeting
            .lines
            .first()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        debug!("SMTP greeting from {hostname}");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                extensions: Vec::new(),
            },
            _state: PhantomData,
        })
    }

    /// Sends EHLO and records the server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let reply = self
            .send_command(Command::Ehlo {
                hostname: client_hostname.to_string(),
            })
            .await?
            .expect_success()?;

        // First line is the server's own greeting text
        self.server_info.extensions = reply
            .lines
            .iter()
            .skip(1)
            .map(|line| Extension::parse(line))
            .collect();
        Ok(self)
    }

    /// Upgrades the connection with STARTTLS and repeats EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not advertised or the upgrade fails.
    pub async fn starttls(
        mut self,
        server_hostname: &str,
        client_hostname: &str,
    ) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        self.send_command(Command::StartTls)
            .await?
            .expect_code(ReplyCode::SERVICE_READY)?;

        self.stream = self.stream.upgrade_to_tls(server_hostname).await?;
        self.server_info.extensions.clear();
        self.ehlo(client_hostname).await
    }

    /// Authenticates with the strongest supported mechanism (PLAIN, then LOGIN).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if the server offers neither mechanism,
    /// or an error if authentication fails.
    pub async fn authenticate(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let mechanisms = self.server_info.auth_mechanisms();
        if mechanisms.contains(&AuthMechanism::Plain) {
            self.auth_plain(username, password).await
        } else if mechanisms.contains(&AuthMechanism::Login) {
            self.auth_login(username, password).await
        } else {
            Err(Error::NotSupported("AUTH PLAIN or LOGIN".into()))
        }
    }

    /// Authenticates using PLAIN with an initial response.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let credentials = format!("\0{username}\0{password}");
        self.send_command(Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(STANDARD.encode(credentials.as_bytes())),
        })
        .await?
        .expect_code(ReplyCode::AUTH_SUCCESS)?;

        debug!("Authenticated as {username} (PLAIN)");
        Ok(self.transition())
    }

    /// Authenticates using LOGIN (username and password challenges).
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        self.send_command(Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        })
        .await?
        .expect_code(ReplyCode::AUTH_CONTINUE)?;

        self.send_command(Command::AuthResponse(STANDARD.encode(username)))
            .await?
            .expect_code(ReplyCode::AUTH_CONTINUE)?;

        self.send_command(Command::AuthResponse(STANDARD.encode(password)))
            .await?
            .expect_code(ReplyCode::AUTH_SUCCESS)?;

        debug!("Authenticated as {username} (LOGIN)");
        Ok(self.transition())
    }

    /// Starts a mail transaction without authentication (if server allows).
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(
        self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        self.start_transaction(from, size).await
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(
        self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        self.start_transaction(from, size).await
    }
}

impl Client<MailTransaction> {
    /// Adds the first recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        self.add_recipient(to).await?;
        Ok(self.transition())
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        self.add_recipient(to).await?;
        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command is not answered with 354.
    pub async fn data(mut self) -> Result<Client<Data>> {
        self.send_command(Command::Data)
            .await?
            .expect_code(ReplyCode::START_DATA)?;
        Ok(self.transition())
    }
}

impl Client<Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, leading dots are stuffed and the
    /// terminating `.` line is added. The returned client can start another
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails or the server rejects the message.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Authenticated>> {
        self.stream.write_all(&encode_data(message)).await?;
        let reply = read_reply(&mut self.stream).await?.expect_success()?;
        debug!("Message accepted: {}", reply.text());
        Ok(self.transition())
    }
}

impl<S> Client<S> {
    /// Returns the server information.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the server answers QUIT with an error.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(Command::Quit).await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }
        Ok(())
    }

    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        if cmd.is_sensitive() {
            debug!("C: <credentials>");
        } else {
            debug!("C: {}", String::from_utf8_lossy(&cmd.serialize()).trim_end());
        }
        self.stream.write_all(&cmd.serialize()).await?;
        read_reply(&mut self.stream).await
    }

    async fn start_transaction(
        mut self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        if let (Some(size), Some(limit)) = (size, self.server_info.max_message_size())
            && limit > 0
            && size > limit
        {
            return Err(Error::MessageTooLarge { size, limit });
        }

        // SIZE is only sent when the server advertised the extension
        let size = size.filter(|_| self.server_info.max_message_size().is_some());
        self.send_command(Command::MailFrom { from, size })
            .await?
            .expect_success()?;
        Ok(self.transition())
    }

    async fn add_recipient(&mut self, to: Address) -> Result<()> {
        self.send_command(Command::RcptTo { to })
            .await?
            .expect_success()?;
        Ok(())
    }

    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        debug!("S: {line}");
        // Short lines cannot continue a reply; let the parser reject them
        let is_last = is_last_reply_line(&line) || line.len() < 4;
        lines.push(line);
        if is_last {
            break;
        }
    }
    parse_reply(&lines)
}
