//! Mock SMTP server for exercising the relay transport.
//!
//! Binds an ephemeral local port, answers a scripted response per SMTP
//! command, and records every line the client sends so tests can assert
//! on the dialogue.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};

/// Scripted response for one SMTP command.
#[derive(Debug, Clone)]
struct Scripted {
    code: u16,
    message: String,
}

impl Scripted {
    fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn line(&self) -> String {
        format!("{} {}\r\n", self.code, self.message)
    }
}

/// Builder for a [`MockSmtpServer`].
#[derive(Debug, Clone)]
pub struct MockSmtpServerBuilder {
    greeting: Scripted,
    ehlo: Scripted,
    mail_from: Scripted,
    rcpt_to: Scripted,
    data: Scripted,
    data_end: Scripted,
    quit: Scripted,
}

impl Default for MockSmtpServerBuilder {
    fn default() -> Self {
        Self {
            greeting: Scripted::new(220, "mock.test ESMTP ready"),
            ehlo: Scripted::new(250, "mock.test"),
            mail_from: Scripted::new(250, "OK"),
            rcpt_to: Scripted::new(250, "OK"),
            data: Scripted::new(354, "End data with <CR><LF>.<CR><LF>"),
            data_end: Scripted::new(250, "OK: queued"),
            quit: Scripted::new(221, "Bye"),
        }
    }
}

impl MockSmtpServerBuilder {
    pub fn with_greeting(mut self, code: u16, message: &str) -> Self {
        self.greeting = Scripted::new(code, message);
        self
    }

    pub fn with_mail_from_response(mut self, code: u16, message: &str) -> Self {
        self.mail_from = Scripted::new(code, message);
        self
    }

    pub fn with_rcpt_to_response(mut self, code: u16, message: &str) -> Self {
        self.rcpt_to = Scripted::new(code, message);
        self
    }

    pub fn with_data_end_response(mut self, code: u16, message: &str) -> Self {
        self.data_end = Scripted::new(code, message);
        self
    }

    /// Bind an ephemeral port and start serving sessions.
    pub async fn build(self) -> std::io::Result<MockSmtpServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = Arc::clone(&received);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let config = self.clone();
                let received = Arc::clone(&received_clone);
                tokio::spawn(async move {
                    let _ = handle_session(stream, config, received).await;
                });
            }
        });

        Ok(MockSmtpServer {
            addr,
            received,
            handle,
        })
    }
}

/// A running mock SMTP server.
pub struct MockSmtpServer {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockSmtpServer {
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder::default()
    }

    /// The address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Every line received from clients, commands and payload alike.
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .expect("MockSmtpServer mutex poisoned")
            .clone()
    }

    /// Whether any received line starts with `prefix`.
    pub fn received_line_starting(&self, prefix: &str) -> bool {
        self.received().iter().any(|line| line.starts_with(prefix))
    }
}

impl Drop for MockSmtpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_session(
    stream: TcpStream,
    config: MockSmtpServerBuilder,
    received: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    write_half.write_all(config.greeting.line().as_bytes()).await?;

    let mut in_data = false;
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
        received
            .lock()
            .expect("MockSmtpServer mutex poisoned")
            .push(trimmed.clone());

        if in_data {
            if trimmed == "." {
                in_data = false;
                write_half
                    .write_all(config.data_end.line().as_bytes())
                    .await?;
            }
            continue;
        }

        let command = trimmed.to_ascii_uppercase();
        let response = if command.starts_with("EHLO") || command.starts_with("HELO") {
            config.ehlo.line()
        } else if command.starts_with("MAIL FROM") {
            config.mail_from.line()
        } else if command.starts_with("RCPT TO") {
            config.rcpt_to.line()
        } else if command == "DATA" {
            if config.data.code == 354 {
                in_data = true;
            }
            config.data.line()
        } else if command == "QUIT" {
            write_half.write_all(config.quit.line().as_bytes()).await?;
            return Ok(());
        } else {
            "502 Command not implemented\r\n".to_string()
        };

        write_half.write_all(response.as_bytes()).await?;
    }
}
