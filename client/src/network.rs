use log::{debug, info};
use shared::{Incoming, RECV_BUFFER_SIZE};
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Message shown once the server closes the connection.
pub const SERVER_GONE: &str = "The server has disconnected";
pub const PROMPT: &str = "Enter command: ";

/// Formats a chunk received from the server for the console.
pub fn render(text: &str) -> String {
    match Incoming::parse(text) {
        Incoming::Command(payload) => format!("Executing command: {}", payload),
        Incoming::Notice(notice) => notice.to_string(),
    }
}

/// Prints everything read from `reader` until the server goes away.
///
/// Each rendered chunk is passed to `display`. Returns once the peer closes
/// the stream or a read fails.
pub async fn receive_messages<R, F>(mut reader: R, mut display: F) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    F: FnMut(String),
{
    let mut buffer = vec![0u8; RECV_BUFFER_SIZE];

    loop {
        let len = reader.read(&mut buffer).await?;
        if len == 0 {
            display(SERVER_GONE.to_string());
            return Ok(());
        }

        let text = String::from_utf8_lossy(&buffer[..len]);
        display(render(&text));
    }
}

/// Sends each line from `input` to `writer`, without its line terminator.
///
/// Stops at end of input or on the first failed write.
pub async fn send_commands<I, W>(input: I, mut writer: W) -> io::Result<()>
where
    I: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }
        writer.write_all(line.as_bytes()).await?;
        debug!("Sent {:?}", line);
    }

    Ok(())
}

fn show_prompt() {
    print!("{}", PROMPT);
    let _ = io::stdout().flush();
}

pub struct Client {
    stream: TcpStream,
}

impl Client {
    pub async fn connect(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(server_addr).await?;
        info!("Connected to {}", server_addr);
        Ok(Client { stream })
    }

    /// Runs until the server disconnects or stdin is exhausted.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let (reader, writer) = self.stream.into_split();

        let receiver = tokio::spawn(receive_messages(reader, |text| {
            println!("\n{}", text);
            show_prompt();
        }));

        show_prompt();
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());

        tokio::select! {
            result = receiver => {
                result??;
            }
            result = send_commands(stdin, writer) => {
                result?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_command() {
        assert_eq!(render("/jump"), "Executing command: jump");
    }

    #[test]
    fn test_render_notice() {
        assert_eq!(render("You are rank number 2"), "You are rank number 2");
    }

    #[tokio::test]
    async fn test_receive_messages_until_close() {
        let reader = tokio_test::io::Builder::new()
            .read(b"You are rank number 1")
            .read(b"/wave")
            .build();

        let mut shown = Vec::new();
        receive_messages(reader, |text| shown.push(text)).await.unwrap();

        assert_eq!(
            shown,
            vec![
                "You are rank number 1".to_string(),
                "Executing command: wave".to_string(),
                SERVER_GONE.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_send_commands_strips_newlines() {
        let input: &[u8] = b"/one\n\n/two\r\n";
        let writer = tokio_test::io::Builder::new()
            .write(b"/one")
            .write(b"/two")
            .build();

        send_commands(input, writer).await.unwrap();
    }
}
