//! Line-oriented terminal client built on `wireline`.
//!
//! Connects to the peer named on the command line, prints every message it
//! delivers and sends each line read from stdin as one framed message.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use futures::StreamExt;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{error, warn};
use wireline::ClientSession;

#[tokio::main]
async fn main() -> ExitCode {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let session = ClientSession::builder()
        .receive_buffer_size(cli.buffer_size)
        .socket_options(cli.socket_options())
        .build();

    if cli.raw {
        session.on_raw_bytes(|chunk| println!("{chunk:?}"));
    } else {
        session.on_message(|msg| println!("{msg}"));
    }
    session.on_disconnected(|reason| eprintln!("disconnected: {reason}"));

    if let Err(err) = session
        .connect(&cli.host, cli.port, cli.protocol_config(), cli.encoding.into())
        .await
    {
        error!(error = %err, host = %cli.host, port = cli.port, "unable to connect");
        return ExitCode::FAILURE;
    }

    let mut stdin = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    loop {
        tokio::select! {
            () = session.closed() => break,
            line = stdin.next() => match line {
                Some(Ok(line)) => {
                    if !session.send(&line) {
                        warn!("line not sent");
                    }
                }
                Some(Err(err)) => {
                    error!(error = %err, "failed to read stdin");
                    break;
                }
                None => break,
            },
        }
    }

    session.disconnect();
    session.closed().await;
    ExitCode::SUCCESS
}
