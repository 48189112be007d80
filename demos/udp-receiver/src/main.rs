// Copyright (C) 2023 Niclas Olmenius <niclas@voysys.se>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Receives an RTP/JPEG stream over UDP and writes each image to a `.jpeg` file.

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Error};
use clap::Parser;
use log::{debug, error, info};
use rtpjpeg::receiver::{Receiver, ReceiverOptions};
use rtpjpeg::rtp::{JPEG_CLOCK_RATE, PAYLOAD_TYPE_JPEG};

/// Largest datagram accepted from the socket. Anything beyond the jitter
/// buffer's slot size is rejected by the receiver.
const MAX_DATAGRAM: usize = 2048;

#[derive(Parser)]
struct Opts {
    /// Local address to receive RTP on.
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Path to directory to write JPEG images.
    #[arg(long)]
    out_dir: PathBuf,

    /// Number of images after which to exit automatically.
    #[arg(long)]
    max_frames: Option<u64>,

    /// SSRC to accept, in hex. By default, the first sender heard from.
    #[arg(long, value_parser = parse_ssrc)]
    ssrc: Option<u32>,

    /// RTP payload type which carries JPEG.
    #[arg(long, default_value_t = PAYLOAD_TYPE_JPEG)]
    payload_type: u8,
}

fn parse_ssrc(s: &str) -> Result<u32, std::num::ParseIntError> {
    u32::from_str_radix(s.trim_start_matches("0x"), 16)
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("RTPJPEG_LOG", "info")).init();
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(e) = main_inner().await {
        error!("Fatal: {}", itertools::join(e.chain(), "\ncaused by: "));
        std::process::exit(1);
    }
    info!("Done");
}

async fn main_inner() -> Result<(), Error> {
    let opts = Opts::parse();
    let socket = tokio::net::UdpSocket::bind(opts.bind)
        .await
        .with_context(|| format!("unable to bind {}", opts.bind))?;
    info!("listening on {}", socket.local_addr()?);
    tokio::fs::create_dir_all(&opts.out_dir).await?;

    let mut receiver: Box<Receiver> = Box::new(Receiver::new(
        ReceiverOptions::default()
            .ssrc(opts.ssrc)
            .payload_type(opts.payload_type),
    ));
    let stop_signal = tokio::signal::ctrl_c();
    tokio::pin!(stop_signal);

    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut images = Vec::new();
    let mut frame_count = 0u64;
    let mut first_timestamp = None;
    loop {
        tokio::select! {
            r = socket.recv_from(&mut buf) => {
                let (len, peer) = r?;
                let r = receiver.push(&buf[..len], |f| {
                    let first = *first_timestamp.get_or_insert(f.timestamp());
                    let secs =
                        f.timestamp().wrapping_sub(first) as f64 / f64::from(JPEG_CLOCK_RATE);
                    debug!(
                        "{}x{} image at {:.3}s (ts={})",
                        f.width(),
                        f.height(),
                        secs,
                        f.timestamp()
                    );
                    images.push(f.data().to_vec());
                });
                if let Err(e) = r {
                    debug!("dropping {}-byte datagram from {}: {}", len, peer, e);
                }
                for image in images.drain(..) {
                    let out_path = opts.out_dir.join(format!("{frame_count:05}.jpeg"));
                    tokio::fs::write(&out_path, image)
                        .await
                        .with_context(|| format!("unable to write {}", out_path.display()))?;
                    frame_count += 1;
                    if opts.max_frames == Some(frame_count) {
                        info!("Stopping after {} frames", frame_count);
                        info!("{:?}", receiver.stats());
                        return Ok(());
                    }
                }
            },
            _ = &mut stop_signal => {
                info!("Stopping due to signal");
                break;
            },
        }
    }
    info!("{:?}", receiver.stats());
    Ok(())
}
