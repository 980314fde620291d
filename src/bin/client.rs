//! Command-line client for dnsrelay.
//!
//! Sends a single query carrying one `A`/`IN` question per domain and prints
//! every address it gets back.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::net::UdpSocket;

use dnsrelay::dns::{
    Header, MAX_UDP_DNS_SIZE, Message, Question, RData, RecordClass, RecordType, ResponseCode,
};

const QUERY_ID: u16 = 1234;

#[derive(Parser)]
#[command(name = "dnsrelay-client")]
#[command(version)]
#[command(about = "Query a dnsrelay server for A records")]
struct Cli {
    /// Domains to resolve
    #[arg(required = true)]
    domains: Vec<String>,

    /// Server to query
    #[arg(short = 's', long, default_value = "127.0.0.1:2053")]
    server: SocketAddr,

    /// How long to wait for the reply, in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
}

fn build_query(domains: &[String]) -> Message {
    let mut query = Message::new(Header {
        rd: true,
        ..Header::new(QUERY_ID)
    });
    for domain in domains {
        query.add_question(Question::new(domain.as_str(), RecordType::A, RecordClass::IN));
    }
    query
}

/// One `Domain:`/`IP:` line per address answer; other record types are skipped.
fn address_lines(response: &Message) -> Vec<String> {
    response
        .answers()
        .iter()
        .filter_map(|answer| match &answer.rdata {
            RData::A(addr) => Some(format!("Domain: {}\tIP: {}", answer.name, addr)),
            _ => None,
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let query = build_query(&cli.domains);
    let payload = query.to_bytes().context("Failed to encode query")?;

    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
        .await
        .context("Failed to bind client socket")?;
    socket
        .send_to(&payload, cli.server)
        .await
        .with_context(|| format!("Failed to send query to {}", cli.server))?;

    let mut buf = [0u8; MAX_UDP_DNS_SIZE];
    let (len, _) = tokio::time::timeout(
        Duration::from_millis(cli.timeout_ms),
        socket.recv_from(&mut buf),
    )
    .await
    .with_context(|| format!("No reply from {} within {}ms", cli.server, cli.timeout_ms))?
    .context("Failed to receive reply")?;

    let response = Message::from_bytes(&buf[..len]).context("Failed to decode reply")?;
    if response.response_code() != ResponseCode::NoError {
        bail!("Server answered {}", response.response_code());
    }

    for line in address_lines(&response) {
        println!("{line}");
    }

    Ok(())
}
