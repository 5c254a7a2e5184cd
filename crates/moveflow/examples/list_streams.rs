//! Example: list an address's incoming and outgoing streams with their claimable amounts.
//!
//! Usage:
//!
//!   cargo run -p moveflow --example list_streams -- --address 0x... [--network testnet]
//!
//! Prints one line per stream: direction, id, state, claimable now (net of fee), and
//! whether the address may pause/close (sender) or redirect (recipient).

use anyhow::{Context, Result};
use moveflow::lifecycle::state;
use moveflow::{
    accrue, closeable, now_secs, pauseable, recipient_modifiable, Network, StreamClient,
    StreamRecord,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args: Vec<String> = std::env::args().collect();
    let mut address = String::new();
    let mut network = Network::Testnet;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--address" => {
                i += 1;
                address = args.get(i).cloned().unwrap_or_default();
            }
            "--network" => {
                i += 1;
                let name = args.get(i).map(String::as_str).unwrap_or("");
                network = name.parse().with_context(|| format!("--network {}", name))?;
            }
            _ => {}
        }
        i += 1;
    }
    if address.is_empty() {
        eprintln!("Usage: list_streams --address 0xADDR [--network testnet]");
        std::process::exit(1);
    }

    let client = StreamClient::connect(network).context("connect")?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (incoming, outgoing) = client
            .get_all_streams(&address)
            .await
            .with_context(|| format!("streams of {}", address))?;
        let now = now_secs();
        for r in &incoming {
            print_stream("in ", r, &address, now);
        }
        for r in &outgoing {
            print_stream("out", r, &address, now);
        }
        println!("{} incoming, {} outgoing", incoming.len(), outgoing.len());
        Ok::<(), anyhow::Error>(())
    })
}

fn print_stream(direction: &str, r: &StreamRecord, caller: &str, now: u64) {
    let accrual = accrue(r, now);
    println!(
        "{} {} {:?} coin={} claimable={} fee={} remaining={} pause={} close={} redirect={}",
        direction,
        r.id,
        state(r),
        r.coin_type,
        accrual.net(),
        accrual.fee,
        r.remaining_amount,
        pauseable(r, caller),
        closeable(r, caller),
        recipient_modifiable(r, caller),
    );
}
