use std::io::Write;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use ringchat_framework::{ChatApp, LocalRing, MemoryStore};

mod console;

use console::Console;

/// Channel-based chat over a content-addressable overlay ring
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Local port for the overlay transport to bind
    #[arg(index = 1)]
    bind_port: u16,

    /// IP address of a node already on the ring to bootstrap from
    #[arg(index = 2, requires = "boot_port")]
    boot_ip: Option<IpAddr>,

    /// Port of the bootstrap node
    #[arg(index = 3)]
    boot_port: Option<u16>,
}

#[tokio::main]
async fn main() {
    stderrlog::new()
        .verbosity(log::LevelFilter::Info)
        .init()
        .unwrap();

    let args = Args::parse();

    log::debug!("Configured overlay bind port {}", args.bind_port);
    if let (Some(ip), Some(port)) = (args.boot_ip, args.boot_port) {
        // the overlay transport is an external collaborator; this build runs
        // a single-process ring
        log::warn!(
            "Bootstrap peer {}:{} ignored, running a single-process ring",
            ip,
            port
        );
    }

    let nickname = obtain_nickname();

    let ring = LocalRing::new();
    let store = Arc::new(MemoryStore::new());
    let chat = ChatApp::new(nickname, ring.clone(), store);
    ring.join(chat.node_id(), chat.clone());

    let end = Arc::new(AtomicBool::new(false));
    chat.register_listener(Box::new(Console::new(end.clone())));

    println!();
    println!(" === Ringchat === ");
    println!();
    println!("Hello {}!", chat.nickname());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !end.load(Ordering::SeqCst) {
        print!("\n#>");
        let _ = std::io::stdout().flush();

        let Ok(Some(input)) = lines.next_line().await else {
            break;
        };

        chat.handle_command(&input).await;
    }

    ring.leave(chat.node_id());
    println!("Exiting...");
}

/// Ask the user for a nickname, insisting on at least 3 characters
fn obtain_nickname() -> String {
    let stdin = std::io::stdin();

    loop {
        print!("\nNickname?>");
        let _ = std::io::stdout().flush();

        let mut input = String::new();
        if stdin.read_line(&mut input).is_err() {
            continue;
        }

        let nickname = input.trim();
        if nickname.len() < 3 {
            println!("Nickname must be at least 3 characters long.");
            continue;
        }

        return nickname.to_owned();
    }
}
