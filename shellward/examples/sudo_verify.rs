//! Become root on a Linux host and verify a copied file.
//!
//! Connects, discovers the prompt, elevates with `sudo -s`, runs a short
//! command batch, then checks free space, presence, size and md5 of a file
//! under the remote root before logging out.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example sudo_verify -- --host localhost --user admin --password pw --secret pw --file a.txt
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use shellward::platform::{ElevateOptions, PromptOptions};
use shellward::transfer::{
    DEFAULT_CHECKSUM_COMMAND, FileTransferDescriptor, FileTransferSession, TransferDirection,
};
use shellward::{SessionBuilder, ShellSession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows every prompt refresh
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut builder = SessionBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .timeout(Duration::from_secs(args.timeout));
    if let Some(password) = &args.password {
        builder = builder.password(password);
    } else if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }
    if let Some(secret) = &args.secret {
        builder = builder.secret(secret);
    }

    println!("Connecting to {}:{}...", args.host, args.port);
    let mut session = builder.connect().await?;
    session.prepare().await?;
    let prompt = session.refresh_base_prompt(&PromptOptions::default()).await?;
    println!("Prompt: {} ({})", prompt, session.privilege_level());

    session.elevate(&ElevateOptions::default()).await?;
    println!("Now: {}", session.privilege_level());

    let output = session
        .send_command_batch(&["whoami", "df -h /var/tmp"], true)
        .await?;
    println!("{}", output);

    if let Some(file) = &args.file {
        let descriptor = FileTransferDescriptor::new(file, file, TransferDirection::Put);
        let mut transfer = FileTransferSession::new(session.channel_mut(), descriptor);

        println!("Free space: {} bytes", transfer.remote_space_available("", "").await?);
        if transfer.remote_file_exists("").await? {
            println!("Size: {} bytes", transfer.remote_file_size("", None).await?);
            println!(
                "{}: {}",
                DEFAULT_CHECKSUM_COMMAND,
                transfer.remote_checksum(DEFAULT_CHECKSUM_COMMAND, None).await?
            );
        } else {
            println!("{} not found under /var/tmp", file);
        }
    }

    session.cleanup("exit").await?;
    println!("Done!");
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    secret: Option<String>,
    file: Option<String>,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let mut parsed = Self {
            host: "localhost".to_string(),
            port: 22,
            user: env::var("USER").unwrap_or_else(|_| "root".to_string()),
            password: None,
            key: None,
            secret: None,
            file: None,
            timeout: 30,
        };

        let mut args = env::args().skip(1);
        while let Some(flag) = args.next() {
            let mut value = || args.next().unwrap_or_default();
            match flag.as_str() {
                "--host" | "-h" => parsed.host = value(),
                "--port" | "-p" => parsed.port = value().parse().unwrap_or(22),
                "--user" | "-u" => parsed.user = value(),
                "--password" | "-P" => parsed.password = Some(value()),
                "--key" | "-k" => parsed.key = Some(PathBuf::from(value())),
                "--secret" | "-s" => parsed.secret = Some(value()),
                "--file" | "-f" => parsed.file = Some(value()),
                "--timeout" | "-t" => parsed.timeout = value().parse().unwrap_or(30),
                "--help" => {
                    println!(
                        "usage: sudo_verify --host H --user U (--password P | --key K) [--secret S] [--file F]"
                    );
                    std::process::exit(0);
                }
                other => eprintln!("Unknown argument: {}", other),
            }
        }

        parsed
    }
}
