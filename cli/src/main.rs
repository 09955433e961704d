mod reader;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use mifare::block::FIRST_DATA_BLOCK;
use mifare::pcsc::PcscTransport;
use mifare::{AccessOptions, BlockAccess, BlockContents, KeyType, Session};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("{0}")]
    Card(#[from] mifare::Error),

    #[error("{0}")]
    Access(#[from] mifare::AccessError),

    #[error("{0}")]
    Records(#[from] mifare::RecordError),

    #[error("Failed to read from the terminal: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("Failed to serialise the output: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, Error>;

/// Read and write MIFARE Classic blocks through a PC/SC contactless reader.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Prints debug logs, including every APDU exchanged.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lists the readers connected to this computer.
    Readers,

    /// Reads a block.
    Read {
        #[command(flatten)]
        card: CardArgs,

        /// Prints the block as JSON.
        #[arg(long)]
        json: bool,

        block: u8,
    },

    /// Writes text into a block, padded with zeros or truncated to 16 bytes.
    Write {
        #[command(flatten)]
        card: CardArgs,

        block: u8,
        text: String,
    },

    /// Writes records (e.g. "Coffee Beans:2") into consecutive data blocks.
    WriteRecords {
        #[command(flatten)]
        card: CardArgs,

        /// Block to write the first record into.
        #[arg(long, default_value_t = FIRST_DATA_BLOCK)]
        start_block: u8,

        #[arg(required = true)]
        records: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct CardArgs {
    /// Name of the reader to use. Prompts when several readers are connected.
    #[arg(short, long, env = "MIFARE_READER")]
    reader: Option<String>,

    /// Sector key as 12 hex digits. Prompts when omitted.
    #[arg(short, long, env = "MIFARE_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Volatile key slot of the reader to load the key into.
    #[arg(long, default_value_t = 0)]
    key_slot: u8,

    /// Authenticates with key B instead of key A.
    #[arg(long)]
    key_b: bool,
}

impl CardArgs {
    fn options(&self) -> AccessOptions {
        AccessOptions {
            key_slot: self.key_slot,
            key_type: match self.key_b {
                true => KeyType::B,
                _ => KeyType::A,
            },
        }
    }
}

#[derive(Serialize)]
struct ReadOutput<'a> {
    #[serde(flatten)]
    contents: &'a BlockContents,
    text: String,
    hex: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        true => LevelFilter::DEBUG,
        _ => LevelFilter::WARN,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut session = Session::<PcscTransport>::establish()?;

    match cli.command {
        Command::Readers => {
            for name in session.list_readers()? {
                println!("{}", name);
            }
        }
        Command::Read { card, json, block } => {
            let key = reader::connect(&mut session, &card)?;
            let contents = BlockAccess::with_options(&mut session, card.options())
                .read_block(&key, block)?;

            match json {
                true => println!(
                    "{}",
                    serde_json::to_string_pretty(&ReadOutput {
                        contents: &contents,
                        text: contents.text(),
                        hex: contents.hex(),
                    })?
                ),
                _ => println!("{}", contents),
            }
        }
        Command::Write { card, block, text } => {
            let key = reader::connect(&mut session, &card)?;
            BlockAccess::with_options(&mut session, card.options())
                .write_block(&key, block, &text)?;

            info!("Wrote block {}", block);
        }
        Command::WriteRecords {
            card,
            start_block,
            records,
        } => {
            let key = reader::connect(&mut session, &card)?;
            let written = BlockAccess::with_options(&mut session, card.options())
                .write_records(&key, start_block, &records)?;

            for (record, block) in records.iter().zip(written) {
                println!("{}: {}", block, record);
            }
        }
    }

    debug!("Closing the session");
    session.teardown();

    Ok(())
}
